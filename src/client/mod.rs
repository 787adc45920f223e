//! Document Client Core
//!
//! State and workflows behind the paginated document views.
//!
//! # Architecture
//!
//! - **`codec`** - text to opaque update bytes, plus base64 transport armor
//! - **`page_state`** - working copy and flags of a single page
//! - **`document_session`** - one open document, page loads and saves
//! - **`membership`** - join requests and owner-side member management
//! - **`catalog`** - paginated document listing and creation
//! - **`api`** - service ports with HTTP and in-memory implementations
//! - **`config`** - server URL, token and request timeout
//! - **`session`** - the signed-in viewer
//!
//! ```text
//! DocumentCatalog --select--> DocumentSession --per page--> PageEditState
//!                                   |                            |
//!                          MembershipWorkflow                  codec
//!                                   \________ services _________/
//! ```

pub mod api;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod document_session;
pub mod membership;
pub mod page_state;
pub mod session;

pub use api::{DocumentService, HttpDocsClient, InMemoryDocsService, MembershipService};
pub use catalog::DocumentCatalog;
pub use config::Config;
pub use document_session::{DocumentSession, SaveAllReport, SaveOutcome, SessionStatus};
pub use membership::{Access, MembershipWorkflow};
pub use page_state::PageEditState;
pub use session::{AuthState, ViewerSession};
