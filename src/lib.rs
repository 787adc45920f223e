//! pagedocs - Paginated Document Client Core
//!
//! Client-side state for co-edited, paginated documents: the document
//! catalog, page-level editing with dirty tracking and batched saves, and the
//! join-request workflow that gates who may edit.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared with the document service
//!   - Document, page and membership wire types
//!   - Application configuration
//!   - Error types
//!
//! - **`client`** - The client core
//!   - `DocumentCatalog`, `DocumentSession`, `MembershipWorkflow`
//!   - Service ports, the reqwest client and an in-memory authority
//!
//! # Usage
//!
//! ```rust
//! use pagedocs::client::{DocumentCatalog, DocumentSession, InMemoryDocsService, ViewerSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> pagedocs::shared::DocsResult<()> {
//! let service = Arc::new(InMemoryDocsService::for_user(1));
//! let mut catalog = DocumentCatalog::new(service.clone());
//! let id = catalog.create_document("Meeting notes", 2).await?;
//!
//! let session = DocumentSession::new(service, ViewerSession::new(1, "alice", "alice@example.com"));
//! session.open(id).await?;
//! session.set_text(0, "Agenda")?;
//! let report = session.save_all().await;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! Page payloads are opaque bytes; merging concurrent edits is the service's
//! business.

pub mod client;
pub mod shared;
