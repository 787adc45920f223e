//! Document Types Module
//!
//! Serializable request/response types for the document and membership
//! services.

pub mod document;
pub mod membership;
pub mod page;

pub use document::{
    CreateDocRequest, CreateDocResponse, DocumentListResponse, DocumentMeta, DocumentRow,
    MAX_PAGES, MAX_TITLE_CHARS, MIN_PAGES,
};
pub use membership::{
    ApproveJoinResponse, CreateJoinRequestBody, CreateJoinRequestResponse, DenyJoinResponse,
    JoinRequest, JoinRequestStatus, ListMembersResponse, MemberItem, MemberRole,
    RemoveMemberResponse, Resolution, MAX_DOC_MEMBERS,
};
pub use page::{
    PageMeta, PageOpenPayload, PageStyle, UpsertPageRequest, UpsertPageResponse,
    MAX_UPDATE_BYTES,
};
