//! Document Service Ports
//!
//! The client core talks to the document and membership services only through
//! these traits. [`HttpDocsClient`] speaks to the real REST API;
//! [`InMemoryDocsService`] is a self-contained authority with the same rules.

pub mod http;
pub mod memory;

pub use http::HttpDocsClient;
pub use memory::InMemoryDocsService;

use crate::shared::docs::{
    CreateDocRequest, CreateDocResponse, CreateJoinRequestResponse, DocumentListResponse,
    DocumentMeta, ListMembersResponse, PageOpenPayload, RemoveMemberResponse, Resolution,
    UpsertPageRequest, UpsertPageResponse,
};
use crate::shared::error::DocsResult;
use async_trait::async_trait;

/// Documents and their pages
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Documents the caller owns or edits, newest first
    async fn list_documents(&self, page: i64, limit: i64) -> DocsResult<DocumentListResponse>;

    async fn create_document(&self, request: CreateDocRequest) -> DocsResult<CreateDocResponse>;

    /// Metadata and page list. `NotMember` when the caller may not edit.
    async fn get_document(&self, doc_id: i64) -> DocsResult<DocumentMeta>;

    async fn open_page(&self, doc_id: i64, page_index: i64) -> DocsResult<PageOpenPayload>;

    /// Replace a page's style and update. `NotMember` when the caller may not edit.
    async fn upsert_page(
        &self,
        doc_id: i64,
        page_index: i64,
        request: UpsertPageRequest,
    ) -> DocsResult<UpsertPageResponse>;
}

/// Members and join requests
#[async_trait]
pub trait MembershipService: Send + Sync {
    async fn create_join_request(
        &self,
        doc_id: i64,
        message: Option<String>,
    ) -> DocsResult<CreateJoinRequestResponse>;

    /// Owner only
    async fn list_members(&self, doc_id: i64) -> DocsResult<ListMembersResponse>;

    /// Owner only
    async fn approve_join_request(&self, request_id: i64) -> DocsResult<Resolution>;

    /// Owner only
    async fn deny_join_request(&self, request_id: i64) -> DocsResult<Resolution>;

    /// Owner only; the owner can never be removed
    async fn remove_member(&self, doc_id: i64, user_id: i64) -> DocsResult<RemoveMemberResponse>;
}
