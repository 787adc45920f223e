//! In-Memory Document Authority
//!
//! A process-local implementation of both service ports that enforces the same
//! rules as the document server: editor checks, page bounds, title and page
//! count limits, the update size cap, owner-only membership actions and the
//! member limit.
//!
//! Several handles may share one store, each acting as a different user:
//!
//! ```rust
//! use pagedocs::client::api::InMemoryDocsService;
//!
//! let owner = InMemoryDocsService::for_user(1);
//! let guest = owner.as_user(2);
//! assert_eq!(guest.user_id(), 2);
//! ```

use super::{DocumentService, MembershipService};
use crate::client::codec;
use crate::shared::docs::{
    CreateDocRequest, CreateDocResponse, CreateJoinRequestResponse, DocumentListResponse,
    DocumentMeta, DocumentRow, JoinRequest, JoinRequestStatus, ListMembersResponse, MemberItem,
    MemberRole, PageMeta, PageOpenPayload, PageStyle, RemoveMemberResponse, Resolution,
    UpsertPageRequest, UpsertPageResponse, MAX_DOC_MEMBERS, MAX_PAGES, MAX_TITLE_CHARS,
    MAX_UPDATE_BYTES, MIN_PAGES,
};
use crate::shared::config::MAX_PAGE_LIMIT;
use crate::shared::error::{DocsError, DocsResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredPage {
    style: PageStyle,
    y_update: Vec<u8>,
    updated_at: i64,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    row: DocumentRow,
    pages: Vec<StoredPage>,
    /// (user_id, added_at), in the order they were added
    editors: Vec<(i64, i64)>,
}

impl StoredDocument {
    fn is_owner(&self, user_id: i64) -> bool {
        self.row.owner_id == user_id
    }

    fn is_editor(&self, user_id: i64) -> bool {
        self.is_owner(user_id) || self.editors.iter().any(|(id, _)| *id == user_id)
    }

    fn member_count(&self) -> usize {
        1 + self.editors.len()
    }

    fn page_mut(&mut self, page_index: i64) -> DocsResult<&mut StoredPage> {
        usize::try_from(page_index)
            .ok()
            .and_then(|index| self.pages.get_mut(index))
            .ok_or_else(|| DocsError::not_found("page not found"))
    }
}

#[derive(Debug, Default)]
struct Store {
    next_doc_id: i64,
    next_request_id: i64,
    clock: i64,
    documents: BTreeMap<i64, StoredDocument>,
    join_requests: BTreeMap<i64, JoinRequest>,
}

impl Store {
    /// Strictly increasing unix seconds, so ordering by time is deterministic
    fn tick(&mut self) -> i64 {
        self.clock = Utc::now().timestamp().max(self.clock + 1);
        self.clock
    }

    fn document(&self, doc_id: i64) -> DocsResult<&StoredDocument> {
        self.documents
            .get(&doc_id)
            .ok_or_else(|| DocsError::not_found("document not found"))
    }

    fn document_mut(&mut self, doc_id: i64) -> DocsResult<&mut StoredDocument> {
        self.documents
            .get_mut(&doc_id)
            .ok_or_else(|| DocsError::not_found("document not found"))
    }

    fn editable(&self, doc_id: i64, user_id: i64) -> DocsResult<&StoredDocument> {
        let doc = self.document(doc_id)?;
        if !doc.is_editor(user_id) {
            return Err(DocsError::NotMember);
        }
        Ok(doc)
    }

    fn owned(&self, doc_id: i64, user_id: i64) -> DocsResult<&StoredDocument> {
        let doc = self.document(doc_id)?;
        if !doc.is_owner(user_id) {
            return Err(DocsError::forbidden("not the owner of this document"));
        }
        Ok(doc)
    }

    /// The pending request `request_id`, after checking the caller owns its document.
    /// `Ok(None)` when the request was already decided.
    fn pending_request(&self, request_id: i64, user_id: i64) -> DocsResult<Option<JoinRequest>> {
        let request = self
            .join_requests
            .get(&request_id)
            .ok_or_else(|| DocsError::not_found("join request not found"))?;
        self.owned(request.doc_id, user_id)?;
        Ok(request.is_pending().then(|| request.clone()))
    }

    fn decide(&mut self, request_id: i64, status: JoinRequestStatus, decided_by: i64) {
        let now = self.tick();
        if let Some(request) = self.join_requests.get_mut(&request_id) {
            request.status = status;
            request.decided_at = Some(now);
            request.decided_by = Some(decided_by);
        }
    }
}

/// Document and membership services backed by shared in-process state
#[derive(Debug, Clone)]
pub struct InMemoryDocsService {
    store: Arc<Mutex<Store>>,
    caller: i64,
}

impl InMemoryDocsService {
    /// A fresh, empty store acting as `user_id`
    pub fn for_user(user_id: i64) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            caller: user_id,
        }
    }

    /// Another handle on the same store acting as `user_id`
    pub fn as_user(&self, user_id: i64) -> Self {
        Self {
            store: Arc::clone(&self.store),
            caller: user_id,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.caller
    }

    pub fn join_request(&self, request_id: i64) -> Option<JoinRequest> {
        self.lock().join_requests.get(&request_id).cloned()
    }

    pub fn join_requests_for(&self, doc_id: i64) -> Vec<JoinRequest> {
        self.lock()
            .join_requests
            .values()
            .filter(|request| request.doc_id == doc_id)
            .cloned()
            .collect()
    }

    /// Stored style and update bytes of a page, bypassing access checks
    pub fn page_content(&self, doc_id: i64, page_index: usize) -> Option<(PageStyle, Vec<u8>)> {
        self.lock()
            .documents
            .get(&doc_id)
            .and_then(|doc| doc.pages.get(page_index))
            .map(|page| (page.style, page.y_update.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_title(title: &str) -> DocsResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DocsError::validation("title", "title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DocsError::validation(
            "title",
            format!("title must be at most {} characters", MAX_TITLE_CHARS),
        ));
    }
    Ok(title.to_string())
}

#[async_trait]
impl DocumentService for InMemoryDocsService {
    async fn list_documents(&self, page: i64, limit: i64) -> DocsResult<DocumentListResponse> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let store = self.lock();

        let mut rows: Vec<DocumentRow> = store
            .documents
            .values()
            .filter(|doc| doc.is_editor(self.caller))
            .map(|doc| doc.row.clone())
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        let total = rows.len() as i64;
        let total_pages = ((total + limit - 1) / limit).max(1);
        let offset = usize::try_from((page - 1) * limit).unwrap_or(usize::MAX);
        let items = rows
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(DocumentListResponse {
            items,
            page,
            total_pages,
            total,
        })
    }

    async fn create_document(&self, request: CreateDocRequest) -> DocsResult<CreateDocResponse> {
        let title = validate_title(&request.title)?;
        if !(MIN_PAGES..=MAX_PAGES).contains(&request.page_count) {
            return Err(DocsError::validation(
                "page_count",
                format!("page_count must be between {} and {}", MIN_PAGES, MAX_PAGES),
            ));
        }

        let mut store = self.lock();
        let now = store.tick();
        store.next_doc_id += 1;
        let id = store.next_doc_id;
        let pages = (0..request.page_count)
            .map(|_| StoredPage {
                style: PageStyle::Body,
                y_update: Vec::new(),
                updated_at: now,
            })
            .collect();
        store.documents.insert(
            id,
            StoredDocument {
                row: DocumentRow {
                    id,
                    owner_id: self.caller,
                    title,
                    page_count: request.page_count,
                    created_at: now,
                    updated_at: now,
                },
                pages,
                editors: Vec::new(),
            },
        );
        debug!("[DOCS] User {} created document {}", self.caller, id);
        Ok(CreateDocResponse { id })
    }

    async fn get_document(&self, doc_id: i64) -> DocsResult<DocumentMeta> {
        let store = self.lock();
        let doc = store.editable(doc_id, self.caller)?;
        let pages = doc
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| PageMeta {
                page_index: index as i64,
                style: page.style.code(),
                updated_at: page.updated_at,
            })
            .collect();
        let row = &doc.row;
        Ok(DocumentMeta {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title.clone(),
            page_count: row.page_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            pages,
        })
    }

    async fn open_page(&self, doc_id: i64, page_index: i64) -> DocsResult<PageOpenPayload> {
        let store = self.lock();
        let doc = store.editable(doc_id, self.caller)?;
        let page = usize::try_from(page_index)
            .ok()
            .and_then(|index| doc.pages.get(index))
            .ok_or_else(|| DocsError::not_found("page not found"))?;
        Ok(PageOpenPayload {
            doc_id,
            page_index,
            style: page.style.code(),
            y_update: page.y_update.clone(),
        })
    }

    async fn upsert_page(
        &self,
        doc_id: i64,
        page_index: i64,
        request: UpsertPageRequest,
    ) -> DocsResult<UpsertPageResponse> {
        let y_update = codec::dearmor(&request.y_update_base64)?;
        if y_update.is_empty() {
            return Err(DocsError::validation("y_update", "update cannot be empty"));
        }
        if y_update.len() > MAX_UPDATE_BYTES {
            return Err(DocsError::validation("y_update", "update too large"));
        }

        let mut store = self.lock();
        store.editable(doc_id, self.caller)?;
        let now = store.tick();
        let doc = store.document_mut(doc_id)?;
        let page = doc.page_mut(page_index)?;
        page.style = request.style.unwrap_or_default();
        page.y_update = y_update;
        page.updated_at = now;
        doc.row.updated_at = now;

        Ok(UpsertPageResponse {
            updated: 1,
            updated_at: now,
        })
    }
}

#[async_trait]
impl MembershipService for InMemoryDocsService {
    async fn create_join_request(
        &self,
        doc_id: i64,
        message: Option<String>,
    ) -> DocsResult<CreateJoinRequestResponse> {
        let mut store = self.lock();
        if store.document(doc_id)?.is_editor(self.caller) {
            return Err(DocsError::conflict("already a member of this document"));
        }
        // One request per (document, user). A repeat keeps the decision and
        // only replaces the message when a new one is given.
        let existing = store
            .join_requests
            .values_mut()
            .find(|request| request.doc_id == doc_id && request.user_id == self.caller);
        if let Some(request) = existing {
            if message.is_some() {
                request.message = message;
            }
            debug!(
                "[MEMBERS] User {} repeated request {} ({:?})",
                self.caller, request.id, request.status
            );
            return Ok(CreateJoinRequestResponse {
                request_id: request.id,
            });
        }

        let now = store.tick();
        store.next_request_id += 1;
        let id = store.next_request_id;
        store.join_requests.insert(
            id,
            JoinRequest {
                id,
                doc_id,
                user_id: self.caller,
                message,
                status: JoinRequestStatus::Pending,
                created_at: now,
                decided_at: None,
                decided_by: None,
            },
        );
        debug!("[MEMBERS] User {} asked to join document {}", self.caller, doc_id);
        Ok(CreateJoinRequestResponse { request_id: id })
    }

    async fn list_members(&self, doc_id: i64) -> DocsResult<ListMembersResponse> {
        let store = self.lock();
        let doc = store.owned(doc_id, self.caller)?;

        let mut editors = doc.editors.clone();
        editors.sort_by_key(|(_, added_at)| *added_at);

        let items = std::iter::once(MemberItem {
            user_id: doc.row.owner_id,
            role: MemberRole::Owner,
            added_at: doc.row.created_at,
        })
        .chain(editors.into_iter().map(|(user_id, added_at)| MemberItem {
            user_id,
            role: MemberRole::Editor,
            added_at,
        }))
        .collect();

        Ok(ListMembersResponse { items })
    }

    async fn approve_join_request(&self, request_id: i64) -> DocsResult<Resolution> {
        let mut store = self.lock();
        let Some(request) = store.pending_request(request_id, self.caller)? else {
            return Ok(Resolution::AlreadyResolved);
        };

        let now = store.tick();
        let doc = store.document_mut(request.doc_id)?;
        if !doc.is_editor(request.user_id) {
            if doc.member_count() >= MAX_DOC_MEMBERS {
                return Err(DocsError::validation("members", "members limit reached"));
            }
            doc.editors.push((request.user_id, now));
        }
        store.decide(request_id, JoinRequestStatus::Approved, self.caller);
        debug!(
            "[MEMBERS] Request {} approved, user {} joined document {}",
            request_id, request.user_id, request.doc_id
        );
        Ok(Resolution::Applied)
    }

    async fn deny_join_request(&self, request_id: i64) -> DocsResult<Resolution> {
        let mut store = self.lock();
        if store.pending_request(request_id, self.caller)?.is_none() {
            return Ok(Resolution::AlreadyResolved);
        }
        store.decide(request_id, JoinRequestStatus::Denied, self.caller);
        Ok(Resolution::Applied)
    }

    async fn remove_member(&self, doc_id: i64, user_id: i64) -> DocsResult<RemoveMemberResponse> {
        let mut store = self.lock();
        store.owned(doc_id, self.caller)?;
        let doc = store.document_mut(doc_id)?;
        if doc.is_owner(user_id) {
            return Err(DocsError::forbidden("cannot remove the owner"));
        }
        let before = doc.editors.len();
        doc.editors.retain(|(id, _)| *id != user_id);
        Ok(RemoveMemberResponse {
            removed: (before - doc.editors.len()) as u64,
        })
    }
}
