//! # Document Session
//!
//! One open document: its metadata, the working copy of every page, and the
//! save coordination between them.
//!
//! ## Concurrency
//!
//! All state sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. Local edits (`set_text`, `set_style`) are synchronous and can land
//! while a page load or save is in flight; the page's edit version decides
//! whether a finished save may clear the dirty flag.
//!
//! Every `open` and `close` advances the session epoch. A load or save that
//! completes under an older epoch is dropped without touching state.
//!
//! ## Failure scope
//!
//! Only the metadata fetch can fail the whole document. Page loads and saves
//! fail individually and record the error on their page.

use crate::client::api::DocumentService;
use crate::client::codec;
use crate::client::membership::{access_for, Access, MembershipWorkflow};
use crate::client::page_state::PageEditState;
use crate::client::session::ViewerSession;
use crate::shared::docs::{
    DocumentMeta, PageMeta, PageStyle, UpsertPageRequest, MAX_PAGES, MAX_UPDATE_BYTES,
};
use crate::shared::error::{DocsError, DocsResult};
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub const NOT_MEMBER_BANNER: &str =
    "You are not a member of this document. Ask the owner to add you, or request access.";

pub const ACCESS_REQUESTED_BANNER: &str = "Access request sent to the owner.";

/// Message attached to a join request when the viewer gives none
pub const DEFAULT_ACCESS_MESSAGE: &str = "Please grant me edit access.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Nothing opened yet
    #[default]
    Idle,
    /// Fetching document metadata
    Loading,
    /// Metadata loaded; pages load and save individually
    Ready,
    /// The viewer may not edit; only `request_access` is offered
    NotMember,
    /// The metadata fetch failed; see the banner
    Failed,
    Closed,
}

/// Result of a single page save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Page was clean or already saving
    Skipped,
    /// Saved and the page is clean
    Saved { updated_at: i64 },
    /// Saved, but the page was edited meanwhile and is still dirty
    Superseded { updated_at: i64 },
    /// The session was closed or reopened before the save finished
    Discarded,
}

/// Outcome of `save_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveAllReport {
    pub saved: Vec<usize>,
    pub superseded: Vec<usize>,
    pub failed: Vec<(usize, DocsError)>,
}

impl SaveAllReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    document_id: Option<i64>,
    status: SessionStatus,
    meta: Option<DocumentMeta>,
    access: Option<Access>,
    pages: Vec<PageEditState>,
    banner: Option<String>,
    epoch: u64,
}

impl SessionState {
    fn reset(&mut self, status: SessionStatus) {
        self.epoch += 1;
        self.status = status;
        self.meta = None;
        self.access = None;
        self.pages.clear();
        self.banner = None;
    }

    fn enter_not_member(&mut self) {
        if self.status != SessionStatus::NotMember {
            info!("[DOCS] Viewer is not a member of document {:?}", self.document_id);
        }
        self.status = SessionStatus::NotMember;
        self.access = Some(Access::NotMember);
        self.banner = Some(NOT_MEMBER_BANNER.to_string());
    }

    /// Checks shared by every mutating operation
    fn ensure_writable(&self) -> DocsResult<i64> {
        match self.status {
            SessionStatus::Ready => self
                .document_id
                .ok_or_else(|| DocsError::validation("session", "no document is open")),
            SessionStatus::NotMember => Err(DocsError::NotMember),
            SessionStatus::Closed => Err(DocsError::validation("session", "document is closed")),
            _ => Err(DocsError::validation("session", "document is not open")),
        }
    }

    fn page_mut(&mut self, index: usize) -> DocsResult<&mut PageEditState> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| DocsError::not_found(format!("page {} does not exist", index)))
    }
}

/// An open document and the working copies of its pages
pub struct DocumentSession {
    service: Arc<dyn DocumentService>,
    viewer: ViewerSession,
    state: Mutex<SessionState>,
}

impl DocumentSession {
    pub fn new(service: Arc<dyn DocumentService>, viewer: ViewerSession) -> Self {
        Self {
            service,
            viewer,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open `doc_id`: fetch metadata, then load every page concurrently.
    ///
    /// Returns an error only when the metadata fetch fails. Page failures are
    /// recorded on their pages.
    pub async fn open(&self, doc_id: i64) -> DocsResult<()> {
        let epoch = {
            let mut state = self.lock();
            state.reset(SessionStatus::Loading);
            state.document_id = Some(doc_id);
            state.epoch
        };
        info!("[DOCS] Opening document {}", doc_id);

        let fetched = self.service.get_document(doc_id).await;

        let page_count = {
            let mut state = self.lock();
            if state.epoch != epoch {
                debug!("[DOCS] Dropping metadata for document {}: session moved on", doc_id);
                return Ok(());
            }
            let meta = match fetched {
                Ok(meta) => meta,
                Err(DocsError::NotMember) => {
                    state.enter_not_member();
                    return Err(DocsError::NotMember);
                }
                Err(err) => {
                    warn!("[DOCS] Failed to open document {}: {}", doc_id, err);
                    state.status = SessionStatus::Failed;
                    state.banner = Some(format!("Failed to open document: {}", err));
                    return Err(err);
                }
            };

            state.access = Some(access_for(&self.viewer, &meta));
            state.pages = seed_pages(&meta);
            state.meta = Some(meta);
            state.status = SessionStatus::Ready;
            state.pages.len()
        };

        join_all((0..page_count).map(|index| self.load_page(doc_id, index, epoch))).await;
        debug!("[DOCS] Document {} open with {} page(s)", doc_id, page_count);
        Ok(())
    }

    async fn load_page(&self, doc_id: i64, index: usize, epoch: u64) {
        let result = self.service.open_page(doc_id, index as i64).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!("[DOCS] Dropping load of page {}: session moved on", index);
            return;
        }
        let not_member = matches!(result, Err(DocsError::NotMember));
        let Ok(page) = state.page_mut(index) else {
            return;
        };
        match result {
            Ok(payload) => {
                if let Err(err) = page.finish_load(&payload) {
                    warn!("[DOCS] Page {} of document {} is unreadable: {}", index, doc_id, err);
                }
            }
            Err(err) => {
                warn!("[DOCS] Failed to load page {} of document {}: {}", index, doc_id, err);
                page.fail_load(err);
            }
        }
        if not_member {
            state.enter_not_member();
        }
    }

    /// Retry loading a page whose load failed
    pub async fn reload_page(&self, index: usize) -> DocsResult<()> {
        let (doc_id, epoch) = {
            let mut state = self.lock();
            let doc_id = state.ensure_writable()?;
            let page = state.page_mut(index)?;
            if !page.load_failed() {
                return Err(DocsError::validation("page", "page is already loaded"));
            }
            page.begin_load();
            (doc_id, state.epoch)
        };

        self.load_page(doc_id, index, epoch).await;

        match self.page(index).and_then(|page| page.error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Replace the text of a page. Local only.
    pub fn set_text(&self, index: usize, text: impl Into<String>) -> DocsResult<()> {
        let mut state = self.lock();
        let page = editable_page(&mut state, index)?;
        page.set_text(text.into());
        Ok(())
    }

    /// Change the style of a page. Local only.
    pub fn set_style(&self, index: usize, style: PageStyle) -> DocsResult<()> {
        let mut state = self.lock();
        let page = editable_page(&mut state, index)?;
        page.set_style(style);
        Ok(())
    }

    /// Save one page if it is dirty and not already saving.
    pub async fn save_one(&self, index: usize) -> DocsResult<SaveOutcome> {
        let (doc_id, epoch, snapshot, payload) = {
            let mut state = self.lock();
            let doc_id = match state.ensure_writable() {
                Ok(doc_id) => doc_id,
                Err(err) => {
                    // Unsaved edits after a lost membership carry the error too.
                    if err.is_not_member() {
                        if let Some(page) = state.pages.get_mut(index) {
                            if page.dirty && !page.saving {
                                page.fail_save(err.clone());
                            }
                        }
                    }
                    return Err(err);
                }
            };
            let epoch = state.epoch;
            let page = state.page_mut(index)?;
            let Some(snapshot) = page.begin_save() else {
                return Ok(SaveOutcome::Skipped);
            };

            let payload = codec::encode(&snapshot.text);
            if let Err(err) = check_payload(&payload) {
                page.fail_save(err.clone());
                return Err(err);
            }
            (doc_id, epoch, snapshot, payload)
        };

        debug!("[DOCS] Saving page {} of document {}", index, doc_id);
        let request = UpsertPageRequest {
            style: Some(snapshot.style),
            y_update_base64: codec::armor(&payload),
        };
        let result = self.service.upsert_page(doc_id, index as i64, request).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!("[DOCS] Dropping save of page {}: session moved on", index);
            return Ok(SaveOutcome::Discarded);
        }

        match result {
            Ok(response) => {
                let page = state.page_mut(index)?;
                if page.complete_save(&snapshot, response.updated_at) {
                    Ok(SaveOutcome::Saved {
                        updated_at: response.updated_at,
                    })
                } else {
                    debug!("[DOCS] Page {} edited during save, still dirty", index);
                    Ok(SaveOutcome::Superseded {
                        updated_at: response.updated_at,
                    })
                }
            }
            Err(err) => {
                warn!("[DOCS] Failed to save page {} of document {}: {}", index, doc_id, err);
                state.page_mut(index)?.fail_save(err.clone());
                if err.is_not_member() {
                    state.enter_not_member();
                }
                Err(err)
            }
        }
    }

    /// Save every dirty page, one after another. A failing page does not stop
    /// the others.
    pub async fn save_all(&self) -> SaveAllReport {
        let mut report = SaveAllReport::default();

        for index in self.dirty_pages() {
            match self.save_one(index).await {
                Ok(SaveOutcome::Saved { .. }) => report.saved.push(index),
                Ok(SaveOutcome::Superseded { .. }) => report.superseded.push(index),
                Ok(SaveOutcome::Skipped) => {}
                Ok(SaveOutcome::Discarded) => break,
                Err(err) => report.failed.push((index, err)),
            }
        }

        if !report.is_complete() {
            warn!("[DOCS] {} page(s) failed to save", report.failed.len());
        }
        report
    }

    /// Close the document, discarding unsaved edits.
    ///
    /// Returns the indices of pages that were still dirty.
    pub fn close(&self) -> Vec<usize> {
        let mut state = self.lock();
        let discarded: Vec<usize> = state
            .pages
            .iter()
            .filter(|page| page.dirty)
            .map(|page| page.index)
            .collect();
        if !discarded.is_empty() {
            warn!("[DOCS] Discarding unsaved edits on pages {:?}", discarded);
        }
        state.reset(SessionStatus::Closed);
        state.document_id = None;
        discarded
    }

    /// Send a join request for the open document. Only offered while the
    /// session is in `NotMember`.
    pub async fn request_access(
        &self,
        workflow: &MembershipWorkflow,
        message: Option<&str>,
    ) -> DocsResult<i64> {
        let (doc_id, epoch) = {
            let state = self.lock();
            match (state.status, state.document_id) {
                (SessionStatus::NotMember, Some(doc_id)) => (doc_id, state.epoch),
                _ => {
                    return Err(DocsError::validation(
                        "session",
                        "access can only be requested for a document you are not a member of",
                    ))
                }
            }
        };

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_ACCESS_MESSAGE);
        let result = workflow.request_access(doc_id, Some(message)).await;

        let mut state = self.lock();
        if state.epoch == epoch {
            state.banner = Some(match &result {
                Ok(_) => ACCESS_REQUESTED_BANNER.to_string(),
                Err(err) => format!("Failed to request access: {}", err),
            });
        }
        result
    }

    pub fn viewer(&self) -> &ViewerSession {
        &self.viewer
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    pub fn document_id(&self) -> Option<i64> {
        self.lock().document_id
    }

    pub fn title(&self) -> Option<String> {
        self.lock().meta.as_ref().map(|meta| meta.title.clone())
    }

    pub fn meta(&self) -> Option<DocumentMeta> {
        self.lock().meta.clone()
    }

    pub fn access(&self) -> Option<Access> {
        self.lock().access
    }

    pub fn banner(&self) -> Option<String> {
        self.lock().banner.clone()
    }

    /// Snapshot of every page
    pub fn pages(&self) -> Vec<PageEditState> {
        self.lock().pages.clone()
    }

    pub fn page(&self, index: usize) -> Option<PageEditState> {
        self.lock().pages.get(index).cloned()
    }

    pub fn dirty_pages(&self) -> Vec<usize> {
        self.lock()
            .pages
            .iter()
            .filter(|page| page.dirty)
            .map(|page| page.index)
            .collect()
    }

    pub fn has_dirty_pages(&self) -> bool {
        self.lock().pages.iter().any(|page| page.dirty)
    }

    /// Whether the rendering layer should offer editing at all
    pub fn can_edit(&self) -> bool {
        let state = self.lock();
        state.status == SessionStatus::Ready && state.access.is_some_and(Access::can_edit)
    }
}

fn editable_page(state: &mut SessionState, index: usize) -> DocsResult<&mut PageEditState> {
    state.ensure_writable()?;
    let page = state.page_mut(index)?;
    if !page.is_editable() {
        return Err(DocsError::validation(
            "page",
            format!("page {} is not loaded", index),
        ));
    }
    Ok(page)
}

/// The authority rejects empty and oversized updates; refuse them before the
/// call.
fn check_payload(payload: &[u8]) -> DocsResult<()> {
    if payload.is_empty() {
        return Err(DocsError::validation(
            "y_update",
            "page is empty; add text before saving",
        ));
    }
    if payload.len() > MAX_UPDATE_BYTES {
        return Err(DocsError::validation(
            "y_update",
            format!("page exceeds the {} byte limit", MAX_UPDATE_BYTES),
        ));
    }
    Ok(())
}

/// One loading page per index in `[0, page_count)`, at most `MAX_PAGES`.
/// Indices missing from the metadata start as empty Body pages.
fn seed_pages(meta: &DocumentMeta) -> Vec<PageEditState> {
    if meta.page_count > MAX_PAGES {
        warn!(
            "[DOCS] Document {} reports {} pages, keeping the first {}",
            meta.id, meta.page_count, MAX_PAGES
        );
    }
    let count = usize::try_from(meta.page_count.min(MAX_PAGES)).unwrap_or(0);
    (0..count)
        .map(|index| {
            let page_meta = meta
                .pages
                .iter()
                .find(|p| p.page_index == index as i64)
                .cloned()
                .unwrap_or(PageMeta {
                    page_index: index as i64,
                    style: PageStyle::Body.code(),
                    updated_at: meta.updated_at,
                });
            PageEditState::seeded(index, &page_meta)
        })
        .collect()
}
