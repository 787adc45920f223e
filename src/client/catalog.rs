//! # Document Catalog
//!
//! Paginated listing of the documents the viewer owns or edits, and document
//! creation.
//!
//! Creation input is validated before any call: a blank or overlong title and a
//! page count outside `1..=10` are rejected locally.

use crate::client::api::DocumentService;
use crate::client::config::Config;
use crate::shared::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::shared::docs::{CreateDocRequest, DocumentRow, MAX_PAGES, MAX_TITLE_CHARS, MIN_PAGES};
use crate::shared::error::{DocsError, DocsResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Trimmed title, or a validation error
pub fn validate_new_document(title: &str, page_count: i64) -> DocsResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DocsError::validation("title", "document title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DocsError::validation(
            "title",
            format!("document title must be at most {} characters", MAX_TITLE_CHARS),
        ));
    }
    if !(MIN_PAGES..=MAX_PAGES).contains(&page_count) {
        return Err(DocsError::validation(
            "page_count",
            format!("page count must be between {} and {}", MIN_PAGES, MAX_PAGES),
        ));
    }
    Ok(title.to_string())
}

/// Parse a page count typed into a free-text field
pub fn parse_page_count(input: &str) -> DocsResult<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| DocsError::validation("page_count", "page count must be a whole number"))
}

/// Paged view over the viewer's documents
pub struct DocumentCatalog {
    service: Arc<dyn DocumentService>,
    limit: i64,
    items: Vec<DocumentRow>,
    page: i64,
    total_pages: i64,
    total: i64,
    loading: bool,
    error: Option<DocsError>,
}

impl DocumentCatalog {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self::with_limit(service, DEFAULT_PAGE_LIMIT)
    }

    /// Page size taken from `DOCS_PAGE_LIMIT` / the client configuration
    pub fn from_config(service: Arc<dyn DocumentService>, config: &Config) -> Self {
        Self::with_limit(service, config.page_limit())
    }

    /// `limit` is clamped to `1..=100`
    pub fn with_limit(service: Arc<dyn DocumentService>, limit: i64) -> Self {
        Self {
            service,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            items: Vec::new(),
            page: 1,
            total_pages: 1,
            total: 0,
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[DocumentRow] {
        &self.items
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&DocsError> {
        self.error.as_ref()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Load listing page `page` (1-based)
    pub async fn load_page(&mut self, page: i64) -> DocsResult<()> {
        let page = page.max(1);
        self.loading = true;
        self.error = None;

        let result = self.service.list_documents(page, self.limit).await;
        self.loading = false;

        match result {
            Ok(response) => {
                self.items = response.items;
                self.page = response.page.max(1);
                self.total_pages = response.total_pages.max(1);
                self.total = response.total;
                Ok(())
            }
            Err(err) => {
                warn!("[CATALOG] Failed to load page {}: {}", page, err);
                self.items.clear();
                self.total_pages = 1;
                self.total = 0;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn refresh(&mut self) -> DocsResult<()> {
        self.load_page(self.page).await
    }

    /// Advance one page; no-op on the last page
    pub async fn next_page(&mut self) -> DocsResult<()> {
        if !self.has_next() {
            return Ok(());
        }
        self.load_page(self.page + 1).await
    }

    /// Go back one page; no-op on the first page
    pub async fn prev_page(&mut self) -> DocsResult<()> {
        if !self.has_prev() {
            return Ok(());
        }
        self.load_page(self.page - 1).await
    }

    /// Create a document and reload the first listing page. Returns its id.
    pub async fn create_document(&mut self, title: &str, page_count: i64) -> DocsResult<i64> {
        let title = validate_new_document(title, page_count)?;

        let response = self
            .service
            .create_document(CreateDocRequest { title, page_count })
            .await?;
        info!("[CATALOG] Created document {}", response.id);

        if let Err(err) = self.load_page(1).await {
            warn!("[CATALOG] Document {} created but reload failed: {}", response.id, err);
        }
        Ok(response.id)
    }
}
