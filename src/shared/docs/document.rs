//! Document Data Structures
//!
//! Listing, creation and metadata types exchanged with the document service.

use super::page::PageMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest page count a document may have
pub const MIN_PAGES: i64 = 1;

/// Largest page count a document may have
pub const MAX_PAGES: i64 = 10;

/// Longest title accepted, in characters, after trimming
pub const MAX_TITLE_CHARS: usize = 120;

/// A document as it appears in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRow {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub page_count: i64,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl DocumentRow {
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.updated_at, 0)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// One page of the catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentListResponse {
    #[serde(default)]
    pub items: Vec<DocumentRow>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

/// Request to create a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocRequest {
    pub title: String,
    pub page_count: i64,
}

/// Response after creating a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocResponse {
    pub id: i64,
}

/// Document metadata, including per-page style and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub page_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub pages: Vec<PageMeta>,
}

impl DocumentMeta {
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.updated_at, 0)
    }
}
