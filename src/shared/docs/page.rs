//! Page Data Structures
//!
//! Wire types for opening and saving a single page, and the page style tag.

use crate::shared::error::DocsError;
use serde::{Deserialize, Serialize};

/// Largest decoded update the service accepts for one page
pub const MAX_UPDATE_BYTES: usize = 512 * 1024;

/// Presentation style of a page.
///
/// On the wire this is an integer code: 1=Title, 2=Heading, 3=Body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PageStyle {
    Title,
    Heading,
    #[default]
    Body,
}

impl PageStyle {
    pub const ALL: [PageStyle; 3] = [PageStyle::Title, PageStyle::Heading, PageStyle::Body];

    pub fn code(self) -> i64 {
        match self {
            PageStyle::Title => 1,
            PageStyle::Heading => 2,
            PageStyle::Body => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PageStyle::Title),
            2 => Some(PageStyle::Heading),
            3 => Some(PageStyle::Body),
            _ => None,
        }
    }

    /// Map a code received from the service onto a renderable style.
    ///
    /// Unknown codes fall back to `Body` so they never reach the rendering layer.
    pub fn normalize(code: i64) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::warn!("[DOCS] Unknown page style code {}, rendering as Body", code);
            PageStyle::Body
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            PageStyle::Title => "Title",
            PageStyle::Heading => "Heading",
            PageStyle::Body => "Body",
        }
    }
}

impl TryFrom<i64> for PageStyle {
    type Error = DocsError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| {
            DocsError::validation("style", format!("unknown page style code {}", code))
        })
    }
}

impl From<PageStyle> for i64 {
    fn from(style: PageStyle) -> Self {
        style.code()
    }
}

/// Per-page entry of the document metadata (no content)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page_index: i64,
    /// Raw style code as sent by the service
    pub style: i64,
    pub updated_at: i64,
}

impl PageMeta {
    pub fn style(&self) -> PageStyle {
        PageStyle::normalize(self.style)
    }
}

/// Content of a page as returned by the open-page endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOpenPayload {
    #[serde(default)]
    pub doc_id: i64,
    #[serde(default)]
    pub page_index: i64,
    /// Raw style code as sent by the service
    pub style: i64,
    /// Opaque update bytes, sent as a JSON array of numbers
    #[serde(default)]
    pub y_update: Vec<u8>,
}

impl PageOpenPayload {
    pub fn style(&self) -> PageStyle {
        PageStyle::normalize(self.style)
    }
}

/// Body of the upsert-page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<PageStyle>,
    /// Base64 armor of the page's update bytes
    pub y_update_base64: String,
}

/// Response after saving a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPageResponse {
    pub updated: u64,
    pub updated_at: i64,
}
