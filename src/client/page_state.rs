//! # Page Edit State
//!
//! Per-page view-model: the working copy of one page plus its load/save flags.
//!
//! Every local edit bumps `edit_version`. A save captures the version in a
//! [`SaveSnapshot`]; when the save succeeds, `dirty` is cleared only if no edit
//! happened in between, so a slow save can never mark newer text as saved.

use crate::client::codec;
use crate::shared::docs::{PageMeta, PageOpenPayload, PageStyle};
use crate::shared::error::{DocsError, DocsResult};

/// Working copy of a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEditState {
    pub index: usize,
    pub style: PageStyle,
    pub text: String,
    pub loading: bool,
    pub dirty: bool,
    pub saving: bool,
    pub error: Option<DocsError>,
    /// Last update time reported by the service (unix seconds)
    pub updated_at: Option<i64>,
    edit_version: u64,
    load_failed: bool,
}

/// What a save sends, captured at save start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSnapshot {
    pub index: usize,
    pub style: PageStyle,
    pub text: String,
    pub version: u64,
}

impl PageEditState {
    /// A page seeded from document metadata, waiting for its content
    pub fn seeded(index: usize, meta: &PageMeta) -> Self {
        Self {
            index,
            style: meta.style(),
            text: String::new(),
            loading: true,
            dirty: false,
            saving: false,
            error: None,
            updated_at: Some(meta.updated_at),
            edit_version: 0,
            load_failed: false,
        }
    }

    pub fn edit_version(&self) -> u64 {
        self.edit_version
    }

    /// Loaded and not broken: the only state in which edits are accepted
    pub fn is_editable(&self) -> bool {
        !self.loading && !self.load_failed
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Prepare for a (re)load of the page content
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.load_failed = false;
        self.error = None;
    }

    /// Apply fetched content. A payload that does not decode fails the page.
    pub fn finish_load(&mut self, payload: &PageOpenPayload) -> DocsResult<()> {
        match codec::decode(&payload.y_update) {
            Ok(text) => {
                self.text = text;
                self.style = payload.style();
                self.loading = false;
                self.load_failed = false;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.fail_load(err.clone());
                Err(err)
            }
        }
    }

    pub fn fail_load(&mut self, err: DocsError) {
        self.loading = false;
        self.load_failed = true;
        self.error = Some(err);
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.mark_edited();
    }

    pub fn set_style(&mut self, style: PageStyle) {
        self.style = style;
        self.mark_edited();
    }

    fn mark_edited(&mut self) {
        self.edit_version += 1;
        self.dirty = true;
    }

    /// Start a save. Returns `None` when there is nothing to save or a save is
    /// already in flight.
    pub fn begin_save(&mut self) -> Option<SaveSnapshot> {
        if !self.dirty || self.saving {
            return None;
        }
        self.saving = true;
        self.error = None;
        Some(SaveSnapshot {
            index: self.index,
            style: self.style,
            text: self.text.clone(),
            version: self.edit_version,
        })
    }

    /// Record a successful save. Returns whether the page is now clean.
    pub fn complete_save(&mut self, snapshot: &SaveSnapshot, updated_at: i64) -> bool {
        self.saving = false;
        self.updated_at = Some(updated_at);
        if snapshot.version == self.edit_version {
            self.dirty = false;
        }
        !self.dirty
    }

    /// Record a failed save. The page stays dirty.
    pub fn fail_save(&mut self, err: DocsError) {
        self.saving = false;
        self.error = Some(err);
    }
}
