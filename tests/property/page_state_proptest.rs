//! Property-based tests for page dirty tracking
//!
//! Random interleavings of edits and saves; a page is clean exactly when a
//! save started after its latest edit has completed.

use pagedocs::client::page_state::{PageEditState, SaveSnapshot};
use pagedocs::shared::docs::{PageMeta, PageOpenPayload, PageStyle};
use pagedocs::shared::error::DocsError;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Edit(String),
    Restyle(PageStyle),
    BeginSave,
    CompleteSave,
    FailSave,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(Step::Edit),
        prop::sample::select(PageStyle::ALL.to_vec()).prop_map(Step::Restyle),
        Just(Step::BeginSave),
        Just(Step::CompleteSave),
        Just(Step::FailSave),
    ]
}

fn loaded_page() -> PageEditState {
    let meta = PageMeta {
        page_index: 0,
        style: 3,
        updated_at: 0,
    };
    let mut page = PageEditState::seeded(0, &meta);
    page.finish_load(&PageOpenPayload {
        doc_id: 1,
        page_index: 0,
        style: 3,
        y_update: Vec::new(),
    })
    .unwrap();
    page
}

proptest! {
    #[test]
    fn test_dirty_until_fresh_save(steps in proptest::collection::vec(step(), 0..40)) {
        let mut page = loaded_page();
        let mut in_flight: Option<SaveSnapshot> = None;
        let mut clean = true;

        for step in steps {
            match step {
                Step::Edit(text) => {
                    page.set_text(text);
                    clean = false;
                }
                Step::Restyle(style) => {
                    page.set_style(style);
                    clean = false;
                }
                Step::BeginSave => {
                    if let Some(snapshot) = page.begin_save() {
                        prop_assert!(in_flight.is_none());
                        in_flight = Some(snapshot);
                    }
                }
                Step::CompleteSave => {
                    if let Some(snapshot) = in_flight.take() {
                        let fresh = snapshot.version == page.edit_version();
                        prop_assert_eq!(page.complete_save(&snapshot, 1), fresh);
                        if fresh {
                            clean = true;
                        }
                    }
                }
                Step::FailSave => {
                    if in_flight.take().is_some() {
                        page.fail_save(DocsError::transient("unavailable"));
                    }
                }
            }
            prop_assert_eq!(page.dirty, !clean);
            prop_assert_eq!(page.saving, in_flight.is_some());
        }
    }
}
