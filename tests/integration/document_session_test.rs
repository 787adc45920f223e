//! Document session integration tests
//!
//! Page loading, dirty tracking, saves racing edits, and completions landing
//! after the session moved on.

use crate::common::*;
use assert_matches::assert_matches;
use pagedocs::client::api::MembershipService;
use pagedocs::client::document_session::{
    ACCESS_REQUESTED_BANNER, DEFAULT_ACCESS_MESSAGE, NOT_MEMBER_BANNER,
};
use pagedocs::client::{
    Access, DocumentSession, InMemoryDocsService, MembershipWorkflow, SaveOutcome, SessionStatus,
};
use pagedocs::shared::docs::{PageStyle, MAX_UPDATE_BYTES};
use pagedocs::shared::error::DocsError;
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn scripted_doc(pages: i64) -> (Arc<ScriptedService>, i64) {
    init_tracing();
    let inner = InMemoryDocsService::for_user(OWNER_ID);
    let doc_id = create_doc(&inner, "Quarterly plan", pages).await;
    (Arc::new(ScriptedService::new(inner)), doc_id)
}

fn session_on(service: &Arc<ScriptedService>, user_id: i64) -> DocumentSession {
    DocumentSession::new(service.clone(), viewer(user_id))
}

#[tokio::test]
async fn test_open_loads_every_page() {
    let (service, doc_id) = scripted_doc(3).await;
    write_page(service.inner(), doc_id, 1, PageStyle::Title, "Overview").await;

    let session = session_on(&service, OWNER_ID);
    crate::assert_ok!(session.open(doc_id).await);

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.title().as_deref(), Some("Quarterly plan"));
    assert_eq!(session.access(), Some(Access::Owner));
    assert!(session.can_edit());
    assert_eq!(session.banner(), None);

    let pages = session.pages();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| !p.loading && p.error.is_none() && !p.dirty));
    assert_eq!(pages[1].text, "Overview");
    assert_eq!(pages[1].style, PageStyle::Title);
    assert_eq!(pages[0].style, PageStyle::Body);
    assert_eq!(service.calls(Op::OpenPage), 3);
}

#[tokio::test]
async fn test_page_failure_is_isolated() {
    let (service, doc_id) = scripted_doc(3).await;
    service.fail_page(Op::OpenPage, 1, DocsError::transient("502 Bad Gateway"));

    let session = session_on(&service, OWNER_ID);
    crate::assert_ok!(session.open(doc_id).await);
    assert_eq!(session.status(), SessionStatus::Ready);

    for index in [0, 2] {
        let page = session.page(index).unwrap();
        assert!(!page.loading);
        assert_eq!(page.error, None);
        assert!(page.is_editable());
    }

    let failed = session.page(1).unwrap();
    assert!(!failed.loading);
    assert!(failed.load_failed());
    assert_matches!(failed.error, Some(DocsError::TransientServiceError { .. }));
    crate::assert_validation!(session.set_text(1, "nope"), "page");

    service.clear_failures();
    crate::assert_ok!(session.reload_page(1).await);
    assert!(session.page(1).unwrap().is_editable());
    crate::assert_ok!(session.set_text(1, "recovered"));
}

#[tokio::test]
async fn test_reload_rejects_loaded_page() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    crate::assert_validation!(session.reload_page(0).await, "page");
}

#[tokio::test]
async fn test_metadata_failure_fails_document() {
    let (service, doc_id) = scripted_doc(2).await;
    service.fail(Op::GetDocument, DocsError::transient("connection reset"));

    let session = session_on(&service, OWNER_ID);
    let err = session.open(doc_id).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(session.status(), SessionStatus::Failed);
    assert!(session.banner().unwrap().contains("connection reset"));
    assert!(session.pages().is_empty());
    assert_eq!(service.calls(Op::OpenPage), 0);
}

#[tokio::test]
async fn test_stranger_routes_to_not_member() {
    let (service, doc_id) = scripted_doc(2).await;
    let session = session_on(&service, STRANGER_ID);

    assert_eq!(session.open(doc_id).await, Err(DocsError::NotMember));
    assert_eq!(session.status(), SessionStatus::NotMember);
    assert_eq!(session.access(), Some(Access::NotMember));
    assert_eq!(session.banner().as_deref(), Some(NOT_MEMBER_BANNER));
    assert!(!session.can_edit());
    assert_eq!(session.set_text(0, "hi"), Err(DocsError::NotMember));
}

#[tokio::test]
async fn test_unknown_page_index() {
    let (service, doc_id) = scripted_doc(2).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    assert_matches!(session.set_text(5, "x"), Err(DocsError::NotFound { .. }));
    assert_matches!(
        session.set_style(2, PageStyle::Title),
        Err(DocsError::NotFound { .. })
    );
    assert_matches!(session.save_one(9).await, Err(DocsError::NotFound { .. }));
}

#[tokio::test]
async fn test_dirty_until_saved() {
    let (service, doc_id) = scripted_doc(2).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    session.set_text(0, "Draft intro").unwrap();
    assert!(session.page(0).unwrap().dirty);
    assert!(session.has_dirty_pages());
    assert_eq!(session.dirty_pages(), vec![0]);

    let outcome = session.save_one(0).await.unwrap();
    assert_matches!(outcome, SaveOutcome::Saved { .. });
    assert!(!session.page(0).unwrap().dirty);
    assert!(!session.has_dirty_pages());
    assert_eq!(stored_text(service.inner(), doc_id, 0), "Draft intro");

    assert_eq!(session.save_one(0).await, Ok(SaveOutcome::Skipped));
    assert_eq!(service.calls(Op::UpsertPage), 1);
}

#[tokio::test]
async fn test_style_is_saved() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    session.set_text(0, "Chapter one").unwrap();
    session.set_style(0, PageStyle::Heading).unwrap();
    session.save_one(0).await.unwrap();

    let (style, _) = service.inner().page_content(doc_id, 0).unwrap();
    assert_eq!(style, PageStyle::Heading);
}

#[tokio::test]
async fn test_empty_page_fails_locally() {
    let (service, doc_id) = scripted_doc(1).await;
    write_page(service.inner(), doc_id, 0, PageStyle::Body, "old text").await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    session.set_text(0, "").unwrap();
    crate::assert_validation!(session.save_one(0).await, "y_update");

    let page = session.page(0).unwrap();
    assert!(page.dirty);
    assert!(!page.saving);
    assert!(page.error.is_some());
    assert_eq!(service.calls(Op::UpsertPage), 0);
    assert_eq!(stored_text(service.inner(), doc_id, 0), "old text");

    session.set_text(0, "new text").unwrap();
    assert_matches!(session.save_one(0).await, Ok(SaveOutcome::Saved { .. }));
    assert_eq!(session.page(0).unwrap().error, None);
}

#[tokio::test]
async fn test_edit_during_save_stays_dirty() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "first").unwrap();

    let gate = service.gate(Op::UpsertPage);
    let edit = async {
        gate.entered.notified().await;
        assert!(session.page(0).unwrap().saving);
        session.set_text(0, "second").unwrap();
        gate.release.notify_one();
    };
    let (outcome, ()) = tokio::join!(session.save_one(0), edit);

    assert_matches!(outcome, Ok(SaveOutcome::Superseded { .. }));
    let page = session.page(0).unwrap();
    assert!(page.dirty);
    assert!(!page.saving);
    assert_eq!(page.text, "second");
    assert_eq!(stored_text(service.inner(), doc_id, 0), "first");

    service.remove_gate(Op::UpsertPage);
    assert_matches!(session.save_one(0).await, Ok(SaveOutcome::Saved { .. }));
    assert!(!session.page(0).unwrap().dirty);
    assert_eq!(stored_text(service.inner(), doc_id, 0), "second");
}

#[tokio::test]
async fn test_save_while_saving_is_skipped() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "once").unwrap();

    let gate = service.gate(Op::UpsertPage);
    let second = async {
        gate.entered.notified().await;
        let outcome = session.save_one(0).await;
        gate.release.notify_one();
        outcome
    };
    let (first, second) = tokio::join!(session.save_one(0), second);

    assert_matches!(first, Ok(SaveOutcome::Saved { .. }));
    assert_eq!(second, Ok(SaveOutcome::Skipped));
    assert_eq!(service.calls(Op::UpsertPage), 1);
}

#[tokio::test]
async fn test_failed_save_keeps_edit() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "keep me").unwrap();

    service.fail(Op::UpsertPage, DocsError::transient("timeout"));
    let err = session.save_one(0).await.unwrap_err();
    assert!(err.is_transient());

    let page = session.page(0).unwrap();
    assert!(page.dirty);
    assert!(!page.saving);
    assert_eq!(page.error, Some(err));
    assert_eq!(page.text, "keep me");

    service.clear_failures();
    assert_matches!(session.save_one(0).await, Ok(SaveOutcome::Saved { .. }));
    assert_eq!(session.page(0).unwrap().error, None);
}

#[tokio::test]
async fn test_save_all_partial_failure() {
    let (service, doc_id) = scripted_doc(3).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    session.set_text(0, "alpha").unwrap();
    session.set_text(1, "beta").unwrap();
    service.fail_page(Op::UpsertPage, 1, DocsError::transient("503"));

    let report = session.save_all().await;

    assert_eq!(report.saved, vec![0]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 1);
    assert!(!report.is_complete());

    let pages = session.pages();
    assert!(!pages[0].dirty);
    assert!(pages[1].dirty);
    assert!(pages[1].error.is_some());
    assert!(!pages[2].dirty);
    assert_eq!(service.calls(Op::UpsertPage), 2);
}

#[tokio::test]
async fn test_oversized_page_fails_locally() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();

    session.set_text(0, "a".repeat(MAX_UPDATE_BYTES + 1)).unwrap();
    crate::assert_validation!(session.save_one(0).await, "y_update");

    let page = session.page(0).unwrap();
    assert!(page.dirty);
    assert!(!page.saving);
    assert!(page.error.is_some());
    assert_eq!(service.calls(Op::UpsertPage), 0);
}

#[tokio::test]
async fn test_close_reports_discarded_pages() {
    let (service, doc_id) = scripted_doc(3).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(2, "unsaved").unwrap();

    assert_eq!(session.close(), vec![2]);
    assert_eq!(session.status(), SessionStatus::Closed);
    assert!(session.pages().is_empty());
    assert_eq!(session.document_id(), None);
    crate::assert_validation!(session.set_text(2, "again"), "session");
    assert_eq!(stored_text(service.inner(), doc_id, 2), "");
}

#[tokio::test]
async fn test_save_completing_after_close_is_dropped() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "late").unwrap();

    let gate = service.gate(Op::UpsertPage);
    let close = async {
        gate.entered.notified().await;
        assert_eq!(session.close(), vec![0]);
        gate.release.notify_one();
    };
    let (outcome, ()) = tokio::join!(session.save_one(0), close);

    assert_eq!(outcome, Ok(SaveOutcome::Discarded));
    assert_eq!(session.status(), SessionStatus::Closed);
    assert!(session.pages().is_empty());
}

#[tokio::test]
async fn test_save_completing_after_reopen_leaves_new_state() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "old session").unwrap();

    let gate = service.gate(Op::UpsertPage);
    let reopen = async {
        gate.entered.notified().await;
        session.close();
        session.open(doc_id).await.unwrap();
        session.set_text(0, "new session").unwrap();
        gate.release.notify_one();
    };
    let (outcome, ()) = tokio::join!(session.save_one(0), reopen);

    assert_eq!(outcome, Ok(SaveOutcome::Discarded));
    let page = session.page(0).unwrap();
    assert_eq!(page.text, "new session");
    assert!(page.dirty);
    assert!(!page.saving);
    assert_eq!(page.error, None);
}

#[tokio::test]
async fn test_page_load_after_close_is_dropped() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);

    let gate = service.gate(Op::OpenPage);
    let close = async {
        gate.entered.notified().await;
        session.close();
        gate.release.notify_one();
    };
    let (opened, ()) = tokio::join!(session.open(doc_id), close);

    assert_eq!(opened, Ok(()));
    assert_eq!(session.status(), SessionStatus::Closed);
    assert!(session.pages().is_empty());
}

#[tokio::test]
async fn test_removed_editor_save_routes_to_not_member() {
    let (service, doc_id) = scripted_doc(1).await;
    add_editor(service.inner(), doc_id, EDITOR_ID).await;

    let editor_service = Arc::new(ScriptedService::new(service.inner().as_user(EDITOR_ID)));
    let session = session_on(&editor_service, EDITOR_ID);
    session.open(doc_id).await.unwrap();
    assert_eq!(session.access(), Some(Access::Editor));

    session.set_text(0, "contribution").unwrap();
    service
        .inner()
        .remove_member(doc_id, EDITOR_ID)
        .await
        .unwrap();

    assert_eq!(session.save_one(0).await, Err(DocsError::NotMember));
    assert_eq!(session.status(), SessionStatus::NotMember);
    assert_eq!(session.banner().as_deref(), Some(NOT_MEMBER_BANNER));
    assert!(session.page(0).unwrap().dirty);
    assert!(!session.can_edit());
}

#[tokio::test]
async fn test_removed_editor_save_all_marks_every_dirty_page() {
    let (service, doc_id) = scripted_doc(3).await;
    add_editor(service.inner(), doc_id, EDITOR_ID).await;

    let editor_service = Arc::new(ScriptedService::new(service.inner().as_user(EDITOR_ID)));
    let session = session_on(&editor_service, EDITOR_ID);
    session.open(doc_id).await.unwrap();
    session.set_text(0, "first draft").unwrap();
    session.set_text(1, "second draft").unwrap();
    service
        .inner()
        .remove_member(doc_id, EDITOR_ID)
        .await
        .unwrap();

    let report = session.save_all().await;

    assert!(report.saved.is_empty());
    let failed: Vec<usize> = report.failed.iter().map(|(index, _)| *index).collect();
    assert_eq!(failed, vec![0, 1]);
    assert!(report.failed.iter().all(|(_, err)| err.is_not_member()));
    for index in failed {
        let page = session.page(index).unwrap();
        assert!(page.dirty);
        assert!(!page.saving);
        assert_eq!(page.error, Some(DocsError::NotMember));
    }
    let untouched = session.page(2).unwrap();
    assert!(!untouched.dirty);
    assert_eq!(untouched.error, None);
    assert_eq!(session.status(), SessionStatus::NotMember);
    assert_eq!(editor_service.calls(Op::UpsertPage), 1);
}

#[tokio::test]
async fn test_request_access_from_not_member() {
    init_tracing();
    let owner = InMemoryDocsService::for_user(OWNER_ID);
    let doc_id = create_doc(&owner, "Private", 1).await;
    let stranger = Arc::new(owner.as_user(STRANGER_ID));

    let session = DocumentSession::new(stranger.clone(), viewer(STRANGER_ID));
    let workflow = MembershipWorkflow::new(stranger.clone(), stranger.clone(), viewer(STRANGER_ID));

    let _ = session.open(doc_id).await;
    let request_id = session.request_access(&workflow, None).await.unwrap();

    assert_eq!(session.banner().as_deref(), Some(ACCESS_REQUESTED_BANNER));
    let request = owner.join_request(request_id).unwrap();
    assert!(request.is_pending());
    assert_eq!(request.user_id, STRANGER_ID);
    assert_eq!(request.message.as_deref(), Some(DEFAULT_ACCESS_MESSAGE));
}

#[tokio::test]
async fn test_request_access_only_when_not_member() {
    let (service, doc_id) = scripted_doc(1).await;
    let session = session_on(&service, OWNER_ID);
    session.open(doc_id).await.unwrap();
    let workflow = MembershipWorkflow::new(service.clone(), service.clone(), viewer(OWNER_ID));

    crate::assert_validation!(session.request_access(&workflow, Some("let me in")).await, "session");
    assert_eq!(service.calls(Op::CreateJoinRequest), 0);
}
