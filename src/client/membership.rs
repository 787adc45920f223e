//! # Membership Workflow
//!
//! Join requests and owner-side member management for documents.
//!
//! A viewer who is not an editor of a document sends a join request; the owner
//! approves or denies it. Approving and denying are idempotent: resolving a
//! request that was already decided yields [`Resolution::AlreadyResolved`]
//! instead of an error.
//!
//! ```text
//! pending --approve--> approved
//! pending --deny-----> denied
//! ```

use crate::client::api::{DocumentService, MembershipService};
use crate::client::session::ViewerSession;
use crate::shared::docs::{DocumentMeta, MemberItem, MemberRole, Resolution};
use crate::shared::error::{DocsError, DocsResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What the viewer may do with a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Editor,
    NotMember,
}

impl Access {
    pub fn can_edit(self) -> bool {
        matches!(self, Access::Owner | Access::Editor)
    }

    pub fn is_owner(self) -> bool {
        self == Access::Owner
    }
}

/// Access of `viewer` to a document whose metadata it was allowed to read.
///
/// Metadata is only served to editors, so the answer is `Owner` or `Editor`.
pub fn access_for(viewer: &ViewerSession, meta: &DocumentMeta) -> Access {
    if meta.owner_id == viewer.user_id {
        Access::Owner
    } else {
        Access::Editor
    }
}

/// Join-request and member operations on behalf of one viewer
pub struct MembershipWorkflow {
    documents: Arc<dyn DocumentService>,
    members: Arc<dyn MembershipService>,
    viewer: ViewerSession,
    /// Last member list fetched per document
    member_cache: Mutex<HashMap<i64, Vec<MemberItem>>>,
}

impl MembershipWorkflow {
    pub fn new(
        documents: Arc<dyn DocumentService>,
        members: Arc<dyn MembershipService>,
        viewer: ViewerSession,
    ) -> Self {
        Self {
            documents,
            members,
            viewer,
            member_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn viewer(&self) -> &ViewerSession {
        &self.viewer
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<i64, Vec<MemberItem>>> {
        self.member_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the owner for edit access. Returns the join request id.
    ///
    /// A blank message is sent as no message. Fails with `Conflict` when the
    /// viewer already is a member. Asking again returns the same request, with
    /// its decision unchanged.
    pub async fn request_access(&self, doc_id: i64, message: Option<&str>) -> DocsResult<i64> {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        info!(
            "[MEMBERS] User {} requesting access to document {}",
            self.viewer.user_id, doc_id
        );
        let response = self.members.create_join_request(doc_id, message).await?;
        debug!("[MEMBERS] Join request {} created", response.request_id);
        Ok(response.request_id)
    }

    /// Members of a document, owner first. Owner only.
    pub async fn list_members(&self, doc_id: i64) -> DocsResult<Vec<MemberItem>> {
        match self.members.list_members(doc_id).await {
            Ok(response) => {
                self.cache().insert(doc_id, response.items.clone());
                Ok(response.items)
            }
            Err(err) => {
                if matches!(err, DocsError::Forbidden { .. } | DocsError::NotFound { .. }) {
                    self.cache().remove(&doc_id);
                }
                warn!("[MEMBERS] Failed to list members of {}: {}", doc_id, err);
                Err(err)
            }
        }
    }

    /// The member list from the last successful `list_members`
    pub fn cached_members(&self, doc_id: i64) -> Option<Vec<MemberItem>> {
        self.cache().get(&doc_id).cloned()
    }

    pub async fn approve(&self, request_id: i64) -> DocsResult<Resolution> {
        let resolution = self.members.approve_join_request(request_id).await?;
        self.log_resolution("approve", request_id, resolution);
        if resolution == Resolution::Applied {
            // A new editor exists somewhere; cached lists are stale.
            self.cache().clear();
        }
        Ok(resolution)
    }

    pub async fn deny(&self, request_id: i64) -> DocsResult<Resolution> {
        let resolution = self.members.deny_join_request(request_id).await?;
        self.log_resolution("deny", request_id, resolution);
        Ok(resolution)
    }

    fn log_resolution(&self, action: &str, request_id: i64, resolution: Resolution) {
        match resolution {
            Resolution::Applied => info!("[MEMBERS] {} request {}", action, request_id),
            Resolution::AlreadyResolved => debug!(
                "[MEMBERS] {} request {}: already resolved, nothing changed",
                action, request_id
            ),
        }
    }

    /// Remove an editor. Returns whether a membership was actually removed.
    ///
    /// The owner can never be removed; when the cached list already shows the
    /// target is the owner the call fails without a round trip.
    pub async fn remove_member(&self, doc_id: i64, user_id: i64) -> DocsResult<bool> {
        let target_is_owner = self.cache().get(&doc_id).is_some_and(|members| {
            members
                .iter()
                .any(|m| m.user_id == user_id && m.role == MemberRole::Owner)
        });
        if target_is_owner {
            return Err(DocsError::forbidden("cannot remove the owner"));
        }

        let response = self.members.remove_member(doc_id, user_id).await?;
        if let Some(members) = self.cache().get_mut(&doc_id) {
            members.retain(|m| m.user_id != user_id);
        }
        info!(
            "[MEMBERS] Removed user {} from document {} ({} row(s))",
            user_id, doc_id, response.removed
        );
        Ok(response.removed > 0)
    }

    /// Whether the viewer may edit `doc_id`
    pub async fn resolve_access(&self, doc_id: i64) -> DocsResult<Access> {
        match self.documents.get_document(doc_id).await {
            Ok(meta) => Ok(access_for(&self.viewer, &meta)),
            Err(DocsError::NotMember) => Ok(Access::NotMember),
            Err(err) => Err(err),
        }
    }
}
