//! Membership Data Structures
//!
//! Represents document members and join requests.

use crate::shared::error::DocsError;
use serde::{Deserialize, Serialize};

/// Maximum members of a document, owner included
pub const MAX_DOC_MEMBERS: usize = 10;

/// Status of a join request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum JoinRequestStatus {
    /// Waiting for the owner
    #[default]
    Pending,
    /// Requester became an editor
    Approved,
    /// Owner refused the request
    Denied,
}

impl JoinRequestStatus {
    pub fn code(self) -> i64 {
        match self {
            JoinRequestStatus::Pending => 0,
            JoinRequestStatus::Approved => 1,
            JoinRequestStatus::Denied => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "pending",
            JoinRequestStatus::Approved => "approved",
            JoinRequestStatus::Denied => "denied",
        }
    }

    /// Approved and denied requests are never reopened
    pub fn is_terminal(self) -> bool {
        !matches!(self, JoinRequestStatus::Pending)
    }
}

impl TryFrom<i64> for JoinRequestStatus {
    type Error = DocsError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(JoinRequestStatus::Pending),
            1 => Ok(JoinRequestStatus::Approved),
            2 => Ok(JoinRequestStatus::Denied),
            other => Err(DocsError::validation(
                "status",
                format!("unknown join request status {}", other),
            )),
        }
    }
}

impl From<JoinRequestStatus> for i64 {
    fn from(status: JoinRequestStatus) -> Self {
        status.code()
    }
}

/// A request by a non-member to gain edit access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Unique request ID
    pub id: i64,
    /// Document the requester wants to edit
    pub doc_id: i64,
    /// User who sent the request
    pub user_id: i64,
    /// Optional message with the request
    pub message: Option<String>,
    /// Current status of the request
    #[serde(default)]
    pub status: JoinRequestStatus,
    /// When the request was created (unix seconds)
    pub created_at: i64,
    /// When the owner decided
    pub decided_at: Option<i64>,
    /// Owner who decided
    pub decided_by: Option<i64>,
}

impl JoinRequest {
    /// Check if the request is pending
    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }
}

/// Role of a member. Wire codes: 3=owner, 2=editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MemberRole {
    Owner,
    Editor,
}

impl TryFrom<i64> for MemberRole {
    type Error = DocsError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            3 => Ok(MemberRole::Owner),
            2 => Ok(MemberRole::Editor),
            other => Err(DocsError::validation(
                "role",
                format!("invalid member role {}", other),
            )),
        }
    }
}

impl From<MemberRole> for i64 {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Owner => 3,
            MemberRole::Editor => 2,
        }
    }
}

/// A member of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberItem {
    pub user_id: i64,
    pub role: MemberRole,
    pub added_at: i64,
}

/// Response for listing members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMembersResponse {
    #[serde(default)]
    pub items: Vec<MemberItem>,
}

/// Request body for a new join request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJoinRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response after sending a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJoinRequestResponse {
    pub request_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveJoinResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyJoinResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveMemberResponse {
    pub removed: u64,
}

/// Outcome of approving or denying a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// This call moved the request out of `Pending`
    Applied,
    /// The request was already approved or denied; nothing changed
    AlreadyResolved,
}
