//! Document API Client
//!
//! Async reqwest implementation of [`DocumentService`] and [`MembershipService`]
//! against the REST endpoints under `/api/docs`.
//!
//! Non-success responses carry `{"error": {"code": "...", "message": "..."}}`;
//! they are mapped onto [`DocsError`] so callers never see raw status codes.

use super::{DocumentService, MembershipService};
use crate::client::config::Config;
use crate::shared::docs::{
    ApproveJoinResponse, CreateDocRequest, CreateDocResponse, CreateJoinRequestBody,
    CreateJoinRequestResponse, DenyJoinResponse, DocumentListResponse, DocumentMeta,
    ListMembersResponse, PageOpenPayload, RemoveMemberResponse, Resolution, UpsertPageRequest,
    UpsertPageResponse,
};
use crate::shared::error::{DocsError, DocsResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Document API client
#[derive(Debug, Clone)]
pub struct HttpDocsClient {
    config: Config,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: String,
    message: String,
}

impl HttpDocsClient {
    pub fn new(config: Config) -> DocsResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DocsError::validation("config", format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access, e.g. to install the bearer token after login
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.api_url(path);
        debug!("[HTTP] {} {}", method, url);
        let request = self.client.request(method, &url);
        match self.config.get_token() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> DocsResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            let error = map_error_response(status, &error_text);
            warn!("[HTTP] Request failed with {}: {}", status, error);
            return Err(error);
        }

        Ok(response.json::<T>().await?)
    }
}

/// Translate a non-success response into the error taxonomy.
pub(crate) fn map_error_response(status: StatusCode, body: &str) -> DocsError {
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) if body.trim().is_empty() => (String::new(), status.to_string()),
        Err(_) => (String::new(), body.trim().to_string()),
    };

    match status {
        StatusCode::UNAUTHORIZED => DocsError::forbidden("authentication required"),
        StatusCode::FORBIDDEN => match classify(&code, &message) {
            DocsError::NotMember => DocsError::NotMember,
            _ => DocsError::forbidden(message),
        },
        StatusCode::NOT_FOUND => DocsError::not_found(message),
        StatusCode::CONFLICT => DocsError::conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            DocsError::transient(format!("{}: {}", status, message))
        }
        s if s.is_client_error() => classify(&code, &message),
        _ => DocsError::transient(format!("{}: {}", status, message)),
    }
}

/// The service reports most document rule violations as 400 with a code and
/// message; pick the variant from their wording.
fn classify(code: &str, message: &str) -> DocsError {
    let key = format!("{} {}", code, message).to_lowercase();

    if key.contains("not an editor")
        || key.contains("not_doc_editor")
        || key.contains("not a viewer")
        || key.contains("not_doc_viewer")
    {
        DocsError::NotMember
    } else if key.contains("not the owner")
        || key.contains("not_doc_owner")
        || key.contains("cannot remove")
        || key.contains("cannot_remove")
    {
        DocsError::forbidden(message)
    } else if key.contains("not found") || key.contains("not_found") {
        DocsError::not_found(message)
    } else {
        let field = if key.contains("pending") {
            "join_request"
        } else if key.contains("member") {
            "members"
        } else if key.contains("title") {
            "title"
        } else if key.contains("update") {
            "y_update"
        } else {
            "request"
        };
        DocsError::validation(field, message)
    }
}

fn is_already_resolved(err: &DocsError) -> bool {
    matches!(err, DocsError::Validation { field, .. } if field == "join_request")
}

#[async_trait]
impl DocumentService for HttpDocsClient {
    async fn list_documents(&self, page: i64, limit: i64) -> DocsResult<DocumentListResponse> {
        let request = self
            .request(Method::GET, "/api/docs")
            .query(&[("page", page), ("limit", limit)]);
        self.send(request).await
    }

    async fn create_document(&self, request: CreateDocRequest) -> DocsResult<CreateDocResponse> {
        let request = self.request(Method::POST, "/api/docs").json(&request);
        self.send(request).await
    }

    async fn get_document(&self, doc_id: i64) -> DocsResult<DocumentMeta> {
        let request = self.request(Method::GET, &format!("/api/docs/{}", doc_id));
        self.send(request).await
    }

    async fn open_page(&self, doc_id: i64, page_index: i64) -> DocsResult<PageOpenPayload> {
        let request = self.request(
            Method::GET,
            &format!("/api/docs/{}/pages/{}", doc_id, page_index),
        );
        self.send(request).await
    }

    async fn upsert_page(
        &self,
        doc_id: i64,
        page_index: i64,
        request: UpsertPageRequest,
    ) -> DocsResult<UpsertPageResponse> {
        let request = self
            .request(
                Method::PUT,
                &format!("/api/docs/{}/pages/{}", doc_id, page_index),
            )
            .json(&request);
        self.send(request).await
    }
}

#[async_trait]
impl MembershipService for HttpDocsClient {
    async fn create_join_request(
        &self,
        doc_id: i64,
        message: Option<String>,
    ) -> DocsResult<CreateJoinRequestResponse> {
        let body = CreateJoinRequestBody { message };
        let request = self
            .request(Method::POST, &format!("/api/docs/{}/join_requests", doc_id))
            .json(&body);
        self.send(request).await
    }

    async fn list_members(&self, doc_id: i64) -> DocsResult<ListMembersResponse> {
        let request = self.request(Method::GET, &format!("/api/docs/{}/members", doc_id));
        self.send(request).await
    }

    async fn approve_join_request(&self, request_id: i64) -> DocsResult<Resolution> {
        let request = self
            .request(
                Method::POST,
                &format!("/api/docs/requests/{}/approve", request_id),
            )
            .json(&serde_json::json!({}));
        match self.send::<ApproveJoinResponse>(request).await {
            Ok(response) if response.ok => Ok(Resolution::Applied),
            Ok(_) => Ok(Resolution::AlreadyResolved),
            Err(err) if is_already_resolved(&err) => Ok(Resolution::AlreadyResolved),
            Err(err) => Err(err),
        }
    }

    async fn deny_join_request(&self, request_id: i64) -> DocsResult<Resolution> {
        let request = self
            .request(Method::POST, &format!("/api/docs/requests/{}/deny", request_id))
            .json(&serde_json::json!({}));
        match self.send::<DenyJoinResponse>(request).await {
            Ok(response) if response.updated > 0 => Ok(Resolution::Applied),
            Ok(_) => Ok(Resolution::AlreadyResolved),
            Err(err) if is_already_resolved(&err) => Ok(Resolution::AlreadyResolved),
            Err(err) => Err(err),
        }
    }

    async fn remove_member(&self, doc_id: i64, user_id: i64) -> DocsResult<RemoveMemberResponse> {
        let request = self.request(
            Method::DELETE,
            &format!("/api/docs/{}/members/{}", doc_id, user_id),
        );
        self.send(request).await
    }
}
