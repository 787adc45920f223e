//! Mock server helpers for HTTP client tests

use pagedocs::client::{Config, HttpDocsClient};
use pagedocs::shared::AppConfig;
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

/// A client pointed at `server` with a bearer token set
pub fn client_for(server: &MockServer) -> HttpDocsClient {
    let app = AppConfig::builder()
        .server_url(server.uri())
        .request_timeout_secs(2)
        .build()
        .expect("valid config");
    let mut config = Config::from_app_config(app).expect("valid config");
    config.set_token(Some("test-token".to_string()));
    HttpDocsClient::new(config).expect("http client")
}

/// The service's error envelope
pub fn error_body(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

pub fn error_response(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body(code, message))
}
