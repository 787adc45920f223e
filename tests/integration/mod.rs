//! Integration tests
//!
//! Workflows exercised end to end against the in-memory authority, plus the
//! HTTP client against a mock server.

pub mod document_session_test;
