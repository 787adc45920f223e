//! Test suite for pagedocs
//!
//! This module organizes all tests

pub mod integration;
