//! Unit tests for faultline
//!
//! These tests use mocked platform executors and run without external I/O.

mod discovery_service;
mod helpers;
mod property_tests;
