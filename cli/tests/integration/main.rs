//! Integration tests for the faultline CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reaches a platform: every case fails or finishes before the
//! first `cf` or `bosh` call.

mod cli_tests;
