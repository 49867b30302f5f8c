//! Consolidated test modules.
//!
//! End-to-end tests that exercise the full guard → proxy pipeline through
//! the assembled router, with a wiremock double standing in for the
//! upstream.
