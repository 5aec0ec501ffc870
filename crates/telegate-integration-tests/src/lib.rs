//! End-to-end tests for Telegate
//!
//! The tests under `tests/` mount the telemetry router over the in-memory
//! store and drive it with real HTTP requests.
