//! Test utilities shared across crate-level unit tests.

pub mod http;
pub mod logging;

pub use http::start_mock_server;
pub use logging::{capturing_logger, CapturedLogs};
