use httpmock::MockServer;

/// Starts a fresh `httpmock::MockServer`, or `None` when this environment cannot bind one.
///
/// The server is started on its own thread so callers inside a Tokio runtime are not blocked
/// by the mock server's internal executor, and so a bind panic can be caught.
pub fn start_mock_server() -> Option<MockServer> {
    std::thread::spawn(MockServer::start).join().ok()
}
