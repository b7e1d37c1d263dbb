use std::sync::{Arc, Mutex};

use crate::logger::{render_message, LogLevel, Logger};

/// Records captured by a logger from [`capturing_logger`].
#[derive(Clone, Default)]
pub struct CapturedLogs {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl CapturedLogs {
    pub fn warnings(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Warn)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

/// Builds a logger whose handler records every message regardless of level.
pub fn capturing_logger(name: &str) -> (Logger, CapturedLogs) {
    let logger = Logger::new(format!("@functions-proxy/test/{name}"));
    let captured = CapturedLogs::default();
    let sink = Arc::clone(&captured.records);
    logger.set_log_handler(move |_, level, args| {
        sink.lock().unwrap().push((level, render_message(args)));
    });
    (logger, captured)
}
