use std::sync::{Arc, Mutex};
use std::thread;

use functions_proxy::functions::{
    resolve_function_proxy_url, FunctionsConfig, FunctionsProxy, ResolutionInput,
};
use functions_proxy::logger::{render_message, LogLevel, Logger};

fn recording_logger(name: &str) -> (Logger, Arc<Mutex<Vec<(LogLevel, String)>>>) {
    let logger = Logger::new(format!("@functions-proxy/it/{name}"));
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    logger.set_log_handler(move |_, level, args| {
        sink.lock().unwrap().push((level, render_message(args)));
    });
    (logger, records)
}

fn warnings(records: &Arc<Mutex<Vec<(LogLevel, String)>>>) -> Vec<String> {
    records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, _)| *level == LogLevel::Warn)
        .map(|(_, message)| message.clone())
        .collect()
}

fn input(
    configured_url: Option<&str>,
    project_id: Option<&str>,
    region: &str,
    emulator_host: &str,
    use_emulator: bool,
    name: &str,
) -> ResolutionInput {
    ResolutionInput {
        configured_url: configured_url.map(str::to_string),
        project_id: project_id.map(str::to_string),
        functions_region: region.to_string(),
        emulator_host: emulator_host.to_string(),
        use_emulator,
        function_name: name.to_string(),
    }
}

#[test]
fn no_project_and_no_override_is_unresolvable() {
    let (logger, records) = recording_logger("none");
    let result = resolve_function_proxy_url(
        &input(None, None, "us-central1", "localhost", false, "geocode"),
        &logger,
    );
    assert_eq!(result, None);
    assert!(warnings(&records).is_empty());
}

#[test]
fn emulator_endpoint() {
    let (logger, _) = recording_logger("emulator");
    let result = resolve_function_proxy_url(
        &input(None, Some("proj1"), "us-central1", "127.0.0.1", true, "geocode"),
        &logger,
    );
    assert_eq!(
        result.as_deref(),
        Some("http://127.0.0.1:5001/proj1/us-central1/geocode")
    );
}

#[test]
fn production_endpoint() {
    let (logger, _) = recording_logger("production");
    let result = resolve_function_proxy_url(
        &input(None, Some("proj1"), "us-central1", "127.0.0.1", false, "geocode"),
        &logger,
    );
    assert_eq!(
        result.as_deref(),
        Some("https://us-central1-proj1.cloudfunctions.net/geocode")
    );
}

#[test]
fn unparseable_override_is_returned_verbatim() {
    let (logger, records) = recording_logger("unparseable");
    let result = resolve_function_proxy_url(
        &input(
            Some("not a url"),
            Some("proj1"),
            "us-central1",
            "127.0.0.1",
            false,
            "geocode",
        ),
        &logger,
    );
    assert_eq!(result.as_deref(), Some("not a url"));
    assert!(warnings(&records).is_empty());
}

#[test]
fn guarded_override_is_never_returned() {
    let guarded = "https://api.openrouteservice.org/v2";
    for (use_emulator, expected) in [
        (true, "http://127.0.0.1:5001/proj1/us-central1/geocode"),
        (false, "https://us-central1-proj1.cloudfunctions.net/geocode"),
    ] {
        let (logger, records) = recording_logger("guarded");
        let result = resolve_function_proxy_url(
            &input(
                Some(guarded),
                Some("proj1"),
                "us-central1",
                "127.0.0.1",
                use_emulator,
                "geocode",
            ),
            &logger,
        );
        assert_eq!(result.as_deref(), Some(expected));
        let warnings = warnings(&records);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("geocode"));
    }
}

#[test]
fn other_overrides_pass_through_unchanged() {
    let (logger, records) = recording_logger("passthrough");
    for configured in [
        "https://proxy.example.com/geocode",
        "http://localhost:5001/proj1/us-central1/geocode",
        "https://notopenrouteservice.org/v2",
        "https://openrouteservice.org.evil.example/v2",
        "https://example.com/?next=https://api.openrouteservice.org",
    ] {
        let result = resolve_function_proxy_url(
            &input(Some(configured), None, "us-central1", "127.0.0.1", false, "geocode"),
            &logger,
        );
        assert_eq!(result.as_deref(), Some(configured));
    }
    assert!(warnings(&records).is_empty());
}

#[test]
fn concurrent_resolutions_agree() {
    let (logger, records) = recording_logger("concurrent");
    let shared = Arc::new(input(
        Some("https://api.openrouteservice.org/v2"),
        Some("proj1"),
        "us-central1",
        "127.0.0.1",
        false,
        "directions",
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let logger = logger.clone();
            let shared = Arc::clone(&shared);
            thread::spawn(move || resolve_function_proxy_url(&shared, &logger))
        })
        .collect();

    for handle in handles {
        assert_eq!(
            handle.join().unwrap().as_deref(),
            Some("https://us-central1-proj1.cloudfunctions.net/directions")
        );
    }
    assert_eq!(warnings(&records).len(), 8);
}

#[test]
fn client_resolves_from_environment_style_config() {
    let (logger, records) = recording_logger("client");
    let config = FunctionsConfig::from_vars([
        ("FIREBASE_PROJECT_ID", "proj1"),
        ("USE_FUNCTIONS_EMULATOR", "1"),
        ("FUNCTIONS_PROXY_URL_GEOCODE", "https://api.openrouteservice.org/geocode"),
        ("FUNCTIONS_PROXY_URL_DIRECTIONS", "http://localhost:8080/directions"),
    ])
    .unwrap();
    let proxy = FunctionsProxy::with_logger(config, logger);

    assert_eq!(
        proxy.endpoint("geocode").as_deref(),
        Some("http://127.0.0.1:5001/proj1/us-central1/geocode")
    );
    assert_eq!(
        proxy.endpoint("directions").as_deref(),
        Some("http://localhost:8080/directions")
    );
    assert_eq!(warnings(&records).len(), 1);
}
