//! Endpoint resolution for proxied Cloud Functions.
//!
//! Resolution is a pure decision over a [`ResolutionInput`]: an explicit override URL wins
//! unless it points straight at the guarded routing provider, otherwise the emulator or the
//! production URL is derived from the project and region. No network access happens here.

use serde::Deserialize;
use url::Url;

use crate::functions::constants::{
    DEFAULT_EMULATOR_HOST, DEFAULT_REGION, FUNCTIONS_EMULATOR_PORT, GUARDED_PROVIDER_DOMAIN,
};
use crate::logger::{log_arg, LogLevel, Logger};

/// Inputs for a single endpoint resolution.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionInput {
    /// Explicit endpoint override. Empty counts as absent.
    #[serde(default)]
    pub configured_url: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub functions_region: String,
    pub emulator_host: String,
    #[serde(default)]
    pub use_emulator: bool,
    pub function_name: String,
}

impl ResolutionInput {
    /// Input for `function_name` with the default region and emulator host and nothing else set.
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            configured_url: None,
            project_id: None,
            functions_region: DEFAULT_REGION.to_string(),
            emulator_host: DEFAULT_EMULATOR_HOST.to_string(),
            use_emulator: false,
            function_name: function_name.into(),
        }
    }

    pub fn with_configured_url(mut self, url: impl Into<String>) -> Self {
        self.configured_url = Some(url.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.functions_region = region.into();
        self
    }

    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = host.into();
        self.use_emulator = true;
        self
    }

    fn configured_url(&self) -> Option<&str> {
        self.configured_url.as_deref().filter(|url| !url.is_empty())
    }

    fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Which branch of the resolution produced an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointSource {
    Override,
    Emulator,
    Production,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub source: EndpointSource,
}

/// Returns the URL the caller should use to reach `input.function_name`, or `None` when no
/// endpoint can be built.
///
/// Overrides pointing at the guarded provider are dropped with a warning on `logger`.
///
/// # Examples
/// ```
/// use functions_proxy::functions::{resolve_function_proxy_url, ResolutionInput};
/// use functions_proxy::logger::Logger;
///
/// let logger = Logger::new("docs");
/// let input = ResolutionInput::new("geocode").with_project_id("proj1");
/// assert_eq!(
///     resolve_function_proxy_url(&input, &logger).as_deref(),
///     Some("https://us-central1-proj1.cloudfunctions.net/geocode")
/// );
/// ```
pub fn resolve_function_proxy_url(input: &ResolutionInput, logger: &Logger) -> Option<String> {
    resolve_endpoint(input, logger).map(|endpoint| endpoint.url)
}

/// Same decision as [`resolve_function_proxy_url`], also reporting which branch was taken.
pub fn resolve_endpoint(input: &ResolutionInput, logger: &Logger) -> Option<ResolvedEndpoint> {
    if let Some(configured) = input.configured_url() {
        match guarded_host(configured) {
            Some(host) => logger.log_with(
                LogLevel::Warn,
                [
                    log_arg(format!(
                        "Ignoring proxy URL configured for `{}`:",
                        input.function_name
                    )),
                    log_arg(format!(
                        "{host} must only be reached through its Cloud Function, falling back to the default endpoint."
                    )),
                ],
            ),
            None => {
                return Some(ResolvedEndpoint {
                    url: configured.to_string(),
                    source: EndpointSource::Override,
                })
            }
        }
    }

    let project_id = input.project_id()?;
    let endpoint = if input.use_emulator {
        ResolvedEndpoint {
            url: emulator_url(
                &input.emulator_host,
                project_id,
                &input.functions_region,
                &input.function_name,
            ),
            source: EndpointSource::Emulator,
        }
    } else {
        ResolvedEndpoint {
            url: production_url(&input.functions_region, project_id, &input.function_name),
            source: EndpointSource::Production,
        }
    };
    logger.debug(format!(
        "Resolved `{}` to {}",
        input.function_name, endpoint.url
    ));
    Some(endpoint)
}

/// `http://<host>:5001/<project_id>/<region>/<name>`
pub fn emulator_url(host: &str, project_id: &str, region: &str, name: &str) -> String {
    format!("http://{host}:{FUNCTIONS_EMULATOR_PORT}/{project_id}/{region}/{name}")
}

/// `https://<region>-<project_id>.cloudfunctions.net/<name>`
pub fn production_url(region: &str, project_id: &str, name: &str) -> String {
    format!("https://{region}-{project_id}.cloudfunctions.net/{name}")
}

/// True when `host` is the guarded provider domain or one of its subdomains.
pub fn is_guarded_provider_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    match host.strip_suffix(GUARDED_PROVIDER_DOMAIN) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// True when `raw` parses as a URL whose host is guarded. Unparseable input is never guarded.
pub fn is_guarded_provider_url(raw: &str) -> bool {
    guarded_host(raw).is_some()
}

fn guarded_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    is_guarded_provider_host(host).then(|| host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capturing_logger;

    const GUARDED: &str = "https://api.openrouteservice.org/v2";

    fn base_input() -> ResolutionInput {
        ResolutionInput::new("geocode")
            .with_project_id("proj1")
            .with_region("us-central1")
    }

    #[test]
    fn missing_project_id_without_override_is_unresolvable() {
        let (logger, records) = capturing_logger("endpoint-none");
        let input = ResolutionInput {
            emulator_host: "localhost".into(),
            ..ResolutionInput::new("geocode")
        };
        assert_eq!(resolve_function_proxy_url(&input, &logger), None);
        assert!(records.warnings().is_empty());
    }

    #[test]
    fn emulator_url_uses_fixed_port_and_path() {
        let (logger, _) = capturing_logger("endpoint-emulator");
        let input = base_input().with_emulator("127.0.0.1");
        let endpoint = resolve_endpoint(&input, &logger).unwrap();
        assert_eq!(endpoint.url, "http://127.0.0.1:5001/proj1/us-central1/geocode");
        assert_eq!(endpoint.source, EndpointSource::Emulator);
    }

    #[test]
    fn production_url_is_derived_from_region_and_project() {
        let (logger, _) = capturing_logger("endpoint-production");
        let input = base_input().with_region("europe-west1");
        let endpoint = resolve_endpoint(&input, &logger).unwrap();
        assert_eq!(
            endpoint.url,
            "https://europe-west1-proj1.cloudfunctions.net/geocode"
        );
        assert_eq!(endpoint.source, EndpointSource::Production);
    }

    #[test]
    fn override_is_returned_verbatim() {
        let (logger, records) = capturing_logger("endpoint-override");
        let configured = "HTTPS://Proxy.Example.com:8443//geocode/?q=a b";
        let input = ResolutionInput::new("geocode").with_configured_url(configured);
        let endpoint = resolve_endpoint(&input, &logger).unwrap();
        assert_eq!(endpoint.url, configured);
        assert_eq!(endpoint.source, EndpointSource::Override);
        assert!(records.warnings().is_empty());
    }

    #[test]
    fn override_wins_over_emulator() {
        let (logger, _) = capturing_logger("endpoint-override-emulator");
        let input = base_input()
            .with_emulator("localhost")
            .with_configured_url("http://localhost:8080/geocode");
        assert_eq!(
            resolve_function_proxy_url(&input, &logger).as_deref(),
            Some("http://localhost:8080/geocode")
        );
    }

    #[test]
    fn empty_override_is_treated_as_absent() {
        let (logger, records) = capturing_logger("endpoint-empty");
        let input = base_input().with_configured_url("");
        assert_eq!(
            resolve_function_proxy_url(&input, &logger).as_deref(),
            Some("https://us-central1-proj1.cloudfunctions.net/geocode")
        );
        assert!(records.warnings().is_empty());
    }

    #[test]
    fn guarded_override_falls_back_to_production_with_warning() {
        let (logger, records) = capturing_logger("endpoint-guarded");
        let input = base_input().with_configured_url(GUARDED);
        let endpoint = resolve_endpoint(&input, &logger).unwrap();
        assert_eq!(endpoint.url, "https://us-central1-proj1.cloudfunctions.net/geocode");
        assert_eq!(endpoint.source, EndpointSource::Production);

        let warnings = records.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("`geocode`"));
        assert!(warnings[0].contains("api.openrouteservice.org"));
        assert!(!warnings[0].contains("/v2"));
    }

    #[test]
    fn guarded_override_falls_back_to_emulator() {
        let (logger, records) = capturing_logger("endpoint-guarded-emulator");
        let input = base_input()
            .with_emulator("127.0.0.1")
            .with_configured_url("https://OpenRouteService.org/geocode/search?api_key=secret");
        assert_eq!(
            resolve_function_proxy_url(&input, &logger).as_deref(),
            Some("http://127.0.0.1:5001/proj1/us-central1/geocode")
        );
        let warnings = records.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].contains("secret"));
    }

    #[test]
    fn guarded_override_without_project_is_unresolvable() {
        let (logger, records) = capturing_logger("endpoint-guarded-none");
        let input = ResolutionInput::new("directions").with_configured_url(GUARDED);
        assert_eq!(resolve_function_proxy_url(&input, &logger), None);
        assert_eq!(records.warnings().len(), 1);
    }

    #[test]
    fn unparseable_override_is_returned_verbatim() {
        let (logger, records) = capturing_logger("endpoint-unparseable");
        for raw in ["not a url", "api.openrouteservice.org/v2", "/geocode"] {
            let input = base_input().with_configured_url(raw);
            assert_eq!(resolve_function_proxy_url(&input, &logger).as_deref(), Some(raw));
        }
        assert!(records.warnings().is_empty());
    }

    #[test]
    fn guard_matches_domain_and_subdomains_only() {
        assert!(is_guarded_provider_host("openrouteservice.org"));
        assert!(is_guarded_provider_host("api.openrouteservice.org"));
        assert!(is_guarded_provider_host("A.B.OpenRouteService.ORG"));

        assert!(!is_guarded_provider_host("evilopenrouteservice.org"));
        assert!(!is_guarded_provider_host("openrouteservice.org.example.com"));
        assert!(!is_guarded_provider_host("openrouteservice.com"));
        assert!(!is_guarded_provider_host(""));
        assert!(!is_guarded_provider_host("api.openrouteservice.org."));
    }

    #[test]
    fn fully_qualified_guarded_host_is_not_matched() {
        let (logger, records) = capturing_logger("endpoint-trailing-dot");
        let configured = "https://api.openrouteservice.org./v2";
        let input = base_input().with_configured_url(configured);
        let endpoint = resolve_endpoint(&input, &logger).unwrap();
        assert_eq!(endpoint.url, configured);
        assert_eq!(endpoint.source, EndpointSource::Override);
        assert!(records.warnings().is_empty());
    }

    #[test]
    fn guard_inspects_only_the_hostname() {
        assert!(is_guarded_provider_url("https://api.openrouteservice.org/v2"));
        assert!(is_guarded_provider_url("http://user:pw@openrouteservice.org:8080/"));
        assert!(!is_guarded_provider_url(
            "https://proxy.example.com/openrouteservice.org"
        ));
        assert!(!is_guarded_provider_url(
            "https://proxy.example.com/?target=api.openrouteservice.org"
        ));
        assert!(!is_guarded_provider_url("not a url"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let (logger, records) = capturing_logger("endpoint-idempotent");
        let input = base_input().with_configured_url(GUARDED);
        let snapshot = input.clone();
        let first = resolve_function_proxy_url(&input, &logger);
        let second = resolve_function_proxy_url(&input, &logger);
        assert_eq!(first, second);
        assert_eq!(input, snapshot);
        assert_eq!(records.warnings().len(), 2);
    }

    #[test]
    fn input_deserializes_from_camel_case_record() {
        let input: ResolutionInput = serde_json::from_value(serde_json::json!({
            "projectId": "proj1",
            "functionsRegion": "us-central1",
            "emulatorHost": "127.0.0.1",
            "useEmulator": true,
            "functionName": "geocode"
        }))
        .unwrap();
        assert_eq!(input.configured_url, None);
        let (logger, _) = capturing_logger("endpoint-serde");
        assert_eq!(
            resolve_function_proxy_url(&input, &logger).as_deref(),
            Some("http://127.0.0.1:5001/proj1/us-central1/geocode")
        );
    }
}
