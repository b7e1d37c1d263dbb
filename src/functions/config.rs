//! Environment-driven configuration for reaching proxied functions.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::time::Duration;

use crate::functions::constants::{
    DEFAULT_EMULATOR_HOST, DEFAULT_REGION, DEFAULT_TIMEOUT_MS, ENV_EMULATOR_HOST, ENV_LOG_LEVEL,
    ENV_PROJECT_ID, ENV_PROXY_URL, ENV_PROXY_URL_PREFIX, ENV_REGION, ENV_TIMEOUT_MS,
    ENV_USE_EMULATOR,
};
use crate::functions::endpoint::ResolutionInput;
use crate::functions::error::{invalid_argument, FunctionsResult};
use crate::logger::LogLevel;

/// Settings shared by every function resolved through a [`crate::functions::FunctionsProxy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionsConfig {
    pub project_id: Option<String>,
    pub functions_region: String,
    pub emulator_host: String,
    pub use_emulator: bool,
    /// Override applied to every function without a dedicated entry.
    pub proxy_url: Option<String>,
    /// Per-function overrides keyed by upper-snake function name (`ROUTE_OPTIMIZE`).
    pub proxy_url_overrides: BTreeMap<String, String>,
    pub timeout: Duration,
    pub log_level: Option<LogLevel>,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            functions_region: DEFAULT_REGION.to_string(),
            emulator_host: DEFAULT_EMULATOR_HOST.to_string(),
            use_emulator: false,
            proxy_url: None,
            proxy_url_overrides: BTreeMap::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            log_level: None,
        }
    }
}

impl FunctionsConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> FunctionsResult<Self> {
        Self::from_vars(utf8_vars(env::vars_os()))
    }

    /// Reads the configuration from `(name, value)` pairs. Unrelated names are ignored and
    /// blank values count as unset. Other values are kept as written.
    pub fn from_vars<I, K, V>(vars: I) -> FunctionsResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let key = key.as_ref();
            let Some(value) = non_blank(value.as_ref()) else {
                continue;
            };
            match key {
                ENV_PROJECT_ID => config.project_id = Some(value.to_string()),
                ENV_REGION => config.functions_region = value.to_string(),
                ENV_EMULATOR_HOST => config.emulator_host = value.to_string(),
                ENV_USE_EMULATOR => config.use_emulator = parse_flag(key, value)?,
                ENV_PROXY_URL => config.proxy_url = Some(value.to_string()),
                ENV_TIMEOUT_MS => config.timeout = parse_timeout(value)?,
                ENV_LOG_LEVEL => {
                    let level = value
                        .parse::<LogLevel>()
                        .map_err(|err| invalid_argument(format!("{ENV_LOG_LEVEL}: {err}")))?;
                    config.log_level = Some(level);
                }
                _ => {
                    if let Some(suffix) = key.strip_prefix(ENV_PROXY_URL_PREFIX) {
                        if !suffix.is_empty() {
                            config
                                .proxy_url_overrides
                                .insert(suffix.to_string(), value.to_string());
                        }
                    }
                }
            }
        }
        Ok(config)
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

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Sets an override for one function only.
    pub fn with_function_proxy_url(mut self, function_name: &str, url: impl Into<String>) -> Self {
        self.proxy_url_overrides
            .insert(env_suffix(function_name), url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The override in effect for `function_name`: its own entry first, then the shared one.
    pub fn configured_url_for(&self, function_name: &str) -> Option<&str> {
        self.proxy_url_overrides
            .get(&env_suffix(function_name))
            .or(self.proxy_url.as_ref())
            .map(String::as_str)
    }

    /// Builds the resolver input for one function.
    pub fn resolution_input(&self, function_name: &str) -> ResolutionInput {
        ResolutionInput {
            configured_url: self.configured_url_for(function_name).map(str::to_string),
            project_id: self.project_id.clone(),
            functions_region: self.functions_region.clone(),
            emulator_host: self.emulator_host.clone(),
            use_emulator: self.use_emulator,
            function_name: function_name.to_string(),
        }
    }
}

/// Upper-snake form of a function name: `routeOptimize` becomes `ROUTE_OPTIMIZE`.
pub fn env_suffix(function_name: &str) -> String {
    let mut suffix = String::with_capacity(function_name.len() + 4);
    let mut previous_lower = false;
    for ch in function_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && previous_lower {
                suffix.push('_');
            }
            suffix.push(ch.to_ascii_uppercase());
            previous_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !suffix.is_empty() && !suffix.ends_with('_') {
                suffix.push('_');
            }
            previous_lower = false;
        }
    }
    suffix.trim_end_matches('_').to_string()
}

fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn non_blank(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

fn parse_flag(key: &str, value: &str) -> FunctionsResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(invalid_argument(format!(
            "{key} must be a boolean flag, got `{other}`"
        ))),
    }
}

fn parse_timeout(value: &str) -> FunctionsResult<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid_argument(format!(
            "{ENV_TIMEOUT_MS} must be greater than zero"
        ))),
        Ok(millis) => Ok(Duration::from_millis(millis)),
        Err(err) => Err(invalid_argument(format!(
            "{ENV_TIMEOUT_MS} must be a number of milliseconds: {err}"
        ))),
    }
}
