use std::marker::PhantomData;
use std::sync::Arc;

use crate::functions::config::{env_suffix, FunctionsConfig};
use crate::functions::constants::{
    ENV_PROJECT_ID, ENV_PROXY_URL, ENV_PROXY_URL_PREFIX, FUNCTIONS_LOGGER_NAME,
};
use crate::functions::endpoint::resolve_function_proxy_url;
use crate::functions::error::{
    failed_precondition, internal_error, invalid_argument, FunctionsResult,
};
use crate::functions::logger::LOGGER;
use crate::functions::transport::{invoke_async, ProxyRequest};
use crate::logger::Logger;

/// Client for functions that front third-party providers.
///
/// Every call resolves the endpoint afresh from the configuration, so a misconfigured override
/// is reported each time it is ignored.
#[derive(Clone, Debug)]
pub struct FunctionsProxy {
    inner: Arc<FunctionsProxyInner>,
}

#[derive(Debug)]
struct FunctionsProxyInner {
    config: FunctionsConfig,
    logger: Logger,
    client: reqwest::Client,
}

impl FunctionsProxy {
    /// Creates a client reporting through the module logger.
    ///
    /// When the config carries a log level the client gets its own logger instead, so the
    /// level does not leak into other clients sharing the module logger.
    pub fn new(config: FunctionsConfig) -> Self {
        let logger = match config.log_level {
            Some(_) => Logger::new(FUNCTIONS_LOGGER_NAME),
            None => LOGGER.clone(),
        };
        Self::with_logger(config, logger)
    }

    /// Creates a client reporting through `logger`. A configured log level is applied to it,
    /// and so to every other holder of that logger.
    pub fn with_logger(config: FunctionsConfig, logger: Logger) -> Self {
        if let Some(level) = config.log_level {
            // Setting a parsed level cannot fail.
            let _ = logger.set_log_level(level);
        }
        Self {
            inner: Arc::new(FunctionsProxyInner {
                config,
                logger,
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Creates a client from [`FunctionsConfig::from_env`].
    pub fn from_env() -> FunctionsResult<Self> {
        Ok(Self::new(FunctionsConfig::from_env()?))
    }

    pub fn config(&self) -> &FunctionsConfig {
        &self.inner.config
    }

    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// URL that calls to `function_name` would target, if one can be resolved.
    pub fn endpoint(&self, function_name: &str) -> Option<String> {
        let input = self.inner.config.resolution_input(function_name);
        resolve_function_proxy_url(&input, &self.inner.logger)
    }

    /// Whether `function_name` can be reached at all. Features depending on it should be
    /// disabled when this is false.
    pub fn is_available(&self, function_name: &str) -> bool {
        self.endpoint(function_name).is_some()
    }

    /// Returns a typed handle for the named function.
    ///
    /// # Examples
    /// ```no_run
    /// # use functions_proxy::functions::{FunctionsConfig, FunctionsProxy};
    /// # async fn demo() -> functions_proxy::functions::error::FunctionsResult<()> {
    /// let proxy = FunctionsProxy::new(FunctionsConfig::default().with_project_id("proj1"));
    /// let geocode = proxy.proxy_function::<serde_json::Value, serde_json::Value>("geocode")?;
    /// let places = geocode.call_async(&serde_json::json!({"text": "Berlin"})).await?;
    /// println!("{places}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn proxy_function<Request, Response>(
        &self,
        name: &str,
    ) -> FunctionsResult<ProxyFunction<Request, Response>>
    where
        Request: serde::Serialize,
        Response: serde::de::DeserializeOwned,
    {
        let name = name.trim().trim_matches('/');
        if name.is_empty() {
            return Err(invalid_argument("Function name must not be empty"));
        }
        Ok(ProxyFunction {
            proxy: self.clone(),
            name: name.to_string(),
            _request: PhantomData,
            _response: PhantomData,
        })
    }
}

/// Handle to one proxied function with typed request and response payloads.
pub struct ProxyFunction<Request, Response> {
    proxy: FunctionsProxy,
    name: String,
    _request: PhantomData<fn(Request)>,
    _response: PhantomData<fn() -> Response>,
}

impl<Request, Response> Clone for ProxyFunction<Request, Response> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            name: self.name.clone(),
            _request: PhantomData,
            _response: PhantomData,
        }
    }
}

impl<Request, Response> ProxyFunction<Request, Response>
where
    Request: serde::Serialize,
    Response: serde::de::DeserializeOwned,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends `data` as the JSON request body and decodes the JSON response.
    ///
    /// Fails with `functions/failed-precondition` when no endpoint can be resolved.
    pub async fn call_async(&self, data: &Request) -> FunctionsResult<Response> {
        let payload = serde_json::to_value(data)
            .map_err(|err| internal_error(format!("Failed to serialize request payload: {err}")))?;

        let url = self.proxy.endpoint(&self.name).ok_or_else(|| {
            failed_precondition(format!(
                "No endpoint available for function `{}`: set {ENV_PROJECT_ID}, {ENV_PROXY_URL} or {ENV_PROXY_URL_PREFIX}{}",
                self.name,
                env_suffix(&self.name)
            ))
        })?;

        let request = ProxyRequest::new(url, payload, self.proxy.config().timeout);
        let body = invoke_async(&self.proxy.inner.client, request).await?;
        serde_json::from_value(body).map_err(|err| {
            internal_error(format!(
                "Failed to deserialize response from `{}`: {err}",
                self.name
            ))
        })
    }
}
