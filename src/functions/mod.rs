#![doc = include_str!("README.md")]
mod api;
mod config;
mod constants;
mod endpoint;
pub mod error;
mod logger;
mod transport;

pub use api::{FunctionsProxy, ProxyFunction};
pub use config::{env_suffix, FunctionsConfig};
pub use constants::{
    DEFAULT_EMULATOR_HOST, DEFAULT_REGION, FUNCTIONS_EMULATOR_PORT, GUARDED_PROVIDER_DOMAIN,
};
pub use endpoint::{
    emulator_url, is_guarded_provider_host, is_guarded_provider_url, production_url,
    resolve_endpoint, resolve_function_proxy_url, EndpointSource, ResolutionInput,
    ResolvedEndpoint,
};
pub use logger::LOGGER;
