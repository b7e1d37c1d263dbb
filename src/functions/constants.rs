/// Component name used for the functions module's default logger.
pub const FUNCTIONS_LOGGER_NAME: &str = "@functions-proxy/functions";

/// Registrable domain of the routing provider that must only be reached through a function.
pub const GUARDED_PROVIDER_DOMAIN: &str = "openrouteservice.org";

/// Port the Cloud Functions emulator listens on.
pub const FUNCTIONS_EMULATOR_PORT: u16 = 5001;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_EMULATOR_HOST: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 70_000;

pub const ENV_PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
pub const ENV_REGION: &str = "FUNCTIONS_REGION";
pub const ENV_EMULATOR_HOST: &str = "FUNCTIONS_EMULATOR_HOST";
pub const ENV_USE_EMULATOR: &str = "USE_FUNCTIONS_EMULATOR";
pub const ENV_PROXY_URL: &str = "FUNCTIONS_PROXY_URL";
/// Prefix of per-function overrides, e.g. `FUNCTIONS_PROXY_URL_GEOCODE`.
pub const ENV_PROXY_URL_PREFIX: &str = "FUNCTIONS_PROXY_URL_";
pub const ENV_TIMEOUT_MS: &str = "FUNCTIONS_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "FUNCTIONS_LOG_LEVEL";
