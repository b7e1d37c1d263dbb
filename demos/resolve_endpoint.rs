//! Print the endpoint each named function resolves to under the current environment.
//!
//! `FIREBASE_PROJECT_ID=my-project USE_FUNCTIONS_EMULATOR=true cargo run --example resolve_endpoint -- geocode directions`

use functions_proxy::functions::{resolve_endpoint, FunctionsConfig, LOGGER};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FunctionsConfig::from_env()?;

    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        names.push("geocode".to_string());
    }

    for name in names {
        match resolve_endpoint(&config.resolution_input(&name), &LOGGER) {
            Some(endpoint) => println!("{name}: {} ({:?})", endpoint.url, endpoint.source),
            None => println!("{name}: no endpoint (set FIREBASE_PROJECT_ID or a proxy URL)"),
        }
    }

    Ok(())
}
