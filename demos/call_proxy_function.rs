//! Call a proxied function with a JSON payload.
//! Point `FUNCTIONS_PROXY_URL_GEOCODE` at a local server, or enable the emulator.

use functions_proxy::functions::FunctionsProxy;
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proxy = FunctionsProxy::from_env()?;
    if !proxy.is_available("geocode") {
        println!("geocoding disabled: no endpoint configured");
        return Ok(());
    }

    let geocode = proxy.proxy_function::<serde_json::Value, serde_json::Value>("geocode")?;
    let response = geocode.call_async(&json!({ "text": "Alexanderplatz, Berlin" })).await?;
    println!("geocode response: {response}");

    Ok(())
}
