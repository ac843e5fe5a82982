//! Blocking client for the control API, used by the CLI.

use crate::api::ApiResponse;
use serde::de::DeserializeOwned;
use std::time::Duration;
use texpand_core::{Result, TexpandError};
use ureq::http::Response;
use ureq::{Agent, Body};

const TIMEOUT: Duration = Duration::from_secs(3);

pub fn get_json<T: DeserializeOwned>(port: u16, path: &str) -> Result<T> {
    let response = agent().get(&url(port, path)).call();
    decode(port, response)
}

pub fn post_json<T: DeserializeOwned>(port: u16, path: &str) -> Result<T> {
    let response = agent().post(&url(port, path)).send_empty();
    decode(port, response)
}

fn agent() -> Agent {
    // Error statuses still carry an envelope whose message is worth showing.
    Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .http_status_as_error(false)
        .proxy(None)
        .build()
        .into()
}

fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{}{}", port, path)
}

fn decode<T: DeserializeOwned>(
    port: u16,
    response: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<T> {
    let response = response.map_err(|e| {
        TexpandError::Api(format!("Control server not reachable on port {}: {}", port, e))
    })?;

    let status = response.status();
    let envelope = match response.into_body().read_json::<ApiResponse<T>>() {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(TexpandError::Api(format!(
                "Control server returned HTTP {}",
                status.as_u16()
            )))
        }
        Err(e) => return Err(TexpandError::Api(format!("Malformed control response: {}", e))),
    };

    match (envelope.success, envelope.data) {
        (true, Some(data)) => Ok(data),
        (_, _) => Err(TexpandError::Api(
            envelope
                .error
                .unwrap_or_else(|| format!("Request failed with HTTP {}", status.as_u16())),
        )),
    }
}
