//! High-level HTTP helpers.
//!
//! All outbound requests share one blocking client with a short fixed
//! timeout. A failed or timed-out request surfaces as a normal error; there
//! are no retries.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Timeout for every outbound HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors returned by HTTP helpers.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("got http status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

fn client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client")
    })
}

/// Checks if the path is an http(s) url.
pub fn is_url(path: &str) -> bool {
    match Url::parse(path) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

/// Returns the domain part of the url, or an empty string if the url
/// is invalid.
pub fn hostname(raw_url: &str) -> String {
    Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Checks if the specified url is reachable (HEAD request).
pub fn exists(url: &str) -> bool {
    client()
        .head(url)
        .send()
        .map(|resp| resp.status().is_success())
        .unwrap_or(false)
}

/// Issues a GET request with an Accept header and returns the response.
pub fn get_body(url: &str, accept: &str) -> Result<Response, HttpError> {
    let resp = client().get(url).header("Accept", accept).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// Issues a GET request and decodes the response as JSON.
pub fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, HttpError> {
    let data = get_bytes_with_accept(url, "application/json")?;
    Ok(serde_json::from_slice(&data)?)
}

/// Issues a GET request and returns the response body as bytes.
pub fn get_bytes(url: &str) -> Result<Vec<u8>, HttpError> {
    get_bytes_with_accept(url, "*/*")
}

fn get_bytes_with_accept(url: &str, accept: &str) -> Result<Vec<u8>, HttpError> {
    let resp = get_body(url, accept)?;
    Ok(resp.bytes()?.to_vec())
}
