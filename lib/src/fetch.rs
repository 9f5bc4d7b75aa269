//! Fetching RDF documents and prefix bindings over HTTP.
//!
//! Requests are blocking and sent one at a time. Only a `200 OK` response
//! counts as success; its body is returned whole.

use crate::errors::{Error, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;

/// Service answering `GET {service}/{name}.file.txt` with `name<TAB>iri`.
pub const PREFIX_SERVICE: &str = "http://prefix.cc";

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Overall timeout for each request.
    pub timeout: Duration,
    /// Base URL of the prefix lookup service.
    pub prefix_service: String,
    /// Honor the `HTTP_PROXY`/`HTTPS_PROXY` environment variables.
    pub use_proxy: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            timeout: Duration::from_secs(30),
            prefix_service: PREFIX_SERVICE.to_string(),
            use_proxy: true,
        }
    }
}

fn client(opts: &FetchOptions) -> Result<Client> {
    let mut builder = Client::builder().timeout(opts.timeout);
    if !opts.use_proxy {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

/// GET `url`, sending `accept` as the Accept header when given.
pub fn get(url: &str, accept: Option<&str>, opts: &FetchOptions) -> Result<Vec<u8>> {
    let mut request = client(opts)?.get(url);
    if let Some(accept) = accept {
        request = request.header(ACCEPT, accept);
    }
    let resp = request.send()?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = resp.bytes()?.to_vec();
    debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

/// Namespace IRI registered for the prefix `name`.
pub fn lookup_prefix(name: &str, opts: &FetchOptions) -> Result<String> {
    let url = format!(
        "{}/{}.file.txt",
        opts.prefix_service.trim_end_matches('/'),
        name
    );
    let body = get(&url, Some("text/plain"), opts)?;
    let text = String::from_utf8_lossy(&body);
    text.lines()
        .filter_map(|line| line.trim().split_once('\t'))
        .find(|(n, _)| *n == name)
        .map(|(_, iri)| iri.trim().to_string())
        .filter(|iri| !iri.is_empty())
        .ok_or_else(|| Error::UnknownPrefix(name.to_string()))
}

/// True for inputs the loader should fetch rather than open.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_recognised() {
        assert!(is_url("http://ex.org/a.ttl"));
        assert!(is_url("https://ex.org/a.ttl"));
        assert!(!is_url("data/a.ttl"));
        assert!(!is_url("-"));
    }

    #[test]
    fn unreachable_hosts_are_http_errors() {
        let opts = FetchOptions {
            timeout: Duration::from_secs(2),
            use_proxy: false,
            ..FetchOptions::default()
        };
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{}/x.nt", port);
        let err = get(&url, None, &opts).unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
