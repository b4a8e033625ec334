//! Content fetching from URLs, files, and stdin.
//!
//! Network access goes through the [`Fetcher`] trait so the harvest loop can
//! run against an in-memory fetcher in tests. [`HttpFetcher`] is the reqwest
//! implementation used by the CLI.

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::{HarvestError, Result};

/// Transport used to retrieve pages and images.
pub trait Fetcher {
    /// Fetches a page body.
    ///
    /// The status code is not checked: whatever body the server returns is
    /// handed to the converter.
    fn fetch_page(
        &self, url: &str, timeout: Duration, headers: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Fetches an image. Non-success statuses are errors and no custom
    /// headers are sent.
    fn fetch_image(&self, url: &str, timeout: Duration) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[cfg(feature = "fetch")]
pub use http::HttpFetcher;

#[cfg(feature = "fetch")]
mod http {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use reqwest::Client;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use url::Url;

    use super::Fetcher;
    use crate::{HarvestError, Result};

    /// reqwest-backed [`Fetcher`].
    ///
    /// One client is shared by every request; timeouts are applied per request.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        pub fn new() -> Result<Self> {
            let client = Client::builder().build().map_err(HarvestError::HttpError)?;
            Ok(Self { client })
        }

        async fn get(&self, url: &str, timeout: Duration, headers: HeaderMap) -> Result<reqwest::Response> {
            let parsed_url = Url::parse(url).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", url, e)))?;

            if !matches!(parsed_url.scheme(), "http" | "https") {
                return Err(HarvestError::InvalidUrl(format!(
                    "{}: URL must use http:// or https://",
                    url
                )));
            }

            self.client
                .get(parsed_url)
                .timeout(timeout)
                .headers(headers)
                .send()
                .await
                .map_err(|e| map_request_error(e, timeout))
        }
    }

    impl Fetcher for HttpFetcher {
        async fn fetch_page(&self, url: &str, timeout: Duration, headers: &BTreeMap<String, String>) -> Result<Vec<u8>> {
            let response = self.get(url, timeout, header_map(headers)?).await?;
            let body = response.bytes().await.map_err(|e| map_request_error(e, timeout))?;
            Ok(body.to_vec())
        }

        async fn fetch_image(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
            let response = self.get(url, timeout, HeaderMap::new()).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(HarvestError::HttpStatus { url: url.to_string(), status: status.as_u16() });
            }
            let body = response.bytes().await.map_err(|e| map_request_error(e, timeout))?;
            Ok(body.to_vec())
        }
    }

    fn map_request_error(e: reqwest::Error, timeout: Duration) -> HarvestError {
        if e.is_timeout() { HarvestError::Timeout { timeout: timeout.as_secs() } } else { HarvestError::HttpError(e) }
    }

    pub(super) fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HarvestError::ConfigError(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HarvestError::ConfigError(format!("Invalid header value for '{}': {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }

}

/// Checks that every configured page header can be put on a request.
///
/// # Errors
///
/// Returns [`HarvestError::ConfigError`] for an invalid header name or value.
pub fn validate_headers(headers: &BTreeMap<String, String>) -> Result<()> {
    #[cfg(feature = "fetch")]
    http::header_map(headers)?;
    #[cfg(not(feature = "fetch"))]
    let _ = headers;
    Ok(())
}

/// Reads a local file as UTF-8 text.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(HarvestError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(HarvestError::from)
    }
}

/// Reads all of standard input.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(HarvestError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/articles.json");
        assert!(matches!(result, Err(HarvestError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        fs::write(&path, "[]").unwrap();
        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "[]");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{BTreeMap, HashMap};
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::Fetcher;
    use crate::{HarvestError, Result};

    /// In-memory fetcher serving canned pages and images. Unknown URLs fail
    /// with a 404 status; every request is logged.
    #[derive(Debug, Default)]
    pub(crate) struct StaticFetcher {
        pages: HashMap<String, Vec<u8>>,
        images: HashMap<String, Vec<u8>>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        pub(crate) fn image(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.images.insert(url.to_string(), body.into());
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn serve(&self, table: &HashMap<String, Vec<u8>>, url: &str) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(url.to_string());
            table
                .get(url)
                .cloned()
                .ok_or_else(|| HarvestError::HttpStatus { url: url.to_string(), status: 404 })
        }
    }

    impl Fetcher for StaticFetcher {
        fn fetch_page(
            &self, url: &str, _timeout: Duration, _headers: &BTreeMap<String, String>,
        ) -> impl Future<Output = Result<Vec<u8>>> + Send {
            let result = self.serve(&self.pages, url);
            async move { result }
        }

        fn fetch_image(&self, url: &str, _timeout: Duration) -> impl Future<Output = Result<Vec<u8>>> + Send {
            let result = self.serve(&self.images, url);
            async move { result }
        }
    }
}
