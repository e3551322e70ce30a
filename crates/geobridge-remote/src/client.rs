//! Thin JSON-over-HTTP wrapper shared by the platform and diagram adapters.

use geobridge_core::error::{BridgeError, ResponseBody, Result};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Messages attached to the statuses a remote gives special meaning to
#[derive(Debug, Clone)]
pub struct StatusMessages {
    /// Shown for HTTP 401
    pub unauthorized: String,
    /// Shown for HTTP 400
    pub bad_request: String,
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self {
            unauthorized: "The credential was rejected by the server".to_string(),
            bad_request: "The requested resource does not exist or is not accessible".to_string(),
        }
    }
}

/// Settings for a [`RemoteClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub messages: StatusMessages,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self { base_url: base_url.into(), timeout, messages: StatusMessages::default() }
    }

    pub fn with_messages(mut self, messages: StatusMessages) -> Self {
        self.messages = messages;
        self
    }
}

/// Per-request headers and query parameters
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// `Authorization: Token {token}`
    pub fn token_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Token {}", token))
    }
}

/// HTTP client that classifies statuses into [`BridgeError`]s and parses JSON bodies
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    messages: StatusMessages,
    client: Client,
}

impl RemoteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            BridgeError::ConfigInvalid {
                key: "http_client".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self { base_url: config.base_url, messages: config.messages, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL; absolute URLs pass through untouched
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{}/{}", base, suffix)
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    ///
    /// The result ends in `/`.
    pub fn segment_endpoint(&self, segments: &[&str]) -> Result<String> {
        let invalid =
            |reason: String| BridgeError::ConfigInvalid { key: "url".to_string(), reason };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| invalid(format!("Base URL '{}' cannot take a path", self.base_url)))?;
            path.pop_if_empty().extend(segments).push("");
        }
        Ok(url.to_string())
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let request = self.build(Method::GET, path, options)?;
        self.execute(request).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let request = self.build(Method::POST, path, options)?.json(body);
        self.execute(request).await
    }

    fn build(&self, method: Method, path: &str, options: RequestOptions) -> Result<RequestBuilder> {
        let endpoint = self.endpoint(path);
        let parsed = if options.params.is_empty() {
            Url::parse(&endpoint)
        } else {
            Url::parse_with_params(&endpoint, &options.params)
        };
        let url = parsed.map_err(|e| {
            BridgeError::ConfigInvalid {
                key: "url".to_string(),
                reason: format!("Invalid request URL '{}': {}", endpoint, e),
            }
        })?;

        tracing::debug!(method = %method, url = %url.path(), "Sending request");

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| BridgeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            401 => {
                return Err(BridgeError::Authorization {
                    status,
                    message: self.messages.unauthorized.clone(),
                })
            }
            400 => {
                return Err(BridgeError::ResourceAccess {
                    status,
                    message: self.messages.bad_request.clone(),
                })
            }
            _ => {}
        }

        let body = response.text().await.map_err(|e| {
            BridgeError::Transport(format!("Failed to read response body: {}", e))
        })?;

        if !(200..300).contains(&status) {
            return Err(BridgeError::Http { status, body: ResponseBody::parse(&body) });
        }

        parse_body(&body)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value = if body.trim().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(body)
            .map_err(|e| BridgeError::Serialization(format!("Response was not valid JSON: {}", e)))?
    };

    serde_json::from_value(value)
        .map_err(|e| BridgeError::Serialization(format!("Unexpected response shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RemoteClient {
        RemoteClient::new(ClientConfig::new(base, Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client("http://local.test:9000/api/v1/");
        assert_eq!(client.endpoint("/projects/1/"), "http://local.test:9000/api/v1/projects/1/");
        assert_eq!(client.endpoint("projects/1/"), "http://local.test:9000/api/v1/projects/1/");
    }

    #[test]
    fn test_segment_endpoint_encodes_each_segment() {
        let client = client("http://local.test:9000/api/v1/");
        assert_eq!(
            client.segment_endpoint(&["projects", "42"]).unwrap(),
            "http://local.test:9000/api/v1/projects/42/"
        );
        assert_eq!(
            client.segment_endpoint(&["projects", "a/b c?"]).unwrap(),
            "http://local.test:9000/api/v1/projects/a%2Fb%20c%3F/"
        );

        let bare = self::client("http://local.test:9000/api/v1");
        assert_eq!(
            bare.segment_endpoint(&["projects", "7", "systems"]).unwrap(),
            "http://local.test:9000/api/v1/projects/7/systems/"
        );
    }

    #[test]
    fn test_endpoint_keeps_absolute_urls() {
        let client = client("https://www.arcgis.com");
        let service = "https://services.arcgis.com/x/FeatureServer/0/query";
        assert_eq!(client.endpoint(service), service);
    }

    #[test]
    fn test_parse_empty_body_as_null() {
        let value: serde_json::Value = parse_body("  ").unwrap();
        assert!(value.is_null());

        let err = parse_body::<Vec<u32>>("{\"a\":1}").unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
