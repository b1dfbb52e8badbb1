// ABOUTME: HTTP retrieval for listing and article pages with size limits and charset decoding.
// ABOUTME: Maps transport failures, timeouts, non-2xx statuses and oversized bodies to FetchError codes.

use std::collections::HashMap;

use bytes::Bytes;
use futures::StreamExt;
use tracing::debug;

use crate::error::FetchError;
use crate::options::DEFAULT_MAX_CONTENT_LENGTH;

const OP: &str = "Fetch";

/// Per-request options for [`fetch`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub max_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decodes the body using the response charset, or a detected one.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("charset=").map(str::to_string))
        .map(|charset| charset.trim_matches('"').trim_matches('\'').to_string())
        .next()
}

/// Fetches `url` with a GET request.
///
/// Only http and https URLs are accepted. The body is read incrementally and
/// abandoned as soon as it exceeds `max_content_length`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, FetchError> {
    if url.is_empty() {
        return Err(FetchError::invalid_url(url, OP, None));
    }
    let parsed = url::Url::parse(url).map_err(|e| {
        FetchError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.get(parsed);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, OP, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::fetch(
            url,
            OP,
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    if let Some(len) = response.content_length() {
        if len > opts.max_content_length as u64 {
            return Err(FetchError::too_large(
                url,
                OP,
                Some(anyhow::anyhow!("content-length {} exceeds {}", len, opts.max_content_length)),
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::from_reqwest(url, OP, e))?;
        if body.len() + chunk.len() > opts.max_content_length {
            return Err(FetchError::too_large(
                url,
                OP,
                Some(anyhow::anyhow!("body exceeds {} bytes", opts.max_content_length)),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    debug!(url, final_url = %final_url, bytes = body.len(), "fetched");

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body: Bytes::from(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent("test-agent")
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn fetches_and_decodes_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/page").header("x-token", "abc");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("héllo");
        });

        let mut opts = FetchOptions::default();
        opts.headers.insert("x-token".into(), "abc".into());
        let result = fetch(&test_client(), &server.url("/page"), &opts)
            .await
            .expect("fetch should succeed");
        mock.assert();
        assert_eq!(result.status, 200);
        assert_eq!(result.text(), "héllo");
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not found");
        });

        let err = fetch(&test_client(), &server.url("/missing"), &FetchOptions::default())
            .await
            .expect_err("404 should fail");
        assert!(err.is_fetch());
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/big");
            then.status(200).body("0123456789abcdef");
        });

        let opts = FetchOptions {
            max_content_length: 8,
            ..Default::default()
        };
        let err = fetch(&test_client(), &server.url("/big"), &opts)
            .await
            .expect_err("body over the cap should fail");
        assert!(err.is_too_large());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(2)).body("late");
        });

        let err = fetch(&test_client(), &server.url("/slow"), &FetchOptions::default())
            .await
            .expect_err("should time out");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn rejects_bad_urls() {
        let client = test_client();
        let opts = FetchOptions::default();
        assert!(fetch(&client, "", &opts).await.unwrap_err().is_invalid_url());
        assert!(fetch(&client, "not a url", &opts).await.unwrap_err().is_invalid_url());
        assert!(fetch(&client, "ftp://example.com/x", &opts)
            .await
            .unwrap_err()
            .is_invalid_url());
    }

    #[test]
    fn decodes_declared_charset() {
        let latin1: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_body(latin1, Some("text/html; charset=ISO-8859-1")), "café");
        assert_eq!(decode_body(b"plain", None), "plain");
    }

    #[test]
    fn parses_charset_parameter() {
        assert_eq!(extract_charset("text/html; charset=\"utf-8\""), Some("utf-8".into()));
        assert_eq!(extract_charset("text/html"), None);
    }
}
