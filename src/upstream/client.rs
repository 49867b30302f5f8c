//! The authenticated proxy client.

use std::time::Duration;

use bytes::Bytes;
use http::Method;
use url::Url;

use super::{ProxyOutcome, UpstreamError, normalize};
use crate::{auth::SessionClaims, config::UpstreamConfig};

/// Options for one proxied call.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    body: Option<Bytes>,
    content_type: Option<String>,
    /// Positive cache window for the outbound call. `None` (the default)
    /// sends `Cache-Control: no-store`: not seeing stale moderation state
    /// matters more than latency. Read-only, high-volume endpoints opt in
    /// explicitly.
    cache_ttl: Option<Duration>,
}

impl ProxyRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            content_type: None,
            cache_ttl: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// Attach a JSON body.
    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.body = Some(Bytes::from(serde_json::to_vec(value).unwrap_or_default()));
        self.content_type = Some("application/json".to_string());
        self
    }

    /// Attach a raw body with its content type.
    pub fn body(mut self, body: Bytes, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// Opt into a positive cache window for this call.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    fn cache_control(&self) -> String {
        match self.cache_ttl {
            Some(ttl) => format!("max-age={}", ttl.as_secs()),
            None => "no-store".to_string(),
        }
    }
}

/// Client for the upstream REST API, forwarding the caller's embedded
/// upstream credential.
///
/// Issues exactly one outbound call per invocation, bounded by the
/// configured timeout. No retries: a moderation POST that timed out may
/// still have been applied, and replaying it is not this client's call to
/// make. Dropping the future (the inbound request was aborted) cancels the
/// outbound call with it.
pub struct UpstreamClient {
    http_client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Proxy a call on behalf of a session.
    ///
    /// Fails with [`UpstreamError::MissingCredential`] before any network
    /// I/O when the session has no upstream token. The token is attached
    /// as `Authorization: Bearer ...` and mirrored as a `Cookie:
    /// Authorization=Bearer ...` header; some upstream proxy layers read
    /// the credential from the cookie instead of the header. The mirror is
    /// a compatibility shim, not a security boundary.
    pub async fn proxy(
        &self,
        claims: &SessionClaims,
        path_and_query: &str,
        request: ProxyRequest,
    ) -> Result<ProxyOutcome, UpstreamError> {
        let token = claims
            .wp_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(UpstreamError::MissingCredential)?;

        let url = self.base_url.join(path_and_query)?;

        tracing::debug!(
            method = %request.method,
            url = %url,
            subject = %claims.sub,
            "proxying to upstream"
        );

        let mut outbound = self
            .http_client
            .request(request.method.clone(), url)
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(http::header::COOKIE, format!("Authorization=Bearer {token}"))
            .header(http::header::ACCEPT, "application/json")
            .header(http::header::USER_AGENT, &self.user_agent)
            .header(http::header::CACHE_CONTROL, request.cache_control())
            .timeout(self.timeout);

        if let Some(body) = request.body {
            let content_type = request
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            outbound = outbound
                .header(http::header::CONTENT_TYPE, content_type)
                .body(body);
        }

        let response = outbound.send().await?;
        self.collect(response).await
    }

    /// Fetch a public upstream resource without a credential.
    ///
    /// Used for anonymous read passthroughs (post listings, search) that
    /// are public on the upstream too. Same normalization as [`Self::proxy`].
    pub async fn fetch_public(
        &self,
        path_and_query: &str,
        cache_ttl: Option<Duration>,
    ) -> Result<ProxyOutcome, UpstreamError> {
        let url = self.base_url.join(path_and_query)?;

        let mut request = ProxyRequest::get();
        if let Some(ttl) = cache_ttl {
            request = request.cache_ttl(ttl);
        }

        let response = self
            .http_client
            .get(url)
            .header(http::header::ACCEPT, "application/json")
            .header(http::header::USER_AGENT, &self.user_agent)
            .header(http::header::CACHE_CONTROL, request.cache_control())
            .timeout(self.timeout)
            .send()
            .await?;

        self.collect(response).await
    }

    async fn collect(&self, response: reqwest::Response) -> Result<ProxyOutcome, UpstreamError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?;

        Ok(normalize(status, content_type.as_deref(), body))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::IdentityRefreshConfig;
    use crate::upstream::ProxyErrorKind;

    fn upstream_config(base: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: Url::parse(base).unwrap(),
            timeout_secs: 5,
            user_agent: "portcullis-test".to_string(),
            identity_refresh: IdentityRefreshConfig::default(),
        }
    }

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(&upstream_config(base), reqwest::Client::new())
    }

    fn claims_with_token(token: Option<&str>) -> SessionClaims {
        SessionClaims {
            sub: "42".to_string(),
            username: Some("dana".to_string()),
            email: None,
            roles: vec!["editor".to_string()],
            wp_token: token.map(|t| t.to_string()),
            exp: 4_102_444_800, // far future
            iat: 0,
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_network_call() {
        // The mock server expects zero requests; reaching it fails the test
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let c = client(&server.uri());
        for token in [None, Some("")] {
            let err = c
                .proxy(
                    &claims_with_token(token),
                    "/wp-json/wp/v2/users/me",
                    ProxyRequest::get(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, UpstreamError::MissingCredential));
        }
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_mirror_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/users/me"))
            .and(header("authorization", "Bearer wp-tok"))
            .and(header("cookie", "Authorization=Bearer wp-tok"))
            .and(header("cache-control", "no-store"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"id":42}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri())
            .proxy(
                &claims_with_token(Some("wp-tok")),
                "/wp-json/wp/v2/users/me",
                ProxyRequest::get(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, http::StatusCode::OK);
        assert!(outcome.error_kind.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_opt_in_sends_max_age() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(header("cache-control", "max-age=300"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("[]"),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server.uri())
            .proxy(
                &claims_with_token(Some("wp-tok")),
                "/wp-json/wp/v2/posts",
                ProxyRequest::get().cache_ttl(Duration::from_secs(300)),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_json_body_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/comments/7"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"status": "approved"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"id":7,"status":"approved"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri())
            .proxy(
                &claims_with_token(Some("wp-tok")),
                "/wp-json/wp/v2/comments/7",
                ProxyRequest::new(Method::POST).json(&serde_json::json!({"status": "approved"})),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_401_yields_structured_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"code":"jwt_auth_invalid_token","message":"Expired token"}"#),
            )
            .mount(&server)
            .await;

        let outcome = client(&server.uri())
            .proxy(
                &claims_with_token(Some("stale")),
                "/wp-json/wp/v2/users/me",
                ProxyRequest::get(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(outcome.content_type, "application/json");
        assert_eq!(outcome.error_kind, Some(ProxyErrorKind::AuthRejected));

        let body: crate::error::ErrorBody = serde_json::from_slice(&outcome.body).unwrap();
        assert_eq!(body.error, "unauthorized");
        assert_eq!(body.message.as_deref(), Some("Expired token"));
    }

    #[tokio::test]
    async fn test_html_maintenance_page_on_200_becomes_502() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=UTF-8")
                    .set_body_string("<!DOCTYPE html><html><body>Maintenance</body></html>"),
            )
            .mount(&server)
            .await;

        let outcome = client(&server.uri())
            .proxy(
                &claims_with_token(Some("wp-tok")),
                "/wp-json/wp/v2/posts",
                ProxyRequest::get(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, http::StatusCode::BAD_GATEWAY);
        let body: crate::error::ErrorBody = serde_json::from_slice(&outcome.body).unwrap();
        assert_eq!(body.error, "wp_html_response");
        assert_eq!(body.original_status, Some(200));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let c = client("http://127.0.0.1:9"); // discard port, never HTTP
        let err = c
            .proxy(
                &claims_with_token(Some("wp-tok")),
                "/wp-json/wp/v2/posts",
                ProxyRequest::get(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_public_sends_no_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("per_page", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("[]"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri())
            .fetch_public(
                "/wp-json/wp/v2/posts?per_page=10",
                Some(Duration::from_secs(300)),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, http::StatusCode::OK);

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
    }
}
