//! HTTP implementation of [`RemoteClient`] for the JumpCloud v2 API.
//!
//! # Endpoints
//!
//! | Call | Request |
//! |------|---------|
//! | `list_filtered` | `GET {base}/{collection}?filter=field:op:value&limit=..&skip=..` |
//! | `create` | `POST {base}/{collection}` |
//! | `get_by_id` | `GET {base}/{collection}/{id}` |
//! | `update_by_id` | `PUT {base}/{collection}/{id}` |
//! | `delete_by_id` | `DELETE {base}/{collection}/{id}` |
//!
//! Every request carries the `x-api-key` and `x-org-id` headers. A 404 is
//! reported as not found; any other non-success status keeps the response
//! body verbatim as the error message.
//!
//! The operation deadline bounds each request timeout. A context cancelled
//! while a request is in flight fails that call with `Cancelled` as soon as
//! it returns, even if the server answered with success.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use declarative::{
    AdapterResult, Credentials, Filter, OpContext, ProviderConfig, RemoteClient, RemoteEntity,
};
use serde_json::Value;
use std::time::Duration;
use ureq::http::Response;
use ureq::{Body, RequestBuilder};

/// Page size for list requests (the API maximum).
const PAGE_SIZE: usize = 100;

/// Blocking JumpCloud API client.
///
/// Immutable once built; share it behind an `Arc` across threads.
///
/// # Example
///
/// ```no_run
/// use declarative::{Credentials, Filter, OpContext, RemoteClient};
/// use jcapi::{ClientConfig, HttpClient};
///
/// let credentials = Credentials::new("api-key", "org-id").unwrap();
/// let client = HttpClient::new(ClientConfig::new(credentials));
///
/// let groups = client
///     .list_filtered(&OpContext::new(), "usergroups", &[Filter::eq("name", "eng-team")])
///     .unwrap();
/// println!("Found {} groups", groups.len());
/// ```
pub struct HttpClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a client from its configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .into();
        Self { agent, config }
    }

    /// Create a client from resolved credentials and the provider block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configured base URL is unusable.
    pub fn connect(credentials: &Credentials, provider: &ProviderConfig) -> Result<Self> {
        let config = ClientConfig::from_provider(credentials, provider)?;
        log::debug!("connecting to {}", config.base_url());
        Ok(Self::new(config))
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.config.base_url(), collection)
    }

    fn entity_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url(),
            collection,
            urlencoding::encode(id)
        )
    }

    /// Timeout for the next request, bounded by the operation deadline.
    fn request_timeout(&self, ctx: &OpContext) -> Result<Duration> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match ctx.remaining() {
            Some(remaining) if remaining.is_zero() => Err(Error::Cancelled),
            Some(remaining) => Ok(remaining.min(self.config.timeout())),
            None => Ok(self.config.timeout()),
        }
    }

    /// Attach authentication headers and the request timeout.
    fn prepare<B>(&self, ctx: &OpContext, request: RequestBuilder<B>) -> Result<RequestBuilder<B>> {
        let timeout = self.request_timeout(ctx)?;
        let credentials = self.config.credentials();
        Ok(request
            .header("x-api-key", credentials.api_key())
            .header("x-org-id", credentials.organization_id())
            .header("Accept", "application/json")
            .header("User-Agent", self.config.user_agent())
            .config()
            .timeout_global(Some(timeout))
            .build())
    }

    /// Turn a raw outcome into a successful response or an error.
    fn finish(
        &self,
        ctx: &OpContext,
        what: &str,
        result: std::result::Result<Response<Body>, ureq::Error>,
    ) -> Result<Response<Body>> {
        // A request cannot be interrupted once sent; a cancellation that
        // arrived meanwhile still wins over whatever came back.
        if ctx.is_cancelled() {
            log::debug!("{what}: cancelled while in flight");
            return Err(Error::Cancelled);
        }
        let mut response = result?;

        let status = response.status();
        log::trace!("{what}: HTTP {}", status.as_u16());
        if status.is_success() {
            return Ok(response);
        }

        let body = response.body_mut().read_to_string().unwrap_or_default();
        Err(Error::from_status(status.as_u16(), what, body))
    }

    fn list(
        &self,
        ctx: &OpContext,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<RemoteEntity>> {
        let url = self.collection_url(collection);
        let mut entities = Vec::new();

        loop {
            let mut request = self
                .agent
                .get(&url)
                .query("limit", PAGE_SIZE.to_string())
                .query("skip", entities.len().to_string());
            for filter in filters {
                request = request.query("filter", filter.to_string());
            }
            log::debug!("GET {url} (skip {})", entities.len());

            let request = self.prepare(ctx, request)?;
            let mut response = self.finish(ctx, collection, request.call())?;
            let page = parse_list(response.body_mut().read_json::<Value>()?)?;

            let count = page.len();
            entities.extend(page);
            if count < PAGE_SIZE {
                break;
            }
        }

        Ok(entities)
    }

    fn post(&self, ctx: &OpContext, collection: &str, payload: &Value) -> Result<RemoteEntity> {
        let url = self.collection_url(collection);
        log::debug!("POST {url}");
        let request = self.prepare(ctx, self.agent.post(&url))?;
        let mut response = self.finish(ctx, collection, request.send_json(payload))?;
        parse_entity(response.body_mut().read_json::<Value>()?)
    }

    fn get(&self, ctx: &OpContext, collection: &str, id: &str) -> Result<RemoteEntity> {
        let url = self.entity_url(collection, id);
        log::debug!("GET {url}");
        let request = self.prepare(ctx, self.agent.get(&url))?;
        let mut response = self.finish(ctx, id, request.call())?;
        parse_entity(response.body_mut().read_json::<Value>()?)
    }

    fn put(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
        payload: &Value,
    ) -> Result<RemoteEntity> {
        let url = self.entity_url(collection, id);
        log::debug!("PUT {url}");
        let request = self.prepare(ctx, self.agent.put(&url))?;
        let mut response = self.finish(ctx, id, request.send_json(payload))?;
        parse_entity(response.body_mut().read_json::<Value>()?)
    }

    fn delete(&self, ctx: &OpContext, collection: &str, id: &str) -> Result<()> {
        let url = self.entity_url(collection, id);
        log::debug!("DELETE {url}");
        let request = self.prepare(ctx, self.agent.delete(&url))?;
        self.finish(ctx, id, request.call())?;
        Ok(())
    }
}

impl RemoteClient for HttpClient {
    fn list_filtered(
        &self,
        ctx: &OpContext,
        collection: &str,
        filters: &[Filter],
    ) -> AdapterResult<Vec<RemoteEntity>> {
        Ok(self.list(ctx, collection, filters)?)
    }

    fn create(
        &self,
        ctx: &OpContext,
        collection: &str,
        payload: &Value,
    ) -> AdapterResult<RemoteEntity> {
        Ok(self.post(ctx, collection, payload)?)
    }

    fn get_by_id(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
    ) -> AdapterResult<RemoteEntity> {
        Ok(self.get(ctx, collection, id)?)
    }

    fn update_by_id(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
        payload: &Value,
    ) -> AdapterResult<RemoteEntity> {
        Ok(self.put(ctx, collection, id, payload)?)
    }

    fn delete_by_id(&self, ctx: &OpContext, collection: &str, id: &str) -> AdapterResult<()> {
        Ok(self.delete(ctx, collection, id)?)
    }
}

/// Decode a single entity response body.
fn parse_entity(value: Value) -> Result<RemoteEntity> {
    RemoteEntity::from_json(value)
        .ok_or_else(|| Error::InvalidResponse("expected an object with an id".to_string()))
}

/// Decode a list response body.
fn parse_list(value: Value) -> Result<Vec<RemoteEntity>> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidResponse("expected a JSON array".to_string()));
    };
    items.into_iter().map(parse_entity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::AdapterError;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single request with `body` after `delay`
    fn serve_once(delay: Duration, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                thread::sleep(delay);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/api/v2")
    }

    fn client_for(base_url: &str) -> HttpClient {
        let credentials = Credentials::new("key", "org").unwrap();
        HttpClient::new(ClientConfig::new(credentials).with_base_url(base_url).unwrap())
    }

    fn client() -> HttpClient {
        let credentials = Credentials::new("key", "org").unwrap();
        HttpClient::new(
            ClientConfig::new(credentials)
                .with_base_url("http://127.0.0.1:9/api/v2")
                .unwrap(),
        )
    }

    #[test]
    fn test_collection_url() {
        assert_eq!(
            client().collection_url("usergroups"),
            "http://127.0.0.1:9/api/v2/usergroups"
        );
    }

    #[test]
    fn test_entity_url_encodes_id() {
        let client = client();
        assert_eq!(
            client.entity_url("usergroups", "5f1b2c"),
            "http://127.0.0.1:9/api/v2/usergroups/5f1b2c"
        );
        assert_eq!(
            client.entity_url("usergroups", "a/b c"),
            "http://127.0.0.1:9/api/v2/usergroups/a%2Fb%20c"
        );
    }

    #[test]
    fn test_default_base_url() {
        let client = HttpClient::new(ClientConfig::new(Credentials::new("k", "o").unwrap()));
        assert_eq!(
            client.collection_url("usergroups"),
            "https://console.jumpcloud.com/api/v2/usergroups"
        );
    }

    #[test]
    fn test_request_timeout_bounded_by_deadline() {
        let client = client();
        let ctx = OpContext::with_timeout(Duration::from_secs(2));
        let timeout = client.request_timeout(&ctx).unwrap();
        assert!(timeout <= Duration::from_secs(2));

        assert_eq!(
            client.request_timeout(&OpContext::new()).unwrap(),
            client.config().timeout()
        );
    }

    #[test]
    fn test_cancelled_context_never_sends() {
        let client = client();
        let ctx = OpContext::new();
        ctx.cancel();

        let err = client
            .create(&ctx, "usergroups", &json!({"name": "eng"}))
            .unwrap_err();
        assert_eq!(err, AdapterError::Cancelled);

        let err = client.get_by_id(&ctx, "usergroups", "grp_1").unwrap_err();
        assert_eq!(err, AdapterError::Cancelled);
    }

    #[test]
    fn test_parse_entity() {
        let entity =
            parse_entity(json!({"id": "5f1b", "name": "eng", "type": "user_group"})).unwrap();
        assert_eq!(entity.id, "5f1b");
        assert_eq!(entity.str_field("name"), Some("eng"));

        assert!(parse_entity(json!({"name": "eng"})).is_err());
    }

    #[test]
    fn test_parse_list() {
        let entities = parse_list(json!([
            {"id": "a", "name": "eng"},
            {"id": "b", "name": "ops"}
        ]))
        .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].id, "b");

        assert!(parse_list(json!({"results": []})).is_err());
        assert!(parse_list(json!([{"name": "no id"}])).is_err());
    }

    #[test]
    fn test_connect_rejects_bad_base_url() {
        let provider = ProviderConfig {
            base_url: Some("console.jumpcloud.com".into()),
            ..ProviderConfig::default()
        };
        let credentials = Credentials::new("k", "o").unwrap();
        assert!(HttpClient::connect(&credentials, &provider).is_err());
    }

    #[test]
    fn test_get_by_id_over_http() {
        let base = serve_once(Duration::ZERO, r#"{"id":"grp_1","name":"eng"}"#);
        let entity = client_for(&base)
            .get_by_id(&OpContext::new(), "usergroups", "grp_1")
            .unwrap();
        assert_eq!(entity.id, "grp_1");
        assert_eq!(entity.str_field("name"), Some("eng"));
    }

    #[test]
    fn test_cancel_during_request_is_reported() {
        let base = serve_once(Duration::from_millis(400), r#"{"id":"grp_1","name":"eng"}"#);
        let client = client_for(&base);

        let ctx = OpContext::new();
        let handle = ctx.cancel_handle();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handle.cancel();
        });

        let err = client.get_by_id(&ctx, "usergroups", "grp_1").unwrap_err();
        canceller.join().unwrap();
        assert_eq!(err, AdapterError::Cancelled);
    }
}
