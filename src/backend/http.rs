//! HTTP cart backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    backend::{BackendError, CartBackend},
    cart::Cart,
    items::LineItemId,
};

/// Configuration for connecting to the storefront API.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// API origin, e.g. `"https://shop.example.com"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// REST client for the storefront cart endpoints.
///
/// The session travels in cookies, so the underlying client keeps a cookie store.
#[derive(Debug, Clone)]
pub struct HttpCartBackend {
    base: Url,
    http: Client,
}

impl HttpCartBackend {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if `base_url` is not an absolute
    /// URL with a path, or [`BackendError::Network`] if the HTTP client cannot
    /// be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url)
            .map_err(|error| BackendError::InvalidUrl(format!("{}: {error}", config.base_url)))?;

        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url));
        }

        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { base, http })
    }

    /// Append `segments` to the base path. Each segment is percent-encoded, so
    /// a `/` or `?` inside one stays inside it.
    fn url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.base.clone();

        // `new` rejects cannot-be-a-base URLs, so the path is always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn item_url(&self, item: &LineItemId, action: Option<&str>) -> Url {
        self.url(
            ["api", "cart", "item", item.as_str()]
                .into_iter()
                .chain(action),
        )
    }
}

#[async_trait]
impl CartBackend for HttpCartBackend {
    #[tracing::instrument(name = "cart_backend.fetch_cart", skip(self))]
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        let response = self.http.get(self.url(["api", "cart"])).send().await?;
        let envelope: CartEnvelope = expect_success(response).await?.json().await?;

        debug!(items = envelope.cart.len(), "fetched cart");

        Ok(envelope.cart)
    }

    #[tracing::instrument(name = "cart_backend.remove_item", skip_all, fields(item = %item))]
    async fn remove_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let response = self.http.delete(self.item_url(&item, None)).send().await?;

        expect_success(response).await?;

        Ok(())
    }

    #[tracing::instrument(name = "cart_backend.increment_item", skip_all, fields(item = %item))]
    async fn increment_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let response = self
            .http
            .patch(self.item_url(&item, Some("add")))
            .send()
            .await?;

        expect_success(response).await?;

        Ok(())
    }

    #[tracing::instrument(name = "cart_backend.decrement_item", skip_all, fields(item = %item))]
    async fn decrement_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let response = self
            .http
            .patch(self.item_url(&item, Some("subtract")))
            .send()
            .await?;

        expect_success(response).await?;

        Ok(())
    }

    #[tracing::instrument(name = "cart_backend.apply_coupon", skip(self, code))]
    async fn apply_coupon(&self, code: String) -> Result<(), BackendError> {
        let body = serde_json::json!({ "couponCode": code });

        let response = self
            .http
            .post(self.url(["api", "cart", "apply-coupon"]))
            .json(&body)
            .send()
            .await?;

        match expect_success(response).await {
            // An unknown code is bad input, not a missing line item.
            Err(BackendError::NotFound) => {
                Err(BackendError::Validation("coupon code not found".to_string()))
            }
            other => other.map(|_response| ()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartEnvelope {
    cart: Cart,
}

async fn expect_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    debug!(status = status.as_u16(), "backend rejected request");

    Err(classify(status, body))
}

/// Map a non-2xx status and body onto the error taxonomy.
fn classify(status: StatusCode, body: String) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Validation(rejection_message(status, &body))
        }
        _ => BackendError::Server {
            status: status.as_u16(),
            body,
        },
    }
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
        });

    if let Some(message) = from_json {
        return message;
    }

    let trimmed = body.trim();

    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_string)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;

    fn backend(base_url: &str) -> Result<HttpCartBackend, BackendError> {
        HttpCartBackend::new(HttpBackendConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn urls_follow_cart_routes() -> TestResult {
        let backend = backend("https://shop.example.com/")?;
        let item = LineItemId::new("abc123");

        assert_eq!(
            backend.url(["api", "cart"]).as_str(),
            "https://shop.example.com/api/cart"
        );
        assert_eq!(
            backend.item_url(&item, None).as_str(),
            "https://shop.example.com/api/cart/item/abc123"
        );
        assert_eq!(
            backend.item_url(&item, Some("subtract")).as_str(),
            "https://shop.example.com/api/cart/item/abc123/subtract"
        );

        Ok(())
    }

    #[test]
    fn routes_keep_base_path() -> TestResult {
        let backend = backend("https://shop.example.com/store")?;

        assert_eq!(
            backend.url(["api", "cart"]).as_str(),
            "https://shop.example.com/store/api/cart"
        );

        Ok(())
    }

    #[test]
    fn item_id_stays_one_path_segment() -> TestResult {
        let backend = backend("https://shop.example.com")?;

        assert_eq!(
            backend.item_url(&LineItemId::new("x/add"), None).as_str(),
            "https://shop.example.com/api/cart/item/x%2Fadd"
        );
        assert_eq!(
            backend
                .item_url(&LineItemId::new("a?b#c"), Some("subtract"))
                .as_str(),
            "https://shop.example.com/api/cart/item/a%3Fb%23c/subtract"
        );

        Ok(())
    }

    #[test]
    fn rejects_unusable_base_url() {
        for base_url in ["not a url", "mailto:shop@example.com"] {
            let result = backend(base_url);

            assert!(
                matches!(result, Err(BackendError::InvalidUrl(_))),
                "{base_url}: got {result:?}"
            );
        }
    }

    fn server_backend(server: &MockServer) -> Result<HttpCartBackend, BackendError> {
        backend(&server.uri())
    }

    #[tokio::test]
    async fn fetch_cart_unwraps_envelope() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cart": {
                    "items": [{
                        "id": "li-1",
                        "productId": "card-1",
                        "name": "Foil Knight",
                        "unitPrice": "200000",
                        "quantity": 2
                    }],
                    "appliedCoupon": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cart = server_backend(&server)?.fetch_cart().await?;

        assert_eq!(
            cart.item(&LineItemId::new("li-1")).map(|line| line.quantity.get()),
            Some(2)
        );
        assert_eq!(cart.applied_coupon, None);

        server.verify().await;

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_sends_delete() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/cart/item/li-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        server_backend(&server)?
            .remove_item(LineItemId::new("li-1"))
            .await?;

        server.verify().await;

        Ok(())
    }

    #[tokio::test]
    async fn increment_item_patches_add() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/cart/item/li-1/add"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        server_backend(&server)?
            .increment_item(LineItemId::new("li-1"))
            .await?;

        server.verify().await;

        Ok(())
    }

    #[tokio::test]
    async fn decrement_item_patches_subtract() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/cart/item/li-1/subtract"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        server_backend(&server)?
            .decrement_item(LineItemId::new("li-1"))
            .await?;

        server.verify().await;

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_posts_code() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/cart/apply-coupon"))
            .and(body_json(json!({ "couponCode": "TEN" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        server_backend(&server)?
            .apply_coupon("TEN".to_string())
            .await?;

        server.verify().await;

        Ok(())
    }

    #[tokio::test]
    async fn unknown_coupon_is_a_validation_error() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/cart/apply-coupon"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = server_backend(&server)?
            .apply_coupon("NOPE".to_string())
            .await;

        assert!(
            matches!(&result, Err(BackendError::Validation(m)) if m == "coupon code not found"),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_line_is_not_found() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/cart/item/gone/subtract"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = server_backend(&server)?
            .decrement_item(LineItemId::new("gone"))
            .await;

        assert!(matches!(result, Err(BackendError::NotFound)), "got {result:?}");

        Ok(())
    }

    #[tokio::test]
    async fn rejected_increment_carries_message() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/cart/item/li-1/add"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "error": "insufficient stock" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = server_backend(&server)?
            .increment_item(LineItemId::new("li-1"))
            .await;

        assert!(
            matches!(&result, Err(BackendError::Validation(m)) if m == "insufficient stock"),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn escaped_item_id_reaches_item_route() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/cart/item/x%2Fadd"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        server_backend(&server)?
            .remove_item(LineItemId::new("x/add"))
            .await?;

        server.verify().await;

        Ok(())
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, String::new()),
            BackendError::NotFound
        ));
    }

    #[test]
    fn bad_request_uses_json_message() {
        let error = classify(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Coupon expired"}"#.to_string(),
        );

        assert!(
            matches!(&error, BackendError::Validation(message) if message == "Coupon expired"),
            "got {error:?}"
        );
    }

    #[test]
    fn unprocessable_falls_back_to_error_field_then_body() {
        let from_error_field = classify(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":"insufficient stock"}"#.to_string(),
        );
        let from_body = classify(StatusCode::CONFLICT, "  out of stock \n".to_string());

        assert!(
            matches!(&from_error_field, BackendError::Validation(m) if m == "insufficient stock"),
            "got {from_error_field:?}"
        );
        assert!(
            matches!(&from_body, BackendError::Validation(m) if m == "out of stock"),
            "got {from_body:?}"
        );
    }

    #[test]
    fn empty_validation_body_uses_reason_phrase() {
        let error = classify(StatusCode::BAD_REQUEST, String::new());

        assert!(
            matches!(&error, BackendError::Validation(m) if m == "Bad Request"),
            "got {error:?}"
        );
    }

    #[test]
    fn other_statuses_are_server_errors() {
        let error = classify(StatusCode::BAD_GATEWAY, "upstream down".to_string());

        assert!(
            matches!(&error, BackendError::Server { status: 502, body } if body == "upstream down"),
            "got {error:?}"
        );
    }

    #[test]
    fn envelope_decodes_cart_payload() -> TestResult {
        let envelope: CartEnvelope = serde_json::from_str(
            r#"{
                "cart": {
                    "items": [{
                        "id": "li-1",
                        "productId": "card-1",
                        "name": "Foil Knight",
                        "unitPrice": 200000,
                        "quantity": 1
                    }],
                    "appliedCoupon": {
                        "code": "HALF",
                        "discountType": "FIXED",
                        "discountValue": 100000
                    }
                }
            }"#,
        )?;

        assert_eq!(envelope.cart.len(), 1);
        assert_eq!(
            envelope.cart.applied_coupon.map(|coupon| coupon.code),
            Some("HALF".to_string())
        );

        Ok(())
    }
}
