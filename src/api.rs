//! Product lookup against the storefront HTTP API.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::credentials::Credentials;
use crate::error::{E2eError, E2eResult};

/// `{ "Products": [ ... ] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ApiProduct>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiProduct {
    #[serde(rename = "SKU", default)]
    pub sku: String,
    #[serde(default)]
    pub price: Option<ApiPrice>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiPrice {
    #[serde(default)]
    pub value: Value,
}

impl ApiProduct {
    /// `Price.Value` as a finite number. Numeric strings are accepted.
    pub fn price_value(&self) -> Option<f64> {
        let value = &self.price.as_ref()?.value;
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        number.is_finite().then_some(number)
    }
}

/// First product of a products response, or the reason there is none.
///
/// Anything other than 200, a body that does not parse, or an empty list is
/// a failure. A missing product is never treated as "skip".
pub fn parse_products(status: u16, body: &str, sku: &str) -> E2eResult<ApiProduct> {
    if status != 200 {
        let snippet: String = body.chars().take(200).collect();
        return Err(E2eError::Remote {
            status,
            detail: format!("expected HTTP 200 for SKU '{}', body: {}", sku, snippet),
        });
    }
    let response: ProductsResponse = serde_json::from_str(body).map_err(|e| E2eError::Remote {
        status,
        detail: format!("malformed products body: {}", e),
    })?;
    response
        .products
        .into_iter()
        .next()
        .ok_or_else(|| E2eError::NoProduct { sku: sku.to_string() })
}

/// Basic-auth client for `GET {base}/v2/products?SKU=...`.
pub struct ProductApi {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: Credentials,
}

impl ProductApi {
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> E2eResult<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn products_url(&self, sku: &str) -> E2eResult<Url> {
        Url::parse_with_params(&format!("{}/v2/products", self.base_url), &[("SKU", sku)])
            .map_err(|e| E2eError::Config(format!("invalid API base URL '{}': {}", self.base_url, e)))
    }

    pub fn fetch_product(&self, sku: &str) -> E2eResult<ApiProduct> {
        let url = self.products_url(sku)?;
        debug!(%url, "fetching product");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(self.credentials.password()))
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        let product = parse_products(status, &body, sku)?;
        info!(sku = %product.sku, status, "API product fetched");
        Ok(product)
    }
}
