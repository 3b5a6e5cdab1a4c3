//! API vs UI comparison of one product.

use tracing::warn;

use crate::api::ApiProduct;
use crate::error::{E2eError, E2eResult};
use crate::pages::product::ProductDetails;

/// Price text as a fixed two-decimal string: `"$1,212.5"` → `"1212.50"`.
///
/// Everything but digits and the decimal point is dropped first.
pub fn normalize_price_text(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let value: f64 = cleaned.parse().ok()?;
    normalize_price_value(value)
}

pub fn normalize_price_value(value: f64) -> Option<String> {
    value.is_finite().then(|| format!("{:.2}", value))
}

/// One compared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCheck {
    pub field: &'static str,
    pub api: String,
    pub ui: String,
}

impl FieldCheck {
    pub fn matches(&self) -> bool {
        self.api == self.ui
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub checks: Vec<FieldCheck>,
}

impl Reconciliation {
    pub fn mismatches(&self) -> Vec<&FieldCheck> {
        self.checks.iter().filter(|c| !c.matches()).collect()
    }

    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(FieldCheck::matches)
    }

    /// Fail on the first mismatching field; every mismatch is logged.
    pub fn into_result(self) -> E2eResult<()> {
        let mismatches = self.mismatches();
        for check in &mismatches {
            warn!(field = check.field, api = %check.api, ui = %check.ui, "API/UI mismatch");
        }
        match mismatches.first() {
            None => Ok(()),
            Some(check) => Err(E2eError::Assertion {
                subject: format!("{} (API vs UI)", check.field),
                expected: check.api.clone(),
                actual: check.ui.clone(),
            }),
        }
    }
}

/// Compare SKU, price, description and status.
///
/// A missing or non-numeric API price is a remote failure, not a mismatch.
/// When the API omits the SKU the requested one stands in.
pub fn reconcile(requested_sku: &str, api: &ApiProduct, ui: &ProductDetails) -> E2eResult<Reconciliation> {
    let api_price = api
        .price_value()
        .and_then(normalize_price_value)
        .ok_or_else(|| E2eError::Remote {
            status: 200,
            detail: format!("API price value is missing or invalid for SKU '{}'", requested_sku),
        })?;
    let ui_price = normalize_price_text(&ui.price)
        .unwrap_or_else(|| format!("<unparseable: {:?}>", ui.price));

    let api_sku = if api.sku.trim().is_empty() {
        requested_sku.trim()
    } else {
        api.sku.trim()
    };

    Ok(Reconciliation {
        checks: vec![
            FieldCheck {
                field: "sku",
                api: api_sku.to_string(),
                ui: ui.item_number.trim().to_string(),
            },
            FieldCheck {
                field: "price",
                api: api_price,
                ui: ui_price,
            },
            FieldCheck {
                field: "description",
                api: api.description.trim().to_string(),
                ui: ui.title.trim().to_string(),
            },
            FieldCheck {
                field: "status",
                api: api.status.trim().to_string(),
                ui: ui.status.trim().to_string(),
            },
        ],
    })
}
