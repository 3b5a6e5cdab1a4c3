use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// Test data for one product-driven scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFixture {
    pub sku: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default)]
    pub expected_item_description: String,
}

/// Named product fixtures, read once and shared read-only by scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureStore {
    products: BTreeMap<String, ProductFixture>,
}

impl FixtureStore {
    pub fn new(products: BTreeMap<String, ProductFixture>) -> Self {
        Self { products }
    }

    /// Load a JSON or YAML fixture file, picked by extension (JSON otherwise).
    pub fn load(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Config(format!("cannot read fixtures '{}': {}", path.display(), e))
        })?;
        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");
        let store = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(store)
    }

    pub fn get(&self, name: &str) -> E2eResult<&ProductFixture> {
        let fixture = self
            .products
            .get(name)
            .ok_or_else(|| E2eError::Config(format!("no product fixture named '{}'", name)))?;
        if fixture.sku.trim().is_empty() {
            return Err(E2eError::Config(format!("product fixture '{}' has an empty sku", name)));
        }
        Ok(fixture)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
