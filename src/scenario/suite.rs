//! The built-in storefront scenarios.

use reqwest::Url;
use tracing::warn;

use crate::actions::{AddToCartOptions, LoginOptions};
use crate::error::{E2eError, E2eResult};
use crate::pages::cart::CartPage;
use crate::pages::context::PageContext;
use crate::pages::product::{selectors as product_selectors, ProductPage};
use crate::reconcile::reconcile;
use crate::scenario::context::ScenarioEnv;
use crate::scenario::model::{Completion, Scenario};

pub const WORKFLOW_FIXTURE: &str = "workflowProduct";
pub const API_UI_FIXTURE: &str = "apiUiProduct";
pub const RELIABILITY_FIXTURE: &str = "reliabilityProduct";

/// Run `body`, then empty the cart whatever happened.
///
/// The body's error wins over a cleanup error; a cleanup error after a
/// passing body fails the scenario.
pub fn with_cart_cleanup<F>(env: &mut ScenarioEnv<'_>, body: F) -> E2eResult<Completion>
where
    F: FnOnce(&mut ScenarioEnv<'_>) -> E2eResult<Completion>,
{
    let result = body(&mut *env);
    env.step("Remove all items from cart");
    let cleanup = env.actions.empty_cart(env.page);
    match (result, cleanup) {
        (Ok(completion), Ok(_)) => Ok(completion),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(cleanup_error)) => {
            warn!("cart cleanup failed after scenario error: {}", cleanup_error);
            Err(e)
        }
    }
}

/// `{base}/search/results?query=<sku>`, query-encoded.
pub fn search_results_url(page: &PageContext, sku: &str) -> E2eResult<String> {
    let base = page.url_for("/search/results");
    Url::parse_with_params(&base, &[("query", sku)])
        .map(String::from)
        .map_err(|e| E2eError::Config(format!("invalid search URL '{}': {}", base, e)))
}

/// Land on the search results for `sku` and wait for the SKU to show.
pub fn open_search_results(page: &mut PageContext, sku: &str) -> E2eResult<()> {
    let url = search_results_url(page, sku)?;
    page.visit(&url)?;
    page.wait_for_document_ready()?;
    page.wait_contains(product_selectors::ANY, sku)?;
    Ok(())
}

// ============================================================================
// E2E workflow
// ============================================================================

/// Login, search, instructions, add to cart, verify the cart, empty it.
pub struct WorkflowScenario {
    pub fixture: String,
}

impl Default for WorkflowScenario {
    fn default() -> Self {
        Self {
            fixture: WORKFLOW_FIXTURE.into(),
        }
    }
}

impl Scenario for WorkflowScenario {
    fn name(&self) -> &str {
        "Complete E2E workflow from search to cart verification"
    }

    fn group(&self) -> &str {
        "E2E Workflow Automation"
    }

    fn run(&self, env: &mut ScenarioEnv<'_>) -> E2eResult<Completion> {
        let credentials = env.credentials()?;
        let product = env.fixtures.get(&self.fixture)?.clone();

        env.step("Login with provided credentials");
        env.actions
            .login(env.page, &credentials, LoginOptions { use_session: false })?;

        with_cart_cleanup(env, |env| {
            env.step(&format!("Search for product: {}", product.sku));
            env.actions.search_product(env.page, &product.sku)?;
            env.actions.verify_search_result(env.page, &product.sku)?;

            env.step("Capture item number from product page");
            let item_number = env.actions.note_item_number(env.page)?;
            if !item_number.contains(&product.sku) {
                return Err(E2eError::mismatch("item number", &product.sku, item_number.trim()));
            }

            env.step(&format!("Enter special instructions: {}", product.special_instructions));
            env.actions
                .add_special_instructions(env.page, &product.special_instructions)?;

            env.step("Add product to cart");
            env.actions.add_to_cart(env.page, AddToCartOptions::default())?;
            env.actions.verify_cart_count(env.page, 1)?;

            env.step("Open cart and verify details");
            env.actions.visit_cart(env.page)?;
            CartPage::verify_cart_page_loaded(env.page)?;
            env.actions
                .verify_item_in_cart(env.page, &product.sku, &product.expected_item_description)?;
            env.actions
                .verify_special_instructions_in_cart(env.page, &product.special_instructions)?;
            Ok(Completion::Done)
        })
    }
}

// ============================================================================
// API + UI reconciliation
// ============================================================================

/// The product API and the product page agree on SKU, price, description
/// and status.
pub struct ApiUiScenario {
    pub fixture: String,
}

impl Default for ApiUiScenario {
    fn default() -> Self {
        Self {
            fixture: API_UI_FIXTURE.into(),
        }
    }
}

impl Scenario for ApiUiScenario {
    fn name(&self) -> &str {
        "Validate SKU, price, description, and status between API and UI"
    }

    fn group(&self) -> &str {
        "API + UI Hybrid Validation"
    }

    fn run(&self, env: &mut ScenarioEnv<'_>) -> E2eResult<Completion> {
        let credentials = match env.credentials() {
            Ok(credentials) => credentials,
            Err(e) if !env.ci => {
                warn!("WARNING: credentials not set, skipping: {}", e);
                return Ok(Completion::Skipped(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        let sku = env.fixtures.get(&self.fixture)?.sku.clone();

        env.step("Fetch product data from API (basic auth)");
        let api_product = env.product_api(credentials.clone())?.fetch_product(&sku)?;

        env.step("Login via UI and search product");
        env.actions
            .login(env.page, &credentials, LoginOptions { use_session: true })?;
        env.actions.search_product(env.page, &sku)?;
        env.actions.verify_search_result(env.page, &sku)?;
        ProductPage::wait_for_product_load(env.page)?;

        env.step("Compare API and UI fields");
        let details = ProductPage::get_details(env.page)?;
        reconcile(&sku, &api_product, &details)?.into_result()?;
        Ok(Completion::Done)
    }
}

// ============================================================================
// Product page reliability
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityCheck {
    CoreDetails,
    QuantityToCart,
    ProductImage,
    ProductTitle,
}

/// One product page check, each starting from the search results URL.
pub struct ReliabilityScenario {
    pub check: ReliabilityCheck,
    pub fixture: String,
}

impl ReliabilityScenario {
    pub fn new(check: ReliabilityCheck) -> Self {
        Self {
            check,
            fixture: RELIABILITY_FIXTURE.into(),
        }
    }

    pub fn all() -> Vec<Self> {
        [
            ReliabilityCheck::CoreDetails,
            ReliabilityCheck::QuantityToCart,
            ReliabilityCheck::ProductImage,
            ReliabilityCheck::ProductTitle,
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }
}

impl Scenario for ReliabilityScenario {
    fn name(&self) -> &str {
        match self.check {
            ReliabilityCheck::CoreDetails => "should load product and show core details",
            ReliabilityCheck::QuantityToCart => "should update quantity and add product to cart",
            ReliabilityCheck::ProductImage => "should show product image on the page",
            ReliabilityCheck::ProductTitle => "should display a product title",
        }
    }

    fn group(&self) -> &str {
        "Packaging Product Page"
    }

    fn run(&self, env: &mut ScenarioEnv<'_>) -> E2eResult<Completion> {
        let sku = env.fixtures.get(&self.fixture)?.sku.clone();

        env.step(&format!("Open search results for {}", sku));
        open_search_results(env.page, &sku)?;

        match self.check {
            ReliabilityCheck::CoreDetails => {
                ProductPage::verify_price_displayed(env.page)?;
                ProductPage::verify_ship_date_visible(env.page)?;
            }
            ReliabilityCheck::QuantityToCart => {
                let credentials = env.credentials()?;
                env.step("Login");
                env.actions
                    .login(env.page, &credentials, LoginOptions { use_session: true })?;
                return with_cart_cleanup(env, |env| {
                    open_search_results(env.page, &sku)?;

                    env.step("Set quantity to 5 and add to cart");
                    ProductPage::set_quantity(env.page, 5)?;
                    ProductPage::verify_quantity_value(env.page, 5)?;
                    ProductPage::add_to_cart(env.page)?;
                    CartPage::verify_cart_count(env.page, 1)?;

                    env.step("Verify cart");
                    CartPage::visit_cart_page(env.page)?;
                    CartPage::verify_item_number_in_cart(env.page, &sku)?;
                    CartPage::verify_cart_count(env.page, 1)?;
                    Ok(Completion::Done)
                });
            }
            ReliabilityCheck::ProductImage => {
                ProductPage::verify_product_image_loaded(env.page)?;
            }
            ReliabilityCheck::ProductTitle => {
                ProductPage::verify_product_title_present(env.page)?;
            }
        }
        Ok(Completion::Done)
    }
}

/// Every built-in scenario in run order.
pub fn builtin_scenarios() -> Vec<Box<dyn Scenario>> {
    let mut scenarios: Vec<Box<dyn Scenario>> = vec![
        Box::new(WorkflowScenario::default()),
        Box::new(ApiUiScenario::default()),
    ];
    for scenario in ReliabilityScenario::all() {
        scenarios.push(Box::new(scenario));
    }
    scenarios
}

/// Built-in scenarios whose name contains any of `filters`, all when empty.
pub fn select_scenarios(filters: &[String]) -> Vec<Box<dyn Scenario>> {
    builtin_scenarios()
        .into_iter()
        .filter(|s| {
            filters.is_empty()
                || filters
                    .iter()
                    .any(|f| s.name().to_lowercase().contains(&f.to_lowercase()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_unique() {
        let scenarios = builtin_scenarios();
        let mut names: Vec<&str> = scenarios.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 6);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn filters_match_case_insensitively() {
        let selected = select_scenarios(&["PRODUCT TITLE".to_string()]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "should display a product title");
        assert_eq!(select_scenarios(&[]).len(), 6);
    }
}
