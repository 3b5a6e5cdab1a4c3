//! Named high-level actions that scenarios are written in.
//!
//! Each action delegates to one page-object concern. The only shared state
//! reachable from here is the injected [`SessionCache`].

use crate::auth::credentials::Credentials;
use crate::auth::session_cache::{SessionCache, SessionOutcome};
use crate::error::E2eResult;
use crate::pages::cart::{CartExpectations, CartPage};
use crate::pages::context::PageContext;
use crate::pages::home::HomePage;
use crate::pages::login::LoginPage;
use crate::pages::product::ProductPage;
use crate::trace::event::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOptions {
    /// Reuse (and populate) the session cache.
    pub use_session: bool,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self { use_session: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddToCartOptions {
    pub quantity: u32,
}

impl Default for AddToCartOptions {
    fn default() -> Self {
        Self { quantity: 1 }
    }
}

/// The storefront command vocabulary.
#[derive(Clone, Default)]
pub struct ShopActions {
    sessions: SessionCache,
}

impl ShopActions {
    pub fn new(sessions: SessionCache) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn log_step(&self, ctx: &mut PageContext, description: &str) {
        ctx.record(EventKind::Step, description);
    }

    /// Log in through the header popup, through the session cache unless
    /// `use_session` is off. Returns `None` when the cache was bypassed.
    pub fn login(
        &self,
        ctx: &mut PageContext,
        credentials: &Credentials,
        options: LoginOptions,
    ) -> E2eResult<Option<SessionOutcome>> {
        let perform_login = |ctx: &mut PageContext| -> E2eResult<()> {
            LoginPage::visit_login_page(ctx)?;
            LoginPage::login(ctx, credentials)?;
            Ok(())
        };

        if !options.use_session {
            perform_login(ctx)?;
            return Ok(None);
        }

        let outcome = self.sessions.with_cached_session(
            ctx,
            &credentials.username,
            perform_login,
            validate_session,
        )?;
        Ok(Some(outcome))
    }

    pub fn search_product(&self, ctx: &mut PageContext, term: &str) -> E2eResult<()> {
        HomePage::visit_homepage(ctx)?;
        HomePage::search_product(ctx, term)
    }

    pub fn verify_search_result(&self, ctx: &mut PageContext, expected_sku: &str) -> E2eResult<()> {
        ProductPage::verify_product_in_results(ctx, expected_sku)
    }

    /// Item number currently shown, for later assertions.
    pub fn note_item_number(&self, ctx: &mut PageContext) -> E2eResult<String> {
        ProductPage::wait_for_product_load(ctx)?;
        let item_number = ProductPage::get_item_number(ctx)?;
        ctx.record(EventKind::Note, format!("item number {}", item_number.trim()));
        Ok(item_number)
    }

    pub fn add_special_instructions(&self, ctx: &mut PageContext, instructions: &str) -> E2eResult<()> {
        ProductPage::enter_special_instructions(ctx, instructions)
    }

    /// Add the current product. A quantity of 1 is the page default, so the
    /// quantity step is skipped for it.
    pub fn add_to_cart(&self, ctx: &mut PageContext, options: AddToCartOptions) -> E2eResult<()> {
        if options.quantity != 1 {
            ProductPage::set_quantity(ctx, options.quantity)?;
        }
        ProductPage::add_to_cart(ctx)
    }

    pub fn visit_cart(&self, ctx: &mut PageContext) -> E2eResult<()> {
        CartPage::visit_cart_page(ctx)
    }

    pub fn verify_cart_count(&self, ctx: &mut PageContext, expected: u32) -> E2eResult<()> {
        CartPage::verify_cart_count(ctx, expected)
    }

    pub fn verify_item_in_cart(
        &self,
        ctx: &mut PageContext,
        item_number: &str,
        expected_item_description: &str,
    ) -> E2eResult<()> {
        CartPage::verify_cart_details(
            ctx,
            &CartExpectations {
                item_number: item_number.to_string(),
                expected_item_description: expected_item_description.to_string(),
                ..Default::default()
            },
        )
    }

    pub fn verify_special_instructions_in_cart(&self, ctx: &mut PageContext, expected: &str) -> E2eResult<()> {
        CartPage::verify_special_instructions(ctx, expected)
    }

    /// Return the cart to empty from wherever the scenario stopped.
    pub fn empty_cart(&self, ctx: &mut PageContext) -> E2eResult<bool> {
        let on_cart_page = ctx
            .driver()
            .current_url()?
            .contains(crate::pages::cart::selectors::CART_PATH);
        if !on_cart_page {
            CartPage::visit_cart_page(ctx)?;
        }
        CartPage::remove_all_items(ctx)
    }
}

/// Cheap probe for a restored session: the home page loads.
pub fn validate_session(ctx: &mut PageContext) -> E2eResult<()> {
    ctx.visit("/")?;
    ctx.wait_for_document_ready()?;
    ctx.wait_visible("body")?;
    Ok(())
}
