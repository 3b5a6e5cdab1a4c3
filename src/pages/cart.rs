use tracing::info;

use crate::browser::element::first_visible;
use crate::error::{E2eError, E2eResult};
use crate::pages::context::PageContext;
use crate::trace::event::EventKind;

pub mod selectors {
    pub const ITEM_DESCRIPTION: &str = r#"[data-test="item-description"]"#;
    pub const CART_COUNT: &str = r#"[data-test="cart-count"]"#;
    pub const REMOVE_ALL_BUTTON: &str = r#"[data-test="remove-all-button"]"#;
    pub const REMOVE_ALL_CONFIRM_BUTTON: &str = r#"[data-test="remove-all-items"]"#;
    pub const EMPTY_CART_MESSAGE: &str = r#"[data-test="empty-cart-message"]"#;
    /// Header cart affordance that opens the cart popout.
    pub const CART_ICON_LABEL: &str = r#"[data-test="Cart"] > .d-block"#;
    /// "Go to cart" inside the popout; duplicated for mobile.
    pub const GO_TO_CART_LINK: &str = r#"[data-test="cart-buttons"] > .sbtn"#;
    pub const ITEM_LINK: &str = "a";
    pub const CART_PATH: &str = "/cart";
    pub const EMPTY_CART_TEXT: &str = "Your cart is empty";
}

/// What the cart page should show. Empty fields are not checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartExpectations {
    pub item_number: String,
    pub special_instructions: String,
    pub expected_item_description: String,
}

/// Digits of a badge text as a number: `"(1)"` → 1, `"12 items"` → 12.
pub fn parse_badge_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Shopping cart page and the header cart popout.
pub struct CartPage;

impl CartPage {
    /// Reach the cart through the header popout rather than by URL.
    pub fn visit_cart_page(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.click(selectors::CART_ICON_LABEL)?;
        ctx.click(selectors::GO_TO_CART_LINK)?;
        Self::wait_for_load(ctx)
    }

    /// Document ready plus the cart URL.
    pub fn wait_for_load(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_for_document_ready()?;
        ctx.wait_url_contains(selectors::CART_PATH)?;
        Ok(())
    }

    pub fn verify_cart_page_loaded(ctx: &mut PageContext) -> E2eResult<()> {
        let url = ctx.driver().current_url()?;
        if url.contains(selectors::CART_PATH) {
            Ok(())
        } else {
            Err(E2eError::mismatch("cart URL", format!("*{}*", selectors::CART_PATH), url))
        }
    }

    /// Current numeric value of the badge, if a visible one parses.
    pub fn get_cart_count(ctx: &mut PageContext) -> E2eResult<Option<u32>> {
        Ok(ctx
            .first_visible(selectors::CART_COUNT)?
            .and_then(|badge| parse_badge_count(&badge.text)))
    }

    pub fn verify_cart_count(ctx: &mut PageContext, expected: u32) -> E2eResult<()> {
        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        waiter.until(
            &format!("cart badge to read {}", expected),
            || {
                driver
                    .query(selectors::CART_COUNT)
                    .map(|els| first_visible(&els).map(|e| e.text.clone()))
            },
            |text| text.as_deref().and_then(parse_badge_count) == Some(expected),
        )?;
        ctx.record(EventKind::Wait, format!("cart count is {}", expected));
        Ok(())
    }

    pub fn verify_item_number_in_cart(ctx: &mut PageContext, item_number: &str) -> E2eResult<()> {
        ctx.wait_contains(selectors::ITEM_LINK, item_number)?;
        Ok(())
    }

    pub fn verify_special_instructions(ctx: &mut PageContext, instructions: &str) -> E2eResult<()> {
        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        let result = waiter.until(
            &format!("page body to contain '{}'", instructions),
            || {
                driver
                    .query("body")
                    .map(|els| els.into_iter().next().map(|b| b.text).unwrap_or_default())
            },
            |body| body.contains(instructions),
        );
        match result {
            Ok(_) => Ok(()),
            Err(E2eError::Timeout { .. }) => Err(E2eError::mismatch(
                "special instructions in cart",
                instructions,
                "<not found in page body>",
            )),
            Err(e) => Err(e),
        }
    }

    pub fn verify_item_description(ctx: &mut PageContext, expected: &str) -> E2eResult<()> {
        ctx.wait_text(
            selectors::ITEM_DESCRIPTION,
            &format!("item description to contain '{}'", expected),
            |t| t.contains(expected),
        )?;
        Ok(())
    }

    pub fn verify_cart_details(ctx: &mut PageContext, expected: &CartExpectations) -> E2eResult<()> {
        if !expected.item_number.is_empty() {
            Self::verify_item_number_in_cart(ctx, &expected.item_number)?;
        }
        if !expected.special_instructions.is_empty() {
            Self::verify_special_instructions(ctx, &expected.special_instructions)?;
        }
        if !expected.expected_item_description.is_empty() {
            Self::verify_item_description(ctx, &expected.expected_item_description)?;
        }
        Ok(())
    }

    /// Empty the cart. Waits until the cart has drawn either its "remove
    /// all" control or the empty-cart message; only the message means there
    /// is nothing to do. After confirming, waits for the empty-cart message
    /// so the removal has landed before anything else touches the browser.
    /// Returns whether anything was removed.
    pub fn remove_all_items(ctx: &mut PageContext) -> E2eResult<bool> {
        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        let has_items = waiter.poll(
            "cart to show its remove-all control or the empty-cart message",
            || {
                let remove = driver.query(selectors::REMOVE_ALL_BUTTON)?;
                let empty = driver.query(selectors::EMPTY_CART_MESSAGE)?;
                Ok((first_visible(&remove).is_some(), first_visible(&empty).is_some()))
            },
            |&(remove, empty)| match (remove, empty) {
                (true, _) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            },
        )?;

        if !has_items {
            info!("cart already empty; nothing to remove");
            ctx.record(EventKind::Note, "cart already empty");
            return Ok(false);
        }
        ctx.click(selectors::REMOVE_ALL_BUTTON)?;
        ctx.click(selectors::REMOVE_ALL_CONFIRM_BUTTON)?;
        Self::verify_cart_empty(ctx)?;
        Ok(true)
    }

    pub fn verify_cart_empty(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_text(
            selectors::EMPTY_CART_MESSAGE,
            &format!("empty cart message containing '{}'", selectors::EMPTY_CART_TEXT),
            |t| t.contains(selectors::EMPTY_CART_TEXT),
        )?;
        Ok(())
    }
}
