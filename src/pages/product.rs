use crate::browser::element::first_visible;
use crate::error::{E2eError, E2eResult};
use crate::pages::context::PageContext;
use crate::trace::event::EventKind;

pub mod selectors {
    pub const ITEM_NUMBER: &str = r#"span[data-test="item-number"]"#;
    pub const PRODUCT_TITLE: &str = ".productDescription";
    pub const PRODUCT_PRICE: &str = r#"[data-test="usd-price"]"#;
    pub const PRODUCT_STATUS: &str = r#"[data-test="status-message"]"#;
    pub const QUANTITY_INPUT: &str = r#"[data-test="quantity"]"#;
    pub const ADD_TO_CART_BUTTON: &str = r#"span[data-bind="text: Product().ButtonText"]"#;
    pub const SPECIAL_INSTRUCTIONS_INPUT: &str = r#"[placeholder="Reviewed Prior to Shipping"]"#;
    pub const PRODUCT_IMAGE: &str = ".carousel-item.active img.use-gesture-zoom";
    /// Header badge that appears once the cart holds something.
    pub const CART_COUNT: &str = r#"[data-test="cart-count"]"#;
    /// Any element, for text lookups.
    pub const ANY: &str = "*";
    pub const SHIP_DATE_TEXT: &str = "Ready to Ship";
    /// URL fragment of the price recalculation call fired by quantity changes.
    pub const PRICING_REQUEST: &str = "/pricing";
}

/// Product details as rendered, read fresh from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub item_number: String,
    pub title: String,
    pub price: String,
    pub status: String,
}

/// Product detail / search result page.
pub struct ProductPage;

impl ProductPage {
    /// Document ready plus a visible item number.
    pub fn wait_for_product_load(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_for_document_ready()?;
        ctx.wait_visible(selectors::ITEM_NUMBER)?;
        Ok(())
    }

    pub fn get_item_number(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.text_of(selectors::ITEM_NUMBER)
    }

    pub fn get_product_title(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.text_of(selectors::PRODUCT_TITLE)
    }

    pub fn get_product_price(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.text_of(selectors::PRODUCT_PRICE)
    }

    pub fn get_product_status(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.text_of(selectors::PRODUCT_STATUS)
    }

    pub fn get_details(ctx: &mut PageContext) -> E2eResult<ProductDetails> {
        Ok(ProductDetails {
            item_number: Self::get_item_number(ctx)?,
            title: Self::get_product_title(ctx)?,
            price: Self::get_product_price(ctx)?,
            status: Self::get_product_status(ctx)?,
        })
    }

    pub fn verify_price_displayed(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.wait_text(selectors::PRODUCT_PRICE, "product price to be non-empty", |t| {
            !t.trim().is_empty()
        })
    }

    pub fn verify_product_title_present(ctx: &mut PageContext) -> E2eResult<String> {
        ctx.wait_text(selectors::PRODUCT_TITLE, "product title to be non-empty", |t| {
            !t.trim().is_empty()
        })
    }

    pub fn verify_ship_date_visible(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_contains(selectors::ANY, selectors::SHIP_DATE_TEXT)?;
        Ok(())
    }

    pub fn verify_product_in_results(ctx: &mut PageContext, sku: &str) -> E2eResult<()> {
        ctx.wait_visible(selectors::ITEM_NUMBER)?;
        ctx.wait_text(
            selectors::ITEM_NUMBER,
            &format!("item number to contain '{}'", sku),
            |t| t.contains(sku),
        )?;
        Ok(())
    }

    /// The active carousel image finished decoding (non-zero natural width).
    pub fn verify_product_image_loaded(ctx: &mut PageContext) -> E2eResult<u32> {
        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        waiter.poll(
            "product image to have a non-zero naturalWidth",
            || {
                let elements = driver.query(selectors::PRODUCT_IMAGE)?;
                match first_visible(&elements) {
                    Some(img) => driver.property(selectors::PRODUCT_IMAGE, img.index, "naturalWidth"),
                    None => Ok(None),
                }
            },
            |width| width.as_deref().and_then(|w| w.trim().parse::<u32>().ok()).filter(|w| *w > 0),
        )
    }

    /// Set the quantity through the input's native value path, then confirm it
    /// stuck once the price recalculation it triggers has settled.
    ///
    /// Strategy: write, wait until no pricing request is in flight, read the
    /// value back. If the page reset the field while settling, write it again
    /// and keep polling until the value holds with nothing in flight.
    pub fn set_quantity(ctx: &mut PageContext, quantity: u32) -> E2eResult<()> {
        let target = quantity.to_string();
        let input = ctx.wait_actionable(selectors::QUANTITY_INPUT)?;
        if input.value.as_deref() != Some(target.as_str()) {
            ctx.record(EventKind::Action, format!("set quantity to {}", target));
            ctx.driver().set_value(selectors::QUANTITY_INPUT, input.index, &target)?;
        }

        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        waiter.until(
            &format!("quantity to settle at {}", target),
            || {
                let pending = driver.pending_requests(selectors::PRICING_REQUEST)?;
                let elements = driver.query(selectors::QUANTITY_INPUT)?;
                let current = first_visible(&elements).map(|e| (e.index, e.value.clone()));
                if pending == 0 {
                    if let Some((index, value)) = &current {
                        if value.as_deref() != Some(target.as_str()) {
                            driver.set_value(selectors::QUANTITY_INPUT, *index, &target)?;
                            return Ok((1, value.clone()));
                        }
                    }
                }
                Ok((pending, current.and_then(|(_, v)| v)))
            },
            |(pending, value)| *pending == 0 && value.as_deref() == Some(target.as_str()),
        )?;
        Ok(())
    }

    pub fn verify_quantity_value(ctx: &mut PageContext, expected: u32) -> E2eResult<()> {
        let expected = expected.to_string();
        let waiter = ctx.timeouts().element();
        let driver = ctx.driver();
        let result = waiter.until(
            &format!("quantity input to have value '{}'", expected),
            || {
                driver
                    .query(selectors::QUANTITY_INPUT)
                    .map(|els| first_visible(&els).and_then(|e| e.value.clone()))
            },
            |value| value.as_deref() == Some(expected.as_str()),
        );
        match result {
            Ok(_) => Ok(()),
            Err(E2eError::Timeout { last_seen, .. }) => {
                Err(E2eError::mismatch("quantity", &expected, last_seen))
            }
            Err(e) => Err(e),
        }
    }

    /// Retype the special instructions. The field is looked up again before
    /// every micro-action because the page re-renders it.
    pub fn enter_special_instructions(ctx: &mut PageContext, instructions: &str) -> E2eResult<()> {
        let field = selectors::SPECIAL_INSTRUCTIONS_INPUT;
        ctx.scroll_into_view(field)?;
        ctx.wait_actionable(field)?;

        ctx.force_click(field)?;
        ctx.clear(field)?;
        ctx.type_text(field, instructions)
    }

    /// Click the add-to-cart control; the header badge becoming visible is
    /// the success signal.
    pub fn add_to_cart(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_for_document_ready()?;
        ctx.force_click(selectors::ADD_TO_CART_BUTTON)?;
        ctx.wait_visible(selectors::CART_COUNT)?;
        ctx.wait_for_document_ready()
    }
}
