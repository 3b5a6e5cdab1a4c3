use crate::error::E2eResult;
use crate::pages::context::PageContext;

pub mod selectors {
    /// Header search box. Rendered twice (mobile and desktop header).
    pub const SEARCH_INPUT: &str =
        r#"form.header-search-autocomplete-wrapper input[placeholder="Search..."]"#;
}

/// Storefront home page and its header search.
pub struct HomePage;

impl HomePage {
    pub fn visit_homepage(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.visit("/")?;
        Self::wait_for_load(ctx)
    }

    /// Document ready plus a visible search box.
    pub fn wait_for_load(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_for_document_ready()?;
        ctx.wait_visible(selectors::SEARCH_INPUT)?;
        Ok(())
    }

    /// Type `term` into the first visible search box and submit.
    ///
    /// The input is looked up again for each micro-action.
    pub fn search_product(ctx: &mut PageContext, term: &str) -> E2eResult<()> {
        ctx.wait_visible(selectors::SEARCH_INPUT)?;
        ctx.scroll_into_view(selectors::SEARCH_INPUT)?;
        ctx.click(selectors::SEARCH_INPUT)?;
        ctx.clear(selectors::SEARCH_INPUT)?;
        ctx.type_text(selectors::SEARCH_INPUT, term)?;
        ctx.press(selectors::SEARCH_INPUT, "Enter")
    }
}
