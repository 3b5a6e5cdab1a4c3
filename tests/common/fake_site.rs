//! Scripted in-memory storefront implementing `BrowserDriver`.
//!
//! It renders the markup the page objects target (hidden mobile duplicates
//! included) and reproduces the timing quirks that matter: a document that
//! is not ready right away, a cart badge that appears late, a price
//! recalculation that is in flight after a quantity change and may reset the
//! field once it settles.

#![allow(dead_code)]

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use reqwest::Url;
use serde_json::{json, Value};

use storefront_e2e::browser::driver::BrowserDriver;
use storefront_e2e::browser::element::ElementSnapshot;
use storefront_e2e::error::{E2eError, E2eResult};
use storefront_e2e::pages::{cart, home, login, product};

pub const BASE_URL: &str = "https://shop.test";
pub const USERNAME: &str = "buyer@example.com";
pub const PASSWORD: &str = "s3cret-Pa55";
pub const SKU: &str = "122804:218:P";
pub const SHIP_DATE_SELECTOR: &str = ".ship-date";

#[derive(Debug, Clone, PartialEq)]
pub struct FakeProduct {
    pub sku: String,
    pub title: String,
    pub price: String,
    pub status: String,
}

impl FakeProduct {
    pub fn new(sku: &str, title: &str, price: &str, status: &str) -> Self {
        Self {
            sku: sku.into(),
            title: title.into(),
            price: price.into(),
            status: status.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub sku: String,
    pub quantity: u32,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Blank,
    Home,
    Product,
    NoResults,
    Cart,
}

pub struct SiteState {
    pub url: String,
    pub screen: Screen,
    pub catalog: BTreeMap<String, FakeProduct>,
    pub current_product: Option<String>,

    /// `ready_state` answers "interactive" this many times after a navigation.
    pub ready_delay: u32,
    ready_countdown: u32,

    pub logged_in: bool,
    pub popup_open: bool,
    pub username_field: String,
    pub password_field: String,
    pub login_submissions: u32,
    pub valid_tokens: BTreeSet<String>,
    next_token: u32,

    pub search_field: String,
    pub quantity_field: String,
    pub instructions_field: String,

    /// Pricing calls in flight after a quantity write.
    pub pricing_delay: u32,
    pending_pricing: u32,
    /// Reset the quantity to "1" the first time pricing settles.
    pub revert_quantity_once: bool,

    pub cart: Vec<CartLine>,
    /// Every line ever added, surviving cart removal.
    pub added: Vec<CartLine>,
    /// Badge stays hidden for this many queries after an add.
    pub badge_delay: u32,
    badge_countdown: u32,
    pub cart_popout_open: bool,
    pub remove_confirm_open: bool,
    pub remove_all_clicks: u32,
    /// The cart page draws neither its remove-all control nor the empty-cart
    /// message for this many queries of either after arriving.
    pub cart_render_delay: u32,
    cart_render_countdown: u32,
    /// Confirmed removal lands after this many empty-message queries.
    pub removal_delay: u32,
    removal_countdown: u32,
    /// `current_url` fails instead of answering.
    pub fail_current_url: bool,

    pub image_width: u32,
    pub page_errors: Vec<String>,
    /// Errors raised by every navigation.
    pub errors_on_navigate: Vec<String>,
    pub screenshots: Vec<String>,
    pub viewport: Option<(u32, u32)>,
    /// Every payload passed to `type_text`, in order.
    pub typed: Vec<String>,
    pub navigations: Vec<String>,
}

impl Default for SiteState {
    fn default() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert(
            SKU.to_string(),
            FakeProduct::new(SKU, "14K White Gold Bracelet", "$1,212.50", "In Stock"),
        );
        Self {
            url: "about:blank".into(),
            screen: Screen::Blank,
            catalog,
            current_product: None,
            ready_delay: 2,
            ready_countdown: 0,
            logged_in: false,
            popup_open: false,
            username_field: String::new(),
            password_field: String::new(),
            login_submissions: 0,
            valid_tokens: BTreeSet::new(),
            next_token: 0,
            search_field: String::new(),
            quantity_field: "1".into(),
            instructions_field: String::new(),
            pricing_delay: 2,
            pending_pricing: 0,
            revert_quantity_once: false,
            cart: Vec::new(),
            added: Vec::new(),
            badge_delay: 2,
            badge_countdown: 0,
            cart_popout_open: false,
            remove_confirm_open: false,
            remove_all_clicks: 0,
            cart_render_delay: 0,
            cart_render_countdown: 0,
            removal_delay: 0,
            removal_countdown: 0,
            fail_current_url: false,
            image_width: 640,
            page_errors: Vec::new(),
            errors_on_navigate: Vec::new(),
            screenshots: Vec::new(),
            viewport: None,
            typed: Vec::new(),
            navigations: Vec::new(),
        }
    }
}

fn visible(index: usize) -> ElementSnapshot {
    ElementSnapshot::new(index, true)
}

fn hidden(index: usize) -> ElementSnapshot {
    ElementSnapshot::new(index, false)
}

impl SiteState {
    fn product(&self) -> Option<&FakeProduct> {
        self.current_product.as_ref().and_then(|sku| self.catalog.get(sku))
    }

    fn on_page(&self) -> bool {
        self.screen != Screen::Blank
    }

    fn badge_visible(&self) -> bool {
        !self.cart.is_empty() && self.badge_countdown == 0
    }

    fn body_text(&self) -> String {
        match self.screen {
            Screen::Blank => String::new(),
            Screen::Home => "Welcome to the storefront".into(),
            Screen::NoResults => "No results found".into(),
            Screen::Product => self
                .product()
                .map(|p| format!("{} {} {} {} Ready to Ship", p.sku, p.title, p.price, p.status))
                .unwrap_or_default(),
            Screen::Cart => {
                if self.cart.is_empty() {
                    cart::selectors::EMPTY_CART_TEXT.to_string()
                } else {
                    self.cart
                        .iter()
                        .map(|l| format!("{} Qty {} Special Instructions: {}", l.sku, l.quantity, l.instructions))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
        }
    }

    /// Elements currently matching `selector`. No side effects.
    fn render(&self, selector: &str) -> Vec<ElementSnapshot> {
        let on_product = self.screen == Screen::Product && self.product().is_some();
        let on_cart = self.screen == Screen::Cart;

        if selector == "body" {
            if self.on_page() {
                return vec![visible(0).with_text(self.body_text())];
            }
            return Vec::new();
        }
        if selector == home::selectors::SEARCH_INPUT {
            if self.on_page() {
                return vec![
                    hidden(0).with_value(""),
                    visible(1).with_value(self.search_field.clone()),
                ];
            }
            return Vec::new();
        }
        if selector == login::selectors::ACCOUNT_LINK {
            return if self.on_page() { vec![visible(0).with_text("Account")] } else { Vec::new() };
        }
        if selector == login::selectors::USERNAME_INPUT {
            return if self.popup_open { vec![visible(0).with_value(self.username_field.clone())] } else { Vec::new() };
        }
        if selector == login::selectors::PASSWORD_INPUT {
            return if self.popup_open { vec![visible(0).with_value(self.password_field.clone())] } else { Vec::new() };
        }
        if selector == login::selectors::LOGIN_BUTTON {
            return if self.popup_open { vec![visible(0).with_text("Log In")] } else { Vec::new() };
        }
        if selector == cart::selectors::CART_ICON_LABEL {
            return if self.on_page() { vec![visible(0).with_text("Cart")] } else { Vec::new() };
        }
        if selector == cart::selectors::GO_TO_CART_LINK {
            return if self.cart_popout_open {
                vec![hidden(0).with_text("Go to Cart"), visible(1).with_text("Go to Cart")]
            } else {
                Vec::new()
            };
        }
        if selector == cart::selectors::CART_COUNT {
            return if self.on_page() && self.badge_visible() {
                vec![visible(0).with_text(self.cart.len().to_string())]
            } else {
                Vec::new()
            };
        }

        if on_product {
            let Some(p) = self.product() else { return Vec::new() };
            if selector == product::selectors::ITEM_NUMBER {
                return vec![visible(0).with_text(p.sku.clone())];
            }
            if selector == product::selectors::PRODUCT_TITLE {
                return vec![visible(0).with_text(format!("{}\n", p.title))];
            }
            if selector == product::selectors::PRODUCT_PRICE {
                return vec![visible(0).with_text(p.price.clone())];
            }
            if selector == product::selectors::PRODUCT_STATUS {
                return vec![visible(0).with_text(format!(" {} ", p.status))];
            }
            if selector == product::selectors::QUANTITY_INPUT {
                return vec![visible(0).with_value(self.quantity_field.clone())];
            }
            if selector == product::selectors::ADD_TO_CART_BUTTON {
                return vec![visible(0).with_text("Add to Cart")];
            }
            if selector == product::selectors::SPECIAL_INSTRUCTIONS_INPUT {
                return vec![
                    hidden(0).with_value(""),
                    visible(1).with_value(self.instructions_field.clone()),
                ];
            }
            if selector == product::selectors::PRODUCT_IMAGE {
                return vec![visible(0)];
            }
            if selector == SHIP_DATE_SELECTOR {
                return vec![visible(0).with_text("Ready to Ship: Today")];
            }
        }

        if on_cart {
            if selector == cart::selectors::ITEM_LINK {
                let mut links = vec![visible(0).with_text("Home")];
                for (i, line) in self.cart.iter().enumerate() {
                    links.push(visible(i + 1).with_text(line.sku.clone()));
                }
                return links;
            }
            if selector == cart::selectors::ITEM_DESCRIPTION {
                return self
                    .cart
                    .iter()
                    .enumerate()
                    .map(|(i, l)| {
                        let title = self.catalog.get(&l.sku).map(|p| p.title.clone()).unwrap_or_default();
                        visible(i).with_text(title)
                    })
                    .collect();
            }
            if selector == cart::selectors::REMOVE_ALL_BUTTON {
                return if self.cart.is_empty() { Vec::new() } else { vec![visible(0).with_text("Remove All")] };
            }
            if selector == cart::selectors::REMOVE_ALL_CONFIRM_BUTTON {
                return if self.remove_confirm_open { vec![visible(0).with_text("Yes, remove")] } else { Vec::new() };
            }
            if selector == cart::selectors::EMPTY_CART_MESSAGE {
                return if self.cart.is_empty() {
                    vec![visible(0).with_text(cart::selectors::EMPTY_CART_TEXT)]
                } else {
                    Vec::new()
                };
            }
        }

        if selector == product::selectors::ANY {
            let mut all = Vec::new();
            for s in [
                product::selectors::ITEM_NUMBER,
                product::selectors::PRODUCT_TITLE,
                product::selectors::PRODUCT_PRICE,
                SHIP_DATE_SELECTOR,
                cart::selectors::ITEM_LINK,
                cart::selectors::EMPTY_CART_MESSAGE,
            ] {
                all.extend(self.render(s));
            }
            return all
                .into_iter()
                .enumerate()
                .map(|(i, mut e)| {
                    e.index = i;
                    e
                })
                .collect();
        }

        Vec::new()
    }

    fn target(&self, command: &str, selector: &str, index: usize, force: bool) -> E2eResult<()> {
        let elements = self.render(selector);
        match elements.iter().find(|e| e.index == index) {
            None => Err(E2eError::driver(command, format!("no element {} for '{}'", index, selector))),
            Some(e) if !e.visible && !force => Err(E2eError::driver(
                command,
                format!("element {} for '{}' is not visible", index, selector),
            )),
            Some(_) => Ok(()),
        }
    }

    fn field(&mut self, selector: &str) -> Option<&mut String> {
        if selector == home::selectors::SEARCH_INPUT {
            Some(&mut self.search_field)
        } else if selector == login::selectors::USERNAME_INPUT {
            Some(&mut self.username_field)
        } else if selector == login::selectors::PASSWORD_INPUT {
            Some(&mut self.password_field)
        } else if selector == product::selectors::QUANTITY_INPUT {
            Some(&mut self.quantity_field)
        } else if selector == product::selectors::SPECIAL_INSTRUCTIONS_INPUT {
            Some(&mut self.instructions_field)
        } else {
            None
        }
    }

    fn go(&mut self, url: &str) -> E2eResult<()> {
        let parsed = Url::parse(url).map_err(|e| E2eError::driver("navigate", e.to_string()))?;
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        self.ready_countdown = self.ready_delay;
        self.popup_open = false;
        self.cart_popout_open = false;
        self.remove_confirm_open = false;
        self.pending_pricing = 0;
        self.page_errors.extend(self.errors_on_navigate.iter().cloned());

        match parsed.path() {
            "/" | "" => self.screen = Screen::Home,
            "/cart" => {
                self.screen = Screen::Cart;
                self.cart_render_countdown = self.cart_render_delay;
            }
            "/search/results" => {
                let query = parsed
                    .query_pairs()
                    .find(|(k, _)| k == "query")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                if self.catalog.contains_key(&query) {
                    self.current_product = Some(query);
                    self.screen = Screen::Product;
                    self.quantity_field = "1".into();
                    self.instructions_field.clear();
                } else {
                    self.current_product = None;
                    self.screen = Screen::NoResults;
                }
            }
            _ => self.screen = Screen::Blank,
        }
        Ok(())
    }

    fn search_url(&self, term: &str) -> String {
        Url::parse_with_params(&format!("{}/search/results", BASE_URL), &[("query", term)])
            .map(String::from)
            .unwrap_or_default()
    }
}

/// Cheap handle; clones share the same site.
#[derive(Clone, Default)]
pub struct FakeSite {
    state: Rc<RefCell<SiteState>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, SiteState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, SiteState> {
        self.state.borrow_mut()
    }

    /// Put the browser on the given product page, ready.
    pub fn open_product(&self, sku: &str) {
        let mut s = self.state.borrow_mut();
        let url = s.search_url(sku);
        let _ = s.go(&url);
        s.ready_countdown = 0;
    }

    /// Sign in out of band, skipping the popup.
    pub fn force_login(&self) {
        let mut s = self.state.borrow_mut();
        s.logged_in = true;
    }

    pub fn revoke_all_tokens(&self) {
        self.state.borrow_mut().valid_tokens.clear();
    }
}

impl BrowserDriver for FakeSite {
    fn navigate(&mut self, url: &str) -> E2eResult<()> {
        self.state.borrow_mut().go(url)
    }

    fn current_url(&mut self) -> E2eResult<String> {
        let s = self.state.borrow();
        if s.fail_current_url {
            return Err(E2eError::driver("current_url", "browser went away"));
        }
        Ok(s.url.clone())
    }

    fn ready_state(&mut self) -> E2eResult<String> {
        let mut s = self.state.borrow_mut();
        if s.ready_countdown > 0 {
            s.ready_countdown -= 1;
            Ok("interactive".into())
        } else {
            Ok("complete".into())
        }
    }

    fn query(&mut self, selector: &str) -> E2eResult<Vec<ElementSnapshot>> {
        let mut s = self.state.borrow_mut();
        if selector == cart::selectors::CART_COUNT && s.badge_countdown > 0 {
            s.badge_countdown -= 1;
            return Ok(Vec::new());
        }
        let cart_marker = selector == cart::selectors::REMOVE_ALL_BUTTON
            || selector == cart::selectors::EMPTY_CART_MESSAGE;
        if cart_marker && s.screen == Screen::Cart && s.cart_render_countdown > 0 {
            s.cart_render_countdown -= 1;
            return Ok(Vec::new());
        }
        if selector == cart::selectors::EMPTY_CART_MESSAGE && s.removal_countdown > 0 {
            s.removal_countdown -= 1;
            if s.removal_countdown == 0 {
                s.cart.clear();
            }
        }
        Ok(s.render(selector))
    }

    fn find_by_text(&mut self, selector: &str, text: &str) -> E2eResult<Vec<ElementSnapshot>> {
        let s = self.state.borrow();
        Ok(s.render(selector).into_iter().filter(|e| e.text.contains(text)).collect())
    }

    fn property(&mut self, selector: &str, index: usize, name: &str) -> E2eResult<Option<String>> {
        let s = self.state.borrow();
        s.target("property", selector, index, true)?;
        if selector == product::selectors::PRODUCT_IMAGE && name == "naturalWidth" {
            return Ok(Some(s.image_width.to_string()));
        }
        Ok(None)
    }

    fn click(&mut self, selector: &str, index: usize, force: bool) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.target("click", selector, index, force)?;

        if selector == login::selectors::ACCOUNT_LINK {
            if !s.logged_in {
                s.popup_open = true;
                s.username_field.clear();
                s.password_field.clear();
            }
        } else if selector == login::selectors::LOGIN_BUTTON {
            s.login_submissions += 1;
            if s.username_field == USERNAME && s.password_field == PASSWORD {
                s.logged_in = true;
                s.popup_open = false;
            }
        } else if selector == product::selectors::ADD_TO_CART_BUTTON {
            let Some(sku) = s.current_product.clone() else {
                return Err(E2eError::driver("click", "no product on page"));
            };
            let quantity = s.quantity_field.trim().parse().unwrap_or(1);
            let instructions = s.instructions_field.clone();
            let line = CartLine { sku, quantity, instructions };
            s.added.push(line.clone());
            s.cart.push(line);
            s.badge_countdown = s.badge_delay;
        } else if selector == cart::selectors::CART_ICON_LABEL {
            s.cart_popout_open = true;
        } else if selector == cart::selectors::GO_TO_CART_LINK {
            let url = format!("{}/cart", BASE_URL);
            s.go(&url)?;
        } else if selector == cart::selectors::REMOVE_ALL_BUTTON {
            s.remove_all_clicks += 1;
            s.remove_confirm_open = true;
        } else if selector == cart::selectors::REMOVE_ALL_CONFIRM_BUTTON {
            if s.removal_delay == 0 {
                s.cart.clear();
            } else {
                s.removal_countdown = s.removal_delay;
            }
            s.remove_confirm_open = false;
        }
        Ok(())
    }

    fn clear(&mut self, selector: &str, index: usize) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.target("clear", selector, index, false)?;
        if let Some(field) = s.field(selector) {
            field.clear();
        }
        Ok(())
    }

    fn type_text(&mut self, selector: &str, index: usize, text: &str) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.target("type", selector, index, false)?;
        s.typed.push(text.to_string());
        match s.field(selector) {
            Some(field) => {
                field.push_str(text);
                Ok(())
            }
            None => Err(E2eError::driver("type", format!("'{}' is not editable", selector))),
        }
    }

    fn press(&mut self, selector: &str, index: usize, key: &str) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.target("press", selector, index, false)?;
        if selector == home::selectors::SEARCH_INPUT && key == "Enter" {
            let url = s.search_url(&s.search_field.clone());
            s.go(&url)?;
        }
        Ok(())
    }

    fn set_value(&mut self, selector: &str, index: usize, value: &str) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.target("set_value", selector, index, false)?;
        if selector == product::selectors::QUANTITY_INPUT {
            s.pending_pricing = s.pricing_delay;
        }
        match s.field(selector) {
            Some(field) => {
                *field = value.to_string();
                Ok(())
            }
            None => Err(E2eError::driver("set_value", format!("'{}' has no value", selector))),
        }
    }

    fn scroll_into_view(&mut self, selector: &str, index: usize) -> E2eResult<()> {
        self.state.borrow().target("scroll", selector, index, true)
    }

    fn pending_requests(&mut self, url_fragment: &str) -> E2eResult<u32> {
        let mut s = self.state.borrow_mut();
        if !url_fragment.contains(product::selectors::PRICING_REQUEST) {
            return Ok(0);
        }
        let pending = s.pending_pricing;
        if pending > 0 {
            s.pending_pricing -= 1;
            if s.pending_pricing == 0 && s.revert_quantity_once {
                s.revert_quantity_once = false;
                s.quantity_field = "1".into();
            }
        }
        Ok(pending)
    }

    fn screenshot(&mut self, path: &str, _full_page: bool) -> E2eResult<()> {
        self.state.borrow_mut().screenshots.push(path.to_string());
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> E2eResult<()> {
        self.state.borrow_mut().viewport = Some((width, height));
        Ok(())
    }

    fn export_auth_state(&mut self) -> E2eResult<Value> {
        let mut s = self.state.borrow_mut();
        if !s.logged_in {
            return Ok(json!({ "cookies": [] }));
        }
        s.next_token += 1;
        let token = format!("tok-{}", s.next_token);
        s.valid_tokens.insert(token.clone());
        Ok(json!({ "cookies": [{ "name": "session", "value": token }] }))
    }

    fn import_auth_state(&mut self, state: &Value) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        let token = state["cookies"][0]["value"].as_str().unwrap_or_default().to_string();
        s.logged_in = s.valid_tokens.contains(&token);
        Ok(())
    }

    fn clear_auth_state(&mut self) -> E2eResult<()> {
        let mut s = self.state.borrow_mut();
        s.logged_in = false;
        s.popup_open = false;
        Ok(())
    }

    fn take_page_errors(&mut self) -> E2eResult<Vec<String>> {
        Ok(std::mem::take(&mut self.state.borrow_mut().page_errors))
    }
}
