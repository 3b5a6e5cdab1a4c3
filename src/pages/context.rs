use crate::browser::driver::BrowserDriver;
use crate::browser::element::{first_visible, ElementSnapshot};
use crate::error::E2eResult;
use crate::trace::event::{EventKind, StepEvent, REDACTED};
use crate::trace::logger::StepTrail;
use crate::wait::{Timeouts, Waiter};

/// Everything a page operation needs: the automation collaborator, the
/// per-operation bounds, the base URL and the step trail.
///
/// No element reference is ever kept here. Every helper queries the selector
/// again right before it acts, because the page may re-render between two
/// actions.
pub struct PageContext {
    driver: Box<dyn BrowserDriver>,
    timeouts: Timeouts,
    base_url: String,
    trail: StepTrail,
    scenario: String,
}

impl PageContext {
    pub fn new(driver: Box<dyn BrowserDriver>, base_url: &str, timeouts: Timeouts) -> Self {
        Self {
            driver,
            timeouts,
            base_url: base_url.trim_end_matches('/').to_string(),
            trail: StepTrail::disabled(),
            scenario: String::new(),
        }
    }

    pub fn with_trail(mut self, trail: StepTrail) -> Self {
        self.trail = trail;
        self
    }

    pub fn set_scenario(&mut self, name: &str) {
        self.scenario = name.to_string();
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn trail(&self) -> &StepTrail {
        &self.trail
    }

    pub fn driver(&mut self) -> &mut dyn BrowserDriver {
        self.driver.as_mut()
    }

    pub fn record(&self, kind: EventKind, detail: impl Into<String>) {
        self.trail.record(StepEvent::now(&self.scenario, kind, detail));
    }

    /// Absolute URL for a site path; absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub fn visit(&mut self, path: &str) -> E2eResult<()> {
        let url = self.url_for(path);
        self.record(EventKind::Action, format!("visit {}", url));
        self.driver.navigate(&url)
    }

    pub fn wait_for_document_ready(&mut self) -> E2eResult<()> {
        let waiter = self.timeouts.page_load();
        let driver = self.driver.as_mut();
        waiter.until("document.readyState == \"complete\"", || driver.ready_state(), |s| {
            s == "complete"
        })?;
        Ok(())
    }

    pub fn wait_url_contains(&mut self, fragment: &str) -> E2eResult<String> {
        let waiter = self.timeouts.page_load();
        let driver = self.driver.as_mut();
        waiter.until(&format!("URL to contain '{}'", fragment), || driver.current_url(), |url| {
            url.contains(fragment)
        })
    }

    /// One fresh query, no waiting.
    pub fn first_visible(&mut self, selector: &str) -> E2eResult<Option<ElementSnapshot>> {
        let elements = self.driver.query(selector)?;
        Ok(first_visible(&elements).cloned())
    }

    /// Whether anything matches, visible or not. One fresh query.
    pub fn is_present(&mut self, selector: &str) -> E2eResult<bool> {
        Ok(!self.driver.query(selector)?.is_empty())
    }

    pub fn wait_visible(&mut self, selector: &str) -> E2eResult<ElementSnapshot> {
        let waiter = self.timeouts.element();
        self.wait_visible_within(selector, waiter)
    }

    pub fn wait_visible_within(&mut self, selector: &str, waiter: Waiter) -> E2eResult<ElementSnapshot> {
        let driver = self.driver.as_mut();
        let found = waiter.poll(&format!("'{}' to be visible", selector), || driver.query(selector), |els| {
            first_visible(els).cloned()
        })?;
        self.record(EventKind::Wait, format!("'{}' visible (match {})", selector, found.index));
        Ok(found)
    }

    /// First visible match that is also enabled.
    pub fn wait_actionable(&mut self, selector: &str) -> E2eResult<ElementSnapshot> {
        let waiter = self.timeouts.element();
        let driver = self.driver.as_mut();
        waiter.poll(
            &format!("'{}' to be visible and enabled", selector),
            || driver.query(selector),
            |els| first_visible(els).filter(|e| e.enabled).cloned(),
        )
    }

    /// Wait until nothing matches `selector`.
    pub fn wait_absent_within(&mut self, selector: &str, waiter: Waiter) -> E2eResult<()> {
        let driver = self.driver.as_mut();
        waiter.until(&format!("'{}' to not exist", selector), || {
            driver.query(selector).map(|els| els.len())
        }, |count| *count == 0)?;
        Ok(())
    }

    /// Text of the first visible match, once it is visible.
    pub fn text_of(&mut self, selector: &str) -> E2eResult<String> {
        Ok(self.wait_visible(selector)?.text)
    }

    /// Poll the first visible match until `predicate` holds on its text.
    pub fn wait_text(&mut self, selector: &str, condition: &str, predicate: impl Fn(&str) -> bool) -> E2eResult<String> {
        let waiter = self.timeouts.element();
        let driver = self.driver.as_mut();
        waiter.poll(
            condition,
            || driver.query(selector).map(|els| first_visible(&els).map(|e| e.text.clone())),
            |text| text.as_deref().filter(|t| predicate(*t)).map(str::to_string),
        )
    }

    /// Wait until some visible element under `selector` contains `text`.
    pub fn wait_contains(&mut self, selector: &str, text: &str) -> E2eResult<ElementSnapshot> {
        let waiter = self.timeouts.element();
        let driver = self.driver.as_mut();
        waiter.poll(
            &format!("'{}' containing '{}' to be visible", selector, text),
            || driver.find_by_text(selector, text),
            |els| first_visible(els).cloned(),
        )
    }

    pub fn body_text(&mut self) -> E2eResult<String> {
        Ok(self
            .driver
            .query("body")?
            .into_iter()
            .next()
            .map(|b| b.text)
            .unwrap_or_default())
    }

    pub fn click(&mut self, selector: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("click '{}'", selector));
        self.driver.click(selector, target.index, false)
    }

    /// Click without actionability checks, still on the first visible match.
    pub fn force_click(&mut self, selector: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("force click '{}'", selector));
        self.driver.click(selector, target.index, true)
    }

    pub fn clear(&mut self, selector: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("clear '{}'", selector));
        self.driver.clear(selector, target.index)
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("type '{}' into '{}'", text, selector));
        self.driver.type_text(selector, target.index, text)
    }

    /// Like `type_text`, but the text never reaches the trail or logs.
    pub fn type_secret(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("type {} into '{}'", REDACTED, selector));
        self.driver.type_text(selector, target.index, text)
    }

    pub fn press(&mut self, selector: &str, key: &str) -> E2eResult<()> {
        let target = self.wait_visible(selector)?;
        self.record(EventKind::Action, format!("press {} in '{}'", key, selector));
        self.driver.press(selector, target.index, key)
    }

    pub fn scroll_into_view(&mut self, selector: &str) -> E2eResult<()> {
        let waiter = self.timeouts.element();
        let driver = self.driver.as_mut();
        // Off-screen matches can report as hidden until scrolled to, so only
        // existence is required here.
        let index = waiter.poll(&format!("'{}' to exist", selector), || driver.query(selector), |els| {
            first_visible(els).or_else(|| els.first()).map(|e| e.index)
        })?;
        self.driver.scroll_into_view(selector, index)
    }

    pub fn screenshot(&mut self, path: &str) -> E2eResult<()> {
        self.record(EventKind::Note, format!("screenshot {}", path));
        self.driver.screenshot(path, true)
    }
}
