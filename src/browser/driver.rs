use serde_json::Value;

use crate::browser::element::ElementSnapshot;
use crate::error::E2eResult;

/// The browser automation collaborator.
///
/// Implementations hold no element handles across calls. Queries return fresh
/// snapshots; actions name the element by selector and match index and the
/// implementation resolves it at the moment of the action.
pub trait BrowserDriver {
    /// Load a URL and return once the navigation committed.
    fn navigate(&mut self, url: &str) -> E2eResult<()>;

    fn current_url(&mut self) -> E2eResult<String>;

    /// `document.readyState` of the current page.
    fn ready_state(&mut self) -> E2eResult<String>;

    /// All elements matching a CSS selector, in document order.
    fn query(&mut self, selector: &str) -> E2eResult<Vec<ElementSnapshot>>;

    /// Elements matching `selector` whose text contains `text`.
    fn find_by_text(&mut self, selector: &str, text: &str) -> E2eResult<Vec<ElementSnapshot>>;

    /// A DOM property or attribute of the `index`-th match.
    fn property(&mut self, selector: &str, index: usize, name: &str) -> E2eResult<Option<String>>;

    /// Click. `force` skips actionability checks (overlays, animations).
    fn click(&mut self, selector: &str, index: usize, force: bool) -> E2eResult<()>;

    fn clear(&mut self, selector: &str, index: usize) -> E2eResult<()>;

    /// Type text key by key, as a user would.
    fn type_text(&mut self, selector: &str, index: usize, text: &str) -> E2eResult<()>;

    /// Press a named key ("Enter", "Tab") with the element focused.
    fn press(&mut self, selector: &str, index: usize, key: &str) -> E2eResult<()>;

    /// Write `value` through the native value setter and dispatch `input` and
    /// `change`, so the page's own change detection fires.
    fn set_value(&mut self, selector: &str, index: usize, value: &str) -> E2eResult<()>;

    fn scroll_into_view(&mut self, selector: &str, index: usize) -> E2eResult<()>;

    /// Number of in-flight requests whose URL contains `url_fragment`.
    fn pending_requests(&mut self, url_fragment: &str) -> E2eResult<u32>;

    fn screenshot(&mut self, path: &str, full_page: bool) -> E2eResult<()>;

    fn set_viewport(&mut self, width: u32, height: u32) -> E2eResult<()>;

    /// Opaque authentication state (cookies + storage) of the context.
    fn export_auth_state(&mut self) -> E2eResult<Value>;

    fn import_auth_state(&mut self, state: &Value) -> E2eResult<()>;

    /// Drop cookies and storage so the next scenario starts anonymous.
    fn clear_auth_state(&mut self) -> E2eResult<()>;

    /// Uncaught page errors observed since the last call.
    fn take_page_errors(&mut self) -> E2eResult<Vec<String>>;
}
