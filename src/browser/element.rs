use serde::{Deserialize, Serialize};

/// Point-in-time view of one element matched by a selector.
///
/// Snapshots are never used to act on an element later: every action is
/// addressed by `(selector, index)` and the driver resolves it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Position among all matches of the selector, in document order
    pub index: usize,

    pub visible: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Text content (innerText for visible elements)
    #[serde(default)]
    pub text: String,

    /// Current `value` for form controls
    #[serde(default)]
    pub value: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ElementSnapshot {
    pub fn new(index: usize, visible: bool) -> Self {
        Self {
            index,
            visible,
            enabled: true,
            text: String::new(),
            value: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The first match that is currently visible.
///
/// Hidden duplicates (mobile/desktop variants of the same control) are common,
/// so document order alone is not enough.
pub fn first_visible(elements: &[ElementSnapshot]) -> Option<&ElementSnapshot> {
    elements.iter().find(|e| e.visible)
}
