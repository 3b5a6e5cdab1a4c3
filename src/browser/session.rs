use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::driver::BrowserDriver;
use crate::browser::element::ElementSnapshot;
use crate::error::{E2eError, E2eResult};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
        timeout_ms: u64,
    },
    CurrentUrl,
    ReadyState,
    Query {
        selector: String,
    },
    FindByText {
        selector: String,
        text: String,
    },
    Property {
        selector: String,
        index: usize,
        name: String,
    },
    Action {
        action: ActionKind,
        selector: String,
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        force: bool,
    },
    PendingRequests {
        url_fragment: String,
    },
    Screenshot {
        path: String,
        full_page: bool,
    },
    Viewport {
        width: u32,
        height: u32,
    },
    ExportState,
    ImportState {
        state: Value,
    },
    ClearState,
    PageErrors,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Clear,
    Type,
    Press,
    SetValue,
    Scroll,
}

impl BrowserRequest {
    pub fn action(action: ActionKind, selector: &str, index: usize, value: Option<&str>) -> Self {
        BrowserRequest::Action {
            action,
            selector: selector.to_string(),
            index,
            value: value.map(str::to_string),
            force: false,
        }
    }

    pub fn forced(mut self) -> Self {
        if let BrowserRequest::Action { force, .. } = &mut self {
            *force = true;
        }
        self
    }

    /// Command name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::ReadyState => "ready_state",
            BrowserRequest::Query { .. } => "query",
            BrowserRequest::FindByText { .. } => "find_by_text",
            BrowserRequest::Property { .. } => "property",
            BrowserRequest::Action { action, .. } => match action {
                ActionKind::Click => "click",
                ActionKind::Clear => "clear",
                ActionKind::Type => "type",
                ActionKind::Press => "press",
                ActionKind::SetValue => "set_value",
                ActionKind::Scroll => "scroll",
            },
            BrowserRequest::PendingRequests { .. } => "pending_requests",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Viewport { .. } => "viewport",
            BrowserRequest::ExportState => "export_state",
            BrowserRequest::ImportState { .. } => "import_state",
            BrowserRequest::ClearState => "clear_state",
            BrowserRequest::PageErrors => "page_errors",
            BrowserRequest::Quit => "quit",
        }
    }

    /// Whether the request carries user-typed text that must stay out of logs.
    fn carries_text(&self) -> bool {
        matches!(
            self,
            BrowserRequest::Action {
                action: ActionKind::Type | ActionKind::SetValue,
                ..
            } | BrowserRequest::ImportState { .. }
        )
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub elements: Option<Vec<ElementSnapshot>>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

/// How to start the browser server.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub node: String,
    pub server_script: String,
    pub headless: bool,
    pub page_load_timeout_ms: u64,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            node: "node".into(),
            server_script: "node/browser_server.js".into(),
            headless: true,
            page_load_timeout_ms: 60_000,
        }
    }
}

/// A persistent browser context backed by browser_server.js.
///
/// A long-lived Node.js process keeps one Chromium context open. Commands go
/// out as NDJSON over stdin and one response line comes back per command.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    page_load_timeout_ms: u64,
    closed: bool,
}

impl BrowserSession {
    pub fn launch(options: &LaunchOptions) -> E2eResult<Self> {
        let mut command = Command::new(&options.node);
        command.arg(&options.server_script);
        if !options.headless {
            command.arg("--headed");
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                E2eError::SessionIo(format!(
                    "failed to spawn {} (is Node.js installed?): {}",
                    options.server_script, e
                ))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            E2eError::SessionIo("failed to capture stdin of browser server".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            E2eError::SessionIo("failed to capture stdout of browser server".into())
        })?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| E2eError::SessionIo(format!("failed to read ready signal: {}", e)))?;
        let response: BrowserResponse = serde_json::from_str(line.trim())?;
        if !response.ok || response.ready != Some(true) {
            return Err(E2eError::driver(
                "launch",
                "did not receive ready signal from browser server",
            ));
        }

        debug!(script = %options.server_script, "browser server ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            page_load_timeout_ms: options.page_load_timeout_ms,
            closed: false,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> E2eResult<BrowserResponse> {
        if self.closed {
            return Err(E2eError::SessionIo("browser session already closed".into()));
        }
        let json = serde_json::to_string(request)?;
        if request.carries_text() {
            debug!(cmd = request.name(), "-> browser (payload withheld)");
        } else {
            debug!(cmd = request.name(), "-> browser {}", json);
        }

        writeln!(self.stdin, "{}", json)
            .map_err(|e| E2eError::SessionIo(format!("write to browser server: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| E2eError::SessionIo(format!("flush browser server stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| E2eError::SessionIo(format!("read from browser server: {}", e)))?;

        if line.trim().is_empty() {
            return Err(E2eError::SessionIo(
                "empty response from browser server (process may have died)".into(),
            ));
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    fn send_ok(&mut self, request: BrowserRequest) -> E2eResult<BrowserResponse> {
        let response = self.send(&request)?;
        if !response.ok {
            return Err(E2eError::driver(
                request.name(),
                response.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(response)
    }

    fn missing(command: &str, field: &str) -> E2eError {
        E2eError::driver(command, format!("no '{}' in response", field))
    }

    pub fn quit(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        // The process may already be gone; a failed quit is not worth reporting.
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            warn!("browser quit: {}", e);
        }
        self.closed = true;
        let _ = self.child.wait();
        Ok(())
    }
}

impl BrowserDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> E2eResult<()> {
        let timeout_ms = self.page_load_timeout_ms;
        self.send_ok(BrowserRequest::Navigate {
            url: url.to_string(),
            timeout_ms,
        })?;
        Ok(())
    }

    fn current_url(&mut self) -> E2eResult<String> {
        self.send_ok(BrowserRequest::CurrentUrl)?
            .url
            .ok_or_else(|| Self::missing("current_url", "url"))
    }

    fn ready_state(&mut self) -> E2eResult<String> {
        self.send_ok(BrowserRequest::ReadyState)?
            .state
            .ok_or_else(|| Self::missing("ready_state", "state"))
    }

    fn query(&mut self, selector: &str) -> E2eResult<Vec<ElementSnapshot>> {
        let response = self.send_ok(BrowserRequest::Query {
            selector: selector.to_string(),
        })?;
        Ok(response.elements.unwrap_or_default())
    }

    fn find_by_text(&mut self, selector: &str, text: &str) -> E2eResult<Vec<ElementSnapshot>> {
        let response = self.send_ok(BrowserRequest::FindByText {
            selector: selector.to_string(),
            text: text.to_string(),
        })?;
        Ok(response.elements.unwrap_or_default())
    }

    fn property(&mut self, selector: &str, index: usize, name: &str) -> E2eResult<Option<String>> {
        let response = self.send_ok(BrowserRequest::Property {
            selector: selector.to_string(),
            index,
            name: name.to_string(),
        })?;
        Ok(response.value)
    }

    fn click(&mut self, selector: &str, index: usize, force: bool) -> E2eResult<()> {
        let mut request = BrowserRequest::action(ActionKind::Click, selector, index, None);
        if force {
            request = request.forced();
        }
        self.send_ok(request)?;
        Ok(())
    }

    fn clear(&mut self, selector: &str, index: usize) -> E2eResult<()> {
        self.send_ok(BrowserRequest::action(ActionKind::Clear, selector, index, None))?;
        Ok(())
    }

    fn type_text(&mut self, selector: &str, index: usize, text: &str) -> E2eResult<()> {
        self.send_ok(BrowserRequest::action(ActionKind::Type, selector, index, Some(text)))?;
        Ok(())
    }

    fn press(&mut self, selector: &str, index: usize, key: &str) -> E2eResult<()> {
        self.send_ok(BrowserRequest::action(ActionKind::Press, selector, index, Some(key)))?;
        Ok(())
    }

    fn set_value(&mut self, selector: &str, index: usize, value: &str) -> E2eResult<()> {
        self.send_ok(BrowserRequest::action(
            ActionKind::SetValue,
            selector,
            index,
            Some(value),
        ))?;
        Ok(())
    }

    fn scroll_into_view(&mut self, selector: &str, index: usize) -> E2eResult<()> {
        self.send_ok(BrowserRequest::action(ActionKind::Scroll, selector, index, None))?;
        Ok(())
    }

    fn pending_requests(&mut self, url_fragment: &str) -> E2eResult<u32> {
        let response = self.send_ok(BrowserRequest::PendingRequests {
            url_fragment: url_fragment.to_string(),
        })?;
        Ok(response.count.unwrap_or(0))
    }

    fn screenshot(&mut self, path: &str, full_page: bool) -> E2eResult<()> {
        self.send_ok(BrowserRequest::Screenshot {
            path: path.to_string(),
            full_page,
        })?;
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> E2eResult<()> {
        self.send_ok(BrowserRequest::Viewport { width, height })?;
        Ok(())
    }

    fn export_auth_state(&mut self) -> E2eResult<Value> {
        self.send_ok(BrowserRequest::ExportState)?
            .data
            .ok_or_else(|| Self::missing("export_state", "data"))
    }

    fn import_auth_state(&mut self, state: &Value) -> E2eResult<()> {
        self.send_ok(BrowserRequest::ImportState {
            state: state.clone(),
        })?;
        Ok(())
    }

    fn clear_auth_state(&mut self) -> E2eResult<()> {
        self.send_ok(BrowserRequest::ClearState)?;
        Ok(())
    }

    fn take_page_errors(&mut self) -> E2eResult<Vec<String>> {
        Ok(self.send_ok(BrowserRequest::PageErrors)?.errors.unwrap_or_default())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
