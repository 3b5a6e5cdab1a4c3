use tracing::warn;

use crate::auth::credentials::Credentials;
use crate::error::{E2eError, E2eResult};
use crate::pages::context::PageContext;

pub mod selectors {
    pub const ACCOUNT_LINK: &str = "#Account";
    pub const USERNAME_INPUT: &str = r#"[data-test="username"]"#;
    pub const PASSWORD_INPUT: &str = r#"[data-test="password"]"#;
    pub const LOGIN_BUTTON: &str = r#"[data-test="log-in"]"#;
}

/// Where the popup login flow currently stands.
///
/// `Authenticated` is only reached when the credential fields have gone away;
/// a failed confirmation drops back to `Anonymous` so the flow can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Anonymous,
    PopupOpen,
    CredentialsEntered,
    Submitted,
    Authenticated,
}

/// Drives the login popup one transition at a time.
#[derive(Debug)]
pub struct LoginFlow {
    state: LoginState,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginFlow {
    pub fn new() -> Self {
        Self { state: LoginState::Anonymous }
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    fn expect(&self, expected: LoginState, action: &str) -> E2eResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(E2eError::LoginFailed(format!(
                "cannot {} from state {:?} (expected {:?})",
                action, self.state, expected
            )))
        }
    }

    pub fn open_popup(&mut self, ctx: &mut PageContext) -> E2eResult<()> {
        self.expect(LoginState::Anonymous, "open the login popup")?;
        LoginPage::open_login_popup(ctx)?;
        self.state = LoginState::PopupOpen;
        Ok(())
    }

    pub fn enter_credentials(&mut self, ctx: &mut PageContext, credentials: &Credentials) -> E2eResult<()> {
        self.expect(LoginState::PopupOpen, "enter credentials")?;
        LoginPage::enter_username(ctx, &credentials.username)?;
        LoginPage::enter_password(ctx, credentials.password())?;
        self.state = LoginState::CredentialsEntered;
        Ok(())
    }

    pub fn submit(&mut self, ctx: &mut PageContext) -> E2eResult<()> {
        self.expect(LoginState::CredentialsEntered, "submit")?;
        LoginPage::click_login_button(ctx)?;
        self.state = LoginState::Submitted;
        Ok(())
    }

    pub fn confirm(&mut self, ctx: &mut PageContext) -> E2eResult<LoginState> {
        self.expect(LoginState::Submitted, "confirm login")?;
        match LoginPage::verify_successful_login(ctx) {
            Ok(()) => {
                self.state = LoginState::Authenticated;
                Ok(self.state)
            }
            Err(e) => {
                self.state = LoginState::Anonymous;
                Err(e)
            }
        }
    }
}

/// Header login popup.
pub struct LoginPage;

impl LoginPage {
    pub fn visit_login_page(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.visit("/")?;
        Self::wait_for_load(ctx)
    }

    /// Document ready plus the account affordance.
    pub fn wait_for_load(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.wait_for_document_ready()?;
        ctx.wait_visible(selectors::ACCOUNT_LINK)?;
        Ok(())
    }

    pub fn open_login_popup(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.click(selectors::ACCOUNT_LINK)?;
        ctx.wait_visible(selectors::USERNAME_INPUT)?;
        Ok(())
    }

    pub fn enter_username(ctx: &mut PageContext, username: &str) -> E2eResult<()> {
        ctx.clear(selectors::USERNAME_INPUT)?;
        ctx.type_text(selectors::USERNAME_INPUT, username)
    }

    pub fn enter_password(ctx: &mut PageContext, password: &str) -> E2eResult<()> {
        ctx.clear(selectors::PASSWORD_INPUT)?;
        ctx.type_secret(selectors::PASSWORD_INPUT, password)
    }

    pub fn click_login_button(ctx: &mut PageContext) -> E2eResult<()> {
        ctx.click(selectors::LOGIN_BUTTON)
    }

    /// Full popup flow: open, fill, submit, confirm.
    pub fn login(ctx: &mut PageContext, credentials: &Credentials) -> E2eResult<LoginState> {
        let mut flow = LoginFlow::new();
        flow.open_popup(ctx)?;
        flow.enter_credentials(ctx, credentials)?;
        flow.submit(ctx)?;
        flow.confirm(ctx)
    }

    /// Success is the credential field disappearing. The site may not
    /// navigate after login, so the URL proves nothing.
    pub fn verify_successful_login(ctx: &mut PageContext) -> E2eResult<()> {
        let waiter = ctx.timeouts().element();
        match ctx.wait_absent_within(selectors::USERNAME_INPUT, waiter) {
            Ok(()) => Ok(()),
            Err(E2eError::Timeout { waited_ms, .. }) => {
                warn!("credential fields still present {} ms after submit", waited_ms);
                Err(E2eError::LoginFailed(format!(
                    "'{}' still present {} ms after submitting credentials",
                    selectors::USERNAME_INPUT, waited_ms
                )))
            }
            Err(e) => Err(e),
        }
    }
}
