use std::time::Duration;

use crate::actions::ShopActions;
use crate::api::ProductApi;
use crate::auth::credentials::Credentials;
use crate::error::{E2eError, E2eResult};
use crate::fixtures::FixtureStore;
use crate::pages::context::PageContext;

/// Where the product API lives and how long a call may take.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

/// Read-only collaborators shared by every scenario of a run.
pub struct SuiteResources {
    pub actions: ShopActions,
    pub fixtures: FixtureStore,
    /// Resolved credentials, or the names of the missing variables.
    pub credentials: Result<Credentials, String>,
    pub api: ApiSettings,
    /// Non-interactive (CI) run.
    pub ci: bool,
}

impl SuiteResources {
    /// Split a credential lookup into usable credentials or what is missing.
    pub fn credentials_from(lookup: E2eResult<Credentials>) -> Result<Credentials, String> {
        lookup.map_err(|e| match e {
            E2eError::MissingCredentials { missing } => missing,
            other => other.to_string(),
        })
    }
}

/// What a scenario body sees while it runs.
pub struct ScenarioEnv<'a> {
    pub page: &'a mut PageContext,
    pub actions: &'a ShopActions,
    pub fixtures: &'a FixtureStore,
    pub api: &'a ApiSettings,
    pub ci: bool,
    credentials: &'a Result<Credentials, String>,
    steps_run: usize,
}

impl<'a> ScenarioEnv<'a> {
    pub fn new(page: &'a mut PageContext, resources: &'a SuiteResources) -> Self {
        Self {
            page,
            actions: &resources.actions,
            fixtures: &resources.fixtures,
            api: &resources.api,
            ci: resources.ci,
            credentials: &resources.credentials,
            steps_run: 0,
        }
    }

    /// Announce a named step.
    pub fn step(&mut self, description: &str) {
        self.steps_run += 1;
        self.actions.log_step(self.page, description);
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    pub fn credentials(&self) -> E2eResult<Credentials> {
        self.credentials
            .clone()
            .map_err(|missing| E2eError::MissingCredentials { missing })
    }

    pub fn product_api(&self, credentials: Credentials) -> E2eResult<ProductApi> {
        ProductApi::new(&self.api.base_url, credentials, self.api.request_timeout)
    }
}
