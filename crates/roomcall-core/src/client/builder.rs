//! Builder for [`SessionController`]

use std::sync::Arc;

use super::{SessionController, TokenExpiryHook};
use crate::capability::{CapabilityProbe, StaticProbe};
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::sdk::RtcEngine;
use crate::ui::{NullUi, UiSurface};

/// Builder for creating a session controller with custom collaborators
///
/// Only the SDK engine is required. Without an explicit probe the
/// secure-context answer is derived from the configured page origin (or
/// assumed secure when none is set); without a UI all reports are dropped.
pub struct SessionControllerBuilder {
    engine: Arc<dyn RtcEngine>,
    config: SessionConfig,
    probe: Option<Arc<dyn CapabilityProbe>>,
    ui: Option<Arc<dyn UiSurface>>,
    token_hook: Option<Arc<dyn TokenExpiryHook>>,
}

impl SessionControllerBuilder {
    pub fn new(engine: Arc<dyn RtcEngine>) -> Self {
        Self {
            engine,
            config: SessionConfig::default(),
            probe: None,
            ui: None,
            token_hook: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn ui(mut self, ui: Arc<dyn UiSurface>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn token_hook(mut self, hook: Arc<dyn TokenExpiryHook>) -> Self {
        self.token_hook = Some(hook);
        self
    }

    /// Validate the configuration and build the controller
    pub fn build(self) -> SessionResult<SessionController> {
        self.config.validate()?;

        let probe: Arc<dyn CapabilityProbe> = match self.probe {
            Some(probe) => probe,
            None => match &self.config.page_origin {
                Some(origin) => Arc::new(StaticProbe::for_origin(origin)),
                None => Arc::new(StaticProbe::permissive()),
            },
        };
        let ui = self
            .ui
            .unwrap_or_else(|| Arc::new(NullUi) as Arc<dyn UiSurface>);

        Ok(SessionController::from_parts(
            self.config,
            self.engine,
            probe,
            ui,
            self.token_hook,
        ))
    }
}
