use std::sync::Arc;

use async_trait::async_trait;
use ui_platform::{AccessibilityPort, NodeHandle};

use crate::errors::InjectError;
use crate::model::{InjectCtx, InjectionReport};
use crate::policy::InjectionPolicy;
use crate::runner::{execute, RuntimeDeps};

#[async_trait]
pub trait TextInjector: Send + Sync {
    /// Populates `field` with `text`. Expected failures (nothing acknowledged,
    /// stale field) come back in the report; only cancellation and empty
    /// input are errors.
    async fn inject(
        &self,
        ctx: &InjectCtx,
        field: &NodeHandle,
        text: &str,
    ) -> Result<InjectionReport, InjectError>;

    fn policy(&self) -> &InjectionPolicy;
}

pub struct TextInjectorBuilder {
    policy: InjectionPolicy,
    port: Option<Arc<dyn AccessibilityPort>>,
}

impl TextInjectorBuilder {
    pub fn new(policy: InjectionPolicy) -> Self {
        Self { policy, port: None }
    }

    pub fn with_accessibility(mut self, port: Arc<dyn AccessibilityPort>) -> Self {
        self.port = Some(port);
        self
    }

    pub fn build(self) -> Result<Arc<dyn TextInjector>, InjectError> {
        let port = self
            .port
            .ok_or(InjectError::Config("accessibility port required"))?;
        Ok(Arc::new(TextInjectorImpl {
            policy: self.policy,
            port,
        }))
    }
}

pub struct TextInjectorImpl {
    policy: InjectionPolicy,
    port: Arc<dyn AccessibilityPort>,
}

#[async_trait]
impl TextInjector for TextInjectorImpl {
    async fn inject(
        &self,
        ctx: &InjectCtx,
        field: &NodeHandle,
        text: &str,
    ) -> Result<InjectionReport, InjectError> {
        let deps = RuntimeDeps {
            port: self.port.as_ref(),
            policy: &self.policy,
        };
        execute(ctx, field, text, deps).await
    }

    fn policy(&self) -> &InjectionPolicy {
        &self.policy
    }
}
