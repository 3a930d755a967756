use std::sync::Arc;

use async_trait::async_trait;
use autobuyer_core_types::{BuyerError, ItemSnapshot};

use crate::model::{DispatchReport, ExecCtx, PurchaseOutcome};
use crate::policy::DispatchPolicyView;
use crate::ports::InteractionPort;
use crate::runner::{execute, RuntimeDeps};
use crate::strategy::{build_strategies, DispatchStrategy};

#[async_trait]
pub trait BuyTool: Send + Sync {
    /// Runs every configured strategy against one row and reports each verdict.
    async fn dispatch(&self, ctx: &ExecCtx, item: &ItemSnapshot) -> DispatchReport;

    async fn attempt_purchase(&self, ctx: &ExecCtx, item: &ItemSnapshot) -> PurchaseOutcome {
        self.dispatch(ctx, item).await.outcome
    }
}

pub struct BuyToolBuilder {
    policy: DispatchPolicyView,
    port: Option<Arc<dyn InteractionPort>>,
}

impl BuyToolBuilder {
    pub fn new(policy: DispatchPolicyView) -> Self {
        Self { policy, port: None }
    }

    pub fn with_port(mut self, port: Arc<dyn InteractionPort>) -> Self {
        self.port = Some(port);
        self
    }

    pub fn build(self) -> Result<Arc<dyn BuyTool>, BuyerError> {
        let port = self
            .port
            .ok_or_else(|| BuyerError::new("interaction port is required"))?;
        let strategies = build_strategies(&self.policy.strategies);
        Ok(Arc::new(BuyToolImpl {
            policy: self.policy,
            port,
            strategies,
        }))
    }
}

pub struct BuyToolImpl {
    policy: DispatchPolicyView,
    port: Arc<dyn InteractionPort>,
    strategies: Vec<Box<dyn DispatchStrategy>>,
}

#[async_trait]
impl BuyTool for BuyToolImpl {
    async fn dispatch(&self, ctx: &ExecCtx, item: &ItemSnapshot) -> DispatchReport {
        let deps = RuntimeDeps {
            port: self.port.as_ref(),
            strategies: &self.strategies,
            policy: &self.policy,
        };
        execute(ctx, item, deps).await
    }
}
