//! Ordered ways of getting a purchase through to the page.
//!
//! Nothing on the page confirms that a purchase happened, so each strategy
//! only reports what it managed to deliver.

use async_trait::async_trait;
use autobuyer_core_types::ItemSnapshot;
use tokio::time::sleep;

use crate::model::{PointerEvent, StrategyKind, StrategyVerdict};
use crate::policy::DispatchPolicyView;
use crate::ports::InteractionPort;
use crate::tempo;

#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Last-resort strategies are skipped once an earlier one reached the
    /// action handler directly.
    fn last_resort(&self) -> bool {
        false
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        policy: &DispatchPolicyView,
    ) -> StrategyVerdict;
}

pub fn build_strategies(kinds: &[StrategyKind]) -> Vec<Box<dyn DispatchStrategy>> {
    kinds
        .iter()
        .map(|kind| -> Box<dyn DispatchStrategy> {
            match kind {
                StrategyKind::PointerSequence => Box::new(PointerSequence),
                StrategyKind::EventTrigger => Box::new(EventTrigger),
                StrategyKind::HandlerInvoke => Box::new(HandlerInvoke),
                StrategyKind::NativeSubmit => Box::new(NativeSubmit),
                StrategyKind::LinkFollow => Box::new(LinkFollow),
            }
        })
        .collect()
}

/// Hover, focus, press, release, click, paced like a person would.
pub struct PointerSequence;

#[async_trait]
impl DispatchStrategy for PointerSequence {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PointerSequence
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        policy: &DispatchPolicyView,
    ) -> StrategyVerdict {
        for (step, event) in PointerEvent::SEQUENCE.into_iter().enumerate() {
            match port.pointer_event(item, event).await {
                Ok(true) => {}
                Ok(false) if step == 0 => return StrategyVerdict::Unavailable,
                Ok(false) => {
                    return StrategyVerdict::Failed(format!(
                        "control vanished before {}",
                        event.dom_type()
                    ))
                }
                Err(err) => return StrategyVerdict::Failed(err.to_string()),
            }
            sleep(tempo::step_delay(&policy.pointer)).await;
        }
        StrategyVerdict::Attempted
    }
}

pub struct EventTrigger;

#[async_trait]
impl DispatchStrategy for EventTrigger {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EventTrigger
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        _policy: &DispatchPolicyView,
    ) -> StrategyVerdict {
        match port.trigger_event(item).await {
            Ok(true) => StrategyVerdict::Attempted,
            Ok(false) => StrategyVerdict::Unavailable,
            Err(err) => StrategyVerdict::Failed(err.to_string()),
        }
    }
}

pub struct HandlerInvoke;

#[async_trait]
impl DispatchStrategy for HandlerInvoke {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HandlerInvoke
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        policy: &DispatchPolicyView,
    ) -> StrategyVerdict {
        let handler = match port
            .ascend_for_handler(item, policy.max_ascent_depth)
            .await
        {
            Ok(Some(handler)) => handler,
            Ok(None) => return StrategyVerdict::Unavailable,
            Err(err) => return StrategyVerdict::Failed(err.to_string()),
        };
        match port.invoke_handler(item, &handler).await {
            Ok(true) => StrategyVerdict::Handled,
            Ok(false) => StrategyVerdict::Failed(format!(
                "handler '{}' gone at depth {}",
                handler.expression, handler.depth
            )),
            Err(err) => StrategyVerdict::Failed(err.to_string()),
        }
    }
}

pub struct NativeSubmit;

#[async_trait]
impl DispatchStrategy for NativeSubmit {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NativeSubmit
    }

    fn last_resort(&self) -> bool {
        true
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        _policy: &DispatchPolicyView,
    ) -> StrategyVerdict {
        match port.submit_native(item).await {
            Ok(true) => StrategyVerdict::Attempted,
            Ok(false) => StrategyVerdict::Unavailable,
            Err(err) => StrategyVerdict::Failed(err.to_string()),
        }
    }
}

pub struct LinkFollow;

#[async_trait]
impl DispatchStrategy for LinkFollow {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinkFollow
    }

    fn last_resort(&self) -> bool {
        true
    }

    async fn attempt(
        &self,
        port: &dyn InteractionPort,
        item: &ItemSnapshot,
        _policy: &DispatchPolicyView,
    ) -> StrategyVerdict {
        match port.follow_link(item).await {
            Ok(true) => StrategyVerdict::Attempted,
            Ok(false) => StrategyVerdict::Unavailable,
            Err(err) => StrategyVerdict::Failed(err.to_string()),
        }
    }
}
