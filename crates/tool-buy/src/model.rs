use std::fmt;
use std::time::{Duration, Instant};

use autobuyer_core_types::{CategoryId, CycleId};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorClass;

/// Execution context delivered by the category runner.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub cycle: CycleId,
    pub category: CategoryId,
    /// Pause after opening the buy dropdown so the page can render it.
    pub settle: Duration,
}

impl ExecCtx {
    pub fn new(cycle: CycleId, category: CategoryId, settle: Duration) -> Self {
        Self {
            cycle,
            category,
            settle,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SkipReason {
    NotPurchasable,
    NoNetGain,
    Disabled,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NotPurchasable => "not purchasable",
            SkipReason::NoNetGain => "no net gain",
            SkipReason::Disabled => "dispatcher disabled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Buy,
    Skip(SkipReason),
}

/// Result of processing one item. Always a value, never an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PurchaseOutcome {
    /// At least one strategy fired. The page gives no confirmation.
    Bought,
    Skipped(SkipReason),
    NotFound,
    DispatchFailed,
}

impl PurchaseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOutcome::Bought => "bought",
            PurchaseOutcome::Skipped(_) => "skipped",
            PurchaseOutcome::NotFound => "not_found",
            PurchaseOutcome::DispatchFailed => "dispatch_failed",
        }
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        match self {
            PurchaseOutcome::Bought => None,
            PurchaseOutcome::Skipped(_) => Some(ErrorClass::DecisionSkip),
            PurchaseOutcome::NotFound => Some(ErrorClass::AdapterUnavailable),
            PurchaseOutcome::DispatchFailed => Some(ErrorClass::DispatchAmbiguous),
        }
    }
}

/// Synthetic pointer/focus events replayed by the pointer strategy, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointerEvent {
    Hover,
    Focus,
    Press,
    Release,
    Click,
}

impl PointerEvent {
    pub const SEQUENCE: [PointerEvent; 5] = [
        PointerEvent::Hover,
        PointerEvent::Focus,
        PointerEvent::Press,
        PointerEvent::Release,
        PointerEvent::Click,
    ];

    /// DOM event type dispatched for this step.
    pub fn dom_type(self) -> &'static str {
        match self {
            PointerEvent::Hover => "mouseover",
            PointerEvent::Focus => "focus",
            PointerEvent::Press => "mousedown",
            PointerEvent::Release => "mouseup",
            PointerEvent::Click => "click",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    PointerSequence,
    EventTrigger,
    HandlerInvoke,
    NativeSubmit,
    LinkFollow,
}

impl StrategyKind {
    pub const DEFAULT_ORDER: [StrategyKind; 5] = [
        StrategyKind::PointerSequence,
        StrategyKind::EventTrigger,
        StrategyKind::HandlerInvoke,
        StrategyKind::NativeSubmit,
        StrategyKind::LinkFollow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::PointerSequence => "pointer_sequence",
            StrategyKind::EventTrigger => "event_trigger",
            StrategyKind::HandlerInvoke => "handler_invoke",
            StrategyKind::NativeSubmit => "native_submit",
            StrategyKind::LinkFollow => "link_follow",
        }
    }
}

/// What a strategy can honestly say about its attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StrategyVerdict {
    /// The page lacks what this strategy needs.
    Unavailable,
    Failed(String),
    /// Events were delivered; effect unknown.
    Attempted,
    /// The owning action handler was invoked directly.
    Handled,
    /// Not run because an earlier strategy reached the handler.
    Skipped,
}

impl StrategyVerdict {
    pub fn fired(&self) -> bool {
        matches!(self, StrategyVerdict::Attempted | StrategyVerdict::Handled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyVerdict::Unavailable => "unavailable",
            StrategyVerdict::Failed(_) => "failed",
            StrategyVerdict::Attempted => "attempted",
            StrategyVerdict::Handled => "handled",
            StrategyVerdict::Skipped => "skipped",
        }
    }
}

/// Full account of one dispatch, kept for logging.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub outcome: PurchaseOutcome,
    pub verdicts: Vec<(StrategyKind, StrategyVerdict)>,
    pub timed_out: bool,
    pub started_at: Instant,
    pub latency_ms: u128,
}

impl DispatchReport {
    pub fn new(started_at: Instant) -> Self {
        Self {
            outcome: PurchaseOutcome::DispatchFailed,
            verdicts: Vec::new(),
            timed_out: false,
            started_at,
            latency_ms: 0,
        }
    }

    pub fn finish(mut self, outcome: PurchaseOutcome, finished_at: Instant) -> Self {
        self.outcome = outcome;
        self.latency_ms = finished_at
            .saturating_duration_since(self.started_at)
            .as_millis();
        self
    }

    pub fn any_fired(&self) -> bool {
        self.verdicts.iter().any(|(_, verdict)| verdict.fired())
    }

    pub fn verdict_of(&self, kind: StrategyKind) -> Option<&StrategyVerdict> {
        self.verdicts
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, verdict)| verdict)
    }
}
