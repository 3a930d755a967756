pub mod api;
pub mod decision;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod strategy;

mod runner;
mod tempo;

pub use api::{BuyTool, BuyToolBuilder};
pub use decision::decide;
pub use errors::{DispatchError, ErrorClass};
pub use model::{
    Decision, DispatchReport, ExecCtx, PointerEvent, PurchaseOutcome, SkipReason, StrategyKind,
    StrategyVerdict,
};
pub use policy::{DispatchPolicyView, PointerTempo};
pub use ports::InteractionPort;
