//! The game page seen through the engine's ports.

pub mod bridge;
pub mod quantity;
pub mod scripts;

pub use bridge::PageBridge;
pub use quantity::parse_quantity;
