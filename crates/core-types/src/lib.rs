use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the engine crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuyerError {
    #[error("{message}")]
    Message { message: String },
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

impl BuyerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Correlates every log line emitted during one buying cycle.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CycleId(pub String);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item list the game exposes behind its own navigation tab.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CategoryId {
    Meat,
    Territory,
}

impl CategoryId {
    pub const ALL: [CategoryId; 2] = [CategoryId::Meat, CategoryId::Territory];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryId::Meat => "meat",
            CategoryId::Territory => "territory",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryId {
    type Err = BuyerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        CategoryId::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BuyerError::UnknownCategory(needle.to_string()))
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of one purchasable row.
///
/// `owned_quantity` and `offered_quantity` come from different regions of the
/// page and may disagree with each other between reads.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSnapshot {
    pub identity: ItemId,
    pub owned_quantity: f64,
    pub offered_quantity: f64,
    pub purchasable: bool,
    pub category: CategoryId,
}

impl ItemSnapshot {
    pub fn new(
        identity: impl Into<String>,
        owned_quantity: f64,
        offered_quantity: f64,
        purchasable: bool,
        category: CategoryId,
    ) -> Self {
        Self {
            identity: ItemId(identity.into()),
            owned_quantity,
            offered_quantity,
            purchasable,
            category,
        }
    }
}

/// Handle to an action handler found by walking up from a control.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandlerRef {
    /// Number of parent hops from the control to the owning element.
    pub depth: u8,
    /// Expression the owning element evaluates when the control fires.
    pub expression: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Meat".parse::<CategoryId>().unwrap(), CategoryId::Meat);
        assert_eq!(
            " territory ".parse::<CategoryId>().unwrap(),
            CategoryId::Territory
        );
        assert_eq!(
            "larvae".parse::<CategoryId>(),
            Err(BuyerError::UnknownCategory("larvae".into()))
        );
    }

    #[test]
    fn cycle_ids_are_unique() {
        assert_ne!(CycleId::new(), CycleId::new());
    }
}
