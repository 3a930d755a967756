//! Buy/skip rule for a single row.
//!
//! The game can render a "buy 0" offer that looks identical to a real one, so
//! an offer is only worth taking when it exceeds what is already owned.

use std::cmp::Ordering;

use autobuyer_core_types::ItemSnapshot;

use crate::model::{Decision, SkipReason};

pub fn decide(snapshot: &ItemSnapshot) -> Decision {
    if !snapshot.purchasable {
        return Decision::Skip(SkipReason::NotPurchasable);
    }
    // NaN on either side has no ordering and lands here too.
    let gain = snapshot
        .offered_quantity
        .partial_cmp(&snapshot.owned_quantity);
    if gain != Some(Ordering::Greater) {
        return Decision::Skip(SkipReason::NoNetGain);
    }
    Decision::Buy
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobuyer_core_types::CategoryId;

    fn item(owned: f64, offered: f64, purchasable: bool) -> ItemSnapshot {
        ItemSnapshot::new("drone", owned, offered, purchasable, CategoryId::Meat)
    }

    #[test]
    fn unpurchasable_items_are_skipped_regardless_of_quantities() {
        for (owned, offered) in [(0.0, 10.0), (5.0, 8.0), (10.0, 10.0), (1e300, 0.0)] {
            assert_eq!(
                decide(&item(owned, offered, false)),
                Decision::Skip(SkipReason::NotPurchasable)
            );
        }
    }

    #[test]
    fn equal_quantities_have_no_net_gain() {
        let decision = decide(&item(10.0, 10.0, true));
        assert_eq!(decision, Decision::Skip(SkipReason::NoNetGain));
        if let Decision::Skip(reason) = decision {
            assert_eq!(reason.to_string(), "no net gain");
        }
    }

    #[test]
    fn buys_only_when_offer_exceeds_holdings() {
        assert_eq!(decide(&item(5.0, 8.0, true)), Decision::Buy);
        assert_eq!(decide(&item(0.0, 1.0, true)), Decision::Buy);
        assert_eq!(
            decide(&item(8.0, 5.0, true)),
            Decision::Skip(SkipReason::NoNetGain)
        );
        assert_eq!(
            decide(&item(3.0, 0.0, true)),
            Decision::Skip(SkipReason::NoNetGain)
        );
    }

    #[test]
    fn unparseable_quantities_never_buy() {
        assert_eq!(
            decide(&item(f64::NAN, 4.0, true)),
            Decision::Skip(SkipReason::NoNetGain)
        );
        assert_eq!(
            decide(&item(1.0, f64::NAN, true)),
            Decision::Skip(SkipReason::NoNetGain)
        );
    }
}
