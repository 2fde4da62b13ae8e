//! Stock ledger entries and the arithmetic that applies them.
//!
//! Everything here is pure: storage backends call [`MovementType::next_stock`]
//! while holding the item's row lock, so the same rules apply to every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetdesk_core::{AssetId, DomainError, DomainResult, InventoryItemId, MovementId};

/// Kind of stock change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Adds `qty` to the current stock.
    In,
    /// Subtracts `qty` from the current stock.
    Out,
    /// Sets the stock to exactly `qty`.
    Adjust,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjust => "ADJUST",
        }
    }

    /// Parse a wire value (`IN`, `OUT`, `ADJUST`, any case).
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            "ADJUST" => Ok(MovementType::Adjust),
            _ => Err(DomainError::invalid_input("type must be one of: IN, OUT, ADJUST")),
        }
    }

    /// Compute the stock level after applying `qty` to `current`.
    ///
    /// Fails with `InvalidState` when the result would be negative.
    pub fn next_stock(&self, current: i64, qty: i64) -> DomainResult<i64> {
        let next = match self {
            MovementType::In => current.checked_add(qty),
            MovementType::Out => current.checked_sub(qty),
            MovementType::Adjust => Some(qty),
        }
        .ok_or_else(|| DomainError::invalid_input("quantity out of range"))?;

        if next < 0 {
            return Err(DomainError::invalid_state("stock would be negative"));
        }
        Ok(next)
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement quantities are strictly positive, for every movement type.
///
/// ADJUST's quantity is the new absolute level, so ADJUST to zero is rejected
/// here as well.
pub fn validate_quantity(qty: i64) -> DomainResult<i64> {
    if qty <= 0 {
        return Err(DomainError::invalid_input("qty must be a positive integer"));
    }
    Ok(qty)
}

/// A validated stock movement request (not yet applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMove {
    pub movement_type: MovementType,
    pub qty: i64,
    pub reference: Option<String>,
    pub target_asset_id: Option<AssetId>,
}

impl StockMove {
    /// Validate raw request values. No storage is touched.
    pub fn parse(
        movement_type: &str,
        qty: i64,
        reference: Option<String>,
        target_asset_id: Option<AssetId>,
    ) -> DomainResult<Self> {
        let movement_type = MovementType::parse(movement_type)?;
        let qty = validate_quantity(qty)?;
        let reference = reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(Self {
            movement_type,
            qty,
            reference,
            target_asset_id,
        })
    }
}

/// Immutable ledger entry. Created only by the ledger writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub inventory_item_id: InventoryItemId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub qty: i64,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub created_by: String,
    pub target_asset_id: Option<AssetId>,
    pub created_at: DateTime<Utc>,
}

/// Fold a movement history (in creation order) onto an initial stock level.
///
/// Fails at the first movement that would take the stock negative.
pub fn replay<'a>(
    initial: i64,
    history: impl IntoIterator<Item = &'a (MovementType, i64)>,
) -> DomainResult<i64> {
    history
        .into_iter()
        .try_fold(initial, |stock, (kind, qty)| kind.next_stock(stock, *qty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_types_only() {
        assert_eq!(MovementType::parse("in").unwrap(), MovementType::In);
        assert_eq!(MovementType::parse(" ADJUST ").unwrap(), MovementType::Adjust);
        assert!(matches!(MovementType::parse("TRANSFER"), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn out_beyond_stock_is_invalid_state() {
        let err = MovementType::Out.next_stock(10, 11).unwrap_err();
        assert_eq!(err, DomainError::invalid_state("stock would be negative"));
        assert_eq!(MovementType::Out.next_stock(10, 10).unwrap(), 0);
    }

    #[test]
    fn adjust_sets_absolute_value() {
        assert_eq!(MovementType::Adjust.next_stock(100, 5).unwrap(), 5);
        assert_eq!(MovementType::Adjust.next_stock(0, 5).unwrap(), 5);
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected_for_every_type() {
        for kind in ["IN", "OUT", "ADJUST"] {
            assert!(StockMove::parse(kind, 0, None, None).is_err());
            assert!(StockMove::parse(kind, -3, None, None).is_err());
        }
    }

    #[test]
    fn overflow_is_invalid_input() {
        let err = MovementType::In.next_stock(i64::MAX, 1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn blank_reference_is_dropped() {
        let mv = StockMove::parse("OUT", 1, Some("   ".to_string()), None).unwrap();
        assert_eq!(mv.reference, None);
    }

    #[test]
    fn movement_uses_wire_field_names() {
        let mv = Movement {
            id: MovementId::from_i64(7),
            inventory_item_id: InventoryItemId::new(),
            movement_type: MovementType::Out,
            qty: 2,
            reference: Some("TICKET-9".to_string()),
            created_by: "admin".to_string(),
            target_asset_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["type"], "OUT");
        assert_eq!(json["ref"], "TICKET-9");
        assert_eq!(json["createdBy"], "admin");
        assert!(json["targetAssetId"].is_null());
    }

    #[test]
    fn replay_resets_base_on_adjust() {
        let history = [
            (MovementType::In, 10),
            (MovementType::Out, 3),
            (MovementType::Adjust, 5),
            (MovementType::In, 2),
        ];
        assert_eq!(replay(0, &history).unwrap(), 7);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_movement() -> impl Strategy<Value = (MovementType, i64)> {
            (
                prop_oneof![
                    Just(MovementType::In),
                    Just(MovementType::Out),
                    Just(MovementType::Adjust),
                ],
                1i64..1_000,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: applying accepted movements one by one never observes
            /// negative stock, and the result equals the closed-form net effect.
            #[test]
            fn accepted_history_matches_net_effect(
                initial in 0i64..1_000,
                attempts in proptest::collection::vec(arb_movement(), 0..60)
            ) {
                let mut stock = initial;
                let mut accepted = Vec::new();
                for (kind, qty) in attempts {
                    match kind.next_stock(stock, qty) {
                        Ok(next) => {
                            prop_assert!(next >= 0);
                            stock = next;
                            accepted.push((kind, qty));
                        }
                        Err(e) => {
                            prop_assert_eq!(kind, MovementType::Out);
                            prop_assert!(matches!(e, DomainError::InvalidState(_)));
                        }
                    }
                }

                // Closed form: last ADJUST resets the base, then IN/OUT deltas after it.
                let (base, tail) = match accepted.iter().rposition(|(k, _)| *k == MovementType::Adjust) {
                    Some(idx) => (accepted[idx].1, &accepted[idx + 1..]),
                    None => (initial, &accepted[..]),
                };
                let net: i64 = tail
                    .iter()
                    .map(|(k, q)| if *k == MovementType::In { *q } else { -*q })
                    .sum();

                prop_assert_eq!(stock, base + net);
                prop_assert_eq!(replay(initial, &accepted).unwrap(), stock);
            }

            /// Property: ADJUST is idempotent.
            #[test]
            fn adjust_is_idempotent(current in 0i64..10_000, qty in 1i64..10_000) {
                let once = MovementType::Adjust.next_stock(current, qty).unwrap();
                let twice = MovementType::Adjust.next_stock(once, qty).unwrap();
                prop_assert_eq!(once, qty);
                prop_assert_eq!(twice, qty);
            }
        }
    }
}
