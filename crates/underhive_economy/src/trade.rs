//! # Trade Transfer Planning
//!
//! Turns a stored offer (comma-joined asset names plus two credit amounts)
//! into the concrete moves the store applies when the offer is accepted.
//!
//! ```text
//! from_gang ── offered assets, offered credits ──▶ to_gang
//! from_gang ◀── requested assets, requested credits ── to_gang
//! ```

use underhive_shared::types::GangId;

use crate::error::{EconomyError, EconomyResult};

/// Credits leaving one gang for another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditMovement {
    /// Paying gang.
    pub from: GangId,
    /// Receiving gang.
    pub to: GangId,
    /// Credits moved, always positive.
    pub amount: i64,
}

/// Everything that changes hands when an offer is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPlan {
    /// Gang that made the offer.
    pub from_gang: GangId,
    /// Gang the offer was made to.
    pub to_gang: GangId,
    /// Asset names moving from `from_gang` to `to_gang`.
    pub offered_assets: Vec<String>,
    /// Credits moving from `from_gang` to `to_gang`.
    pub offered_credits: i64,
    /// Asset names moving from `to_gang` to `from_gang`.
    pub requested_assets: Vec<String>,
    /// Credits moving from `to_gang` to `from_gang`.
    pub requested_credits: i64,
}

impl TransferPlan {
    /// Builds a plan from the stored offer fields.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::NegativeAmount`] for negative credits and
    /// [`EconomyError::InvalidTrade`] when a gang trades with itself.
    pub fn new(
        from_gang: GangId,
        to_gang: GangId,
        offered_assets: &str,
        offered_credits: i64,
        requested_assets: &str,
        requested_credits: i64,
    ) -> EconomyResult<Self> {
        if from_gang == to_gang {
            return Err(EconomyError::InvalidTrade(
                "a gang cannot trade with itself".to_string(),
            ));
        }
        for amount in [offered_credits, requested_credits] {
            if amount < 0 {
                return Err(EconomyError::NegativeAmount(amount));
            }
        }

        Ok(Self {
            from_gang,
            to_gang,
            offered_assets: split_asset_list(offered_assets),
            offered_credits,
            requested_assets: split_asset_list(requested_assets),
            requested_credits,
        })
    }

    /// Non-zero credit payments, offered side first.
    #[must_use]
    pub fn credit_movements(&self) -> Vec<CreditMovement> {
        let mut moves = Vec::with_capacity(2);
        if self.offered_credits > 0 {
            moves.push(CreditMovement {
                from: self.from_gang,
                to: self.to_gang,
                amount: self.offered_credits,
            });
        }
        if self.requested_credits > 0 {
            moves.push(CreditMovement {
                from: self.to_gang,
                to: self.from_gang,
                amount: self.requested_credits,
            });
        }
        moves
    }

    /// Whether accepting would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offered_assets.is_empty()
            && self.requested_assets.is_empty()
            && self.offered_credits == 0
            && self.requested_credits == 0
    }
}

/// Splits a comma-joined asset list into trimmed, non-empty names.
#[must_use]
pub fn split_asset_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes a user-supplied asset list for storage (`"a ,b,, c"` -> `"a, b, c"`).
#[must_use]
pub fn normalize_asset_list(list: &str) -> String {
    split_asset_list(list).join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_asset_list() {
        assert_eq!(
            split_asset_list(" Stub Gun , Old Ruins,, "),
            vec!["Stub Gun".to_string(), "Old Ruins".to_string()]
        );
        assert!(split_asset_list("").is_empty());
        assert_eq!(normalize_asset_list("a ,b,, c"), "a, b, c");
    }

    #[test]
    fn test_credit_movements_both_ways() {
        let plan = TransferPlan::new(1, 2, "Lasgun", 30, "", 10).unwrap();
        assert_eq!(
            plan.credit_movements(),
            vec![
                CreditMovement { from: 1, to: 2, amount: 30 },
                CreditMovement { from: 2, to: 1, amount: 10 },
            ]
        );
    }

    #[test]
    fn test_zero_credits_skipped() {
        let plan = TransferPlan::new(1, 2, "Lasgun", 0, "Settlement", 0).unwrap();
        assert!(plan.credit_movements().is_empty());
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_rejects_bad_offers() {
        assert_eq!(
            TransferPlan::new(3, 3, "", 0, "", 0),
            Err(EconomyError::InvalidTrade(
                "a gang cannot trade with itself".to_string()
            ))
        );
        assert_eq!(
            TransferPlan::new(1, 2, "", -5, "", 0),
            Err(EconomyError::NegativeAmount(-5))
        );
    }

    #[test]
    fn test_empty_plan() {
        assert!(TransferPlan::new(1, 2, " , ", 0, "", 0).unwrap().is_empty());
    }
}
