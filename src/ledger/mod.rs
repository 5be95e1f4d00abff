//! Quantity Ledger
//!
//! The remaining-quantity pool for one order-evaluation pass. Every promotion in the
//! pass draws redeemed units from the same ledger, so a unit claimed by one
//! promotion is no longer available to the next.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    items::ItemCode,
    orders::{OrderError, OrderSnapshot, PurchasedQuantities},
};

/// Units taken from the ledger by a single extraction, in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffectedEntries {
    entries: SmallVec<[(ItemCode, Decimal); 2]>,
}

impl AffectedEntries {
    /// Iterate over `(code, quantity)` pairs in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemCode, Decimal)> {
        self.entries.iter().map(|(code, qty)| (code, *qty))
    }

    /// Total quantity taken.
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, qty)| *qty).sum()
    }

    /// Whether nothing was taken.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, code: ItemCode, quantity: Decimal) {
        self.entries.push((code, quantity));
    }
}

/// Remaining purchased quantity per code for the current pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityLedger {
    remaining: FxHashMap<ItemCode, Decimal>,
}

impl QuantityLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from the non-gift lines of an order.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if the order's quantities cannot be aggregated.
    pub fn from_order(order: &OrderSnapshot) -> Result<Self, OrderError> {
        Ok(Self::from(&order.aggregate()?))
    }

    /// Remaining quantity for `code`, zero when absent.
    pub fn remaining(&self, code: &str) -> Decimal {
        self.remaining.get(code).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of remaining quantities over `codes`, saturating at [`Decimal::MAX`].
    pub fn remaining_over<'c>(&self, codes: impl IntoIterator<Item = &'c ItemCode>) -> Decimal {
        codes.into_iter().fold(Decimal::ZERO, |acc, code| {
            acc.saturating_add(self.remaining(code.as_str()))
        })
    }

    /// Take `quantity` units from `codes`, drawing from each code in the given order
    /// until the quantity is met.
    ///
    /// The extraction is all-or-nothing: if the codes together cannot supply the full
    /// quantity, `None` is returned and the ledger is left untouched.
    pub fn extract<'c>(
        &mut self,
        codes: impl IntoIterator<Item = &'c ItemCode> + Clone,
        quantity: Decimal,
    ) -> Option<AffectedEntries> {
        if quantity <= Decimal::ZERO || self.remaining_over(codes.clone()) < quantity {
            return None;
        }

        let mut affected = AffectedEntries::default();
        let mut needed = quantity;

        for code in codes {
            if needed.is_zero() {
                break;
            }

            let Some(available) = self.remaining.get_mut(code.as_str()) else {
                continue;
            };

            if *available <= Decimal::ZERO {
                continue;
            }

            let take = needed.min(*available);

            *available -= take;
            needed -= take;

            affected.push(code.clone(), take);
        }

        Some(affected)
    }

    /// Whether every code has been fully consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining.values().all(|qty| *qty <= Decimal::ZERO)
    }
}

impl From<&PurchasedQuantities> for QuantityLedger {
    fn from(purchased: &PurchasedQuantities) -> Self {
        Self {
            remaining: purchased
                .iter()
                .map(|(code, qty)| (code.clone(), qty))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{catalog::TargetSet, orders::LineItem};

    use super::*;

    fn ledger(lines: &[(&str, i64)]) -> Result<QuantityLedger, OrderError> {
        let items = lines
            .iter()
            .map(|(code, qty)| LineItem::new(*code, Decimal::from(*qty)))
            .collect::<Result<Vec<_>, _>>()?;

        QuantityLedger::from_order(&OrderSnapshot::with_line_items(items))
    }

    #[test]
    fn extract_draws_from_first_code_with_stock() -> TestResult {
        let mut ledger = ledger(&[("A", 0), ("B", 2), ("C", 5)])?;
        let targets = TargetSet::from_strs(&["A", "B", "C"]);

        let first = ledger.extract(&targets, Decimal::ONE);

        let drawn: Vec<(String, Decimal)> = first
            .iter()
            .flat_map(AffectedEntries::iter)
            .map(|(code, qty)| (code.to_string(), qty))
            .collect();

        assert_eq!(drawn, vec![("B".to_string(), Decimal::ONE)]);
        assert_eq!(ledger.remaining("B"), Decimal::ONE);
        assert_eq!(ledger.remaining("C"), Decimal::from(5));

        Ok(())
    }

    #[test]
    fn extract_spans_codes_for_fractional_remainders() -> TestResult {
        let mut ledger = QuantityLedger::from_order(&OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::new(5, 1))?,
            LineItem::new("B", Decimal::from(2))?,
        ]))?;
        let targets = TargetSet::from_strs(&["A", "B"]);

        let affected = ledger.extract(&targets, Decimal::ONE);

        assert_eq!(affected.map(|a| a.total()), Some(Decimal::ONE));
        assert_eq!(ledger.remaining("A"), Decimal::ZERO);
        assert_eq!(ledger.remaining("B"), Decimal::new(15, 1));

        Ok(())
    }

    #[test]
    fn failed_extract_leaves_ledger_untouched() -> TestResult {
        let mut ledger = ledger(&[("A", 1)])?;
        let before = ledger.clone();
        let targets = TargetSet::from_strs(&["A"]);

        assert!(ledger.extract(&targets, Decimal::from(2)).is_none());
        assert_eq!(ledger, before);

        Ok(())
    }

    #[test]
    fn extract_ignores_codes_outside_the_order() -> TestResult {
        let mut ledger = ledger(&[("A", 1)])?;
        let targets = TargetSet::from_strs(&["Z"]);

        assert!(ledger.extract(&targets, Decimal::ONE).is_none());
        assert_eq!(ledger.remaining("Z"), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn ledger_reports_exhaustion() -> TestResult {
        let mut ledger = ledger(&[("A", 2)])?;
        let targets = TargetSet::from_strs(&["A"]);

        assert!(!ledger.is_exhausted());
        assert!(ledger.extract(&targets, Decimal::from(2)).is_some());
        assert!(ledger.is_exhausted());
        assert_eq!(ledger.remaining_over(&targets), Decimal::ZERO);

        Ok(())
    }
}
