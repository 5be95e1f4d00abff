//! Target Sets
//!
//! An insertion-ordered, de-duplicated set of item codes. Membership checks ignore
//! order, but iteration order is the declaration order and is used as the
//! tie-break when redemptions draw units from the ledger.

use std::ops::BitOr;

use smallvec::SmallVec;

use crate::{items::ItemCode, orders::PurchasedQuantities};

/// Ordered set of item codes a condition or reward is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    codes: SmallVec<[ItemCode; 8]>,
}

impl TargetSet {
    /// Create an empty target set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a target set from string slices, keeping the first occurrence of each code.
    pub fn from_strs(codes: &[&str]) -> Self {
        codes.iter().copied().map(ItemCode::from).collect()
    }

    /// Add a code, ignoring it when already present. Returns whether it was added.
    pub fn insert(&mut self, code: ItemCode) -> bool {
        if self.contains(code.as_str()) {
            return false;
        }

        self.codes.push(code);

        true
    }

    /// Check if the set contains a code.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c.as_str() == code)
    }

    /// Iterate over codes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemCode> {
        self.codes.iter()
    }

    /// Number of codes in the set.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes from this set that were purchased, keeping this set's order.
    #[must_use]
    pub fn purchased(&self, purchased: &PurchasedQuantities) -> Self {
        Self {
            codes: self
                .codes
                .iter()
                .filter(|code| purchased.contains(code.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Whether every code in this set was purchased. An empty set is never covered.
    pub fn is_covered_by(&self, purchased: &PurchasedQuantities) -> bool {
        !self.is_empty()
            && self
                .codes
                .iter()
                .all(|code| purchased.contains(code.as_str()))
    }
}

impl FromIterator<ItemCode> for TargetSet {
    fn from_iter<I: IntoIterator<Item = ItemCode>>(iter: I) -> Self {
        let mut set = Self::empty();

        set.extend(iter);

        set
    }
}

impl Extend<ItemCode> for TargetSet {
    fn extend<I: IntoIterator<Item = ItemCode>>(&mut self, iter: I) {
        for code in iter {
            self.insert(code);
        }
    }
}

impl<'s> IntoIterator for &'s TargetSet {
    type Item = &'s ItemCode;
    type IntoIter = std::slice::Iter<'s, ItemCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.codes.iter()
    }
}

impl BitOr for TargetSet {
    type Output = Self;

    /// Union, keeping the left-hand order followed by new right-hand codes.
    fn bitor(mut self, rhs: Self) -> Self::Output {
        self.extend(rhs.codes);

        self
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::orders::{LineItem, OrderSnapshot};

    use super::*;

    fn codes(set: &TargetSet) -> Vec<&str> {
        set.iter().map(ItemCode::as_str).collect()
    }

    #[test]
    fn duplicates_keep_first_position() {
        let set = TargetSet::from_strs(&["B", "A", "B", "C", "A"]);

        assert_eq!(codes(&set), vec!["B", "A", "C"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn union_preserves_left_order() {
        let left = TargetSet::from_strs(&["X", "Y"]);
        let right = TargetSet::from_strs(&["Z", "X"]);

        assert_eq!(codes(&(left | right)), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn purchased_filters_in_target_order() -> TestResult {
        let order = OrderSnapshot::with_line_items([
            LineItem::new("C", Decimal::ONE)?,
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ZERO)?,
        ]);
        let purchased = order.aggregate()?;

        let set = TargetSet::from_strs(&["A", "B", "C"]);

        assert_eq!(codes(&set.purchased(&purchased)), vec!["A", "C"]);

        Ok(())
    }

    #[test]
    fn coverage_requires_every_code_and_a_non_empty_set() -> TestResult {
        let order = OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ONE)?,
        ]);
        let purchased = order.aggregate()?;

        assert!(TargetSet::from_strs(&["A", "B"]).is_covered_by(&purchased));
        assert!(!TargetSet::from_strs(&["A", "C"]).is_covered_by(&purchased));
        assert!(!TargetSet::empty().is_covered_by(&purchased));

        Ok(())
    }
}
