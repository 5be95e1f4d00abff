//! Fulfillment
//!
//! Decides whether a promotion's condition holds against the purchased quantities of an
//! order, and how many times it holds.
//!
//! Two condition shapes are supported:
//!
//! - **All items**: a coverage check. Every target code must have been bought at least
//!   once; extra units do not change the outcome.
//! - **Quantity threshold**: the bought quantity over the target codes, `Q`, must reach
//!   the required quantity. The condition holds `floor(Q / required)` times.

use std::{
    fmt,
    ops::{BitOr, BitOrAssign},
};

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::{catalog::TargetSet, orders::PurchasedQuantities, promotions::PromotionCondition};

/// Fulfillment status flags. Several flags may be set at once.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FulfillmentStatus(u8);

impl FulfillmentStatus {
    /// The condition is not met. This is the empty flag set.
    pub const NOT_FULFILLED: Self = Self(0);

    /// The condition is met, but fewer redemptions were possible than requested.
    pub const PARTIALLY_FULFILLED: Self = Self(1);

    /// The condition is met and every requested redemption was made.
    pub const FULFILLED: Self = Self(1 << 1);

    /// The promotion needs a coupon code that was not supplied.
    pub const COUPON_CODE_REQUIRED: Self = Self(1 << 2);

    /// The promotion was excluded before evaluation.
    pub const EXCLUDED: Self = Self(1 << 3);

    /// Whether every bit in `flag` is set. `NOT_FULFILLED` is only contained in itself.
    pub fn contains(self, flag: Self) -> bool {
        if flag.0 == 0 {
            return self.0 == 0;
        }

        self.0 & flag.0 == flag.0
    }

    /// Whether the `FULFILLED` bit is set.
    pub fn is_fulfilled(self) -> bool {
        self.contains(Self::FULFILLED)
    }

    /// Whether no flag is set.
    pub fn is_not_fulfilled(self) -> bool {
        self.0 == 0
    }

    /// Raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for FulfillmentStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FulfillmentStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FulfillmentStatus({self})")
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_not_fulfilled() {
            return f.write_str("NotFulfilled");
        }

        let names = [
            (Self::PARTIALLY_FULFILLED, "PartiallyFulfilled"),
            (Self::FULFILLED, "Fulfilled"),
            (Self::COUPON_CODE_REQUIRED, "CouponCodeRequired"),
            (Self::EXCLUDED, "Excluded"),
        ];

        let mut first = true;

        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }

                f.write_str(name)?;
                first = false;
            }
        }

        Ok(())
    }
}

/// Which outcomes a caller wants reported back from an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestedStatuses(u8);

impl RequestedStatuses {
    /// Report nothing.
    pub const NONE: Self = Self(0);

    /// Report promotions whose condition was not met, including excluded ones.
    pub const NOT_FULFILLED: Self = Self(1);

    /// Report partially fulfilled promotions.
    pub const PARTIALLY_FULFILLED: Self = Self(1 << 1);

    /// Report fulfilled promotions.
    pub const FULFILLED: Self = Self(1 << 2);

    /// Report every outcome.
    pub const ALL: Self = Self(0b111);

    /// Whether every bit in `flag` is requested.
    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Whether an outcome with `status` should be reported.
    pub fn includes(self, status: FulfillmentStatus) -> bool {
        if status.is_fulfilled() {
            self.contains(Self::FULFILLED)
        } else if status.contains(FulfillmentStatus::PARTIALLY_FULFILLED) {
            self.contains(Self::PARTIALLY_FULFILLED)
        } else {
            self.contains(Self::NOT_FULFILLED)
        }
    }
}

impl BitOr for RequestedStatuses {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Outcome of evaluating a condition against purchased quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionFulfillment {
    status: FulfillmentStatus,
    multiplicity: u32,
    redeemable_units: u32,
    applicable_codes: TargetSet,
    matched_quantity: Decimal,
}

impl ConditionFulfillment {
    /// A not-fulfilled outcome with nothing matched.
    #[must_use]
    pub fn not_fulfilled() -> Self {
        Self {
            status: FulfillmentStatus::NOT_FULFILLED,
            multiplicity: 0,
            redeemable_units: 0,
            applicable_codes: TargetSet::empty(),
            matched_quantity: Decimal::ZERO,
        }
    }

    /// Return the status.
    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    /// How many times the condition holds.
    pub fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    /// Upper bound on discount redemptions before the redemption limit applies.
    ///
    /// A threshold redeems once per time it is met. A coverage condition redeems once
    /// per whole matched unit of the bundle.
    pub fn redeemable_units(&self) -> u32 {
        self.redeemable_units
    }

    /// Target codes present in the order, in target order.
    pub fn applicable_codes(&self) -> &TargetSet {
        &self.applicable_codes
    }

    /// Purchased quantity over the applicable codes.
    pub fn matched_quantity(&self) -> Decimal {
        self.matched_quantity
    }
}

/// Whole units in `quantity`, saturating at `u32::MAX`.
fn whole_units(quantity: Decimal) -> u32 {
    quantity.floor().to_u32().unwrap_or(u32::MAX)
}

/// Sum purchased quantities over `codes`, `None` on overflow.
fn matched_quantity(codes: &TargetSet, purchased: &PurchasedQuantities) -> Option<Decimal> {
    codes.iter().try_fold(Decimal::ZERO, |acc, code| {
        acc.checked_add(purchased.quantity(code.as_str()))
    })
}

/// Coverage check: every target code must have been bought.
pub fn evaluate_all_items(
    targets: &TargetSet,
    purchased: &PurchasedQuantities,
) -> ConditionFulfillment {
    let applicable_codes = targets.purchased(purchased);

    let Some(matched) = matched_quantity(&applicable_codes, purchased) else {
        tracing::warn!("matched quantity overflowed; treating condition as not fulfilled");

        return ConditionFulfillment::not_fulfilled();
    };

    let covered = targets.is_covered_by(purchased);

    ConditionFulfillment {
        status: if covered {
            FulfillmentStatus::FULFILLED
        } else {
            FulfillmentStatus::NOT_FULFILLED
        },
        multiplicity: u32::from(covered),
        redeemable_units: if covered { whole_units(matched) } else { 0 },
        applicable_codes,
        matched_quantity: matched,
    }
}

/// Threshold check: the quantity bought over the target codes must reach `required`.
pub fn evaluate_quantity_threshold(
    targets: &TargetSet,
    required: Decimal,
    purchased: &PurchasedQuantities,
) -> ConditionFulfillment {
    if required <= Decimal::ZERO {
        tracing::debug!(%required, "required quantity must be positive");

        return ConditionFulfillment::not_fulfilled();
    }

    let applicable_codes = targets.purchased(purchased);

    let Some(matched) = matched_quantity(&applicable_codes, purchased) else {
        tracing::warn!("matched quantity overflowed; treating condition as not fulfilled");

        return ConditionFulfillment::not_fulfilled();
    };

    let multiplicity = matched
        .checked_div(required)
        .map_or(u32::MAX, |ratio| ratio.floor().to_u32().unwrap_or(u32::MAX));

    ConditionFulfillment {
        status: if multiplicity >= 1 {
            FulfillmentStatus::FULFILLED
        } else {
            FulfillmentStatus::NOT_FULFILLED
        },
        multiplicity,
        redeemable_units: multiplicity,
        applicable_codes,
        matched_quantity: matched,
    }
}

/// Evaluate `condition` over its resolved `targets`.
pub fn evaluate_condition(
    condition: &PromotionCondition,
    targets: &TargetSet,
    purchased: &PurchasedQuantities,
) -> ConditionFulfillment {
    match condition {
        PromotionCondition::AllItems { .. } => evaluate_all_items(targets, purchased),
        PromotionCondition::QuantityThreshold(threshold) => {
            evaluate_quantity_threshold(targets, threshold.required_quantity(), purchased)
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        items::ItemCode,
        orders::{LineItem, OrderError, OrderSnapshot},
    };

    use super::*;

    fn purchased(lines: &[(&str, i64)]) -> Result<PurchasedQuantities, OrderError> {
        let items = lines
            .iter()
            .map(|(code, qty)| LineItem::new(*code, Decimal::from(*qty)))
            .collect::<Result<Vec<_>, _>>()?;

        OrderSnapshot::with_line_items(items).aggregate()
    }

    #[test]
    fn status_flags_compose() {
        let status = FulfillmentStatus::FULFILLED | FulfillmentStatus::COUPON_CODE_REQUIRED;

        assert!(status.is_fulfilled());
        assert!(status.contains(FulfillmentStatus::COUPON_CODE_REQUIRED));
        assert!(!status.contains(FulfillmentStatus::NOT_FULFILLED));
        assert!(FulfillmentStatus::NOT_FULFILLED.contains(FulfillmentStatus::NOT_FULFILLED));
        assert!(!FulfillmentStatus::PARTIALLY_FULFILLED.is_fulfilled());
        assert_eq!(status.to_string(), "Fulfilled | CouponCodeRequired");
    }

    #[test]
    fn requested_statuses_filter_outcomes() {
        let requested = RequestedStatuses::FULFILLED | RequestedStatuses::PARTIALLY_FULFILLED;

        assert!(requested.includes(FulfillmentStatus::FULFILLED));
        assert!(requested.includes(FulfillmentStatus::PARTIALLY_FULFILLED));
        assert!(!requested.includes(FulfillmentStatus::NOT_FULFILLED));
        assert!(!requested.includes(FulfillmentStatus::EXCLUDED));
        assert!(RequestedStatuses::ALL.includes(FulfillmentStatus::COUPON_CODE_REQUIRED));
        assert!(!RequestedStatuses::NONE.includes(FulfillmentStatus::FULFILLED));
    }

    #[test]
    fn bundle_fully_present_is_fulfilled() -> TestResult {
        let purchased = purchased(&[("A", 1), ("B", 1), ("C", 5)])?;
        let bundle = TargetSet::from_strs(&["A", "B"]);

        let result = evaluate_all_items(&bundle, &purchased);

        assert_eq!(result.status(), FulfillmentStatus::FULFILLED);
        assert_eq!(result.multiplicity(), 1);
        assert_eq!(
            result
                .applicable_codes()
                .iter()
                .map(ItemCode::as_str)
                .collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        Ok(())
    }

    #[test]
    fn bundle_with_missing_member_is_not_fulfilled() -> TestResult {
        let purchased = purchased(&[("A", 1), ("C", 5)])?;
        let bundle = TargetSet::from_strs(&["A", "B"]);

        let result = evaluate_all_items(&bundle, &purchased);

        assert_eq!(result.status(), FulfillmentStatus::NOT_FULFILLED);
        assert_eq!(result.multiplicity(), 0);

        Ok(())
    }

    #[test]
    fn extra_bundle_units_do_not_raise_multiplicity() -> TestResult {
        let purchased = purchased(&[("A", 7), ("B", 3)])?;
        let bundle = TargetSet::from_strs(&["A", "B"]);

        let result = evaluate_all_items(&bundle, &purchased);

        assert_eq!(result.multiplicity(), 1);
        assert_eq!(result.matched_quantity(), Decimal::from(10));
        assert_eq!(result.redeemable_units(), 10);

        Ok(())
    }

    #[test]
    fn empty_bundle_is_not_fulfilled() -> TestResult {
        let purchased = purchased(&[("A", 1)])?;

        let result = evaluate_all_items(&TargetSet::empty(), &purchased);

        assert_eq!(result.status(), FulfillmentStatus::NOT_FULFILLED);

        Ok(())
    }

    #[test]
    fn threshold_multiplicity_is_floor_of_ratio() -> TestResult {
        let purchased = purchased(&[("X", 4), ("Y", 3), ("Z", 10)])?;
        let targets = TargetSet::from_strs(&["X", "Y"]);

        let result = evaluate_quantity_threshold(&targets, Decimal::from(3), &purchased);

        assert_eq!(result.status(), FulfillmentStatus::FULFILLED);
        assert_eq!(result.matched_quantity(), Decimal::from(7));
        assert_eq!(result.multiplicity(), 2);
        assert_eq!(result.redeemable_units(), 2);

        Ok(())
    }

    #[test]
    fn threshold_below_required_is_not_fulfilled() -> TestResult {
        let purchased = purchased(&[("X", 1), ("Y", 1)])?;
        let targets = TargetSet::from_strs(&["X", "Y"]);

        let result = evaluate_quantity_threshold(&targets, Decimal::from(3), &purchased);

        assert_eq!(result.status(), FulfillmentStatus::NOT_FULFILLED);
        assert_eq!(result.multiplicity(), 0);
        assert_eq!(result.matched_quantity(), Decimal::from(2));

        Ok(())
    }

    #[test]
    fn fractional_required_quantity_is_supported() -> TestResult {
        let purchased = purchased(&[("X", 2)])?;
        let targets = TargetSet::from_strs(&["X"]);

        let result = evaluate_quantity_threshold(&targets, Decimal::new(15, 1), &purchased);

        assert_eq!(result.multiplicity(), 1);

        Ok(())
    }

    #[test]
    fn non_positive_required_quantity_is_not_fulfilled() -> TestResult {
        let purchased = purchased(&[("X", 2)])?;
        let targets = TargetSet::from_strs(&["X"]);

        let result = evaluate_quantity_threshold(&targets, Decimal::ZERO, &purchased);

        assert_eq!(result, ConditionFulfillment::not_fulfilled());

        Ok(())
    }

    #[test]
    fn evaluate_condition_dispatches_on_condition_shape() -> TestResult {
        let purchased = purchased(&[("A", 2)])?;
        let targets = TargetSet::from_strs(&["A"]);

        let bundle = PromotionCondition::AllItems { bundle: None };
        let threshold = PromotionCondition::QuantityThreshold(
            crate::promotions::PurchaseQuantity::new([], Decimal::ONE, false),
        );

        assert_eq!(evaluate_condition(&bundle, &targets, &purchased).multiplicity(), 1);
        assert_eq!(evaluate_condition(&threshold, &targets, &purchased).multiplicity(), 2);

        Ok(())
    }

    #[test]
    fn matched_quantity_overflow_is_not_fulfilled() -> TestResult {
        let order = OrderSnapshot::with_line_items([
            LineItem::new("X", Decimal::MAX)?,
            LineItem::new("Y", Decimal::MAX)?,
        ]);
        let purchased = order.aggregate()?;
        let targets = TargetSet::from_strs(&["X", "Y"]);

        let result = evaluate_quantity_threshold(&targets, Decimal::ONE, &purchased);

        assert_eq!(result.status(), FulfillmentStatus::NOT_FULFILLED);

        Ok(())
    }
}
