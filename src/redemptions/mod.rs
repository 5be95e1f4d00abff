//! Redemptions
//!
//! Turns a fulfilled condition into concrete redemptions. Discount rewards draw one
//! unit per redemption from the shared [`QuantityLedger`]; gift rewards attach the
//! resolved gift entries once and never touch the ledger.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::{
    catalog::TargetSet,
    fulfillment::{ConditionFulfillment, FulfillmentStatus},
    items::ItemCode,
    ledger::{AffectedEntries, QuantityLedger},
    promotions::RedemptionLimit,
};

/// One application of a promotion's reward.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionDescription {
    consumed: SmallVec<[(ItemCode, Decimal); 2]>,
}

impl RedemptionDescription {
    /// Codes touched by this redemption, in draw order.
    pub fn affected_codes(&self) -> impl Iterator<Item = &ItemCode> {
        self.consumed.iter().map(|(code, _)| code)
    }

    /// Quantity of `code` consumed by this redemption.
    pub fn consumed(&self, code: &str) -> Decimal {
        self.consumed
            .iter()
            .filter(|(consumed, _)| consumed.as_str() == code)
            .map(|(_, qty)| *qty)
            .sum()
    }

    /// Iterate over `(code, quantity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemCode, Decimal)> {
        self.consumed.iter().map(|(code, qty)| (code, *qty))
    }

    /// Total quantity consumed.
    pub fn total(&self) -> Decimal {
        self.consumed.iter().map(|(_, qty)| *qty).sum()
    }

    fn gift(codes: &TargetSet) -> Self {
        Self {
            consumed: codes.iter().map(|code| (code.clone(), Decimal::ONE)).collect(),
        }
    }
}

impl From<AffectedEntries> for RedemptionDescription {
    fn from(affected: AffectedEntries) -> Self {
        Self {
            consumed: affected
                .iter()
                .map(|(code, qty)| (code.clone(), qty))
                .collect(),
        }
    }
}

/// Status and redemptions of one promotion evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    status: FulfillmentStatus,
    redemptions: SmallVec<[RedemptionDescription; 4]>,
}

impl EvaluationResult {
    /// A not-fulfilled result. Never carries redemptions.
    #[must_use]
    pub fn not_fulfilled() -> Self {
        Self {
            status: FulfillmentStatus::NOT_FULFILLED,
            redemptions: SmallVec::new(),
        }
    }

    /// Return the status.
    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    /// Return the redemptions in allocation order.
    pub fn redemptions(&self) -> &[RedemptionDescription] {
        &self.redemptions
    }

    /// Consume the result, returning its redemptions.
    pub fn into_redemptions(self) -> SmallVec<[RedemptionDescription; 4]> {
        self.redemptions
    }

    fn completed(requested: u32, redemptions: SmallVec<[RedemptionDescription; 4]>) -> Self {
        let complete = u32::try_from(redemptions.len()).is_ok_and(|made| made >= requested);

        Self {
            status: if complete {
                FulfillmentStatus::FULFILLED
            } else {
                FulfillmentStatus::PARTIALLY_FULFILLED
            },
            redemptions,
        }
    }
}

/// Whole units in `quantity`, saturating at `u32::MAX`.
fn whole_units(quantity: Decimal) -> u32 {
    quantity.floor().to_u32().unwrap_or(u32::MAX)
}

/// Allocate discount redemptions, one unit each, from the shared ledger.
///
/// The number requested is the redemption limit applied to the condition's
/// [`ConditionFulfillment::redeemable_units`]. Allocation stops early once the ledger runs dry, in which case the
/// result is partially fulfilled.
pub fn allocate_discount_redemptions(
    fulfillment: &ConditionFulfillment,
    limit: RedemptionLimit,
    ledger: &mut QuantityLedger,
) -> EvaluationResult {
    if !fulfillment.status().is_fulfilled() {
        return EvaluationResult::not_fulfilled();
    }

    let codes = fulfillment.applicable_codes();
    let requested = limit.clamp(fulfillment.redeemable_units());
    let available = whole_units(ledger.remaining_over(codes));
    let count = requested.min(available);

    let mut redemptions = SmallVec::new();

    for _ in 0..count {
        let Some(affected) = ledger.extract(codes, Decimal::ONE) else {
            tracing::debug!(
                made = redemptions.len(),
                requested,
                "ledger ran out of units mid-allocation"
            );

            break;
        };

        redemptions.push(RedemptionDescription::from(affected));
    }

    if count < requested {
        tracing::debug!(
            requested,
            available,
            "fewer units remain than the promotion could redeem"
        );
    }

    EvaluationResult::completed(requested, redemptions)
}

/// Allocate the single gift redemption.
///
/// `gifts` holds the gift codes that resolved in the catalog. The matched quantity must
/// still reach `required_quantity`. Gifts are not drawn from the ledger.
pub fn allocate_gift_redemption(
    fulfillment: &ConditionFulfillment,
    required_quantity: Decimal,
    gifts: &TargetSet,
    limit: RedemptionLimit,
) -> EvaluationResult {
    if !fulfillment.status().is_fulfilled() || fulfillment.matched_quantity() < required_quantity
    {
        return EvaluationResult::not_fulfilled();
    }

    let requested = limit.clamp(1);
    let mut redemptions = SmallVec::new();

    if gifts.is_empty() {
        tracing::debug!("no gift entry could be resolved");
    } else {
        redemptions.push(RedemptionDescription::gift(gifts));
    }

    EvaluationResult::completed(requested, redemptions)
}
