//! Promotion Engine
//!
//! Runs one order-evaluation pass: coupon filtering, then every included promotion in
//! priority order against a ledger owned by the pass.

use rustc_hash::FxHashMap;
use tracing::Span;

use crate::{
    catalog::Catalog,
    coupons::{CouponFilter, Exclusion, PromotionFilterContext},
    fulfillment::RequestedStatuses,
    ledger::QuantityLedger,
    orders::OrderSnapshot,
    processors::PromotionProcessor,
    promotions::{Promotion, PromotionKey},
    rewards::{Localization, RewardDescription},
};

/// Everything produced by one pass.
///
/// The pass owns its ledger; dropping the result discards every redemption it made.
#[derive(Debug, Clone)]
pub struct PassResult {
    rewards: Vec<RewardDescription>,
    exclusions: Vec<Exclusion>,
    coupon_codes: FxHashMap<PromotionKey, String>,
    ledger: QuantityLedger,
}

impl PassResult {
    /// Reward descriptions for the requested statuses, in evaluation order.
    pub fn rewards(&self) -> &[RewardDescription] {
        &self.rewards
    }

    /// Promotions removed before evaluation.
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Coupon code that unlocked `promotion`, if any.
    pub fn coupon_code(&self, promotion: PromotionKey) -> Option<&str> {
        self.coupon_codes.get(&promotion).map(String::as_str)
    }

    /// Ledger state after every promotion drew its redemptions.
    pub fn ledger(&self) -> &QuantityLedger {
        &self.ledger
    }

    /// Consume the result, returning the reward descriptions.
    pub fn into_rewards(self) -> Vec<RewardDescription> {
        self.rewards
    }
}

/// Orchestrates evaluation passes.
#[derive(Debug)]
pub struct PromotionEngine<C, L> {
    processor: PromotionProcessor<C, L>,
    coupon_filter: CouponFilter,
}

impl<C: Catalog, L: Localization> PromotionEngine<C, L> {
    /// Create an engine with a default coupon filter.
    pub fn new(catalog: C, localization: L) -> Self {
        Self {
            processor: PromotionProcessor::new(catalog, localization),
            coupon_filter: CouponFilter::new(),
        }
    }

    /// Replace the coupon filter.
    #[must_use]
    pub fn with_coupon_filter(mut self, coupon_filter: CouponFilter) -> Self {
        self.coupon_filter = coupon_filter;
        self
    }

    /// Return the processor.
    pub fn processor(&self) -> &PromotionProcessor<C, L> {
        &self.processor
    }

    /// Evaluate `promotions` against `order`.
    ///
    /// Promotions run in ascending priority, ties keeping their given order. Each
    /// draws from the ledger left by the ones before it.
    #[tracing::instrument(
        name = "promotions.engine.evaluate",
        skip(self, order, promotions, coupon_codes),
        fields(
            promotion_count = promotions.len(),
            line_items = order.len(),
            excluded = tracing::field::Empty,
            rewards = tracing::field::Empty
        )
    )]
    pub fn evaluate<S: AsRef<str>>(
        &self,
        order: &OrderSnapshot,
        promotions: &[Promotion<'_>],
        coupon_codes: &[S],
        requested_statuses: RequestedStatuses,
    ) -> PassResult {
        let span = Span::current();

        let mut ordered: Vec<&Promotion<'_>> = promotions.iter().collect();

        ordered.sort_by_key(|promotion| promotion.priority());

        let mut context = PromotionFilterContext::new(ordered, requested_statuses);

        self.coupon_filter
            .filter(&mut context, coupon_codes, self.processor.localization());

        let (included, exclusions, coupon_codes) = context.into_parts();

        let mut ledger = QuantityLedger::from_order(order).unwrap_or_else(|error| {
            tracing::warn!(%error, "order quantities could not be aggregated");

            QuantityLedger::new()
        });

        let rewards: Vec<RewardDescription> = included
            .into_iter()
            .map(|promotion| {
                self.processor
                    .evaluate(Some(promotion), Some(order), &mut ledger)
            })
            .filter(|reward| requested_statuses.includes(reward.status()))
            .collect();

        span.record("excluded", exclusions.len());
        span.record("rewards", rewards.len());

        PassResult {
            rewards,
            exclusions,
            coupon_codes,
            ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal::Decimal;
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{
        catalog::{GroupKind, ScopeRef, StaticCatalog},
        fulfillment::FulfillmentStatus,
        items::{ItemCode, ItemMetadata},
        orders::LineItem,
        promotions::MonetaryReward,
        rewards::StaticLocalization,
    };

    use super::*;

    fn catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();

        for code in ["A", "B"] {
            catalog.add_entry(ItemMetadata::new(ItemCode::from(code), code, None));
        }

        catalog.add_group(
            "bundle",
            GroupKind::Bundle,
            [ScopeRef::from("A"), ScopeRef::from("B")],
        );

        catalog
    }

    fn bundle_promotion(key: PromotionKey, name: &str) -> Promotion<'static> {
        Promotion::buy_bundle_get_item_discount(
            key,
            name,
            Some(ScopeRef::from("bundle")),
            MonetaryReward::PercentageOff(Percentage::from(0.10)),
        )
    }

    #[test]
    fn lower_priority_values_claim_units_first() -> TestResult {
        let mut keys = SlotMap::<PromotionKey, ()>::with_key();
        let late = bundle_promotion(keys.insert(()), "late").with_priority(10);
        let early = bundle_promotion(keys.insert(()), "early").with_priority(1);

        let order = OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ONE)?,
        ]);

        let engine = PromotionEngine::new(catalog(), StaticLocalization::new());
        let pass = engine.evaluate::<&str>(
            &order,
            &[late.clone(), early.clone()],
            &[],
            RequestedStatuses::ALL,
        );

        let outcomes: Vec<_> = pass
            .rewards()
            .iter()
            .map(|reward| (reward.promotion(), reward.status(), reward.redemptions().len()))
            .collect();

        assert_eq!(
            outcomes,
            vec![
                (Some(early.key()), FulfillmentStatus::FULFILLED, 2),
                (
                    Some(late.key()),
                    FulfillmentStatus::PARTIALLY_FULFILLED,
                    0
                ),
            ]
        );
        assert!(pass.ledger().is_exhausted());

        Ok(())
    }

    #[test]
    fn equal_priorities_keep_insertion_order() -> TestResult {
        let mut keys = SlotMap::<PromotionKey, ()>::with_key();
        let first = bundle_promotion(keys.insert(()), "first");
        let second = bundle_promotion(keys.insert(()), "second");

        let order = OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ONE)?,
        ]);

        let engine = PromotionEngine::new(catalog(), StaticLocalization::new());
        let pass = engine.evaluate::<&str>(
            &order,
            &[first.clone(), second],
            &[],
            RequestedStatuses::FULFILLED,
        );

        assert_eq!(pass.rewards().len(), 1);
        assert_eq!(pass.rewards()[0].promotion(), Some(first.key()));

        Ok(())
    }

    #[test]
    fn coupon_protected_promotions_are_excluded_without_code() -> TestResult {
        let mut keys = SlotMap::<PromotionKey, ()>::with_key();
        let promotion = bundle_promotion(keys.insert(()), "coupon").with_coupon_code("SAVE");

        let order = OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ONE)?,
        ]);

        let engine = PromotionEngine::new(catalog(), StaticLocalization::new());

        let without = engine.evaluate::<&str>(
            &order,
            std::slice::from_ref(&promotion),
            &[],
            RequestedStatuses::ALL,
        );
        let with = engine.evaluate(
            &order,
            std::slice::from_ref(&promotion),
            &["save"],
            RequestedStatuses::ALL,
        );

        assert!(without.rewards().is_empty());
        assert_eq!(without.exclusions().len(), 1);
        assert_eq!(without.ledger().remaining("A"), Decimal::ONE);

        assert_eq!(with.rewards().len(), 1);
        assert_eq!(with.coupon_code(promotion.key()), Some("SAVE"));

        Ok(())
    }

    #[test]
    fn each_pass_starts_from_a_fresh_ledger() -> TestResult {
        let mut keys = SlotMap::<PromotionKey, ()>::with_key();
        let promotion = bundle_promotion(keys.insert(()), "bundle");

        let order = OrderSnapshot::with_line_items([
            LineItem::new("A", Decimal::ONE)?,
            LineItem::new("B", Decimal::ONE)?,
        ]);

        let engine = PromotionEngine::new(catalog(), StaticLocalization::new());
        let promotions = [promotion];

        let first = engine.evaluate::<&str>(&order, &promotions, &[], RequestedStatuses::ALL);
        drop(first);

        let second = engine.evaluate::<&str>(&order, &promotions, &[], RequestedStatuses::ALL);

        assert_eq!(second.rewards()[0].status(), FulfillmentStatus::FULFILLED);
        assert_eq!(second.rewards()[0].redemptions().len(), 2);

        Ok(())
    }
}
