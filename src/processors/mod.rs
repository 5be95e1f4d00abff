//! Promotion Processor
//!
//! Evaluates one promotion against one order, drawing redemptions from the caller's
//! ledger. Each call moves through the same states: a cheap `can_be_fulfilled` check,
//! condition evaluation, then redemption allocation and reward assembly.

use rust_decimal::Decimal;
use tracing::Span;

use crate::{
    catalog::{Catalog, ScopeRef, TargetSet},
    fulfillment::evaluate_condition,
    ledger::QuantityLedger,
    orders::OrderSnapshot,
    promotions::{Promotion, PromotionCondition, PromotionReward},
    redemptions::{allocate_discount_redemptions, allocate_gift_redemption},
    rewards::{Localization, RewardDescription, assemble},
};

/// Evaluates promotions of every supported type.
#[derive(Debug, Clone)]
pub struct PromotionProcessor<C, L> {
    catalog: C,
    localization: L,
}

impl<C: Catalog, L: Localization> PromotionProcessor<C, L> {
    /// Create a processor over a catalog and a localization source.
    pub fn new(catalog: C, localization: L) -> Self {
        Self {
            catalog,
            localization,
        }
    }

    /// Return the catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Return the localization source.
    pub fn localization(&self) -> &L {
        &self.localization
    }

    /// Cheap pre-check run before any condition evaluation.
    ///
    /// Requires a promotion, an order with at least one non-gift line, a configured
    /// bundle for all-items conditions, and at least one gift for gift rewards.
    pub fn can_be_fulfilled(
        &self,
        promotion: Option<&Promotion<'_>>,
        order: Option<&OrderSnapshot>,
    ) -> bool {
        let (Some(promotion), Some(order)) = (promotion, order) else {
            return false;
        };

        if !order.has_purchased_items() {
            return false;
        }

        if let PromotionCondition::AllItems { bundle: None } = promotion.condition() {
            return false;
        }

        !promotion.reward().is_empty_gift()
    }

    /// Resolve the item codes a condition is evaluated against.
    pub fn resolve_targets(&self, condition: &PromotionCondition) -> TargetSet {
        match condition {
            PromotionCondition::AllItems { bundle } => bundle
                .as_ref()
                .map_or_else(TargetSet::empty, |bundle| {
                    self.catalog.resolve_members(bundle, false)
                }),
            PromotionCondition::QuantityThreshold(threshold) => threshold
                .targets()
                .iter()
                .fold(TargetSet::empty(), |targets, scope| {
                    targets
                        | self
                            .catalog
                            .resolve_members(scope, threshold.match_recursive())
                }),
        }
    }

    /// Resolve gift references to entry codes, dropping the ones the catalog does not know.
    pub fn resolve_gifts(&self, gifts: &[ScopeRef]) -> TargetSet {
        gifts
            .iter()
            .filter_map(|gift| {
                let resolved = self.catalog.resolve_item(gift.as_str());

                if resolved.is_none() {
                    tracing::debug!(gift = %gift, "gift entry not found in catalog");
                }

                resolved.map(|metadata| metadata.code().clone())
            })
            .collect()
    }

    /// Evaluate `promotion` against `order`, drawing discount redemptions from `ledger`.
    ///
    /// Missing or misconfigured input never fails; it yields a not-fulfilled
    /// description and leaves the ledger untouched.
    #[tracing::instrument(
        name = "promotions.processor.evaluate",
        skip(self, promotion, order, ledger),
        fields(
            promotion = tracing::field::Empty,
            promotion_type = tracing::field::Empty,
            status = tracing::field::Empty,
            redemptions = tracing::field::Empty
        )
    )]
    pub fn evaluate(
        &self,
        promotion: Option<&Promotion<'_>>,
        order: Option<&OrderSnapshot>,
        ledger: &mut QuantityLedger,
    ) -> RewardDescription {
        let span = Span::current();

        if let Some(promotion) = promotion {
            span.record("promotion", promotion.name());
            span.record(
                "promotion_type",
                tracing::field::display(promotion.promotion_type()),
            );
        }

        let (true, Some(promotion), Some(order)) =
            (self.can_be_fulfilled(promotion, order), promotion, order)
        else {
            tracing::debug!("promotion cannot be fulfilled");

            return RewardDescription::not_fulfilled(promotion, &self.localization);
        };

        let purchased = match order.aggregate() {
            Ok(purchased) => purchased,
            Err(error) => {
                tracing::warn!(%error, "order quantities could not be aggregated");

                return RewardDescription::not_fulfilled(Some(promotion), &self.localization);
            }
        };

        let targets = self.resolve_targets(promotion.condition());
        let fulfillment = evaluate_condition(promotion.condition(), &targets, &purchased);

        let result = match promotion.reward() {
            PromotionReward::Discount(_) => allocate_discount_redemptions(
                &fulfillment,
                promotion.redemption_limit(),
                ledger,
            ),
            PromotionReward::GiftItems(gifts) => {
                let required_quantity = match promotion.condition() {
                    PromotionCondition::QuantityThreshold(threshold) => {
                        threshold.required_quantity()
                    }
                    PromotionCondition::AllItems { .. } => Decimal::ZERO,
                };

                allocate_gift_redemption(
                    &fulfillment,
                    required_quantity,
                    &self.resolve_gifts(gifts),
                    promotion.redemption_limit(),
                )
            }
        };

        let description = assemble(promotion, result, &self.localization);

        span.record("status", tracing::field::display(description.status()));
        span.record("redemptions", description.redemptions().len());

        description
    }
}
