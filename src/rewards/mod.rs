//! Rewards
//!
//! Packages an evaluation result into a [`RewardDescription`] for the caller, with
//! status text supplied by a [`Localization`] collaborator.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    fulfillment::FulfillmentStatus,
    promotions::{MonetaryReward, Promotion, PromotionKey, PromotionReward},
    redemptions::{EvaluationResult, RedemptionDescription},
};

/// Source of user-facing text.
#[cfg_attr(test, mockall::automock)]
pub trait Localization {
    /// Reward description text for a fulfillment status.
    fn text_for(&self, status: FulfillmentStatus) -> String;

    /// Localized string for a resource key, if one is known.
    fn string(&self, key: &str) -> Option<String>;
}

/// English text for statuses and the validation keys used by this crate.
#[derive(Debug, Clone)]
pub struct StaticLocalization {
    strings: FxHashMap<String, String>,
}

impl StaticLocalization {
    /// Create a localization with no extra strings beyond the English defaults.
    #[must_use]
    pub fn new() -> Self {
        let strings = [
            (
                "/commerce/validation/buyfrombundlerequired",
                "A bundle is required for this promotion.",
            ),
            (
                "/commerce/validation/nogiftitem",
                "At least one gift item is required for this promotion.",
            ),
            (
                "/commerce/validation/requiredquantity",
                "The required quantity must be at least 1.",
            ),
        ]
        .into_iter()
        .map(|(key, text)| (key.to_string(), text.to_string()))
        .collect();

        Self { strings }
    }

    /// Add or replace a string.
    #[must_use]
    pub fn with_string(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.strings.insert(key.into(), text.into());
        self
    }
}

impl Default for StaticLocalization {
    fn default() -> Self {
        Self::new()
    }
}

impl Localization for StaticLocalization {
    fn text_for(&self, status: FulfillmentStatus) -> String {
        let text = if status.contains(FulfillmentStatus::EXCLUDED) {
            "The promotion was excluded."
        } else if status.contains(FulfillmentStatus::COUPON_CODE_REQUIRED) {
            "A coupon code is required for this promotion."
        } else if status.is_fulfilled() {
            "The promotion has been applied."
        } else if status.contains(FulfillmentStatus::PARTIALLY_FULFILLED) {
            "The promotion has been partially applied."
        } else {
            "The promotion conditions have not been met."
        };

        text.to_string()
    }

    fn string(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }
}

/// Kind of reward a description carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardType {
    /// Percentage off each redeemed unit.
    Percentage,

    /// Fixed amount off each redeemed unit.
    Money,

    /// Fixed price for each redeemed unit.
    FixedPrice,

    /// Gift entries added to the order.
    GiftItems,
}

impl From<&PromotionReward<'_>> for RewardType {
    fn from(reward: &PromotionReward<'_>) -> Self {
        match reward {
            PromotionReward::Discount(MonetaryReward::PercentageOff(_)) => RewardType::Percentage,
            PromotionReward::Discount(MonetaryReward::AmountOff(_)) => RewardType::Money,
            PromotionReward::Discount(MonetaryReward::FixedPrice(_)) => RewardType::FixedPrice,
            PromotionReward::GiftItems(_) => RewardType::GiftItems,
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RewardType::Percentage => "percentage",
            RewardType::Money => "money",
            RewardType::FixedPrice => "fixed price",
            RewardType::GiftItems => "gift items",
        })
    }
}

/// Outcome of evaluating one promotion against one order.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardDescription {
    promotion: Option<PromotionKey>,
    status: FulfillmentStatus,
    redemptions: Vec<RedemptionDescription>,
    reward_type: Option<RewardType>,
    description: String,
}

impl RewardDescription {
    /// A not-fulfilled description with no redemptions.
    pub fn not_fulfilled(promotion: Option<&Promotion<'_>>, localization: &impl Localization) -> Self {
        Self::with_status(promotion, FulfillmentStatus::NOT_FULFILLED, localization)
    }

    /// A description with `status` and no redemptions, e.g. for an excluded promotion.
    pub fn with_status(
        promotion: Option<&Promotion<'_>>,
        status: FulfillmentStatus,
        localization: &impl Localization,
    ) -> Self {
        Self {
            promotion: promotion.map(Promotion::key),
            status,
            redemptions: Vec::new(),
            reward_type: promotion.map(|promotion| RewardType::from(promotion.reward())),
            description: localization.text_for(status),
        }
    }

    /// Promotion this description belongs to, if any.
    pub fn promotion(&self) -> Option<PromotionKey> {
        self.promotion
    }

    /// Return the status.
    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    /// Return the redemptions.
    pub fn redemptions(&self) -> &[RedemptionDescription] {
        &self.redemptions
    }

    /// Return the reward type, if a promotion was supplied.
    pub fn reward_type(&self) -> Option<RewardType> {
        self.reward_type
    }

    /// Human-readable status text.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Build the reward description for an evaluated promotion.
///
/// A not-fulfilled result always yields empty redemptions and the not-fulfilled text.
pub fn assemble(
    promotion: &Promotion<'_>,
    result: EvaluationResult,
    localization: &impl Localization,
) -> RewardDescription {
    if result.status().is_not_fulfilled() {
        return RewardDescription::not_fulfilled(Some(promotion), localization);
    }

    let status = result.status();

    RewardDescription {
        promotion: Some(promotion.key()),
        status,
        redemptions: result.into_redemptions().into_vec(),
        reward_type: Some(RewardType::from(promotion.reward())),
        description: localization.text_for(status),
    }
}
