//! Promotions
//!
//! A promotion pairs a [`PromotionCondition`] with a [`PromotionReward`]. The two shipped
//! shapes are "buy bundle, get item discount" (all-items condition, discount reward) and
//! "buy product, get gift items" (quantity-threshold condition, gift reward); the other
//! two pairings evaluate through the same processor.

use std::fmt;

use rust_decimal::Decimal;
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::catalog::ScopeRef;

pub mod budget;
pub mod rewards;

pub use budget::RedemptionLimit;
pub use rewards::{DiscountError, MonetaryReward, PromotionReward};

new_key_type! {
    /// Promotion Key
    pub struct PromotionKey;
}

/// Quantity-threshold settings: buy at least `required_quantity` units from `targets`.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseQuantity {
    targets: SmallVec<[ScopeRef; 4]>,
    required_quantity: Decimal,
    match_recursive: bool,
}

impl PurchaseQuantity {
    /// Create a purchase-quantity condition.
    pub fn new(
        targets: impl IntoIterator<Item = ScopeRef>,
        required_quantity: Decimal,
        match_recursive: bool,
    ) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            required_quantity,
            match_recursive,
        }
    }

    /// Catalog scopes whose entries count towards the threshold.
    pub fn targets(&self) -> &[ScopeRef] {
        &self.targets
    }

    /// Units needed for one fulfillment.
    pub fn required_quantity(&self) -> Decimal {
        self.required_quantity
    }

    /// Whether sub-categories of the targets also count.
    pub fn match_recursive(&self) -> bool {
        self.match_recursive
    }
}

/// Condition half of a promotion definition.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionCondition {
    /// Every entry of the bundle must be in the order.
    AllItems {
        /// Bundle whose entries must all be present; `None` until configured.
        bundle: Option<ScopeRef>,
    },

    /// A minimum quantity must be bought from a set of scopes.
    QuantityThreshold(PurchaseQuantity),
}

/// Promotion type, derived from the condition and reward pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionType {
    /// Buy every entry of a bundle, get a discount on those entries.
    BuyBundleGetItemDiscount,

    /// Buy every entry of a bundle, get gift items.
    BuyBundleGetGiftItems,

    /// Buy a quantity of products, get a discount on them.
    BuyProductGetItemDiscount,

    /// Buy a quantity of products, get gift items.
    BuyProductGetGiftItems,
}

impl fmt::Display for PromotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PromotionType::BuyBundleGetItemDiscount => "buy_bundle_get_item_discount",
            PromotionType::BuyBundleGetGiftItems => "buy_bundle_get_gift_items",
            PromotionType::BuyProductGetItemDiscount => "buy_product_get_item_discount",
            PromotionType::BuyProductGetGiftItems => "buy_product_get_gift_items",
        })
    }
}

/// A configured promotion.
#[derive(Debug, Clone)]
pub struct Promotion<'a> {
    key: PromotionKey,
    name: String,
    priority: i32,
    condition: PromotionCondition,
    reward: PromotionReward<'a>,
    redemption_limit: RedemptionLimit,
    coupon_code: Option<String>,
}

impl<'a> Promotion<'a> {
    /// Create a promotion from a condition and reward.
    pub fn new(
        key: PromotionKey,
        name: impl Into<String>,
        condition: PromotionCondition,
        reward: PromotionReward<'a>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            priority: 0,
            condition,
            reward,
            redemption_limit: RedemptionLimit::Unlimited,
            coupon_code: None,
        }
    }

    /// "Buy bundle, get discount": every entry of `bundle` must be bought, each
    /// bought unit of those entries is discounted.
    pub fn buy_bundle_get_item_discount(
        key: PromotionKey,
        name: impl Into<String>,
        bundle: Option<ScopeRef>,
        discount: MonetaryReward<'a>,
    ) -> Self {
        Self::new(
            key,
            name,
            PromotionCondition::AllItems { bundle },
            PromotionReward::Discount(discount),
        )
    }

    /// "Buy product, get gift": buy at least the required quantity, get the gift entries.
    pub fn buy_product_get_gift_items(
        key: PromotionKey,
        name: impl Into<String>,
        condition: PurchaseQuantity,
        gift_items: impl IntoIterator<Item = ScopeRef>,
    ) -> Self {
        Self::new(
            key,
            name,
            PromotionCondition::QuantityThreshold(condition),
            PromotionReward::GiftItems(gift_items.into_iter().collect()),
        )
    }

    /// Set the per-order redemption limit.
    #[must_use]
    pub fn with_redemption_limit(mut self, redemption_limit: RedemptionLimit) -> Self {
        self.redemption_limit = redemption_limit;
        self
    }

    /// Require a coupon code.
    #[must_use]
    pub fn with_coupon_code(mut self, code: impl Into<String>) -> Self {
        self.coupon_code = Some(code.into());
        self
    }

    /// Set the evaluation priority; lower values are evaluated first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Return the promotion key.
    pub fn key(&self) -> PromotionKey {
        self.key
    }

    /// Return the promotion name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the evaluation priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Return the condition.
    pub fn condition(&self) -> &PromotionCondition {
        &self.condition
    }

    /// Return the reward.
    pub fn reward(&self) -> &PromotionReward<'a> {
        &self.reward
    }

    /// Return the redemption limit.
    pub fn redemption_limit(&self) -> RedemptionLimit {
        self.redemption_limit
    }

    /// Return the coupon code configured on the promotion itself.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Return the promotion type.
    pub fn promotion_type(&self) -> PromotionType {
        match (&self.condition, &self.reward) {
            (PromotionCondition::AllItems { .. }, PromotionReward::Discount(_)) => {
                PromotionType::BuyBundleGetItemDiscount
            }
            (PromotionCondition::AllItems { .. }, PromotionReward::GiftItems(_)) => {
                PromotionType::BuyBundleGetGiftItems
            }
            (PromotionCondition::QuantityThreshold(_), PromotionReward::Discount(_)) => {
                PromotionType::BuyProductGetItemDiscount
            }
            (PromotionCondition::QuantityThreshold(_), PromotionReward::GiftItems(_)) => {
                PromotionType::BuyProductGetGiftItems
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn key_returns_constructor_key() {
        let mut keys = SlotMap::<PromotionKey, ()>::with_key();
        let key = keys.insert(());

        let promo = Promotion::buy_bundle_get_item_discount(
            key,
            "Bundle deal",
            Some(ScopeRef::from("bundle")),
            MonetaryReward::PercentageOff(Percentage::from(0.10)),
        );

        assert_eq!(promo.key(), key);
        assert_ne!(promo.key(), PromotionKey::default());
        assert_eq!(promo.name(), "Bundle deal");
    }

    #[test]
    fn promotion_type_follows_condition_and_reward() {
        let bundle = Promotion::buy_bundle_get_item_discount(
            PromotionKey::default(),
            "bundle",
            None,
            MonetaryReward::PercentageOff(Percentage::from(0.10)),
        );

        let gift = Promotion::buy_product_get_gift_items(
            PromotionKey::default(),
            "gift",
            PurchaseQuantity::new([ScopeRef::from("teas")], Decimal::from(3), true),
            [ScopeRef::from("MUG")],
        );

        let mixed = Promotion::new(
            PromotionKey::default(),
            "mixed",
            PromotionCondition::AllItems { bundle: None },
            PromotionReward::GiftItems(SmallVec::new()),
        );

        assert_eq!(
            bundle.promotion_type(),
            PromotionType::BuyBundleGetItemDiscount
        );
        assert_eq!(gift.promotion_type(), PromotionType::BuyProductGetGiftItems);
        assert_eq!(mixed.promotion_type(), PromotionType::BuyBundleGetGiftItems);
    }

    #[test]
    fn builder_methods_set_optional_fields() {
        let promo = Promotion::buy_bundle_get_item_discount(
            PromotionKey::default(),
            "bundle",
            None,
            MonetaryReward::PercentageOff(Percentage::from(0.10)),
        )
        .with_redemption_limit(RedemptionLimit::capped(3))
        .with_coupon_code("SPRING")
        .with_priority(-5);

        assert_eq!(promo.redemption_limit().cap(), Some(3));
        assert_eq!(promo.coupon_code(), Some("SPRING"));
        assert_eq!(promo.priority(), -5);
    }
}
