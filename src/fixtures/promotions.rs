//! Promotion Fixtures

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::Money;
use serde::Deserialize;

use crate::{
    catalog::ScopeRef,
    fixtures::{FixtureError, catalog::parse_price},
    promotions::{
        MonetaryReward, Promotion, PromotionCondition, PromotionKey, PromotionReward,
        PurchaseQuantity, RedemptionLimit,
    },
};

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PromotionFixture {
    /// Promotion name
    pub name: String,

    /// Evaluation priority; lower runs first
    #[serde(default)]
    pub priority: i32,

    /// Maximum redemptions per order; omitted or zero means unlimited
    #[serde(default)]
    pub redemption_limit: Option<u32>,

    /// Coupon code required to unlock the promotion
    #[serde(default)]
    pub coupon: Option<String>,

    /// Condition configuration
    pub condition: ConditionFixture,

    /// Reward configuration
    pub reward: RewardFixture,
}

/// Condition configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionFixture {
    /// Every entry of a bundle must be bought
    AllItems {
        /// Bundle reference; omitted for an unconfigured promotion
        #[serde(default)]
        bundle: Option<String>,
    },

    /// A minimum quantity must be bought from the targets
    QuantityThreshold {
        /// Category, bundle or entry references
        targets: Vec<String>,

        /// Units needed for one fulfillment
        required_quantity: Decimal,

        /// Whether sub-categories count
        #[serde(default = "default_match_recursive")]
        match_recursive: bool,
    },
}

fn default_match_recursive() -> bool {
    true
}

/// Reward configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardFixture {
    /// Percentage off each redeemed unit (e.g., "15%" or "0.15")
    Percentage {
        /// Percentage string
        value: String,
    },

    /// Fixed amount off each redeemed unit (e.g., "0.75 GBP")
    AmountOff {
        /// Amount string
        value: String,
    },

    /// Fixed price for each redeemed unit (e.g., "2.50 GBP")
    FixedPrice {
        /// Price string
        value: String,
    },

    /// Gift entries added once per order
    GiftItems {
        /// Entry codes
        #[serde(default)]
        items: Vec<String>,
    },
}

impl From<ConditionFixture> for PromotionCondition {
    fn from(fixture: ConditionFixture) -> Self {
        match fixture {
            ConditionFixture::AllItems { bundle } => PromotionCondition::AllItems {
                bundle: bundle.map(ScopeRef::from),
            },
            ConditionFixture::QuantityThreshold {
                targets,
                required_quantity,
                match_recursive,
            } => PromotionCondition::QuantityThreshold(PurchaseQuantity::new(
                targets.into_iter().map(ScopeRef::from),
                required_quantity,
                match_recursive,
            )),
        }
    }
}

impl TryFrom<RewardFixture> for PromotionReward<'_> {
    type Error = FixtureError;

    fn try_from(fixture: RewardFixture) -> Result<Self, Self::Error> {
        let money = |value: &str| {
            parse_price(value).map(|(minor_units, currency)| Money::from_minor(minor_units, currency))
        };

        Ok(match fixture {
            RewardFixture::Percentage { value } => {
                PromotionReward::Discount(MonetaryReward::PercentageOff(parse_percentage(&value)?))
            }
            RewardFixture::AmountOff { value } => {
                PromotionReward::Discount(MonetaryReward::AmountOff(money(&value)?))
            }
            RewardFixture::FixedPrice { value } => {
                PromotionReward::Discount(MonetaryReward::FixedPrice(money(&value)?))
            }
            RewardFixture::GiftItems { items } => {
                PromotionReward::GiftItems(items.into_iter().map(ScopeRef::from).collect())
            }
        })
    }
}

impl PromotionFixture {
    /// Convert to a `Promotion` with the given key
    ///
    /// # Errors
    ///
    /// Returns an error if the reward configuration is invalid.
    pub fn try_into_promotion(self, key: PromotionKey) -> Result<Promotion<'static>, FixtureError> {
        let mut promotion = Promotion::new(
            key,
            self.name,
            self.condition.into(),
            self.reward.try_into()?,
        )
        .with_priority(self.priority)
        .with_redemption_limit(RedemptionLimit::from_count(self.redemption_limit));

        if let Some(coupon) = self.coupon {
            promotion = promotion.with_coupon_code(coupon);
        }

        Ok(promotion)
    }
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let (number, scale) = match trimmed.strip_suffix('%') {
        Some(percent) => (percent.trim(), 100.0),
        None => (trimmed, 1.0),
    };

    let value = number
        .parse::<f64>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    if !value.is_finite() {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(value / scale))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::promotions::PromotionType;

    use super::*;

    #[test]
    fn promotion_fixture_rejects_unknown_condition_type() {
        let yaml = r"
name: Test
condition:
  type: buy_anything
reward:
  type: percentage
  value: 10%
";
        let result: Result<PromotionFixture, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }

    #[test]
    fn bundle_discount_fixture_converts() -> TestResult {
        let yaml = r"
name: Breakfast bundle
priority: 2
redemption_limit: 3
coupon: MORNING
condition:
  type: all_items
  bundle: breakfast
reward:
  type: amount_off
  value: 0.75 GBP
";
        let fixture: PromotionFixture = serde_norway::from_str(yaml)?;
        let promotion = fixture.try_into_promotion(PromotionKey::default())?;

        assert_eq!(promotion.name(), "Breakfast bundle");
        assert_eq!(promotion.priority(), 2);
        assert_eq!(promotion.redemption_limit().cap(), Some(3));
        assert_eq!(promotion.coupon_code(), Some("MORNING"));
        assert_eq!(
            promotion.promotion_type(),
            PromotionType::BuyBundleGetItemDiscount
        );
        assert!(matches!(
            promotion.reward(),
            PromotionReward::Discount(MonetaryReward::AmountOff(money))
                if money.to_minor_units() == 75 && money.currency() == GBP
        ));

        Ok(())
    }

    #[test]
    fn gift_fixture_defaults_to_recursive_matching() -> TestResult {
        let yaml = r"
name: Tea gift
condition:
  type: quantity_threshold
  targets: [teas]
  required_quantity: 3
reward:
  type: gift_items
  items: [MUG]
";
        let fixture: PromotionFixture = serde_norway::from_str(yaml)?;
        let promotion = fixture.try_into_promotion(PromotionKey::default())?;

        let PromotionCondition::QuantityThreshold(threshold) = promotion.condition() else {
            return Err("expected a quantity threshold".into());
        };

        assert!(threshold.match_recursive());
        assert_eq!(threshold.required_quantity(), Decimal::from(3));
        assert_eq!(promotion.redemption_limit(), RedemptionLimit::Unlimited);
        assert_eq!(
            promotion.promotion_type(),
            PromotionType::BuyProductGetGiftItems
        );

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> TestResult {
        assert_eq!(parse_percentage("15%")?, Percentage::from(0.15));
        assert_eq!(parse_percentage("0.15")?, Percentage::from(0.15));
        assert_eq!(parse_percentage("  100%  ")?, Percentage::from(1.0));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        assert!(matches!(
            parse_percentage("invalid"),
            Err(FixtureError::InvalidPercentage(_))
        ));
        assert!(matches!(
            parse_percentage("NaN"),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }
}
