//! Promotion Rewards
//!
//! What a promotion gives back once its condition holds: a monetary discount on each
//! redeemed unit, or a fixed set of gift entries.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::catalog::ScopeRef;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Monetary reward applied to each redeemed unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MonetaryReward<'a> {
    /// Apply a percentage discount (e.g., "25% off")
    PercentageOff(Percentage),

    /// Subtract a fixed amount from the unit price (e.g., "£2 off")
    AmountOff(Money<'a, Currency>),

    /// Replace the unit price with a fixed amount (e.g., "£5 each")
    FixedPrice(Money<'a, Currency>),
}

impl<'a> MonetaryReward<'a> {
    /// Calculate the discounted price for one unit at `price`.
    ///
    /// The result is never below zero.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Percentage calculation overflows or cannot be safely represented.
    /// - Money arithmetic fails (e.g., currency mismatch).
    pub fn discounted_price(
        &self,
        price: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let discounted_minor = match self {
            MonetaryReward::PercentageOff(pct) => {
                let original_minor = price.to_minor_units();

                original_minor
                    .checked_sub(percent_of_minor(pct, original_minor)?)
                    .ok_or(DiscountError::PercentConversion)?
            }
            MonetaryReward::AmountOff(amount) => price.sub(*amount)?.to_minor_units(),
            MonetaryReward::FixedPrice(amount) => {
                if amount.currency() != price.currency() {
                    return Err(DiscountError::Money(MoneyError::CurrencyMismatch {
                        expected: price.currency().iso_alpha_code,
                        actual: amount.currency().iso_alpha_code,
                    }));
                }

                amount.to_minor_units()
            }
        };

        Ok(Money::from_minor(0.max(discounted_minor), price.currency()))
    }
}

/// Calculate a percentage of an amount in minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the result cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Reward half of a promotion definition.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionReward<'a> {
    /// Discount each redeemed unit of the matched entries.
    Discount(MonetaryReward<'a>),

    /// Attach these gift entries, one unit each.
    GiftItems(SmallVec<[ScopeRef; 4]>),
}

impl PromotionReward<'_> {
    /// Whether this is a gift reward with no configured gift entries.
    pub fn is_empty_gift(&self) -> bool {
        matches!(self, PromotionReward::GiftItems(gifts) if gifts.is_empty())
    }
}
