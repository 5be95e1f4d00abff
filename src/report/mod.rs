//! Report
//!
//! Tabulates the rewards of one evaluation pass, pricing each redemption against the
//! catalog so the savings can be shown.

use std::io;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    catalog::Catalog,
    engine::PassResult,
    promotions::{DiscountError, Promotion, PromotionKey, PromotionReward},
    redemptions::RedemptionDescription,
};

/// Errors that can occur when building or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Wrapper for discount calculation errors.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// A price multiplied by a quantity did not fit in minor units.
    #[error("Price overflow for {0}")]
    PriceOverflow(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One table row.
#[derive(Debug, Clone)]
pub struct ReportRow<'a> {
    promotion: String,
    status: String,
    detail: String,
    base_price: Option<Money<'a, Currency>>,
    final_price: Option<Money<'a, Currency>>,
}

impl<'a> ReportRow<'a> {
    /// Promotion name.
    pub fn promotion(&self) -> &str {
        &self.promotion
    }

    /// Status text.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Redeemed items, or the status description when nothing was redeemed.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Savings for this row, when it could be priced.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the prices are in different currencies.
    pub fn savings(&self) -> Result<Option<Money<'a, Currency>>, MoneyError> {
        match (self.base_price, self.final_price) {
            (Some(base), Some(final_price)) => base.sub(final_price).map(Some),
            _ => Ok(None),
        }
    }
}

/// Tabulated rewards of one pass.
#[derive(Debug, Clone)]
pub struct RewardReport<'a> {
    rows: Vec<ReportRow<'a>>,
    total_savings: Option<Money<'a, Currency>>,
}

impl<'a> RewardReport<'a> {
    /// Build a report for `pass`, looking promotions up in `promotions` and prices in
    /// `catalog`. Entries without a price are listed but not priced.
    ///
    /// # Errors
    ///
    /// Returns an error if prices cannot be combined or discounted.
    pub fn build(
        pass: &PassResult,
        promotions: &[Promotion<'a>],
        catalog: &impl Catalog,
    ) -> Result<Self, ReportError> {
        let find = |key: Option<PromotionKey>| {
            key.and_then(|key| promotions.iter().find(|promotion| promotion.key() == key))
        };

        let mut rows = Vec::new();

        for reward in pass.rewards() {
            let promotion = find(reward.promotion());
            let name = promotion.map_or_else(|| "Unknown".to_string(), |p| p.name().to_string());

            if reward.redemptions().is_empty() {
                rows.push(ReportRow {
                    promotion: name,
                    status: reward.status().to_string(),
                    detail: reward.description().to_string(),
                    base_price: None,
                    final_price: None,
                });

                continue;
            }

            for (index, redemption) in reward.redemptions().iter().enumerate() {
                let (base_price, final_price) = match promotion {
                    Some(promotion) => price_redemption(redemption, promotion, catalog)?,
                    None => (None, None),
                };

                rows.push(ReportRow {
                    promotion: format!("{name} #{}", index + 1),
                    status: reward.status().to_string(),
                    detail: describe_redemption(redemption),
                    base_price,
                    final_price,
                });
            }
        }

        for exclusion in pass.exclusions() {
            let promotion = find(Some(exclusion.promotion()));

            rows.push(ReportRow {
                promotion: promotion
                    .map_or_else(|| "Unknown".to_string(), |p| p.name().to_string()),
                status: exclusion.reason().to_string(),
                detail: exclusion
                    .description()
                    .map(|description| description.description().to_string())
                    .unwrap_or_default(),
                base_price: None,
                final_price: None,
            });
        }

        let mut total_savings: Option<Money<'a, Currency>> = None;

        for row in &rows {
            if let Some(savings) = row.savings()? {
                total_savings = Some(match total_savings {
                    Some(total) => total.add(savings)?,
                    None => savings,
                });
            }
        }

        Ok(Self {
            rows,
            total_savings,
        })
    }

    /// Return the rows.
    pub fn rows(&self) -> &[ReportRow<'a>] {
        &self.rows
    }

    /// Total savings across every priced row.
    pub fn total_savings(&self) -> Option<Money<'a, Currency>> {
        self.total_savings
    }

    /// Write the report as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let mut builder = Builder::default();

        builder.push_record([
            "Promotion",
            "Status",
            "Items",
            "Base Price",
            "Final Price",
            "Savings",
        ]);

        for row in &self.rows {
            let money = |money: Option<Money<'a, Currency>>| {
                money.map_or_else(|| "-".to_string(), |money| money.to_string())
            };

            builder.push_record([
                row.promotion.clone(),
                row.status.clone(),
                row.detail.clone(),
                money(row.base_price),
                money(row.final_price),
                money(row.savings()?),
            ]);
        }

        let mut table = builder.build();

        table.with(Theme::from(Style::modern_rounded()));
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..6), Alignment::right());

        writeln!(out, "\n{table}")?;

        match self.total_savings {
            Some(savings) => writeln!(out, " Total savings: {savings}\n")?,
            None => writeln!(out, " Total savings: -\n")?,
        }

        Ok(())
    }
}

fn describe_redemption(redemption: &RedemptionDescription) -> String {
    redemption
        .iter()
        .map(|(code, quantity)| format!("{code} x{}", quantity.normalize()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Base and final price of everything a redemption consumed, `None` when any entry
/// has no price.
fn price_redemption<'a>(
    redemption: &RedemptionDescription,
    promotion: &Promotion<'a>,
    catalog: &impl Catalog,
) -> Result<(Option<Money<'a, Currency>>, Option<Money<'a, Currency>>), ReportError> {
    let mut base_total: Option<Money<'a, Currency>> = None;
    let mut final_total: Option<Money<'a, Currency>> = None;

    for (code, quantity) in redemption.iter() {
        let Some(unit_price) = catalog
            .resolve_item(code.as_str())
            .and_then(|item| item.price().copied())
        else {
            return Ok((None, None));
        };

        let unit_final = match promotion.reward() {
            PromotionReward::Discount(discount) => discount.discounted_price(&unit_price)?,
            PromotionReward::GiftItems(_) => Money::from_minor(0, unit_price.currency()),
        };

        let base = scale(&unit_price, quantity, code.as_str())?;
        let final_price = scale(&unit_final, quantity, code.as_str())?;

        base_total = Some(match base_total {
            Some(total) => total.add(base)?,
            None => base,
        });

        final_total = Some(match final_total {
            Some(total) => total.add(final_price)?,
            None => final_price,
        });
    }

    Ok((base_total, final_total))
}

fn scale<'a>(
    unit: &Money<'a, Currency>,
    quantity: Decimal,
    code: &str,
) -> Result<Money<'a, Currency>, ReportError> {
    let minor = Decimal::from(unit.to_minor_units())
        .checked_mul(quantity)
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_i64())
        .ok_or_else(|| ReportError::PriceOverflow(code.to_string()))?;

    Ok(Money::from_minor(minor, unit.currency()))
}
