//! Catalog Fixtures

use std::collections::BTreeMap;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    catalog::{GroupKind, ScopeRef, StaticCatalog},
    fixtures::FixtureError,
    items::{ItemCode, ItemMetadata},
};

/// Catalog section of a fixture file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFixture {
    /// Map of entry code -> entry fixture
    #[serde(default)]
    pub entries: BTreeMap<String, EntryFixture>,

    /// Map of bundle reference -> ordered member references
    #[serde(default)]
    pub bundles: BTreeMap<String, Vec<String>>,

    /// Map of category reference -> ordered children (entries or sub-categories)
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Entry Fixture
#[derive(Debug, Deserialize)]
pub struct EntryFixture {
    /// Display name
    pub name: String,

    /// Unit price (e.g., "2.99 GBP")
    #[serde(default)]
    pub price: Option<String>,
}

impl TryFrom<CatalogFixture> for StaticCatalog {
    type Error = FixtureError;

    fn try_from(fixture: CatalogFixture) -> Result<Self, Self::Error> {
        let mut catalog = StaticCatalog::new();

        for (code, entry) in fixture.entries {
            let price = entry
                .price
                .as_deref()
                .map(parse_price)
                .transpose()?
                .map(|(minor_units, currency)| Money::from_minor(minor_units, currency));

            catalog.add_entry(ItemMetadata::new(ItemCode::new(code), entry.name, price));
        }

        for (scope, members) in fixture.bundles {
            catalog.add_group(scope, GroupKind::Bundle, members.into_iter().map(ScopeRef::from));
        }

        for (scope, children) in fixture.categories {
            catalog.add_group(
                scope,
                GroupKind::Category,
                children.into_iter().map(ScopeRef::from),
            );
        }

        Ok(catalog)
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}
