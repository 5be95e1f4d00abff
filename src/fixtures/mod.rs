//! Fixtures
//!
//! A fixture file is one YAML document with three optional sections:
//!
//! ```yaml
//! catalog:
//!   entries:
//!     A: { name: Apple, price: 0.50 GBP }
//!   bundles:
//!     fruit-bowl: [A]
//! promotions:
//!   bowl-deal:
//!     name: Fruit bowl deal
//!     condition: { type: all_items, bundle: fruit-bowl }
//!     reward: { type: percentage, value: 10% }
//! orders:
//!   basic:
//!     lines:
//!       - { code: A, quantity: 1 }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    catalog::StaticCatalog,
    fixtures::{catalog::CatalogFixture, orders::OrderFixture, promotions::PromotionFixture},
    orders::{OrderError, OrderSnapshot},
    promotions::{Promotion, PromotionKey},
    rewards::Localization,
    validation::{ValidationError, validate},
};

pub mod catalog;
pub mod orders;
pub mod promotions;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Invalid order line
    #[error("Invalid order: {0}")]
    Order(#[from] OrderError),
}

/// Raw fixture document
#[derive(Debug, Default, Deserialize)]
pub struct FixtureFile {
    /// Catalog section
    #[serde(default)]
    pub catalog: CatalogFixture,

    /// Map of promotion key -> promotion fixture
    #[serde(default)]
    pub promotions: BTreeMap<String, PromotionFixture>,

    /// Map of order name -> order fixture
    #[serde(default)]
    pub orders: BTreeMap<String, OrderFixture>,
}

/// Fixture
#[derive(Debug, Default)]
pub struct Fixture {
    catalog: StaticCatalog,

    /// Fixture key for every promotion, keyed by the generated promotion key
    promotion_meta: SlotMap<PromotionKey, String>,

    /// Fixture key -> generated promotion key
    promotion_keys: FxHashMap<String, PromotionKey>,

    /// Promotions in fixture key order
    promotions: Vec<Promotion<'static>>,

    orders: BTreeMap<String, OrderSnapshot>,
}

impl Fixture {
    /// Load a fixture from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any definition is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Load a fixture from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or if any definition is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let file: FixtureFile = serde_norway::from_str(yaml)?;

        Self::try_from(file)
    }

    /// Return the catalog
    pub fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }

    /// Return every promotion, in fixture key order
    pub fn promotions(&self) -> &[Promotion<'static>] {
        &self.promotions
    }

    /// Get a promotion by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if no promotion has that key.
    pub fn promotion(&self, key: &str) -> Result<&Promotion<'static>, FixtureError> {
        let promotion_key = self
            .promotion_keys
            .get(key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))?;

        self.promotions
            .iter()
            .find(|promotion| promotion.key() == *promotion_key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Fixture key of a loaded promotion
    pub fn promotion_fixture_key(&self, key: PromotionKey) -> Option<&str> {
        self.promotion_meta.get(key).map(String::as_str)
    }

    /// Get an order by name
    ///
    /// # Errors
    ///
    /// Returns an error if no order has that name.
    pub fn order(&self, name: &str) -> Result<&OrderSnapshot, FixtureError> {
        self.orders
            .get(name)
            .ok_or_else(|| FixtureError::OrderNotFound(name.to_string()))
    }

    /// Names of every order, sorted
    pub fn order_names(&self) -> impl Iterator<Item = &str> {
        self.orders.keys().map(String::as_str)
    }

    /// Run the authoring-time validators over every promotion
    pub fn validate(&self, localization: &impl Localization) -> Vec<(&str, ValidationError)> {
        self.promotions
            .iter()
            .flat_map(|promotion| {
                let key = self.promotion_fixture_key(promotion.key()).unwrap_or_default();

                validate(promotion, localization)
                    .into_iter()
                    .map(move |error| (key, error))
            })
            .collect()
    }
}

impl TryFrom<FixtureFile> for Fixture {
    type Error = FixtureError;

    fn try_from(file: FixtureFile) -> Result<Self, Self::Error> {
        let mut fixture = Fixture {
            catalog: StaticCatalog::try_from(file.catalog)?,
            ..Fixture::default()
        };

        for (key, promotion_fixture) in file.promotions {
            let promotion_key = fixture.promotion_meta.insert(key.clone());
            let promotion = promotion_fixture.try_into_promotion(promotion_key)?;

            fixture.promotions.push(promotion);
            fixture.promotion_keys.insert(key, promotion_key);
        }

        for (name, order_fixture) in file.orders {
            fixture
                .orders
                .insert(name, OrderSnapshot::try_from(order_fixture)?);
        }

        Ok(fixture)
    }
}
