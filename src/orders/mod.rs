//! Orders
//!
//! Order snapshots and the line-item aggregation that feeds condition evaluation.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::items::ItemCode;

/// Errors related to order construction or aggregation.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// A line item was given a negative quantity (code, quantity).
    #[error("Line item {0} has negative quantity {1}")]
    NegativeQuantity(ItemCode, Decimal),

    /// Summing quantities for a code overflowed the decimal range.
    #[error("Quantity overflow while summing line items for {0}")]
    QuantityOverflow(ItemCode),
}

/// A single order line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    code: ItemCode,
    quantity: Decimal,
    is_gift: bool,
}

impl LineItem {
    /// Create a purchased (non-gift) line item.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NegativeQuantity`] if `quantity` is below zero.
    pub fn new(code: impl Into<ItemCode>, quantity: Decimal) -> Result<Self, OrderError> {
        Self::with_gift_flag(code, quantity, false)
    }

    /// Create a gift line item.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NegativeQuantity`] if `quantity` is below zero.
    pub fn gift(code: impl Into<ItemCode>, quantity: Decimal) -> Result<Self, OrderError> {
        Self::with_gift_flag(code, quantity, true)
    }

    /// Create a line item with an explicit gift flag.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NegativeQuantity`] if `quantity` is below zero.
    pub fn with_gift_flag(
        code: impl Into<ItemCode>,
        quantity: Decimal,
        is_gift: bool,
    ) -> Result<Self, OrderError> {
        let code = code.into();

        if quantity < Decimal::ZERO {
            return Err(OrderError::NegativeQuantity(code, quantity));
        }

        Ok(Self {
            code,
            quantity,
            is_gift,
        })
    }

    /// Returns the entry code
    pub fn code(&self) -> &ItemCode {
        &self.code
    }

    /// Returns the quantity
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Whether this line was added as a gift.
    pub fn is_gift(&self) -> bool {
        self.is_gift
    }
}

/// Purchased quantity per code, gift lines excluded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PurchasedQuantities {
    quantities: FxHashMap<ItemCode, Decimal>,
}

impl PurchasedQuantities {
    /// Purchased quantity for `code`, zero when absent.
    pub fn quantity(&self, code: &str) -> Decimal {
        self.quantities.get(code).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether at least some quantity of `code` was purchased.
    pub fn contains(&self, code: &str) -> bool {
        self.quantity(code) > Decimal::ZERO
    }

    /// Iterate over `(code, quantity)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemCode, Decimal)> {
        self.quantities.iter().map(|(code, qty)| (code, *qty))
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Whether nothing was purchased.
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// The line items of one order form, as seen by a single evaluation pass.
#[derive(Clone, Debug, Default)]
pub struct OrderSnapshot {
    line_items: SmallVec<[LineItem; 10]>,
}

impl OrderSnapshot {
    /// Create an empty order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an order from line items.
    pub fn with_line_items(line_items: impl IntoIterator<Item = LineItem>) -> Self {
        Self {
            line_items: line_items.into_iter().collect(),
        }
    }

    /// Append a line item.
    pub fn push(&mut self, line_item: LineItem) {
        self.line_items.push(line_item);
    }

    /// Iterate over every line item, gifts included.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter()
    }

    /// Iterate over the line items that count towards promotions.
    pub fn purchased_items(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(|item| !item.is_gift())
    }

    /// Whether there is at least one non-gift line.
    pub fn has_purchased_items(&self) -> bool {
        self.purchased_items().next().is_some()
    }

    /// Get the number of line items.
    pub fn len(&self) -> usize {
        self.line_items.len()
    }

    /// Check if the order has no line items.
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Sum non-gift quantities per code.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::QuantityOverflow`] if a per-code sum leaves the decimal range.
    pub fn aggregate(&self) -> Result<PurchasedQuantities, OrderError> {
        let mut quantities: FxHashMap<ItemCode, Decimal> = FxHashMap::default();

        for item in self.purchased_items() {
            let entry = quantities.entry(item.code().clone()).or_default();

            *entry = entry
                .checked_add(item.quantity())
                .ok_or_else(|| OrderError::QuantityOverflow(item.code().clone()))?;
        }

        Ok(PurchasedQuantities { quantities })
    }
}
