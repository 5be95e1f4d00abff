//! Order Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    orders::{LineItem, OrderSnapshot},
};

/// Order fixture from YAML
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Ordered line items
    pub lines: Vec<LineItemFixture>,
}

/// Line Item Fixture
#[derive(Debug, Deserialize)]
pub struct LineItemFixture {
    /// Entry code
    pub code: String,

    /// Quantity ordered
    pub quantity: Decimal,

    /// Whether the line was added as a gift
    #[serde(default)]
    pub gift: bool,
}

impl TryFrom<OrderFixture> for OrderSnapshot {
    type Error = FixtureError;

    fn try_from(fixture: OrderFixture) -> Result<Self, Self::Error> {
        let lines = fixture
            .lines
            .into_iter()
            .map(|line| LineItem::with_gift_flag(line.code, line.quantity, line.gift))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderSnapshot::with_line_items(lines))
    }
}
