//! Promokit
//!
//! Promokit evaluates commerce promotions against an order snapshot: it decides whether each
//! promotion's condition is met, consumes order quantities through a shared ledger, and
//! describes the redemptions and rewards that result.

pub mod catalog;
pub mod coupons;
pub mod engine;
pub mod fixtures;
pub mod fulfillment;
pub mod items;
pub mod ledger;
pub mod orders;
pub mod prelude;
pub mod processors;
pub mod promotions;
pub mod redemptions;
pub mod report;
pub mod rewards;
pub mod validation;
