//! Promokit prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, GroupKind, ScopeRef, StaticCatalog, TargetSet},
    coupons::{CodeComparison, CouponFilter, Exclusion, PromotionFilterContext, RemoteCouponProvider},
    engine::{PassResult, PromotionEngine},
    fixtures::{Fixture, FixtureError},
    fulfillment::{ConditionFulfillment, FulfillmentStatus, RequestedStatuses},
    items::{ItemCode, ItemMetadata},
    ledger::{AffectedEntries, QuantityLedger},
    orders::{LineItem, OrderError, OrderSnapshot, PurchasedQuantities},
    processors::PromotionProcessor,
    promotions::{
        DiscountError, MonetaryReward, Promotion, PromotionCondition, PromotionKey,
        PromotionReward, PromotionType, PurchaseQuantity, RedemptionLimit,
    },
    redemptions::{EvaluationResult, RedemptionDescription},
    report::{ReportError, RewardReport},
    rewards::{Localization, RewardDescription, RewardType, StaticLocalization},
    validation::{Severity, ValidationError, ValidationKind, validate},
};
