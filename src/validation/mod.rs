//! Validation
//!
//! Authoring-time checks that catch promotions which could never be fulfilled.

use std::fmt;

use rust_decimal::Decimal;

use crate::{
    promotions::{Promotion, PromotionCondition},
    rewards::Localization,
};

/// Resource key for a bundle promotion without a bundle.
pub const BUNDLE_REQUIRED_KEY: &str = "/commerce/validation/buyfrombundlerequired";

/// Resource key for a gift promotion without gift items.
pub const GIFT_ITEM_REQUIRED_KEY: &str = "/commerce/validation/nogiftitem";

/// Resource key for a threshold below one unit.
pub const REQUIRED_QUANTITY_KEY: &str = "/commerce/validation/requiredquantity";

/// How serious a validation error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The promotion must not be saved.
    Error,

    /// The promotion may be saved but is likely misconfigured.
    Warning,
}

/// Stage at which a validation error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Raised when the promotion is stored.
    Storage,
}

/// A single configuration defect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    severity: Severity,
    kind: ValidationKind,
    property: &'static str,
    message: String,
}

impl ValidationError {
    fn storage(property: &'static str, key: &str, localization: &impl Localization) -> Self {
        Self {
            severity: Severity::Error,
            kind: ValidationKind::Storage,
            property,
            message: localization
                .string(key)
                .unwrap_or_else(|| key.to_string()),
        }
    }

    /// Return the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Return the kind.
    pub fn kind(&self) -> ValidationKind {
        self.kind
    }

    /// Name of the offending property.
    pub fn property(&self) -> &str {
        self.property
    }

    /// Localized message, or the resource key when no text is available.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Validate a promotion definition.
pub fn validate(promotion: &Promotion<'_>, localization: &impl Localization) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match promotion.condition() {
        PromotionCondition::AllItems { bundle: None } => {
            errors.push(ValidationError::storage(
                "Bundle",
                BUNDLE_REQUIRED_KEY,
                localization,
            ));
        }
        PromotionCondition::QuantityThreshold(threshold)
            if threshold.required_quantity() < Decimal::ONE =>
        {
            errors.push(ValidationError::storage(
                "Condition",
                REQUIRED_QUANTITY_KEY,
                localization,
            ));
        }
        PromotionCondition::AllItems { .. } | PromotionCondition::QuantityThreshold(_) => {}
    }

    if promotion.reward().is_empty_gift() {
        errors.push(ValidationError::storage(
            "GiftItems",
            GIFT_ITEM_REQUIRED_KEY,
            localization,
        ));
    }

    errors
}
