//! Coupons
//!
//! Splits promotions into included and excluded sets based on the coupon codes
//! supplied with an order. A promotion without a coupon code needs none and stays
//! included.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    fulfillment::{FulfillmentStatus, RequestedStatuses},
    promotions::{Promotion, PromotionKey, PromotionType},
    rewards::{Localization, RewardDescription},
};

/// Supplies the coupon code for every promotion of one type, overriding the code
/// configured on the promotion itself.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteCouponProvider {
    /// Promotion type this provider answers for.
    fn provider_for(&self) -> PromotionType;

    /// Current coupon code, `None` when no code is required.
    fn coupon_code(&self) -> Option<String>;
}

/// How supplied coupon codes are compared with promotion codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeComparison {
    /// Compare ignoring case, Unicode aware.
    #[default]
    CaseInsensitive,

    /// Compare byte for byte.
    Exact,
}

impl CodeComparison {
    /// Whether `supplied` matches `code`.
    pub fn matches(self, supplied: &str, code: &str) -> bool {
        match self {
            CodeComparison::CaseInsensitive => supplied
                .chars()
                .flat_map(char::to_lowercase)
                .eq(code.chars().flat_map(char::to_lowercase)),
            CodeComparison::Exact => supplied == code,
        }
    }
}

/// A promotion removed from a pass before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    promotion: PromotionKey,
    reason: FulfillmentStatus,
    description: Option<RewardDescription>,
}

impl Exclusion {
    /// Excluded promotion.
    pub fn promotion(&self) -> PromotionKey {
        self.promotion
    }

    /// Why it was excluded.
    pub fn reason(&self) -> FulfillmentStatus {
        self.reason
    }

    /// Reward description, present only when not-fulfilled outcomes were requested.
    pub fn description(&self) -> Option<&RewardDescription> {
        self.description.as_ref()
    }
}

/// Promotions under consideration for one pass.
#[derive(Debug, Clone)]
pub struct PromotionFilterContext<'p, 'a> {
    included: Vec<&'p Promotion<'a>>,
    excluded: Vec<Exclusion>,
    coupon_codes: FxHashMap<PromotionKey, String>,
    requested_statuses: RequestedStatuses,
}

impl<'p, 'a> PromotionFilterContext<'p, 'a> {
    /// Start with every promotion included.
    pub fn new(
        promotions: impl IntoIterator<Item = &'p Promotion<'a>>,
        requested_statuses: RequestedStatuses,
    ) -> Self {
        Self {
            included: promotions.into_iter().collect(),
            excluded: Vec::new(),
            coupon_codes: FxHashMap::default(),
            requested_statuses,
        }
    }

    /// Promotions still included, in their original order.
    pub fn included(&self) -> &[&'p Promotion<'a>] {
        &self.included
    }

    /// Promotions removed so far.
    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    /// Coupon code matched for `promotion`, if any.
    pub fn coupon_code(&self, promotion: PromotionKey) -> Option<&str> {
        self.coupon_codes.get(&promotion).map(String::as_str)
    }

    /// Number of promotions with a matched coupon code.
    pub fn coupon_code_count(&self) -> usize {
        self.coupon_codes.len()
    }

    /// Outcomes the caller asked to have reported.
    pub fn requested_statuses(&self) -> RequestedStatuses {
        self.requested_statuses
    }

    /// Record the coupon code that unlocked `promotion`.
    pub fn add_coupon_code(&mut self, promotion: PromotionKey, code: impl Into<String>) {
        self.coupon_codes.insert(promotion, code.into());
    }

    /// Move `promotion` from the included to the excluded set.
    ///
    /// Only that promotion is removed, even when others share its key.
    pub fn exclude_promotion(
        &mut self,
        promotion: &'p Promotion<'a>,
        reason: FulfillmentStatus,
        description: Option<RewardDescription>,
    ) {
        self.included
            .retain(|included| !std::ptr::eq(*included, promotion));

        self.excluded.push(Exclusion {
            promotion: promotion.key(),
            reason,
            description,
        });
    }

    /// Split into the included promotions, the exclusions and the matched coupon codes.
    pub fn into_parts(
        self,
    ) -> (
        Vec<&'p Promotion<'a>>,
        Vec<Exclusion>,
        FxHashMap<PromotionKey, String>,
    ) {
        (self.included, self.excluded, self.coupon_codes)
    }
}

/// Coupon-code filter for a pass.
#[derive(Default)]
pub struct CouponFilter {
    providers: FxHashMap<PromotionType, Box<dyn RemoteCouponProvider>>,
    comparison: CodeComparison,
}

impl fmt::Debug for CouponFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouponFilter")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("comparison", &self.comparison)
            .finish()
    }
}

impl CouponFilter {
    /// Create a case-insensitive filter with no remote providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how codes are compared.
    #[must_use]
    pub fn with_comparison(mut self, comparison: CodeComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Register a remote provider, replacing any earlier one for the same type.
    #[must_use]
    pub fn with_provider(mut self, provider: impl RemoteCouponProvider + 'static) -> Self {
        self.providers
            .insert(provider.provider_for(), Box::new(provider));
        self
    }

    /// Coupon code required by `promotion`, if any.
    pub fn coupon_code_for(&self, promotion: &Promotion<'_>) -> Option<String> {
        let code = match self.providers.get(&promotion.promotion_type()) {
            Some(provider) => provider.coupon_code(),
            None => promotion.coupon_code().map(str::to_string),
        };

        code.filter(|code| !code.is_empty())
    }

    /// Exclude every included promotion whose coupon code was not supplied.
    ///
    /// Matched codes are recorded on the context. Excluded promotions carry a reward
    /// description only when not-fulfilled outcomes were requested.
    pub fn filter<S: AsRef<str>>(
        &self,
        context: &mut PromotionFilterContext<'_, '_>,
        coupon_codes: &[S],
        localization: &impl Localization,
    ) {
        let included = context.included().to_vec();

        for promotion in included {
            let Some(code) = self.coupon_code_for(promotion) else {
                continue;
            };

            let supplied = coupon_codes
                .iter()
                .any(|supplied| self.comparison.matches(supplied.as_ref(), &code));

            if supplied {
                tracing::debug!(promotion = promotion.name(), "coupon code accepted");

                context.add_coupon_code(promotion.key(), code);

                continue;
            }

            tracing::debug!(promotion = promotion.name(), "coupon code required");

            let description = context
                .requested_statuses()
                .contains(RequestedStatuses::NOT_FULFILLED)
                .then(|| {
                    RewardDescription::with_status(
                        Some(promotion),
                        FulfillmentStatus::COUPON_CODE_REQUIRED,
                        localization,
                    )
                });

            context.exclude_promotion(promotion, FulfillmentStatus::COUPON_CODE_REQUIRED, description);
        }
    }
}
