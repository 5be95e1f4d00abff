//! Promotion Redemption Limits

use std::num::NonZeroU32;

/// Maximum number of times one promotion may redeem within a single order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedemptionLimit {
    /// No per-order cap.
    #[default]
    Unlimited,

    /// At most this many redemptions per order.
    Capped(NonZeroU32),
}

impl RedemptionLimit {
    /// Create a limit from an optional count. `None` and zero both mean unlimited,
    /// matching how an unset limit is stored by promotion authoring tools.
    #[must_use]
    pub fn from_count(count: Option<u32>) -> Self {
        count
            .and_then(NonZeroU32::new)
            .map_or(Self::Unlimited, Self::Capped)
    }

    /// Create a capped limit. A zero cap is treated as unlimited.
    #[must_use]
    pub fn capped(limit: u32) -> Self {
        Self::from_count(Some(limit))
    }

    /// Return the cap, if any.
    #[must_use]
    pub const fn cap(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Capped(limit) => Some(limit.get()),
        }
    }

    /// Apply this limit to a requested number of redemptions.
    #[must_use]
    pub fn clamp(&self, requested: u32) -> u32 {
        self.cap().map_or(requested, |cap| requested.min(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_does_not_clamp() {
        let limit = RedemptionLimit::Unlimited;

        assert_eq!(limit.cap(), None);
        assert_eq!(limit.clamp(1_000), 1_000);
    }

    #[test]
    fn capped_limit_clamps_requests() {
        let limit = RedemptionLimit::capped(2);

        assert_eq!(limit.cap(), Some(2));
        assert_eq!(limit.clamp(5), 2);
        assert_eq!(limit.clamp(1), 1);
    }

    #[test]
    fn zero_or_missing_count_is_unlimited() {
        assert_eq!(RedemptionLimit::from_count(None), RedemptionLimit::Unlimited);
        assert_eq!(RedemptionLimit::capped(0), RedemptionLimit::Unlimited);
    }
}
