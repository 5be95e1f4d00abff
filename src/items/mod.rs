//! Items

use std::{borrow::Borrow, fmt};

use rusty_money::{Money, iso::Currency};

/// Catalog entry code, as carried on order line items.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCode(String);

impl ItemCode {
    /// Create a new item code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Return the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for ItemCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Catalog metadata for a single entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemMetadata<'a> {
    code: ItemCode,
    name: String,
    price: Option<Money<'a, Currency>>,
}

impl<'a> ItemMetadata<'a> {
    /// Create metadata for an entry.
    pub fn new(code: ItemCode, name: impl Into<String>, price: Option<Money<'a, Currency>>) -> Self {
        Self {
            code,
            name: name.into(),
            price,
        }
    }

    /// Returns the entry code
    pub fn code(&self) -> &ItemCode {
        &self.code
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the list price, if the catalog has one.
    pub fn price(&self) -> Option<&Money<'a, Currency>> {
        self.price.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use rustc_hash::FxHashMap;

    use super::*;

    #[test]
    fn item_code_borrows_as_str_for_map_lookups() {
        let mut map = FxHashMap::default();
        map.insert(ItemCode::new("SKU-1"), 3);

        assert_eq!(map.get("SKU-1"), Some(&3));
    }

    #[test]
    fn blank_codes_are_detected() {
        assert!(ItemCode::new("  ").is_blank());
        assert!(!ItemCode::new("A").is_blank());
    }

    #[test]
    fn metadata_accessors_return_constructor_values() {
        let meta = ItemMetadata::new(
            ItemCode::from("TEA"),
            "Earl Grey",
            Some(Money::from_minor(350, GBP)),
        );

        assert_eq!(meta.code().as_str(), "TEA");
        assert_eq!(meta.name(), "Earl Grey");
        assert_eq!(meta.price(), Some(&Money::from_minor(350, GBP)));
    }
}
