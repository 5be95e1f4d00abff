//! Catalog
//!
//! Resolves bundle, category and entry references into flat [`TargetSet`]s. The
//! catalog is a read-only collaborator; it never fails on a missing reference, an
//! unresolvable scope simply has no members.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::items::ItemMetadata;

pub mod targets;

pub use targets::TargetSet;

/// Opaque reference to a bundle, category or entry in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeRef(String);

impl ScopeRef {
    /// Create a new scope reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for ScopeRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// Read-only catalog lookups used during evaluation.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    /// Resolve a scope into the flat set of entry codes it covers.
    ///
    /// Sub-groups are expanded only when `match_recursive` is set. Unknown references
    /// resolve to an empty set.
    fn resolve_members(&self, scope: &ScopeRef, match_recursive: bool) -> TargetSet;

    /// Look up metadata for a single entry.
    fn resolve_item(&self, code: &str) -> Option<ItemMetadata<'static>>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn resolve_members(&self, scope: &ScopeRef, match_recursive: bool) -> TargetSet {
        (**self).resolve_members(scope, match_recursive)
    }

    fn resolve_item(&self, code: &str) -> Option<ItemMetadata<'static>> {
        (**self).resolve_item(code)
    }
}

/// Kind of grouping node in a [`StaticCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// A bundle of entries sold together.
    Bundle,

    /// A browsing category.
    Category,
}

#[derive(Clone, Debug)]
enum CatalogNode {
    Entry(ItemMetadata<'static>),
    Group {
        kind: GroupKind,
        children: SmallVec<[ScopeRef; 8]>,
    },
}

/// In-memory catalog keyed by scope reference.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    nodes: FxHashMap<ScopeRef, CatalogNode>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; its scope reference is its code.
    pub fn add_entry(&mut self, metadata: ItemMetadata<'static>) -> &mut Self {
        let scope = ScopeRef::new(metadata.code().as_str());

        self.nodes.insert(scope, CatalogNode::Entry(metadata));

        self
    }

    /// Add a bundle or category with ordered children. Children may be entries or other groups.
    pub fn add_group(
        &mut self,
        scope: impl Into<ScopeRef>,
        kind: GroupKind,
        children: impl IntoIterator<Item = ScopeRef>,
    ) -> &mut Self {
        self.nodes.insert(
            scope.into(),
            CatalogNode::Group {
                kind,
                children: children.into_iter().collect(),
            },
        );

        self
    }

    /// Return the kind of a group, if `scope` refers to one.
    pub fn group_kind(&self, scope: &ScopeRef) -> Option<GroupKind> {
        match self.nodes.get(scope) {
            Some(CatalogNode::Group { kind, .. }) => Some(*kind),
            _ => None,
        }
    }

    /// Number of entries and groups.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_members<'s>(
        &'s self,
        scope: &'s ScopeRef,
        match_recursive: bool,
        depth: usize,
        visited: &mut FxHashSet<&'s ScopeRef>,
        out: &mut TargetSet,
    ) {
        if !visited.insert(scope) {
            return;
        }

        match self.nodes.get(scope) {
            Some(CatalogNode::Entry(metadata)) => {
                out.insert(metadata.code().clone());
            }
            Some(CatalogNode::Group { children, .. }) => {
                for child in children {
                    match self.nodes.get(child) {
                        Some(CatalogNode::Entry(metadata)) => {
                            out.insert(metadata.code().clone());
                        }
                        Some(CatalogNode::Group { .. }) if match_recursive => {
                            self.collect_members(child, match_recursive, depth + 1, visited, out);
                        }
                        Some(CatalogNode::Group { .. }) | None => {}
                    }
                }
            }
            None => {
                tracing::trace!(scope = %scope, depth, "scope not found in catalog");
            }
        }
    }
}

impl Catalog for StaticCatalog {
    fn resolve_members(&self, scope: &ScopeRef, match_recursive: bool) -> TargetSet {
        let mut out = TargetSet::empty();
        let mut visited = FxHashSet::default();

        self.collect_members(scope, match_recursive, 0, &mut visited, &mut out);

        out
    }

    fn resolve_item(&self, code: &str) -> Option<ItemMetadata<'static>> {
        match self.nodes.get(&ScopeRef::new(code)) {
            Some(CatalogNode::Entry(metadata)) => Some(metadata.clone()),
            _ => None,
        }
    }
}
