//! Catalog
//!
//! Offer, brand and category master data the engine resolves discount scopes against.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

/// Offer identifier
pub type OfferId = u64;

/// Product identifier
pub type ProductId = u64;

/// Brand identifier
pub type BrandId = u64;

/// Category identifier
pub type CategoryId = u64;

/// Merchant identifier
pub type MerchantId = u64;

/// A sellable offer and the catalog entities it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Offer {
    /// Offer id
    pub id: OfferId,

    /// Product the offer sells, absent for event tickets
    #[serde(default)]
    pub product_id: Option<ProductId>,

    /// Brand of the product
    #[serde(default)]
    pub brand_id: Option<BrandId>,

    /// Leaf category of the product
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Merchant selling the offer
    #[serde(default)]
    pub merchant_id: Option<MerchantId>,
}

/// A node of the category tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Category id
    pub id: CategoryId,

    /// Parent category, `None` for roots
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Catalog master data for one calculation.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    offers: FxHashMap<OfferId, Offer>,
    brands: Vec<BrandId>,
    categories: FxHashMap<CategoryId, Category>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an offer.
    #[must_use]
    pub fn with_offer(mut self, offer: Offer) -> Self {
        self.insert_offer(offer);
        self
    }

    /// Add a known brand.
    #[must_use]
    pub fn with_brand(mut self, brand: BrandId) -> Self {
        self.insert_brand(brand);
        self
    }

    /// Add a category node.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.insert_category(category);
        self
    }

    /// Add or replace an offer.
    pub fn insert_offer(&mut self, offer: Offer) {
        self.offers.insert(offer.id, offer);
    }

    /// Register a known brand.
    pub fn insert_brand(&mut self, brand: BrandId) {
        if !self.brands.contains(&brand) {
            self.brands.push(brand);
        }
    }

    /// Add or replace a category node.
    pub fn insert_category(&mut self, category: Category) {
        self.categories.insert(category.id, category);
    }

    /// Look up an offer.
    pub fn offer(&self, id: OfferId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    /// All known brands, in registration order.
    pub fn brand_ids(&self) -> &[BrandId] {
        &self.brands
    }

    /// All known categories.
    pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.categories.keys().copied()
    }

    /// Whether `category` is one of `roots` or descends from one of them.
    pub fn descends_from(&self, category: CategoryId, roots: &FxHashSet<CategoryId>) -> bool {
        let mut current = Some(category);
        let mut visited = FxHashSet::default();

        while let Some(id) = current {
            if roots.contains(&id) {
                return true;
            }

            // Guard against cycles in malformed trees.
            if !visited.insert(id) {
                return false;
            }

            current = self
                .categories
                .get(&id)
                .and_then(|category| category.parent_id);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Catalog {
        Catalog::new()
            .with_category(Category {
                id: 1,
                parent_id: None,
            })
            .with_category(Category {
                id: 2,
                parent_id: Some(1),
            })
            .with_category(Category {
                id: 3,
                parent_id: Some(2),
            })
            .with_category(Category {
                id: 9,
                parent_id: None,
            })
    }

    #[test]
    fn descends_from_walks_parents() {
        let catalog = tree();
        let roots = FxHashSet::from_iter([1]);

        assert!(catalog.descends_from(3, &roots));
        assert!(catalog.descends_from(1, &roots));
        assert!(!catalog.descends_from(9, &roots));
    }

    #[test]
    fn descends_from_unknown_category_only_matches_itself() {
        let catalog = tree();

        assert!(catalog.descends_from(42, &FxHashSet::from_iter([42])));
        assert!(!catalog.descends_from(42, &FxHashSet::from_iter([1])));
    }

    #[test]
    fn descends_from_terminates_on_cycles() {
        let catalog = Catalog::new()
            .with_category(Category {
                id: 1,
                parent_id: Some(2),
            })
            .with_category(Category {
                id: 2,
                parent_id: Some(1),
            });

        assert!(!catalog.descends_from(1, &FxHashSet::from_iter([7])));
    }

    #[test]
    fn brands_are_deduplicated() {
        let catalog = Catalog::new().with_brand(4).with_brand(4).with_brand(5);

        assert_eq!(catalog.brand_ids(), &[4, 5]);
    }
}
