//! Cosmetic Catalog
//!
//! The currency ledger does not own catalog content; callers pass a slice of
//! [`CatalogItem`] to each purchase. The shipped skin list lives here.

use serde::{Deserialize, Serialize};

/// Id of the free item every account starts with.
pub const DEFAULT_ITEM_ID: &str = "default";

/// A purchasable cosmetic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable item id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Price in coins.
    pub price: u64,
}

impl CatalogItem {
    /// Create an item.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self { id: id.into(), name: name.into(), price }
    }
}

/// Look up an item by id.
pub fn find_item<'a>(catalog: &'a [CatalogItem], id: &str) -> Option<&'a CatalogItem> {
    catalog.iter().find(|item| item.id == id)
}

/// The shipped skin catalog, cheapest first.
pub fn skin_catalog() -> Vec<CatalogItem> {
    [
        (DEFAULT_ITEM_ID, "Pulse Blue", 0),
        ("neon_green", "Neon Mint", 200),
        ("violet", "Deep Violet", 350),
        ("sunset", "Sunset Blaze", 500),
        ("rose", "Rose Gold", 500),
        ("ice", "Arctic Ice", 750),
        ("gold", "Pure Gold", 1000),
        ("rainbow", "Prismatic", 2000),
    ]
    .into_iter()
    .map(|(id, name, price)| CatalogItem::new(id, name, price))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_catalog() {
        let catalog = skin_catalog();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog[0].id, DEFAULT_ITEM_ID);
        assert_eq!(catalog[0].price, 0);
        assert!(catalog.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(find_item(&catalog, "violet").map(|i| i.price), Some(350));
        assert!(find_item(&catalog, "pack_l").is_none());
    }
}
