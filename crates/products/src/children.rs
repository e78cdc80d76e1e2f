use serde::{Deserialize, Serialize};

use varistore_core::{ProductId, ValueObject};

/// Child variations of a parent product.
///
/// `all` follows manual sort order (ties by store order). `visible` is either
/// identical to `all` or the in-stock subset when out-of-stock items are
/// hidden. The listing is always computed wholesale; there are no partial
/// updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenListing {
    pub all: Vec<ProductId>,
    pub visible: Vec<ProductId>,
}

impl ChildrenListing {
    /// Listing where every child is visible.
    pub fn unfiltered(all: Vec<ProductId>) -> Self {
        Self {
            visible: all.clone(),
            all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl ValueObject for ChildrenListing {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoding_requires_both_sequences() {
        let ok: Result<ChildrenListing, _> = serde_json::from_str(r#"{"all":[1,2],"visible":[2]}"#);
        assert_eq!(
            ok.unwrap(),
            ChildrenListing {
                all: vec![ProductId::new(1), ProductId::new(2)],
                visible: vec![ProductId::new(2)],
            }
        );

        let missing: Result<ChildrenListing, _> = serde_json::from_str(r#"{"all":[1,2]}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn unfiltered_listing_shows_everything() {
        let listing = ChildrenListing::unfiltered(vec![ProductId::new(3), ProductId::new(1)]);
        assert_eq!(listing.all, listing.visible);
        assert!(!listing.is_empty());
        assert!(ChildrenListing::default().is_empty());
    }
}
