//! Badge catalog value objects.
//!
//! Badges are immutable reference data: the catalog is built once at
//! process start and injected wherever unlock checks are needed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::BadgeId;

/// How rare a badge is, for display ordering and flair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl fmt::Display for BadgeRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Rare => write!(f, "rare"),
            Self::Epic => write!(f, "epic"),
            Self::Legendary => write!(f, "legendary"),
        }
    }
}

/// A single achievement marker. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: BadgeId,
    pub title: String,
    pub description: String,
    pub rarity: BadgeRarity,
}

impl Badge {
    pub fn new(
        id: BadgeId,
        title: impl Into<String>,
        description: impl Into<String>,
        rarity: BadgeRarity,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            rarity,
        }
    }
}

/// Immutable badge catalog, keyed by badge id.
///
/// Built once at startup from seed data or a JSON file; never mutated
/// afterwards. Unlock services hold it behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Badge>", into = "Vec<Badge>")]
pub struct BadgeCatalog {
    badges: BTreeMap<BadgeId, Badge>,
}

impl BadgeCatalog {
    /// Build a catalog, rejecting duplicate badge ids.
    pub fn new(badges: Vec<Badge>) -> Result<Self, DomainError> {
        let mut map = BTreeMap::new();
        for badge in badges {
            let id = badge.id.clone();
            if map.insert(id.clone(), badge).is_some() {
                return Err(DomainError::validation(format!(
                    "duplicate badge id in catalog: {id}"
                )));
            }
        }
        Ok(Self { badges: map })
    }

    pub fn get(&self, id: &BadgeId) -> Option<&Badge> {
        self.badges.get(id)
    }

    pub fn contains(&self, id: &BadgeId) -> bool {
        self.badges.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.values()
    }
}

impl TryFrom<Vec<Badge>> for BadgeCatalog {
    type Error = DomainError;

    fn try_from(badges: Vec<Badge>) -> Result<Self, Self::Error> {
        Self::new(badges)
    }
}

impl From<BadgeCatalog> for Vec<Badge> {
    fn from(catalog: BadgeCatalog) -> Self {
        catalog.badges.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(id: &str, rarity: BadgeRarity) -> Badge {
        Badge::new(
            BadgeId::new(id).expect("valid id"),
            "Title",
            "Description",
            rarity,
        )
    }

    #[test]
    fn catalog_lookup_by_id() {
        let catalog = BadgeCatalog::new(vec![
            badge("explorer", BadgeRarity::Common),
            badge("trailblazer", BadgeRarity::Epic),
        ])
        .expect("valid catalog");

        let id = BadgeId::new("explorer").expect("valid id");
        assert!(catalog.contains(&id));
        assert_eq!(
            catalog.get(&id).map(|b| b.rarity),
            Some(BadgeRarity::Common)
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn catalog_rejects_duplicate_ids() {
        let result = BadgeCatalog::new(vec![
            badge("explorer", BadgeRarity::Common),
            badge("explorer", BadgeRarity::Rare),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rarity_ordering_matches_escalation() {
        assert!(BadgeRarity::Common < BadgeRarity::Rare);
        assert!(BadgeRarity::Epic < BadgeRarity::Legendary);
    }
}
