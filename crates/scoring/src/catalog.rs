//! Read-only lookup tables the engine consults: item catalog, token map,
//! catalyst map. The caller fetches them once per request and passes them in
//! through [`Collaborators`]; nothing here is cached process-wide.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::LootError;
use crate::model::{ArmorType, Difficulty, EncounterId, ItemId, PlayerClass};
use crate::slot::ItemSlot;
use crate::track::TrackRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub name: String,
    pub slot_key: ItemSlot,
    pub armor_type: ArmorType,
    /// `None` = usable by every class.
    #[serde(default)]
    pub class_restriction: Option<Vec<PlayerClass>>,
    #[serde(default)]
    pub is_tierset: bool,
    #[serde(default)]
    pub is_token: bool,
    #[serde(default)]
    pub base_levels_by_difficulty: BTreeMap<Difficulty, u32>,
}

impl CatalogItem {
    pub fn permits(&self, class: PlayerClass) -> bool {
        self.class_restriction
            .as_ref()
            .map_or(true, |classes| classes.contains(&class))
    }

    pub fn base_level(&self, difficulty: Difficulty) -> Option<u32> {
        self.base_levels_by_difficulty.get(&difficulty).copied()
    }
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// `Err` only when the catalog itself cannot be read.
pub trait ItemCatalog: Sync {
    fn lookup(&self, item_id: ItemId) -> Result<Option<&CatalogItem>, LootError>;
}

/// Final tier piece → the token the loot table actually drops.
pub trait TokenMapping: Sync {
    fn token_for(&self, item_id: ItemId) -> Result<Option<ItemId>, LootError>;
}

/// Catalyzed tier piece + encounter → the non-set item that drops there.
pub trait CatalystMapping: Sync {
    fn pre_transform(
        &self,
        item_id: ItemId,
        encounter_id: EncounterId,
    ) -> Result<Option<ItemId>, LootError>;
}

/// Everything read-only a scoring call needs besides its inputs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub catalog: &'a dyn ItemCatalog,
    pub tokens: &'a dyn TokenMapping,
    pub catalysts: &'a dyn CatalystMapping,
    pub registry: &'a TrackRegistry,
}

// ---------------------------------------------------------------------------
// In-memory snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    items: HashMap<ItemId, CatalogItem>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: CatalogItem) {
        self.items.insert(item.item_id, item);
    }

    /// Parse a JSON array of catalog items.
    pub fn from_json(input: &str) -> Result<Self, LootError> {
        let items: Vec<CatalogItem> = serde_json::from_str(input)
            .map_err(|e| LootError::unavailable("item catalog", e.to_string()))?;
        let mut snapshot = Self::new();
        for item in items {
            snapshot.insert(item);
        }
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for CatalogSnapshot {
    fn lookup(&self, item_id: ItemId) -> Result<Option<&CatalogItem>, LootError> {
        Ok(self.items.get(&item_id))
    }
}

#[derive(Debug, Default, Clone)]
pub struct TokenTable {
    tokens: HashMap<ItemId, ItemId>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: ItemId, token_id: ItemId) {
        self.tokens.insert(item_id, token_id);
    }
}

impl FromIterator<(ItemId, ItemId)> for TokenTable {
    fn from_iter<I: IntoIterator<Item = (ItemId, ItemId)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl TokenMapping for TokenTable {
    fn token_for(&self, item_id: ItemId) -> Result<Option<ItemId>, LootError> {
        Ok(self.tokens.get(&item_id).copied())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CatalystTable {
    sources: HashMap<(ItemId, EncounterId), ItemId>,
}

impl CatalystTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: ItemId, encounter_id: EncounterId, source_id: ItemId) {
        self.sources.insert((item_id, encounter_id), source_id);
    }
}

impl CatalystMapping for CatalystTable {
    fn pre_transform(
        &self,
        item_id: ItemId,
        encounter_id: EncounterId,
    ) -> Result<Option<ItemId>, LootError> {
        Ok(self.sources.get(&(item_id, encounter_id)).copied())
    }
}
