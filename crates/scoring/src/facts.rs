//! Per-character derived facts for one drop.
//!
//! Everything here reads shared immutable inputs and returns an owned
//! [`CharacterFacts`]; the engine runs one derivation per eligible character
//! in parallel.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::catalog::{CatalogItem, Collaborators};
use crate::config::ScoringConfig;
use crate::error::LootError;
use crate::gear_state::reconcile_equipped;
use crate::model::{
    AssignmentRecord, CharacterGearState, GearItem, GearSource, ItemId, LootDrop, SourceKind,
    TierPiece, TierProvenance, Warning, WeeklyRewardForecast,
};
use crate::slot::{ItemSlot, Slot};

/// The drop being scored, resolved once per call.
#[derive(Debug, Clone, Copy)]
pub struct DropContext<'a> {
    pub loot: &'a LootDrop,
    pub item: &'a CatalogItem,
    pub item_level: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterFacts {
    pub lower_bound: Option<DateTime<Utc>>,
    /// Loot assigned after `lower_bound` that no feed reflects yet.
    pub pending: Vec<GearItem>,
    /// The item the drop would replace. For paired slots the weaker position.
    pub best_in_slot: Option<GearItem>,
    pub current_item_level: Option<u32>,
    pub already_has_equal_or_better: bool,
    /// Level of the owned item(s) that made `already_has_equal_or_better` true.
    pub owned_item_level: Option<u32>,
    pub tier_pieces: Vec<TierPiece>,
    pub completes_set_bonus: bool,
    pub weekly_reward: WeeklyRewardForecast,
    pub flags: BTreeSet<Warning>,
}

impl CharacterFacts {
    /// Drop level minus current level; an empty slot counts as level 0.
    pub fn item_level_gap(&self, drop_level: u32) -> i64 {
        i64::from(drop_level) - i64::from(self.current_item_level.unwrap_or(0))
    }
}

pub fn derive_facts(
    config: &ScoringConfig,
    collab: &Collaborators<'_>,
    drop: DropContext<'_>,
    state: &CharacterGearState,
    history: &[AssignmentRecord],
) -> Result<CharacterFacts, LootError> {
    let mut facts = CharacterFacts {
        lower_bound: state.freshness.lower_bound(),
        ..CharacterFacts::default()
    };

    facts.pending = pending_assignments(collab, drop.loot, state, history, facts.lower_bound)?;
    if !facts.pending.is_empty() {
        facts.flags.insert(Warning::UnreflectedAssignments);
    }

    let equipped = reconcile_equipped(state);

    let positions = slot_positions(drop.item, &equipped, &facts.pending);
    let baseline = if positions.iter().any(Option::is_none) {
        None
    } else {
        positions.iter().flatten().min_by_key(|i| i.item_level).copied()
    };
    facts.current_item_level = baseline.map(|i| i.item_level);
    if baseline.is_some_and(|i| i.track_inferred) {
        facts.flags.insert(Warning::InferredTrack);
    }
    facts.best_in_slot = baseline.cloned();

    facts.owned_item_level = equal_or_better(drop, state, &equipped, &facts.pending);
    facts.already_has_equal_or_better = facts.owned_item_level.is_some();

    facts.tier_pieces = tier_pieces(&equipped, &facts.pending);
    facts.completes_set_bonus = completes_with_drop(drop.item, &facts.tier_pieces);

    facts.weekly_reward = weekly_reward(config, drop, state)?;
    if facts
        .weekly_reward
        .offered
        .iter()
        .any(|i| i.item_level >= drop.item_level)
    {
        facts.flags.insert(Warning::VaultAlternative);
    }

    facts.flags.extend(freshness_flags(config, state, drop.loot));
    Ok(facts)
}

// ---------------------------------------------------------------------------
// Recency cutoff
// ---------------------------------------------------------------------------

/// History rows for this character that postdate every feed snapshot.
/// With no snapshot at all every row counts.
fn pending_assignments(
    collab: &Collaborators<'_>,
    loot: &LootDrop,
    state: &CharacterGearState,
    history: &[AssignmentRecord],
    lower_bound: Option<DateTime<Utc>>,
) -> Result<Vec<GearItem>, LootError> {
    let mut pending = Vec::new();
    for record in history {
        if record.character_id != state.character_id || record.loot_id == loot.loot_id {
            continue;
        }
        if lower_bound.is_some_and(|bound| record.drop_date <= bound) {
            continue;
        }

        let Some(item) = collab.catalog.lookup(record.item_id)? else {
            log::warn!(
                "assignment {} for character {}: item {} not in catalog, ignored",
                record.loot_id,
                record.character_id,
                record.item_id
            );
            continue;
        };
        let item_level = record
            .item_level
            .or_else(|| item.base_level(record.difficulty))
            .ok_or_else(|| {
                LootError::malformed(
                    SourceKind::History,
                    format!("loot {}", record.loot_id),
                    format!("no item level for {} at {}", record.item_id, record.difficulty),
                )
            })?;

        pending.push(GearItem {
            item_id: record.item_id,
            name: item.name.clone(),
            slot_key: item.slot_key,
            source: GearSource::Bag,
            origin: SourceKind::History,
            equipped_slot: None,
            item_level,
            bonus_ids: Vec::new(),
            item_track: None,
            track_inferred: false,
            enchant_ids: Vec::new(),
            gem_ids: Vec::new(),
            crafted_stats: Vec::new(),
            is_tierset: item.is_tierset,
            is_token: item.is_token,
        });
    }
    Ok(pending)
}

// ---------------------------------------------------------------------------
// Slot baseline
// ---------------------------------------------------------------------------

/// Occupant of each position the drop can fill. An empty off-hand next to a
/// two-hander counts as held by it. Pending items that fit the slot displace
/// the weakest occupant they beat.
fn slot_positions<'s>(
    drop_item: &CatalogItem,
    equipped: &BTreeMap<Slot, &'s GearItem>,
    pending: &'s [GearItem],
) -> Vec<Option<&'s GearItem>> {
    let two_hander = equipped
        .get(&Slot::MainHand)
        .copied()
        .filter(|i| i.slot_key == ItemSlot::TwoHand);
    let mut positions: Vec<Option<&GearItem>> = drop_item
        .slot_key
        .equip_slots()
        .iter()
        .map(|slot| match (equipped.get(slot).copied(), slot) {
            (None, Slot::OffHand) => two_hander,
            (occupant, _) => occupant,
        })
        .collect();

    let mut fitting: Vec<&GearItem> = pending
        .iter()
        .filter(|i| i.slot_key.overlaps(drop_item.slot_key))
        .collect();
    fitting.sort_by(|a, b| b.item_level.cmp(&a.item_level));

    for item in fitting {
        let weakest = positions
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.map(|i| i.item_level))
            .map(|(idx, p)| (idx, p.map(|i| i.item_level)));
        if let Some((idx, level)) = weakest {
            if level.map_or(true, |l| item.item_level > l) {
                positions[idx] = Some(item);
            }
        }
    }
    positions
}

/// Level of what already covers the drop at or above its item level, if anything.
///
/// Single slots need one such item. Paired slots need two distinct items,
/// unless the character already owns the very same item.
fn equal_or_better(
    drop: DropContext<'_>,
    state: &CharacterGearState,
    equipped: &BTreeMap<Slot, &GearItem>,
    pending: &[GearItem],
) -> Option<u32> {
    let owned = equipped
        .values()
        .copied()
        .chain(
            state
                .items
                .iter()
                .filter(|i| matches!(i.source, GearSource::Bag | GearSource::BestEver)),
        )
        .chain(pending.iter())
        .filter(|i| i.slot_key.overlaps(drop.item.slot_key))
        .filter(|i| i.item_level >= drop.item_level);

    let mut best_by_id: BTreeMap<ItemId, u32> = BTreeMap::new();
    for item in owned {
        let level = best_by_id.entry(item.item_id).or_insert(item.item_level);
        *level = (*level).max(item.item_level);
    }

    if !drop.item.slot_key.is_paired() {
        return best_by_id.values().copied().max();
    }
    if let Some(&same) = best_by_id.get(&drop.loot.item_id) {
        return Some(same);
    }
    let mut levels: Vec<u32> = best_by_id.into_values().collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    (levels.len() >= 2).then(|| levels[1])
}

// ---------------------------------------------------------------------------
// Tier set
// ---------------------------------------------------------------------------

fn tier_pieces(equipped: &BTreeMap<Slot, &GearItem>, pending: &[GearItem]) -> Vec<TierPiece> {
    Slot::ALL
        .iter()
        .filter(|slot| slot.is_tier_slot())
        .filter_map(|&slot| {
            if let Some(item) = equipped.get(&slot).filter(|i| i.is_tierset) {
                return Some(TierPiece {
                    slot,
                    item_id: item.item_id,
                    provenance: TierProvenance::Equipped(item.origin),
                });
            }
            pending
                .iter()
                .find(|i| (i.is_tierset || i.is_token) && i.slot_key.equip_slots().contains(&slot))
                .map(|i| TierPiece {
                    slot,
                    item_id: i.item_id,
                    provenance: TierProvenance::PendingAssignment,
                })
        })
        .collect()
}

/// Piece counts that unlock a set bonus.
pub fn completes_bonus(count: usize) -> bool {
    matches!(count, 2 | 4)
}

fn completes_with_drop(drop_item: &CatalogItem, pieces: &[TierPiece]) -> bool {
    if !(drop_item.is_tierset || drop_item.is_token) {
        return false;
    }
    let fills_new_slot = drop_item
        .slot_key
        .equip_slots()
        .iter()
        .any(|slot| slot.is_tier_slot() && !pieces.iter().any(|p| p.slot == *slot));
    fills_new_slot && completes_bonus(pieces.len() + 1)
}

// ---------------------------------------------------------------------------
// Weekly reward
// ---------------------------------------------------------------------------

/// Raid vault slots unlocked by distinct encounter kills this reset.
pub fn unlocked_raid_slots(kills: usize) -> u8 {
    match kills {
        0..=1 => 0,
        2..=3 => 1,
        4..=5 => 2,
        _ => 3,
    }
}

fn weekly_reward(
    config: &ScoringConfig,
    drop: DropContext<'_>,
    state: &CharacterGearState,
) -> Result<WeeklyRewardForecast, LootError> {
    let reset = config.weekly_reset.last_reset_before(drop.loot.dropped_at)?;
    let encounters: BTreeSet<_> = state
        .kills
        .iter()
        .filter(|k| k.difficulty == drop.loot.difficulty && k.defeated_at >= reset)
        .map(|k| k.encounter_id)
        .collect();

    let offered = state
        .items
        .iter()
        .filter(|i| i.source == GearSource::Vault && i.slot_key.overlaps(drop.item.slot_key))
        .cloned()
        .collect();

    Ok(WeeklyRewardForecast {
        kills_this_reset: encounters.len(),
        unlocked_raid_slots: unlocked_raid_slots(encounters.len()),
        offered,
    })
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// Missing and stale feeds as of the drop time. A character simulated only
/// at other difficulties has no dps for this drop and is flagged too.
pub fn freshness_flags(
    config: &ScoringConfig,
    state: &CharacterGearState,
    loot: &LootDrop,
) -> BTreeSet<Warning> {
    let mut flags = BTreeSet::new();
    for kind in SourceKind::FEEDS {
        let flag = match (state.freshness.get(kind), config.freshness.max_age(kind)) {
            (None, _) => Warning::missing(kind),
            (Some(at), Some(max_age)) if loot.dropped_at - at > max_age => Warning::stale(kind),
            _ => None,
        };
        flags.extend(flag);
    }
    if state.freshness.simulation.is_some() && !state.upgrades.contains_key(&loot.difficulty) {
        flags.insert(Warning::NoSimulationForDifficulty);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, CatalystTable, TokenTable};
    use crate::model::{ArmorType, Difficulty, EncounterKill};
    use crate::slot::ItemSlot;
    use crate::track::TrackRegistry;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn catalog_item(item_id: ItemId, slot_key: ItemSlot) -> CatalogItem {
        CatalogItem {
            item_id,
            name: format!("item {item_id}"),
            slot_key,
            armor_type: ArmorType::None,
            class_restriction: None,
            is_tierset: false,
            is_token: false,
            base_levels_by_difficulty: [(Difficulty::Mythic, 662)].into_iter().collect(),
        }
    }

    fn gear(item_id: ItemId, slot_key: ItemSlot, slot: Option<Slot>, level: u32, source: GearSource) -> GearItem {
        GearItem {
            item_id,
            name: format!("item {item_id}"),
            slot_key,
            source,
            origin: SourceKind::Simulation,
            equipped_slot: slot,
            item_level: level,
            bonus_ids: Vec::new(),
            item_track: None,
            track_inferred: false,
            enchant_ids: Vec::new(),
            gem_ids: Vec::new(),
            crafted_stats: Vec::new(),
            is_tierset: false,
            is_token: false,
        }
    }

    fn loot(item_id: ItemId) -> LootDrop {
        LootDrop {
            loot_id: 500,
            session_id: 1,
            item_id,
            encounter_id: 2601,
            difficulty: Difficulty::Mythic,
            item_level: Some(662),
            dropped_at: ts("2026-10-16T21:00:00Z"),
        }
    }

    struct Fixture {
        catalog: CatalogSnapshot,
        tokens: TokenTable,
        catalysts: CatalystTable,
        registry: TrackRegistry,
    }

    impl Fixture {
        fn new(items: Vec<CatalogItem>) -> Self {
            let mut catalog = CatalogSnapshot::new();
            for item in items {
                catalog.insert(item);
            }
            Self {
                catalog,
                tokens: TokenTable::new(),
                catalysts: CatalystTable::new(),
                registry: TrackRegistry::builtin(),
            }
        }

        fn collab(&self) -> Collaborators<'_> {
            Collaborators {
                catalog: &self.catalog,
                tokens: &self.tokens,
                catalysts: &self.catalysts,
                registry: &self.registry,
            }
        }
    }

    fn fresh_state(items: Vec<GearItem>) -> CharacterGearState {
        let mut state = CharacterGearState::empty(1);
        state.items = items;
        state.freshness.simulation = Some(ts("2026-10-16T12:00:00Z"));
        state.freshness.audit = Some(ts("2026-10-16T12:00:00Z"));
        state.freshness.progression = Some(ts("2026-10-16T12:00:00Z"));
        state.upgrades.insert(Difficulty::Mythic, Vec::new());
        state
    }

    #[test]
    fn empty_state_flags_every_feed_missing() {
        let drop_item = catalog_item(212456, ItemSlot::Trinket);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212456);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let facts = derive_facts(
            &ScoringConfig::default(),
            &fx.collab(),
            drop,
            &CharacterGearState::empty(1),
            &[],
        )
        .unwrap();

        assert_eq!(
            facts.flags,
            BTreeSet::from([
                Warning::MissingSimulation,
                Warning::MissingAudit,
                Warning::MissingProgression
            ])
        );
        assert_eq!(facts.current_item_level, None);
        assert_eq!(facts.item_level_gap(662), 662);
        assert!(!facts.already_has_equal_or_better);
    }

    #[test]
    fn paired_slot_needs_two_items() {
        let drop_item = catalog_item(212456, ItemSlot::Trinket);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212456);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let one_good = fresh_state(vec![
            gear(1, ItemSlot::Trinket, Some(Slot::Trinket1), 665, GearSource::Equipped),
            gear(2, ItemSlot::Trinket, Some(Slot::Trinket2), 636, GearSource::Equipped),
        ]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &one_good, &[]).unwrap();
        assert!(!facts.already_has_equal_or_better);
        assert_eq!(facts.current_item_level, Some(636));
        assert_eq!(facts.best_in_slot.as_ref().unwrap().item_id, 2);

        let two_good = fresh_state(vec![
            gear(1, ItemSlot::Trinket, Some(Slot::Trinket1), 665, GearSource::Equipped),
            gear(2, ItemSlot::Trinket, Some(Slot::Trinket2), 636, GearSource::Equipped),
            gear(3, ItemSlot::Trinket, None, 662, GearSource::Bag),
        ]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &two_good, &[]).unwrap();
        assert!(facts.already_has_equal_or_better);
        assert_eq!(facts.owned_item_level, Some(662));

        let same_item = fresh_state(vec![gear(212456, ItemSlot::Trinket, None, 662, GearSource::BestEver)]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &same_item, &[]).unwrap();
        assert!(facts.already_has_equal_or_better);
    }

    #[test]
    fn vault_items_do_not_count_as_owned() {
        let drop_item = catalog_item(212000, ItemSlot::Head);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212000);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let state = fresh_state(vec![
            gear(1, ItemSlot::Head, Some(Slot::Head), 649, GearSource::Equipped),
            gear(2, ItemSlot::Head, None, 665, GearSource::Vault),
        ]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert!(!facts.already_has_equal_or_better);
        assert!(facts.flags.contains(&Warning::VaultAlternative));
        assert_eq!(facts.weekly_reward.offered.len(), 1);
        assert_eq!(facts.item_level_gap(662), 13);
    }

    #[test]
    fn inferred_baseline_track_is_flagged() {
        let drop_item = catalog_item(212456, ItemSlot::Trinket);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212456);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let mut guessed = gear(2, ItemSlot::Trinket, Some(Slot::Trinket2), 636, GearSource::Equipped);
        guessed.track_inferred = true;
        let state = fresh_state(vec![
            gear(1, ItemSlot::Trinket, Some(Slot::Trinket1), 649, GearSource::Equipped),
            guessed.clone(),
        ]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert_eq!(facts.flags, BTreeSet::from([Warning::InferredTrack]));
        assert_eq!(facts.best_in_slot.as_ref().unwrap().item_id, 2);

        // Only the baseline's track matters.
        guessed.item_level = 665;
        let state = fresh_state(vec![
            gear(1, ItemSlot::Trinket, Some(Slot::Trinket1), 649, GearSource::Equipped),
            guessed,
        ]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert!(facts.flags.is_empty());
    }

    #[test]
    fn two_hander_covers_off_hand_for_one_hand_drop() {
        let drop_item = catalog_item(212395, ItemSlot::OneHand);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212395);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let state = fresh_state(vec![gear(9, ItemSlot::TwoHand, Some(Slot::MainHand), 649, GearSource::Equipped)]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert_eq!(facts.current_item_level, Some(649));
        assert_eq!(facts.item_level_gap(662), 13);
        assert_eq!(facts.best_in_slot.as_ref().unwrap().item_id, 9);

        // A one-hander leaves the off-hand genuinely empty.
        let state = fresh_state(vec![gear(9, ItemSlot::OneHand, Some(Slot::MainHand), 649, GearSource::Equipped)]);
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert_eq!(facts.current_item_level, None);
        assert_eq!(facts.item_level_gap(662), 662);
    }

    #[test]
    fn pending_assignment_becomes_baseline() {
        let drop_item = catalog_item(212000, ItemSlot::Head);
        let mut earlier = catalog_item(212001, ItemSlot::Head);
        earlier.is_tierset = true;
        let fx = Fixture::new(vec![drop_item.clone(), earlier]);
        let loot = loot(212000);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let state = fresh_state(vec![gear(1, ItemSlot::Head, Some(Slot::Head), 636, GearSource::Equipped)]);
        let history = [
            AssignmentRecord {
                loot_id: 400,
                character_id: 1,
                item_id: 212001,
                difficulty: Difficulty::Mythic,
                item_level: None,
                drop_date: ts("2026-10-16T20:00:00Z"),
            },
            // Already reflected by the feeds.
            AssignmentRecord {
                loot_id: 300,
                character_id: 1,
                item_id: 212001,
                difficulty: Difficulty::Mythic,
                item_level: Some(700),
                drop_date: ts("2026-10-10T20:00:00Z"),
            },
            // The drop being scored.
            AssignmentRecord {
                loot_id: 500,
                character_id: 1,
                item_id: 212000,
                difficulty: Difficulty::Mythic,
                item_level: Some(662),
                drop_date: ts("2026-10-16T21:00:00Z"),
            },
        ];
        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &history).unwrap();

        assert_eq!(facts.pending.len(), 1);
        assert!(facts.flags.contains(&Warning::UnreflectedAssignments));
        assert_eq!(facts.current_item_level, Some(662));
        assert!(facts.already_has_equal_or_better);
        assert_eq!(facts.tier_pieces.len(), 1);
        assert_eq!(facts.tier_pieces[0].provenance, TierProvenance::PendingAssignment);
    }

    #[test]
    fn pending_without_level_is_malformed() {
        let drop_item = catalog_item(212000, ItemSlot::Head);
        let mut levelless = catalog_item(7, ItemSlot::Neck);
        levelless.base_levels_by_difficulty.clear();
        let fx = Fixture::new(vec![drop_item.clone(), levelless]);
        let loot = loot(212000);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };
        let history = [AssignmentRecord {
            loot_id: 1,
            character_id: 1,
            item_id: 7,
            difficulty: Difficulty::Heroic,
            item_level: None,
            drop_date: ts("2026-10-16T20:00:00Z"),
        }];

        let err = derive_facts(
            &ScoringConfig::default(),
            &fx.collab(),
            drop,
            &CharacterGearState::empty(1),
            &history,
        )
        .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn stale_feeds_and_vault_unlocks() {
        let drop_item = catalog_item(212000, ItemSlot::Head);
        let fx = Fixture::new(vec![drop_item.clone()]);
        let loot = loot(212000);
        let drop = DropContext { loot: &loot, item: &drop_item, item_level: 662 };

        let mut state = fresh_state(Vec::new());
        state.freshness.audit = Some(ts("2026-10-10T00:00:00Z"));
        state.kills = [2601, 2602, 2602, 2603, 2604]
            .into_iter()
            .map(|encounter_id| EncounterKill {
                difficulty: Difficulty::Mythic,
                encounter_id,
                defeated_at: ts("2026-10-14T20:00:00Z"),
            })
            .chain(std::iter::once(EncounterKill {
                difficulty: Difficulty::Mythic,
                encounter_id: 2605,
                defeated_at: ts("2026-10-08T20:00:00Z"),
            }))
            .collect();

        let facts = derive_facts(&ScoringConfig::default(), &fx.collab(), drop, &state, &[]).unwrap();
        assert_eq!(facts.flags, BTreeSet::from([Warning::StaleAudit]));
        assert_eq!(facts.weekly_reward.kills_this_reset, 4);
        assert_eq!(facts.weekly_reward.unlocked_raid_slots, 2);
    }

    #[test]
    fn set_bonus_thresholds() {
        assert!(!completes_bonus(1));
        assert!(completes_bonus(2));
        assert!(!completes_bonus(3));
        assert!(completes_bonus(4));
        assert_eq!(unlocked_raid_slots(1), 0);
        assert_eq!(unlocked_raid_slots(6), 3);
    }
}
