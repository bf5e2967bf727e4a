//! Per-character aggregation of the three gear feeds.

use std::collections::BTreeMap;

use crate::catalog::Collaborators;
use crate::error::{LootError, SourceIssue};
use crate::model::{CharacterGearState, CharacterId, GearItem, GearSource};
use crate::normalize::audit::{normalize_audit_row, AuditExport};
use crate::normalize::progression::{encounter_kills, normalize_progression, ProgressionProfile};
use crate::normalize::simulation::{normalize_simulation, parse_raw_upgrades, SimulationReport};
use crate::slot::Slot;
use crate::upgrades::resolve_upgrades;

/// Raw feed data for one character, as fetched by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterFeeds<'a> {
    /// Any number of reports, typically one per difficulty.
    pub simulations: &'a [SimulationReport],
    /// The batch export; the character's row is looked up by id.
    pub audit: Option<&'a AuditExport>,
    pub progression: Option<&'a ProgressionProfile>,
}

/// Normalize every feed for one character and collect the result.
///
/// The newest simulation report supplies the simulation-side items; every
/// report supplies the upgrade candidates for its own difficulty (newest
/// report per difficulty wins).
pub fn assemble(
    character_id: CharacterId,
    feeds: CharacterFeeds<'_>,
    collab: &Collaborators<'_>,
) -> Result<CharacterGearState, LootError> {
    let mut state = CharacterGearState::empty(character_id);
    let mut issues: Vec<SourceIssue> = Vec::new();

    let mut reports: Vec<&SimulationReport> = feeds.simulations.iter().collect();
    reports.sort_by_key(|r| r.simulated_at);

    if let Some(latest) = reports.last() {
        let normalized = normalize_simulation(latest, collab)?;
        state.items.extend(normalized.items);
        issues.extend(normalized.issues);
        state.freshness.simulation = Some(latest.simulated_at);
    }
    for report in &reports {
        let (raw, parse_issues) = parse_raw_upgrades(report);
        issues.extend(parse_issues);
        let resolved = resolve_upgrades(&raw, collab.tokens, collab.catalysts)?;
        state.upgrades.insert(report.difficulty, resolved);
    }

    if let Some(export) = feeds.audit {
        if let Some(row) = export.row(character_id) {
            let normalized = normalize_audit_row(row, collab)?;
            state.items.extend(normalized.items);
            issues.extend(normalized.issues);
            state.freshness.audit = Some(export.last_refreshed);
        }
    }

    if let Some(profile) = feeds.progression {
        let normalized = normalize_progression(profile, collab)?;
        state.items.extend(normalized.items);
        issues.extend(normalized.issues);
        let (kills, kill_issues) = encounter_kills(profile);
        state.kills = kills;
        issues.extend(kill_issues);
        state.freshness.progression = Some(profile.last_crawled_at);
    }

    state.issues = issues
        .into_iter()
        .map(|issue| issue.with_character(character_id))
        .collect();

    log::debug!(
        "character {character_id}: {} items, {} upgrade sets, {} issues",
        state.items.len(),
        state.upgrades.len(),
        state.issues.len()
    );
    Ok(state)
}

/// One equipped item per slot: the freshest feed wins, then the higher item level.
pub fn reconcile_equipped(state: &CharacterGearState) -> BTreeMap<Slot, &GearItem> {
    let mut slots: BTreeMap<Slot, &GearItem> = BTreeMap::new();
    for item in state.items.iter().filter(|i| i.source == GearSource::Equipped) {
        let Some(slot) = item.equipped_slot else {
            continue;
        };
        let rank = |i: &GearItem| (state.freshness.get(i.origin), i.item_level);
        match slots.get(&slot) {
            Some(current) if rank(*current) >= rank(item) => {}
            _ => {
                slots.insert(slot, item);
            }
        }
    }
    slots
}
