//! Upgrade resolution: identity remap, positive-gain filter, dedup.
//!
//! Simulation reports name the item a character would end up wearing. The
//! loot table drops something else for tier pieces (the token) and for
//! catalyzed pieces (the pre-transform item), so every record is remapped to
//! the id that actually drops before anything is compared.

use std::collections::HashMap;

use crate::catalog::{CatalystMapping, TokenMapping};
use crate::error::LootError;
use crate::model::{EncounterId, ItemId, UpgradeCandidate};
use crate::slot::Slot;

/// One upgrade record as read from a simulation report.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpgrade {
    pub simulated_item_id: ItemId,
    pub encounter_id: EncounterId,
    pub dps: f64,
    pub item_level: u32,
    pub slot: Slot,
}

/// Remap, filter and deduplicate one report's upgrade records.
///
/// Output keeps the order in which each resolved id was first seen. Per
/// resolved id the record with the strictly greatest `dps` survives; exact
/// ties keep the earlier record.
pub fn resolve_upgrades(
    raw: &[RawUpgrade],
    tokens: &dyn TokenMapping,
    catalysts: &dyn CatalystMapping,
) -> Result<Vec<UpgradeCandidate>, LootError> {
    let mut out: Vec<UpgradeCandidate> = Vec::new();
    let mut by_id: HashMap<ItemId, usize> = HashMap::new();

    for record in raw {
        let candidate = remap(record, tokens, catalysts)?;

        // NaN fails this too.
        if !(candidate.dps > 0.0) {
            continue;
        }

        match by_id.get(&candidate.resolved_item_id) {
            Some(&idx) => {
                if candidate.dps > out[idx].dps {
                    log::debug!(
                        "upgrade {}: {} (dps {:.1}) replaces {} (dps {:.1})",
                        candidate.resolved_item_id,
                        candidate.original_simulated_item_id,
                        candidate.dps,
                        out[idx].original_simulated_item_id,
                        out[idx].dps
                    );
                    out[idx] = candidate;
                }
            }
            None => {
                by_id.insert(candidate.resolved_item_id, out.len());
                out.push(candidate);
            }
        }
    }

    Ok(out)
}

/// Token mapping first; the catalyst mapping is only consulted when no token applies.
fn remap(
    record: &RawUpgrade,
    tokens: &dyn TokenMapping,
    catalysts: &dyn CatalystMapping,
) -> Result<UpgradeCandidate, LootError> {
    let mut candidate = UpgradeCandidate {
        resolved_item_id: record.simulated_item_id,
        original_simulated_item_id: record.simulated_item_id,
        tierset_item_id: None,
        catalyzed_item_id: None,
        encounter_id: record.encounter_id,
        slot: record.slot,
        dps: record.dps,
        item_level: record.item_level,
    };

    if let Some(token) = tokens.token_for(record.simulated_item_id)? {
        candidate.resolved_item_id = token;
        candidate.tierset_item_id = Some(record.simulated_item_id);
    } else if let Some(source) = catalysts.pre_transform(record.simulated_item_id, record.encounter_id)? {
        candidate.resolved_item_id = source;
        candidate.catalyzed_item_id = Some(record.simulated_item_id);
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalystTable, TokenTable};

    fn raw(item: ItemId, encounter: EncounterId, dps: f64) -> RawUpgrade {
        RawUpgrade {
            simulated_item_id: item,
            encounter_id: encounter,
            dps,
            item_level: 662,
            slot: Slot::Head,
        }
    }

    struct Unreachable;

    impl TokenMapping for Unreachable {
        fn token_for(&self, _: ItemId) -> Result<Option<ItemId>, LootError> {
            Err(LootError::unavailable("token mapping", "timed out"))
        }
    }

    #[test]
    fn distinct_ids_survive_unchanged() {
        let input = [raw(221023, 2601, 10565.0), raw(225578, 2602, 14306.0)];
        let out = resolve_upgrades(&input, &TokenTable::new(), &CatalystTable::new()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].resolved_item_id, 221023);
        assert_eq!(out[0].dps, 10565.0);
        assert_eq!(out[1].resolved_item_id, 225578);
        assert_eq!(out[1].dps, 14306.0);
        assert!(out.iter().all(|u| u.tierset_item_id.is_none() && u.catalyzed_item_id.is_none()));
    }

    #[test]
    fn dedup_keeps_greatest_dps() {
        // Two tier pieces sharing one token.
        let tokens: TokenTable = [(211984, 225614), (211985, 225614)].into_iter().collect();
        let input = [raw(211984, 2601, 100.0), raw(211985, 2601, 250.0)];
        let out = resolve_upgrades(&input, &tokens, &CatalystTable::new()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].resolved_item_id, 225614);
        assert_eq!(out[0].dps, 250.0);
        assert_eq!(out[0].tierset_item_id, Some(211985));
    }

    #[test]
    fn exact_tie_keeps_first_seen() {
        let mut catalysts = CatalystTable::new();
        catalysts.insert(211990, 2607, 212446);
        let input = [raw(212446, 2607, 300.0), raw(211990, 2607, 300.0)];
        let out = resolve_upgrades(&input, &TokenTable::new(), &catalysts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].original_simulated_item_id, 212446);
        assert_eq!(out[0].catalyzed_item_id, None);
    }

    #[test]
    fn token_wins_over_catalyst() {
        let tokens: TokenTable = [(211990, 225614)].into_iter().collect();
        let mut catalysts = CatalystTable::new();
        catalysts.insert(211990, 2607, 212446);
        let out = resolve_upgrades(&[raw(211990, 2607, 50.0)], &tokens, &catalysts).unwrap();
        assert_eq!(out[0].resolved_item_id, 225614);
        assert_eq!(out[0].tierset_item_id, Some(211990));
        assert_eq!(out[0].catalyzed_item_id, None);
    }

    #[test]
    fn catalyst_only_for_matching_encounter() {
        let mut catalysts = CatalystTable::new();
        catalysts.insert(211990, 2607, 212446);
        let input = [raw(211990, 2607, 10.0), raw(211990, 2608, 20.0)];
        let out = resolve_upgrades(&input, &TokenTable::new(), &catalysts).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].resolved_item_id, 212446);
        assert_eq!(out[0].catalyzed_item_id, Some(211990));
        assert_eq!(out[1].resolved_item_id, 211990);
    }

    #[test]
    fn non_positive_gain_is_dropped() {
        let input = [raw(1, 1, 0.0), raw(2, 1, -5.0), raw(3, 1, f64::NAN), raw(4, 1, 0.5)];
        let out = resolve_upgrades(&input, &TokenTable::new(), &CatalystTable::new()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].resolved_item_id, 4);
    }

    #[test]
    fn unreachable_mapping_is_fatal() {
        let err = resolve_upgrades(&[raw(1, 1, 5.0)], &Unreachable, &CatalystTable::new()).unwrap_err();
        assert!(err.is_fatal());
    }
}
