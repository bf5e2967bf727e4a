use std::cmp::Reverse;
use std::collections::HashMap;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::catalog::Collaborators;
use crate::config::ScoringConfig;
use crate::error::LootError;
use crate::evidence::compute_summary;
use crate::facts::{derive_facts, DropContext};
use crate::model::{
    AssignmentCandidate, AssignmentMeta, AssignmentRecord, AssignmentResult, BisTable,
    CharacterGearState, CharacterId, LootDrop, Roster, RosterMember, ScoreStep, ScoreTier, Warning,
};

/// Everything the caller fetched for one scoring request.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentInput<'a> {
    pub loot: &'a LootDrop,
    pub roster: &'a Roster,
    pub gear_states: &'a HashMap<CharacterId, CharacterGearState>,
    pub history: &'a [AssignmentRecord],
    pub bis: &'a BisTable,
}

/// Rank every eligible roster member for one drop.
///
/// Fails only when the dropped item cannot be scored at all or a collaborator
/// is unavailable. A malformed record in one character's data floors that
/// character and flags it; the rest of the roster is still scored.
pub fn score_assignment(
    config: &ScoringConfig,
    collab: &Collaborators<'_>,
    input: &AssignmentInput<'_>,
) -> Result<AssignmentResult, LootError> {
    let loot = input.loot;
    let item = collab
        .catalog
        .lookup(loot.item_id)?
        .ok_or_else(|| LootError::UnscorableLoot {
            item_id: loot.item_id,
            reason: "not in item catalog".into(),
        })?;
    let item_level = loot
        .item_level
        .or_else(|| item.base_level(loot.difficulty))
        .ok_or_else(|| LootError::UnscorableLoot {
            item_id: loot.item_id,
            reason: format!("no item level at {}", loot.difficulty),
        })?;
    let drop = DropContext {
        loot,
        item,
        item_level,
    };

    let eligible: Vec<&RosterMember> = input
        .roster
        .members
        .iter()
        .filter(|m| input.roster.attended(loot.session_id, m.id) && item.permits(m.class))
        .collect();
    let ineligible = input.roster.members.len() - eligible.len();

    let mut candidates = eligible
        .par_iter()
        .map(|member| score_member(config, collab, drop, member, input))
        .collect::<Result<Vec<_>, LootError>>()?;

    sort_candidates(&mut candidates);

    log::info!(
        "loot {} (item {} @ {}): {} eligible, {} ineligible",
        loot.loot_id,
        loot.item_id,
        item_level,
        candidates.len(),
        ineligible
    );

    let summary = compute_summary(&candidates, ineligible);

    Ok(AssignmentResult {
        meta: AssignmentMeta {
            loot_id: loot.loot_id,
            item_id: loot.item_id,
            item_level,
            difficulty: loot.difficulty,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            scored_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        candidates,
    })
}

fn score_member(
    config: &ScoringConfig,
    collab: &Collaborators<'_>,
    drop: DropContext<'_>,
    member: &RosterMember,
    input: &AssignmentInput<'_>,
) -> Result<AssignmentCandidate, LootError> {
    let empty;
    let state = match input.gear_states.get(&member.id) {
        Some(state) => state,
        None => {
            empty = CharacterGearState::empty(member.id);
            &empty
        }
    };

    let base_dps = state
        .upgrade_for(drop.loot.difficulty, drop.loot.item_id)
        .map_or(0.0, |u| u.dps);
    let mut steps = vec![ScoreStep::BaseDps { dps: base_dps }];

    let facts = match derive_facts(config, collab, drop, state, input.history) {
        Ok(facts) => facts,
        Err(err) if !err.is_fatal() => {
            log::warn!("character {} ({}): {err}; scored at floor", member.id, member.name);
            let score = config.tiers.floor_score;
            steps.push(ScoreStep::DataErrorFloor {
                score,
                reason: err.to_string(),
            });
            let mut flags = crate::facts::freshness_flags(config, state, drop.loot);
            flags.insert(Warning::DataError);
            return Ok(AssignmentCandidate {
                character: member.id,
                name: member.name.clone(),
                score,
                tier: ScoreTier::Floor,
                flags,
                best_in_slot: None,
                tierset_count: 0,
                tier_pieces: Vec::new(),
                completes_set_bonus: false,
                already_has_equal_or_better: false,
                base_dps,
                current_item_level: None,
                item_level_gap: i64::from(drop.item_level),
                pending_assignments: 0,
                weekly_reward: Default::default(),
                steps,
            });
        }
        Err(err) => return Err(err),
    };

    let mut score = base_dps;
    let mut tier = ScoreTier::Simulated;

    if is_bis(collab, input.bis, member, drop)? {
        score = config.tiers.bis_score;
        tier = ScoreTier::Bis;
        steps.push(ScoreStep::BisOverride { score });
        log::debug!("character {}: item {} is BiS", member.id, drop.loot.item_id);
    } else if let Some(owned_item_level) = facts.owned_item_level {
        score = config.tiers.floor_score;
        tier = ScoreTier::Floor;
        steps.push(ScoreStep::EqualOrBetterFloor {
            score,
            owned_item_level,
        });
        log::debug!(
            "character {}: owns {owned_item_level} >= {}, floored",
            member.id,
            drop.item_level
        );
    }

    Ok(AssignmentCandidate {
        character: member.id,
        name: member.name.clone(),
        score,
        tier,
        item_level_gap: facts.item_level_gap(drop.item_level),
        flags: facts.flags,
        best_in_slot: facts.best_in_slot,
        tierset_count: facts.tier_pieces.len(),
        tier_pieces: facts.tier_pieces,
        completes_set_bonus: facts.completes_set_bonus,
        already_has_equal_or_better: facts.already_has_equal_or_better,
        base_dps,
        current_item_level: facts.current_item_level,
        pending_assignments: facts.pending.len(),
        weekly_reward: facts.weekly_reward,
        steps,
    })
}

/// A declaration matches when the declared item is the drop itself, redeems
/// from it (token), or is catalyzed from it at this encounter.
fn is_bis(
    collab: &Collaborators<'_>,
    bis: &BisTable,
    member: &RosterMember,
    drop: DropContext<'_>,
) -> Result<bool, LootError> {
    let dropped = drop.loot.item_id;
    for declared in bis.items_for_spec(member.spec_id) {
        if declared == dropped
            || collab.tokens.token_for(declared)? == Some(dropped)
            || collab.catalysts.pre_transform(declared, drop.loot.encounter_id)? == Some(dropped)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Score desc, item-level gap desc, name asc, character id asc.
pub fn sort_candidates(candidates: &mut [AssignmentCandidate]) {
    candidates.sort_by(|a, b| {
        (Reverse(OrderedFloat(a.score)), Reverse(a.item_level_gap), &a.name, a.character).cmp(&(
            Reverse(OrderedFloat(b.score)),
            Reverse(b.item_level_gap),
            &b.name,
            b.character,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, CatalogSnapshot, CatalystTable, TokenTable};
    use crate::model::{
        ArmorType, Difficulty, GearItem, GearSource, PlayerClass, Role, SourceKind, UpgradeCandidate,
    };
    use crate::slot::{ItemSlot, Slot};
    use crate::track::TrackRegistry;
    use chrono::{DateTime, Utc};
    use std::collections::{BTreeMap, BTreeSet};

    const DROP: u32 = 212456;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    struct World {
        catalog: CatalogSnapshot,
        tokens: TokenTable,
        catalysts: CatalystTable,
        registry: TrackRegistry,
        roster: Roster,
        states: HashMap<CharacterId, CharacterGearState>,
        history: Vec<AssignmentRecord>,
        bis: BisTable,
        loot: LootDrop,
    }

    impl World {
        fn new() -> Self {
            let mut catalog = CatalogSnapshot::new();
            catalog.insert(CatalogItem {
                item_id: DROP,
                name: "Void Reaper's Contract".into(),
                slot_key: ItemSlot::Head,
                armor_type: ArmorType::None,
                class_restriction: Some(vec![PlayerClass::Warrior, PlayerClass::Mage]),
                is_tierset: false,
                is_token: false,
                base_levels_by_difficulty: [(Difficulty::Mythic, 662)].into_iter().collect(),
            });
            Self {
                catalog,
                tokens: TokenTable::new(),
                catalysts: CatalystTable::new(),
                registry: TrackRegistry::builtin(),
                roster: Roster::default(),
                states: HashMap::new(),
                history: Vec::new(),
                bis: BisTable::default(),
                loot: LootDrop {
                    loot_id: 1,
                    session_id: 10,
                    item_id: DROP,
                    encounter_id: 2601,
                    difficulty: Difficulty::Mythic,
                    item_level: None,
                    dropped_at: ts("2026-10-16T21:00:00Z"),
                },
            }
        }

        fn member(&mut self, id: CharacterId, name: &str, class: PlayerClass, spec_id: u32, present: bool) {
            self.roster.members.push(RosterMember {
                id,
                name: name.into(),
                class,
                spec_id,
                role: Role::MeleeDps,
            });
            if present {
                self.roster.attendance.entry(10).or_default().insert(id);
            }
        }

        fn with_gear(&mut self, id: CharacterId, head_level: u32, dps: f64) {
            let mut state = CharacterGearState::empty(id);
            state.freshness.simulation = Some(ts("2026-10-16T12:00:00Z"));
            state.freshness.audit = Some(ts("2026-10-16T12:00:00Z"));
            state.freshness.progression = Some(ts("2026-10-16T12:00:00Z"));
            state.items.push(GearItem {
                item_id: 1000 + id as u32,
                name: "Old Helm".into(),
                slot_key: ItemSlot::Head,
                source: GearSource::Equipped,
                origin: SourceKind::Simulation,
                equipped_slot: Some(Slot::Head),
                item_level: head_level,
                bonus_ids: Vec::new(),
                item_track: None,
                track_inferred: false,
                enchant_ids: Vec::new(),
                gem_ids: Vec::new(),
                crafted_stats: Vec::new(),
                is_tierset: false,
                is_token: false,
            });
            let mut upgrades = BTreeMap::new();
            upgrades.insert(
                Difficulty::Mythic,
                vec![UpgradeCandidate {
                    resolved_item_id: DROP,
                    original_simulated_item_id: DROP,
                    tierset_item_id: None,
                    catalyzed_item_id: None,
                    encounter_id: 2601,
                    slot: Slot::Head,
                    dps,
                    item_level: 662,
                }],
            );
            state.upgrades = upgrades;
            self.states.insert(id, state);
        }

        fn score(&self) -> Result<AssignmentResult, LootError> {
            let collab = Collaborators {
                catalog: &self.catalog,
                tokens: &self.tokens,
                catalysts: &self.catalysts,
                registry: &self.registry,
            };
            let input = AssignmentInput {
                loot: &self.loot,
                roster: &self.roster,
                gear_states: &self.states,
                history: &self.history,
                bis: &self.bis,
            };
            score_assignment(&ScoringConfig::default(), &collab, &input)
        }
    }

    #[test]
    fn eligibility_requires_attendance_and_class() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.member(2, "Ysolde", PlayerClass::Priest, 258, true);
        world.member(3, "Tovan", PlayerClass::Mage, 63, false);

        let result = world.score().unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].character, 1);
        assert_eq!(result.summary.ineligible, 2);
        assert_eq!(result.meta.item_level, 662);
    }

    #[test]
    fn bis_outranks_higher_dps() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.member(2, "Tovan", PlayerClass::Mage, 63, true);
        world.with_gear(1, 636, 500.0);
        world.with_gear(2, 636, 9000.0);
        world.bis.declare(DROP, 71);

        let result = world.score().unwrap();
        assert_eq!(result.candidates[0].character, 1);
        assert_eq!(result.candidates[0].tier, ScoreTier::Bis);
        assert_eq!(result.candidates[0].base_dps, 500.0);
        assert_eq!(result.candidates[1].score, 9000.0);
    }

    #[test]
    fn bis_through_token_table() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.tokens.insert(211984, DROP);
        world.bis.declare(211984, 71);

        let result = world.score().unwrap();
        assert_eq!(result.candidates[0].tier, ScoreTier::Bis);
    }

    #[test]
    fn equal_or_better_floors_despite_dps() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.member(2, "Tovan", PlayerClass::Mage, 63, true);
        world.with_gear(1, 665, 9000.0);
        world.with_gear(2, 636, 10.0);

        let result = world.score().unwrap();
        let brakka = result.candidates.iter().find(|c| c.character == 1).unwrap();
        assert_eq!(brakka.tier, ScoreTier::Floor);
        assert_eq!(brakka.score, -1.0);
        assert!(brakka.already_has_equal_or_better);
        assert_eq!(result.candidates[0].character, 2);
    }

    #[test]
    fn missing_gear_state_scores_zero_with_flags() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);

        let result = world.score().unwrap();
        let c = &result.candidates[0];
        assert_eq!(c.score, 0.0);
        assert_eq!(
            c.flags,
            BTreeSet::from([
                Warning::MissingSimulation,
                Warning::MissingAudit,
                Warning::MissingProgression
            ])
        );
        assert_eq!(result.summary.with_freshness_warnings, 1);
    }

    #[test]
    fn simulation_at_other_difficulty_is_flagged() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.with_gear(1, 636, 5000.0);
        let state = world.states.get_mut(&1).unwrap();
        let mythic = state.upgrades.remove(&Difficulty::Mythic).unwrap();
        state.upgrades.insert(Difficulty::Heroic, mythic);

        let result = world.score().unwrap();
        let c = &result.candidates[0];
        assert_eq!(c.score, 0.0);
        assert_eq!(c.base_dps, 0.0);
        assert_eq!(c.flags, BTreeSet::from([Warning::NoSimulationForDifficulty]));
        assert_eq!(result.summary.with_freshness_warnings, 1);
        assert_eq!(result.summary.warning_counts["no_simulation_for_difficulty"], 1);
    }

    #[test]
    fn malformed_history_floors_one_character_only() {
        let mut world = World::new();
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.member(2, "Tovan", PlayerClass::Mage, 63, true);
        world.with_gear(1, 636, 800.0);
        world.with_gear(2, 636, 700.0);
        world.history.push(AssignmentRecord {
            loot_id: 99,
            character_id: 1,
            item_id: DROP,
            difficulty: Difficulty::Heroic,
            item_level: None,
            drop_date: ts("2026-10-16T20:00:00Z"),
        });

        let result = world.score().unwrap();
        assert_eq!(result.candidates[0].character, 2);
        let brakka = &result.candidates[1];
        assert!(brakka.flags.contains(&Warning::DataError));
        assert_eq!(brakka.tier, ScoreTier::Floor);
        assert_eq!(result.summary.data_errors, 1);
    }

    #[test]
    fn ties_break_on_gap_then_name() {
        let mut world = World::new();
        world.member(3, "Cyra", PlayerClass::Warrior, 71, true);
        world.member(1, "Brakka", PlayerClass::Warrior, 71, true);
        world.member(2, "Alia", PlayerClass::Warrior, 71, true);
        world.with_gear(3, 636, 100.0);
        world.with_gear(1, 649, 100.0);
        world.with_gear(2, 649, 100.0);

        let result = world.score().unwrap();
        let order: Vec<_> = result.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, ["Cyra", "Alia", "Brakka"]);
    }

    #[test]
    fn unknown_drop_is_unscorable() {
        let mut world = World::new();
        world.loot.item_id = 1;
        let err = world.score().unwrap_err();
        assert!(matches!(err, LootError::UnscorableLoot { item_id: 1, .. }));
    }
}
