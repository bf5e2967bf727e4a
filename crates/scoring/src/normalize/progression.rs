//! Progression-tracking API adapter: equipped items with explicit bonus ids,
//! and per-difficulty encounter kills.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{id_list, optional_u32, require_u32, Normalized, NormalizedSet, RawGear};
use crate::catalog::Collaborators;
use crate::error::{IssueKind, LootError, SourceIssue};
use crate::model::{Difficulty, EncounterKill, GearSource, SourceKind};
use crate::slot::{self, SlotField, PROGRESSION_SLOTS};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressionGear {
    #[serde(default)]
    pub items: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionProfile {
    pub name: String,
    #[serde(default)]
    pub realm: Option<String>,
    pub last_crawled_at: DateTime<Utc>,
    #[serde(default)]
    pub gear: ProgressionGear,
    #[serde(default)]
    pub raid_kills: Vec<Value>,
}

impl ProgressionProfile {
    pub fn from_json(input: &str) -> Result<Self, LootError> {
        serde_json::from_str(input)
            .map_err(|e| LootError::malformed(SourceKind::Progression, "profile", e.to_string()))
    }
}

pub fn normalize_progression(
    profile: &ProgressionProfile,
    collab: &Collaborators<'_>,
) -> Result<Normalized, LootError> {
    let mut set = NormalizedSet::new(collab, SourceKind::Progression);

    for (key, value) in &profile.gear.items {
        let slot = match slot::lookup(PROGRESSION_SLOTS, key) {
            Some(SlotField::Equip(slot)) => slot,
            Some(SlotField::Ignored) => continue,
            None => {
                set.malformed(&format!("gear.items.{key}"), "unknown slot key");
                continue;
            }
        };
        match gear_item(value) {
            Ok(raw) => set.push(raw, GearSource::Equipped, Some(slot))?,
            Err(reason) => set.malformed(&format!("gear.items.{key}"), reason),
        }
    }

    Ok(set.finish())
}

fn gear_item(value: &Value) -> Result<RawGear, String> {
    Ok(RawGear {
        item_id: require_u32(value, "item_id")?,
        item_level: require_u32(value, "item_level")?,
        name: value.get("name").and_then(Value::as_str).map(str::to_string),
        bonus_ids: id_list(value, "bonus_ids")?,
        enchant_ids: optional_u32(value, "enchant")?.into_iter().collect(),
        gem_ids: id_list(value, "gems")?,
        ..RawGear::default()
    })
}

/// Encounter kills from the profile; unreadable entries are reported and skipped.
pub fn encounter_kills(profile: &ProgressionProfile) -> (Vec<EncounterKill>, Vec<SourceIssue>) {
    let mut kills = Vec::new();
    let mut issues = Vec::new();

    for (idx, record) in profile.raid_kills.iter().enumerate() {
        match encounter_kill(record) {
            Ok(kill) => kills.push(kill),
            Err(reason) => {
                let issue = SourceIssue::new(
                    SourceKind::Progression,
                    IssueKind::MalformedSourcePayload,
                    format!("raidKills[{idx}]: {reason}"),
                );
                issue.log();
                issues.push(issue);
            }
        }
    }
    (kills, issues)
}

fn encounter_kill(record: &Value) -> Result<EncounterKill, String> {
    let difficulty: Difficulty = record
        .get("difficulty")
        .cloned()
        .ok_or("missing 'difficulty'")
        .and_then(|v| serde_json::from_value(v).map_err(|_| "unknown difficulty"))?;
    let defeated_at = record
        .get("defeatedAt")
        .and_then(Value::as_str)
        .ok_or("missing 'defeatedAt'")?
        .parse::<DateTime<Utc>>()
        .map_err(|e| format!("bad 'defeatedAt': {e}"))?;

    Ok(EncounterKill {
        difficulty,
        encounter_id: require_u32(record, "encounterId")?,
        defeated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, CatalogSnapshot, CatalystTable, TokenTable};
    use crate::model::ArmorType;
    use crate::slot::{ItemSlot, Slot};
    use crate::track::TrackRegistry;

    const PROFILE: &str = r#"{
        "name": "Brakka",
        "realm": "Draenor",
        "lastCrawledAt": "2026-10-15T03:00:00Z",
        "gear": {"items": {
            "mainhand": {"item_id": 212395, "item_level": 665, "bonus_ids": [11992, 1492], "enchant": 7460},
            "tabard": {"item_id": 5976, "item_level": 1},
            "legs": {"item_id": 212000, "item_level": "n/a"}
        }},
        "raidKills": [
            {"difficulty": "mythic", "encounterId": 2902, "defeatedAt": "2026-10-14T20:15:00Z"},
            {"difficulty": "raid_finder", "encounterId": 2917, "defeatedAt": "2026-10-13T19:00:00Z"},
            {"difficulty": "ascended", "encounterId": 2918, "defeatedAt": "2026-10-13T19:00:00Z"}
        ]
    }"#;

    #[test]
    fn normalizes_gear_map() {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert(CatalogItem {
            item_id: 212395,
            name: "Sikran's Endless Arsenal".into(),
            slot_key: ItemSlot::OneHand,
            armor_type: ArmorType::None,
            class_restriction: None,
            is_tierset: false,
            is_token: false,
            base_levels_by_difficulty: Default::default(),
        });
        let (tokens, catalysts, registry) =
            (TokenTable::new(), CatalystTable::new(), TrackRegistry::builtin());
        let collab = Collaborators {
            catalog: &catalog,
            tokens: &tokens,
            catalysts: &catalysts,
            registry: &registry,
        };

        let profile = ProgressionProfile::from_json(PROFILE).unwrap();
        let out = normalize_progression(&profile, &collab).unwrap();

        assert_eq!(out.items.len(), 1);
        let weapon = &out.items[0];
        assert_eq!(weapon.equipped_slot, Some(Slot::MainHand));
        assert_eq!(weapon.enchant_ids, vec![7460]);
        let track = weapon.item_track.as_ref().unwrap();
        assert_eq!((track.family.as_str(), track.rank, track.item_level), ("Myth", 2, 665));

        assert_eq!(out.issues.len(), 1);
        assert!(out.issues[0].detail.starts_with("gear.items.legs"));
    }

    #[test]
    fn kills_skip_unknown_difficulty() {
        let profile = ProgressionProfile::from_json(PROFILE).unwrap();
        let (kills, issues) = encounter_kills(&profile);
        assert_eq!(kills.len(), 2);
        assert_eq!(kills[1].difficulty, Difficulty::Lfr);
        assert_eq!(issues.len(), 1);
    }
}
