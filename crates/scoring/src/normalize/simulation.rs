//! Simulation report adapter: equipped map, bag and vault text sections,
//! raw upgrade records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::report_text::{self, TextItem};
use super::{id_list, optional_u32, require_u32, Normalized, NormalizedSet, RawGear};
use crate::catalog::Collaborators;
use crate::error::{IssueKind, LootError, SourceIssue};
use crate::model::{Difficulty, GearSource, SourceKind};
use crate::slot::{self, SlotField, SIMULATION_SLOTS};
use crate::upgrades::RawUpgrade;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedCharacter {
    pub name: String,
    #[serde(default)]
    pub realm: Option<String>,
}

/// One simulation report for one character at one difficulty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub character: SimulatedCharacter,
    pub difficulty: Difficulty,
    pub simulated_at: DateTime<Utc>,
    /// Slot key → item object. Values stay untyped so one bad entry does not
    /// reject the report.
    #[serde(default)]
    pub equipped: BTreeMap<String, Value>,
    #[serde(default)]
    pub raw_upgrades: Vec<Value>,
    /// Simulation input text carrying the bag and weekly-reward sections.
    #[serde(default)]
    pub text: String,
}

impl SimulationReport {
    pub fn from_json(input: &str) -> Result<Self, LootError> {
        serde_json::from_str(input)
            .map_err(|e| LootError::malformed(SourceKind::Simulation, "report", e.to_string()))
    }
}

pub fn normalize_simulation(
    report: &SimulationReport,
    collab: &Collaborators<'_>,
) -> Result<Normalized, LootError> {
    let mut set = NormalizedSet::new(collab, SourceKind::Simulation);

    for (key, value) in &report.equipped {
        let slot = match slot::lookup(SIMULATION_SLOTS, key) {
            Some(SlotField::Equip(slot)) => slot,
            Some(SlotField::Ignored) => continue,
            None => {
                set.malformed(&format!("equipped.{key}"), "unknown slot key");
                continue;
            }
        };
        match equipped_item(value) {
            Ok(raw) => set.push(raw, GearSource::Equipped, Some(slot))?,
            Err(reason) => set.malformed(&format!("equipped.{key}"), reason),
        }
    }

    for (header, source) in [
        (report_text::BAG_SECTION, GearSource::Bag),
        (report_text::VAULT_SECTION, GearSource::Vault),
    ] {
        let scan = report_text::scan_section(&report.text, header);
        for (line, reason) in scan.malformed {
            set.malformed(&line, reason);
        }
        for item in scan.items {
            match slot::lookup(SIMULATION_SLOTS, &item.slot_key) {
                Some(SlotField::Equip(_)) => {}
                Some(SlotField::Ignored) => continue,
                None => {
                    set.malformed(&format!("{} id={}", item.slot_key, item.item_id), "unknown slot key");
                    continue;
                }
            }
            let Some(item_level) = item.item_level else {
                set.malformed(&format!("{} id={}", item.slot_key, item.item_id), "no item level");
                continue;
            };
            set.push(text_item(item, item_level), source, None)?;
        }
    }

    Ok(set.finish())
}

fn equipped_item(value: &Value) -> Result<RawGear, String> {
    Ok(RawGear {
        item_id: require_u32(value, "id")?,
        item_level: require_u32(value, "itemLevel")?,
        name: value.get("name").and_then(Value::as_str).map(str::to_string),
        bonus_ids: id_list(value, "bonusIds")?,
        enchant_ids: id_list(value, "enchantIds")?,
        gem_ids: id_list(value, "gemIds")?,
        crafted_stats: id_list(value, "craftedStats")?,
        rank_fraction: None,
    })
}

fn text_item(item: TextItem, item_level: u32) -> RawGear {
    RawGear {
        item_id: item.item_id,
        item_level,
        name: item.name,
        bonus_ids: item.bonus_ids,
        enchant_ids: item.enchant_ids,
        gem_ids: item.gem_ids,
        crafted_stats: item.crafted_stats,
        rank_fraction: None,
    }
}

/// Extract upgrade records, skipping malformed ones individually.
///
/// Record shape: `{"item", "encounter", "dps", "itemLevel", "slot"}`.
pub fn parse_raw_upgrades(report: &SimulationReport) -> (Vec<RawUpgrade>, Vec<SourceIssue>) {
    let mut upgrades = Vec::with_capacity(report.raw_upgrades.len());
    let mut issues = Vec::new();

    for (idx, record) in report.raw_upgrades.iter().enumerate() {
        match raw_upgrade(record) {
            Ok(Some(upgrade)) => upgrades.push(upgrade),
            Ok(None) => {}
            Err(reason) => {
                let issue = SourceIssue::new(
                    SourceKind::Simulation,
                    IssueKind::MalformedSourcePayload,
                    format!("rawUpgrades[{idx}]: {reason}"),
                );
                issue.log();
                issues.push(issue);
            }
        }
    }
    (upgrades, issues)
}

fn raw_upgrade(record: &Value) -> Result<Option<RawUpgrade>, String> {
    let slot_key = record
        .get("slot")
        .and_then(Value::as_str)
        .ok_or("missing 'slot'")?;
    let slot = match slot::lookup(SIMULATION_SLOTS, slot_key) {
        Some(SlotField::Equip(slot)) => slot,
        Some(SlotField::Ignored) => return Ok(None),
        None => return Err(format!("unknown slot key '{slot_key}'")),
    };
    let dps = record
        .get("dps")
        .and_then(Value::as_f64)
        .ok_or("missing or non-numeric 'dps'")?;

    Ok(Some(RawUpgrade {
        simulated_item_id: require_u32(record, "item")?,
        encounter_id: optional_u32(record, "encounter")?.unwrap_or(0),
        dps,
        item_level: require_u32(record, "itemLevel")?,
        slot,
    }))
}
