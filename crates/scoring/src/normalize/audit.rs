//! Character audit export adapter.
//!
//! The export is one flat row per character with a fixed set of per-slot
//! columns. Slot columns are reached through [`AUDIT_SLOTS`] prefixes rather
//! than per-slot accessors.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{optional_u32, require_u32, Normalized, NormalizedSet, RawGear};
use crate::catalog::Collaborators;
use crate::error::{IssueKind, LootError};
use crate::model::{CharacterId, GearSource, SourceKind};
use crate::slot::{SlotField, AUDIT_SLOTS};
use crate::track::RankFraction;

/// A whole audit batch. `last_refreshed` covers every row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditExport {
    pub last_refreshed: DateTime<Utc>,
    #[serde(default)]
    pub characters: Vec<Value>,
}

impl AuditExport {
    pub fn from_json(input: &str) -> Result<Self, LootError> {
        serde_json::from_str(input)
            .map_err(|e| LootError::malformed(SourceKind::Audit, "export", e.to_string()))
    }

    /// The row for one character, matched on its `id` column.
    pub fn row(&self, character: CharacterId) -> Option<&Value> {
        self.characters.iter().find(|row| {
            row.get("id")
                .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
                == Some(character)
        })
    }
}

pub fn normalize_audit_row(row: &Value, collab: &Collaborators<'_>) -> Result<Normalized, LootError> {
    let mut set = NormalizedSet::new(collab, SourceKind::Audit);

    for (prefix, field) in AUDIT_SLOTS {
        let SlotField::Equip(slot) = *field else {
            continue;
        };

        match equipped_column(row, prefix) {
            Ok(Some(raw)) => {
                if raw.rank_fraction.is_none() {
                    if let Some(text) = track_text(row, prefix) {
                        set.issue(
                            IssueKind::DecodeMiss,
                            Some(raw.item_id),
                            format!("unreadable rank '{text}' in {prefix}_track"),
                        );
                    }
                }
                set.push(raw, GearSource::Equipped, Some(slot))?;
            }
            Ok(None) => {}
            Err(reason) => set.malformed(prefix, reason),
        }

        match best_column(row, prefix) {
            Ok(Some(raw)) => set.push(raw, GearSource::BestEver, Some(slot))?,
            Ok(None) => {}
            Err(reason) => set.malformed(&format!("best_{prefix}"), reason),
        }
    }

    Ok(set.finish())
}

fn track_text<'v>(row: &'v Value, prefix: &str) -> Option<&'v str> {
    row.get(format!("{prefix}_track"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `<prefix>_id` empty means the slot is empty, not malformed.
fn equipped_column(row: &Value, prefix: &str) -> Result<Option<RawGear>, String> {
    let Some(item_id) = optional_u32(row, &format!("{prefix}_id"))? else {
        return Ok(None);
    };
    Ok(Some(RawGear {
        item_id,
        item_level: require_u32(row, &format!("{prefix}_ilvl"))?,
        name: row
            .get(format!("{prefix}_name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        rank_fraction: track_text(row, prefix).and_then(RankFraction::parse),
        ..RawGear::default()
    }))
}

fn best_column(row: &Value, prefix: &str) -> Result<Option<RawGear>, String> {
    let Some(item_id) = optional_u32(row, &format!("best_{prefix}_id"))? else {
        return Ok(None);
    };
    Ok(Some(RawGear {
        item_id,
        item_level: require_u32(row, &format!("best_{prefix}_ilvl"))?,
        ..RawGear::default()
    }))
}
