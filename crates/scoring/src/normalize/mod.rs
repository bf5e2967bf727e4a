//! Gear snapshot normalization: three feed shapes in, one [`GearItem`] shape out.
//!
//! Each adapter extracts [`RawGear`] records from its feed and hands them to
//! [`NormalizedSet::push`], which resolves catalog data and the upgrade track
//! in one place. Per-record problems become [`SourceIssue`]s; only an
//! unreachable collaborator fails the call.

pub mod audit;
pub mod progression;
pub mod report_text;
pub mod simulation;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::catalog::Collaborators;
use crate::error::{IssueKind, LootError, SourceIssue};
use crate::model::{GearItem, GearSource, ItemId, SourceKind};
use crate::slot::Slot;
use crate::track::RankFraction;

/// Normalizer output: items keyed by `(source, item id, equipped slot)`, in key
/// order. On a key collision the higher item level is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub items: Vec<GearItem>,
    pub issues: Vec<SourceIssue>,
}

impl Normalized {
    pub fn by_source(&self, source: GearSource) -> impl Iterator<Item = &GearItem> {
        self.items.iter().filter(move |i| i.source == source)
    }
}

/// One feed record before catalog and track resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGear {
    pub item_id: ItemId,
    pub item_level: u32,
    pub name: Option<String>,
    pub bonus_ids: Vec<u32>,
    pub enchant_ids: Vec<u32>,
    pub gem_ids: Vec<u32>,
    pub crafted_stats: Vec<u32>,
    /// Only the audit export carries a textual rank instead of bonus ids.
    pub rank_fraction: Option<RankFraction>,
}

type ItemKey = (GearSource, ItemId, Option<Slot>);

pub(crate) struct NormalizedSet<'c> {
    collab: &'c Collaborators<'c>,
    origin: SourceKind,
    items: BTreeMap<ItemKey, GearItem>,
    issues: Vec<SourceIssue>,
}

impl<'c> NormalizedSet<'c> {
    pub(crate) fn new(collab: &'c Collaborators<'c>, origin: SourceKind) -> Self {
        Self {
            collab,
            origin,
            items: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn issue(&mut self, kind: IssueKind, item_id: Option<ItemId>, detail: impl Into<String>) {
        let mut issue = SourceIssue::new(self.origin, kind, detail);
        issue.item_id = item_id;
        if kind == IssueKind::DecodeMiss {
            log::debug!("{}: item {:?} is off-track", self.origin, item_id);
        } else {
            issue.log();
        }
        self.issues.push(issue);
    }

    /// Record a skipped record.
    pub(crate) fn malformed(&mut self, record: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.issue(IssueKind::MalformedSourcePayload, None, format!("{record}: {reason}"));
    }

    /// Resolve one raw record and add it to the set. A catalog miss drops the
    /// record; a catalog failure aborts the whole normalization.
    pub(crate) fn push(
        &mut self,
        raw: RawGear,
        source: GearSource,
        equipped_slot: Option<Slot>,
    ) -> Result<(), LootError> {
        let collab = self.collab;
        let Some(catalog_item) = collab.catalog.lookup(raw.item_id)? else {
            self.issue(
                IssueKind::CatalogMiss,
                Some(raw.item_id),
                format!("item {} not in catalog, dropped", raw.item_id),
            );
            return Ok(());
        };

        let (item_track, track_inferred) = if let Some(ref fraction) = raw.rank_fraction {
            match collab.registry.decode_by_level_and_rank_delta(raw.item_level, fraction) {
                Some(m) => {
                    if m.ambiguous {
                        self.issue(
                            IssueKind::AmbiguousRank,
                            Some(raw.item_id),
                            format!(
                                "{}/{} at {} fits several tracks, picked {}",
                                fraction.current, fraction.total, raw.item_level, m.descriptor.family
                            ),
                        );
                    }
                    (Some(m.descriptor), m.inferred)
                }
                None => {
                    self.issue(
                        IssueKind::DecodeMiss,
                        Some(raw.item_id),
                        format!("no track with {} ranks", fraction.total),
                    );
                    (None, false)
                }
            }
        } else if !raw.bonus_ids.is_empty() {
            let decoded = collab.registry.decode_by_identifiers(&raw.bonus_ids);
            if decoded.is_none() {
                self.issue(IssueKind::DecodeMiss, Some(raw.item_id), "no track bonus id");
            }
            (decoded, false)
        } else {
            (None, false)
        };

        let item = GearItem {
            item_id: raw.item_id,
            name: if catalog_item.name.is_empty() {
                raw.name.unwrap_or_default()
            } else {
                catalog_item.name.clone()
            },
            slot_key: catalog_item.slot_key,
            source,
            origin: self.origin,
            equipped_slot,
            item_level: raw.item_level,
            bonus_ids: raw.bonus_ids,
            item_track,
            track_inferred,
            enchant_ids: raw.enchant_ids,
            gem_ids: raw.gem_ids,
            crafted_stats: raw.crafted_stats,
            is_tierset: catalog_item.is_tierset,
            is_token: catalog_item.is_token,
        };

        // Duplicate copies (e.g. two in the bag) collapse to the highest level.
        let key = (source, item.item_id, equipped_slot);
        match self.items.get(&key) {
            Some(existing) if existing.item_level >= item.item_level => {}
            _ => {
                self.items.insert(key, item);
            }
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Normalized {
        Normalized {
            items: self.items.into_values().collect(),
            issues: self.issues,
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers shared by the JSON feeds
// ---------------------------------------------------------------------------

/// Required unsigned integer field. Accepts numbers and numeric strings.
pub(crate) fn require_u32(obj: &Value, field: &str) -> Result<u32, String> {
    optional_u32(obj, field)?.ok_or_else(|| format!("missing '{field}'"))
}

/// Optional unsigned integer field; `null`, absent, and `0` are all `None`.
pub(crate) fn optional_u32(obj: &Value, field: &str) -> Result<Option<u32>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) if s.trim().is_empty() => return Ok(None),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            }
            .ok_or_else(|| format!("'{field}' is not an unsigned integer: {v}"))?;
            let n = u32::try_from(n).map_err(|_| format!("'{field}' out of range: {n}"))?;
            Ok((n != 0).then_some(n))
        }
    }
}

/// Id list field given either as a JSON array or a `/`-separated string.
pub(crate) fn id_list(obj: &Value, field: &str) -> Result<Vec<u32>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Number(_)) => Ok(optional_u32(obj, field)?.into_iter().collect()),
        Some(Value::String(s)) => split_ids(s).map_err(|e| format!("'{field}': {e}")),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| format!("'{field}' contains non-id {v}"))
            })
            .collect(),
        Some(other) => Err(format!("'{field}' has unexpected shape: {other}")),
    }
}

/// Parse `"10390/6652/1492"` (also accepts `:` separators).
pub(crate) fn split_ids(input: &str) -> Result<Vec<u32>, String> {
    input
        .split(['/', ':'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|_| format!("bad id '{s}'")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn u32_fields_accept_numbers_and_strings() {
        let obj = json!({"a": 12, "b": "34", "c": null, "d": 0, "e": "x", "f": -1});
        assert_eq!(require_u32(&obj, "a"), Ok(12));
        assert_eq!(require_u32(&obj, "b"), Ok(34));
        assert_eq!(optional_u32(&obj, "c"), Ok(None));
        assert_eq!(optional_u32(&obj, "d"), Ok(None));
        assert!(optional_u32(&obj, "e").is_err());
        assert!(optional_u32(&obj, "f").is_err());
        assert!(require_u32(&obj, "missing").unwrap_err().contains("missing"));
    }

    #[test]
    fn id_lists_from_both_shapes() {
        let obj = json!({"s": "10390/6652/", "a": [1, 2, 3], "n": 7, "bad": "1/x"});
        assert_eq!(id_list(&obj, "s"), Ok(vec![10390, 6652]));
        assert_eq!(id_list(&obj, "a"), Ok(vec![1, 2, 3]));
        assert_eq!(id_list(&obj, "n"), Ok(vec![7]));
        assert_eq!(id_list(&obj, "absent"), Ok(vec![]));
        assert!(id_list(&obj, "bad").is_err());
    }
}
