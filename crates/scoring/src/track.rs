//! Item upgrade-track registry and decoder.
//!
//! Items carry opaque bonus ids; a handful of those ids place the item on an
//! upgrade track ("Hero 3/6"). The registry maps each such id to one
//! [`ItemTrackDescriptor`]. Feeds that only expose a `current/total` string
//! are decoded by item level within the families whose max rank equals
//! `total`.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::error::LootError;
use crate::model::ItemTrackDescriptor;

/// One registry row: a bonus id and the track rung it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackEntry {
    pub bonus_id: u32,
    pub family: String,
    pub rank: u8,
    pub max_rank: u8,
    pub item_level: u32,
}

impl TrackEntry {
    pub fn descriptor(&self) -> ItemTrackDescriptor {
        ItemTrackDescriptor {
            family: self.family.clone(),
            rank: self.rank,
            max_rank: self.max_rank,
            item_level: self.item_level,
        }
    }
}

/// Built-in season table: (bonus id, family, rank, max rank, item level).
const BUILTIN_TRACKS: &[(u32, &str, u8, u8, u32)] = &[
    (11942, "Explorer", 1, 8, 597),
    (11943, "Explorer", 2, 8, 600),
    (11944, "Explorer", 3, 8, 603),
    (11945, "Explorer", 4, 8, 607),
    (11946, "Explorer", 5, 8, 610),
    (11947, "Explorer", 6, 8, 613),
    (11948, "Explorer", 7, 8, 616),
    (11949, "Explorer", 8, 8, 620),
    (11950, "Adventurer", 1, 8, 610),
    (11951, "Adventurer", 2, 8, 613),
    (11952, "Adventurer", 3, 8, 616),
    (11953, "Adventurer", 4, 8, 620),
    (11954, "Adventurer", 5, 8, 623),
    (11955, "Adventurer", 6, 8, 626),
    (11956, "Adventurer", 7, 8, 629),
    (11957, "Adventurer", 8, 8, 633),
    (11958, "Veteran", 1, 8, 623),
    (11959, "Veteran", 2, 8, 626),
    (11960, "Veteran", 3, 8, 629),
    (11961, "Veteran", 4, 8, 633),
    (11962, "Veteran", 5, 8, 636),
    (11963, "Veteran", 6, 8, 639),
    (11964, "Veteran", 7, 8, 642),
    (11965, "Veteran", 8, 8, 646),
    (11966, "Champion", 1, 8, 636),
    (11967, "Champion", 2, 8, 639),
    (11968, "Champion", 3, 8, 642),
    (11969, "Champion", 4, 8, 646),
    (11970, "Champion", 5, 8, 649),
    (11971, "Champion", 6, 8, 652),
    (11972, "Champion", 7, 8, 655),
    (11973, "Champion", 8, 8, 659),
    (11980, "Hero", 1, 6, 649),
    (11981, "Hero", 2, 6, 652),
    (11982, "Hero", 3, 6, 655),
    (11983, "Hero", 4, 6, 659),
    (11984, "Hero", 5, 6, 662),
    (11985, "Hero", 6, 6, 665),
    (11991, "Myth", 1, 6, 662),
    (11992, "Myth", 2, 6, 665),
    (11993, "Myth", 3, 6, 668),
    (11994, "Myth", 4, 6, 672),
    (11995, "Myth", 5, 6, 675),
    (11996, "Myth", 6, 6, 678),
];

// ---------------------------------------------------------------------------
// Rank fractions
// ---------------------------------------------------------------------------

/// A textual rank such as `"4/6"` or `"Hero 4/6"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankFraction {
    pub family: Option<String>,
    pub current: u8,
    pub total: u8,
}

impl RankFraction {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let slash = input.find('/')?;
        let (head, tail) = input.split_at(slash);
        let total: u8 = tail[1..].trim().parse().ok()?;

        let head = head.trim_end();
        let digits_start = head
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let current: u8 = head[digits_start..].parse().ok()?;
        let family = head[..digits_start].trim();

        if total == 0 || current == 0 || current > total {
            return None;
        }

        Some(Self {
            family: (!family.is_empty()).then(|| family.to_string()),
            current,
            total,
        })
    }

    /// How many ranks the item still has to climb.
    pub fn rank_delta(&self) -> u8 {
        self.total - self.current
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Result of a level/rank decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMatch {
    pub descriptor: ItemTrackDescriptor,
    /// Not an exact item-level hit: walked, extrapolated, or chosen among ties.
    pub inferred: bool,
    /// Several families fit equally well.
    pub ambiguous: bool,
}

#[derive(Debug, Clone)]
pub struct TrackRegistry {
    entries: Vec<TrackEntry>,
    /// Family name → entry indices sorted by rank. Iterated in first-seen order.
    families: Vec<(String, Vec<usize>)>,
}

impl TrackRegistry {
    /// The registry compiled into the crate.
    pub fn builtin() -> Self {
        let entries = BUILTIN_TRACKS
            .iter()
            .map(|&(bonus_id, family, rank, max_rank, item_level)| TrackEntry {
                bonus_id,
                family: family.to_string(),
                rank,
                max_rank,
                item_level,
            })
            .collect();
        Self::index(entries)
    }

    /// Build from externally supplied entries, rejecting inconsistent tables.
    pub fn from_entries(entries: Vec<TrackEntry>) -> Result<Self, LootError> {
        let registry = Self::index(entries);
        registry.validate()?;
        Ok(registry)
    }

    fn index(entries: Vec<TrackEntry>) -> Self {
        let mut families: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            match families.iter_mut().find(|(name, _)| *name == entry.family) {
                Some((_, idxs)) => idxs.push(i),
                None => families.push((entry.family.clone(), vec![i])),
            }
        }
        for (_, idxs) in &mut families {
            idxs.sort_by_key(|&i| entries[i].rank);
        }
        Self { entries, families }
    }

    pub fn validate(&self) -> Result<(), LootError> {
        let mut seen: HashMap<u32, &str> = HashMap::new();
        for entry in &self.entries {
            if let Some(prev) = seen.insert(entry.bonus_id, entry.family.as_str()) {
                return Err(LootError::ConfigValidation(format!(
                    "track bonus id {} listed twice ({prev}, {})",
                    entry.bonus_id, entry.family
                )));
            }
            if entry.rank == 0 || entry.rank > entry.max_rank {
                return Err(LootError::ConfigValidation(format!(
                    "track bonus id {}: rank {} outside 1..={}",
                    entry.bonus_id, entry.rank, entry.max_rank
                )));
            }
        }

        for (family, idxs) in &self.families {
            let first = &self.entries[idxs[0]];
            for pair in idxs.windows(2) {
                let (a, b) = (&self.entries[pair[0]], &self.entries[pair[1]]);
                if b.max_rank != first.max_rank {
                    return Err(LootError::ConfigValidation(format!(
                        "track family '{family}' mixes max ranks {} and {}",
                        first.max_rank, b.max_rank
                    )));
                }
                if a.rank == b.rank || a.item_level >= b.item_level {
                    return Err(LootError::ConfigValidation(format!(
                        "track family '{family}': rank {} ({}) must be below rank {} ({})",
                        a.rank, a.item_level, b.rank, b.item_level
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|(name, _)| name.as_str())
    }

    /// Entries of one family sorted by rank.
    pub fn family(&self, name: &str) -> Vec<&TrackEntry> {
        self.families
            .iter()
            .find(|(family, _)| family == name)
            .map(|(_, idxs)| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// First registry entry whose bonus id occurs in `ids`.
    pub fn decode_by_identifiers(&self, ids: &[u32]) -> Option<ItemTrackDescriptor> {
        self.entries
            .iter()
            .find(|entry| ids.contains(&entry.bonus_id))
            .map(TrackEntry::descriptor)
    }

    /// Decode an item level plus a `current/total` rank fraction.
    ///
    /// Candidate families are those whose max rank equals `total` (narrowed
    /// by the fraction's family name when present). An exact item-level hit
    /// is authoritative. Otherwise the walk goes `rank_delta` rungs down from
    /// each family's top; rungs missing from the table are extrapolated from
    /// adjacent entries of the same family. If the walk leaves the family the
    /// closest entry by item level is used. Anything but an exact hit is
    /// marked inferred.
    pub fn decode_by_level_and_rank_delta(
        &self,
        item_level: u32,
        fraction: &RankFraction,
    ) -> Option<TrackMatch> {
        let candidates = self.candidate_families(fraction);
        if candidates.is_empty() {
            return None;
        }

        if let Some(found) = self.exact_level_match(&candidates, item_level, fraction.current) {
            return Some(found);
        }

        let mut walked: Vec<(u32, ItemTrackDescriptor)> = Vec::new();
        for (_, idxs) in &candidates {
            let family = self.family_slice(idxs);
            if let Some(desc) = walk_back(&family, fraction.rank_delta()) {
                walked.push((desc.item_level.abs_diff(item_level), desc));
            }
        }
        if !walked.is_empty() {
            return Some(pick_closest(walked));
        }

        let fallback: Vec<(u32, ItemTrackDescriptor)> = candidates
            .iter()
            .flat_map(|(_, idxs)| idxs.iter().map(|&i| &self.entries[i]))
            .map(|e| (e.item_level.abs_diff(item_level), e.descriptor()))
            .collect();
        Some(pick_closest(fallback))
    }

    fn candidate_families(&self, fraction: &RankFraction) -> Vec<&(String, Vec<usize>)> {
        let by_max: Vec<&(String, Vec<usize>)> = self
            .families
            .iter()
            .filter(|(_, idxs)| self.entries[idxs[0]].max_rank == fraction.total)
            .collect();

        if let Some(ref hint) = fraction.family {
            let named: Vec<_> = by_max
                .iter()
                .copied()
                .filter(|(name, _)| name.eq_ignore_ascii_case(hint))
                .collect();
            if !named.is_empty() {
                return named;
            }
        }
        by_max
    }

    fn exact_level_match(
        &self,
        candidates: &[&(String, Vec<usize>)],
        item_level: u32,
        current: u8,
    ) -> Option<TrackMatch> {
        let hits: Vec<&TrackEntry> = candidates
            .iter()
            .flat_map(|(_, idxs)| idxs.iter().map(|&i| &self.entries[i]))
            .filter(|e| e.item_level == item_level)
            .collect();

        match hits.len() {
            0 => None,
            1 => Some(TrackMatch {
                descriptor: hits[0].descriptor(),
                inferred: false,
                ambiguous: false,
            }),
            _ => {
                let same_rank: Vec<&&TrackEntry> =
                    hits.iter().filter(|e| e.rank == current).collect();
                if same_rank.len() == 1 {
                    return Some(TrackMatch {
                        descriptor: same_rank[0].descriptor(),
                        inferred: false,
                        ambiguous: false,
                    });
                }
                let chosen = same_rank.first().map(|e| **e).unwrap_or(hits[0]);
                Some(TrackMatch {
                    descriptor: chosen.descriptor(),
                    inferred: true,
                    ambiguous: true,
                })
            }
        }
    }

    fn family_slice(&self, idxs: &[usize]) -> Vec<&TrackEntry> {
        idxs.iter().map(|&i| &self.entries[i]).collect()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Walk `rank_delta` rungs down from the family's max rank.
fn walk_back(family: &[&TrackEntry], rank_delta: u8) -> Option<ItemTrackDescriptor> {
    let top = family.last()?;
    let target = top.max_rank.checked_sub(rank_delta).filter(|r| *r >= 1)?;

    if let Some(entry) = family.iter().find(|e| e.rank == target) {
        return Some(entry.descriptor());
    }

    let item_level = extrapolate_level(family, target)?;
    Some(ItemTrackDescriptor {
        family: top.family.clone(),
        rank: target,
        max_rank: top.max_rank,
        item_level,
    })
}

/// Item level of a rung absent from the table, using the step between the
/// nearest known rungs of the same family.
fn extrapolate_level(family: &[&TrackEntry], target: u8) -> Option<u32> {
    let below = family.iter().rev().find(|e| e.rank < target);
    let above = family.iter().find(|e| e.rank > target);

    let level = match (below, above) {
        (Some(lo), Some(hi)) => {
            let span = i64::from(hi.item_level) - i64::from(lo.item_level);
            let ranks = i64::from(hi.rank - lo.rank);
            i64::from(lo.item_level) + span * i64::from(target - lo.rank) / ranks
        }
        (Some(lo), None) => {
            let prev = family.iter().rev().find(|e| e.rank < lo.rank)?;
            let step = (i64::from(lo.item_level) - i64::from(prev.item_level))
                / i64::from(lo.rank - prev.rank);
            i64::from(lo.item_level) + step * i64::from(target - lo.rank)
        }
        (None, Some(hi)) => {
            let next = family.iter().find(|e| e.rank > hi.rank)?;
            let step = (i64::from(next.item_level) - i64::from(hi.item_level))
                / i64::from(next.rank - hi.rank);
            i64::from(hi.item_level) - step * i64::from(hi.rank - target)
        }
        (None, None) => return None,
    };
    u32::try_from(level).ok()
}

/// Closest by item-level distance; ties keep registry order and are ambiguous.
fn pick_closest(mut scored: Vec<(u32, ItemTrackDescriptor)>) -> TrackMatch {
    // Stable sort keeps registry order among equal distances.
    scored.sort_by_key(|(dist, _)| *dist);
    let best = scored[0].0;
    let ambiguous = scored
        .iter()
        .take_while(|(dist, _)| *dist == best)
        .map(|(_, d)| d.family.as_str())
        .collect::<BTreeSet<_>>()
        .len()
        > 1;
    TrackMatch {
        descriptor: scored.swap_remove(0).1,
        inferred: true,
        ambiguous,
    }
}
