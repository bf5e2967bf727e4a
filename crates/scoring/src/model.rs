use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceIssue;
use crate::slot::{ItemSlot, Slot};

pub type ItemId = u32;
pub type CharacterId = u64;
pub type EncounterId = u32;
pub type SpecId = u32;
pub type LootId = u64;
pub type SessionId = u64;

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[serde(alias = "raid_finder", alias = "lfr")]
    Lfr,
    Normal,
    Heroic,
    Mythic,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lfr => write!(f, "lfr"),
            Self::Normal => write!(f, "normal"),
            Self::Heroic => write!(f, "heroic"),
            Self::Mythic => write!(f, "mythic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerClass {
    DeathKnight,
    DemonHunter,
    Druid,
    Evoker,
    Hunter,
    Mage,
    Monk,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorType {
    Cloth,
    Leather,
    Mail,
    Plate,
    /// Jewelry, cloaks, trinkets, weapons, tokens.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tank,
    Healer,
    MeleeDps,
    RangedDps,
}

/// Which feed (or the assignment history) an item was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Simulation,
    Audit,
    Progression,
    History,
}

impl SourceKind {
    /// The three external gear feeds, in reconciliation order.
    pub const FEEDS: [SourceKind; 3] = [Self::Simulation, Self::Audit, Self::Progression];
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulation => write!(f, "simulation"),
            Self::Audit => write!(f, "audit"),
            Self::Progression => write!(f, "progression"),
            Self::History => write!(f, "history"),
        }
    }
}

/// Where on the character an item currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearSource {
    Equipped,
    Bag,
    Vault,
    BestEver,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One rung of an upgrade track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTrackDescriptor {
    pub family: String,
    pub rank: u8,
    pub max_rank: u8,
    pub item_level: u32,
}

/// Canonical normalized item, identical in shape for every feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GearItem {
    pub item_id: ItemId,
    pub name: String,
    pub slot_key: ItemSlot,
    pub source: GearSource,
    pub origin: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipped_slot: Option<Slot>,
    pub item_level: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bonus_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_track: Option<ItemTrackDescriptor>,
    /// True when `item_track` was extrapolated or picked among ambiguous families.
    pub track_inferred: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enchant_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gem_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crafted_stats: Vec<u32>,
    pub is_tierset: bool,
    pub is_token: bool,
}

/// A simulated upgrade after identity remapping and deduplication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeCandidate {
    pub resolved_item_id: ItemId,
    pub original_simulated_item_id: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tierset_item_id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalyzed_item_id: Option<ItemId>,
    pub encounter_id: EncounterId,
    pub slot: Slot,
    pub dps: f64,
    pub item_level: u32,
}

// ---------------------------------------------------------------------------
// Per-character aggregate
// ---------------------------------------------------------------------------

/// Last-updated timestamp of each feed; `None` when the feed has no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceFreshness {
    pub simulation: Option<DateTime<Utc>>,
    pub audit: Option<DateTime<Utc>>,
    pub progression: Option<DateTime<Utc>>,
}

impl SourceFreshness {
    pub fn get(&self, kind: SourceKind) -> Option<DateTime<Utc>> {
        match kind {
            SourceKind::Simulation => self.simulation,
            SourceKind::Audit => self.audit,
            SourceKind::Progression => self.progression,
            SourceKind::History => None,
        }
    }

    /// Newest timestamp among feeds that have data. Assignments after this
    /// point are not yet reflected in any feed.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        [self.simulation, self.audit, self.progression]
            .into_iter()
            .flatten()
            .max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterKill {
    pub difficulty: Difficulty,
    pub encounter_id: EncounterId,
    pub defeated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CharacterGearState {
    pub character_id: CharacterId,
    pub items: Vec<GearItem>,
    pub upgrades: BTreeMap<Difficulty, Vec<UpgradeCandidate>>,
    pub kills: Vec<EncounterKill>,
    pub freshness: SourceFreshness,
    pub issues: Vec<SourceIssue>,
}

impl CharacterGearState {
    pub fn empty(character_id: CharacterId) -> Self {
        Self {
            character_id,
            ..Self::default()
        }
    }

    pub fn upgrade_for(&self, difficulty: Difficulty, item_id: ItemId) -> Option<&UpgradeCandidate> {
        self.upgrades
            .get(&difficulty)?
            .iter()
            .find(|u| u.resolved_item_id == item_id)
    }
}

// ---------------------------------------------------------------------------
// Roster, history, loot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: CharacterId,
    pub name: String,
    pub class: PlayerClass,
    pub spec_id: SpecId,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub members: Vec<RosterMember>,
    /// Characters present per raid session.
    #[serde(default)]
    pub attendance: HashMap<SessionId, BTreeSet<CharacterId>>,
}

impl Roster {
    pub fn attended(&self, session: SessionId, character: CharacterId) -> bool {
        self.attendance
            .get(&session)
            .is_some_and(|present| present.contains(&character))
    }
}

/// One row of the loot-assignment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub loot_id: LootId,
    pub character_id: CharacterId,
    pub item_id: ItemId,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub item_level: Option<u32>,
    pub drop_date: DateTime<Utc>,
}

/// The dropped item being assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootDrop {
    pub loot_id: LootId,
    pub session_id: SessionId,
    pub item_id: ItemId,
    pub encounter_id: EncounterId,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub item_level: Option<u32>,
    pub dropped_at: DateTime<Utc>,
}

/// Curated best-in-slot declarations: item → specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BisTable {
    pub entries: HashMap<ItemId, Vec<SpecId>>,
}

impl BisTable {
    pub fn declare(&mut self, item_id: ItemId, spec_id: SpecId) {
        let specs = self.entries.entry(item_id).or_default();
        if !specs.contains(&spec_id) {
            specs.push(spec_id);
        }
    }

    /// Items declared BiS for one spec.
    pub fn items_for_spec(&self, spec_id: SpecId) -> impl Iterator<Item = ItemId> + '_ {
        self.entries
            .iter()
            .filter(move |(_, specs)| specs.contains(&spec_id))
            .map(|(item, _)| *item)
    }
}

// ---------------------------------------------------------------------------
// Scoring output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    MissingSimulation,
    MissingAudit,
    MissingProgression,
    /// Simulations exist, but none at the drop's difficulty.
    NoSimulationForDifficulty,
    StaleSimulation,
    StaleAudit,
    StaleProgression,
    /// Loot was assigned after the newest feed snapshot.
    UnreflectedAssignments,
    /// The slot baseline's upgrade track was inferred, not decoded.
    InferredTrack,
    /// A weekly reward choice already matches or beats the drop.
    VaultAlternative,
    /// A malformed record aborted this character's derivation.
    DataError,
}

impl Warning {
    pub fn missing(kind: SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Simulation => Some(Self::MissingSimulation),
            SourceKind::Audit => Some(Self::MissingAudit),
            SourceKind::Progression => Some(Self::MissingProgression),
            SourceKind::History => None,
        }
    }

    pub fn stale(kind: SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Simulation => Some(Self::StaleSimulation),
            SourceKind::Audit => Some(Self::StaleAudit),
            SourceKind::Progression => Some(Self::StaleProgression),
            SourceKind::History => None,
        }
    }

    pub fn is_freshness(&self) -> bool {
        matches!(
            self,
            Self::MissingSimulation
                | Self::MissingAudit
                | Self::MissingProgression
                | Self::NoSimulationForDifficulty
                | Self::StaleSimulation
                | Self::StaleAudit
                | Self::StaleProgression
        )
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingSimulation => "missing_simulation",
            Self::MissingAudit => "missing_audit",
            Self::MissingProgression => "missing_progression",
            Self::NoSimulationForDifficulty => "no_simulation_for_difficulty",
            Self::StaleSimulation => "stale_simulation",
            Self::StaleAudit => "stale_audit",
            Self::StaleProgression => "stale_progression",
            Self::UnreflectedAssignments => "unreflected_assignments",
            Self::InferredTrack => "inferred_track",
            Self::VaultAlternative => "vault_alternative",
            Self::DataError => "data_error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Bis,
    Simulated,
    Floor,
}

/// One rule applied while computing a score, in application order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScoreStep {
    BaseDps { dps: f64 },
    BisOverride { score: f64 },
    EqualOrBetterFloor { score: f64, owned_item_level: u32 },
    DataErrorFloor { score: f64, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum TierProvenance {
    Equipped(SourceKind),
    PendingAssignment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierPiece {
    pub slot: Slot,
    pub item_id: ItemId,
    pub provenance: TierProvenance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyRewardForecast {
    /// Distinct encounters defeated at the drop difficulty since the last reset.
    pub kills_this_reset: usize,
    pub unlocked_raid_slots: u8,
    /// Weekly reward choices that fit the dropped item's slot.
    pub offered: Vec<GearItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentCandidate {
    pub character: CharacterId,
    pub name: String,
    pub score: f64,
    pub tier: ScoreTier,
    pub flags: BTreeSet<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_in_slot: Option<GearItem>,
    pub tierset_count: usize,
    pub tier_pieces: Vec<TierPiece>,
    pub completes_set_bonus: bool,
    pub already_has_equal_or_better: bool,
    pub base_dps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item_level: Option<u32>,
    pub item_level_gap: i64,
    pub pending_assignments: usize,
    pub weekly_reward: WeeklyRewardForecast,
    pub steps: Vec<ScoreStep>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentSummary {
    pub eligible: usize,
    pub ineligible: usize,
    pub bis: usize,
    pub floor: usize,
    pub data_errors: usize,
    pub with_freshness_warnings: usize,
    pub warning_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentMeta {
    pub loot_id: LootId,
    pub item_id: ItemId,
    pub item_level: u32,
    pub difficulty: Difficulty,
    pub engine_version: String,
    pub scored_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub meta: AssignmentMeta,
    pub summary: AssignmentSummary,
    pub candidates: Vec<AssignmentCandidate>,
}
