//! Canonical equipment slots and the per-feed slot-key tables.
//!
//! Every feed spells paired slots differently (`finger1`, `finger_1`,
//! `mainhand`, `main_hand`, …). Each feed gets exactly one closed table
//! mapping its keys to [`Slot`]; a key absent from the table is a malformed
//! record, never a silent rewrite.

use serde::{Deserialize, Serialize};

/// A physical equipment position on a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Head,
    Neck,
    Shoulder,
    Back,
    Chest,
    Wrist,
    Hands,
    Waist,
    Legs,
    Feet,
    Finger1,
    Finger2,
    Trinket1,
    Trinket2,
    MainHand,
    OffHand,
}

impl Slot {
    pub const ALL: [Slot; 16] = [
        Slot::Head,
        Slot::Neck,
        Slot::Shoulder,
        Slot::Back,
        Slot::Chest,
        Slot::Wrist,
        Slot::Hands,
        Slot::Waist,
        Slot::Legs,
        Slot::Feet,
        Slot::Finger1,
        Slot::Finger2,
        Slot::Trinket1,
        Slot::Trinket2,
        Slot::MainHand,
        Slot::OffHand,
    ];

    /// Slots that hold tier-set pieces.
    pub fn is_tier_slot(self) -> bool {
        matches!(self, Slot::Head | Slot::Shoulder | Slot::Chest | Slot::Hands | Slot::Legs)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Slot::Head => "head",
            Slot::Neck => "neck",
            Slot::Shoulder => "shoulder",
            Slot::Back => "back",
            Slot::Chest => "chest",
            Slot::Wrist => "wrist",
            Slot::Hands => "hands",
            Slot::Waist => "waist",
            Slot::Legs => "legs",
            Slot::Feet => "feet",
            Slot::Finger1 => "finger1",
            Slot::Finger2 => "finger2",
            Slot::Trinket1 => "trinket1",
            Slot::Trinket2 => "trinket2",
            Slot::MainHand => "main_hand",
            Slot::OffHand => "off_hand",
        };
        write!(f, "{s}")
    }
}

/// The inventory type an item catalog assigns to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSlot {
    Head,
    Neck,
    Shoulder,
    Back,
    Chest,
    Wrist,
    Hands,
    Waist,
    Legs,
    Feet,
    Finger,
    Trinket,
    OneHand,
    TwoHand,
    MainHand,
    OffHand,
}

impl ItemSlot {
    /// Positions an item of this type can occupy.
    pub fn equip_slots(self) -> &'static [Slot] {
        match self {
            ItemSlot::Head => &[Slot::Head],
            ItemSlot::Neck => &[Slot::Neck],
            ItemSlot::Shoulder => &[Slot::Shoulder],
            ItemSlot::Back => &[Slot::Back],
            ItemSlot::Chest => &[Slot::Chest],
            ItemSlot::Wrist => &[Slot::Wrist],
            ItemSlot::Hands => &[Slot::Hands],
            ItemSlot::Waist => &[Slot::Waist],
            ItemSlot::Legs => &[Slot::Legs],
            ItemSlot::Feet => &[Slot::Feet],
            ItemSlot::Finger => &[Slot::Finger1, Slot::Finger2],
            ItemSlot::Trinket => &[Slot::Trinket1, Slot::Trinket2],
            ItemSlot::OneHand => &[Slot::MainHand, Slot::OffHand],
            ItemSlot::TwoHand | ItemSlot::MainHand => &[Slot::MainHand],
            ItemSlot::OffHand => &[Slot::OffHand],
        }
    }

    pub fn is_paired(self) -> bool {
        self.equip_slots().len() > 1
    }

    /// True when an item of type `other` competes for a position with `self`.
    pub fn overlaps(self, other: ItemSlot) -> bool {
        self.equip_slots()
            .iter()
            .any(|s| other.equip_slots().contains(s))
    }
}

// ---------------------------------------------------------------------------
// Per-feed key tables
// ---------------------------------------------------------------------------

/// What a feed's slot key denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Equip(Slot),
    /// Cosmetic positions (shirt, tabard) the feed reports but we never score.
    Ignored,
}

/// `(feed key, slot)` rows for one feed shape.
pub type SlotTable = &'static [(&'static str, SlotField)];

/// Simulation report: equipped map keys, bag/vault text lines, upgrade records.
pub const SIMULATION_SLOTS: SlotTable = &[
    ("head", SlotField::Equip(Slot::Head)),
    ("neck", SlotField::Equip(Slot::Neck)),
    ("shoulder", SlotField::Equip(Slot::Shoulder)),
    ("back", SlotField::Equip(Slot::Back)),
    ("chest", SlotField::Equip(Slot::Chest)),
    ("wrist", SlotField::Equip(Slot::Wrist)),
    ("hands", SlotField::Equip(Slot::Hands)),
    ("waist", SlotField::Equip(Slot::Waist)),
    ("legs", SlotField::Equip(Slot::Legs)),
    ("feet", SlotField::Equip(Slot::Feet)),
    ("finger1", SlotField::Equip(Slot::Finger1)),
    ("finger2", SlotField::Equip(Slot::Finger2)),
    ("trinket1", SlotField::Equip(Slot::Trinket1)),
    ("trinket2", SlotField::Equip(Slot::Trinket2)),
    ("main_hand", SlotField::Equip(Slot::MainHand)),
    ("off_hand", SlotField::Equip(Slot::OffHand)),
    ("shirt", SlotField::Ignored),
    ("tabard", SlotField::Ignored),
];

/// Audit export: flat-row field prefixes (`<prefix>_id`, `<prefix>_ilvl`, …).
pub const AUDIT_SLOTS: SlotTable = &[
    ("head", SlotField::Equip(Slot::Head)),
    ("neck", SlotField::Equip(Slot::Neck)),
    ("shoulder", SlotField::Equip(Slot::Shoulder)),
    ("back", SlotField::Equip(Slot::Back)),
    ("chest", SlotField::Equip(Slot::Chest)),
    ("wrist", SlotField::Equip(Slot::Wrist)),
    ("hands", SlotField::Equip(Slot::Hands)),
    ("waist", SlotField::Equip(Slot::Waist)),
    ("legs", SlotField::Equip(Slot::Legs)),
    ("feet", SlotField::Equip(Slot::Feet)),
    ("finger_1", SlotField::Equip(Slot::Finger1)),
    ("finger_2", SlotField::Equip(Slot::Finger2)),
    ("trinket_1", SlotField::Equip(Slot::Trinket1)),
    ("trinket_2", SlotField::Equip(Slot::Trinket2)),
    ("main_hand", SlotField::Equip(Slot::MainHand)),
    ("off_hand", SlotField::Equip(Slot::OffHand)),
];

/// Progression API: `gear.items` map keys.
pub const PROGRESSION_SLOTS: SlotTable = &[
    ("head", SlotField::Equip(Slot::Head)),
    ("neck", SlotField::Equip(Slot::Neck)),
    ("shoulder", SlotField::Equip(Slot::Shoulder)),
    ("back", SlotField::Equip(Slot::Back)),
    ("chest", SlotField::Equip(Slot::Chest)),
    ("wrist", SlotField::Equip(Slot::Wrist)),
    ("hands", SlotField::Equip(Slot::Hands)),
    ("waist", SlotField::Equip(Slot::Waist)),
    ("legs", SlotField::Equip(Slot::Legs)),
    ("feet", SlotField::Equip(Slot::Feet)),
    ("finger1", SlotField::Equip(Slot::Finger1)),
    ("finger2", SlotField::Equip(Slot::Finger2)),
    ("trinket1", SlotField::Equip(Slot::Trinket1)),
    ("trinket2", SlotField::Equip(Slot::Trinket2)),
    ("mainhand", SlotField::Equip(Slot::MainHand)),
    ("offhand", SlotField::Equip(Slot::OffHand)),
    ("shirt", SlotField::Ignored),
    ("tabard", SlotField::Ignored),
];

/// Look up a feed key (case-insensitive, surrounding whitespace ignored).
pub fn lookup(table: SlotTable, key: &str) -> Option<SlotField> {
    let key = key.trim();
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, field)| *field)
}

/// Every canonical slot reachable from `table`, each exactly once.
pub fn is_exhaustive(table: SlotTable) -> bool {
    Slot::ALL.iter().all(|slot| {
        table
            .iter()
            .filter(|(_, field)| *field == SlotField::Equip(*slot))
            .count()
            == 1
    })
}
