//! `raidloot-scoring`: gear-state reconciliation and loot-assignment scoring.
//!
//! Pure engine crate: receives pre-fetched feed snapshots and lookup tables,
//! returns a ranked, explainable recommendation. No network or storage IO.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod facts;
pub mod gear_state;
pub mod model;
pub mod normalize;
pub mod slot;
pub mod track;
pub mod upgrades;

pub use catalog::Collaborators;
pub use config::ScoringConfig;
pub use engine::{score_assignment, AssignmentInput};
pub use error::LootError;
pub use gear_state::{assemble, CharacterFeeds};
pub use model::{AssignmentCandidate, AssignmentResult, CharacterGearState, GearItem};
