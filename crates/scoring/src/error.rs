use std::fmt;

use serde::Serialize;

use crate::model::{CharacterId, ItemId, SourceKind};

#[derive(Debug)]
pub enum LootError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad tier values, inconsistent track registry, etc.).
    ConfigValidation(String),
    /// Item catalog or a mapping table could not be read. The only fatal
    /// condition during scoring.
    CollaboratorUnavailable { collaborator: String, reason: String },
    /// A required field is missing or mistyped in one raw record.
    MalformedSourcePayload { source: SourceKind, record: String, reason: String },
    /// The dropped item itself cannot be scored (not in the catalog, no item level).
    UnscorableLoot { item_id: ItemId, reason: String },
    /// IO error (config file read, etc.).
    Io(String),
}

impl LootError {
    pub fn unavailable(collaborator: &str, reason: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable {
            collaborator: collaborator.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(source: SourceKind, record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSourcePayload {
            source,
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Fatal errors abort the whole batch; everything else is handled per record
    /// or per character.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedSourcePayload { .. })
    }
}

impl fmt::Display for LootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::CollaboratorUnavailable { collaborator, reason } => {
                write!(f, "{collaborator} unavailable: {reason}")
            }
            Self::MalformedSourcePayload { source, record, reason } => {
                write!(f, "source '{source}', record '{record}': {reason}")
            }
            Self::UnscorableLoot { item_id, reason } => {
                write!(f, "loot item {item_id} cannot be scored: {reason}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LootError {}

// ---------------------------------------------------------------------------
// Non-fatal issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Identifiers present but no registry entry matched.
    DecodeMiss,
    /// Item id absent from the item catalog; the item was dropped.
    CatalogMiss,
    /// One raw record was skipped.
    MalformedSourcePayload,
    /// A rank fraction fit several track families; closest one was picked.
    AmbiguousRank,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeMiss => write!(f, "decode_miss"),
            Self::CatalogMiss => write!(f, "catalog_miss"),
            Self::MalformedSourcePayload => write!(f, "malformed_source_payload"),
            Self::AmbiguousRank => write!(f, "ambiguous_rank"),
        }
    }
}

/// A recoverable problem found while reading one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceIssue {
    pub source: SourceKind,
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    pub detail: String,
}

impl SourceIssue {
    pub fn new(source: SourceKind, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            source,
            kind,
            character: None,
            item_id: None,
            detail: detail.into(),
        }
    }

    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_character(mut self, character: CharacterId) -> Self {
        self.character = Some(character);
        self
    }

    /// Emit the issue through the `log` facade.
    pub fn log(&self) {
        log::warn!(
            "{} [{}] item={:?} character={:?}: {}",
            self.kind,
            self.source,
            self.item_id,
            self.character,
            self.detail
        );
    }
}

impl LootError {
    /// The non-fatal issue this error degrades to, if any.
    pub fn as_issue(&self) -> Option<SourceIssue> {
        match self {
            Self::MalformedSourcePayload { source, record, reason } => Some(SourceIssue::new(
                *source,
                IssueKind::MalformedSourcePayload,
                format!("{record}: {reason}"),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collaborator_unavailable() {
        let err = LootError::unavailable("item catalog", "connection refused");
        assert_eq!(err.to_string(), "item catalog unavailable: connection refused");
        assert!(err.is_fatal());
    }

    #[test]
    fn malformed_is_not_fatal() {
        let err = LootError::malformed(SourceKind::Audit, "row 3", "missing head_ilvl");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("row 3"));
        assert_eq!(err.as_issue().unwrap().kind, IssueKind::MalformedSourcePayload);
    }
}
