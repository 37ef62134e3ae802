//! Deck template: the static description of a fresh deck.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shuffler_protocol::CardType;

use crate::TableError;

// ---------------------------------------------------------------------------
// TemplateEntry
// ---------------------------------------------------------------------------

/// One line of a deck template: `count` copies of the card type `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// The card type these copies share.
    pub name: CardType,

    /// How many copies a fresh deck holds. Zero is allowed and simply
    /// contributes nothing.
    pub count: u32,
}

impl TemplateEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<CardType>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

// ---------------------------------------------------------------------------
// DeckTemplate
// ---------------------------------------------------------------------------

/// How many cards of each type exist in a fresh deck.
///
/// Loaded once when the host starts and never mutated afterwards. On disk
/// it is a JSON array:
///
/// ```json
/// [
///   { "name": "Attack", "count": 10 },
///   { "name": "Heal", "count": 5 }
/// ]
/// ```
///
/// Deserialization goes through [`TryFrom`], so a template read from a file
/// is validated exactly like one built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TemplateEntry>", into = "Vec<TemplateEntry>")]
pub struct DeckTemplate {
    entries: Vec<TemplateEntry>,
}

impl DeckTemplate {
    /// Builds a template, rejecting entries with a blank name.
    pub fn new(entries: Vec<TemplateEntry>) -> Result<Self, TableError> {
        if let Some(pos) = entries
            .iter()
            .position(|e| e.name.as_str().trim().is_empty())
        {
            return Err(TableError::InvalidTemplate(format!(
                "entry {pos} has an empty name"
            )));
        }
        Ok(Self { entries })
    }

    /// Builds a template from `(name, count)` pairs.
    pub fn from_pairs<S, I>(pairs: I) -> Result<Self, TableError>
    where
        S: Into<CardType>,
        I: IntoIterator<Item = (S, u32)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, count)| TemplateEntry::new(name, count))
                .collect(),
        )
    }

    /// Parses a template from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        serde_json::from_str(json)
            .map_err(|e| TableError::InvalidTemplate(e.to_string()))
    }

    /// Reads and parses a template file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| {
            TableError::TemplateIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let template = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            types = template.entries.len(),
            cards = template.total_cards(),
            "deck template loaded"
        );
        Ok(template)
    }

    /// The template lines, in declaration order.
    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    /// Number of physical cards in a fresh deck.
    pub fn total_cards(&self) -> usize {
        self.entries.iter().map(|e| e.count as usize).sum()
    }
}

/// The built-in deck used when the host is started without a template file.
impl Default for DeckTemplate {
    fn default() -> Self {
        Self {
            entries: vec![
                TemplateEntry::new("Attack", 10),
                TemplateEntry::new("Defend", 8),
                TemplateEntry::new("Heal", 5),
                TemplateEntry::new("Skip", 3),
                TemplateEntry::new("Wild", 2),
            ],
        }
    }
}

impl TryFrom<Vec<TemplateEntry>> for DeckTemplate {
    type Error = TableError;

    fn try_from(entries: Vec<TemplateEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<DeckTemplate> for Vec<TemplateEntry> {
    fn from(template: DeckTemplate) -> Self {
        template.entries
    }
}
