use std::collections::HashSet;

use anyhow::{ensure, Context};

use crate::catalog::repo_types::{CatalogEntry, Character};

const ENTRIES_JSON: &str = include_str!("../../data/catalog.json");
const CHARACTERS_JSON: &str = include_str!("../../data/characters.json");

/// Read-only seed collections, parsed once at start-up.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    characters: Vec<Character>,
}

impl Catalog {
    pub fn load() -> anyhow::Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(ENTRIES_JSON).context("parse seed catalog entries")?;
        let characters: Vec<Character> =
            serde_json::from_str(CHARACTERS_JSON).context("parse seed characters")?;
        Self::from_parts(entries, characters)
    }

    pub fn from_parts(entries: Vec<CatalogEntry>, characters: Vec<Character>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            ensure!(seen.insert(entry.id), "duplicate catalog entry id {}", entry.id);
        }
        seen.clear();
        for character in &characters {
            ensure!(seen.insert(character.id), "duplicate character id {}", character.id);
        }
        Ok(Self { entries, characters })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }
}
