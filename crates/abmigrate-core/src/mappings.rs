use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::MigrateError;

/// One symbol rename parsed from the mapping file: the library prefix the
/// symbol moves under, and its new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub prefix: String,
    pub new_symbol: String,
}

impl MappingEntry {
    /// File stem a script named after this entry's old symbol should take.
    ///
    /// When the new symbol already carries the library prefix it is used
    /// verbatim; otherwise the prefix is prepended.
    pub fn target_stem(&self) -> String {
        if self.new_symbol.starts_with(&self.prefix) {
            self.new_symbol.clone()
        } else {
            format!("{}{}", self.prefix, self.new_symbol)
        }
    }
}

/// Lookup table from old symbol name to its rename, keyed by old name.
///
/// Iteration order is the sorted key order, so substitution and log output
/// are reproducible run to run.
#[derive(Debug, Default)]
pub struct MappingTable {
    entries: BTreeMap<String, MappingEntry>,
}

impl MappingTable {
    pub fn load(path: &Path) -> Result<Self, MigrateError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses mapping directives of the form `<lib>.ab <old> <new>`.
    ///
    /// Lines not starting with a directive are ignored, so the file can
    /// carry comments and prose freely. A `new` name appearing twice is a
    /// fatal error: two symbols collapsing onto one target would make the
    /// migration ambiguous. A repeated `old` name keeps its last definition.
    pub fn parse(text: &str) -> Result<Self, MigrateError> {
        let directive = Regex::new(r"^(\w+)\.ab\s+(\w+)\s+(\w+)\b").unwrap();

        let mut entries = BTreeMap::new();
        let mut targets = HashSet::new();
        for line in text.lines() {
            if let Some(caps) = directive.captures(line) {
                let (lib, old, new) = (&caps[1], &caps[2], &caps[3]);
                if !targets.insert(new.to_string()) {
                    return Err(MigrateError::DuplicateTarget {
                        name: new.to_string(),
                    });
                }
                debug!("Mapping: {} -> {}_{}", old, lib, new);
                entries.insert(
                    old.to_string(),
                    MappingEntry {
                        prefix: format!("{}_", lib),
                        new_symbol: new.to_string(),
                    },
                );
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, old_symbol: &str) -> Option<&MappingEntry> {
        self.entries.get(old_symbol)
    }

    /// Target file stem for `stem`, if a mapping entry covers it.
    pub fn target_stem(&self, stem: &str) -> Option<String> {
        self.entries.get(stem).map(MappingEntry::target_stem)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(old, entry)| (old.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
