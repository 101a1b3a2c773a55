//! # Object Information Catalog
//!
//! Text and media shown in the information panel once a focused object's
//! reveal delay has elapsed. Objects are identified by the number their
//! scene node is named after.

use std::{collections::BTreeMap, path::PathBuf};

/// Number of numbered objects in the showcase
pub const NUMBERED_OBJECTS: u32 = 20;

/// Content displayed for one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub title: String,
    pub content: String,
    pub image: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

impl InfoEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
            video: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn with_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.video = Some(path.into());
        self
    }
}

/// Lookup table from object number to [`InfoEntry`]
#[derive(Debug, Clone)]
pub struct InfoCatalog {
    entries: BTreeMap<u32, InfoEntry>,
}

impl InfoCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, number: u32, entry: InfoEntry) {
        self.entries.insert(number, entry);
    }

    pub fn get(&self, number: u32) -> Option<&InfoEntry> {
        self.entries.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut InfoEntry> {
        self.entries.get_mut(&number)
    }

    /// Entry keyed exactly by `object_name`.
    ///
    /// Only the plain decimal spelling of a number matches: `"7"` does,
    /// `"07"`, `"+7"` and `"7abc"` do not.
    pub fn entry_for(&self, object_name: &str) -> Option<&InfoEntry> {
        object_name
            .parse::<u32>()
            .ok()
            .filter(|n| n.to_string() == object_name)
            .and_then(|n| self.get(n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InfoCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for i in 1..=NUMBERED_OBJECTS {
            catalog.insert(
                i,
                InfoEntry::new(
                    format!("Objeto {}", i),
                    format!("Esta es información detallada sobre el objeto {}.", i),
                )
                .with_image(format!("images/{}.png", i)),
            );
        }

        // Object 3 plays a clip instead of showing a picture
        if let Some(entry) = catalog.get_mut(3) {
            entry.image = None;
            entry.video = Some(PathBuf::from("videos/3.mp4"));
        }

        catalog
    }
}

/// Whether an object name starts with a number and so can be focused.
///
/// Leading whitespace and one sign are skipped; anything after the first
/// digit is ignored and the digits may be arbitrarily long.
pub fn is_numbered(name: &str) -> bool {
    let trimmed = name.trim_start();
    let unsigned = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
}
