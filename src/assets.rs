//! Asset manifest
//!
//! The fixed list of model files that make up the showcase, in load order,
//! together with the name, selectability and offset each file's top-level
//! node receives.

use std::path::{Path, PathBuf};

use cgmath::Vector3;

use crate::content::NUMBERED_OBJECTS;

/// Name given to the ring model; clicking it toggles the light
pub const RING_NAME: &str = "ring";

#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    /// File name relative to the resources directory
    pub file: PathBuf,
    /// Name assigned to the file's top-level node, if any
    pub name: Option<String>,
    pub selectable: bool,
    pub offset: Option<Vector3<f32>>,
}

impl AssetEntry {
    pub fn decor(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            name: None,
            selectable: false,
            offset: None,
        }
    }

    pub fn selectable(file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: Some(name.into()),
            selectable: true,
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: Vector3<f32>) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AssetManifest {
    pub entries: Vec<AssetEntry>,
}

impl AssetManifest {
    pub fn new(entries: Vec<AssetEntry>) -> Self {
        Self { entries }
    }

    /// Full paths of every entry under `resources_dir`
    pub fn resolve<'a>(
        &'a self,
        resources_dir: &'a Path,
    ) -> impl Iterator<Item = (PathBuf, &'a AssetEntry)> + 'a {
        self.entries
            .iter()
            .map(move |entry| (resources_dir.join(&entry.file), entry))
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        let mut entries = vec![
            AssetEntry::decor("main.glb"),
            AssetEntry::decor("numeros.glb"),
            AssetEntry::selectable("ring.glb", RING_NAME),
            AssetEntry::decor("floor.glb").with_offset(Vector3::new(0.0, -0.1, 0.0)),
        ];
        for i in 1..=NUMBERED_OBJECTS {
            entries.push(AssetEntry::selectable(format!("{}.glb", i), i.to_string()));
        }
        entries.push(AssetEntry::decor("isv.glb"));

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_lists_showcase_files_in_order() {
        let manifest = AssetManifest::default();
        let files: Vec<_> = manifest
            .entries
            .iter()
            .map(|e| e.file.to_string_lossy().into_owned())
            .collect();

        assert_eq!(files.len(), 25);
        assert_eq!(&files[..4], ["main.glb", "numeros.glb", "ring.glb", "floor.glb"]);
        assert_eq!(files[4], "1.glb");
        assert_eq!(files[23], "20.glb");
        assert_eq!(files[24], "isv.glb");
    }

    #[test]
    fn only_ring_and_numbers_are_selectable() {
        let manifest = AssetManifest::default();
        for entry in &manifest.entries {
            let numbered = entry
                .name
                .as_deref()
                .map_or(false, |n| n.parse::<u32>().is_ok());
            let ring = entry.name.as_deref() == Some(RING_NAME);
            assert_eq!(entry.selectable, numbered || ring, "{:?}", entry.file);
        }
    }

    #[test]
    fn floor_is_lowered() {
        let manifest = AssetManifest::default();
        let floor = manifest
            .entries
            .iter()
            .find(|e| e.file == Path::new("floor.glb"))
            .unwrap();
        assert_eq!(floor.offset, Some(Vector3::new(0.0, -0.1, 0.0)));
    }

    #[test]
    fn resolve_joins_resources_dir() {
        let manifest = AssetManifest::new(vec![AssetEntry::decor("a.obj")]);
        let dir = PathBuf::from("models");
        let (path, _) = manifest.resolve(&dir).next().unwrap();
        assert_eq!(path, PathBuf::from("models/a.obj"));
    }
}
