//! Human-readable labels for enumeration values.
//!
//! Keys are `<namespace>.<value>`, e.g. `instance_instance_type.mixed_materials`.
//! A missing key resolves to the raw value.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Immutable lookup table from enumeration keys to display labels.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl LabelTable {
    /// An empty table: every lookup falls back to the raw value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Labels the host ships with for the enumerations this exporter uses.
    pub fn english() -> Self {
        let entries: &[(&str, &str)] = &[
            ("instance_instance_type.audio", "Audio"),
            ("instance_instance_type.books", "Books"),
            ("instance_instance_type.computer_disks", "Computer Disks"),
            ("instance_instance_type.digital_object", "Digital Object"),
            ("instance_instance_type.graphic_materials", "Graphic Materials"),
            ("instance_instance_type.maps", "Maps"),
            ("instance_instance_type.microform", "Microform"),
            ("instance_instance_type.mixed_materials", "Mixed Materials"),
            ("instance_instance_type.moving_images", "Moving Images"),
            ("instance_instance_type.realia", "Realia"),
            ("instance_instance_type.text", "Text"),
            ("extent_extent_type.linear_feet", "linear feet"),
            ("extent_extent_type.cubic_feet", "cubic feet"),
            ("extent_extent_type.gigabytes", "gigabytes"),
            ("extent_extent_type.megabytes", "megabytes"),
            ("_note_types.bibliography", "Bibliography"),
            ("_note_types.index", "Index"),
            ("_note_types.accessrestrict", "Conditions Governing Access"),
            ("_note_types.processinfo", "Processing Information"),
        ];
        Self::from_pairs(entries.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Load a flat JSON object of `key: label` pairs.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let labels: HashMap<String, String> = serde_json::from_slice(bytes)?;
        Ok(Self { labels })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Entries of `other` override entries of `self`.
    pub fn merged(mut self, other: LabelTable) -> Self {
        self.labels.extend(other.labels);
        self
    }

    /// Resolve `value` in `namespace`, falling back to the value itself.
    pub fn resolve<'a>(&'a self, namespace: &str, value: &'a str) -> &'a str {
        self.labels
            .get(&format!("{namespace}.{value}"))
            .map_or(value, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_fallback() {
        let labels = LabelTable::english();
        assert_eq!(
            labels.resolve("instance_instance_type", "mixed_materials"),
            "Mixed Materials"
        );
        assert_eq!(labels.resolve("instance_instance_type", "zines"), "zines");
        assert_eq!(LabelTable::empty().resolve("x", "raw"), "raw");
    }

    #[test]
    fn test_from_json_and_merge() {
        let custom =
            LabelTable::from_json(br#"{"instance_instance_type.audio": "Sound"}"#).unwrap();
        let labels = LabelTable::english().merged(custom);
        assert_eq!(labels.resolve("instance_instance_type", "audio"), "Sound");
        assert_eq!(labels.resolve("instance_instance_type", "maps"), "Maps");
    }
}
