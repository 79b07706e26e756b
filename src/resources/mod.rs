//! Static image metadata loaded from the resources directory
//!
//! Each images group is read once at startup and shared read-only with the
//! commands that look records up in it.

mod metadata;

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub use metadata::ImageMetadata;
use metadata::RawImage;

/// File holding the band plan charts
pub const BANDCHARTS_FILE: &str = "bandcharts.1.json";
/// File holding the maps
pub const MAPS_FILE: &str = "maps.1.json";

/// Errors raised while loading an images group
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must contain a JSON object or array of images", .path.display())]
    Shape { path: PathBuf },

    #[error("image at index {index} in {} has no key", .path.display())]
    EmptyKey { path: PathBuf, index: usize },

    #[error("duplicate image key '{key}' in {}", .path.display())]
    DuplicateKey { path: PathBuf, key: String },
}

/// An ordered, immutable collection of image metadata keyed by lowercase code
#[derive(Debug, Clone, Default)]
pub struct ImagesGroup {
    images: Vec<ImageMetadata>,
    index: HashMap<String, usize>,
}

impl ImagesGroup {
    /// Load a group from a JSON resource file
    ///
    /// The file is either an object mapping codes to records or an array of
    /// records that each carry a `key`. File order is kept.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let group = Self::from_json(&content, path)?;
        info!("Loaded {} images from {}", group.len(), path.display());
        Ok(group)
    }

    /// Parse a group from JSON text; `path` is only used for error messages
    pub fn from_json(content: &str, path: &Path) -> Result<Self, ResourceError> {
        let parse_error = |source: serde_json::Error| ResourceError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let value: Value = serde_json::from_str(content).map_err(parse_error)?;

        let mut records = Vec::new();
        match value {
            Value::Object(map) => {
                for (key, record) in map {
                    let raw: RawImage = serde_json::from_value(record).map_err(parse_error)?;
                    records.push(raw.into_metadata(&key));
                }
            }
            Value::Array(items) => {
                for (index, record) in items.into_iter().enumerate() {
                    let raw: RawImage = serde_json::from_value(record).map_err(parse_error)?;
                    let key = raw.key.clone().unwrap_or_default();
                    let metadata = raw.into_metadata(&key);
                    if metadata.key.is_empty() {
                        return Err(ResourceError::EmptyKey {
                            path: path.to_path_buf(),
                            index,
                        });
                    }
                    records.push(metadata);
                }
            }
            _ => {
                return Err(ResourceError::Shape {
                    path: path.to_path_buf(),
                });
            }
        }

        let group = Self::from_records(records, path)?;
        debug!("Parsed images group from {}", path.display());
        Ok(group)
    }

    fn from_records(records: Vec<ImageMetadata>, path: &Path) -> Result<Self, ResourceError> {
        let mut group = ImagesGroup::default();
        for mut metadata in records {
            metadata.key = metadata.key.to_lowercase();
            if group.index.contains_key(&metadata.key) {
                return Err(ResourceError::DuplicateKey {
                    path: path.to_path_buf(),
                    key: metadata.key,
                });
            }
            group.index.insert(metadata.key.clone(), group.images.len());
            group.images.push(metadata);
        }
        Ok(group)
    }

    /// Build a group directly from records, with the same key rules as files
    #[cfg(test)]
    pub fn from_images<I: IntoIterator<Item = ImageMetadata>>(
        images: I,
    ) -> Result<Self, ResourceError> {
        Self::from_records(images.into_iter().collect(), Path::new("<memory>"))
    }

    /// Look up a record by code, ignoring case
    pub fn get(&self, key: &str) -> Option<&ImageMetadata> {
        self.index
            .get(&key.to_lowercase())
            .map(|&position| &self.images[position])
    }

    /// Check whether a code exists in the group, ignoring case
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over the records in file order
    pub fn iter(&self) -> impl Iterator<Item = &ImageMetadata> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// The two images groups the bot serves, shared read-only
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    pub bandcharts: Arc<ImagesGroup>,
    pub maps: Arc<ImagesGroup>,
}

impl ImageLibrary {
    /// Load both groups; either file failing aborts the load
    pub fn load<P: AsRef<Path>>(bandcharts_path: P, maps_path: P) -> Result<Self, ResourceError> {
        Ok(ImageLibrary {
            bandcharts: Arc::new(ImagesGroup::load(bandcharts_path)?),
            maps: Arc::new(ImagesGroup::load(maps_path)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEYED: &str = r#"{
        "us": {
            "name": "United States",
            "long_name": "United States of America",
            "emoji": "🇺🇸",
            "description": "Amateur allocations",
            "source": "FCC",
            "filename": "bandcharts/us.png"
        },
        "CA": {
            "name": "Canada",
            "long_name": "Canada",
            "emoji": null,
            "description": "",
            "source": null,
            "filename": "bandcharts/ca.png"
        }
    }"#;

    #[test]
    fn test_load_keyed_file_keeps_order() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", KEYED)?;

        let group = ImagesGroup::load(file.path())?;

        let keys: Vec<&str> = group.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["us", "ca"]);
        assert_eq!(group.len(), 2);

        let ca = group.get("ca").unwrap();
        assert_eq!(ca.description, None);
        assert_eq!(ca.emoji, None);
        Ok(())
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let group = ImagesGroup::from_json(KEYED, Path::new("test.json")).unwrap();

        for key in ["us", "US", "Us"] {
            let found = group.get(key).unwrap();
            assert_eq!(found.key, "us");
            assert_eq!(found.filename, "bandcharts/us.png");
            assert_eq!(found.source.as_deref(), Some("FCC"));
        }
        assert!(group.contains("Ca"));
        assert!(group.get("zz").is_none());
        assert!(group.get("").is_none());
    }

    #[test]
    fn test_load_list_file() {
        let json = r#"[
            {"key": "Mercator", "name": "Mercator", "long_name": "Mercator Map", "filename": "merc.png"},
            {"key": "cq", "name": "CQ Zones", "long_name": "CQ Zones Map", "emoji": "🌍", "filename": "cq.png"}
        ]"#;

        let group = ImagesGroup::from_json(json, Path::new("maps.json")).unwrap();

        let keys: Vec<&str> = group.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["mercator", "cq"]);
        assert_eq!(group.get("CQ").unwrap().emoji.as_deref(), Some("🌍"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let json = r#"{
            "us": {"name": "a", "long_name": "a", "filename": "a.png"},
            "US": {"name": "b", "long_name": "b", "filename": "b.png"}
        }"#;

        let err = ImagesGroup::from_json(json, Path::new("dup.json")).unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateKey { ref key, .. } if key == "us"));
    }

    #[test]
    fn test_duplicate_records_rejected() {
        let image = |key: &str| ImageMetadata {
            key: key.to_string(),
            name: "a".to_string(),
            long_name: "a".to_string(),
            emoji: None,
            description: None,
            source: None,
            filename: "a.png".to_string(),
        };

        let err = ImagesGroup::from_images(vec![image("us"), image("US")]).unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateKey { ref key, .. } if key == "us"));

        let group = ImagesGroup::from_images(vec![image("US"), image("ca")]).unwrap();
        assert!(group.contains("us"));
    }

    #[test]
    fn test_list_entry_without_key_rejected() {
        let json = r#"[{"name": "a", "long_name": "a", "filename": "a.png"}]"#;

        let err = ImagesGroup::from_json(json, Path::new("nokey.json")).unwrap_err();
        assert!(matches!(err, ResourceError::EmptyKey { index: 0, .. }));
    }

    #[test]
    fn test_bad_shapes_rejected() {
        assert!(matches!(
            ImagesGroup::from_json("42", Path::new("x.json")),
            Err(ResourceError::Shape { .. })
        ));
        assert!(matches!(
            ImagesGroup::from_json("{not json", Path::new("x.json")),
            Err(ResourceError::Parse { .. })
        ));
        assert!(matches!(
            ImagesGroup::from_json(r#"{"us": {"name": "x"}}"#, Path::new("x.json")),
            Err(ResourceError::Parse { .. })
        ));
    }

    #[test]
    fn test_library_loads_both_groups() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let bandcharts = dir.path().join(BANDCHARTS_FILE);
        let maps = dir.path().join(MAPS_FILE);
        std::fs::write(&bandcharts, KEYED)?;
        std::fs::write(
            &maps,
            r#"{"cq": {"name": "CQ Zones", "long_name": "CQ Zones Map", "filename": "cq.png"}}"#,
        )?;

        let library = ImageLibrary::load(&bandcharts, &maps)?;

        assert_eq!(library.bandcharts.len(), 2);
        assert_eq!(library.maps.len(), 1);
        assert!(library.maps.get("CQ").is_some());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ImagesGroup::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ResourceError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
