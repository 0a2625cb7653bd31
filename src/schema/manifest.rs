//! Manifest documents naming timeline packages and their animations.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::format::FormatResult;
use crate::store::ResourceOpener;

/// Manifest listing every timeline package (`AnimationPacks.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackManifest {
    #[serde(rename = "animationPacks")]
    pub animation_packs: Vec<String>,
}

/// Per-package metadata listing its animations (`<pack>_Metadata.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackMetadata {
    #[serde(rename = "animationNames")]
    pub animation_names: Vec<String>,
}

impl PackMetadata {
    /// Resource name of a package's metadata document.
    pub fn resource_name(package: &str) -> String {
        format!("{}_Metadata.json", package)
    }
}

/// Open a resource and parse it as JSON.
pub fn read_json<T: DeserializeOwned>(opener: &dyn ResourceOpener, name: &str) -> FormatResult<T> {
    let bytes = opener.open(name)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatError;
    use crate::store::MemoryOpener;

    #[test]
    fn test_parse_documents() {
        let mut opener = MemoryOpener::new();
        opener.insert(
            "AnimationPacks.json",
            r#"{"animationPacks": ["Troops", "Buildings"], "extra": 1}"#,
        );
        opener.insert(
            "Troops_Metadata.json",
            r#"{"animationNames": ["Walk", "Attack"]}"#,
        );

        let manifest: PackManifest = read_json(&opener, "AnimationPacks.json").unwrap();
        assert_eq!(manifest.animation_packs, vec!["Troops", "Buildings"]);

        let meta: PackMetadata =
            read_json(&opener, &PackMetadata::resource_name("Troops")).unwrap();
        assert_eq!(meta.animation_names, vec!["Walk", "Attack"]);
    }

    #[test]
    fn test_type_errors() {
        let mut opener = MemoryOpener::new();
        opener.insert("bad.json", r#"{"animationPacks": [1, 2]}"#);
        opener.insert("broken.json", "{ not json");

        let err = read_json::<PackManifest>(&opener, "bad.json").unwrap_err();
        assert_eq!(err.reason(), "json error");

        let err = read_json::<PackManifest>(&opener, "broken.json").unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));

        let err = read_json::<PackManifest>(&opener, "missing.json").unwrap_err();
        assert!(matches!(err, FormatError::Io(_)));
    }
}
