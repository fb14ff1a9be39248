//! Component descriptors
//!
//! The landscape setup publishes a descriptor listing the components (name
//! and version) that make up the system under test. It is attached to every
//! reported result as the bill of materials.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tm_common::Error;

/// One component of the system under test
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Component {
    /// Component name, usually a repository path
    pub name: String,
    /// Component version
    pub version: String,
}

#[derive(Deserialize)]
struct Descriptor {
    #[serde(default)]
    components: Vec<Component>,
}

/// Parse the components out of a descriptor document
pub fn from_yaml(raw: &str) -> Result<Vec<Component>, Error> {
    let descriptor: Descriptor = serde_yaml::from_str(raw)
        .map_err(|e| Error::serialization_for_kind("ComponentDescriptor", e.to_string()))?;
    Ok(descriptor.components)
}

/// Read and parse a descriptor file
pub fn load(path: &Path) -> Result<Vec<Component>, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_with_context(
            "component_descriptor",
            format!("cannot read {}: {}", path.display(), e),
        )
    })?;
    from_yaml(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
components:
  - name: github.com/gardener/gardener
    version: 0.18.0
  - name: github.com/gardener/dashboard
    version: 1.26.0
"#;

    #[test]
    fn parses_components() {
        let components = from_yaml(DESCRIPTOR).unwrap();
        assert_eq!(
            components,
            vec![
                Component {
                    name: "github.com/gardener/gardener".to_string(),
                    version: "0.18.0".to_string(),
                },
                Component {
                    name: "github.com/gardener/dashboard".to_string(),
                    version: "1.26.0".to_string(),
                },
            ]
        );
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("component_descriptor.yaml");
        std::fs::write(&path, DESCRIPTOR).unwrap();
        assert_eq!(load(&path).unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = load(Path::new("/does/not/exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("/does/not/exist.yaml"));
    }

    #[test]
    fn descriptor_without_components_is_empty() {
        assert!(from_yaml("meta: {}").unwrap().is_empty());
    }
}
