//! Extract Testrun objects from rendered manifests

use serde::Deserialize;
use tracing::debug;

use crate::crd::Testrun;
use crate::Error;

const TESTRUN_KIND: &str = "Testrun";

/// Parse every `Testrun` document out of a set of (multi-document) YAML manifests
///
/// Documents of other kinds and empty documents are skipped.
pub fn parse_testruns<S: AsRef<str>>(manifests: &[S]) -> Result<Vec<Testrun>, Error> {
    let mut testruns = Vec::new();
    for manifest in manifests {
        for document in serde_yaml::Deserializer::from_str(manifest.as_ref()) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or("");
            if kind != TESTRUN_KIND {
                debug!(kind, "skipping non-testrun document");
                continue;
            }

            let testrun: Testrun = serde_yaml::from_value(value)
                .map_err(|e| Error::serialization_for_kind(TESTRUN_KIND, e.to_string()))?;
            testruns.push(testrun);
        }
    }
    Ok(testruns)
}
