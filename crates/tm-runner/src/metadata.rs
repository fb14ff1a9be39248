//! Metadata and summary records for reporting
//!
//! Every result the runner emits is tagged with [`Metadata`] describing the
//! landscape under test. Summaries are serialized as JSON objects and consumed
//! by a separate reporting pipeline, so field names are part of the contract.

use chrono::{DateTime, Utc};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};

use tm_common::crd::{StepStatus, Testrun, TestrunPhase};

use crate::component_descriptor::Component;

/// Common metadata of all outputs and summaries
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Metadata {
    /// Landscape, e.g. dev, staging, canary or live
    pub landscape: String,
    /// Infrastructure provider of the shoot under test
    #[serde(rename = "cloudprovider")]
    pub cloud_provider: String,
    /// Kubernetes version of the shoot under test
    pub kubernetes_version: String,
    /// Components of the landscape setup
    pub bom: Vec<Component>,
    /// Generated name of the testrun
    pub testrun_id: String,
}

impl Metadata {
    /// Metadata for a landscape, without a testrun id yet
    pub fn new(
        landscape: impl Into<String>,
        cloud_provider: impl Into<String>,
        kubernetes_version: impl Into<String>,
        bom: Vec<Component>,
    ) -> Self {
        Self {
            landscape: landscape.into(),
            cloud_provider: cloud_provider.into(),
            kubernetes_version: kubernetes_version.into(),
            bom,
            testrun_id: String::new(),
        }
    }
}

/// Type tag of a summary record
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryType {
    /// Whole testrun
    Testrun,
    /// Single step
    Teststep,
}

/// Result of the overall testrun
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestrunSummary {
    #[serde(rename = "tm_meta")]
    pub metadata: Metadata,
    #[serde(rename = "type")]
    pub summary_type: SummaryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TestrunPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tests_run: usize,
}

/// Result of one step
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    #[serde(rename = "tm_meta")]
    pub metadata: Metadata,
    #[serde(rename = "type")]
    pub summary_type: SummaryType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TestrunPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Metadata exported alongside the artifacts of one step
///
/// Unlike the summaries the landscape metadata is flattened into the object.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepExportMetadata {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(rename = "testdefinition")]
    pub test_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TestrunPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Any summary record
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Summary {
    Testrun(TestrunSummary),
    Step(StepSummary),
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl TestrunSummary {
    /// Summarize a finished testrun
    pub fn new(testrun: &Testrun, metadata: &Metadata) -> Self {
        let status = testrun.status.as_ref();
        Self {
            metadata: metadata.clone(),
            summary_type: SummaryType::Testrun,
            phase: Some(testrun.phase()),
            start_time: status.and_then(|s| s.start_time),
            duration: status.and_then(|s| s.duration),
            tests_run: status.map(|s| s.steps.len()).unwrap_or(0),
        }
    }
}

impl StepSummary {
    /// Summarize one step of a testrun
    pub fn new(step: &StepStatus, metadata: &Metadata) -> Self {
        Self {
            metadata: metadata.clone(),
            summary_type: SummaryType::Teststep,
            name: step.name.clone(),
            phase: Some(step.phase),
            start_time: step.start_time,
            duration: step.duration,
        }
    }
}

impl StepExportMetadata {
    /// Export metadata of one step
    pub fn new(step: &StepStatus, metadata: &Metadata) -> Self {
        Self {
            metadata: metadata.clone(),
            test_definition: step.test_definition.clone(),
            phase: Some(step.phase),
            start_time: step.start_time,
            duration: step.duration,
        }
    }
}

/// Testrun summary followed by one summary per step
///
/// The metadata's testrun id is filled from the testrun when still empty.
pub fn summarize(testrun: &Testrun, metadata: &Metadata) -> Vec<Summary> {
    let mut metadata = metadata.clone();
    if metadata.testrun_id.is_empty() {
        metadata.testrun_id = testrun.name_any();
    }

    let mut summaries = vec![Summary::Testrun(TestrunSummary::new(testrun, &metadata))];
    if let Some(status) = &testrun.status {
        summaries.extend(
            status
                .steps
                .iter()
                .map(|step| Summary::Step(StepSummary::new(step, &metadata))),
        );
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::testrun_in_phase;
    use chrono::TimeZone;

    fn metadata() -> Metadata {
        let mut meta = Metadata::new(
            "canary",
            "gcp",
            "1.13.2",
            vec![Component {
                name: "github.com/gardener/gardener".to_string(),
                version: "0.18.0".to_string(),
            }],
        );
        meta.testrun_id = "it-00001".to_string();
        meta
    }

    fn finished_testrun() -> Testrun {
        let mut tr = testrun_in_phase("it-00001", TestrunPhase::Success, "done");
        let status = tr.status.as_mut().unwrap();
        status.start_time = Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        status.duration = Some(900);
        status.steps = vec![
            StepStatus {
                name: "create-shoot".to_string(),
                test_definition: "create-shoot".to_string(),
                phase: TestrunPhase::Success,
                start_time: None,
                duration: Some(400),
            },
            StepStatus {
                name: "conformance".to_string(),
                test_definition: "kubernetes-conformance".to_string(),
                phase: TestrunPhase::Failed,
                start_time: None,
                duration: Some(500),
            },
        ];
        tr
    }

    #[test]
    fn metadata_uses_reporting_field_names() {
        let json = serde_json::to_value(metadata()).unwrap();
        assert_eq!(json["landscape"], "canary");
        assert_eq!(json["cloudprovider"], "gcp");
        assert_eq!(json["kubernetes_version"], "1.13.2");
        assert_eq!(json["testrun_id"], "it-00001");
        assert_eq!(json["bom"][0]["version"], "0.18.0");
    }

    #[test]
    fn testrun_summary_shape() {
        let summary = TestrunSummary::new(&finished_testrun(), &metadata());
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["type"], "testrun");
        assert_eq!(json["phase"], "Succeeded");
        assert_eq!(json["startTime"], "2024-03-01T10:00:00Z");
        assert_eq!(json["duration"], 900);
        assert_eq!(json["testsRun"], 2);
        assert_eq!(json["tm_meta"]["landscape"], "canary");
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let tr = Testrun::new("bare", Default::default());
        let json = serde_json::to_value(TestrunSummary::new(&tr, &metadata())).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("startTime"));
        assert!(!obj.contains_key("duration"));
        assert!(!obj.contains_key("testsRun"));
        assert_eq!(json["phase"], "Init");
    }

    #[test]
    fn summarize_emits_one_record_per_step() {
        let summaries = summarize(&finished_testrun(), &metadata());
        assert_eq!(summaries.len(), 3);

        let step = serde_json::to_value(&summaries[2]).unwrap();
        assert_eq!(step["type"], "teststep");
        assert_eq!(step["name"], "conformance");
        assert_eq!(step["phase"], "Failed");
        assert_eq!(step["duration"], 500);
    }

    #[test]
    fn summarize_fills_missing_testrun_id() {
        let mut meta = metadata();
        meta.testrun_id.clear();
        let summaries = summarize(&finished_testrun(), &meta);
        match &summaries[0] {
            Summary::Testrun(s) => assert_eq!(s.metadata.testrun_id, "it-00001"),
            other => panic!("expected testrun summary, got {other:?}"),
        }
    }

    #[test]
    fn step_export_metadata_is_flat() {
        let tr = finished_testrun();
        let step = &tr.status.as_ref().unwrap().steps[1];
        let json = serde_json::to_value(StepExportMetadata::new(step, &metadata())).unwrap();
        assert_eq!(json["landscape"], "canary");
        assert_eq!(json["testdefinition"], "kubernetes-conformance");
        assert!(json.get("tm_meta").is_none());
    }
}
