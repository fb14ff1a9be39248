//! Testrun CRD types
//!
//! A `Testrun` is submitted by the testrunner and executed by the workflow
//! engine of the test machinery. Only the engine writes the status; the
//! testrunner creates the object once and observes it afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Phase
// =============================================================================

/// Lifecycle phase of a Testrun
///
/// `Init` and `Timeout` are owned by the testrunner: `Init` is assumed until
/// the engine reports progress, `Timeout` is set locally when the watch budget
/// runs out. All other phases come from the workflow engine.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum TestrunPhase {
    /// Submitted, not yet picked up by the engine
    #[default]
    Init,
    /// Workflow created, waiting for pods
    Pending,
    /// Test steps are executing
    Running,
    /// All steps succeeded
    #[serde(rename = "Succeeded")]
    Success,
    /// Skipped by the engine
    Skipped,
    /// At least one step failed
    Failed,
    /// The engine itself errored
    Error,
    /// The testrunner gave up waiting
    Timeout,
    /// A phase the engine reported that is none of the above, including `""`
    #[serde(other)]
    Unknown,
}

impl TestrunPhase {
    /// Whether the phase is terminal
    ///
    /// Every known phase other than `Init`, `Pending` and `Running` is final.
    /// `Unknown` is not.
    pub fn is_completed(self) -> bool {
        !matches!(
            self,
            Self::Init | Self::Pending | Self::Running | Self::Unknown
        )
    }

    /// Whether the phase is one the testrunner understands
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl std::fmt::Display for TestrunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Success => write!(f, "Succeeded"),
            Self::Skipped => write!(f, "Skipped"),
            Self::Failed => write!(f, "Failed"),
            Self::Error => write!(f, "Error"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Free-function form of [`TestrunPhase::is_completed`]
pub fn completed(phase: TestrunPhase) -> bool {
    phase.is_completed()
}

// =============================================================================
// Test locations
// =============================================================================

/// Kind of source a test location points to
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// A git repository at a revision
    #[default]
    Git,
    /// A directory on the node (insecure mode only)
    Local,
}

/// Where the engine searches for test definitions
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestLocation {
    /// Source type
    #[serde(rename = "type")]
    pub location_type: LocationType,

    /// Git repository URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Git revision (branch, tag or commit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Host path for local locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
}

// =============================================================================
// CRD
// =============================================================================

/// Desired state of a Testrun
///
/// Beyond the test locations the spec is passed through to the engine
/// untouched.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "testmachinery.sapcloud.io",
    version = "v1beta1",
    kind = "Testrun",
    plural = "testruns",
    shortname = "tr",
    namespaced,
    status = "TestrunStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TestrunSpec {
    /// Who created the testrun
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    /// Locations the engine collects test definitions from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_locations: Vec<TestLocation>,

    /// Raw kubeconfigs made available to the test steps, keyed by purpose
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kubeconfigs: BTreeMap<String, String>,

    /// Step graph executed by the engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub testflow: Vec<serde_json::Value>,
}

/// Status of one executed step
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    /// Step name in the testflow
    pub name: String,

    /// Test definition the step executed
    #[serde(default, rename = "testdefinition")]
    pub test_definition: String,

    /// Phase of this step
    #[serde(default)]
    pub phase: TestrunPhase,

    /// When the step started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Step runtime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Observed state of a Testrun, written by the workflow engine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestrunStatus {
    /// Current phase
    #[serde(default)]
    pub phase: TestrunPhase,

    /// Human-readable progress description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,

    /// When the workflow started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// When the workflow finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,

    /// Total runtime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Per-step results
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepStatus>,
}

impl Testrun {
    /// Current phase, `Init` while the engine has not written a status yet
    pub fn phase(&self) -> TestrunPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    /// Current progress description, empty while none was reported
    pub fn state(&self) -> &str {
        self.status.as_ref().map(|s| s.state.as_str()).unwrap_or("")
    }

    /// Force the local phase, creating an empty status if needed
    pub fn set_phase(&mut self, phase: TestrunPhase) {
        self.status.get_or_insert_with(TestrunStatus::default).phase = phase;
    }

    /// Name of the workflow the engine creates for this testrun
    pub fn workflow_name(&self) -> String {
        format!("{}-wf", self.name_any())
    }
}

// =============================================================================
// Tests
// =============================================================================
