//! Testrun chart parameters
//!
//! The shoot under test is described by a flat set of parameters. They are
//! turned into the value map of the testrun chart, rendered, and the resulting
//! Testruns are paired with reporting metadata.

use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use tm_common::crd::Testrun;
use tm_common::template::{parse_testruns, ChartRenderer};
use tm_common::{Error, GARDENER_KUBECONFIG_KEY};

use crate::component_descriptor::Component;
use crate::metadata::Metadata;

/// Parameters of the shoot a testrun chart is rendered for
#[derive(Clone, Debug, Default)]
pub struct TestrunParameters {
    /// Kubeconfig of the garden cluster, injected into the Testruns
    pub garden_kubeconfig_path: PathBuf,
    /// Name prefix of the created Testruns
    pub testrun_name: String,
    /// Chart directory with the Testrun templates
    pub testrun_chart_path: PathBuf,

    pub project_name: String,
    pub shoot_name: String,
    pub landscape: String,
    pub cloudprovider: String,
    pub cloudprofile: String,
    pub secret_binding: String,
    pub region: String,
    pub zone: String,
    /// Empty means the latest version of the cloud profile
    pub k8s_version: String,
    pub machine_type: String,
    pub autoscaler_min: u32,
    pub autoscaler_max: u32,
    pub floating_pool_name: String,

    /// Optional component descriptor for the bill of materials
    pub component_descriptor_path: Option<PathBuf>,
}

impl TestrunParameters {
    /// Chart values for these parameters
    pub fn to_values(&self, garden_kubeconfig: &str) -> serde_json::Value {
        json!({
            "shoot": {
                "projectNamespace": format!("garden-{}", self.project_name),
                "name": self.shoot_name,
                "cloudprovider": self.cloudprovider,
                "cloudprofile": self.cloudprofile,
                "secretBinding": self.secret_binding,
                "region": self.region,
                "zone": self.zone,
                "k8sVersion": self.k8s_version,
                "machineType": self.machine_type,
                "autoscalerMin": self.autoscaler_min,
                "autoscalerMax": self.autoscaler_max,
                "floatingPoolName": self.floating_pool_name,
            },
            "kubeconfigs": {
                GARDENER_KUBECONFIG_KEY: garden_kubeconfig,
            },
        })
    }

    /// Check that the parameters describe a shoot
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("testrun name", &self.testrun_name),
            ("project name", &self.project_name),
            ("shoot name", &self.shoot_name),
            ("cloudprovider", &self.cloudprovider),
            ("cloudprofile", &self.cloudprofile),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.is_empty()) {
            return Err(Error::validation_for("parameters", format!("{field} must be set")));
        }
        if self.autoscaler_min > self.autoscaler_max {
            return Err(Error::validation_for(
                "parameters",
                format!(
                    "autoscaler min {} exceeds max {}",
                    self.autoscaler_min, self.autoscaler_max
                ),
            ));
        }
        Ok(())
    }

    /// Reporting metadata for runs rendered from these parameters
    pub fn metadata(&self, bom: Vec<Component>) -> Metadata {
        Metadata::new(&self.landscape, &self.cloudprovider, &self.k8s_version, bom)
    }
}

/// Render the chart for `params` and extract its Testruns
///
/// The Kubernetes version must already be resolved.
pub fn render_testruns(
    renderer: &dyn ChartRenderer,
    params: &TestrunParameters,
    namespace: &str,
    garden_kubeconfig: &str,
) -> Result<Vec<Testrun>, Error> {
    let values = params.to_values(garden_kubeconfig);
    let manifests = renderer.render(
        &params.testrun_chart_path,
        &params.testrun_name,
        namespace,
        &values,
    )?;
    let testruns = parse_testruns(&manifests)?;
    info!(
        chart = %params.testrun_chart_path.display(),
        count = testruns.len(),
        "rendered testruns"
    );
    Ok(testruns)
}
