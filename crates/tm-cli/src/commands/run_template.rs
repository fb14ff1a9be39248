//! run-template command - render the testrun chart for a shoot and execute it
//!
//! 1. Resolve the Kubernetes version from the cloud profile when none is given
//! 2. Render the chart with the shoot parameters and the garden kubeconfig
//! 3. Execute every rendered Testrun and report the results

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use tm_common::kube_utils;
use tm_common::template::MiniJinjaChartRenderer;
use tm_runner::parameters::{render_testruns, TestrunParameters};
use tm_runner::{component_descriptor, versions, Run};

use super::RunnerArgs;
use crate::{Error, Result};

/// Render the testrun chart for a shoot and execute its Testruns
#[derive(Args, Debug)]
pub struct RunTemplateArgs {
    /// Kubeconfig of the garden cluster
    #[arg(long = "gardener-kubeconfig-path", env = "GARDENER_KUBECONFIG_PATH")]
    pub garden_kubeconfig_path: PathBuf,

    /// Name prefix of the created Testruns
    #[arg(long = "testrun-prefix", default_value = "default-")]
    pub testrun_prefix: String,

    /// Chart directory with the Testrun templates
    #[arg(long = "testruns-chart-path")]
    pub testrun_chart_path: PathBuf,

    #[arg(long = "project-name")]
    pub project_name: String,

    #[arg(long = "shoot-name")]
    pub shoot_name: String,

    #[arg(long, default_value = "")]
    pub landscape: String,

    #[arg(long)]
    pub cloudprovider: String,

    #[arg(long)]
    pub cloudprofile: String,

    #[arg(long = "secret-binding", default_value = "")]
    pub secret_binding: String,

    #[arg(long, default_value = "")]
    pub region: String,

    #[arg(long, default_value = "")]
    pub zone: String,

    /// Kubernetes version of the shoot, latest of the cloud profile if empty
    #[arg(long = "k8s-version", default_value = "")]
    pub k8s_version: String,

    #[arg(long = "machinetype", default_value = "")]
    pub machine_type: String,

    #[arg(long = "autoscaler-min", default_value = "1")]
    pub autoscaler_min: u32,

    #[arg(long = "autoscaler-max", default_value = "2")]
    pub autoscaler_max: u32,

    /// OpenStack floating pool
    #[arg(long = "floatingpool-name", default_value = "")]
    pub floating_pool_name: String,

    #[arg(long)]
    pub component_descriptor_path: Option<PathBuf>,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

impl RunTemplateArgs {
    fn parameters(&self) -> TestrunParameters {
        TestrunParameters {
            garden_kubeconfig_path: self.garden_kubeconfig_path.clone(),
            testrun_name: self.testrun_prefix.clone(),
            testrun_chart_path: self.testrun_chart_path.clone(),
            project_name: self.project_name.clone(),
            shoot_name: self.shoot_name.clone(),
            landscape: self.landscape.clone(),
            cloudprovider: self.cloudprovider.clone(),
            cloudprofile: self.cloudprofile.clone(),
            secret_binding: self.secret_binding.clone(),
            region: self.region.clone(),
            zone: self.zone.clone(),
            k8s_version: self.k8s_version.clone(),
            machine_type: self.machine_type.clone(),
            autoscaler_min: self.autoscaler_min,
            autoscaler_max: self.autoscaler_max,
            floating_pool_name: self.floating_pool_name.clone(),
            component_descriptor_path: self.component_descriptor_path.clone(),
        }
    }
}

pub async fn run(args: RunTemplateArgs) -> Result<()> {
    let mut params = args.parameters();
    params.validate()?;
    let config = args.runner.clone().into_config()?;

    if params.k8s_version.is_empty() {
        let garden = kube_utils::create_client(Some(&params.garden_kubeconfig_path)).await?;
        params.k8s_version = versions::latest_kubernetes_version(
            &garden,
            &params.cloudprofile,
            &params.cloudprovider,
        )
        .await?;
    }

    let garden_kubeconfig = std::fs::read_to_string(&params.garden_kubeconfig_path)
        .map_err(|e| Error::read_file(&params.garden_kubeconfig_path, e))?;
    let testruns = render_testruns(
        &MiniJinjaChartRenderer::new(),
        &params,
        &config.namespace,
        &garden_kubeconfig,
    )?;
    if testruns.is_empty() {
        return Err(Error::validation(format!(
            "chart {} rendered no Testrun",
            params.testrun_chart_path.display()
        )));
    }

    let bom = match &params.component_descriptor_path {
        Some(path) => component_descriptor::load(path)?,
        None => Vec::new(),
    };
    let metadata = params.metadata(bom);
    info!(
        shoot = %params.shoot_name,
        k8s_version = %params.k8s_version,
        count = testruns.len(),
        "launching testruns"
    );

    let runs: Vec<Run> = testruns
        .into_iter()
        .map(|tr| Run::new(tr, metadata.clone()))
        .collect();
    super::execute(
        runs,
        args.runner.tm_kubeconfig_path.as_deref(),
        config,
        &params.testrun_name,
    )
    .await
}
