//! run-testrun command - execute the Testruns of a manifest file

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use tm_common::template::parse_testruns;
use tm_runner::{component_descriptor, Metadata, Run};

use super::RunnerArgs;
use crate::{Error, Result};

/// Execute the Testruns of a (multi-document) YAML file
#[derive(Args, Debug)]
pub struct RunTestrunArgs {
    /// File with one or more Testrun documents
    #[arg(short, long)]
    pub file: PathBuf,

    /// Name prefix of the created Testruns
    #[arg(long = "testrun-prefix", default_value = "testrunner-")]
    pub testrun_prefix: String,

    /// Landscape reported in the summaries
    #[arg(long, env = "LANDSCAPE", default_value = "")]
    pub landscape: String,

    /// Cloud provider reported in the summaries
    #[arg(long, default_value = "")]
    pub cloudprovider: String,

    /// Kubernetes version reported in the summaries
    #[arg(long = "k8s-version", default_value = "")]
    pub k8s_version: String,

    /// Component descriptor for the bill of materials
    #[arg(long)]
    pub component_descriptor_path: Option<PathBuf>,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

pub(crate) fn load_runs(file: &Path, metadata: &Metadata) -> Result<Vec<Run>> {
    let raw = std::fs::read_to_string(file).map_err(|e| Error::read_file(file, e))?;
    let testruns = parse_testruns(&[raw])?;
    if testruns.is_empty() {
        return Err(Error::validation(format!(
            "no Testrun found in {}",
            file.display()
        )));
    }
    Ok(testruns
        .into_iter()
        .map(|tr| Run::new(tr, metadata.clone()))
        .collect())
}

pub async fn run(args: RunTestrunArgs) -> Result<()> {
    let bom = match &args.component_descriptor_path {
        Some(path) => component_descriptor::load(path)?,
        None => Vec::new(),
    };
    let metadata = Metadata::new(args.landscape, args.cloudprovider, args.k8s_version, bom);
    let runs = load_runs(&args.file, &metadata)?;
    info!(file = %args.file.display(), count = runs.len(), "loaded testruns");

    let tm_kubeconfig = args.runner.tm_kubeconfig_path.clone();
    let config = args.runner.into_config()?;
    super::execute(runs, tm_kubeconfig.as_deref(), config, &args.testrun_prefix).await
}
