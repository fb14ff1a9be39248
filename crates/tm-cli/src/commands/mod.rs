//! CLI commands

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::{error, info};

use tm_common::kube_utils;
use tm_runner::config::{parse_git_secrets, ObjectStoreConfig};
use tm_runner::{report, KubeTestrunClient, Run, RunList, RunnerConfig, Watcher};

use crate::{Error, Result};

pub mod run_template;
pub mod run_testrun;

/// Options shared by every command that executes testruns
#[derive(Args, Debug, Clone)]
pub struct RunnerArgs {
    /// Kubeconfig of the test machinery cluster
    #[arg(long = "tm-kubeconfig-path", env = "TM_KUBECONFIG_PATH")]
    pub tm_kubeconfig_path: Option<PathBuf>,

    /// Namespace testruns are created in
    #[arg(short, long, env = "TM_NAMESPACE", default_value = tm_common::DEFAULT_TESTRUN_NAMESPACE)]
    pub namespace: String,

    /// Maximum wait time per testrun in seconds
    #[arg(long = "timeout", env = "TM_TIMEOUT", default_value = "3600")]
    pub timeout_secs: u64,

    /// Interval between two status polls in seconds
    #[arg(long = "interval", env = "TM_POLL_INTERVAL", default_value = "20")]
    pub poll_interval_secs: u64,

    /// File the JSON summaries are written to
    #[arg(long, env = "TM_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Object store endpoint for test artifacts
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,

    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    #[arg(long, env = "S3_BUCKET_NAME")]
    pub s3_bucket_name: Option<String>,

    #[arg(long, env = "S3_SSL")]
    pub s3_ssl: bool,

    /// YAML list of git credentials
    #[arg(long, env = tm_runner::config::GIT_SECRETS_ENV, hide_env_values = true)]
    pub git_secrets: Option<String>,

    /// Concourse directory that receives notify.cfg on failure
    #[arg(long, env = "CONCOURSE_ON_ERROR_DIR")]
    pub concourse_on_error_dir: Option<PathBuf>,

    /// Recipients of failure notifications
    #[arg(long = "notify", value_delimiter = ',')]
    pub notify_recipients: Vec<String>,

    /// Base URL of the Argo UI
    #[arg(long, env = "ARGO_UI_URL")]
    pub argo_ui_url: Option<String>,
}

impl RunnerArgs {
    /// Build the validated runner configuration
    pub fn into_config(self) -> Result<RunnerConfig> {
        let git_secrets = match self.git_secrets.as_deref() {
            Some(raw) => parse_git_secrets(raw)?,
            None => Vec::new(),
        };

        let config = RunnerConfig {
            namespace: self.namespace,
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            output_file: self.output_file,
            object_store: ObjectStoreConfig::from_parts(
                self.s3_endpoint,
                self.s3_access_key,
                self.s3_secret_key,
                self.s3_bucket_name,
                self.s3_ssl,
            ),
            git_secrets,
            concourse_on_error_dir: self.concourse_on_error_dir,
            notify_recipients: self.notify_recipients,
            argo_ui_url: self.argo_ui_url,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Execute the runs against the test machinery cluster and report the results
pub(crate) async fn execute(
    runs: Vec<Run>,
    tm_kubeconfig: Option<&std::path::Path>,
    config: RunnerConfig,
    name_prefix: &str,
) -> Result<()> {
    let client = kube_utils::create_client(tm_kubeconfig).await?;
    let watcher = Watcher::from_config(Arc::new(KubeTestrunClient::new(client)), &config);

    info!(count = runs.len(), namespace = %config.namespace, "executing testruns");
    let config = Arc::new(config);
    let list = RunList::execute(runs, watcher, config.clone(), name_prefix).await;
    finish(&list, &config)
}

/// Print, persist and judge the results of a finished list
pub(crate) fn finish(list: &RunList, config: &RunnerConfig) -> Result<()> {
    println!("{}", list.render_table());

    if let Some(path) = &config.output_file {
        report::write_summaries(path, list)?;
    }
    if let Some(dir) = &config.concourse_on_error_dir {
        report::write_notification(dir, list, &config.notify_recipients)?;
    }

    if let Err(errors) = list.errors() {
        error!("{}", errors);
    }

    let failed = list.unsuccessful().count() + list.iter().filter(|r| r.is_none()).count();
    if failed > 0 {
        return Err(Error::TestrunsFailed {
            failed,
            total: list.len(),
        });
    }
    info!("all testruns succeeded");
    Ok(())
}
