//! Testrun execution
//!
//! A [`Run`] binds one Testrun submission to its outcome:
//! submit → watch until a terminal phase → record the result.
//!
//! `Run::exec` consumes the run and hands back the finished one, so the
//! outcome can only be inspected once execution is over. Failures are kept
//! in the run instead of being returned, which lets a whole batch finish
//! independently of individual failures.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::{error, info};

use tm_common::crd::{Testrun, TestrunPhase};
use tm_common::kube_utils::argo_workflow_url;
use tm_common::Error;

use crate::config::RunnerConfig;
use crate::error::{RunError, RunErrors, WatchError};
use crate::metadata::{summarize, Metadata, Summary};
use crate::report;
use crate::watch::Watcher;

/// One Testrun and its outcome
#[derive(Debug)]
pub struct Run {
    /// Desired spec before execution, latest observed object afterwards
    pub testrun: Testrun,
    /// Reporting metadata
    pub metadata: Metadata,
    /// Terminal failure, `None` if the run finished in time
    pub error: Option<RunError>,
}

impl Run {
    /// A not yet executed run
    pub fn new(testrun: Testrun, metadata: Metadata) -> Self {
        Self {
            testrun,
            metadata,
            error: None,
        }
    }

    /// Clear the outcome so the run can be executed again
    pub fn reset(&mut self) {
        self.error = None;
    }

    /// Finished in time and the engine reported success
    pub fn is_successful(&self) -> bool {
        self.error.is_none() && self.testrun.phase() == TestrunPhase::Success
    }

    /// Summary records of this run
    pub fn summaries(&self) -> Vec<Summary> {
        summarize(&self.testrun, &self.metadata)
    }

    /// Submit the Testrun and wait until it reaches a terminal phase
    ///
    /// The desired spec is copied, any fixed name is dropped in favor of
    /// `generateName = name_prefix`, and the copy is created in the configured
    /// namespace. If creation fails the original spec stays untouched.
    pub async fn exec(mut self, watcher: &Watcher, config: &RunnerConfig, name_prefix: &str) -> Self {
        let mut submission = self.testrun.clone();
        submission.metadata.name = None;
        submission.metadata.generate_name = Some(name_prefix.to_string());
        submission.metadata.namespace = Some(config.namespace.clone());
        submission.metadata.resource_version = None;
        submission.metadata.uid = None;
        submission.status = None;

        let created = match watcher.client().create(&submission).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, "unable to create testrun");
                self.error = Some(RunError::not_created(e));
                return self;
            }
        };

        let name = created.name_any();
        let namespace = created
            .namespace()
            .unwrap_or_else(|| config.namespace.clone());
        self.testrun = created;
        self.metadata.testrun_id = name.clone();
        info!("Testrun {} deployed", name);

        if let Some(base) = &config.argo_ui_url {
            let url = argo_workflow_url(base, &namespace, &self.testrun.workflow_name());
            info!(testrun = %name, "Argo workflow: {}", url);
        }

        // The engine's phase is only trusted once it has reported a state
        let mut phase = TestrunPhase::Init;
        let result = watcher
            .watch_until(config.timeout, &namespace, &name, |tr| {
                if !tr.phase().is_known() {
                    return Err(Error::validation_for(
                        "Testrun",
                        format!("unknown phase reported for {}", name),
                    ));
                }
                let state = tr.state();
                if state.is_empty() {
                    info!("Testrun {} is in {} phase. Waiting ...", name, phase);
                } else {
                    phase = tr.phase();
                    info!("Testrun {} is in {} phase. State: {}", name, phase, state);
                }
                Ok(phase.is_completed())
            })
            .await;

        match result {
            Ok(testrun) => self.testrun = testrun,
            Err(WatchError::Timeout { last, .. }) => {
                if let Some(last) = last {
                    self.testrun = *last;
                }
                self.testrun.set_phase(TestrunPhase::Timeout);
                self.error = Some(RunError::Timeout {
                    name: name.clone(),
                    timeout: config.timeout,
                });
            }
            Err(e) => {
                self.error = Some(RunError::Watch {
                    name: name.clone(),
                    source: e,
                });
            }
        }

        info!("\n{}", report::render_table([Some(&self)]));
        self
    }
}

/// Ordered runs of one batch
///
/// Slot order is submission order. Lists assembled from optional runs may
/// contain empty slots; `execute` never leaves one.
#[derive(Debug, Default)]
pub struct RunList {
    runs: Vec<Option<Run>>,
}

impl From<Vec<Run>> for RunList {
    fn from(runs: Vec<Run>) -> Self {
        Self {
            runs: runs.into_iter().map(Some).collect(),
        }
    }
}

impl FromIterator<Option<Run>> for RunList {
    fn from_iter<I: IntoIterator<Item = Option<Run>>>(iter: I) -> Self {
        Self {
            runs: iter.into_iter().collect(),
        }
    }
}

impl RunList {
    /// Execute all runs concurrently, one task per run
    ///
    /// The returned list keeps the input order. A task that dies keeps its
    /// slot with the unexecuted testrun and a [`RunError::Aborted`].
    pub async fn execute(
        runs: Vec<Run>,
        watcher: Watcher,
        config: Arc<RunnerConfig>,
        name_prefix: &str,
    ) -> Self {
        let handles: Vec<_> = runs
            .into_iter()
            .map(|run| {
                let fallback = (run.testrun.clone(), run.metadata.clone());
                let watcher = watcher.clone();
                let config = config.clone();
                let prefix = name_prefix.to_string();
                let handle =
                    tokio::spawn(async move { run.exec(&watcher, &config, &prefix).await });
                (handle, fallback)
            })
            .collect();

        let mut finished = Vec::with_capacity(handles.len());
        for (index, (handle, (testrun, metadata))) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(run) => finished.push(Some(run)),
                Err(e) => {
                    error!(index, error = %e, "testrun execution aborted");
                    finished.push(Some(Run {
                        testrun,
                        metadata,
                        error: Some(RunError::aborted(e)),
                    }));
                }
            }
        }
        finished.into_iter().collect()
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the list has no slots
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Iterate over all slots in order
    pub fn iter(&self) -> impl Iterator<Item = Option<&Run>> {
        self.runs.iter().map(Option::as_ref)
    }

    /// The testruns of all slots, index aligned with the list
    pub fn testruns(&self) -> Vec<Option<&Testrun>> {
        self.iter().map(|run| run.map(|r| &r.testrun)).collect()
    }

    /// Whether any run recorded an error
    pub fn has_errors(&self) -> bool {
        self.iter().flatten().any(|run| run.error.is_some())
    }

    /// All recorded errors combined, `Ok` when there are none
    pub fn errors(&self) -> Result<(), RunErrors<'_>> {
        let errors = self
            .iter()
            .flatten()
            .filter_map(|run| run.error.as_ref())
            .collect();
        match RunErrors::new(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    /// Runs that did not end in phase `Succeeded`, including errored ones
    pub fn unsuccessful(&self) -> impl Iterator<Item = &Run> {
        self.iter().flatten().filter(|run| !run.is_successful())
    }

    /// Summary records of every run
    pub fn summaries(&self) -> Vec<Summary> {
        self.iter().flatten().flat_map(Run::summaries).collect()
    }

    /// Table of name, phase, duration and error per run
    pub fn render_table(&self) -> String {
        report::render_table(self.iter())
    }
}
