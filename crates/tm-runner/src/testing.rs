//! Test helpers shared by the runner's unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use kube::ResourceExt;

use tm_common::crd::{Testrun, TestrunPhase, TestrunSpec, TestrunStatus};
use tm_common::Error;

use crate::client::TestrunClient;

/// A Testrun with the given name, phase and state
pub(crate) fn testrun_in_phase(name: &str, phase: TestrunPhase, state: &str) -> Testrun {
    let mut tr = Testrun::new(name, TestrunSpec::default());
    tr.metadata.namespace = Some("default".to_string());
    tr.status = Some(TestrunStatus {
        phase,
        state: state.to_string(),
        ..Default::default()
    });
    tr
}

/// A Testrun template whose `creator` scripts the behavior of [`FakeCluster`]
pub(crate) fn scripted_testrun(behavior: &str) -> Testrun {
    Testrun::new(
        "legacy-name",
        TestrunSpec {
            creator: Some(behavior.to_string()),
            ..Default::default()
        },
    )
}

/// In-memory cluster that assigns names and reports phases by script
///
/// The `creator` field of a submitted Testrun selects its fate:
/// - `fail-create`: submission is rejected
/// - `hang`: stays `Running` forever
/// - `fail`: completes in phase `Failed`
/// - anything else: `Running` on the first poll, `Succeeded` afterwards
pub(crate) struct FakeCluster {
    created: AtomicUsize,
    polls: Mutex<HashMap<String, usize>>,
    store: Mutex<HashMap<String, Testrun>>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self {
            created: AtomicUsize::new(0),
            polls: Mutex::new(HashMap::new()),
            store: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestrunClient for FakeCluster {
    async fn create(&self, testrun: &Testrun) -> Result<Testrun, Error> {
        if testrun.spec.creator.as_deref() == Some("fail-create") {
            return Err(Error::internal("admission webhook denied the request"));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let mut stored = testrun.clone();
        let prefix = testrun.metadata.generate_name.clone().unwrap_or_default();
        stored.metadata.name = Some(format!("{prefix}{n:05}"));
        stored.metadata.uid = Some(format!("uid-{n}"));
        self.store
            .lock()
            .unwrap()
            .insert(stored.name_any(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, _namespace: &str, name: &str) -> Result<Testrun, Error> {
        let Some(mut tr) = self.store.lock().unwrap().get(name).cloned() else {
            return Err(Error::not_found("Testrun", name));
        };
        let poll = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(name.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let (phase, state) = match tr.spec.creator.as_deref() {
            Some("hang") => (TestrunPhase::Running, "waiting for shoot"),
            Some("fail") if poll > 1 => (TestrunPhase::Failed, "step tests failed"),
            _ if poll > 1 => (TestrunPhase::Success, "all steps succeeded"),
            _ => (TestrunPhase::Running, "step create-shoot running"),
        };
        tr.status = Some(TestrunStatus {
            phase,
            state: state.to_string(),
            duration: Some(poll as i64 * 20),
            ..Default::default()
        });
        Ok(tr)
    }
}
