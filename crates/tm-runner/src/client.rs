//! Resource client for Testruns
//!
//! Provides a trait-based abstraction over the two API calls the runner
//! needs, allowing tests to mock the cluster while production code talks to
//! the API server.

use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};

#[cfg(test)]
use mockall::automock;

use tm_common::crd::Testrun;
use tm_common::Error;

/// Trait abstracting Testrun API operations
///
/// Implementations must be safe for concurrent use by many runs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TestrunClient: Send + Sync {
    /// Create a Testrun in the namespace set on its metadata
    ///
    /// Returns the object as stored by the server, including the generated
    /// name when only `generateName` was set.
    async fn create(&self, testrun: &Testrun) -> Result<Testrun, Error>;

    /// Get the current state of a Testrun
    ///
    /// A missing object is reported as [`Error::NotFound`].
    async fn get(&self, namespace: &str, name: &str) -> Result<Testrun, Error>;
}

/// Testrun client backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeTestrunClient {
    client: Client,
}

impl KubeTestrunClient {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TestrunClient for KubeTestrunClient {
    async fn create(&self, testrun: &Testrun) -> Result<Testrun, Error> {
        let namespace = testrun
            .namespace()
            .ok_or_else(|| Error::validation_for("Testrun", "namespace must be set"))?;
        let api: Api<Testrun> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.create(&PostParams::default(), testrun).await?)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Testrun, Error> {
        let api: Api<Testrun> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(testrun) => Ok(testrun),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Err(Error::not_found("Testrun", name)),
            Err(e) => Err(e.into()),
        }
    }
}
