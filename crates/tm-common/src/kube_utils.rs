//! Shared Kubernetes utilities using kube-rs

use std::path::Path;
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::Error;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a kube client from optional kubeconfig path with default timeouts
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client, Error> {
    create_client_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Create a kube client from optional kubeconfig path with custom timeouts
///
/// Without a path the configuration is inferred (in-cluster service account,
/// then `KUBECONFIG` / `~/.kube/config`).
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            debug!(path = %path.display(), "loading kubeconfig");
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::internal_with_context(
                    "create_client",
                    format!("failed to read kubeconfig {}: {}", path.display(), e),
                )
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::internal_with_context(
                        "create_client",
                        format!("failed to load kubeconfig: {}", e),
                    )
                })?
        }
        None => Config::infer().await.map_err(|e| {
            Error::internal_with_context("create_client", format!("failed to infer config: {}", e))
        })?,
    };
    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Client::try_from(config).map_err(|e| {
        Error::internal_with_context("create_client", format!("failed to create client: {}", e))
    })
}

/// URL of a workflow in the Argo UI
///
/// Trailing slashes of the base URL are ignored.
pub fn argo_workflow_url(base_url: &str, namespace: &str, workflow: &str) -> String {
    format!(
        "{}/workflows/{}/{}",
        base_url.trim_end_matches('/'),
        namespace,
        workflow
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argo_url_joins_segments() {
        assert_eq!(
            argo_workflow_url("https://argo.ingress.tm.example.com/", "default", "it-abcde-wf"),
            "https://argo.ingress.tm.example.com/workflows/default/it-abcde-wf"
        );
        assert_eq!(
            argo_workflow_url("http://argo", "tm", "x-wf"),
            "http://argo/workflows/tm/x-wf"
        );
    }

    #[tokio::test]
    async fn missing_kubeconfig_file_is_reported() {
        let Err(err) = create_client(Some(Path::new("/nonexistent/kubeconfig"))).await else {
            panic!("client created from a missing kubeconfig");
        };
        assert_eq!(err.context(), Some("create_client"));
        assert!(err.to_string().contains("/nonexistent/kubeconfig"));
    }
}
