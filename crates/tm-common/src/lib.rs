//! Common types for the testrunner: CRDs, errors, and Kubernetes utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod template;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace testruns are submitted to when none is configured
pub const DEFAULT_TESTRUN_NAMESPACE: &str = "default";

/// Kubeconfig key under which the garden cluster kubeconfig is passed to a testrun
pub const GARDENER_KUBECONFIG_KEY: &str = "gardener";
