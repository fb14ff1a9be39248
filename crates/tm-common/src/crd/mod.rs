//! Custom Resource Definitions used by the testrunner
//!
//! `Testrun` is owned by the test machinery; `CloudProfile` is read from the
//! garden cluster to resolve Kubernetes versions.

mod cloud_profile;
mod testrun;

pub use cloud_profile::{
    CloudProfile, CloudProfileSpec, CloudProviderKind, KubernetesConstraints, ProviderConstraints,
    ProviderProfile,
};
pub use testrun::{
    completed, LocationType, StepStatus, TestLocation, Testrun, TestrunPhase, TestrunSpec,
    TestrunStatus,
};
