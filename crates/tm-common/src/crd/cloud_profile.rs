//! CloudProfile CRD (read-only view)
//!
//! A CloudProfile lives on the garden cluster and lists, per infrastructure
//! provider, the constraints shoots must satisfy. The testrunner only reads
//! the supported Kubernetes versions from it.

use std::str::FromStr;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Supported infrastructure providers of a cloud profile
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloudProviderKind {
    /// Amazon Web Services
    Aws,
    /// Google Cloud Platform
    Gcp,
    /// Microsoft Azure
    Azure,
    /// OpenStack
    OpenStack,
    /// Alibaba Cloud
    Alicloud,
}

impl CloudProviderKind {
    /// The selector string used on the command line and in metadata
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::OpenStack => "openstack",
            Self::Alicloud => "alicloud",
        }
    }
}

impl std::fmt::Display for CloudProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Self::Aws),
            "gcp" => Ok(Self::Gcp),
            "azure" => Ok(Self::Azure),
            "openstack" => Ok(Self::OpenStack),
            "alicloud" => Ok(Self::Alicloud),
            other => Err(Error::unsupported_provider(other)),
        }
    }
}

/// Garden CloudProfile, one optional section per provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "garden.sapcloud.io",
    version = "v1beta1",
    kind = "CloudProfile",
    plural = "cloudprofiles"
)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfileSpec {
    /// AWS constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ProviderProfile>,

    /// GCP constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<ProviderProfile>,

    /// Azure constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<ProviderProfile>,

    /// OpenStack constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<ProviderProfile>,

    /// Alicloud constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alicloud: Option<ProviderProfile>,
}

/// Provider section of a cloud profile
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ProviderProfile {
    /// Constraints shoots of this provider must satisfy
    #[serde(default)]
    pub constraints: ProviderConstraints,
}

/// Constraints of a provider section
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ProviderConstraints {
    /// Kubernetes version constraints
    #[serde(default)]
    pub kubernetes: KubernetesConstraints,
}

/// Kubernetes versions offered by a provider
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct KubernetesConstraints {
    /// Version strings as written in the profile
    #[serde(default)]
    pub versions: Vec<String>,
}

impl CloudProfileSpec {
    /// The section for the given provider, if the profile has one
    pub fn provider(&self, kind: CloudProviderKind) -> Option<&ProviderProfile> {
        match kind {
            CloudProviderKind::Aws => self.aws.as_ref(),
            CloudProviderKind::Gcp => self.gcp.as_ref(),
            CloudProviderKind::Azure => self.azure.as_ref(),
            CloudProviderKind::OpenStack => self.openstack.as_ref(),
            CloudProviderKind::Alicloud => self.alicloud.as_ref(),
        }
    }

    /// Kubernetes versions listed for the given provider
    ///
    /// A missing provider section yields an empty slice.
    pub fn kubernetes_versions(&self, kind: CloudProviderKind) -> &[String] {
        self.provider(kind)
            .map(|p| p.constraints.kubernetes.versions.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(versions: &[&str]) -> ProviderProfile {
        ProviderProfile {
            constraints: ProviderConstraints {
                kubernetes: KubernetesConstraints {
                    versions: versions.iter().map(|v| v.to_string()).collect(),
                },
            },
        }
    }

    #[test]
    fn provider_kind_round_trips_through_selector() {
        for kind in [
            CloudProviderKind::Aws,
            CloudProviderKind::Gcp,
            CloudProviderKind::Azure,
            CloudProviderKind::OpenStack,
            CloudProviderKind::Alicloud,
        ] {
            assert_eq!(kind.as_str().parse::<CloudProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_selector_is_unsupported() {
        let err = "packet".parse::<CloudProviderKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider { ref provider } if provider == "packet"));
    }

    #[test]
    fn versions_are_selected_by_provider() {
        let spec = CloudProfileSpec {
            gcp: Some(profile_with(&["1.12.1", "1.11.4"])),
            azure: Some(profile_with(&["1.10.0"])),
            ..Default::default()
        };
        assert_eq!(spec.kubernetes_versions(CloudProviderKind::Gcp), ["1.12.1", "1.11.4"]);
        assert_eq!(spec.kubernetes_versions(CloudProviderKind::Azure), ["1.10.0"]);
        assert!(spec.kubernetes_versions(CloudProviderKind::Aws).is_empty());
    }

    #[test]
    fn profile_parses_garden_layout() {
        let yaml = r#"
openstack:
  constraints:
    kubernetes:
      versions: ["1.13.2", "1.12.5"]
"#;
        let spec: CloudProfileSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec.kubernetes_versions(CloudProviderKind::OpenStack),
            ["1.13.2", "1.12.5"]
        );
    }
}
