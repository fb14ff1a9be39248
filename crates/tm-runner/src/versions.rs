//! Kubernetes version resolution from cloud profiles

use kube::api::Api;
use kube::{Client, ResourceExt};
use semver::Version;
use tracing::{debug, info};

use tm_common::crd::{CloudProfile, CloudProviderKind};
use tm_common::Error;

/// Parse a version, completing missing minor and patch parts with `0`
///
/// `v1.13` and `1.13` both read as `1.13.0`. Pre-release and build suffixes
/// are kept.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let split = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(split);

    let parts = core.split('.').count();
    let mut full = core.to_string();
    for _ in parts..3 {
        full.push_str(".0");
    }
    full.push_str(suffix);
    Version::parse(&full)
}

/// Highest version of the list in its full `major.minor.patch` form
///
/// Entries that do not parse are skipped, so `None` means no entry was a
/// valid version.
pub fn latest_version<S: AsRef<str>>(versions: &[S]) -> Option<String> {
    versions
        .iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            match parse_version(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(version = raw, error = %e, "skipping invalid version");
                    None
                }
            }
        })
        .max()
        .map(|v| v.to_string())
}

/// Latest Kubernetes version the profile offers for `provider`
pub fn resolve_latest_kubernetes_version(
    profile: &CloudProfile,
    provider: &str,
) -> Result<String, Error> {
    let kind: CloudProviderKind = provider.parse()?;
    latest_version(profile.spec.kubernetes_versions(kind))
        .ok_or_else(|| Error::no_versions_found(profile.name_any()))
}

/// Fetch the cloud profile and resolve its latest Kubernetes version
pub async fn latest_kubernetes_version(
    client: &Client,
    profile_name: &str,
    provider: &str,
) -> Result<String, Error> {
    let api: Api<CloudProfile> = Api::all(client.clone());
    let profile = api.get(profile_name).await.map_err(|e| match e {
        kube::Error::Api(ref resp) if resp.code == 404 => Error::not_found("CloudProfile", profile_name),
        other => Error::from(other),
    })?;
    let version = resolve_latest_kubernetes_version(&profile, provider)?;
    info!(cloudprofile = profile_name, provider, version = %version, "resolved kubernetes version");
    Ok(version)
}
