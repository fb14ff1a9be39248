//! Error types shared by the testrunner crates
//!
//! Errors are structured with fields to aid debugging in CI logs.
//! Each variant carries the resource or provider it relates to so a failed
//! batch of testruns can be traced back to the offending input.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for testrunner operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A resource does not exist (or no longer exists) on the cluster
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing resource (e.g., "Testrun")
        kind: String,
        /// Name of the missing resource
        name: String,
    },

    /// Validation error for user supplied input
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Name of the resource or input with invalid configuration
        resource: String,
        /// Description of what's invalid
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Chart template could not be read or rendered
    #[error("template error [{template}]: {message}")]
    Template {
        /// Path or name of the template that failed
        template: String,
        /// Description of what failed
        message: String,
    },

    /// The cloud provider selector is not one of the known providers
    #[error("unsupported cloudprovider {provider}")]
    UnsupportedProvider {
        /// The selector that was given
        provider: String,
    },

    /// A cloud profile exposes no usable kubernetes versions
    #[error("no kubernetes versions found for cloudprofile {profile}")]
    NoVersionsFound {
        /// Name of the cloud profile
        profile: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "create_client", "io")
        context: String,
    },
}

impl Error {
    /// Create a not-found error for a resource kind and name
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error naming the offending resource
    pub fn validation_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a template error for the given template path
    pub fn template(template: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: msg.into(),
        }
    }

    /// Create an unsupported provider error
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Create a no-versions-found error for a cloud profile
    pub fn no_versions_found(profile: impl Into<String>) -> Self {
        Self::NoVersionsFound {
            profile: profile.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check whether the error means the resource does not exist
    ///
    /// Covers both our own `NotFound` variant and raw 404 responses from the
    /// API server that were converted without inspection.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Kube {
                source: kube::Error::Api(ae),
            } => ae.code == 404,
            _ => false,
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Internal { context, .. } => Some(context),
            Error::Template { template, .. } => Some(template),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Story Tests: Error Propagation in Testrun Operations
    // ==========================================================================

    /// Story: a testrun deleted while it is watched surfaces as not found
    #[test]
    fn story_deleted_testrun_is_not_found() {
        let err = Error::not_found("Testrun", "integration-abcde");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Testrun integration-abcde not found");
    }

    /// Story: cloud profile lookups report input problems immediately
    #[test]
    fn story_version_resolution_errors_are_permanent() {
        let err = Error::unsupported_provider("digitalocean");
        assert_eq!(err.to_string(), "unsupported cloudprovider digitalocean");

        let err = Error::no_versions_found("aws");
        assert!(err.to_string().contains("cloudprofile aws"));
    }

    /// Story: template errors point at the chart file that failed
    #[test]
    fn story_template_errors_name_the_template() {
        let err = Error::template("charts/testrun/templates/testrun.yaml", "undefined value");
        assert_eq!(
            err.context(),
            Some("charts/testrun/templates/testrun.yaml")
        );
        assert!(err.to_string().contains("[charts/testrun/templates/testrun.yaml]"));
    }

    #[test]
    fn test_validation_uses_unknown_context() {
        match Error::validation("missing namespace") {
            Error::Validation { resource, message } => {
                assert_eq!(resource, UNKNOWN_CONTEXT);
                assert_eq!(message, "missing namespace");
            }
            _ => panic!("Expected Validation variant"),
        }

        let err = Error::validation_for("GIT_SECRETS", "not a list");
        assert!(err.to_string().contains("GIT_SECRETS"));
    }

    #[test]
    fn test_serialization_for_kind() {
        let err = Error::serialization_for_kind("Testrun", "missing field 'spec'");
        match &err {
            Error::Serialization { kind, .. } => assert_eq!(kind.as_deref(), Some("Testrun")),
            _ => panic!("Expected Serialization variant"),
        }
    }

    #[test]
    fn test_internal_error_context() {
        let err = Error::internal_with_context("create_client", "no kubeconfig");
        assert_eq!(err.context(), Some("create_client"));
        assert!(!err.is_not_found());

        let err = Error::internal("boom");
        assert_eq!(err.context(), Some(UNKNOWN_CONTEXT));
    }

    #[test]
    fn test_yaml_error_converts_to_serialization() {
        let parse: std::result::Result<Vec<String>, _> = serde_yaml::from_str("{not: [a list");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
