//! Run and watch error types

use std::fmt;
use std::time::Duration;

use tm_common::crd::Testrun;

/// Why a watch ended without the condition being met
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The budget ran out before the condition held
    #[error("timed out after {}s waiting for testrun {namespace}/{name}", .timeout.as_secs())]
    Timeout {
        namespace: String,
        name: String,
        timeout: Duration,
        /// Last snapshot that was fetched successfully, if any
        last: Option<Box<Testrun>>,
    },

    /// The resource disappeared while it was watched
    #[error("testrun {namespace}/{name} was deleted while being watched")]
    Deleted { namespace: String, name: String },

    /// The condition check itself failed
    #[error("condition check failed for testrun {namespace}/{name}: {source}")]
    Predicate {
        namespace: String,
        name: String,
        #[source]
        source: tm_common::Error,
    },
}

impl WatchError {
    /// Whether the watch ended because the budget ran out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Terminal failure of a single run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The Testrun could not be submitted; no watch was attempted
    #[error("cannot create testrun: {message}")]
    NotCreated { message: String },

    /// The Testrun did not reach a terminal phase in time
    #[error("maximum wait time of {}s is exceeded by Testrun {name}", .timeout.as_secs())]
    Timeout { name: String, timeout: Duration },

    /// The watch ended for another reason
    #[error("watching testrun {name} failed: {source}")]
    Watch {
        name: String,
        #[source]
        source: WatchError,
    },

    /// The task executing the run died before recording an outcome
    #[error("testrun execution aborted: {message}")]
    Aborted { message: String },
}

impl RunError {
    /// Create a not-created error from the submission failure
    pub fn not_created(cause: impl fmt::Display) -> Self {
        Self::NotCreated {
            message: cause.to_string(),
        }
    }

    /// Create an aborted error from the task failure
    pub fn aborted(cause: impl fmt::Display) -> Self {
        Self::Aborted {
            message: cause.to_string(),
        }
    }

    /// Whether the run gave up waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// All errors of a run list, in run order
///
/// Only ever constructed with at least one error.
#[derive(Debug)]
pub struct RunErrors<'a> {
    errors: Vec<&'a RunError>,
}

impl<'a> RunErrors<'a> {
    pub(crate) fn new(errors: Vec<&'a RunError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Number of collected errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the collected errors
    pub fn iter(&self) -> impl Iterator<Item = &'a RunError> + '_ {
        self.errors.iter().copied()
    }
}

impl fmt::Display for RunErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            writeln!(f, "1 error occurred:")?;
        } else {
            writeln!(f, "{} errors occurred:", self.errors.len())?;
        }
        for err in &self.errors {
            writeln!(f, "\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for RunErrors<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_budget_and_run() {
        let err = RunError::Timeout {
            name: "it-abcde".to_string(),
            timeout: Duration::from_secs(3600),
        };
        assert_eq!(
            err.to_string(),
            "maximum wait time of 3600s is exceeded by Testrun it-abcde"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn watch_errors_are_not_timeouts() {
        let err = RunError::Watch {
            name: "it-abcde".to_string(),
            source: WatchError::Deleted {
                namespace: "default".to_string(),
                name: "it-abcde".to_string(),
            },
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("was deleted"));
    }

    #[test]
    fn not_created_keeps_cause() {
        let err = RunError::not_created(tm_common::Error::validation("bad testflow"));
        assert!(err.to_string().starts_with("cannot create testrun:"));
        assert!(err.to_string().contains("bad testflow"));
    }

    #[test]
    fn run_errors_are_never_empty() {
        assert!(RunErrors::new(Vec::new()).is_none());

        let a = RunError::not_created("quota");
        let b = RunError::Timeout {
            name: "x".to_string(),
            timeout: Duration::from_secs(60),
        };
        let errors = RunErrors::new(vec![&a, &b]).unwrap();
        assert_eq!(errors.len(), 2);
        assert!(!errors.is_empty());

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 errors occurred:\n"));
        assert!(rendered.contains("\t* cannot create testrun: quota\n"));
        assert!(rendered.contains("\t* maximum wait time of 60s"));
    }
}
