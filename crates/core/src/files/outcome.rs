//! Outcome of non-fatal steps.

use std::fmt::Display;

/// Result of a step whose failure never aborts the enclosing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    /// The step ran and succeeded.
    Done,
    /// The step does not apply (e.g. no thumbnail for a PDF).
    Skipped,
    /// The step ran and failed; the message was logged.
    Failed(String),
}

impl BestEffort {
    /// Records a step's result.
    pub fn from_result<T, E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Done,
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    /// Short label for API responses.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        assert_eq!(BestEffort::from_result::<(), &str>(Ok(())), BestEffort::Done);
        assert_eq!(
            BestEffort::from_result::<(), _>(Err("disk full")),
            BestEffort::Failed("disk full".into())
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(BestEffort::Done.label(), "done");
        assert_eq!(BestEffort::Skipped.label(), "skipped");
        assert_eq!(BestEffort::Failed(String::new()).label(), "failed");
    }
}
