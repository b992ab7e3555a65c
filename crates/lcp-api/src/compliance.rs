//! # Compliance Test Session
//!
//! When compliance mode is on, a test harness brackets each test with
//! `POST /compliancetest?test_stage=start&test_number=N` and
//! `...?test_stage=end&test_result=s|e`. Between the two, every status
//! operation is logged under the `compliance` target with the current test
//! number, so the harness can collect the server-side trace of one test.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::AppError;

/// Tracing target of compliance log lines.
pub const COMPLIANCE_TARGET: &str = "compliance";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplianceError {
    #[error("the stage of the compliance test must be either 'start' or 'end'")]
    InvalidStage,

    #[error("the number of the compliance test cannot be empty")]
    MissingNumber,

    #[error("the result of the compliance test must be either 'e' or 's'")]
    InvalidResult,
}

impl From<ComplianceError> for AppError {
    fn from(err: ComplianceError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

/// Outcome reported at the end of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Success,
    Error,
}

impl TestResult {
    fn parse(raw: &str) -> Result<Self, ComplianceError> {
        match raw {
            "s" => Ok(Self::Success),
            "e" => Ok(Self::Error),
            _ => Err(ComplianceError::InvalidResult),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// The test currently running, shared by all handlers of one app.
#[derive(Debug, Clone, Default)]
pub struct ComplianceSession {
    current: Arc<Mutex<Option<String>>>,
}

impl ComplianceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the test in progress.
    pub fn current_test(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Apply one `/compliancetest` call.
    pub fn handle(
        &self,
        stage: Option<&str>,
        number: Option<&str>,
        result: Option<&str>,
    ) -> Result<(), ComplianceError> {
        match stage {
            Some("start") => {
                let number = number
                    .filter(|n| !n.is_empty())
                    .ok_or(ComplianceError::MissingNumber)?;
                *self.current.lock() = Some(number.to_string());
                tracing::info!(target: COMPLIANCE_TARGET, test_number = number, stage = "start", result = "-", "compliance test");
                Ok(())
            }
            Some("end") => {
                let result = TestResult::parse(result.unwrap_or_default())?;
                let finished = self.current.lock().take();
                tracing::info!(
                    target: COMPLIANCE_TARGET,
                    test_number = finished.as_deref().unwrap_or_default(),
                    stage = "end",
                    result = result.as_str(),
                    "compliance test"
                );
                Ok(())
            }
            _ => Err(ComplianceError::InvalidStage),
        }
    }

    /// Log a status operation against the test in progress, if any.
    pub fn record(&self, operation: &str, success: bool) {
        if let Some(number) = self.current_test() {
            let result = if success { "success" } else { "error" };
            tracing::info!(
                target: COMPLIANCE_TARGET,
                test_number = %number,
                stage = operation,
                result,
                "compliance test"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_end_clears_number() {
        let session = ComplianceSession::new();
        session.handle(Some("start"), Some("4.2"), None).unwrap();
        assert_eq!(session.current_test().as_deref(), Some("4.2"));
        session.handle(Some("end"), None, Some("s")).unwrap();
        assert!(session.current_test().is_none());
    }

    #[test]
    fn invalid_calls_rejected_without_state_change() {
        let session = ComplianceSession::new();
        assert_eq!(
            session.handle(Some("middle"), Some("1"), None),
            Err(ComplianceError::InvalidStage)
        );
        assert_eq!(
            session.handle(None, None, None),
            Err(ComplianceError::InvalidStage)
        );
        assert_eq!(
            session.handle(Some("start"), Some(""), None),
            Err(ComplianceError::MissingNumber)
        );

        session.handle(Some("start"), Some("7"), None).unwrap();
        assert_eq!(
            session.handle(Some("end"), None, Some("ok")),
            Err(ComplianceError::InvalidResult)
        );
        assert_eq!(session.current_test().as_deref(), Some("7"));
    }

    #[test]
    fn clones_share_the_session() {
        let session = ComplianceSession::new();
        let other = session.clone();
        session.handle(Some("start"), Some("9"), None).unwrap();
        assert_eq!(other.current_test().as_deref(), Some("9"));
        other.record("register", true);
    }
}
