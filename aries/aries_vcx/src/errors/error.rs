use std::{error::Error, fmt};

use messages::AriesMessage;
use thiserror;

pub mod prelude {
    pub use super::{err_msg, AriesVcxError, AriesVcxErrorKind, ProtocolProblem, VcxResult};
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum AriesVcxErrorKind {
    // Common
    #[error("Object is in invalid state for requested operation")]
    InvalidState,
    #[error("Invalid input parameter")]
    InvalidInput,
    #[error("Invalid JSON string")]
    InvalidJson,
    #[error("Unable to serialize")]
    SerializationError,
    #[error("Object not ready for specified action")]
    NotReady,
    #[error("Action is not supported")]
    ActionNotSupported,
    #[error("Timed out waiting for an event")]
    Timeout,
    #[error("Lock was poisoned")]
    LockError,

    // Protocol flow
    #[error("No handler registered for message type")]
    UnroutableMessage,
    #[error("Record is not in a state allowing the requested transition")]
    IllegalStateTransition,
    #[error("Protocol failure attributable to the counterparty")]
    ProblemReport,
    #[error("Protocol version is not supported")]
    UnsupportedProtocolVersion,

    // Storage
    #[error("Record not found")]
    RecordNotFound,
    #[error("Record already exists")]
    DuplicateRecord,
    #[error("Unexpected wallet error")]
    WalletError,

    // DID
    #[error("Invalid DID")]
    InvalidDid,
    #[error("DID could not be resolved")]
    DidResolutionFailed,
}

/// Payload of a failure the counterparty caused: the code it is reported
/// under, and the problem report message threaded to the failed exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtocolProblem {
    pub code: String,
    pub report: AriesMessage,
}

#[derive(thiserror::Error)]
pub struct AriesVcxError {
    msg: String,
    kind: AriesVcxErrorKind,
    problem: Option<Box<ProtocolProblem>>,
}

fn format_error(err: &AriesVcxError, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "Error: {}", err.msg())?;
    if let Some(problem) = err.problem() {
        writeln!(f, "Problem code: {}", problem.code)?;
    }
    let mut current = err.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

impl fmt::Display for AriesVcxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        format_error(self, f)
    }
}

impl fmt::Debug for AriesVcxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        format_error(self, f)
    }
}

impl AriesVcxError {
    fn new(kind: AriesVcxErrorKind, msg: String) -> Self {
        AriesVcxError {
            msg,
            kind,
            problem: None,
        }
    }

    pub fn from_msg<D>(kind: AriesVcxErrorKind, msg: D) -> AriesVcxError
    where
        D: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(kind, msg.to_string())
    }

    /// Failure caused by the counterparty. The report is sent back by the
    /// dispatcher when the exchange runs over a connection.
    pub fn problem_report<D>(msg: D, code: impl Into<String>, report: impl Into<AriesMessage>) -> Self
    where
        D: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(AriesVcxErrorKind::ProblemReport, msg.to_string()).with_problem(ProtocolProblem {
            code: code.into(),
            report: report.into(),
        })
    }

    pub fn with_problem(mut self, problem: ProtocolProblem) -> Self {
        self.problem = Some(Box::new(problem));
        self
    }

    pub fn illegal_state<S, E>(actual: S, expected: &[E]) -> Self
    where
        S: fmt::Display,
        E: fmt::Display,
    {
        let expected = expected
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            AriesVcxErrorKind::IllegalStateTransition,
            format!("Record is in invalid state {actual}. Valid states are: {expected}."),
        )
    }

    pub fn find_root_cause(&self) -> String {
        let mut current = self.source();
        while let Some(cause) = current {
            if cause.source().is_none() {
                return cause.to_string();
            }
            current = cause.source();
        }
        self.to_string()
    }

    pub fn kind(&self) -> AriesVcxErrorKind {
        self.kind
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn problem(&self) -> Option<&ProtocolProblem> {
        self.problem.as_deref()
    }

    pub fn into_problem(self) -> Option<ProtocolProblem> {
        self.problem.map(|problem| *problem)
    }

    pub fn extend<D>(self, msg: D) -> AriesVcxError
    where
        D: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        AriesVcxError {
            msg: format!("{}\n{}", self.msg, msg),
            ..self
        }
    }

    pub fn map<D>(self, kind: AriesVcxErrorKind, msg: D) -> AriesVcxError
    where
        D: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(kind, msg.to_string())
    }
}

pub fn err_msg<D>(kind: AriesVcxErrorKind, msg: D) -> AriesVcxError
where
    D: fmt::Display + fmt::Debug + Send + Sync + 'static,
{
    AriesVcxError::from_msg(kind, msg)
}

pub type VcxResult<T> = Result<T, AriesVcxError>;

#[cfg(test)]
mod tests {
    use messages::{
        decorators::thread::Thread,
        msg_fields::protocols::report_problem::{
            Description, ProblemReport, ProblemReportContent, ProblemReportDecorators,
        },
    };

    use super::*;

    #[test]
    fn test_problem_report_error_keeps_payload() {
        let content = ProblemReportContent::builder()
            .description(Description::builder().code("abandoned".to_owned()).build())
            .build();
        let report = ProblemReport::with_decorators(
            "id".to_owned(),
            content,
            ProblemReportDecorators::new(Thread::new("thid".to_owned())),
        );
        let err = AriesVcxError::problem_report("invalid proof", "abandoned", report);

        assert_eq!(err.kind(), AriesVcxErrorKind::ProblemReport);
        assert_eq!(err.problem().map(|p| p.code.as_str()), Some("abandoned"));
        let problem = err.into_problem().unwrap();
        assert_eq!(problem.report.thread_id(), "thid");
    }

    #[test]
    fn test_illegal_state_names_expected_and_actual() {
        let err = AriesVcxError::illegal_state("done", &["offer-received", "proposal-sent"]);
        assert_eq!(err.kind(), AriesVcxErrorKind::IllegalStateTransition);
        assert!(err.msg().contains("done"));
        assert!(err.msg().contains("offer-received, proposal-sent"));
    }

    #[test]
    fn test_extend_keeps_problem() {
        let err = AriesVcxError::from_msg(AriesVcxErrorKind::InvalidInput, "first").extend("second");
        assert_eq!(err.msg(), "first\nsecond");
        assert!(err.problem().is_none());
    }
}
