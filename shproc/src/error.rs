//! Error types for recording and replaying procedures.
//!
//! [`ProcedureError`] covers everything the recorder, the invoker and the loop expander
//! can report.  [`CommandError`] is what a [`Dispatcher`](crate::dispatch::Dispatcher)
//! hands back when a single command fails; when that command was itself a reserved
//! command (e.g., a procedure that runs another procedure) the nested `ProcedureError`
//! is kept intact rather than flattened to text.

use std::fmt;
use std::io;
use thiserror::Error;

/// Where in a replayed sequence a failure happened.  Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The n-th instruction of a procedure.
    Instruction(usize),

    /// The n-th iteration of a `for` loop.
    Iteration(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Instruction(n) => write!(f, "instruction {n}"),
            Position::Iteration(n) => write!(f, "iteration {n}"),
        }
    }
}

/// Errors raised while defining, invoking or looping over recorded commands.
#[derive(Debug, Error)]
pub enum ProcedureError {
    #[error("already recording procedure \"{name}\"; procedure definitions cannot be nested")]
    AlreadyRecording { name: String },

    #[error("no procedure is being recorded")]
    NotRecording,

    #[error("duplicate parameter \"{name}\"")]
    DuplicateParameter { name: String },

    #[error("unknown procedure \"{name}\"")]
    UnknownProcedure { name: String },

    #[error("procedure \"{name}\" expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed range \"{token}\": {reason}")]
    MalformedRange { token: String, reason: &'static str },

    #[error("{context}: {position} failed: {cause}")]
    InstructionFailed {
        context: String,
        position: Position,
        #[source]
        cause: CommandError,
    },

    #[error("wrong # args: should be \"{usage}\"")]
    Usage { usage: String },

    #[error("too many nested calls (limit {limit}); infinite recursion?")]
    RecursionLimit { limit: usize },

    #[error("cannot parse command line: {0}")]
    Parse(#[from] shell_words::ParseError),

    #[error("cannot write command output: {0}")]
    Output(#[from] io::Error),
}

/// The failure of a single dispatched command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command name \"{0}\"")]
    UnknownCommand(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Procedure(Box<ProcedureError>),
}

impl CommandError {
    /// Creates a plain failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(message.into())
    }

    /// Returns the procedure error carried by this failure, if any.
    pub fn as_procedure(&self) -> Option<&ProcedureError> {
        match self {
            CommandError::Procedure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProcedureError> for CommandError {
    fn from(err: ProcedureError) -> Self {
        CommandError::Procedure(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_failed_message() {
        let err = ProcedureError::InstructionFailed {
            context: "procedure \"greet\"".into(),
            position: Position::Instruction(2),
            cause: CommandError::failed("boom"),
        };

        assert_eq!(
            err.to_string(),
            "procedure \"greet\": instruction 2 failed: boom"
        );
    }

    #[test]
    fn test_nested_errors_keep_structure() {
        let err = CommandError::from(ProcedureError::UnknownProcedure {
            name: "nope".into(),
        });

        assert_eq!(err.to_string(), "unknown procedure \"nope\"");
        assert!(matches!(
            err.as_procedure(),
            Some(ProcedureError::UnknownProcedure { name }) if name == "nope"
        ));
        assert!(CommandError::failed("x").as_procedure().is_none());
    }
}
