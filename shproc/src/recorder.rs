//! The recording state machine.
//!
//! The recorder is either idle or recording exactly one named procedure.  Definitions
//! don't nest: what is typed while recording is stored, not executed, and opening a
//! second definition is an error.

use crate::error::ProcedureError;
use crate::procedure::{Procedure, ProcedureRegistry};
use tracing::{debug, info, trace};

/// The recorder's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecorderState {
    #[default]
    Idle,

    /// A definition is open; `procedure` holds what has been recorded so far.
    Recording { name: String, procedure: Procedure },
}

#[derive(Debug, Default)]
pub struct Recorder {
    state: RecorderState,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// The name of the procedure being recorded, if any.
    pub fn recording_name(&self) -> Option<&str> {
        match &self.state {
            RecorderState::Idle => None,
            RecorderState::Recording { name, .. } => Some(name),
        }
    }

    /// Opens the definition of procedure `name`.  `params` are the words following the
    /// name; each may hold several comma-separated parameter names.
    pub fn begin(&mut self, name: &str, params: &[String]) -> Result<(), ProcedureError> {
        if let RecorderState::Recording { name: current, .. } = &self.state {
            return Err(ProcedureError::AlreadyRecording {
                name: current.clone(),
            });
        }

        let params = parse_params(params);
        if name.is_empty() || params.is_empty() {
            return Err(ProcedureError::Usage {
                usage: "procName param ?param ...?".into(),
            });
        }

        let procedure = Procedure::new(params)?;
        debug!(procedure = name, params = ?procedure.params(), "recording started");

        self.state = RecorderState::Recording {
            name: name.to_string(),
            procedure,
        };
        Ok(())
    }

    /// Appends one command line to the procedure being recorded.
    pub fn record(&mut self, command: &str, args: &[String]) -> Result<(), ProcedureError> {
        match &mut self.state {
            RecorderState::Idle => Err(ProcedureError::NotRecording),
            RecorderState::Recording { name, procedure } => {
                procedure.record(command, args);
                trace!(
                    procedure = name.as_str(),
                    line = procedure.instructions().len(),
                    command,
                    "recorded"
                );
                Ok(())
            }
        }
    }

    /// Closes the open definition, moving the procedure into `registry` (replacing any
    /// procedure of the same name).  Returns the procedure's name.
    pub fn end(&mut self, registry: &mut ProcedureRegistry) -> Result<String, ProcedureError> {
        match std::mem::take(&mut self.state) {
            RecorderState::Idle => Err(ProcedureError::NotRecording),
            RecorderState::Recording { name, procedure } => {
                let instructions = procedure.instructions().len();
                if registry.insert(&name, procedure).is_some() {
                    debug!(procedure = name.as_str(), "replaced existing definition");
                }
                info!(procedure = name.as_str(), instructions, "procedure defined");
                Ok(name)
            }
        }
    }
}

/// Splits parameter words on commas, dropping empty pieces.
pub fn parse_params(words: &[String]) -> Vec<String> {
    words
        .iter()
        .flat_map(|word| word.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_params() {
        assert_eq!(parse_params(&words("a b c")), words("a b c"));
        assert_eq!(parse_params(&words("a,b , c,")), words("a b c"));
        assert!(parse_params(&words(", ,")).is_empty());
    }

    #[test]
    fn test_begin_end_empty_procedure() {
        let mut recorder = Recorder::new();
        let mut registry = ProcedureRegistry::new();

        recorder.begin("p", &words("x y")).unwrap();
        assert!(recorder.is_recording());
        assert_eq!(recorder.recording_name(), Some("p"));

        assert_eq!(recorder.end(&mut registry).unwrap(), "p");
        assert_eq!(recorder.state(), &RecorderState::Idle);

        let proc = registry.get("p").unwrap();
        assert_eq!(proc.params(), &words("x y")[..]);
        assert!(proc.instructions().is_empty());
    }

    #[test]
    fn test_record_appends_instructions() {
        let mut recorder = Recorder::new();
        let mut registry = ProcedureRegistry::new();

        recorder.begin("greet", &words("name")).unwrap();
        recorder.record("say", &words("hello name")).unwrap();
        recorder.record("say", &words("bye")).unwrap();
        recorder.end(&mut registry).unwrap();

        let proc = registry.get("greet").unwrap();
        assert_eq!(proc.instructions().len(), 2);
        assert_eq!(proc.instructions()[0].command(), "say");
        assert_eq!(proc.instructions()[0].slots().len(), 1);
    }

    #[test]
    fn test_not_recording() {
        let mut recorder = Recorder::new();
        let mut registry = ProcedureRegistry::new();

        assert!(matches!(
            recorder.record("say", &[]),
            Err(ProcedureError::NotRecording)
        ));
        assert!(matches!(
            recorder.end(&mut registry),
            Err(ProcedureError::NotRecording)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nested_begin_leaves_recording_intact() {
        let mut recorder = Recorder::new();
        let mut registry = ProcedureRegistry::new();

        recorder.begin("outer", &words("a")).unwrap();
        recorder.record("echo", &words("a")).unwrap();

        assert!(matches!(
            recorder.begin("inner", &words("b")),
            Err(ProcedureError::AlreadyRecording { name }) if name == "outer"
        ));
        assert_eq!(recorder.recording_name(), Some("outer"));

        recorder.end(&mut registry).unwrap();
        assert_eq!(registry.get("outer").unwrap().instructions().len(), 1);
        assert!(!registry.contains("inner"));
    }

    #[test]
    fn test_begin_errors_stay_idle() {
        let mut recorder = Recorder::new();

        assert!(matches!(
            recorder.begin("p", &words("a b a")),
            Err(ProcedureError::DuplicateParameter { name }) if name == "a"
        ));
        assert!(matches!(
            recorder.begin("p", &[]),
            Err(ProcedureError::Usage { .. })
        ));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut recorder = Recorder::new();
        let mut registry = ProcedureRegistry::new();

        recorder.begin("p", &words("a")).unwrap();
        recorder.record("one", &[]).unwrap();
        recorder.end(&mut registry).unwrap();

        recorder.begin("p", &words("a b")).unwrap();
        recorder.end(&mut registry).unwrap();

        let proc = registry.get("p").unwrap();
        assert_eq!(proc.arity(), 2);
        assert!(proc.instructions().is_empty());
    }
}
