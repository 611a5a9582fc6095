//! Shell configuration.

/// Settings for an [`Interp`](crate::Interp): the names under which the reserved
/// commands are registered, the nesting limit, and the prompts used by front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub begin_command: String,
    pub end_command: String,
    pub run_command: String,
    pub for_command: String,

    /// Maximum depth of nested dispatch (a procedure running a procedure ...).
    pub recursion_limit: usize,

    pub prompt: String,

    /// Prompt shown while a procedure is being recorded.
    pub recording_prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            begin_command: "begin-procedure".into(),
            end_command: "end-procedure".into(),
            run_command: "run-procedure".into(),
            for_command: "for".into(),
            recursion_limit: 256,
            prompt: "% ".into(),
            recording_prompt: "> ".into(),
        }
    }
}

impl ShellConfig {
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Renames the four reserved commands.
    pub fn with_command_names(mut self, begin: &str, end: &str, run: &str, for_loop: &str) -> Self {
        self.begin_command = begin.into();
        self.end_command = end.into();
        self.run_command = run.into();
        self.for_command = for_loop.into();
        self
    }

    pub fn with_prompts(mut self, prompt: &str, recording_prompt: &str) -> Self {
        self.prompt = prompt.into();
        self.recording_prompt = recording_prompt.into();
        self
    }
}
