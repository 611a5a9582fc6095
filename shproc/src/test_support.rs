//! A fake dispatcher for exercising the invoker and loop expander in isolation.

use crate::dispatch::{CommandResult, Dispatcher};
use crate::error::CommandError;

/// Logs every dispatched command line and echoes it back as output.  Optionally fails
/// on the n-th call (1-based).
#[derive(Debug, Default)]
pub(crate) struct FakeDispatcher {
    pub calls: Vec<String>,
    fail_on_call: Option<usize>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: Vec::new(),
            fail_on_call: Some(call),
        }
    }
}

impl Dispatcher for FakeDispatcher {
    fn execute(&mut self, command: &str, args: &[String]) -> CommandResult {
        let mut line = command.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.push(line.clone());

        if self.fail_on_call == Some(self.calls.len()) {
            return Err(CommandError::failed(format!("{command} failed")));
        }

        Ok(line)
    }
}
