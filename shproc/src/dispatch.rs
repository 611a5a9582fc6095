//! The capability through which replayed commands are executed.
//!
//! The invoker and the loop expander never look commands up themselves; they hand each
//! fully substituted command to a [`Dispatcher`].  [`Interp`](crate::Interp) is the
//! dispatcher used by the shell, and tests use a fake one.

use crate::error::CommandError;
use std::io::{self, Write};

/// The result of executing one command: its textual output, or the reason it failed.
pub type CommandResult = Result<String, CommandError>;

/// Executes a single command given its name and arguments.
pub trait Dispatcher {
    fn execute(&mut self, command: &str, args: &[String]) -> CommandResult;
}

impl<D: Dispatcher + ?Sized> Dispatcher for &mut D {
    fn execute(&mut self, command: &str, args: &[String]) -> CommandResult {
        (**self).execute(command, args)
    }
}

/// Writes a host command's output the way a shell prints it.  Empty output writes
/// nothing; anything else is written as-is and terminated with a newline if it doesn't
/// already end with one.
///
/// Replayed output is not passed through here: the invoker and the loop expander write
/// whatever the dispatcher returns, byte for byte.
pub fn write_output(out: &mut dyn Write, output: &str) -> io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }

    out.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        out.write_all(b"\n")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output() {
        let mut out: Vec<u8> = Vec::new();
        write_output(&mut out, "").unwrap();
        write_output(&mut out, "one").unwrap();
        write_output(&mut out, "two\n").unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\n");
    }
}
