//! Built-in commands and argument checking.
//!
//! A command is a [`CommandFunc`](crate::interp::CommandFunc): it receives the
//! interpreter and the full argument vector (`argv[0]` is the command name) and returns
//! its output.

use crate::dispatch::CommandResult;
use crate::error::{CommandError, ProcedureError};
use crate::interp::Interp;

/// Checks the number of words in `argv`, counting the command name.
///
/// `namec` is the number of leading words that name the command (used when building the
/// message), `min` and `max` bound `argv.len()`, and a `max` of zero means "no upper
/// bound".  On failure, returns a `Usage` error of the form
/// `wrong # args: should be "name argsig"`.
pub fn check_args(
    namec: usize,
    argv: &[String],
    min: usize,
    max: usize,
    argsig: &str,
) -> Result<(), ProcedureError> {
    if argv.len() < min || (max > 0 && argv.len() > max) {
        let namec = namec.min(argv.len());
        Err(usage_error(&argv[..namec], argsig))
    } else {
        Ok(())
    }
}

pub(crate) fn usage_error(name_words: &[String], argsig: &str) -> ProcedureError {
    let usage = format!("{} {}", name_words.join(" "), argsig);
    ProcedureError::Usage {
        usage: usage.trim_end().to_string(),
    }
}

/// # echo ?arg ...?
///
/// Returns its arguments joined by single spaces.
pub fn cmd_echo(_interp: &mut Interp, argv: &[String]) -> CommandResult {
    Ok(argv.get(1..).unwrap_or_default().join(" "))
}

/// # help ?command?
///
/// With no argument, lists the defined commands; otherwise returns the usage of the
/// named command or procedure.
pub fn cmd_help(interp: &mut Interp, argv: &[String]) -> CommandResult {
    check_args(1, argv, 1, 2, "?command?")?;

    match argv.get(1) {
        None => Ok(interp.command_names().join(" ")),
        Some(name) => interp
            .command_usage(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.clone())),
    }
}

/// # procedures
///
/// Lists the defined procedures, one per line, in definition order.
#[cfg(feature = "info")]
pub fn cmd_procedures(interp: &mut Interp, argv: &[String]) -> CommandResult {
    check_args(1, argv, 1, 1, "")?;
    Ok(interp.procedure_names().join("\n"))
}

/// # procedure-body procName
///
/// Lists a procedure's signature and recorded instructions, with placeholders shown
/// as `$param`.
#[cfg(feature = "info")]
pub fn cmd_procedure_body(interp: &mut Interp, argv: &[String]) -> CommandResult {
    check_args(1, argv, 2, 2, "procName")?;

    let name = &argv[1];
    let procedure = interp.procedures().lookup(name)?;

    let mut listing = procedure.signature(name);
    for instruction in procedure.instructions() {
        listing.push_str("\n  ");
        listing.push_str(&instruction.render(procedure.params()));
    }
    Ok(listing)
}
