//! Replaying a procedure against a dispatcher.

use crate::dispatch::Dispatcher;
use crate::error::{Position, ProcedureError};
use crate::procedure::Procedure;
use std::io::Write;
use tracing::trace;

/// Fails with `ArityMismatch` unless `actual` matches the procedure's parameter count.
pub fn check_arity(name: &str, procedure: &Procedure, actual: usize) -> Result<(), ProcedureError> {
    if actual != procedure.arity() {
        return Err(ProcedureError::ArityMismatch {
            name: name.to_string(),
            expected: procedure.arity(),
            actual,
        });
    }

    Ok(())
}

/// Replays procedure `name` with `actuals` bound to its parameters.
///
/// Instructions are dispatched one at a time, in recorded order, and each one's output
/// is written to `out` exactly as the dispatcher returned it.  The first failing instruction stops the replay; the
/// instructions after it are not dispatched.
pub fn invoke<D: Dispatcher + ?Sized>(
    name: &str,
    procedure: &Procedure,
    actuals: &[String],
    dispatcher: &mut D,
    out: &mut dyn Write,
) -> Result<(), ProcedureError> {
    check_arity(name, procedure, actuals.len())?;

    for (index, instruction) in procedure.instructions().iter().enumerate() {
        let args = instruction.bind(actuals);
        trace!(procedure = name, command = instruction.command(), ?args, "dispatch");

        let output = dispatcher
            .execute(instruction.command(), &args)
            .map_err(|cause| ProcedureError::InstructionFailed {
                context: format!("procedure \"{name}\""),
                position: Position::Instruction(index + 1),
                cause,
            })?;

        out.write_all(output.as_bytes())?;
    }

    Ok(())
}
