//! Front ends for a shproc [`Interp`](shproc::Interp): an interactive REPL and a script
//! runner.

mod shell;

pub use crate::shell::{eval_script, repl, script, ScriptError};
