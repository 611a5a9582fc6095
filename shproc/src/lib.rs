//! # shproc: recordable procedures for line-oriented shells
//!
//! shproc adds three capabilities to a command shell that reads one command per line:
//!
//! * Recording a sequence of commands as a named procedure with formal parameters,
//!   then replaying it with concrete arguments.
//! * Running a command (or a one-parameter procedure) once per value of an integer
//!   counter.
//! * Defining the shell's own commands in Rust, alongside the recording commands.
//!
//! The [`Interp`] ties these together.  The pieces it is built from (the
//! [`ProcedureRegistry`], the [`Recorder`], [`invoke`](invoke::invoke) and
//! [`run_loop`](looping::run_loop)) can also be driven directly by a host with its own
//! command dispatch, through the [`Dispatcher`] trait.
//!
//! See the [`interp`] module for an overview.

pub use crate::commands::check_args;
pub use crate::config::ShellConfig;
pub use crate::dispatch::{CommandResult, Dispatcher};
pub use crate::error::{CommandError, Position, ProcedureError};
pub use crate::interp::{CommandFunc, Interp};
pub use crate::looping::{LoopBody, LoopSpec};
pub use crate::procedure::{Instruction, ParamSlot, Procedure, ProcedureRegistry};
pub use crate::recorder::{Recorder, RecorderState};

#[cfg(feature = "closure-commands")]
pub use crate::interp::CommandClosure;

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interp;
pub mod invoke;
pub mod looping;
pub mod procedure;
pub mod recorder;

#[cfg(test)]
mod test_support;
