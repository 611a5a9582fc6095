//! The shproc Interpreter
//!
//! The [`Interp`] struct is the primary API for embedding shproc into a shell.  Given an
//! `Interp`, the application may:
//!
//! * Evaluate command lines, one at a time
//! * Record procedures and replay them with concrete arguments
//! * Unroll `for` loops over an integer range
//! * Extend the shell by defining new commands in Rust
//!
//! # Interp is not Sync!
//!
//! The [`Interp`] (the procedure registry and the recording state in particular) is
//! intended for use by a single shell session on a single thread.  A host that serves
//! several sessions concurrently must give each its own `Interp`, or wrap a shared one
//! in its own lock.
//!
//! # Creating an Interpreter
//!
//! [`Interp::new`](struct.Interp.html#method.new) creates an interpreter with the four
//! reserved commands and the built-in commands (`echo`, `help`, and, with the `info`
//! feature, `procedures` and `procedure-body`).
//! [`Interp::empty`](struct.Interp.html#method.empty) creates one with the reserved
//! commands only, for hosts that bring their own command set.
//!
//! # Recording and Replaying Procedures
//!
//! `begin-procedure` opens a definition.  Every line evaluated after it, up to
//! `end-procedure`, is stored rather than executed; any word equal to one of the
//! procedure's parameter names becomes a placeholder.  `run-procedure` replays the
//! stored lines with the placeholders replaced by the actual arguments.
//!
//! ```
//! use shproc::Interp;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut interp = Interp::new();
//! let mut out: Vec<u8> = Vec::new();
//!
//! interp.eval("begin-procedure greet name", &mut out)?;
//! interp.eval("echo hello name", &mut out)?;
//! interp.eval("end-procedure", &mut out)?;
//! interp.eval("run-procedure greet World", &mut out)?;
//!
//! assert_eq!(String::from_utf8(out)?, "hello World\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Loops
//!
//! `for var from to ?step? command ?arg ...?` runs the command once per counter value,
//! with every argument equal to `var` replaced by the value.  The body may also be the
//! name of a one-parameter procedure.  See the [`looping`](../looping/index.html)
//! module for details.
//!
//! ```
//! use shproc::Interp;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut interp = Interp::new();
//! let mut out: Vec<u8> = Vec::new();
//!
//! interp.eval("for i 1 3 echo item i", &mut out)?;
//! assert_eq!(String::from_utf8(out)?, "item 1\nitem 2\nitem 3\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Defining New Commands
//!
//! A [`CommandFunc`] is a Rust function that returns the command's output given the
//! interpreter and the argument vector, `argv[0]` being the command's name.  Register it
//! with [`Interp::add_command`](struct.Interp.html#method.add_command).
//!
//! ```
//! use shproc::{check_args, CommandResult, Interp};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut interp = Interp::new();
//! interp.add_command("shout", cmd_shout);
//!
//! let mut out: Vec<u8> = Vec::new();
//! interp.eval("shout hello", &mut out)?;
//! assert_eq!(String::from_utf8(out)?, "HELLO\n");
//! # Ok(())
//! # }
//!
//! // The command: shout text
//! fn cmd_shout(_: &mut Interp, argv: &[String]) -> CommandResult {
//!     check_args(1, argv, 2, 2, "text")?;
//!     Ok(argv[1].to_uppercase())
//! }
//! ```
//!
//! [`CommandFunc`]: type.CommandFunc.html
//! [`Interp`]: struct.Interp.html

use crate::commands;
use crate::config::ShellConfig;
use crate::dispatch::{write_output, CommandResult, Dispatcher};
use crate::error::{CommandError, ProcedureError};
use crate::invoke;
use crate::looping::{self, LoopBody, LoopSpec};
use crate::procedure::{Procedure, ProcedureRegistry, ShprocHasher};
use crate::recorder::Recorder;
use indexmap::IndexMap;
use std::io::Write;
use std::rc::Rc;
use tracing::trace;

/// A command implemented in Rust.
pub type CommandFunc = fn(&mut Interp, &[String]) -> CommandResult;

/// A command implemented as a Rust closure.
#[cfg(feature = "closure-commands")]
pub type CommandClosure = Box<dyn Fn(&mut Interp, &[String]) -> CommandResult>;

/// The shproc Interpreter.
///
/// The `Interp` owns the command table, the procedure registry and the recorder, and
/// is itself the [`Dispatcher`] through which replayed procedures and loops execute
/// their commands.  See the [module level documentation](index.html) for an overview.
pub struct Interp {
    // Command Table
    commands: IndexMap<String, Rc<Command>, ShprocHasher>,

    // Completed procedure definitions
    procedures: ProcedureRegistry,

    // The definition in progress, if any
    recorder: Recorder,

    config: ShellConfig,

    // Current number of nested dispatch levels.
    num_levels: usize,
}

/// The commands that drive recording, replay and loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reserved {
    Begin,
    End,
    Run,
    For,
}

impl Reserved {
    fn argsig(self) -> &'static str {
        match self {
            Reserved::Begin => "procName param ?param ...?",
            Reserved::End => "",
            Reserved::Run => "procName ?arg ...?",
            Reserved::For => looping::FOR_ARGSIG,
        }
    }
}

/// A command defined in the interpreter.
enum Command {
    /// A binary command implemented as a Rust CommandFunc.
    Native(CommandFunc),

    #[cfg(feature = "closure-commands")]
    Closure(CommandClosure),

    /// One of the reserved procedure/loop commands.
    Reserved(Reserved),
}

impl Command {
    /// Execute the command according to its kind, writing its output to `out`.
    fn execute(
        &self,
        interp: &mut Interp,
        argv: &[String],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        let output = match self {
            Command::Native(func) => func(interp, argv)?,
            #[cfg(feature = "closure-commands")]
            Command::Closure(func) => func(interp, argv)?,
            Command::Reserved(kind) => {
                return interp
                    .run_reserved(*kind, argv, out)
                    .map_err(CommandError::from)
            }
        };

        write_output(out, &output).map_err(|err| ProcedureError::Output(err).into())
    }

    /// Returns a string naming the command type.
    fn cmdtype(&self) -> &'static str {
        match self {
            Command::Native(_) => "native",
            #[cfg(feature = "closure-commands")]
            Command::Closure(_) => "closure",
            Command::Reserved(_) => "reserved",
        }
    }

    /// Returns true for the commands that open and close a definition.  These are
    /// executed even while recording.
    fn is_definition(&self) -> bool {
        matches!(self, Command::Reserved(Reserved::Begin | Reserved::End))
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

// NOTE: The order of methods in the generated RustDoc depends on the order in this block.
// Consequently, methods are ordered pedagogically.
impl Interp {
    //--------------------------------------------------------------------------------------------
    // Constructors

    /// Creates a new interpreter with only the reserved commands defined.  Use this when
    /// the host supplies its own command set.
    ///
    /// # Example
    ///
    /// ```
    /// # use shproc::Interp;
    /// let interp = Interp::empty();
    /// assert_eq!(interp.command_names().len(), 4);
    /// ```
    pub fn empty() -> Self {
        Self::bare(ShellConfig::default())
    }

    /// Creates a new interpreter with the reserved commands and the built-in commands.
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// Creates a new interpreter with the reserved commands registered under the names
    /// given in `config`, plus the built-in commands.
    pub fn with_config(config: ShellConfig) -> Self {
        let mut interp = Self::bare(config);

        let new_commands: &[(&'static str, CommandFunc)] = &[
            ("echo", commands::cmd_echo),
            ("help", commands::cmd_help),
            #[cfg(feature = "info")]
            ("procedures", commands::cmd_procedures),
            #[cfg(feature = "info")]
            ("procedure-body", commands::cmd_procedure_body),
        ];

        for &(name, func) in new_commands {
            interp.add_command(name, func);
        }

        interp
    }

    fn bare(config: ShellConfig) -> Self {
        let mut interp = Self {
            commands: IndexMap::default(),
            procedures: ProcedureRegistry::new(),
            recorder: Recorder::new(),
            num_levels: 0,
            config,
        };

        let reserved = [
            (interp.config.begin_command.clone(), Reserved::Begin),
            (interp.config.end_command.clone(), Reserved::End),
            (interp.config.run_command.clone(), Reserved::Run),
            (interp.config.for_command.clone(), Reserved::For),
        ];

        for (name, kind) in reserved {
            interp
                .commands
                .insert(name, Rc::new(Command::Reserved(kind)));
        }

        interp
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    //--------------------------------------------------------------------------------------------
    // Evaluation

    /// Evaluates one line of input, writing any output to `out`.
    ///
    /// The line is split into words using shell quoting rules.  Blank lines and lines
    /// whose first non-blank character is `#` are ignored.  While a procedure is being
    /// recorded, the line is appended to it instead of being executed, unless it opens
    /// or closes a definition.
    pub fn eval(&mut self, line: &str, out: &mut dyn Write) -> Result<(), CommandError> {
        if line.trim_start().starts_with('#') {
            return Ok(());
        }

        let words = shell_words::split(line).map_err(ProcedureError::from)?;

        match words.split_first() {
            Some((name, args)) => self.eval_command(name, args, out),
            None => Ok(()),
        }
    }

    /// Evaluates a command whose name has already been separated from its arguments.
    /// Recording applies exactly as for [`eval`](#method.eval).
    pub fn eval_command(
        &mut self,
        name: &str,
        args: &[String],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        if self.recorder.is_recording() && !self.is_definition_command(name) {
            return self
                .recorder
                .record(name, args)
                .map_err(CommandError::from);
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(name.to_string());
        argv.extend_from_slice(args);

        self.run_command(&argv, out)
    }

    fn is_definition_command(&self, name: &str) -> bool {
        self.commands
            .get(name)
            .is_some_and(|cmd| cmd.is_definition())
    }

    /// Looks up and runs `argv[0]`.
    fn run_command(&mut self, argv: &[String], out: &mut dyn Write) -> Result<(), CommandError> {
        let Some(name) = argv.first() else {
            return Ok(());
        };

        if let Some(cmd) = self.commands.get(name.as_str()) {
            let cmd = Rc::clone(cmd);
            return cmd.execute(self, argv, out);
        }

        cfg_if::cfg_if! {
            if #[cfg(feature = "direct-invoke")] {
                match self.procedures.get(name) {
                    Some(procedure) => invoke::invoke(name, &procedure, &argv[1..], self, out)
                        .map_err(CommandError::from),
                    None => Err(CommandError::UnknownCommand(name.clone())),
                }
            } else {
                Err(CommandError::UnknownCommand(name.clone()))
            }
        }
    }

    /// Executes one of the reserved commands.
    fn run_reserved(
        &mut self,
        kind: Reserved,
        argv: &[String],
        out: &mut dyn Write,
    ) -> Result<(), ProcedureError> {
        let usage = |err: ProcedureError| match err {
            ProcedureError::Usage { .. } => commands::usage_error(&argv[..1], kind.argsig()),
            err => err,
        };

        match kind {
            Reserved::Begin => {
                if let Some(current) = self.recorder.recording_name() {
                    return Err(ProcedureError::AlreadyRecording {
                        name: current.to_string(),
                    });
                }
                commands::check_args(1, argv, 3, 0, kind.argsig())?;
                self.recorder.begin(&argv[1], &argv[2..]).map_err(usage)
            }
            Reserved::End => {
                let name = self.recorder.end(&mut self.procedures)?;

                if cfg!(feature = "direct-invoke") && self.commands.contains_key(&name) {
                    tracing::warn!(
                        procedure = name.as_str(),
                        "procedure is shadowed by a command of the same name"
                    );
                }

                Ok(())
            }
            Reserved::Run => {
                commands::check_args(1, argv, 2, 0, kind.argsig())?;
                let procedure = self.procedures.lookup(&argv[1])?;
                invoke::invoke(&argv[1], &procedure, &argv[2..], self, out)
            }
            Reserved::For => {
                let (spec, body) = LoopSpec::parse(&argv[1..]).map_err(usage)?;
                let is_command = |name: &str| self.commands.contains_key(name);
                let body = LoopBody::parse(body, &self.procedures, &is_command).map_err(usage)?;
                looping::run_loop(&spec, &body, self, out)
            }
        }
    }

    //--------------------------------------------------------------------------------------------
    // Recording State

    /// Returns true while a procedure definition is open.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// The name of the procedure being recorded, if any.
    pub fn recording_name(&self) -> Option<&str> {
        self.recorder.recording_name()
    }

    /// The prompt a front end should show: the recording prompt while a definition is
    /// open, the normal prompt otherwise.
    pub fn prompt(&self) -> &str {
        if self.is_recording() {
            &self.config.recording_prompt
        } else {
            &self.config.prompt
        }
    }

    //--------------------------------------------------------------------------------------------
    // Command Definition and Handling

    #[cfg(feature = "closure-commands")]
    pub fn add_command_closure(
        &mut self,
        name: &str,
        func: impl (Fn(&mut Self, &[String]) -> CommandResult) + 'static,
    ) {
        self.commands
            .insert(name.into(), Rc::new(Command::Closure(Box::new(func))));
    }

    /// Adds a binary command to the interpreter.  This is the normal way to add most
    /// commands.  An existing command of the same name is replaced.
    pub fn add_command(&mut self, name: &str, func: CommandFunc) {
        self.commands
            .insert(name.into(), Rc::new(Command::Native(func)));
    }

    /// Determines whether or not the interpreter contains a command with the given
    /// name.  Procedures are not commands; see [`procedure`](#method.procedure).
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Renames the command.
    ///
    /// **Note:** This does not update recorded procedures that reference the command
    /// under the old name.
    pub fn rename_command(&mut self, old_name: &str, new_name: &str) {
        if let Some(cmd) = self.commands.shift_remove(old_name) {
            self.commands.insert(new_name.into(), cmd);
        }
    }

    /// Removes the command with the given name.
    pub fn remove_command(&mut self, name: &str) {
        self.commands.shift_remove(name);
    }

    /// Gets a vector of the names of the existing commands, in definition order.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Returns "native", "closure" or "reserved" for a command, "procedure" for a
    /// procedure, or `None` if neither exists.
    pub fn command_type(&self, name: &str) -> Option<&'static str> {
        match self.commands.get(name) {
            Some(cmd) => Some(cmd.cmdtype()),
            None if self.procedures.contains(name) => Some("procedure"),
            None => None,
        }
    }

    /// Returns a one-line usage string for a command or procedure.
    pub fn command_usage(&self, name: &str) -> Option<String> {
        let usage = match self.commands.get(name).map(|cmd| &**cmd) {
            Some(Command::Reserved(kind)) => format!("{} {}", name, kind.argsig()),
            Some(_) => format!("{name} ?arg ...?"),
            None => {
                let procedure = self.procedures.get(name)?;
                format!("{} {}", name, procedure.params().join(" "))
            }
        };

        Some(usage.trim_end().to_string())
    }

    //--------------------------------------------------------------------------------------------
    // Procedures

    /// Gets the names of the defined procedures, in definition order.
    pub fn procedure_names(&self) -> Vec<String> {
        self.procedures.names().map(String::from).collect()
    }

    /// Gets a defined procedure.
    pub fn procedure(&self, name: &str) -> Option<Rc<Procedure>> {
        self.procedures.get(name)
    }

    pub fn procedures(&self) -> &ProcedureRegistry {
        &self.procedures
    }

    //--------------------------------------------------------------------------------------------
    // Interpreter Configuration

    /// Gets the interpreter's recursion limit: how deep dispatch may nest, as when a
    /// procedure runs a procedure that runs a procedure.
    ///
    /// # Example
    /// ```
    /// # use shproc::Interp;
    /// let interp = Interp::new();
    /// assert_eq!(interp.recursion_limit(), 256);
    /// ```
    pub fn recursion_limit(&self) -> usize {
        self.config.recursion_limit
    }

    /// Sets the interpreter's recursion limit.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.config.recursion_limit = limit;
    }
}

impl Dispatcher for Interp {
    /// Runs a single command on behalf of a replayed procedure or loop, returning its
    /// output.  Dispatch always executes, even while a definition is open.
    fn execute(&mut self, command: &str, args: &[String]) -> CommandResult {
        // FIRST, check the number of nesting levels
        self.num_levels += 1;

        if self.num_levels > self.config.recursion_limit {
            self.num_levels -= 1;
            return Err(ProcedureError::RecursionLimit {
                limit: self.config.recursion_limit,
            }
            .into());
        }

        trace!(command, ?args, level = self.num_levels, "execute");

        // NEXT, run the command, collecting its output.
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(command.to_string());
        argv.extend_from_slice(args);

        let mut output: Vec<u8> = Vec::new();
        let result = self.run_command(&argv, &mut output);

        // NEXT, decrement the number of nesting levels.
        self.num_levels -= 1;

        result?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}
