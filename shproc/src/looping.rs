//! `for` loop expansion.
//!
//! A loop is a [`LoopSpec`] (counter name and integer range) plus a [`LoopBody`].  The
//! body is either one or more inline commands, in which every argument equal to the
//! counter name is replaced by the counter's value, or a registered one-parameter
//! procedure, which is invoked once per value.
//!
//! Two range notations are accepted:
//!
//! ```text
//! for i 1 10 2 echo i      (var from to ?step? body...)
//! for i=1:10:2 echo i      (var=from:to?:step? body...)
//! ```

use crate::dispatch::Dispatcher;
use crate::error::{CommandError, Position, ProcedureError};
use crate::invoke::{check_arity, invoke};
use crate::procedure::{Instruction, Procedure, ProcedureRegistry};
use std::io::Write;
use std::rc::Rc;
use tracing::trace;

/// The argument signature of the `for` command.
pub const FOR_ARGSIG: &str = "var from to ?step? command ?arg ...?";

/// A loop counter and the range it runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSpec {
    var: String,
    from: i64,
    to: i64,
    step: i64,
}

impl LoopSpec {
    /// Creates a loop spec; a zero step is a `MalformedRange`.
    pub fn new(var: &str, from: i64, to: i64, step: i64) -> Result<Self, ProcedureError> {
        if step == 0 {
            return Err(ProcedureError::MalformedRange {
                token: step.to_string(),
                reason: "step must not be zero",
            });
        }

        Ok(Self {
            var: var.to_string(),
            from,
            to,
            step,
        })
    }

    /// Parses the range at the front of a `for` command's arguments, returning the spec
    /// and the remaining (body) words.
    pub fn parse(args: &[String]) -> Result<(Self, &[String]), ProcedureError> {
        let usage = || ProcedureError::Usage {
            usage: format!("for {FOR_ARGSIG}"),
        };

        let first = args.first().ok_or_else(usage)?;

        // FIRST, the compact form: var=from:to?:step?
        if let Some((var, range)) = first.split_once('=') {
            let bounds: Vec<&str> = range.split(':').collect();
            if var.is_empty() || !(2..=3).contains(&bounds.len()) {
                return Err(ProcedureError::MalformedRange {
                    token: first.clone(),
                    reason: "expected var=from:to or var=from:to:step",
                });
            }

            let from = parse_bound(bounds[0])?;
            let to = parse_bound(bounds[1])?;
            let step = match bounds.get(2) {
                Some(step) => parse_bound(step)?,
                None => 1,
            };

            return Ok((Self::new(var, from, to, step)?, &args[1..]));
        }

        // NEXT, the spaced form: var from to ?step?
        if args.len() < 3 {
            return Err(usage());
        }

        let from = parse_bound(&args[1])?;
        let to = parse_bound(&args[2])?;

        // A fourth word that reads as an integer is the step; anything else starts
        // the body.
        match args.get(3).and_then(|word| word.parse::<i64>().ok()) {
            Some(step) => Ok((Self::new(first, from, to, step)?, &args[4..])),
            None => Ok((Self::new(first, from, to, 1)?, &args[3..])),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// The counter values, in order.  Empty when the range runs the wrong way.
    pub fn values(&self) -> LoopValues {
        LoopValues {
            next: Some(self.from),
            to: self.to,
            step: self.step,
        }
    }
}

fn parse_bound(token: &str) -> Result<i64, ProcedureError> {
    token
        .trim()
        .parse()
        .map_err(|_| ProcedureError::MalformedRange {
            token: token.to_string(),
            reason: "expected an integer",
        })
}

/// Iterator over a loop's counter values.
#[derive(Debug, Clone)]
pub struct LoopValues {
    next: Option<i64>,
    to: i64,
    step: i64,
}

impl Iterator for LoopValues {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let value = self.next?;
        let in_range = if self.step > 0 {
            value <= self.to
        } else {
            value >= self.to
        };

        if !in_range {
            self.next = None;
            return None;
        }

        // Overflow past i64 ends the loop.
        self.next = value.checked_add(self.step);
        Some(value)
    }
}

/// What a loop runs on each iteration.
#[derive(Debug, Clone)]
pub enum LoopBody {
    /// Commands given on the `for` line itself, separated by `;`.
    Inline(Vec<Instruction>),

    /// A registered procedure taking the counter as its one argument.
    Procedure {
        name: String,
        procedure: Rc<Procedure>,
    },
}

impl LoopBody {
    /// Builds a body from the words following the range.  A single word naming a
    /// registered procedure selects that procedure, unless `is_command` reports a host
    /// command of the same name; otherwise the words are inline commands.
    pub fn parse(
        words: &[String],
        registry: &ProcedureRegistry,
        is_command: &dyn Fn(&str) -> bool,
    ) -> Result<Self, ProcedureError> {
        if let [name] = words {
            if let Some(procedure) = registry.get(name).filter(|_| !is_command(name)) {
                return Ok(LoopBody::Procedure {
                    name: name.clone(),
                    procedure,
                });
            }
        }

        let instructions: Vec<Instruction> = split_commands(words)
            .iter()
            .filter_map(|command| {
                command
                    .split_first()
                    .map(|(name, args)| Instruction::literal(name, args))
            })
            .collect();

        if instructions.is_empty() {
            return Err(ProcedureError::Usage {
                usage: format!("for {FOR_ARGSIG}"),
            });
        }

        Ok(LoopBody::Inline(instructions))
    }
}

/// Splits words into commands at `;`, which may stand alone or end a word.
fn split_commands(words: &[String]) -> Vec<Vec<String>> {
    let mut commands = vec![Vec::new()];

    for word in words {
        let (word, ends_command) = match word.strip_suffix(';') {
            Some(rest) => (rest, true),
            None => (word.as_str(), false),
        };

        if !word.is_empty() {
            if let Some(current) = commands.last_mut() {
                current.push(word.to_string());
            }
        }
        if ends_command {
            commands.push(Vec::new());
        }
    }

    commands.retain(|command| !command.is_empty());
    commands
}

/// Runs the loop, dispatching the body once per counter value.
///
/// The first failing iteration stops the loop and is reported as `InstructionFailed`
/// with its 1-based iteration number.
pub fn run_loop<D: Dispatcher + ?Sized>(
    spec: &LoopSpec,
    body: &LoopBody,
    dispatcher: &mut D,
    out: &mut dyn Write,
) -> Result<(), ProcedureError> {
    if let LoopBody::Procedure { name, procedure } = body {
        check_arity(name, procedure, 1)?;
    }

    let context = format!("for {}", spec.var);

    for (iteration, value) in spec.values().enumerate() {
        let value = value.to_string();
        trace!(var = spec.var.as_str(), value = value.as_str(), "iteration");

        let failed = |cause: CommandError| ProcedureError::InstructionFailed {
            context: context.clone(),
            position: Position::Iteration(iteration + 1),
            cause,
        };

        match body {
            LoopBody::Inline(instructions) => {
                for instruction in instructions {
                    let args = instruction.substitute(&spec.var, &value);
                    let output = dispatcher
                        .execute(instruction.command(), &args)
                        .map_err(failed)?;
                    out.write_all(output.as_bytes())?;
                }
            }
            LoopBody::Procedure { name, procedure } => {
                match invoke(name, procedure, std::slice::from_ref(&value), dispatcher, out) {
                    Ok(()) => {}
                    Err(ProcedureError::Output(err)) => return Err(ProcedureError::Output(err)),
                    Err(err) => return Err(failed(err.into())),
                }
            }
        }
    }

    Ok(())
}
