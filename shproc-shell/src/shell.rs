use rustyline::{error::ReadlineError, history::MemHistory, Config, Editor};
use shproc::{CommandError, Interp};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a script stopped early.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read \"{path}\": {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {source}")]
    Line {
        path: String,
        line: usize,
        #[source]
        source: CommandError,
    },

    #[error("{path}: procedure \"{name}\" is never closed")]
    Unterminated { path: String, name: String },
}

/// Invokes an interactive REPL for the given interpreter, using `rustyline` line editing.
///
/// The REPL prompts with the interpreter's prompt, switching to the recording prompt
/// while a procedure is being recorded.  Command output goes to standard output and
/// errors to standard error; an error does not end the session.  Press `^C` or `^D` to
/// terminate the REPL, returning control to the caller.
///
/// The prompts and the names of the recording commands come from the interpreter's
/// [`ShellConfig`](shproc::ShellConfig).
///
/// # Example
///
/// ```no_run
/// use shproc::Interp;
///
/// // FIRST, create and initialize the interpreter.
/// let mut interp = Interp::new();
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, invoke the REPL.
/// shproc_shell::repl(&mut interp).unwrap();
/// ```
pub fn repl(interp: &mut Interp) -> rustyline::Result<()> {
    let mut rl = Editor::<(), MemHistory>::with_history(Config::default(), MemHistory::new())?;
    let stdout = io::stdout();

    loop {
        let readline = rl.readline(interp.prompt());

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Err(e) = rl.add_history_entry(line) {
                    warn!("history error: {e}");
                }

                let mut out = stdout.lock();
                let result = interp.eval(line, &mut out);
                out.flush()?;

                if let Err(err) = result {
                    eprintln!("{err}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    if let Some(name) = interp.recording_name() {
        warn!(procedure = name, "session ended while recording; definition discarded");
    }

    Ok(())
}

/// Executes a script file in the context of the given interpreter, writing command
/// output to `out`.
///
/// The file is evaluated line by line, exactly as if typed at the REPL.  The first
/// failing line stops the script; the error carries its 1-based line number.  A script
/// that leaves a procedure definition open is also an error.
///
/// # Example
///
/// ```no_run
/// use shproc::Interp;
/// use std::env;
/// use std::io;
///
/// // FIRST, get the command line arguments.
/// let args: Vec<String> = env::args().collect();
///
/// // NEXT, create and initialize the interpreter.
/// let mut interp = Interp::new();
///
/// // NEXT, evaluate the file, if any.
/// if let Some(path) = args.get(1) {
///     if let Err(err) = shproc_shell::script(&mut interp, path.as_ref(), &mut io::stdout()) {
///         eprintln!("{err}");
///     }
/// } else {
///     eprintln!("Usage: myshell filename");
/// }
/// ```
pub fn script(interp: &mut Interp, path: &Path, out: &mut dyn Write) -> Result<(), ScriptError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: display.clone(),
        source,
    })?;

    eval_script(interp, &display, &text, out)
}

/// Executes the text of a script.  `path` names the script in error messages.
pub fn eval_script(
    interp: &mut Interp,
    path: &str,
    text: &str,
    out: &mut dyn Write,
) -> Result<(), ScriptError> {
    for (index, line) in text.lines().enumerate() {
        interp.eval(line, out).map_err(|source| ScriptError::Line {
            path: path.to_string(),
            line: index + 1,
            source,
        })?;
    }

    debug!(script = path, "script finished");

    match interp.recording_name() {
        Some(name) => Err(ScriptError::Unterminated {
            path: path.to_string(),
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> (Result<(), ScriptError>, String) {
        let mut interp = Interp::new();
        let mut out: Vec<u8> = Vec::new();
        let result = eval_script(&mut interp, "test.shp", text, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_script() {
        let (result, out) = run("# greet everybody
begin-procedure greet name
  echo hello name
end-procedure

for i=1:2 echo round i
run-procedure greet World
");
        assert!(result.is_ok());
        assert_eq!(out, "round 1\nround 2\nhello World\n");
    }

    #[test]
    fn test_script_stops_at_failing_line() {
        let (result, out) = run("echo one\nrun-procedure nope\necho three\n");

        let err = result.unwrap_err();
        assert!(matches!(err, ScriptError::Line { line: 2, .. }));
        assert_eq!(
            err.to_string(),
            "test.shp:2: unknown procedure \"nope\""
        );
        assert_eq!(out, "one\n");
    }

    #[test]
    fn test_script_unterminated_definition() {
        let (result, _) = run("begin-procedure p x\necho x\n");
        assert!(matches!(
            result,
            Err(ScriptError::Unterminated { name, .. }) if name == "p"
        ));
    }

    #[test]
    fn test_script_missing_file() {
        let mut interp = Interp::new();
        let result = script(
            &mut interp,
            Path::new("/nonexistent/shproc/script.shp"),
            &mut Vec::<u8>::new(),
        );
        assert!(matches!(result, Err(ScriptError::Read { .. })));
    }
}
