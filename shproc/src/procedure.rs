//! Recorded procedures.
//!
//! A [`Procedure`] is an ordered list of [`Instruction`]s together with the formal
//! parameter names declared when its definition was opened.  Each instruction knows,
//! from the moment it is recorded, which of its arguments are placeholders for which
//! parameter, so replaying it is a matter of overwriting those positions.
//!
//! Completed procedures live in the [`ProcedureRegistry`].

use crate::error::ProcedureError;
use fnv::FnvHasher;
use indexmap::IndexMap;
use std::hash::BuildHasherDefault;
use std::rc::Rc;

/// Hasher used for the name-keyed tables.
pub type ShprocHasher = BuildHasherDefault<FnvHasher>;

/// Marks argument `arg` of an instruction as a placeholder for parameter `param`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    pub arg: usize,
    pub param: usize,
}

/// One recorded command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    command: String,
    args: Vec<String>,
    slots: Vec<ParamSlot>,
}

impl Instruction {
    /// Creates an instruction with no placeholders.
    pub fn literal(command: &str, args: &[String]) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
            slots: Vec::new(),
        }
    }

    /// Records a command line, turning every argument that is exactly one of the
    /// `params` into a placeholder for that parameter.
    pub fn record(command: &str, args: &[String], params: &[String]) -> Self {
        let slots = args
            .iter()
            .enumerate()
            .filter_map(|(arg, token)| {
                params
                    .iter()
                    .position(|p| p == token)
                    .map(|param| ParamSlot { arg, param })
            })
            .collect();

        Self {
            command: command.to_string(),
            args: args.to_vec(),
            slots,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// The arguments as typed, placeholders included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Builds the concrete argument list for one invocation, with each placeholder
    /// replaced by the actual value of its parameter.
    pub fn bind(&self, actuals: &[String]) -> Vec<String> {
        let mut args = self.args.clone();
        for slot in &self.slots {
            if let Some(value) = actuals.get(slot.param) {
                args[slot.arg] = value.clone();
            }
        }
        args
    }

    /// Replaces every argument that is exactly `var` with `value`.  This is the
    /// textual substitution used by `for` loops.
    pub fn substitute(&self, var: &str, value: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| if arg == var { value.to_string() } else { arg.clone() })
            .collect()
    }

    /// Renders the instruction as a command line, showing placeholders as `$param`.
    pub fn render(&self, params: &[String]) -> String {
        let mut words = vec![shell_words::quote(&self.command).into_owned()];

        for (i, arg) in self.args.iter().enumerate() {
            match self.slots.iter().find(|slot| slot.arg == i) {
                Some(slot) => match params.get(slot.param) {
                    Some(param) => words.push(format!("${param}")),
                    None => words.push(shell_words::quote(arg).into_owned()),
                },
                None => words.push(shell_words::quote(arg).into_owned()),
            }
        }

        words.join(" ")
    }
}

/// A named, parameterized sequence of recorded commands.
///
/// NOTE: The procedure doesn't know its own name; the name exists only as the
/// registry key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Procedure {
    params: Vec<String>,
    instructions: Vec<Instruction>,
}

impl Procedure {
    /// Creates an empty procedure.  Parameter names must be distinct.
    pub fn new(params: Vec<String>) -> Result<Self, ProcedureError> {
        for (i, name) in params.iter().enumerate() {
            if params[..i].contains(name) {
                return Err(ProcedureError::DuplicateParameter { name: name.clone() });
            }
        }

        Ok(Self {
            params,
            instructions: Vec::new(),
        })
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Appends a command line to the procedure's body.
    pub fn record(&mut self, command: &str, args: &[String]) {
        self.instructions
            .push(Instruction::record(command, args, &self.params));
    }

    /// Returns `name(param, ...)`.
    pub fn signature(&self, name: &str) -> String {
        format!("{}({})", name, self.params.join(", "))
    }
}

/// Completed procedures, by name.
///
/// Entries are shared via `Rc` so that a procedure can be replayed while the
/// registry itself stays reachable (a procedure may run other procedures).
#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    procedures: IndexMap<String, Rc<Procedure>, ShprocHasher>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the procedure under the given name, returning the definition it
    /// replaces, if any.
    pub fn insert(&mut self, name: &str, procedure: Procedure) -> Option<Rc<Procedure>> {
        self.procedures.insert(name.to_string(), Rc::new(procedure))
    }

    pub fn get(&self, name: &str) -> Option<Rc<Procedure>> {
        self.procedures.get(name).cloned()
    }

    /// Like [`get`](#method.get), but fails with `UnknownProcedure`.
    pub fn lookup(&self, name: &str) -> Result<Rc<Procedure>, ProcedureError> {
        self.get(name).ok_or_else(|| ProcedureError::UnknownProcedure {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Procedure names in the order they were first defined.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_record_marks_params() {
        let params = words("name greeting");
        let instr = Instruction::record("say", &words("greeting there name !"), &params);

        assert_eq!(instr.command(), "say");
        assert_eq!(instr.args(), &words("greeting there name !")[..]);
        assert_eq!(
            instr.slots(),
            &[
                ParamSlot { arg: 0, param: 1 },
                ParamSlot { arg: 2, param: 0 }
            ]
        );
    }

    #[test]
    fn test_record_matches_whole_tokens_only() {
        let instr = Instruction::record("say", &words("names xname name"), &words("name"));
        assert_eq!(instr.slots(), &[ParamSlot { arg: 2, param: 0 }]);
    }

    #[test]
    fn test_bind() {
        let params = words("a b");
        let instr = Instruction::record("cmd", &words("a x b a"), &params);

        assert_eq!(instr.bind(&words("1 2")), words("1 x 2 1"));

        // Binding is pure: the recorded arguments are untouched.
        assert_eq!(instr.args(), &words("a x b a")[..]);
    }

    #[test]
    fn test_bind_value_with_spaces() {
        let instr = Instruction::record("say", &words("hello name"), &words("name"));
        let actuals = vec!["big world".to_string()];
        assert_eq!(instr.bind(&actuals), vec!["hello", "big world"]);
    }

    #[test]
    fn test_substitute() {
        let instr = Instruction::literal("set", &words("x i ii i"));
        assert_eq!(instr.substitute("i", "7"), words("x 7 ii 7"));
    }

    #[test]
    fn test_render() {
        let params = words("name");
        let mut args = words("hello name");
        args.push("two words".into());
        let instr = Instruction::record("say", &args, &params);

        assert_eq!(instr.render(&params), "say hello $name 'two words'");
    }

    #[test]
    fn test_render_with_missing_params() {
        let instr = Instruction::record("say", &words("hello name"), &words("name"));

        // A slot with no matching parameter shows the recorded word.
        assert_eq!(instr.render(&[]), "say hello name");
    }

    #[test]
    fn test_procedure_duplicate_params() {
        assert!(Procedure::new(words("a b c")).is_ok());
        assert!(matches!(
            Procedure::new(words("a b a")),
            Err(ProcedureError::DuplicateParameter { name }) if name == "a"
        ));
    }

    #[test]
    fn test_procedure_record() {
        let mut proc = Procedure::new(words("x")).unwrap();
        proc.record("echo", &words("x y"));
        proc.record("echo", &words("done"));

        assert_eq!(proc.arity(), 1);
        assert_eq!(proc.instructions().len(), 2);
        assert_eq!(proc.instructions()[0].slots().len(), 1);
        assert!(proc.instructions()[1].slots().is_empty());
        assert_eq!(proc.signature("p"), "p(x)");
    }

    #[test]
    fn test_registry_last_definition_wins() {
        let mut registry = ProcedureRegistry::new();
        assert!(registry.is_empty());

        assert!(registry
            .insert("p", Procedure::new(words("a")).unwrap())
            .is_none());
        let old = registry.insert("p", Procedure::new(words("a b")).unwrap());

        assert_eq!(old.map(|p| p.arity()), Some(1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("p").map(|p| p.arity()), Some(2));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProcedureRegistry::new();
        registry.insert("first", Procedure::default());
        registry.insert("second", Procedure::default());

        assert!(registry.contains("first"));
        assert!(registry.lookup("second").is_ok());
        assert!(matches!(
            registry.lookup("third"),
            Err(ProcedureError::UnknownProcedure { name }) if name == "third"
        ));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first", "second"]);
    }
}
