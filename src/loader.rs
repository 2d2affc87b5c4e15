//! Single forward pass over a script: drops comment blocks, collects function
//! definitions and executes every other line as soon as it is read.

use crate::error::{Result, ScriptError};
use crate::interpreter::{Interpreter, Signal};
use crate::script::{FunctionTable, RawLine};
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const BLOCK_COMMENT_OPEN: &str = "/*";
const BLOCK_COMMENT_CLOSE: &str = "*/";
const FUNCTION_OPEN: &[&str] = &["fn", "function", "("];
const FUNCTION_CLOSE: &[&str] = &["endfn", "endfunction", ")"];

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every line was read and nothing halted.
    Completed,
    /// A line halted the run; nothing after it was executed.
    Halted { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    TopLevel,
    InFunction { name: String, line: usize },
}

/// Owns the function table and the comment/definition state while a script
/// is read.
#[derive(Debug)]
pub struct Loader {
    functions: FunctionTable,
    state: State,
    in_comment: Option<usize>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            functions: FunctionTable::new(),
            state: State::TopLevel,
            in_comment: None,
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Read `reader` line by line, executing top-level lines with `interp`.
    ///
    /// Returns [`Outcome::Halted`] as soon as a line halts. A definition
    /// marker without a name is an error that ends the run.
    pub fn run<R: BufRead>(
        &mut self,
        reader: R,
        interp: &mut Interpreter,
    ) -> anyhow::Result<Outcome> {
        for (index, line) in reader.lines().enumerate() {
            let number = index + 1;
            let text = line.with_context(|| format!("failed to read line {number}"))?;
            let raw = RawLine::new(number, text.trim_end());
            if self.feed(raw, interp)?.is_halt() {
                return Ok(Outcome::Halted { line: number });
            }
        }
        self.finish();
        log::info!("End of file");
        Ok(Outcome::Completed)
    }

    /// Process one physical line.
    pub fn feed(&mut self, raw: RawLine, interp: &mut Interpreter) -> Result<Signal> {
        let line = raw.text.trim_start();

        if line.starts_with(BLOCK_COMMENT_CLOSE) {
            self.in_comment = None;
            return Ok(Signal::Continue);
        }
        if line.starts_with(BLOCK_COMMENT_OPEN) {
            self.in_comment = Some(raw.number);
            return Ok(Signal::Continue);
        }
        if self.in_comment.is_some() {
            return Ok(Signal::Continue);
        }

        match &self.state {
            State::InFunction { name, .. } => {
                if FUNCTION_CLOSE.iter().any(|marker| line.starts_with(marker)) {
                    log::debug!("line {}: end of function '{}'", raw.number, name);
                    self.state = State::TopLevel;
                } else {
                    let name = name.clone();
                    self.functions.push_line(&name, raw);
                }
                Ok(Signal::Continue)
            }
            State::TopLevel => match definition_name(line) {
                Some(name) if name.is_empty() => {
                    Err(ScriptError::EmptyFunctionName { line: raw.number })
                }
                Some(name) => {
                    log::debug!("line {}: defining function '{}'", raw.number, name);
                    self.functions.define(name);
                    self.state = State::InFunction {
                        name: name.to_string(),
                        line: raw.number,
                    };
                    Ok(Signal::Continue)
                }
                None => Ok(interp.execute(&raw, &self.functions)),
            },
        }
    }

    fn finish(&mut self) {
        if let State::InFunction { name, line } = &self.state {
            log::warn!("function '{name}' opened on line {line} is never closed");
        }
        if let Some(line) = self.in_comment {
            log::warn!("comment block opened on line {line} is never closed");
        }
    }
}

/// The trimmed function name if `line` opens a definition.
///
/// A marker alone on its line yields an empty name.
fn definition_name(line: &str) -> Option<&str> {
    FUNCTION_OPEN.iter().find_map(|marker| {
        let rest = line.strip_prefix(marker)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    })
}

/// Open `path` and run it from top to bottom.
pub fn run_file(path: &Path, interp: &mut Interpreter) -> anyhow::Result<Outcome> {
    log::info!("Opening file '{}'", path.display());
    let file =
        File::open(path).with_context(|| format!("can't open script {}", path.display()))?;
    Loader::new().run(BufReader::new(file), interp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Action, ConsolePrompt, RecordingDevice};
    use crate::capability::Capabilities;
    use crate::external::SystemShell;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn interpreter() -> (Interpreter, Rc<RefCell<Vec<Action>>>) {
        let (device, actions) = RecordingDevice::with_handle();
        let interp = Interpreter::new(
            Capabilities::default(),
            Box::new(device),
            Box::new(SystemShell::default()),
            Box::new(ConsolePrompt),
        );
        (interp, actions)
    }

    fn run_script(script: &str) -> (anyhow::Result<Outcome>, Vec<Action>, Loader) {
        let (mut interp, actions) = interpreter();
        let mut loader = Loader::new();
        let outcome = loader.run(Cursor::new(script.to_string()), &mut interp);
        let actions = actions.borrow().clone();
        (outcome, actions, loader)
    }

    fn typed(text: &str) -> Action {
        Action::Type(text.to_string())
    }

    #[test]
    fn test_definition_name() {
        assert_eq!(definition_name("fn greet"), Some("greet"));
        assert_eq!(definition_name("function  greet  "), Some("greet"));
        assert_eq!(definition_name("( greet"), Some("greet"));
        assert_eq!(definition_name("fn"), Some(""));
        assert_eq!(definition_name("fnord"), None);
        assert_eq!(definition_name("functional x"), None);
        assert_eq!(definition_name("print \"fn x\""), None);
    }

    #[test]
    fn test_top_level_lines_run_in_order() {
        let (outcome, actions, _) = run_script("print \"a\"\nkey ctrl+c\nprint \"b\"\n");
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(
            actions,
            vec![
                typed("a"),
                Action::Combo(vec!["ctrl".into(), "c".into()]),
                typed("b")
            ]
        );
    }

    #[test]
    fn test_halt_stops_reading() {
        let (outcome, actions, _) = run_script("print \"a\"\nsleep soon\nprint \"b\"\n");
        assert_eq!(outcome.unwrap(), Outcome::Halted { line: 2 });
        assert_eq!(actions, vec![typed("a")]);
    }

    #[test]
    fn test_function_body_is_captured_not_run() {
        let script = "fn greet\nprint \"hello\"\nendfn\n";
        let (outcome, actions, loader) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert!(actions.is_empty());
        let greet = loader.functions().get("greet").unwrap();
        assert_eq!(greet.body, vec![RawLine::new(2, "print \"hello\"")]);
    }

    #[test]
    fn test_call_after_definition() {
        let script = "( greet\n  print \"hello\"\n)\ncall greet\njump greet\n";
        let (outcome, actions, _) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(actions, vec![typed("hello"), typed("hello")]);
    }

    #[test]
    fn test_forward_reference_fails_like_undefined() {
        let script = "call later\ncall nowhere\nprint \"still running\"\nfunction later\nprint \"x\"\nendfunction\n";
        let (outcome, actions, _) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(actions, vec![typed("still running")]);
    }

    #[test]
    fn test_last_definition_wins() {
        let script = "fn foo\nprint \"one\"\nendfn\nfn foo\nprint \"two\"\nendfn\ncall foo\n";
        let (_, actions, _) = run_script(script);
        assert_eq!(actions, vec![typed("two")]);
    }

    #[test]
    fn test_calls_see_definition_current_at_call_time() {
        let script = "fn foo\nprint \"one\"\nendfn\ncall foo\nfn foo\nprint \"two\"\nendfn\ncall foo\n";
        let (_, actions, _) = run_script(script);
        assert_eq!(actions, vec![typed("one"), typed("two")]);
    }

    #[test]
    fn test_block_comment_excludes_lines() {
        let script = "print \"1\"\n\n\n\n/* start\nfn hidden\nprint \"no\"\nendfn\n*/ end\nprint \"2\"\ncall hidden\n";
        let (outcome, actions, loader) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(actions, vec![typed("1"), typed("2")]);
        assert!(loader.functions().get("hidden").is_none());
    }

    #[test]
    fn test_block_comment_inside_function() {
        let script = "fn f\nprint \"a\"\n/*\nprint \"b\"\n*/\nprint \"c\"\nendfn\ncall f\n";
        let (_, actions, loader) = run_script(script);
        assert_eq!(actions, vec![typed("a"), typed("c")]);
        assert_eq!(loader.functions().get("f").unwrap().body.len(), 2);
    }

    #[test]
    fn test_comment_open_line_is_never_code() {
        let script = "/* fn sneaky\nprint \"no\"\n*/\ncall sneaky\n";
        let (_, actions, loader) = run_script(script);
        assert!(actions.is_empty());
        assert!(loader.functions().is_empty());
    }

    #[test]
    fn test_nested_definition_marker_is_body_line() {
        let script = "fn outer\nfn inner\nprint \"x\"\nendfn\ncall outer\n";
        let (outcome, _, loader) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        let outer = loader.functions().get("outer").unwrap();
        assert_eq!(outer.body[0], RawLine::new(2, "fn inner"));
        assert!(loader.functions().get("inner").is_none());
    }

    #[test]
    fn test_body_lines_keep_their_numbers() {
        let script = "title x\nfn f\n\n// note\nkey a\nendfn\n";
        let (_, _, loader) = run_script(script);
        let numbers: Vec<usize> = loader
            .functions()
            .get("f")
            .unwrap()
            .body
            .iter()
            .map(|line| line.number)
            .collect();
        assert_eq!(numbers, vec![3, 4, 5]);
    }

    #[test]
    fn test_halt_inside_function_reports_call_site() {
        let script = "fn f\nprint oops\nendfn\nkey a\ncall f\nkey b\n";
        let (outcome, actions, _) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Halted { line: 5 });
        assert_eq!(actions, vec![Action::Combo(vec!["a".into()])]);
    }

    #[test]
    fn test_empty_function_name_is_structural_error() {
        let script = "key a\nfn\nkey b\n";
        let (outcome, actions, _) = run_script(script);
        let err = outcome.unwrap_err();
        let script_err = err.downcast_ref::<ScriptError>().unwrap();
        assert!(matches!(script_err, ScriptError::EmptyFunctionName { line: 2 }));
        assert_eq!(actions, vec![Action::Combo(vec!["a".into()])]);
    }

    #[test]
    fn test_unterminated_function_still_completes() {
        let script = "fn f\nkey a\n";
        let (outcome, actions, loader) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert!(actions.is_empty());
        assert_eq!(loader.functions().get("f").unwrap().body.len(), 1);
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let script = "print \"a\"   \r\nendfn  \n";
        let (outcome, actions, _) = run_script(script);
        assert_eq!(outcome.unwrap(), Outcome::Completed);
        assert_eq!(actions, vec![typed("a")]);
    }

    #[test]
    fn test_run_file_missing_script() {
        let (mut interp, _) = interpreter();
        let res = run_file(Path::new("/nonexistent/keyplay/script.kp"), &mut interp);
        assert!(res.is_err());
    }
}
