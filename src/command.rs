//! The closed set of script commands and their argument parsers.

use crate::error::{Result, ScriptError};
use std::time::Duration;

/// A fully parsed command, its argument already converted to the type the
/// command works with.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Emphasised log message, no device action.
    Title(String),
    /// Block for a duration.
    Sleep(Duration),
    /// Type text through the device.
    Print(String),
    /// Press keys together, in order.
    Combo(Vec<String>),
    KeyDown(String),
    KeyUp(String),
    /// Run `line` as a command `count` times.
    Repeat { count: i64, line: String },
    /// Run the body of a named function.
    Call(String),
    /// Wait for the user to acknowledge.
    Wait,
    /// Run a shell command and wait for it.
    Shell(String),
    /// Start a shell command without waiting.
    AsyncShell(String),
}

/// Which command a keyword selects, before its argument is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Title,
    Sleep,
    Print,
    Combo,
    KeyDown,
    KeyUp,
    Repeat,
    Call,
    Wait,
    Shell,
    AsyncShell,
}

/// Every accepted spelling, lowercase.
const KEYWORDS: &[(&str, CommandKind)] = &[
    ("title", CommandKind::Title),
    ("#", CommandKind::Title),
    ("-", CommandKind::Sleep),
    ("sleep", CommandKind::Sleep),
    (">", CommandKind::Print),
    ("print", CommandKind::Print),
    (".", CommandKind::Combo),
    ("key", CommandKind::Combo),
    ("combo", CommandKind::Combo),
    ("kdown", CommandKind::KeyDown),
    ("kdn", CommandKind::KeyDown),
    ("hold", CommandKind::KeyDown),
    ("kup", CommandKind::KeyUp),
    ("release", CommandKind::KeyUp),
    ("*", CommandKind::Repeat),
    ("times", CommandKind::Repeat),
    ("/", CommandKind::Call),
    ("call", CommandKind::Call),
    ("jump", CommandKind::Call),
    ("<", CommandKind::Wait),
    ("wait", CommandKind::Wait),
    ("sh", CommandKind::Shell),
    ("$", CommandKind::Shell),
    ("shell", CommandKind::Shell),
    ("ash", CommandKind::AsyncShell),
    ("%", CommandKind::AsyncShell),
    ("ashell", CommandKind::AsyncShell),
    ("asyncshell", CommandKind::AsyncShell),
];

impl CommandKind {
    /// Resolve a keyword, ignoring case. Unknown keywords yield `None`.
    pub fn lookup(keyword: &str) -> Option<Self> {
        let keyword = keyword.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == keyword)
            .map(|(_, kind)| *kind)
    }

    /// Parse the argument of a command of this kind found on `line`.
    pub fn parse(self, arg: &str, line: usize) -> Result<Command> {
        Ok(match self {
            CommandKind::Title => Command::Title(arg.to_string()),
            CommandKind::Sleep => Command::Sleep(parse_seconds(arg, line)?),
            CommandKind::Print => Command::Print(parse_json_string(arg, line)?),
            CommandKind::Combo => {
                Command::Combo(arg.split('+').map(|key| key.trim().to_string()).collect())
            }
            CommandKind::KeyDown => Command::KeyDown(arg.trim().to_string()),
            CommandKind::KeyUp => Command::KeyUp(arg.trim().to_string()),
            CommandKind::Repeat => parse_repeat(arg, line)?,
            CommandKind::Call => Command::Call(arg.trim().to_string()),
            CommandKind::Wait => Command::Wait,
            CommandKind::Shell => Command::Shell(arg.to_string()),
            CommandKind::AsyncShell => Command::AsyncShell(arg.to_string()),
        })
    }
}

fn parse_seconds(arg: &str, line: usize) -> Result<Duration> {
    let seconds: f64 = arg
        .trim()
        .parse()
        .map_err(|_| ScriptError::parse(line, format!("invalid sleep duration '{arg}'")))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| ScriptError::parse(line, format!("sleep duration out of range '{arg}'")))
}

fn parse_json_string(arg: &str, line: usize) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(arg)
        .map_err(|e| ScriptError::parse(line, format!("invalid JSON in print: {e}")))?;
    match value {
        serde_json::Value::String(text) => Ok(text),
        other => Err(ScriptError::parse(
            line,
            format!("print expects a JSON string, got {other}"),
        )),
    }
}

fn parse_repeat(arg: &str, line: usize) -> Result<Command> {
    let (count, rest) = arg.split_once(char::is_whitespace).ok_or_else(|| {
        ScriptError::parse(line, format!("times expects '<count> <command>', got '{arg}'"))
    })?;
    let count: i64 = count
        .parse()
        .map_err(|_| ScriptError::parse(line, format!("invalid repeat count '{count}'")))?;
    if rest.trim().is_empty() {
        return Err(ScriptError::parse(line, "times is missing the command to repeat"));
    }
    Ok(Command::Repeat {
        count,
        line: rest.to_string(),
    })
}
