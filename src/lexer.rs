//! Splitting a script line into a command keyword and its argument.

/// Prefix of a single-line comment.
pub const LINE_COMMENT: &str = "//";

/// Returns true for lines that carry no command: blank lines and `//` comments.
pub fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(LINE_COMMENT)
}

/// Split a line on its first run of whitespace.
///
/// The keyword is everything before that run; the argument is the rest of the
/// line verbatim, further whitespace included. Leading whitespace of the line
/// itself is ignored so indented function bodies read naturally.
///
/// ```
/// use keyplay::lexer::split_command;
/// assert_eq!(split_command("print \"a  b\""), ("print", "\"a  b\""));
/// assert_eq!(split_command("wait"), ("wait", ""));
/// ```
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (line, ""),
    }
}
