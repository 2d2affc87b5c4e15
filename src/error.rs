//! Errors raised while loading and executing a script.

use thiserror::Error;

/// Every failure a script can run into, tagged with the 1-based number of the
/// line that produced it.
///
/// Lines executed from a function body or from a `times` sub-command keep the
/// number they were written on, so diagnostics always point at real text.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Malformed argument: bad number, bad JSON, missing count, etc.
    #[error("line {line}: {message}")]
    Parse {
        /// Line number where the error occurred
        line: usize,
        /// Error message
        message: String,
    },

    /// A shell command was used without the shell capability.
    #[error("line {line}: '{command}' requires shell commands to be enabled (--sh)")]
    CapabilityDenied { line: usize, command: String },

    /// `call` of a name that is not (yet) in the function table.
    #[error("line {line}: undefined function '{name}'")]
    UndefinedFunction { line: usize, name: String },

    /// A definition marker without a name.
    #[error("line {line}: function definition without a name")]
    EmptyFunctionName { line: usize },

    /// Too many nested `call`s, usually a function calling itself.
    #[error("line {line}: call to '{name}' exceeds the maximum call depth of {limit}")]
    CallDepthExceeded {
        line: usize,
        name: String,
        limit: usize,
    },

    /// The device, shell or prompt backend failed.
    #[error("line {line}: {source}")]
    Backend {
        line: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl ScriptError {
    /// Create a parse error at a specific line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ScriptError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Parse { line, .. }
            | ScriptError::CapabilityDenied { line, .. }
            | ScriptError::UndefinedFunction { line, .. }
            | ScriptError::EmptyFunctionName { line }
            | ScriptError::CallDepthExceeded { line, .. }
            | ScriptError::Backend { line, .. } => *line,
        }
    }

    /// Whether this error stops the whole run.
    ///
    /// Calling an undefined function is reported but lets the script go on;
    /// everything else halts.
    pub fn halts(&self) -> bool {
        !matches!(self, ScriptError::UndefinedFunction { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_undefined_function_keeps_running() {
        let lookup = ScriptError::UndefinedFunction {
            line: 3,
            name: "foo".to_string(),
        };
        assert!(!lookup.halts());

        assert!(ScriptError::parse(1, "bad").halts());
        assert!(ScriptError::EmptyFunctionName { line: 2 }.halts());
        assert!(
            ScriptError::CapabilityDenied {
                line: 4,
                command: "sh".to_string()
            }
            .halts()
        );
    }

    #[test]
    fn test_messages_carry_line_number() {
        let err = ScriptError::parse(12, "invalid sleep duration 'abc'");
        assert_eq!(err.line(), 12);
        assert_eq!(err.to_string(), "line 12: invalid sleep duration 'abc'");

        let err = ScriptError::Backend {
            line: 7,
            source: anyhow::anyhow!("device unplugged"),
        };
        assert_eq!(err.line(), 7);
        assert_eq!(err.to_string(), "line 7: device unplugged");
    }
}
