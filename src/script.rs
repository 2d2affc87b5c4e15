use std::collections::HashMap;

/// One physical line of a script together with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub number: usize,
}

impl RawLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number,
        }
    }
}

/// A named block of lines invocable with `call`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub body: Vec<RawLine>,
}

/// Functions defined so far, keyed by exact name.
///
/// Filled while the script is read, so a function is only callable from
/// lines that come after its definition.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionDefinition>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new, empty definition, replacing any previous one of that name.
    pub fn define(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            FunctionDefinition {
                name,
                body: Vec::new(),
            },
        );
    }

    /// Append a line to the body of `name`. Does nothing if `name` is unknown.
    pub fn push_line(&mut self, name: &str, line: RawLine) {
        if let Some(function) = self.functions.get_mut(name) {
            function.body.push(line);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
