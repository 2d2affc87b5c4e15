//! A small interpreter for line-oriented keyboard macro scripts.
//!
//! A script is read once, top to bottom. Lines inside `/* ... */` blocks are
//! dropped, `fn name ... endfn` blocks are stored as callable functions and
//! every other line is executed the moment it is read:
//!
//! ```text
//! title Demo
//! fn greet
//!     print "Hello"
//!     key enter
//! endfn
//! times 2 call greet
//! ```
//!
//! [`Loader`] drives the pass and owns the [`FunctionTable`]; [`Interpreter`]
//! executes single lines against the backends in [`adapters`]. Any failing
//! line halts the whole run, except calling an undefined function, which is
//! only reported.

pub mod adapters;
pub mod capability;
pub mod cli;
pub mod command;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
mod loader;
pub mod script;

pub use capability::Capabilities;
pub use error::ScriptError;
pub use external::SystemShell;
pub use interpreter::{DEFAULT_MAX_DEPTH, Interpreter, Signal};
pub use loader::{Loader, Outcome, run_file};
pub use script::{FunctionDefinition, FunctionTable, RawLine};
