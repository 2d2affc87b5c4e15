//! Command-line options and the run settings derived from them.

use crate::adapters::{ConsolePrompt, LoggingDevice};
use crate::capability::Capabilities;
use crate::external::SystemShell;
use crate::interpreter::{DEFAULT_MAX_DEPTH, Interpreter};
use anyhow::{Result, anyhow};
use argh::FromArgs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(FromArgs, Debug)]
/// Play back a keyboard macro script.
pub struct Args {
    #[argh(positional)]
    /// script file to run.
    pub script: PathBuf,

    #[argh(option, default = "5.0")]
    /// seconds to wait before the first line runs, to focus the target window.
    pub wait_time: f64,

    #[argh(option, default = "0.1")]
    /// seconds the device pauses after every action.
    pub defaultdelay: f64,

    #[argh(option, default = "0.0")]
    /// seconds between characters typed by print.
    pub type_interval: f64,

    #[argh(switch)]
    /// check the script without sending any input or running any command.
    pub dry_run: bool,

    #[argh(switch)]
    /// allow shell commands (sh, ash and their aliases).
    pub sh: bool,

    #[argh(option, default = "DEFAULT_MAX_DEPTH")]
    /// maximum nesting of function calls.
    pub max_depth: usize,

    #[argh(switch, short = 'v')]
    /// log every executed line.
    pub verbose: bool,
}

/// Everything a run needs, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub script: PathBuf,
    pub wait_time: Duration,
    pub action_delay: Duration,
    pub type_interval: Duration,
    pub capabilities: Capabilities,
    pub max_depth: usize,
    pub verbose: bool,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            wait_time: seconds("--wait-time", args.wait_time)?,
            action_delay: seconds("--defaultdelay", args.defaultdelay)?,
            type_interval: seconds("--type-interval", args.type_interval)?,
            capabilities: Capabilities::new(!args.dry_run, args.sh),
            max_depth: args.max_depth,
            verbose: args.verbose,
            script: args.script,
        })
    }
}

impl Settings {
    /// Default `env_logger` filter, overridden by `RUST_LOG`.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Interpreter wired to the logging device, the system shell and the
    /// console prompt.
    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(
            self.capabilities,
            Box::new(LoggingDevice::new(self.action_delay)),
            Box::new(SystemShell::default()),
            Box::new(ConsolePrompt),
        )
        .with_type_interval(self.type_interval)
        .with_max_depth(self.max_depth)
    }
}

fn seconds(option: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow!("{option}: expected a non-negative number of seconds, got {value}"))
}
