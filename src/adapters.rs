//! Backends the interpreter drives: the input device, the shell and the
//! acknowledgment prompt.
//!
//! The interpreter only talks to these traits, so a real keyboard backend can
//! be plugged in without touching the script machinery. [`LoggingDevice`] is
//! the backend used by the binary; [`RecordingDevice`] keeps every action in
//! memory for inspection.

use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Simulated keyboard input.
pub trait Device {
    /// Press all `keys` in order, then release them in reverse order.
    fn press_combo(&mut self, keys: &[String]) -> Result<()>;

    /// Press and hold `key`.
    fn key_down(&mut self, key: &str) -> Result<()>;

    /// Release a held `key`.
    fn key_up(&mut self, key: &str) -> Result<()>;

    /// Type `text` character by character, pausing `interval` between characters.
    fn type_text(&mut self, text: &str, interval: Duration) -> Result<()>;
}

/// Shell command execution.
pub trait Shell {
    /// Run `command` and block until it exits.
    fn run_sync(&mut self, command: &str) -> Result<ExitCode>;

    /// Start `command` and return immediately.
    ///
    /// The process is never waited on or killed. It may outlive the script,
    /// and on Unix a child that exits first stays a zombie until keyplay exits.
    fn run_detached(&mut self, command: &str) -> Result<()>;
}

/// Blocking user confirmation.
pub trait Prompt {
    /// Show `message` and return once the user acknowledged it.
    ///
    /// An `Err` is a backend failure and halts the run, so an implementation
    /// decides whether declining counts as acknowledgment.
    fn acknowledge(&mut self, message: &str) -> Result<()>;
}

/// Device that reports every action through the logger instead of sending
/// real input, pausing `delay` after each one like a real backend would.
pub struct LoggingDevice {
    delay: Duration,
}

impl LoggingDevice {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Device for LoggingDevice {
    fn press_combo(&mut self, keys: &[String]) -> Result<()> {
        log::info!("press {}", keys.join("+"));
        self.pause();
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        log::info!("hold {key}");
        self.pause();
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        log::info!("release {key}");
        self.pause();
        Ok(())
    }

    fn type_text(&mut self, text: &str, interval: Duration) -> Result<()> {
        log::info!("type {text:?}");
        if !interval.is_zero() {
            for _ in text.chars().skip(1) {
                std::thread::sleep(interval);
            }
        }
        self.pause();
        Ok(())
    }
}

/// One action received by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Combo(Vec<String>),
    KeyDown(String),
    KeyUp(String),
    Type(String),
}

/// Memory-backed device that keeps every action in order.
pub struct RecordingDevice {
    actions: Rc<RefCell<Vec<Action>>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            actions: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Convenience: create device and return (device, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<Action>>>) {
        let device = RecordingDevice::new();
        let rc = device.actions.clone();
        (device, rc)
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for RecordingDevice {
    fn press_combo(&mut self, keys: &[String]) -> Result<()> {
        self.actions.borrow_mut().push(Action::Combo(keys.to_vec()));
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        self.actions.borrow_mut().push(Action::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        self.actions.borrow_mut().push(Action::KeyUp(key.to_string()));
        Ok(())
    }

    fn type_text(&mut self, text: &str, _interval: Duration) -> Result<()> {
        self.actions.borrow_mut().push(Action::Type(text.to_string()));
        Ok(())
    }
}

/// Asks for confirmation on the terminal and waits for Enter.
///
/// End of input and Ctrl-C are errors, so either one stops the script.
#[derive(Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn acknowledge(&mut self, message: &str) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        match rl.readline(&format!("{message} [press Enter] ")) {
            Ok(_) => Ok(()),
            Err(ReadlineError::Interrupted) => Err(anyhow!("confirmation interrupted")),
            Err(ReadlineError::Eof) => Err(anyhow!("confirmation aborted: end of input")),
            Err(err) => Err(err.into()),
        }
    }
}
