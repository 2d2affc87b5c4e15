use crate::adapters::{Device, Prompt, Shell};
use crate::capability::Capabilities;
use crate::command::{Command, CommandKind};
use crate::error::{Result, ScriptError};
use crate::lexer::{is_skippable, split_command};
use crate::script::{FunctionTable, RawLine};
use std::time::Duration;

/// Default limit for nested `call`s.
pub const DEFAULT_MAX_DEPTH: usize = 64;

const ACK_MESSAGE: &str = "Script paused, waiting for confirmation.";
const ACK_SETTLE: Duration = Duration::from_millis(500);

/// Result of executing a line: keep going, or stop the whole run.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Halt,
}

impl Signal {
    pub fn is_halt(self) -> bool {
        self == Signal::Halt
    }
}

/// Executes script lines against a device, a shell and a prompt.
///
/// The interpreter reads the function table but never changes it; the
/// [`Loader`](crate::Loader) owns it and hands it in with every line.
///
/// Example
/// ```
/// use keyplay::adapters::{Action, ConsolePrompt, RecordingDevice};
/// use keyplay::{Capabilities, FunctionTable, Interpreter, RawLine, Signal, SystemShell};
///
/// let (device, actions) = RecordingDevice::with_handle();
/// let mut interp = Interpreter::new(
///     Capabilities::default(),
///     Box::new(device),
///     Box::new(SystemShell::default()),
///     Box::new(ConsolePrompt),
/// );
/// let signal = interp.execute(&RawLine::new(1, "key ctrl+c"), &FunctionTable::new());
/// assert_eq!(signal, Signal::Continue);
/// assert_eq!(*actions.borrow(), vec![Action::Combo(vec!["ctrl".into(), "c".into()])]);
/// ```
pub struct Interpreter {
    capabilities: Capabilities,
    device: Box<dyn Device>,
    shell: Box<dyn Shell>,
    prompt: Box<dyn Prompt>,
    type_interval: Duration,
    max_depth: usize,
    ack_settle: Duration,
    last_error: Option<ScriptError>,
}

impl Interpreter {
    pub fn new(
        capabilities: Capabilities,
        device: Box<dyn Device>,
        shell: Box<dyn Shell>,
        prompt: Box<dyn Prompt>,
    ) -> Self {
        Self {
            capabilities,
            device,
            shell,
            prompt,
            type_interval: Duration::ZERO,
            max_depth: DEFAULT_MAX_DEPTH,
            ack_settle: ACK_SETTLE,
            last_error: None,
        }
    }

    /// Delay between characters typed by `print`.
    pub fn with_type_interval(mut self, interval: Duration) -> Self {
        self.type_interval = interval;
        self
    }

    /// Maximum nesting of `call`; deeper calls fail and halt the run.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Pause after the user acknowledged a `wait`.
    pub fn with_ack_settle(mut self, settle: Duration) -> Self {
        self.ack_settle = settle;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The most recent failure reported by [`execute`](Self::execute).
    ///
    /// Its line is where the failure happened, which for a function body or a
    /// `times` sub-command differs from the top-level line that halted.
    pub fn last_error(&self) -> Option<&ScriptError> {
        self.last_error.as_ref()
    }

    /// Execute one line and report whether the run must stop.
    ///
    /// Failures are logged here, with the line number, and turned into
    /// [`Signal::Halt`]. Calling an undefined function is logged but does not
    /// halt.
    pub fn execute(&mut self, line: &RawLine, functions: &FunctionTable) -> Signal {
        self.execute_at(&line.text, line.number, functions, 0)
    }

    fn execute_at(
        &mut self,
        text: &str,
        number: usize,
        functions: &FunctionTable,
        depth: usize,
    ) -> Signal {
        if is_skippable(text) {
            return Signal::Continue;
        }
        log::debug!("line {}: {}", number, text.trim());
        match self.dispatch(text, number, functions, depth) {
            Ok(signal) => signal,
            Err(err) => {
                log::error!("{err}");
                let signal = if err.halts() {
                    Signal::Halt
                } else {
                    Signal::Continue
                };
                self.last_error = Some(err);
                signal
            }
        }
    }

    fn dispatch(
        &mut self,
        text: &str,
        number: usize,
        functions: &FunctionTable,
        depth: usize,
    ) -> Result<Signal> {
        let (keyword, arg) = split_command(text);
        let Some(kind) = CommandKind::lookup(keyword) else {
            log::debug!("line {number}: ignoring unknown command '{keyword}'");
            return Ok(Signal::Continue);
        };
        let command = kind.parse(arg, number)?;
        self.run(command, number, functions, depth)
    }

    fn run(
        &mut self,
        command: Command,
        line: usize,
        functions: &FunctionTable,
        depth: usize,
    ) -> Result<Signal> {
        let calls = self.capabilities.calls;
        match command {
            Command::Title(text) => log::info!("==== {text} ===="),
            Command::Sleep(duration) => std::thread::sleep(duration),
            Command::Print(text) => {
                if calls {
                    self.device
                        .type_text(&text, self.type_interval)
                        .map_err(backend(line))?;
                } else {
                    log::debug!("line {line}: dry run, not typing {text:?}");
                }
            }
            Command::Combo(keys) => {
                if calls {
                    self.device.press_combo(&keys).map_err(backend(line))?;
                } else {
                    log::debug!("line {line}: dry run, not pressing {}", keys.join("+"));
                }
            }
            Command::KeyDown(key) => {
                if calls {
                    self.device.key_down(&key).map_err(backend(line))?;
                } else {
                    log::debug!("line {line}: dry run, not holding {key}");
                }
            }
            Command::KeyUp(key) => {
                if calls {
                    self.device.key_up(&key).map_err(backend(line))?;
                } else {
                    log::debug!("line {line}: dry run, not releasing {key}");
                }
            }
            Command::Repeat { count, line: repeated } => {
                for _ in 0..count.max(0) {
                    if self.execute_at(&repeated, line, functions, depth).is_halt() {
                        return Ok(Signal::Halt);
                    }
                }
            }
            Command::Call(name) => {
                let function = functions
                    .get(&name)
                    .ok_or_else(|| ScriptError::UndefinedFunction {
                        line,
                        name: name.clone(),
                    })?;
                if depth >= self.max_depth {
                    return Err(ScriptError::CallDepthExceeded {
                        line,
                        name,
                        limit: self.max_depth,
                    });
                }
                for body_line in &function.body {
                    if self
                        .execute_at(&body_line.text, body_line.number, functions, depth + 1)
                        .is_halt()
                    {
                        return Ok(Signal::Halt);
                    }
                }
            }
            Command::Wait => {
                self.prompt.acknowledge(ACK_MESSAGE).map_err(backend(line))?;
                std::thread::sleep(self.ack_settle);
            }
            Command::Shell(cmd) => {
                self.require_shell(line, "shell")?;
                if calls {
                    let code = self.shell.run_sync(&cmd).map_err(backend(line))?;
                    if code == 0 {
                        log::debug!("line {line}: '{cmd}' exited with status 0");
                    } else {
                        log::warn!("line {line}: '{cmd}' exited with status {code}");
                    }
                } else {
                    log::debug!("line {line}: dry run, not running '{cmd}'");
                }
            }
            Command::AsyncShell(cmd) => {
                self.require_shell(line, "ashell")?;
                if calls {
                    self.shell.run_detached(&cmd).map_err(backend(line))?;
                } else {
                    log::debug!("line {line}: dry run, not starting '{cmd}'");
                }
            }
        }
        Ok(Signal::Continue)
    }

    fn require_shell(&self, line: usize, command: &str) -> Result<()> {
        if self.capabilities.shell {
            Ok(())
        } else {
            Err(ScriptError::CapabilityDenied {
                line,
                command: command.to_string(),
            })
        }
    }
}

fn backend(line: usize) -> impl FnOnce(anyhow::Error) -> ScriptError {
    move |source| ScriptError::Backend { line, source }
}
