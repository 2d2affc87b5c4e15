/// Permissions fixed at startup that decide which side effects a run may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Device actions and shell commands are really performed. Off for a dry run.
    pub calls: bool,
    /// Shell commands are allowed at all.
    pub shell: bool,
}

impl Capabilities {
    pub fn new(calls: bool, shell: bool) -> Self {
        Self { calls, shell }
    }

    /// Validate the script without touching the device or spawning processes.
    pub fn dry_run() -> Self {
        Self {
            calls: false,
            shell: false,
        }
    }
}

impl Default for Capabilities {
    /// Device actions on, shell commands off.
    fn default() -> Self {
        Self {
            calls: true,
            shell: false,
        }
    }
}
