/// Ordered queue of pending kernel dispatches
///
/// Commands are recorded with `submit` and executed in FIFO order by `flush`.
/// A flush stops at the first failing command: the commands that completed
/// are removed, the failing command and everything after it stay queued.

use std::collections::VecDeque;
use glam::UVec3;
use crate::compute::Kernel;
use crate::error::Result;

/// One recorded dispatch: a kernel and its 3D work-group count
#[derive(Debug, Clone)]
pub struct Command {
    kernel: Kernel,
    work_groups: UVec3,
}

impl Command {
    pub fn new(kernel: Kernel, work_groups: impl Into<UVec3>) -> Self {
        Self {
            kernel,
            work_groups: work_groups.into(),
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn work_groups(&self) -> UVec3 {
        self.work_groups
    }

    /// Number of work groups (product of the three dimensions, saturating)
    pub fn total_groups(&self) -> u64 {
        let groups = self.work_groups.as_u64vec3();
        groups.x.saturating_mul(groups.y).saturating_mul(groups.z)
    }

    /// Number of kernel invocations the command performs (saturating)
    pub fn total_invocations(&self) -> u64 {
        self.total_groups().saturating_mul(self.kernel.invocations_per_group())
    }
}

/// FIFO of commands awaiting execution
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn submit(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Run `execute` on every pending command in submission order
    ///
    /// Each command is removed once `execute` returns `Ok`. The first error is
    /// returned immediately; the failing command stays at the front of the
    /// queue, so a later flush retries it.
    ///
    /// Returns the number of commands executed.
    pub fn flush<F>(&mut self, mut execute: F) -> Result<usize>
    where
        F: FnMut(&Command) -> Result<()>,
    {
        let mut executed = 0;
        while let Some(command) = self.commands.front() {
            execute(command)?;
            self.commands.pop_front();
            executed += 1;
        }
        Ok(executed)
    }

    /// Drop every pending command without running it
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Pending commands, front first
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
#[path = "command_queue_tests.rs"]
mod tests;
