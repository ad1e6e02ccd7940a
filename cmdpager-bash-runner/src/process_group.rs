//! Process-group helpers for reliable child process cleanup.
//!
//! Commands are spawned as leaders of their own process group so a timeout
//! can take down the shell together with everything it forked:
//! - `kill_process_group` signals a known process group ID directly.
//! - `kill_child_process_group` resolves the group of a tokio child and
//!   signals the whole group instead of a single PID.
//!
//! On non-Unix platforms these helpers fall back to killing the child itself.

use std::io;

use tokio::process::Child;

/// Signal to send when killing process groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KillSignal {
    /// SIGTERM - allows graceful shutdown
    Term,
    /// SIGKILL - immediate termination
    #[default]
    Kill,
}

#[cfg(unix)]
impl KillSignal {
    fn as_libc_signal(self) -> libc::c_int {
        match self {
            KillSignal::Term => libc::SIGTERM,
            KillSignal::Kill => libc::SIGKILL,
        }
    }
}

/// Signal a specific process group ID (best-effort).
///
/// A group that no longer exists is not an error.
#[cfg(unix)]
pub fn kill_process_group(process_group_id: u32, signal: KillSignal) -> io::Result<()> {
    let Ok(pgid) = libc::pid_t::try_from(process_group_id) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("process group id {process_group_id} out of range"),
        ));
    };

    // SAFETY: killpg only reads its integer arguments.
    let result = unsafe { libc::killpg(pgid, signal.as_libc_signal()) };
    if result == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }

    Ok(())
}

/// No-op on non-Unix platforms.
#[cfg(not(unix))]
pub fn kill_process_group(_process_group_id: u32, _signal: KillSignal) -> io::Result<()> {
    Ok(())
}

/// Kill the process group led by a tokio child, then the child itself.
///
/// The child must have been spawned with `process_group(0)` so that its PID
/// doubles as the group ID.
pub fn kill_child_process_group(child: &mut Child, signal: KillSignal) -> io::Result<()> {
    if let Some(pid) = child.id() {
        kill_process_group(pid, signal)?;
    }

    match child.start_kill() {
        Ok(()) => Ok(()),
        // Already reaped.
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(err) => Err(err),
    }
}

/// Exit code reported for a process terminated by `signal`, following the
/// shell convention of `128 + signal`.
#[cfg(unix)]
pub fn signal_exit_code(signal: i32) -> i32 {
    128_i32.saturating_add(signal)
}
