use crate::Result;
use eyre::{bail, eyre, WrapErr};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// What to do with a process when its owning scope ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Block until the process exits on its own.
    Wait,
    /// Send SIGKILL, close the output stream, then reap. A killed process
    /// may never flush or close its end of the pipe, so the harness closes
    /// its own end explicitly.
    KillAndDrain,
}

/// A spawned example binary with its combined stdout/stderr captured.
///
/// Both output streams are wired to a single pipe so readiness lines and
/// diagnostics interleave in emission order. The process is exclusively
/// owned; the attached [`Disposal`] policy runs exactly once when the
/// value is dropped, on every exit path including error propagation.
#[derive(Debug)]
pub struct ManagedProcess {
    name: String,
    child: Child,
    reader: Option<BufReader<File>>,
    port: Option<String>,
    disposal: Disposal,
    disposed: bool,
}

impl ManagedProcess {
    /// Spawns `program` with `args`, capturing stdout and stderr into one
    /// stream.
    ///
    /// The parent's copies of the pipe write end are closed before this
    /// returns, so the stream reaches EOF exactly when the child (and any
    /// descendants holding the fd) exits.
    pub fn spawn(program: impl AsRef<Path>, args: &[&str], disposal: Disposal) -> Result<Self> {
        let program = program.as_ref();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());

        let (read_end, write_end) = nix::unistd::pipe()?;
        let write_dup = write_end.try_clone()?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(write_end))
            .stderr(Stdio::from(write_dup));

        debug!(process = %name, ?args, "spawning");
        let child = command
            .spawn()
            .wrap_err_with(|| format!("failed to spawn `{}`", program.display()))?;
        info!(process = %name, pid = child.id(), "spawned");

        // `command` drops here, closing the parent-side write ends.
        Ok(Self {
            name,
            child,
            reader: Some(BufReader::new(File::from(read_end))),
            port: None,
            disposal,
            disposed: false,
        })
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Composes `:<port>/<resource>` from the process's announced port.
    ///
    /// The first call blocks reading the combined stream line by line until
    /// the readiness pattern appears; the port is cached and later calls
    /// reuse it without touching the stream. If the stream closes first the
    /// process failed to start and an error naming it is returned.
    pub fn address(&mut self, resource: &str) -> Result<String> {
        let port = self.resolved_port()?;
        Ok(format!(":{port}/{resource}"))
    }

    fn resolved_port(&mut self) -> Result<&str> {
        if self.port.is_none() {
            let port = self.scan_for_port()?;
            debug!(process = %self.name, %port, "readiness line observed");
            self.port = Some(port);
        }
        self.port
            .as_deref()
            .ok_or_else(|| eyre!("port cache empty after successful scan"))
    }

    fn scan_for_port(&mut self) -> Result<String> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| eyre!("output stream of `{}` already consumed", self.name))?;
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .wrap_err_with(|| format!("reading output of `{}`", self.name))?;
            if n == 0 {
                bail!(
                    "`{}` exited before announcing a listening port",
                    self.name
                );
            }
            debug!(process = %self.name, line = %line.trim_end(), "output");
            if let Some(port) = listening_port(&line) {
                return Ok(port.to_owned());
            }
        }
    }

    /// Reads the next line of combined output. EOF is an error; a server
    /// expected to print a secondary readiness line (`connected to ...`)
    /// has failed if it closes the stream instead.
    pub fn read_line(&mut self) -> Result<String> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| eyre!("output stream of `{}` already consumed", self.name))?;
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .wrap_err_with(|| format!("reading output of `{}`", self.name))?;
        if n == 0 {
            bail!("`{}` closed its output before the expected line", self.name);
        }
        debug!(process = %self.name, line = %line.trim_end(), "output");
        Ok(line)
    }

    /// Drains the rest of the combined output and blocks until the process
    /// exits, returning everything captured after any lines already
    /// consumed by [`ManagedProcess::address`] or
    /// [`ManagedProcess::read_line`].
    pub fn communicate(&mut self) -> Result<String> {
        let mut output = String::new();
        if let Some(mut reader) = self.reader.take() {
            reader
                .read_to_string(&mut output)
                .wrap_err_with(|| format!("draining output of `{}`", self.name))?;
        }
        let status = self.child.wait()?;
        debug!(process = %self.name, %status, "exited");
        Ok(output)
    }

    /// Blocks until the process exits and returns its status. Safe to call
    /// after [`ManagedProcess::communicate`]; std caches the status.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait()?)
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        match self.disposal {
            Disposal::Wait => {
                self.child.wait()?;
            }
            Disposal::KillAndDrain => {
                debug!(process = %self.name, pid = self.child.id(), "killing");
                match kill(Pid::from_raw(self.child.id() as i32), Signal::SIGKILL) {
                    // Already gone counts as killed.
                    Ok(()) | Err(Errno::ESRCH) => {}
                    Err(err) => return Err(err.into()),
                }
                self.reader = None;
                self.child.wait()?;
            }
        }
        debug!(process = %self.name, "disposed");
        Ok(())
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!(process = %self.name, %err, "disposal failed");
        }
    }
}

/// Runs a process to completion and returns its combined output, like a
/// foreground client invocation. Fails, with the captured output attached,
/// if the process exits unsuccessfully.
pub fn capture(program: impl AsRef<Path>, args: &[&str]) -> Result<String> {
    let mut process = ManagedProcess::spawn(program, args, Disposal::Wait)?;
    let output = process.communicate()?;
    let status = process.wait()?;
    if !status.success() {
        bail!("process exited with {status}; captured output:\n{output}");
    }
    Ok(output)
}

/// Extracts the port from a readiness line. The pattern is the trailing
/// form `... listening on <digits>` with the digits running to the end of
/// the line; anything after the port disqualifies the line.
fn listening_port(line: &str) -> Option<&str> {
    let (_, port) = line.trim_end().rsplit_once("listening on ")?;
    if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
        Some(port)
    } else {
        None
    }
}
