//! External-resolver channel (spec.md §4.5).
//!
//! At most one child process, started lazily on first use and never
//! restarted. A single mutex spans write+flush+readline so that concurrent
//! callers never interleave on the line protocol (spec.md §5).

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;

use crate::errors::FatalResolutionError;

struct Channel {
    #[allow(dead_code)] // kept alive for the duration of the process; never read after spawn.
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A long-lived external resolver subprocess, addressed over newline-delimited JSON.
pub struct ExternalResolver {
    binary: Utf8PathBuf,
    channel: OnceCell<Mutex<Channel>>,
}

impl ExternalResolver {
    pub fn new(binary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            channel: OnceCell::new(),
        }
    }

    fn spawn(&self) -> Result<Mutex<Channel>, FatalResolutionError> {
        tracing::info!(binary = %self.binary, "spawning external module resolver");

        let mut child = Command::new(self.binary.as_std_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| FatalResolutionError::ModuleResolverFatal(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FatalResolutionError::ModuleResolverFatal("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FatalResolutionError::ModuleResolverFatal("no stdout pipe".to_string()))?;

        set_close_on_exec(&stdin);
        set_close_on_exec(&stdout);

        Ok(Mutex::new(Channel {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        }))
    }

    /// Ask the external resolver for an opinion on `reference`, imported by `importer`.
    ///
    /// Returns `Ok(None)` for "no opinion" / explicit non-resolution / an
    /// ignored path (all of which fall through to the built-in resolver per
    /// spec.md §4.5's Failure policy). Any I/O error or malformed response
    /// is fatal to the whole pass.
    pub fn resolve(
        &self,
        reference: &str,
        importer: &str,
    ) -> Result<Option<Utf8PathBuf>, FatalResolutionError> {
        let channel = self
            .channel
            .get_or_try_init(|| self.spawn())?
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.round_trip(channel, reference, importer)
    }

    fn round_trip(
        &self,
        mut channel: std::sync::MutexGuard<'_, Channel>,
        reference: &str,
        importer: &str,
    ) -> Result<Option<Utf8PathBuf>, FatalResolutionError> {
        let request = serde_json::to_string(&[reference, importer])
            .map_err(|_| FatalResolutionError::InvalidResolution)?;
        writeln!(channel.stdin, "{request}")
            .map_err(|e| FatalResolutionError::ModuleResolverFatal(e.to_string()))?;
        channel
            .stdin
            .flush()
            .map_err(|e| FatalResolutionError::ModuleResolverFatal(e.to_string()))?;

        let mut line = String::new();
        let bytes_read = channel
            .stdout
            .read_line(&mut line)
            .map_err(|e| FatalResolutionError::ModuleResolverFatal(e.to_string()))?;
        if bytes_read == 0 {
            return Err(FatalResolutionError::ModuleResolverFatal(
                "resolver closed the channel".to_string(),
            ));
        }

        parse_response(line.trim_end())
    }
}

fn parse_response(line: &str) -> Result<Option<Utf8PathBuf>, FatalResolutionError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|_| FatalResolutionError::InvalidResolution)?;

    if value.is_null() {
        return Ok(None);
    }

    let array = value.as_array().ok_or(FatalResolutionError::InvalidResolution)?;
    let [error, resolution] = <[serde_json::Value; 2]>::try_from(array.clone())
        .map_err(|_| FatalResolutionError::InvalidResolution)?;

    if !error.is_null() {
        return Ok(None);
    }

    match resolution {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(path) => Ok(Some(Utf8PathBuf::from(path))),
        _ => Err(FatalResolutionError::InvalidResolution),
    }
}

#[cfg(unix)]
fn set_close_on_exec<T: std::os::fd::AsRawFd>(handle: &T) {
    use std::os::fd::AsRawFd;
    let fd = handle.as_raw_fd();
    // SAFETY: `fd` is a valid, open file descriptor owned by `handle` for the
    // duration of this call; `fcntl` only reads/writes the FD_CLOEXEC flag.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags >= 0 {
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
}

#[cfg(not(unix))]
fn set_close_on_exec<T>(_handle: &T) {}
