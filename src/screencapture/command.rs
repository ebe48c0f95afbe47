// ABOUTME: Bounded-wait runner for the fixed-argument external commands the app invokes
// ABOUTME: Spawns a child process, drains stdout on a reader thread, and polls until exit or timeout

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("{program} produced output that is not valid UTF-8")]
    Encoding { program: String },
}

/// Resolves bare program names through `PATH`; absolute paths are used as-is.
pub fn resolve_program(program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    which::which(program).unwrap_or_else(|_| path.to_path_buf())
}

/// Runs `program` with `args`, waiting at most `timeout`. The child is killed
/// when the bound is exceeded. Stderr is discarded.
///
/// Stdout is read while the child runs so output larger than the pipe buffer
/// cannot stall it.
pub fn run(program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError> {
    tracing::debug!("Running {} {:?}", program, args);

    let mut child = Command::new(resolve_program(program))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let reader = child.stdout.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut stdout = Vec::new();
            pipe.read_to_end(&mut stdout).map(|_| stdout)
        })
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                return Err(CommandError::Spawn {
                    program: program.to_string(),
                    source,
                });
            }
        }
    };

    if !status.success() {
        return Err(CommandError::Exit {
            program: program.to_string(),
            status,
        });
    }

    // The child has exited and closed its end of the pipe, so the reader is done or about to be.
    let stdout = match reader.map(|handle| handle.join()) {
        Some(Ok(Ok(stdout))) => stdout,
        Some(Ok(Err(source))) => {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source,
            });
        }
        Some(Err(_)) => {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::other("stdout reader panicked"),
            });
        }
        None => Vec::new(),
    };

    String::from_utf8(stdout).map_err(|_| CommandError::Encoding {
        program: program.to_string(),
    })
}
