//! Subprocess runner with line-oriented output streaming.
//!
//! Used for launching games, opening platform URIs and driving helper CLIs.
//! Stdout and stderr are merged into a single line stream.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Errors from running a subprocess.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Program, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command from `dir`. An empty path means "inherit".
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.work_dir = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs `cmd` to completion, calling `on_line` for every output line.
///
/// Returns the child's exit code, or `-1` if it was terminated by a signal.
pub async fn run<F>(cmd: &CommandSpec, mut on_line: F) -> Result<i32, ProcessError>
where
    F: FnMut(&str) + Send,
{
    let mut command = tokio::process::Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = &cmd.work_dir {
        command.current_dir(dir);
    }

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: cmd.program.display().to_string(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            line = next_line(&mut stdout, &mut out_buf), if out_open => match line? {
                Some(line) => on_line(&line),
                None => out_open = false,
            },
            line = next_line(&mut stderr, &mut err_buf), if err_open => match line? {
                Some(line) => on_line(&line),
                None => err_open = false,
            },
        }
    }

    let status = child.wait().await?;
    Ok(status.code().unwrap_or(-1))
}

/// Runs `cmd` on a background task and reports the outcome to `on_exit`.
pub fn run_detached<E, L>(cmd: CommandSpec, on_exit: E, on_line: L) -> JoinHandle<()>
where
    E: FnOnce(Result<i32, ProcessError>) + Send + 'static,
    L: FnMut(&str) + Send + 'static,
{
    tokio::spawn(async move {
        let result = run(&cmd, on_line).await;
        on_exit(result);
    })
}

/// Reads one line. Partial bytes survive cancellation inside `select!`
/// because `buf` is only cleared once a line is handed out.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let n = reader.read_until(b'\n', buf).await?;
    if n == 0 && buf.is_empty() {
        return Ok(None);
    }
    Ok(Some(take_line(buf)))
}

fn take_line(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    let line = String::from_utf8_lossy(buf).into_owned();
    buf.clear();
    line
}
