//! Running the external plugin-management tool.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::plugin::command::{ActionRequest, ToolContext};
use crate::plugin::error::{PluginError, Result};

const READER_GRACE: Duration = Duration::from_secs(5);

/// Exit status and captured streams of one tool run, uninterpreted.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can execute an [`ActionRequest`].
pub trait PluginTool {
    fn context(&self) -> &ToolContext;

    fn run(&self, request: &ActionRequest) -> Result<ToolOutput>;
}

/// Runs plugman as a child process with an argument vector, never a shell line.
#[derive(Debug, Clone)]
pub struct Plugman {
    program: PathBuf,
    runner: Option<String>,
    timeout: Duration,
    context: ToolContext,
}

impl Plugman {
    pub fn new(program: impl Into<PathBuf>, context: ToolContext, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            runner: None,
            timeout,
            context,
        }
    }

    /// Launch the tool through an interpreter, e.g. `node main.js ...`.
    pub fn with_runner(mut self, runner: Option<&str>) -> Self {
        self.runner = runner.map(str::to_string);
        self
    }

    fn command(&self, args: Vec<OsString>) -> Command {
        let mut cmd = match &self.runner {
            Some(runner) => {
                let mut cmd = Command::new(runner);
                cmd.arg(&self.program);
                cmd
            }
            None => Command::new(&self.program),
        };
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl PluginTool for Plugman {
    fn context(&self) -> &ToolContext {
        &self.context
    }

    fn run(&self, request: &ActionRequest) -> Result<ToolOutput> {
        let args = request.args(&self.context);
        tracing::info!(
            "running {} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = self
            .command(args)
            .spawn()
            .map_err(|source| PluginError::ToolSpawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_handle = thread::spawn(move || read_stream(stdout));
        let stderr_handle = thread::spawn(move || read_stream(stderr));

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!("{} timed out after {:?}, killed", request.action(), self.timeout);
                break None;
            }
            thread::sleep(Duration::from_millis(20));
        };

        let stdout = join_reader(stdout_handle);
        let stderr = join_reader(stderr_handle);

        match status {
            Some(status) => Ok(ToolOutput {
                status,
                stdout,
                stderr,
            }),
            None => Err(PluginError::ToolTimeout {
                action: request.action(),
                timeout: self.timeout,
                stdout,
                stderr,
            }),
        }
    }
}

/// Collect a reader thread's bytes, giving up if a grandchild keeps the pipe open.
fn join_reader(handle: thread::JoinHandle<Vec<u8>>) -> String {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(handle.join());
    });

    match rx.recv_timeout(READER_GRACE) {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => String::new(),
    }
}

fn read_stream<T: Read>(stream: Option<T>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = stream {
        let _ = reader.read_to_end(&mut buf);
    }
    buf
}
