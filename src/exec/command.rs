// src/exec/command.rs

//! Shell commands as executor tasks.

use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::task::{task, TaskFn};

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
}

/// Build a task that runs `cmd` through the platform shell.
///
/// The child is spawned with `kill_on_drop(true)`: when the executor aborts
/// the task (timeout or cancellation) the process is killed rather than left
/// running.
pub fn command_task(name: impl Into<String>, cmd: impl Into<String>) -> TaskFn<CommandOutput> {
    let name = name.into();
    let cmd = cmd.into();
    task(move || run_command(name, cmd))
}

/// Run a single command to completion.
///
/// - stdout is captured into [`CommandOutput::stdout`].
/// - stderr is consumed line by line and logged at debug.
/// - A non-zero exit status is an error.
pub async fn run_command(name: String, cmd: String) -> anyhow::Result<CommandOutput> {
    info!(task = %name, cmd = %cmd, "starting task process");

    let mut command = shell_command(&cmd);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", name))?;

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let task_name = name.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        });
    }

    let stdout = child.stdout.take();
    let read_stdout = async move {
        let mut buf = String::new();
        if let Some(mut stdout) = stdout {
            stdout.read_to_string(&mut buf).await?;
        }
        Ok::<_, std::io::Error>(buf)
    };

    let (status, stdout) = tokio::try_join!(child.wait(), read_stdout)
        .with_context(|| format!("waiting for process of task '{}'", name))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %name,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    if !status.success() {
        bail!("command exited with status {code}");
    }

    Ok(CommandOutput {
        exit_code: code,
        stdout,
    })
}

// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
