//! Interpreter bridge
//!
//! Drives the wrapped interpreter as a child process speaking the JSON-lines
//! protocol in `protocol`. The process is spawned lazily on the first turn,
//! respawned after it dies, and killed when the interpreter is dropped.

use super::protocol::{BridgeEvent, BridgeRequest};
use super::{ChunkStream, Interpreter, InterpreterError, InterpreterFactory};
use crate::config::BridgeConfig;
use crate::state::Settings;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// Grace period when collecting the exit status of a dead bridge
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Handle to a running bridge subprocess
struct BridgeProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
}

impl BridgeProcess {
    fn spawn(program: &str, args: &[String], session_id: &str) -> Result<Self, InterpreterError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InterpreterError::SpawnFailed {
                command: program.to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| InterpreterError::Protocol("Failed to get stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InterpreterError::Protocol("Failed to get stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| InterpreterError::Protocol("Failed to get stderr handle".to_string()))?;

        info!(
            session_id = %session_id,
            pid = child.id(),
            command = %program,
            "Interpreter bridge spawned"
        );

        // Drain stderr continuously so the bridge never blocks on a full pipe
        let session_for_stderr = session_id.to_string();
        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(session_id = %session_for_stderr, stderr = %line, "Bridge stderr");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr: Some(stderr_handle),
        })
    }

    async fn send(&mut self, request: &BridgeRequest<'_>) -> Result<(), InterpreterError> {
        let mut line = serde_json::to_vec(request)
            .map_err(|e| InterpreterError::Protocol(format!("Failed to encode request: {}", e)))?;
        line.push(b'\n');
        self.stdin.write_all(&line).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_event(&mut self, limit: Duration) -> Result<BridgeEvent, InterpreterError> {
        loop {
            let line = tokio::time::timeout(limit, self.stdout.next_line())
                .await
                .map_err(|_| InterpreterError::Timeout(limit.as_secs()))??;

            match line {
                None => return Err(InterpreterError::Exited(self.exit_reason().await)),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    return serde_json::from_str(&line).map_err(|e| {
                        InterpreterError::Protocol(format!("{} in line {:?}", e, preview(&line)))
                    })
                }
            }
        }
    }

    async fn exit_reason(&mut self) -> String {
        let status = match tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => status.to_string(),
            Ok(Err(e)) => format!("failed to wait for bridge: {}", e),
            Err(_) => "closed its output without exiting".to_string(),
        };

        let stderr = match self.stderr.take() {
            Some(handle) => tokio::time::timeout(EXIT_GRACE, handle)
                .await
                .ok()
                .and_then(|joined| joined.ok())
                .unwrap_or_default(),
            None => String::new(),
        };

        if stderr.trim().is_empty() {
            status
        } else {
            format!("{}; stderr: {}", status, stderr.trim())
        }
    }
}

fn preview(line: &str) -> String {
    const MAX: usize = 200;
    if line.chars().count() > MAX {
        format!("{}...", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}

/// Interpreter backed by a bridge subprocess
pub struct BridgeInterpreter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    session_id: String,
    process: Option<BridgeProcess>,
    /// A request was sent and its `done`/`error` has not been read yet
    in_flight: bool,
}

impl BridgeInterpreter {
    /// Create an interpreter; nothing is spawned until the first turn
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            session_id: session_id.into(),
            process: None,
            in_flight: false,
        }
    }

    /// Whether a bridge process is currently attached
    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn discard(&mut self) {
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.child.start_kill() {
                debug!(session_id = %self.session_id, error = %e, "Bridge already gone");
            }
            info!(session_id = %self.session_id, "Interpreter bridge discarded");
        }
        self.in_flight = false;
    }

    async fn start(&mut self, request: &BridgeRequest<'_>) -> Result<(), InterpreterError> {
        if self.in_flight {
            // The previous turn was abandoned mid-stream; its leftover output
            // would be read as this turn's
            warn!(session_id = %self.session_id, "Restarting bridge after abandoned turn");
            self.discard();
        }

        let process = match self.process.take() {
            Some(process) => process,
            None => BridgeProcess::spawn(&self.program, &self.args, &self.session_id)?,
        };
        let process = self.process.insert(process);

        if let Err(e) = process.send(request).await {
            error!(session_id = %self.session_id, error = %e, "Failed to send request to bridge");
            self.discard();
            return Err(e);
        }
        self.in_flight = true;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<BridgeEvent, InterpreterError> {
        let limit = self.timeout;
        let result = match self.process.as_mut() {
            Some(process) => process.next_event(limit).await,
            None => Err(InterpreterError::Exited("bridge is not running".to_string())),
        };

        match &result {
            Ok(BridgeEvent::Done) | Ok(BridgeEvent::Error { .. }) => self.in_flight = false,
            Ok(_) => {}
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Bridge turn failed");
                self.discard();
            }
        }
        result
    }

    fn run<'a>(&'a mut self, request: BridgeRequest<'a>) -> ChunkStream<'a> {
        Box::pin(stream! {
            match self.start(&request).await {
                Err(e) => {
                    yield Err(e);
                }
                Ok(()) => loop {
                    match self.next_event().await {
                        Ok(BridgeEvent::Done) => break,
                        Ok(BridgeEvent::Error { message }) => {
                            yield Err(InterpreterError::Upstream(message));
                            break;
                        }
                        Ok(BridgeEvent::Unknown) => {
                            debug!(session_id = %self.session_id, "Skipping unrecognized bridge event");
                        }
                        Ok(event) => {
                            if let Some(chunk) = event.into_chunk() {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            break;
                        }
                    }
                },
            }
        })
    }
}

#[async_trait]
impl Interpreter for BridgeInterpreter {
    fn chat<'a>(&'a mut self, message: &'a str, settings: &'a Settings) -> ChunkStream<'a> {
        debug!(
            session_id = %self.session_id,
            message_len = message.len(),
            model = %settings.model,
            "Sending chat turn to bridge"
        );
        self.run(BridgeRequest::Chat { message, settings })
    }

    fn execute<'a>(
        &'a mut self,
        language: &'a str,
        code: &'a str,
        settings: &'a Settings,
    ) -> ChunkStream<'a> {
        debug!(
            session_id = %self.session_id,
            language = %language,
            code_len = code.len(),
            "Sending execute request to bridge"
        );
        self.run(BridgeRequest::Execute {
            language,
            code,
            settings,
        })
    }

    async fn reset(&mut self) -> Result<(), InterpreterError> {
        if self.process.is_none() || self.in_flight {
            // A fresh process starts with an empty conversation
            self.discard();
            return Ok(());
        }

        self.start(&BridgeRequest::Reset).await?;
        loop {
            match self.next_event().await? {
                BridgeEvent::Done => return Ok(()),
                BridgeEvent::Error { message } => return Err(InterpreterError::Upstream(message)),
                _ => continue,
            }
        }
    }
}

/// Spawns one `BridgeInterpreter` per session
#[derive(Debug, Clone)]
pub struct BridgeFactory {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl BridgeFactory {
    /// Build a factory from bridge configuration
    pub fn new(config: &BridgeConfig) -> Self {
        let (program, args) = config.program_and_args();
        Self {
            program,
            args,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl InterpreterFactory for BridgeFactory {
    fn create(&self, session_id: &str) -> Box<dyn Interpreter> {
        Box::new(BridgeInterpreter::new(
            self.program.clone(),
            self.args.clone(),
            self.timeout,
            session_id,
        ))
    }
}
