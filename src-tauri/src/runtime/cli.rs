//! Command-line transport. Spawns the runtime binary per call.
//!
//! `<bin> list`                       → model listing
//! `<bin> run <model> [--format json]` → generation, payload on stdin
//!
//! Every child is spawned with `kill_on_drop(true)`. If the caller drops the
//! future (the probe's timer fired), the child dies with it; if our own
//! timeout fires, the child is killed explicitly before returning.

use super::listing::parse_model_listing;
use super::{GenerateRequest, ModelRuntime};
use crate::config::Transport;
use crate::error::{RuntimeError, RuntimeResult};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

pub struct CliRuntime {
    binary: String,
    model: String,
    timeout: Duration,
}

impl CliRuntime {
    pub fn new(binary: &str, model: &str, timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    /// Locate the binary on PATH (or accept an explicit path).
    pub fn resolve_binary(&self) -> RuntimeResult<PathBuf> {
        which::which(&self.binary).map_err(|_| RuntimeError::NotInstalled {
            binary: self.binary.clone(),
        })
    }

    /// Arguments for one generation.
    pub(crate) fn run_args(&self, request: &GenerateRequest) -> Vec<String> {
        let mut args = vec!["run".to_string(), self.model.clone(), "--nowordwrap".to_string()];
        if request.json {
            args.push("--format".to_string());
            args.push("json".to_string());
        }
        args
    }

    /// Spawn `<bin> args...`, feed `stdin_payload`, collect stdout to
    /// completion. Non-zero exit and timeout are errors.
    async fn run(
        &self,
        args: &[String],
        stdin_payload: Option<&str>,
        operation: &str,
    ) -> RuntimeResult<String> {
        let program = self.resolve_binary()?;
        let command_line = format!("{} {}", self.binary, args.join(" "));

        let mut child = Command::new(&program)
            .args(args)
            .stdin(if stdin_payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let outcome = tokio::time::timeout(self.timeout, drive(&mut child, stdin_payload)).await;

        let (status, stdout, stderr) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                log::warn!(
                    "[CLI] '{}' exceeded {}ms, killing",
                    command_line,
                    self.timeout.as_millis()
                );
                let _ = child.kill().await;
                return Err(RuntimeError::Timeout {
                    operation: operation.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(RuntimeError::NonZeroExit {
                command: command_line,
                code: status.code(),
                stderr: strip_ansi(stderr.trim()).chars().take(200).collect(),
            });
        }

        Ok(strip_ansi(&String::from_utf8_lossy(&stdout)))
    }
}

/// Write stdin, drain stdout/stderr, wait for exit, concurrently so a
/// chatty child can't deadlock on a full pipe.
async fn drive(
    child: &mut Child,
    stdin_payload: Option<&str>,
) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdin = child.stdin.take();
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "no stdout pipe"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "no stderr pipe"))?;

    let write = async move {
        if let (Some(mut pipe), Some(payload)) = (stdin, stdin_payload) {
            pipe.write_all(payload.as_bytes()).await?;
            pipe.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (written, read_out, read_err) = tokio::join!(
        write,
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err)
    );
    read_out?;
    read_err?;
    // A child that exits without reading all of stdin is judged by its exit code.
    if let Err(e) = written {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e);
        }
    }

    let status = child.wait().await?;
    Ok((status, out, err))
}

fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

#[async_trait]
impl ModelRuntime for CliRuntime {
    fn transport(&self) -> Transport {
        Transport::Cli
    }

    async fn list_models(&self) -> RuntimeResult<Vec<String>> {
        let stdout = self.run(&["list".to_string()], None, "list models").await?;
        parse_model_listing(&stdout)
    }

    async fn generate(&self, request: &GenerateRequest) -> RuntimeResult<String> {
        let start = std::time::Instant::now();
        let args = self.run_args(request);
        log::info!(
            "[CLI] {} {} ({} chars on stdin)",
            self.binary,
            args.join(" "),
            request.prompt.len()
        );
        let text = self.run(&args, Some(&request.prompt), "generate").await?;
        log::info!(
            "[CLI] Generation finished in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_add_json_format() {
        let rt = CliRuntime::new("ollama", "llama3.2", Duration::from_secs(1));
        let args = rt.run_args(&GenerateRequest::structured("x".to_string()));
        assert_eq!(&args[..2], &["run".to_string(), "llama3.2".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "--format" && w[1] == "json"));

        let args = rt.run_args(&GenerateRequest::free_text("x".to_string()));
        assert!(!args.iter().any(|a| a == "--format"));
    }

    #[test]
    fn strips_terminal_escapes() {
        assert_eq!(strip_ansi("\x1b[?25lhello\x1b[0m"), "hello");
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        let rt = CliRuntime::new(
            "definitely-not-a-real-runtime-binary",
            "llama3.2",
            Duration::from_secs(1),
        );
        let err = rt.list_models().await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotInstalled { .. }));
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdin_payload_reaches_the_child() {
        // `cat` echoes stdin back, standing in for a runtime.
        let rt = CliRuntime::new("cat", "unused", Duration::from_secs(5));
        let out = rt
            .run(&[], Some("rewrite me"), "generate")
            .await
            .unwrap();
        assert_eq!(out, "rewrite me");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let rt = CliRuntime::new("false", "unused", Duration::from_secs(5));
        let err = rt.run(&[], None, "list models").await.unwrap_err();
        assert!(matches!(err, RuntimeError::NonZeroExit { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_child_is_killed_on_timeout() {
        let rt = CliRuntime::new("sleep", "unused", Duration::from_millis(200));
        let start = std::time::Instant::now();
        let err = rt
            .run(&["30".to_string()], None, "list models")
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
