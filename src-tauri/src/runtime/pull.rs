//! Model download: `<bin> pull <model>` with progress reporting.
//!
//! Best-effort: progress is scraped from whatever percentages the runtime
//! prints (it redraws a single line with `\r`), and reported through a
//! caller-supplied callback. Analysis never depends on this.

use crate::error::{RuntimeError, RuntimeResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,3})%").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDownloadProgress {
    pub model: String,
    pub progress: u32,
    pub status: DownloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Splits raw output into `\r`/`\n`-terminated segments and pulls the last
/// percentage out of each complete one.
#[derive(Default)]
pub struct ProgressParser {
    pending: String,
}

impl ProgressParser {
    pub fn feed(&mut self, chunk: &str) -> Vec<u32> {
        self.pending.push_str(chunk);
        let mut found = Vec::new();
        while let Some(pos) = self.pending.find(['\r', '\n']) {
            let segment: String = self.pending.drain(..=pos).collect();
            if let Some(pct) = last_percent(&segment) {
                found.push(pct);
            }
        }
        found
    }
}

fn last_percent(segment: &str) -> Option<u32> {
    PERCENT
        .captures_iter(segment)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .filter(|p| *p <= 100)
        .last()
}

/// Download `model` with the runtime binary, reporting progress.
///
/// The callback sees monotonically non-decreasing `downloading` updates and
/// exactly one terminal `complete` or `error` update.
pub async fn pull_model<F>(binary: &str, model: &str, mut on_progress: F) -> RuntimeResult<()>
where
    F: FnMut(ModelDownloadProgress) + Send,
{
    let program = which::which(binary).map_err(|_| RuntimeError::NotInstalled {
        binary: binary.to_string(),
    })?;
    let command_line = format!("{} pull {}", binary, model);
    log::info!("[PULL] {}", command_line);

    let mut child = tokio::process::Command::new(program)
        .args(["pull", model])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RuntimeError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_chunks(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_chunks(stderr, tx));
    } else {
        drop(tx);
    }

    let mut parser = ProgressParser::default();
    let mut last_reported = 0u32;
    let mut tail = String::new();

    while let Some(chunk) = rx.recv().await {
        for pct in parser.feed(&chunk) {
            if pct > last_reported {
                last_reported = pct;
                on_progress(ModelDownloadProgress {
                    model: model.to_string(),
                    progress: pct,
                    status: DownloadStatus::Downloading,
                    error: None,
                });
            }
        }
        tail.push_str(&chunk);
        if tail.len() > 400 {
            let cut = tail.len() - 200;
            let cut = (cut..tail.len()).find(|i| tail.is_char_boundary(*i)).unwrap_or(0);
            tail.drain(..cut);
        }
    }

    let status = child.wait().await?;
    if status.success() {
        log::info!("[PULL] {} complete", model);
        on_progress(ModelDownloadProgress {
            model: model.to_string(),
            progress: 100,
            status: DownloadStatus::Complete,
            error: None,
        });
        Ok(())
    } else {
        let message = format!("Model pull failed with code {:?}", status.code());
        log::error!("[PULL] {}: {}", message, tail.trim());
        on_progress(ModelDownloadProgress {
            model: model.to_string(),
            progress: last_reported,
            status: DownloadStatus::Error,
            error: Some(message),
        });
        Err(RuntimeError::NonZeroExit {
            command: command_line,
            code: status.code(),
            stderr: tail.trim().to_string(),
        })
    }
}

async fn forward_chunks<R>(mut reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(String::from_utf8_lossy(&buf[..n]).into_owned()).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_reads_carriage_return_redraws() {
        let mut parser = ProgressParser::default();
        assert!(parser.feed("pulling 195a8c01d91e...   4% ▕  ").is_empty());
        assert_eq!(parser.feed("▏ 260 MB/6.4 GB\rpulling 195a8c01d91e...  12% ▕"), vec![4]);
        assert_eq!(parser.feed("\rsuccess\n"), vec![12]);
    }

    #[test]
    fn parser_ignores_out_of_range_values() {
        let mut parser = ProgressParser::default();
        assert!(parser.feed("pulling manifest\n").is_empty());
        assert!(parser.feed("weird 250%\n").is_empty());
    }

    #[test]
    fn progress_serializes_for_the_frontend() {
        let p = ModelDownloadProgress {
            model: "llama3.2".to_string(),
            progress: 42,
            status: DownloadStatus::Downloading,
            error: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["status"], "downloading");
        assert_eq!(json["progress"], 42);
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn missing_binary_fails_fast() {
        let mut calls = 0;
        let err = pull_model("definitely-not-a-real-runtime-binary", "llama3.2", |_| calls += 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NotInstalled { .. }));
        assert_eq!(calls, 0);
    }
}
