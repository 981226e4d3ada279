//! Client side of the daemon control socket.
//!
//! One method per user intent; each opens a fresh connection, sends one
//! JSON command and reads one JSON response. Transient failures are
//! retried with a growing delay, and every I/O step is bounded by a
//! timeout so a wedged daemon cannot hang the CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::commands::{BreakArgs, ConfigArgs, SnoozeArgs};
use crate::types::{ConfigParams, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Socket path relative to the home directory.
const DEFAULT_SOCKET_PATH: &str = ".kyukei/kyukei.sock";

/// How long to wait for the daemon to accept the connection.
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Bound on each read/write step.
const IO_TIMEOUT_SECS: u64 = 5;

/// Response buffer size; a status snapshot is far smaller.
const MAX_RESPONSE_SIZE: usize = 65536;

/// Attempts per request before giving up.
const MAX_RETRIES: u32 = 3;

/// Base retry delay, multiplied by the attempt number.
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// Connection-per-request client for the daemon control socket.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client pointed at the default socket path.
    pub fn new() -> Result<Self> {
        let socket_path = Self::default_socket_path()?;
        Ok(Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        })
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the default socket path.
    fn default_socket_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
        Ok(home.join(DEFAULT_SOCKET_PATH))
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Start).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause).await
    }

    /// Sends a reset command to the daemon.
    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Reset).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Confirms the break reminder.
    pub async fn commit_break(&self, args: &BreakArgs) -> Result<IpcResponse> {
        let request = IpcRequest::CommitBreak {
            task: args.task.clone(),
        };
        self.send_request_with_retry(&request).await
    }

    /// Confirms the end-of-break reminder.
    pub async fn commit_work(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::CommitWork).await
    }

    /// Sends a snooze command to the daemon.
    pub async fn snooze(&self, args: &SnoozeArgs) -> Result<IpcResponse> {
        let request = IpcRequest::Snooze {
            minutes: args.minutes,
        };
        self.send_request_with_retry(&request).await
    }

    /// Queries the current configuration.
    pub async fn get_config(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::GetConfig).await
    }

    /// Updates configuration fields.
    pub async fn set_config(&self, args: &ConfigArgs) -> Result<IpcResponse> {
        let request = IpcRequest::SetConfig {
            params: ConfigParams {
                work_minutes: args.work,
                break_minutes: args.break_time,
                long_break_minutes: args.long_break,
                long_break_every: args.long_break_every,
            },
        };
        self.send_request_with_retry(&request).await
    }

    /// Restores the default configuration.
    pub async fn reset_config(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ResetConfig).await
    }

    /// Reinitializes the session.
    pub async fn reset_session(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ResetSession)
            .await
    }

    /// Retries a request a few times before surfacing the last error.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("リクエスト失敗 (試行 {}/{}): {}", attempt, MAX_RETRIES, e);
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap())
    }

    /// One connect-send-receive round trip.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'kyukei daemon' を起動してください")?;

        let request_json =
            serde_json::to_string(request).context("リクエストのシリアライズに失敗しました")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("フラッシュがタイムアウトしました")?
            .context("フラッシュに失敗しました")?;

        // Half-close tells the daemon the request is complete.
        stream
            .shutdown()
            .await
            .context("シャットダウンに失敗しました")?;

        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

        if n == 0 {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer[..n]).context("レスポンスのパースに失敗しました")?;

        // An error status means the daemon refused the operation; surface
        // its message verbatim.
        if response.status == "error" {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
