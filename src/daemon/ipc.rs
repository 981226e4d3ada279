//! Control socket for the break-reminder daemon.
//!
//! The daemon listens on a Unix domain socket under the state directory.
//! One request per connection: the client writes a JSON command, the
//! daemon answers with a JSON response and the connection is done. The
//! request handler holds the validity guards (pause while stopped, commit
//! without an open popup); the state machine itself stays total.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::types::{Awaiting, ConfigParams, IpcRequest, IpcResponse, Mode, ResponseData};

use super::engine::SessionEngine;

// ============================================================================
// Constants
// ============================================================================

/// Socket file name under the state directory.
const SOCKET_FILE: &str = "kyukei.sock";

/// Upper bound on a single request, in bytes. Every command fits in a
/// fraction of this.
const MAX_REQUEST_SIZE: usize = 4096;

/// How long a connected client gets to deliver its request.
const READ_TIMEOUT_SECS: u64 = 5;

/// Snooze length bounds in minutes; out-of-range values are clamped.
const SNOOZE_MINUTES_RANGE: (u32, u32) = (1, 240);

/// Returns the default socket path under the state directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
    Ok(home.join(".kyukei").join(SOCKET_FILE))
}

// ============================================================================
// IpcError
// ============================================================================

/// Per-connection failures on the control socket.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// The client connected but the request could not be read.
    #[error("リクエストの読み込みに失敗しました: {0}")]
    ReadError(String),

    /// The response could not be written back to the client.
    #[error("レスポンスの書き込みに失敗しました: {0}")]
    WriteError(String),

    /// The payload was not a valid command or the response did not
    /// serialize.
    #[error("シリアライズに失敗しました: {0}")]
    SerializationError(String),

    /// The client held the connection open without sending anything.
    #[error("読み込みがタイムアウトしました")]
    Timeout,

    /// The client disconnected before sending a request.
    #[error("クライアントが切断しました")]
    ClosedByPeer,

    /// The request filled the whole read buffer.
    #[error("リクエストが大きすぎます (最大 {MAX_REQUEST_SIZE} バイト)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Listening end of the control socket.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path, removed again on drop
    socket_path: PathBuf,
}

impl IpcServer {
    /// Binds the control socket, replacing a stale socket file from a
    /// previous daemon lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket directory cannot be prepared or the
    /// socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("古いソケットを削除できません: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("ソケットディレクトリを作成できません: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("ソケットをバインドできません: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Waits for the next client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("接続を受け付けられません")?;
        Ok(stream)
    }

    /// Reads one command off the stream, bounded in both time and size.
    ///
    /// # Errors
    ///
    /// Returns an [`IpcError`] describing which stage of the read failed.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ClosedByPeer.into());
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .map_err(|e| IpcError::SerializationError(e.to_string()))?;

        Ok(request)
    }

    /// Writes one response back to the client.
    ///
    /// # Errors
    ///
    /// Returns an [`IpcError`] if serialization or the write fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response)
            .map_err(|e| IpcError::SerializationError(e.to_string()))?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Maps control-socket commands onto engine operations.
///
/// Rejections (pause while stopped, commit without an open popup) are
/// answered as error responses; nothing here panics or propagates.
pub struct RequestHandler {
    /// Shared reference to the session engine
    engine: Arc<Mutex<SessionEngine>>,
}

impl RequestHandler {
    /// Creates a handler around the shared engine.
    pub fn new(engine: Arc<Mutex<SessionEngine>>) -> Self {
        Self { engine }
    }

    /// Answers one command.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::CommitBreak { task } => self.handle_commit_break(task).await,
            IpcRequest::CommitWork => self.handle_commit_work().await,
            IpcRequest::Snooze { minutes } => self.handle_snooze(minutes).await,
            IpcRequest::GetConfig => self.handle_get_config().await,
            IpcRequest::SetConfig { params } => self.handle_set_config(params).await,
            IpcRequest::ResetConfig => self.handle_reset_config().await,
            IpcRequest::ResetSession => self.handle_reset_session().await,
        }
    }

    /// Handles the start command.
    async fn handle_start(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let now = Utc::now();

        let message = match engine.awaiting() {
            Awaiting::Break => "休憩を開始しました",
            Awaiting::Work => "作業を開始しました",
            Awaiting::None => "タイマーを開始しました",
        };
        engine.start(now);

        IpcResponse::success(message, Some(ResponseData::from_session(engine.session(), now)))
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        if !engine.is_running() {
            return IpcResponse::error("タイマーは実行されていません");
        }

        let now = Utc::now();
        engine.pause(now);

        IpcResponse::success(
            "タイマーを一時停止しました",
            Some(ResponseData::from_session(engine.session(), now)),
        )
    }

    /// Handles the reset command.
    async fn handle_reset(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset();

        IpcResponse::success(
            "タイマーをリセットしました",
            Some(ResponseData::from_session(engine.session(), Utc::now())),
        )
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        let data =
            ResponseData::from_session(engine.session(), Utc::now()).with_config(engine.config());

        IpcResponse::success("", Some(data))
    }

    /// Handles the commit-break command (break-start popup confirmed).
    async fn handle_commit_break(&self, task: Option<String>) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        if engine.awaiting() != Awaiting::Break {
            return IpcResponse::error("休憩の開始待ちではありません");
        }

        let now = Utc::now();
        engine.commit_break(task.as_deref().unwrap_or(""), now);

        IpcResponse::success(
            "休憩を開始しました",
            Some(ResponseData::from_session(engine.session(), now)),
        )
    }

    /// Handles the commit-work command (break-end popup confirmed, or a
    /// skip straight to work from the break-start popup).
    async fn handle_commit_work(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        if engine.awaiting() == Awaiting::None {
            return IpcResponse::error("確認待ちの選択はありません");
        }

        let now = Utc::now();
        engine.commit_work(now);

        IpcResponse::success(
            "作業を再開しました",
            Some(ResponseData::from_session(engine.session(), now)),
        )
    }

    /// Handles the snooze command.
    async fn handle_snooze(&self, minutes: u32) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        let snoozable = engine.awaiting() == Awaiting::Break
            || engine.is_running()
            || (engine.awaiting() == Awaiting::None && engine.session().mode != Mode::Idle);
        if !snoozable {
            return IpcResponse::error("スヌーズできる状態ではありません");
        }

        let minutes = minutes.clamp(SNOOZE_MINUTES_RANGE.0, SNOOZE_MINUTES_RANGE.1);
        let now = Utc::now();
        engine.snooze(minutes, now);

        IpcResponse::success(
            format!("{}分スヌーズしました", minutes),
            Some(ResponseData::from_session(engine.session(), now)),
        )
    }

    /// Handles the get-config command.
    async fn handle_get_config(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(ResponseData::from_config(engine.config())))
    }

    /// Handles the set-config command.
    async fn handle_set_config(&self, params: ConfigParams) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.set_config(&params);

        IpcResponse::success(
            "設定を保存しました",
            Some(ResponseData::from_config(engine.config())),
        )
    }

    /// Handles the reset-config command.
    async fn handle_reset_config(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset_config();

        IpcResponse::success(
            "設定を初期値に戻しました",
            Some(ResponseData::from_config(engine.config())),
        )
    }

    /// Handles the reset-session command.
    async fn handle_reset_session(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset_session();

        IpcResponse::success(
            "セッションを初期化しました",
            Some(ResponseData::from_session(engine.session(), Utc::now())),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
