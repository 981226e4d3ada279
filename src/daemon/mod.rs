//! Daemon module for the break-reminder timer.
//!
//! This module contains the core daemon functionality:
//! - `engine`: Session engine wiring the state machine to its collaborators
//! - `ipc`: Unix Domain Socket server and request handler
//! - `nag`: Repeating alert for unanswered transition popups

pub mod engine;
pub mod ipc;
pub mod nag;

pub use engine::SessionEngine;
pub use ipc::{IpcServer, RequestHandler};
pub use nag::NagAlarm;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::alert::{Alerter, DesktopAlerter};
use crate::store::StateStore;

/// Countdown poll period. Display granularity is whole seconds, so any
/// period below one second is fine.
const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Runs the daemon until ctrl-c.
///
/// Binds the IPC socket, spawns the periodic tick task and serves client
/// requests sequentially on the current thread.
///
/// # Errors
///
/// Returns an error if the state directory or socket cannot be set up.
pub async fn run() -> Result<()> {
    let store = StateStore::new()?;
    let alerter: Arc<dyn Alerter> = Arc::new(DesktopAlerter::new());
    let engine = Arc::new(Mutex::new(SessionEngine::new(store, alerter)));

    let socket_path = ipc::default_socket_path()?;
    let server = IpcServer::new(&socket_path)?;
    let handler = RequestHandler::new(engine.clone());

    info!("Daemonを起動しました: {:?}", socket_path);

    let tick_engine = engine.clone();
    let tick_task = tokio::spawn(async move {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            tick_engine.lock().await.tick(Utc::now());
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("終了シグナルを受信しました");
                break;
            }
            accepted = server.accept() => {
                let mut stream = match accepted {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!("接続の受け付けに失敗しました: {:#}", e);
                        continue;
                    }
                };
                match IpcServer::receive_request(&mut stream).await {
                    Ok(request) => {
                        let response = handler.handle(request).await;
                        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                            warn!("レスポンスの送信に失敗しました: {:#}", e);
                        }
                    }
                    Err(e) => warn!("リクエストの受信に失敗しました: {:#}", e),
                }
            }
        }
    }

    tick_task.abort();
    engine.lock().await.shutdown();
    info!("Daemonを停止しました");
    Ok(())
}
