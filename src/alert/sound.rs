//! Audible alert playback using rodio.
//!
//! The alert is a short synthesized sine beep, so no audio asset ships
//! with the binary. The rodio output stream is not `Send`, so it lives on
//! a dedicated playback thread; `beep` just drops a message into the
//! thread's channel and returns immediately.

use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Sender};
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use tracing::debug;

use super::AlertError;

/// Beep frequency in hertz.
const BEEP_FREQ_HZ: f32 = 880.0;

/// Beep length.
const BEEP_DURATION: Duration = Duration::from_millis(350);

/// Beep amplitude scale.
const BEEP_AMPLIFY: f32 = 0.6;

/// A sound player that synthesizes a short notification beep.
///
/// The player is `Send + Sync`; it can be shared across threads behind an
/// `Arc`. The playback thread exits when the last sender is dropped.
pub struct BeepPlayer {
    /// Channel into the playback thread; one message per beep.
    trigger: Sender<()>,
}

impl BeepPlayer {
    /// Spawns the playback thread and opens the default audio output
    /// device on it.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::AudioUnavailable` if no output device can be
    /// opened.
    pub fn new() -> Result<Self, AlertError> {
        let (trigger_tx, trigger_rx) = unbounded::<()>();
        let (ready_tx, ready_rx) = bounded::<Result<(), AlertError>>(1);

        std::thread::Builder::new()
            .name("kyukei-audio".to_string())
            .spawn(move || {
                // The stream must stay on this thread for its lifetime.
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(AlertError::AudioUnavailable(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                debug!("オーディオ出力ストリームを初期化しました");

                while trigger_rx.recv().is_ok() {
                    let Ok(sink) = Sink::try_new(&handle) else {
                        continue;
                    };
                    let source = SineWave::new(BEEP_FREQ_HZ)
                        .take_duration(BEEP_DURATION)
                        .amplify(BEEP_AMPLIFY);
                    sink.append(source);
                    sink.sleep_until_end();
                }
            })
            .map_err(|e| AlertError::PlaybackFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                trigger: trigger_tx,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AlertError::AudioUnavailable(
                "オーディオスレッドが起動しませんでした".to_string(),
            )),
        }
    }

    /// Plays the notification beep without blocking.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::PlaybackFailed` if the playback thread has
    /// exited.
    pub fn beep(&self) -> Result<(), AlertError> {
        self.trigger.send(()).map_err(|_| {
            AlertError::PlaybackFailed("オーディオスレッドが停止しています".to_string())
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
