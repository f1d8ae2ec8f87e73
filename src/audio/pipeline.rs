//! Recording session orchestration.
//!
//! [`AudioPipeline`] runs one session across two dedicated threads:
//!
//! - the *capture thread* owns the [`AudioCapture`] and its cpal stream for
//!   the whole session (cpal streams are not `Send`, so they never cross a
//!   thread boundary) and blocks until told to stop;
//! - the *drain thread* is the sole owner of the PCM accumulator: it receives
//!   chunks from the real-time callback, downmixes them to mono 16-bit PCM,
//!   feeds the live loudness stream, and latches a self-stop once the 30 s or
//!   25 MiB limit would be crossed.
//!
//! Stopping is idempotent: calling [`AudioPipeline::stop_capture`] with no
//! active session yields empty bytes rather than an error.

use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::capture::{AudioCapture, AudioChunk};
use super::level::LevelMeter;
use super::wav::encode_wav;
use super::{AudioError, MAX_DURATION_SECS, MAX_FILE_BYTES};

/// Bound of the chunk queue between the cpal callback and the drain thread.
const CHUNK_QUEUE_DEPTH: usize = 64;

/// Bound of the loudness stream towards the UI side.
const LEVEL_QUEUE_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// AudioCapturing
// ---------------------------------------------------------------------------

/// Microphone capture as seen by the session controller.
///
/// `stop_capture` resolves to a complete WAV byte buffer (mono, 16-bit, at
/// the device's native sample rate), or empty bytes if nothing was recording.
#[async_trait]
pub trait AudioCapturing: Send + Sync {
    /// Begin a new recording session.
    async fn start_capture(&self) -> Result<(), AudioError>;

    /// End the current session and return the encoded WAV bytes.
    async fn stop_capture(&self) -> Result<Vec<u8>, AudioError>;

    /// Take the loudness stream for the current session, if one is active
    /// and it has not been taken yet. Values are smoothed and in `[0, 1]`.
    async fn take_level_stream(&self) -> Option<mpsc::Receiver<f32>>;
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// PCM accumulated so far plus the self-stop latch. Shared between the drain
/// thread (writer) and `stop_capture` (final reader).
struct Accumulator {
    pcm: Vec<u8>,
    sample_rate: u32,
    /// Set to the limit that latched the stop; further chunks are discarded
    /// for the rest of the session.
    stopped: Option<AudioError>,
}

impl Accumulator {
    /// Append one mono 16-bit chunk unless a limit would be crossed.
    ///
    /// The duration check uses the length implied by the accumulated PCM, so
    /// a hold longer than the limit still stops with a valid buffer at the
    /// cap. Returns `false` once the latch is set.
    fn append(&mut self, bytes: &[u8]) -> bool {
        if self.stopped.is_some() {
            return false;
        }

        let next_len = self.pcm.len() + bytes.len();
        let bytes_per_sec = u64::from(self.sample_rate) * 2;
        let next_secs = next_len as u64 / bytes_per_sec.max(1);

        if next_secs >= MAX_DURATION_SECS {
            let err = AudioError::DurationExceeded {
                max_secs: MAX_DURATION_SECS,
            };
            log::info!("{err}, stopping accumulation");
            self.stopped = Some(err);
            return false;
        }
        if next_len > MAX_FILE_BYTES {
            let err = AudioError::FileSizeExceeded {
                max_mb: MAX_FILE_BYTES / (1024 * 1024),
            };
            log::info!("{err}, stopping accumulation");
            self.stopped = Some(err);
            return false;
        }

        self.pcm.extend_from_slice(bytes);
        true
    }
}

/// Encode the PCM of a finished session. A session that ran but captured
/// nothing is an encoding failure, not a silent 44-byte file.
fn finalize_session(pcm: Vec<u8>, sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    if pcm.is_empty() {
        return Err(AudioError::EncodingFailed("no audio was captured".into()));
    }
    encode_wav(&pcm, sample_rate, 1, 16)
}

// ---------------------------------------------------------------------------
// AudioPipeline
// ---------------------------------------------------------------------------

/// One capture thread + one drain thread worth of state for a session.
struct Session {
    accumulator: Arc<Mutex<Accumulator>>,
    /// Dropping/signalling this tells the capture thread to drop its stream.
    stop_tx: std::sync::mpsc::Sender<()>,
    capture_join: JoinHandle<()>,
    drain_join: JoinHandle<()>,
}

/// Owns the microphone session lifecycle. See the module docs for the thread
/// layout.
pub struct AudioPipeline {
    session: tokio::sync::Mutex<Option<Session>>,
    level_rx: tokio::sync::Mutex<Option<mpsc::Receiver<f32>>>,
}

impl AudioPipeline {
    pub fn new() -> Self {
        Self {
            session: tokio::sync::Mutex::new(None),
            level_rx: tokio::sync::Mutex::new(None),
        }
    }
}

impl Default for AudioPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapturing for AudioPipeline {
    async fn start_capture(&self) -> Result<(), AudioError> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(AudioError::EngineAlreadyRunning);
        }

        let (chunk_tx, chunk_rx) = std::sync::mpsc::sync_channel::<AudioChunk>(CHUNK_QUEUE_DEPTH);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(u32, u16), AudioError>>();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        let capture_join = std::thread::spawn(move || {
            run_capture_thread(chunk_tx, ready_tx, stop_rx);
        });

        // The device either starts within a moment or fails; both arrive on
        // the ready channel.
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| AudioError::Internal(e.to_string()))?
            .map_err(|e| AudioError::Internal(e.to_string()))?;

        let (sample_rate, channels) = match ready {
            Ok(format) => format,
            Err(err) => {
                let _ = stop_tx.send(());
                let _ = capture_join.join();
                return Err(err);
            }
        };

        let accumulator = Arc::new(Mutex::new(Accumulator {
            pcm: Vec::new(),
            sample_rate,
            stopped: None,
        }));

        let (level_tx, level_rx) = mpsc::channel::<f32>(LEVEL_QUEUE_DEPTH);
        *self.level_rx.lock().await = Some(level_rx);

        let drain_accumulator = Arc::clone(&accumulator);
        let drain_join = std::thread::spawn(move || {
            run_drain_thread(chunk_rx, channels, drain_accumulator, level_tx);
        });

        log::info!("recording started ({sample_rate} Hz, {channels} ch)");
        *session = Some(Session {
            accumulator,
            stop_tx,
            capture_join,
            drain_join,
        });
        Ok(())
    }

    async fn stop_capture(&self) -> Result<Vec<u8>, AudioError> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(Vec::new());
        };
        self.level_rx.lock().await.take();

        let Session {
            accumulator,
            stop_tx,
            capture_join,
            drain_join,
        } = session;

        // Stopping the capture thread drops the cpal stream and with it the
        // chunk sender, which lets the drain thread run off the end of its
        // queue.
        let _ = stop_tx.send(());
        tokio::task::spawn_blocking(move || {
            capture_join
                .join()
                .map_err(|_| AudioError::Internal("capture thread panicked".into()))?;
            drain_join
                .join()
                .map_err(|_| AudioError::Internal("drain thread panicked".into()))
        })
        .await
        .map_err(|e| AudioError::Internal(e.to_string()))??;

        let (pcm, sample_rate) = {
            let mut acc = accumulator
                .lock()
                .map_err(|_| AudioError::Internal("accumulator lock poisoned".into()))?;
            (std::mem::take(&mut acc.pcm), acc.sample_rate)
        };

        log::info!("recording stopped ({} bytes of PCM)", pcm.len());
        finalize_session(pcm, sample_rate)
    }

    async fn take_level_stream(&self) -> Option<mpsc::Receiver<f32>> {
        self.level_rx.lock().await.take()
    }
}

// ---------------------------------------------------------------------------
// Worker threads
// ---------------------------------------------------------------------------

/// Body of the capture thread. Creates the device, starts the stream, reports
/// the negotiated format, then parks on the stop channel until the session
/// ends.
fn run_capture_thread(
    chunk_tx: SyncSender<AudioChunk>,
    ready_tx: std::sync::mpsc::Sender<Result<(u32, u16), AudioError>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) {
    let capture = match AudioCapture::new() {
        Ok(capture) => capture,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    let handle = match capture.start(chunk_tx) {
        Ok(handle) => handle,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    let _ = ready_tx.send(Ok((capture.sample_rate(), capture.channels())));

    // Blocks until stop is signalled or the pipeline is dropped. Either way
    // the stream handle is dropped on exit, ending the hardware stream.
    let _ = stop_rx.recv();
    drop(handle);
}

/// Body of the drain thread: the sole writer of the accumulator.
fn run_drain_thread(
    chunk_rx: std::sync::mpsc::Receiver<AudioChunk>,
    channels: u16,
    accumulator: Arc<Mutex<Accumulator>>,
    level_tx: mpsc::Sender<f32>,
) {
    let mut meter = LevelMeter::new();

    while let Ok(chunk) = chunk_rx.recv() {
        let mono = downmix_mono(&chunk.samples, channels);
        let bytes = to_pcm16(&mono);

        let appended = match accumulator.lock() {
            Ok(mut acc) => acc.append(&bytes),
            Err(_) => return,
        };
        if !appended {
            // Latched; keep draining so the queue never backs up, but stop
            // metering a session that is already over.
            continue;
        }

        let level = meter.update(&mono);
        let _ = level_tx.try_send(level);
    }
}

// ---------------------------------------------------------------------------
// Sample conversion
// ---------------------------------------------------------------------------

/// Average interleaved frames down to a single channel. Mono input is
/// returned as-is; a trailing partial frame is dropped.
fn downmix_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Convert `f32` samples to little-endian 16-bit PCM, clamping to `[-1, 1]`
/// first so out-of-range input cannot wrap.
fn to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
