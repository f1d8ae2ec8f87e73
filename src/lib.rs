//! voxd — push-to-talk voice dictation.
//!
//! On a trigger event the pipeline captures microphone audio, transcribes it
//! via a remote speech-to-text service (batch or streaming), optionally
//! rewrites the transcript through a chat-completion endpoint, and injects
//! the final text into whatever application holds input focus, with a
//! clipboard-paste fallback that restores the previous clipboard content.
//!
//! # Subsystems
//!
//! | Module    | Responsibility |
//! |-----------|----------------|
//! | [`trigger`] | Global key listener producing session begin/end/toggle events |
//! | [`audio`]   | Microphone capture, loudness stream, PCM → WAV encoding |
//! | [`stt`]     | Remote transcription providers (multipart upload, SSE streaming) |
//! | [`rewrite`] | Hotword correction + optional LLM rewrite with graceful degrade |
//! | [`inject`]  | Text injection with clipboard save/restore fallback |
//! | [`session`] | The state machine tying the above together |
//! | [`config`]  | TOML settings and platform paths |

pub mod audio;
pub mod config;
pub mod inject;
pub mod rewrite;
pub mod session;
pub mod stt;
pub mod trigger;
