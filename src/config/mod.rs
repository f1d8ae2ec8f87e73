//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.
//!
//! There is no process-wide settings singleton: each component receives its
//! config slice through its constructor.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, HistoryConfig, HotwordRule, InjectConfig, RewriteConfig, SttConfig,
    SttProviderKind, TriggerConfig,
};
