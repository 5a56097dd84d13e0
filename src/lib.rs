// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod assistant;
pub mod config;
pub mod gemini;
pub mod logging;
pub mod playback;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod speech;
pub mod speech_text;
pub mod tutor;

pub use schedule::{compute_phase, Phase, PhaseStatus};
pub use speech_text::normalize_for_speech;
