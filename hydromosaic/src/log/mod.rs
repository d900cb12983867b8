//! Logging abstraction layer.
//!
//! Pipeline components log through the [`Logger`] trait instead of calling
//! `tracing` directly, so tests can silence or capture what a stage reports.
//!
//! # Implementations
//!
//! - `TracingLogger`: Production adapter that delegates to the `tracing` crate
//! - `NoOpLogger`: Silent logger for tests
//! - `CaptureLogger`: Keeps messages in memory for assertions
//!
//! # Usage
//!
//! Components accept an `Arc<dyn Logger>` and use the provided macros:
//!
//! ```
//! use hydromosaic::log::{Logger, NoOpLogger};
//! use hydromosaic::{log_debug, log_info};
//! use std::sync::Arc;
//!
//! struct StageProgress {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! impl StageProgress {
//!     fn finished(&self, stage: &str, failed: usize) {
//!         log_info!(self.logger, "{} finished", stage);
//!         log_debug!(self.logger, "{} tiles failed", failed);
//!     }
//! }
//!
//! let progress = StageProgress { logger: Arc::new(NoOpLogger) };
//! progress.finished("elevation", 0);
//! ```

mod capture;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use capture::CaptureLogger;
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
