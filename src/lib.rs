//! # ckjm-driver: design metrics as a build step
//!
//! Runs object-oriented design metrics over a directory of compiled JVM
//! classes and writes the results as plain text or XML, so a build pipeline
//! gets a metrics report without anyone invoking a separate tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       TaskOrchestrator                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │  Config        │  Environment      │  Scanner   │  Output     │
//! │ • validation   │ • search-path     │ • globs    │ • plain     │
//! │ • YAML layer   │   merge           │ • defaults │ • xml       │
//! ├───────────────────────────────────────────────────────────────┤
//! │          MetricsEngine (ClassFileEngine by default)           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ckjm_driver::{OutputFormat, RunConfiguration, TaskOrchestrator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfiguration::new()
//!         .with_class_dir("build/classes")
//!         .with_output_file("build/reports/ckjm.xml")
//!         .with_format(OutputFormat::Xml)
//!         .with_ext_dirs("lib");
//!
//!     let outcome = TaskOrchestrator::new().execute(&config)?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Orchestration core
pub mod core {
    //! Configuration, staging and dispatch of a metrics run.

    pub mod config;
    pub mod environment;
    pub mod errors;
    pub mod orchestrator;
    pub mod paths;
    pub mod scanner;
}

// Metrics computation
pub mod engine;

// Report rendering
pub mod io {
    //! Output handlers for streamed results.

    pub mod output;
}

// Re-export primary types for convenience
pub use crate::core::config::{DriverConfig, OutputFormat, RunConfiguration, ScanConfig};
pub use crate::core::errors::{Result, TaskError};
pub use crate::core::orchestrator::{RunOutcome, RunSummary, TaskOrchestrator};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
