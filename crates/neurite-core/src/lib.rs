#![forbid(unsafe_code)]
//! neurite-core library.
//!
//! Point records, field validation, SWC I/O and engine configuration shared
//! by the graph engine and the CLI.
//!
//! # Conventions
//!
//! - **Errors**: domain failures are [`MorphologyError`]; I/O and config
//!   loading use `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod swc;
pub mod timing;
pub mod validate;

pub use error::{ErrorCode, MorphologyError, RootQuery};
pub use model::{Morphology, Node, NodeId, NodeType, Point3};
