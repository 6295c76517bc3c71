//! Tools the Sleuth host can invoke by id.
//!
//! - [`Tool`] / [`ToolError`]: the invocation contract
//! - [`CallContext`]: cancellation and deadline for one call
//! - [`ToolRegistry`]: id -> tool table
//! - [`crawler`]: oracle-guided search over result pages
//! - [`finance`]: Yahoo Finance quote and news lookups
//! - [`python`]: remote Python execution

pub mod context;
pub mod crawler;
pub mod finance;
pub mod python;
pub mod registry;
pub mod tool;

pub use context::{CallContext, Interrupted};
pub use registry::{ToolInfo, ToolRegistry};
pub use tool::{Tool, ToolError};
