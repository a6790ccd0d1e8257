//! Core utilities for qlgen.
//!
//! This crate provides foundational types used throughout qlgen:
//! - `error`: The error taxonomy
//! - `diagnostics`: Error reporting for the `check` command
//! - `imports`: Import/header line accumulation
//! - `writer`: Indentation-aware code output

pub mod diagnostics;
pub mod error;
pub mod imports;
pub mod writer;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Location};
pub use error::{Error, Result};
pub use imports::ImportSet;
pub use writer::{block_comment, CodeWriter, WriterOptions};
