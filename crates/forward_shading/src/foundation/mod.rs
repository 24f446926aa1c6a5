//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the pipeline:
//! - Math types and shading helpers
//! - Logging utilities

pub mod logging;
pub mod math;
