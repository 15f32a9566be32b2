//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Colours used by the draw passes
//! - Logging utilities

pub mod math;
pub mod colour;
pub mod logging;
