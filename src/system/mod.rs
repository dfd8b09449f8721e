//! System utilities and monitoring
//!
//! This module contains metrics collection and other system-level utilities.

pub mod metrics;
