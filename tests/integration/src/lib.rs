//! Integration test utilities for the peer chat core
//!
//! This crate provides helpers for running several chat sessions against one
//! in-process hub and observing them end to end.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
