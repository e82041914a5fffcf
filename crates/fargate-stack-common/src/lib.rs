//! # fargate-stack-common
//!
//! Shared types, error definitions, and constants used across the
//! fargate-stack workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the configuration
//! resolver and the stack composer build upon.

pub mod constants;
pub mod error;
pub mod types;
