//! # fargate-stack-compose
//!
//! Declares the resource graph for a containerized web application with a
//! managed PostgreSQL database behind a TLS-terminating load balancer.
//!
//! Handles:
//! - **Declaration**: typed resource specs and the references between them.
//! - **Graph**: the dependency DAG, reference checks, and topological order.
//! - **Stack**: a named graph bound to an account and region, and the app
//!   that owns stacks and applies global tags.
//! - **Composer**: the network, database, secrets, service and scaling
//!   declarations for one resolved configuration.
//! - **Credentials**: the application role, database and schema chain.
//! - **Synth**: rendering stacks into declaration manifests.

pub mod composer;
pub mod credentials;
pub mod declaration;
pub mod graph;
pub mod stack;
pub mod synth;

pub use composer::{build_app, check_stack_id, compose_stack};
pub use stack::{App, Stack};
