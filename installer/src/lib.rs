//! HP driver installer library.
//!
//! This crate identifies an HP machine, resolves the HP platform catalog for
//! its Windows release, and downloads, verifies and silently installs the
//! softpaqs the user selects. It is used by the `hpdrivers` CLI binary and can
//! be consumed programmatically for testing or custom deployment workflows.
//!
//! # Modules
//!
//! - [`catalog`] - Catalog retrieval, fallback, parsing and filtering
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - Command execution abstraction for platform probes
//! - [`config`] - Layered run settings
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - Bounded-retry package downloads with SHA-256 verification
//! - [`error`] - Semantic error types with recovery hints
//! - [`http`] - Blocking HTTP client shared by catalog and package downloads
//! - [`install`] - Silent installer invocation
//! - [`output`] - Candidate tables, status tables and JSON summaries
//! - [`pipeline`] - Per-package decide, acquire, install and record flow
//! - [`platform`] - Platform identity and feature versions
//! - [`preflight`] - Catalog host connectivity check
//! - [`run`] - Whole-run orchestration
//! - [`run_log`] - Append-only discovery, install and error logs
//! - [`selector`] - Interactive and non-interactive package selection
//! - [`softpaq_id`] - Semantic wrapper for softpaq identifiers
//! - [`version`] - Dotted version comparison
//! - [`version_store`] - Recorded installed versions

pub mod catalog;
pub mod cli;
pub mod command;
pub mod config;
pub mod dirs;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod preflight;
pub mod run;
pub mod run_log;
pub mod selector;
pub mod softpaq_id;
pub mod version;
pub mod version_store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
