// Rust guideline compliant 2026-02-06

//! Pincheck Core Library
//!
//! This crate provides the building blocks of the pinned-dependency check:
//! - PEP 440 versions and version specifiers
//! - PEP 508 requirements and environment markers
//! - Project definitions (pyproject.toml, setup.cfg)
//! - Lock file parsing
//! - The satisfaction check between declarations and pins
//! - Configuration and error types

pub mod check;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod marker;
pub mod project;
pub mod requirement;
pub mod setup_cfg;
pub mod specifier;
pub mod version;

pub use check::{validate_requirements, CheckOptions, Mismatch};
pub use config::{Config, OutputFormat};
pub use error::{Error, Result};
pub use lockfile::{LockFile, Pin, Pinned};
pub use marker::{Marker, MarkerEnvironment};
pub use project::{ProjectDefinition, ProjectFile, ProjectFormat};
pub use requirement::{canonicalize_name, Requirement, Requirements};
pub use specifier::{Specifier, SpecifierSet};
pub use version::Version;
