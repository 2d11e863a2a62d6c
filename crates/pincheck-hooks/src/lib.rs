// Rust guideline compliant 2026-02-06

//! Pincheck Git Hooks
//!
//! This crate provides pre-commit hook implementations for Python projects:
//! - Pinned dependency check (lock files satisfy declared dependencies)

pub mod pinned_deps;
pub mod report;

pub use pinned_deps::{check_pinned_deps, ChangedFiles};
pub use report::{Report, Scope, Violation};
