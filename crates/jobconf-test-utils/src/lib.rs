//! Shared test utilities for the jobconf workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not each
//! reinvent config-tree setup. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`] - [`ConfigTree`] builder for on-disk config and job fragments
//! - [`docs`] - canned YAML documents used across suites

pub mod docs;
pub mod tree;

pub use tree::ConfigTree;
