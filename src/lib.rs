//! pyprojkit - Python package descriptor library
//!
//! This library provides the core functionality for working with a
//! `pyproject.toml` package descriptor:
//! - Parsing, validation and canonical re-serialization
//! - Dependency resolution against a package index
//! - Wheel and sdist builds
//! - Console-script launcher installation

pub mod build;
pub mod cli;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod progress;
pub mod registry;
pub mod resolve;
pub mod scripts;
pub mod validate;
