//! Core domain models for pyprojkit
//!
//! This module contains the fundamental types used throughout the application:
//! - Release versions with a total order
//! - Version specifiers and specifier sets
//! - Dependency requirements and name normalization
//! - Console-script entry points
//! - Project identity metadata
//! - Build system and distribution target rules

mod entry_point;
mod project;
mod requirement;
mod specifier;
mod targets;
mod version;

pub use entry_point::EntryPoint;
pub use project::{License, Person, ProjectIdentity, Readme};
pub use requirement::{is_valid_name, normalize_name, Requirement};
pub use specifier::{Operator, Specifier, SpecifierSet};
pub use targets::{BuildSystem, BuildTargets, SdistTarget, TargetKind, WheelTarget};
pub use version::{InvalidVersion, PreRelease, Version};
