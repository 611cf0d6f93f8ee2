//! Collaborator traits for platform-agnostic navigation.
//!
//! This module provides trait abstractions that decouple the navigation
//! core from the surrounding flight stack.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Real implementations (EKF-backed estimators, sensor fusion) live in
//!   the host firmware

pub mod inertial;

pub use inertial::{InertialNav, MockInertialNav};
