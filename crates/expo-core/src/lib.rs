//! # expo-core
//!
//! Core types shared across all Expo crates:
//! - Entity structs for every collection (users, roles, exhibitions, projects, reviews,
//!   companies, classes, knowledge entries)
//! - Embedded summary ("resume") structs and the pure projections that build them
//! - Validation rules checked before any write
//! - ID prefix constants, enums, and cross-cutting error types
//! - The acting caller's identity as supplied by the authentication layer

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod summaries;
pub mod validation;
