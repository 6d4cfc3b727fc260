//! Partial-update types and their builders.
//!
//! `Option<T>` fields mean "leave unchanged when `None`"; `Option<Option<T>>`
//! fields additionally allow clearing a nullable field with `Some(None)`.

pub mod exhibition;
pub mod project;
pub mod review;
pub mod role;
pub mod user;
