//! Shared validation and hashing helpers.

pub mod validation;
