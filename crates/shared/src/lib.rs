//! Value types shared by every interaction crate.

pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
