// src/utils/mod.rs
pub mod util;

#[cfg(test)]
pub(crate) mod captured_log;
