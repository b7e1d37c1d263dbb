#![doc = include_str!("RUSTDOC.md")]

pub mod functions;
pub mod logger;

#[cfg(test)]
pub mod test_support;
