//! Utility modules for proxy-cache-rs.

pub mod digest;

pub use digest::DigestAlgorithm;
