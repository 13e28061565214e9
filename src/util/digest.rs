//! Content hashing.

use std::fmt;
use std::io;
use std::str::FromStr;

use futures::StreamExt;
use sha2::{Digest, Sha256, Sha512};

use crate::storage::Content;

/// A named hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// The canonical lowercase algorithm name (`sha256`, `sha512`).
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Hash a byte slice, returning lowercase hex.
    pub fn hex(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
            DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(data)),
        }
    }

    /// Hash a content stream chunk by chunk, returning lowercase hex.
    pub async fn hex_content(&self, content: Content) -> io::Result<String> {
        let mut stream = content.into_stream();
        match self {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                while let Some(chunk) = stream.next().await {
                    hasher.update(&chunk?);
                }
                Ok(format!("{:x}", hasher.finalize()))
            }
            DigestAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                while let Some(chunk) = stream.next().await {
                    hasher.update(&chunk?);
                }
                Ok(format!("{:x}", hasher.finalize()))
            }
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(DigestAlgorithm::Sha512),
            other => Err(format!("unsupported digest algorithm '{}'", other)),
        }
    }
}
