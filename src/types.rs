use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Largest payload slice carried by a single `StoreReq` message (just under 4 MiB).
pub const CHUNK_SIZE: usize = 4095 * 1024;

/// Storage class requested when storing an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    /// Kept in the store's in-memory backend (keys are prefixed `inmem_`)
    InMemory,
    /// Kept in the store's persistent backend
    Persistent,
}

impl MemoryType {
    /// Wire string sent in `StoreReq.memoryType`
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::InMemory => "inmemory",
            MemoryType::Persistent => "persistent",
        }
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        MemoryType::InMemory
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inmemory" => Ok(MemoryType::InMemory),
            "persistent" => Ok(MemoryType::Persistent),
            other => Err(Error::InvalidArgument(format!(
                "unknown memory type: {other}"
            ))),
        }
    }
}

/// Rejects empty object handles before they reach the wire.
pub(crate) fn check_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("object key must not be empty".to_string()));
    }
    Ok(())
}
