//! The read-then-remove test procedure behind the `imagestore-read` binary.
//!
//! The read always completes, and its payload is on disk, before the remove
//! is issued. A failed read leaves the output path untouched and skips the
//! remove.

use crate::blocking::SecureObjectClient;
use crate::client::ImageStore;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const READ_BANNER: &str = "-------------- Calling Read --------------";
pub const MISSING_ARGS: &str = "Please provide imgHandle key and output file path as arguments.";
pub const MISSING_OUTPUT: &str = "Please provide output file path as 2nd argument.";
pub const INVALID_KEY: &str = "imgHandle key must be valid UTF-8.";

/// Positional arguments: the object key and the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub key: String,
    pub output: PathBuf,
}

impl Invocation {
    /// Parse the arguments that follow the program name. Extra arguments are ignored.
    ///
    /// The output path is taken as-is, so paths that are not valid UTF-8 work.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let key = args
            .next()
            .ok_or_else(|| Error::Usage(MISSING_ARGS.to_string()))?;
        let output = args
            .next()
            .ok_or_else(|| Error::Usage(MISSING_OUTPUT.to_string()))?;
        let key = key
            .into_string()
            .map_err(|_| Error::Usage(INVALID_KEY.to_string()))?;

        Ok(Self {
            key,
            output: PathBuf::from(output),
        })
    }
}

/// Read `invocation.key`, write it to `invocation.output`, then remove it.
///
/// Progress lines go to `out`. Returns the remove result.
pub fn run<S, W>(client: &SecureObjectClient<S>, invocation: &Invocation, out: &mut W) -> Result<bool>
where
    S: ImageStore,
    W: Write,
{
    writeln!(out, "{READ_BANNER}")?;
    writeln!(out, "{}", invocation.key)?;
    out.flush()?;

    let payload = client.read(&invocation.key)?;
    write_payload(&invocation.output, &payload)?;

    let removed = client.remove(&invocation.key)?;
    writeln!(out, "Remove status :{}", u8::from(removed))?;
    Ok(removed)
}

/// Replace whatever is at `path` with exactly `payload`.
pub fn write_payload(path: &Path, payload: &[u8]) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut file = File::create(path)?;
    file.write_all(payload)?;
    file.sync_all()?;
    info!(path = %path.display(), bytes = payload.len(), "wrote payload");
    Ok(())
}
