//! Get command - load a cache entry to a file or stdout

use super::with_cache;
use crate::cache::{create_cache, CacheKey, EntryReader};
use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::diagnostics::TracingSink;
use crate::error::{CacheError, CacheResult};
use crate::ui::{self, UiContext};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Writes the entry to a file, creating it only on a hit
///
/// The body lands in a temporary file next to the target and is renamed
/// into place once fully read. A body that breaks off part-way leaves the
/// target untouched.
struct FileOutput {
    path: PathBuf,
}

impl EntryReader for FileOutput {
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        io::copy(input, &mut file)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

struct StdoutOutput;

impl EntryReader for StdoutOutput {
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        io::copy(input, &mut stdout)?;
        stdout.flush()
    }
}

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> CacheResult<()> {
    let cache = create_cache(&config.cache, TracingSink::shared())?;
    let key = CacheKey::new(args.key);
    debug!("Loading {} from {}", key, cache.description());

    let output = args.output.clone();
    let lookup = key.clone();
    let hit = with_cache(cache, move |cache| match output {
        Some(path) => cache.load(&lookup, &mut FileOutput { path }),
        None => cache.load(&lookup, &mut StdoutOutput),
    })
    .await?;

    if !hit {
        return Err(CacheError::EntryNotFound(key.to_string()));
    }

    if let Some(path) = args.output {
        let ctx = UiContext::detect();
        ui::step_ok_detail(&ctx, &format!("Loaded {}", key), &path.display().to_string());
    }
    Ok(())
}
