//! Put command - store a file as a cache entry

use super::with_cache;
use crate::cache::{create_cache, CacheKey, EntryWriter};
use crate::cli::args::PutArgs;
use crate::config::{BackendKind, Config};
use crate::diagnostics::TracingSink;
use crate::error::{CacheError, CacheResult};
use crate::ui::{self, UiContext};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Entry backed by a file on disk
///
/// Every invocation re-opens the file, so a transport may replay the body.
struct FileEntry {
    path: PathBuf,
}

impl EntryWriter for FileEntry {
    fn write_to(&self, output: &mut dyn Write) -> io::Result<()> {
        let mut file = File::open(&self.path)?;
        io::copy(&mut file, output)?;
        Ok(())
    }
}

/// Execute the put command
pub async fn execute(args: PutArgs, config: &Config) -> CacheResult<()> {
    if !args.file.is_file() {
        return Err(CacheError::User(format!(
            "Not a file: {}",
            args.file.display()
        )));
    }

    let ctx = UiContext::detect();
    if config.cache.backend == BackendKind::Memory {
        ui::step_warn(
            &ctx,
            "The in-memory cache is discarded when this command exits; configure an http backend to keep entries",
        );
    }

    let cache = create_cache(&config.cache, TracingSink::shared())?;
    let description = cache.description();
    let entry = FileEntry {
        path: args.file.clone(),
    };
    let explicit_key = args.key.map(CacheKey::new);

    let key = with_cache(cache, move |cache| {
        let key = match explicit_key {
            Some(key) => key,
            None => {
                let file = File::open(&entry.path).map_err(|e| {
                    CacheError::io(format!("opening {}", entry.path.display()), e)
                })?;
                CacheKey::from_reader(file).map_err(|e| {
                    CacheError::io(format!("hashing {}", entry.path.display()), e)
                })?
            }
        };
        cache.store(&key, &entry)?;
        Ok(key)
    })
    .await?;

    ui::step_ok_detail(&ctx, &format!("Stored {}", args.file.display()), &description);
    println!("{}", key);
    Ok(())
}
