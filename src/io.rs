use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use polars::{
    frame::DataFrame,
    prelude::{LazyCsvReader, LazyFileListReader, PlPath},
};
use tracing::debug;

use crate::error::{BoardResult, IoError, polars_err};

// ================================================================================================
// Readers
// ================================================================================================

/// Reads a delimited-text file with a header row into a `DataFrame`.
///
/// A missing or unreadable file is fatal. Column types are inferred from the
/// first `infer_schema_length` rows (`None` scans everything).
pub(crate) fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> BoardResult<DataFrame> {
    ensure_readable(path)?;

    let uri = path.to_str().ok_or_else(|| {
        IoError::ReaderCreation(format!(
            "Path contains invalid UTF-8 characters: {}",
            path.display()
        ))
    })?;

    let df = LazyCsvReader::new(PlPath::new(uri))
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .finish()
        .map_err(|e| polars_err(&format!("Failed to scan '{}'", path.display()), e))?
        .collect()
        .map_err(|e| polars_err(&format!("Failed to parse '{}'", path.display()), e))?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "CSV read");
    Ok(df)
}

/// Reads the static HTML description panel verbatim.
pub(crate) fn read_description(path: &Path) -> BoardResult<String> {
    ensure_readable(path)?;
    std::fs::read_to_string(path)
        .map_err(|e| IoError::ReadFailed(format!("{}: {e}", path.display())).into())
}

fn ensure_readable(path: &Path) -> BoardResult<()> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IoError::NotFound(path.display().to_string()),
        _ => IoError::ReaderCreation(format!("{}: {e}", path.display())),
    })?;

    if !metadata.is_file() {
        return Err(IoError::ReaderCreation(format!("{} is not a file", path.display())).into());
    }

    File::open(path).map_err(|e| IoError::ReaderCreation(format!("{}: {e}", path.display())))?;
    Ok(())
}

// ================================================================================================
// Writers
// ================================================================================================

/// Opens a buffered writer, creating parent directories when missing.
/// Overwrites the file if it exists.
pub(crate) fn writer(path: &Path, buffer_size: usize) -> BoardResult<Box<dyn Write + Send>> {
    let missing_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists());
    if let Some(dir) = missing_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            IoError::WriteFailed(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
    }

    File::create(path)
        .map(|file| Box::new(BufWriter::with_capacity(buffer_size, file)) as Box<dyn Write + Send>)
        .map_err(|e| IoError::WriteFailed(format!("{}: {e}", path.display())).into())
}
