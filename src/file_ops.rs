//! File armoring and dearmoring operations
//!
//! This module provides the file-level operations behind the command line
//! tool: armoring a binary file as a single block, extracting the contents
//! of one block from an armored file, and listing the blocks in a file.

use crate::armor::{Block, BlockType};
use crate::dearmor::Dearmorer;
use crate::error::{ArmorError, ErrorCategory, ErrorKind, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Armor a file as a single block
///
/// Reads binary contents from `input_path`, wraps them in a `block_type`
/// envelope carrying `headers`, and writes the armored text to `output_path`.
pub fn armor_file(
    input_path: &Path,
    output_path: &Path,
    block_type: BlockType,
    headers: &[(String, String)],
) -> Result<()> {
    let contents = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let block = headers
        .iter()
        .try_fold(Block::new(block_type, contents), |block, (key, value)| {
            block.with_header(key, value)
        })?;
    write_file_atomic(output_path, block.armored().as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Extract the contents of one block
///
/// Decodes every envelope in `input_path` and writes the raw contents of the
/// block at `index` (0-based, in file order) to `output_path`. Returns the
/// block that was written.
pub fn dearmor_file(
    input_path: &Path,
    output_path: &Path,
    index: usize,
    dearmorer: &Dearmorer,
) -> Result<Block> {
    let blocks = read_blocks(input_path, dearmorer)?;
    let count = blocks.len();
    let block = blocks.into_iter().nth(index).ok_or_else(|| {
        ArmorError::with_kind(
            ErrorCategory::User,
            ErrorKind::BlockNotFound,
            format!(
                "{} contains {} block(s), no block at index {}",
                input_path.display(),
                count,
                index
            ),
        )
    })?;
    write_file_atomic(output_path, block.contents())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(block)
}

/// Decode every block in an armored file
pub fn read_blocks(input_path: &Path, dearmorer: &Dearmorer) -> Result<Vec<Block>> {
    let file = File::open(input_path).map_err(|e| read_error(input_path, e))?;
    dearmorer
        .dearmor(BufReader::new(file))
        .map_err(|e| e.with_context(format!("failed to dearmor {}", input_path.display())))
}

/// Write `contents` to `path` atomically
///
/// The data goes to a tempfile in the target directory first, which is
/// flushed, synced and then renamed over `path`. Either the old file or the
/// complete new file exists afterwards, never a partial one.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to create tempfile",
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to write to tempfile",
            e,
        )
    })?;
    temp_file.flush().map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    temp_file.persist(path).map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> ArmorError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    ArmorError::with_kind_and_source(
        category,
        ErrorKind::Read,
        format!("failed to read from {}", path.display()),
        err,
    )
}
