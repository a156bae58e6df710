//! Streaming archive extraction
//!
//! Nothing is written to its final location until every entry of the
//! archive has been read and checked. A single-file archive is streamed into
//! a `.part` sibling of the output; a tree archive is unpacked into a staging
//! directory under the install root. Either is renamed into place at the end
//! and removed on any failure, so a corrupt archive leaves the previous
//! install untouched.

use crate::install::{InstallError, InstallResult};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// What an extraction pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
}

fn open_archive(path: &Path) -> InstallResult<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| InstallError::io(path, e))?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| InstallError::ArchiveCorruptOrMissing {
        path: path.to_path_buf(),
        source,
    })
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Staging directory for a tree archive, a hidden sibling inside `root`
fn staging_dir(archive_path: &Path, root: &Path) -> PathBuf {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    root.join(format!(".{}.staging", name))
}

/// Stream `reader` into `dest`, truncating it first
///
/// The CRC of a zip entry is only checked once the reader hits its end, so
/// a corrupt entry fails here after some bytes were already written.
fn write_entry<R: Read>(reader: &mut R, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(dest)?);
    let copied = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

/// Copy every file entry of `archive_path` to `output`
///
/// Directory entries are skipped. With several file entries the last one
/// wins. `output` is replaced only after all entries are read, and the
/// archive is deleted once it is.
pub fn extract_single_file(archive_path: &Path, output: &Path) -> InstallResult<ExtractSummary> {
    let part = part_path(output);
    let result = stage_single_file(archive_path, output, &part);
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
    };

    if summary.files > 0 {
        fs::rename(&part, output).map_err(|e| {
            let _ = fs::remove_file(&part);
            InstallError::io(output, e)
        })?;
    }

    fs::remove_file(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    Ok(summary)
}

fn stage_single_file(archive_path: &Path, output: &Path, part: &Path) -> InstallResult<ExtractSummary> {
    let mut summary = ExtractSummary::default();
    let mut archive = open_archive(archive_path)?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| InstallError::ArchiveCorruptOrMissing {
                path: archive_path.to_path_buf(),
                source,
            })?;
        if entry.is_dir() {
            summary.skipped += 1;
            continue;
        }

        let bytes = write_entry(&mut entry, part).map_err(|e| InstallError::io(output, e))?;
        debug!("Staged {} ({} bytes) for {}", entry.name(), bytes, output.display());
        summary.files += 1;
    }
    Ok(summary)
}

/// Files and directories read from a tree archive, waiting to be moved
/// out of the staging directory
#[derive(Debug, Default)]
struct StagedTree {
    summary: ExtractSummary,
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

/// Unpack `archive_path` under `root`, mirroring its directory structure
///
/// Entries whose names would escape `root` are skipped. Files land in
/// `root` only after the whole archive has been read; the archive is
/// deleted afterwards.
pub fn extract_tree(archive_path: &Path, root: &Path) -> InstallResult<ExtractSummary> {
    let staging = staging_dir(archive_path, root);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| InstallError::io(&staging, e))?;
    }

    let staged = stage_tree(archive_path, &staging).and_then(|staged| {
        commit_tree(&staged, &staging, root)?;
        Ok(staged)
    });
    if staging.exists() {
        if let Err(e) = fs::remove_dir_all(&staging) {
            warn!("Could not remove staging directory {}: {}", staging.display(), e);
        }
    }
    let staged = staged?;

    fs::remove_file(archive_path).map_err(|e| InstallError::io(archive_path, e))?;
    Ok(staged.summary)
}

fn stage_tree(archive_path: &Path, staging: &Path) -> InstallResult<StagedTree> {
    let mut staged = StagedTree::default();
    let mut archive = open_archive(archive_path)?;
    fs::create_dir_all(staging).map_err(|e| InstallError::io(staging, e))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| InstallError::ArchiveCorruptOrMissing {
                path: archive_path.to_path_buf(),
                source,
            })?;

        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            staged.summary.skipped += 1;
            continue;
        };

        if entry.is_dir() {
            staged.directories.push(relative);
            staged.summary.directories += 1;
            continue;
        }

        let target = staging.join(&relative);
        let bytes = write_entry(&mut entry, &target).map_err(|e| InstallError::io(&target, e))?;
        debug!("Staged {} ({} bytes)", relative.display(), bytes);
        if !staged.files.contains(&relative) {
            staged.files.push(relative);
        }
        staged.summary.files += 1;
    }
    Ok(staged)
}

fn commit_tree(staged: &StagedTree, staging: &Path, root: &Path) -> InstallResult<()> {
    for relative in &staged.directories {
        let target = root.join(relative);
        fs::create_dir_all(&target).map_err(|e| InstallError::io(&target, e))?;
    }
    for relative in &staged.files {
        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
        }
        fs::rename(staging.join(relative), &target).map_err(|e| InstallError::io(&target, e))?;
        debug!("Installed {}", target.display());
    }
    Ok(())
}
