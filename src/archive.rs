//! Unpacking tar archives (plain, gzip, xz or bzip2) that components ship as
//! test resources.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{HarnessError, Result};

const BLOCK_SIZE: usize = 512;
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_OFFSET: usize = 257;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Xz,
    Bzip2,
}

impl Compression {
    fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else if magic.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Compression::Xz
        } else if magic.starts_with(b"BZh") {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }

    fn decoder(self, file: File) -> Box<dyn Read> {
        match self {
            Compression::None => Box::new(file),
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(file)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(file)),
        }
    }
}

/// Extract `archive` into a new directory under `output_dir` and return it.
///
/// The directory is named after the archive without its extensions
/// (`dummy.bar.foo.tar.gz` unpacks to `dummy.bar.foo`). When the archive has a
/// single top-level directory, its contents land directly in the new
/// directory.
pub fn extract_tar(archive: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !archive.is_file() {
        return Err(HarnessError::NotAFile {
            path: archive.to_path_buf(),
        });
    }
    let compression = sniff(archive)?;
    if !output_dir.is_dir() {
        return Err(HarnessError::NotADirectory {
            path: output_dir.to_path_buf(),
        });
    }

    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let destination = output_dir.join(unpacked_name(&file_name));
    if destination.exists() {
        return Err(HarnessError::DestinationExists { path: destination });
    }

    let root = single_root(&list_members(archive, compression)?);
    std::fs::create_dir_all(&destination)
        .map_err(|e| HarnessError::io("failed to create", &destination, e))?;

    let read_err = |e: io::Error| HarnessError::io("failed to read", archive, e);
    let mut tar = tar::Archive::new(compression.decoder(open(archive)?));
    for entry in tar.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let path = entry.path().map_err(read_err)?.into_owned();
        let Some(relative) = relative_member_path(&path, root.as_deref()) else {
            continue;
        };
        if crosses_link(&destination, &relative) {
            tracing::warn!(
                target: "viash_harness",
                member = %path.display(),
                "skipping archive member below a link"
            );
            continue;
        }
        let target = destination.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HarnessError::io("failed to create", parent, e))?;
        }
        entry
            .unpack(&target)
            .map_err(|e| HarnessError::io("failed to unpack", &target, e))?;
    }

    tracing::debug!(
        target: "viash_harness",
        archive = %archive.display(),
        destination = %destination.display(),
        stripped_root = ?root,
        "extracted archive"
    );
    Ok(destination)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| HarnessError::io("failed to open", path, e))
}

/// Work out the compression and check that a tar header follows.
fn sniff(archive: &Path) -> Result<Compression> {
    let mut magic = [0u8; 6];
    let n = read_prefix(open(archive)?, &mut magic)
        .map_err(|e| HarnessError::io("failed to read", archive, e))?;
    let compression = Compression::from_magic(&magic[..n]);

    let mut block = [0u8; BLOCK_SIZE];
    match read_prefix(compression.decoder(open(archive)?), &mut block) {
        Ok(BLOCK_SIZE) if block[USTAR_OFFSET..].starts_with(USTAR_MAGIC) => Ok(compression),
        _ => Err(HarnessError::NotAnArchive {
            path: archive.to_path_buf(),
        }),
    }
}

/// Fill as much of `buf` as the reader allows.
fn read_prefix(mut reader: impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Archive name with its extensions removed, except those that came before a
/// `.tar` in the last two.
fn unpacked_name(file_name: &str) -> String {
    let mut parts = file_name.split('.');
    let stem = parts.next().unwrap_or_default();
    let suffixes: Vec<&str> = parts.collect();
    let tail = suffixes.len().saturating_sub(2);
    let kept = match suffixes[tail..].iter().position(|s| *s == "tar") {
        Some(pos) => &suffixes[..tail + pos],
        None => &suffixes[..],
    };
    let mut name = stem.to_string();
    for suffix in kept {
        name.push('.');
        name.push_str(suffix);
    }
    name
}

struct Member {
    path: PathBuf,
    is_dir: bool,
}

fn list_members(archive: &Path, compression: Compression) -> Result<Vec<Member>> {
    let read_err = |e: io::Error| HarnessError::io("failed to read", archive, e);
    let mut tar = tar::Archive::new(compression.decoder(open(archive)?));
    let mut members = Vec::new();
    for entry in tar.entries().map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        members.push(Member {
            path: normalized(&entry.path().map_err(read_err)?),
            is_dir: entry.header().entry_type().is_dir(),
        });
    }
    Ok(members)
}

/// Drop `.` components.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Whether a directory between `destination` and the member is a symlink,
/// possibly one unpacked from the same archive.
fn crosses_link(destination: &Path, relative: &Path) -> bool {
    let mut current = destination.to_path_buf();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        current.push(component);
        if std::fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink()) {
            return true;
        }
    }
    false
}

/// The one top-level directory, if there is exactly one and everything else
/// lives inside it.
fn single_root(members: &[Member]) -> Option<PathBuf> {
    let mut roots = members
        .iter()
        .filter(|m| m.is_dir && m.path.components().count() == 1);
    let root = roots.next()?;
    if roots.next().is_some() {
        return None;
    }
    members
        .iter()
        .filter(|m| !m.path.as_os_str().is_empty())
        .all(|m| m.path.starts_with(&root.path))
        .then(|| root.path.clone())
}

/// Where a member goes below the destination. `None` for entries that
/// resolve to the destination itself or would escape it.
fn relative_member_path(path: &Path, root: Option<&Path>) -> Option<PathBuf> {
    let path = normalized(path);
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        tracing::warn!(
            target: "viash_harness",
            member = %path.display(),
            "skipping archive member outside the destination"
        );
        return None;
    }
    let relative = match root {
        Some(root) => path.strip_prefix(root).ok()?.to_path_buf(),
        None => path,
    };
    (!relative.as_os_str().is_empty()).then_some(relative)
}
