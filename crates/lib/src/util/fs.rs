//! Filesystem helpers for artifact relocation.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Recursively copy `src` into `dst`, creating `dst`.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
  for entry in WalkDir::new(src).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let target = dst.join(rel);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

/// Replace `dst` with a fresh copy of `src`.
pub fn replace_tree(src: &Path, dst: &Path) -> io::Result<()> {
  remove_tree(dst)?;
  copy_tree(src, dst)
}

/// Remove `path` and everything below it; missing paths are fine.
pub fn remove_tree(path: &Path) -> io::Result<()> {
  match fs::remove_dir_all(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

/// Move a file, overwriting `to`. Falls back to copy and delete across
/// filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
  if fs::rename(from, to).is_ok() {
    return Ok(());
  }
  fs::copy(from, to)?;
  fs::remove_file(from)
}

/// First file in `dir` (by name) with extension `ext`.
pub fn first_with_extension(dir: &Path, ext: &str) -> io::Result<Option<PathBuf>> {
  Ok(files_with_extension(dir, ext)?.into_iter().next())
}

/// Files directly in `dir` with extension `ext`, sorted by name.
pub fn files_with_extension(dir: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() && path.extension().is_some_and(|e| e == ext) {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

/// Zip every file under `src` into `dest`, storing members as
/// `{prefix}/{path relative to src}`.
pub fn zip_tree(src: &Path, dest: &Path, prefix: &str) -> zip::result::ZipResult<()> {
  let mut writer = ZipWriter::new(File::create(dest)?);
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for entry in WalkDir::new(src).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    if !entry.file_type().is_file() {
      continue;
    }
    let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let rel: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    let name = format!("{}/{}", prefix, rel.join("/"));

    writer.start_file(name, options)?;
    let mut reader = BufReader::new(File::open(entry.path())?);
    io::copy(&mut reader, &mut writer)?;
  }

  writer.finish()?;
  Ok(())
}

/// Python's `str.capitalize`: first character upper-cased, the rest lowered.
pub fn capitalize(text: &str) -> String {
  let mut chars = text.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}
