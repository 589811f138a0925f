//! Resolution of the file an entry is appended to.
//!
//! Nothing here is cached between calls: the rotation index is recomputed
//! from the directory listing and the size of the candidate file every time,
//! so the filesystem is the only source of truth.

use {
    crate::{
        error::ThrowlerError,
        options::{Autorotate, Options},
    },
    chrono::{DateTime, Local},
    regex::Regex,
    std::{
        fs, io,
        path::{Component, Path, PathBuf},
    },
};

/// Extension of every log file.
const LOG_EXTENSION: &str = "log";

/// Normalize the level of a logging call.
///
/// The level is lowercased. It is dropped when empty, when it contains a
/// path separator or is `.`/`..`, or when an allow-list is configured and
/// does not contain it.
/// # Arguments
/// * `level` - The level passed by the caller, if any.
/// * `allowed` - The lowercased allow-list, empty for no filtering.
/// # Returns
/// The level to record, if any.
pub fn normalize_level(level: Option<&str>, allowed: &[String]) -> Option<String> {
    let level = level?.to_lowercase();
    if level.is_empty() || level == "." || level == ".." || level.contains(['/', '\\']) {
        return None;
    }
    if !allowed.is_empty() && !allowed.contains(&level) {
        return None;
    }
    Some(level)
}

/// Get the directory entries are written to at `now`.
///
/// With autorotate disabled this is the base directory, otherwise the base
/// directory joined with `now` formatted by the directory date pattern.
pub fn target_directory(options: &Options, now: &DateTime<Local>) -> PathBuf {
    match options.autorotate() {
        Autorotate::None => options.dir().to_path_buf(),
        Autorotate::Hourly | Autorotate::Daily => join_relative(options.dir(), &options.dir_date_format().format(now)),
    }
}

/// The plain name parts of `relative`; roots, prefixes, `.` and `..` are
/// skipped.
fn normal_components(relative: &str) -> Vec<String> {
    Path::new(relative)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Join `relative` onto `base`, keeping the result inside `base` even when
/// `relative` starts with a separator.
fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    path.extend(normal_components(relative));
    path
}

/// Split a stem that may contain separators into the directory its files
/// live in and the file name prefix.
fn split_stem(directory: &Path, stem: &str) -> (PathBuf, String) {
    let mut parts = normal_components(stem);
    let name = parts.pop().unwrap_or_default();
    let mut parent = directory.to_path_buf();
    parent.extend(parts);
    (parent, name)
}

/// Get the file stem at `now`: the formatted date followed by `_<level>`.
pub fn file_stem(options: &Options, level: Option<&str>, now: &DateTime<Local>) -> String {
    let date = options.date_format().format(now);
    match level {
        Some(level) => format!("{date}_{level}"),
        None => date,
    }
}

/// Get the path of the log file with the given stem and index.
///
/// Separators in `stem` become subdirectories of `directory`.
pub fn log_file_path(directory: &Path, stem: &str, index: usize) -> PathBuf {
    let (parent, name) = split_stem(directory, stem);
    parent.join(format!("{name}_{index}.{LOG_EXTENSION}"))
}

/// Get the rotation index for the next entry.
///
/// Counts the files named `<stem>_<N>.log`, where a stem containing
/// separators is looked up in the matching subdirectory. The candidate
/// index is that count, or 1 when there are none. If the candidate file has
/// reached `threshold_bytes`, the entry spills into the next index.
/// # Arguments
/// * `directory` - The directory holding the log files.
/// * `stem` - The file stem, including the level suffix.
/// * `threshold_bytes` - The size at which a file is considered full.
/// # Returns
/// The index of the file to append to.
pub fn rotation_index(directory: &Path, stem: &str, threshold_bytes: u64) -> Result<usize, ThrowlerError> {
    let (parent, name) = split_stem(directory, stem);
    let count = count_log_files(&parent, &name)?;
    let candidate = count.max(1);
    match fs::metadata(log_file_path(directory, stem, candidate)) {
        Ok(metadata) if metadata.is_file() && metadata.len() >= threshold_bytes => Ok(candidate + 1),
        _ => Ok(candidate),
    }
}

/// Count the regular files in `directory` named `<name>_<N>.log`.
fn count_log_files(directory: &Path, name: &str) -> Result<usize, ThrowlerError> {
    let file_pattern = Regex::new(&format!(r"^{}_\d+\.{LOG_EXTENSION}$", regex::escape(name)))
        .map_err(|err| ThrowlerError::InternalError(err.to_string()))?;

    let files = match fs::read_dir(directory) {
        Ok(files) => files,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(ThrowlerError::FileIOError(err)),
    };

    let mut count = 0;
    for file in files.flatten() {
        let is_file = file.metadata().map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(file_name) = file.file_name().to_str() {
            if file_pattern.is_match(file_name) {
                count += 1;
            }
        }
    }
    Ok(count)
}

/// Create `directory` and any missing ancestors. A directory created
/// concurrently by someone else is not an error.
pub fn ensure_directory(directory: &Path) -> Result<(), ThrowlerError> {
    if directory.is_dir() {
        return Ok(());
    }
    match fs::create_dir_all(directory) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && directory.is_dir() => {
            tracing::debug!(directory = %directory.display(), "log directory created concurrently");
            Ok(())
        }
        Err(err) => Err(ThrowlerError::CreateDirectoryFailed(
            directory.to_path_buf(),
            err.to_string(),
        )),
    }
}

/// Resolve the full path of the file an entry logged at `now` goes to,
/// creating its parent directories if needed.
pub fn resolve_log_path(options: &Options, level: Option<&str>, now: &DateTime<Local>) -> Result<PathBuf, ThrowlerError> {
    let directory = target_directory(options, now);
    let stem = file_stem(options, level, now);
    let index = rotation_index(&directory, &stem, options.threshold_bytes())?;
    let path = log_file_path(&directory, &stem, index);
    ensure_directory(path.parent().unwrap_or(&directory))?;
    Ok(path)
}
