//! Resolution of user supplied options into a fully populated [`Options`].
//!
//! Every field is validated on its own; a missing or invalid value is
//! replaced by its default. The only configurations that are rejected are a
//! `dir` that points at a regular file and a `dir` whose parent is missing.

use {
    crate::{date::DatePattern, error::ThrowlerError},
    regex::Regex,
    serde::Deserialize,
    serde_json::Value,
    std::{
        fs, io,
        path::{Path, PathBuf},
    },
};

const DEFAULT_DIR_DATE_FORMAT: &str = "DD-MMMM-YYYY";
const DEFAULT_DATE_FORMAT: &str = "DD-MMMM-YYYYTHH";
const DEFAULT_DIR: &str = ".";
const DEFAULT_SIZE: RotationSize = RotationSize::MB(10);

const OUTPUT_PATTERN: &str = r"^(console|file)$";
const AUTOROTATE_PATTERN: &str = r"^(hourly|daily|none)$";
const DIR_DATE_FORMAT_PATTERN: &str = r"^[-_., /\\DMY0-9]+$";
const DATE_FORMAT_PATTERN: &str = r"^[-_., /\\DMYTH0-9]+$";
const SIZE_PATTERN: &str = r"(?i)^([1-9][0-9]*)([KMG])$";
const LEVEL_PATTERN: &str = r"^[A-Za-z]+$";

/// Where entries are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// Write each entry to the console sink.
    Console,
    /// Append each entry to a rotated file on disk.
    #[default]
    File,
}

/// How the target directory changes over time.
///
/// The granularity is carried by the directory date pattern: a new directory
/// is used whenever the formatted date changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Autorotate {
    #[default]
    Hourly,
    Daily,
    /// Write straight into the base directory.
    None,
}

/// Size threshold at which a log file is spilled into the next index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSize {
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl RotationSize {
    /// Threshold in bytes.
    pub fn bytes(&self) -> u64 {
        match self {
            RotationSize::KB(kb) => kb.saturating_mul(1024),
            RotationSize::MB(mb) => mb.saturating_mul(1024 * 1024),
            RotationSize::GB(gb) => gb.saturating_mul(1024 * 1024 * 1024),
        }
    }
}

impl Default for RotationSize {
    fn default() -> Self {
        DEFAULT_SIZE
    }
}

/// Unvalidated logger configuration.
///
/// Fields are untyped so that configuration read from JSON (or any other
/// serde format) goes through the same validation as values set with the
/// builder methods: a `timestamp` of `"yes"` is not a boolean and falls back
/// to the default, exactly like a missing one.
///
/// # Examples
/// ```
/// use throwler::RawOptions;
///
/// let raw = RawOptions::new().output("file").autorotate("none").size("10K").levels(["warn", "error"]);
/// let raw = RawOptions::from_json_str(r#"{ "output": "console", "dirDateFormat": "YYYY-MM-DD" }"#).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawOptions {
    pub output: Option<Value>,
    pub timestamp: Option<Value>,
    pub autorotate: Option<Value>,
    pub dir_date_format: Option<Value>,
    pub date_format: Option<Value>,
    pub dir: Option<Value>,
    pub size: Option<Value>,
    pub levels: Option<Value>,
}

impl RawOptions {
    /// Empty configuration: every field resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of options.
    pub fn from_json_str(json: &str) -> Result<Self, ThrowlerError> {
        serde_json::from_str(json).map_err(|err| ThrowlerError::InvalidOptions(err.to_string()))
    }

    /// Set the output, `"console"` or `"file"`.
    pub fn output(self, output: impl Into<Value>) -> Self {
        Self {
            output: Some(output.into()),
            ..self
        }
    }

    /// Set whether entries carry a timestamp.
    pub fn timestamp(self, timestamp: impl Into<Value>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// Set the autorotate policy, `"hourly"`, `"daily"` or `"none"`.
    pub fn autorotate(self, autorotate: impl Into<Value>) -> Self {
        Self {
            autorotate: Some(autorotate.into()),
            ..self
        }
    }

    /// Set the date pattern of the rotated directory names.
    pub fn dir_date_format(self, dir_date_format: impl Into<Value>) -> Self {
        Self {
            dir_date_format: Some(dir_date_format.into()),
            ..self
        }
    }

    /// Set the date pattern of the file stems.
    pub fn date_format(self, date_format: impl Into<Value>) -> Self {
        Self {
            date_format: Some(date_format.into()),
            ..self
        }
    }

    /// Set the base directory.
    pub fn dir(self, dir: impl Into<Value>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..self
        }
    }

    /// Set the size threshold, e.g. `"10M"`.
    pub fn size(self, size: impl Into<Value>) -> Self {
        Self {
            size: Some(size.into()),
            ..self
        }
    }

    /// Set the allowed level names.
    pub fn levels<I, S>(self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: Some(Value::Array(
                levels.into_iter().map(|level| Value::String(level.into())).collect(),
            )),
            ..self
        }
    }

    /// Validate and fill in defaults. See [`resolve`].
    pub fn resolve(&self) -> Result<Options, ThrowlerError> {
        resolve(self)
    }
}

/// Resolved logger configuration. Every field holds a valid value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    output: Output,
    timestamp: bool,
    autorotate: Autorotate,
    dir_date_format: DatePattern,
    date_format: DatePattern,
    dir: PathBuf,
    size: RotationSize,
    levels: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            output: Output::default(),
            timestamp: true,
            autorotate: Autorotate::default(),
            dir_date_format: DatePattern::new(DEFAULT_DIR_DATE_FORMAT),
            date_format: DatePattern::new(DEFAULT_DATE_FORMAT),
            dir: PathBuf::from(DEFAULT_DIR),
            size: RotationSize::default(),
            levels: Vec::new(),
        }
    }
}

impl Options {
    pub fn output(&self) -> Output {
        self.output
    }

    pub fn timestamp(&self) -> bool {
        self.timestamp
    }

    pub fn autorotate(&self) -> Autorotate {
        self.autorotate
    }

    pub fn dir_date_format(&self) -> &DatePattern {
        &self.dir_date_format
    }

    pub fn date_format(&self) -> &DatePattern {
        &self.date_format
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn size(&self) -> RotationSize {
        self.size
    }

    /// Allowed level names, lowercased. Empty means no filtering.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// The rotation threshold in bytes.
    pub fn threshold_bytes(&self) -> u64 {
        self.size.bytes()
    }
}

/// Validate `raw` and substitute defaults for missing or invalid fields.
///
/// When `dir` is absent but its parent exists, the directory is created.
///
/// # Errors
/// * [`ThrowlerError::InvalidDirectory`] if `dir` exists and is a file.
/// * [`ThrowlerError::DirectoryNotFound`] if neither `dir` nor its parent exist.
/// * [`ThrowlerError::CreateDirectoryFailed`] if creating `dir` failed otherwise.
pub fn resolve(raw: &RawOptions) -> Result<Options, ThrowlerError> {
    let defaults = Options::default();

    let output = match matching_str(raw.output.as_ref(), OUTPUT_PATTERN)? {
        Some("console") => Output::Console,
        _ => defaults.output,
    };

    let timestamp = match raw.timestamp {
        Some(Value::Bool(timestamp)) => timestamp,
        _ => defaults.timestamp,
    };

    let autorotate = match matching_str(raw.autorotate.as_ref(), AUTOROTATE_PATTERN)? {
        Some("daily") => Autorotate::Daily,
        Some("none") => Autorotate::None,
        _ => defaults.autorotate,
    };

    let dir_date_format = matching_str(raw.dir_date_format.as_ref(), DIR_DATE_FORMAT_PATTERN)?
        .map(DatePattern::new)
        .unwrap_or(defaults.dir_date_format);

    let date_format = matching_str(raw.date_format.as_ref(), DATE_FORMAT_PATTERN)?
        .map(DatePattern::new)
        .unwrap_or(defaults.date_format);

    let dir = match raw.dir.as_ref() {
        Some(Value::String(dir)) if !dir.is_empty() => ensure_directory(Path::new(dir))?,
        _ => defaults.dir,
    };

    let size = parse_size(raw.size.as_ref())?.unwrap_or(defaults.size);

    let levels = parse_levels(raw.levels.as_ref())?;

    let options = Options {
        output,
        timestamp,
        autorotate,
        dir_date_format,
        date_format,
        dir,
        size,
        levels,
    };
    tracing::debug!(?options, "resolved logger options");
    Ok(options)
}

fn compile(pattern: &str) -> Result<Regex, ThrowlerError> {
    Regex::new(pattern).map_err(|err| ThrowlerError::InternalError(err.to_string()))
}

/// The string held by `value` if it is a string matching `pattern`.
fn matching_str<'a>(value: Option<&'a Value>, pattern: &str) -> Result<Option<&'a str>, ThrowlerError> {
    match value {
        Some(Value::String(s)) if compile(pattern)?.is_match(s) => Ok(Some(s.as_str())),
        _ => Ok(None),
    }
}

fn parse_size(value: Option<&Value>) -> Result<Option<RotationSize>, ThrowlerError> {
    let Some(Value::String(size)) = value else {
        return Ok(None);
    };
    let Some(captures) = compile(SIZE_PATTERN)?.captures(size) else {
        return Ok(None);
    };
    let Ok(magnitude) = captures[1].parse::<u64>() else {
        return Ok(None);
    };
    Ok(match captures[2].to_ascii_uppercase().as_str() {
        "K" => Some(RotationSize::KB(magnitude)),
        "M" => Some(RotationSize::MB(magnitude)),
        "G" => Some(RotationSize::GB(magnitude)),
        _ => None,
    })
}

/// Lowercased allow-list, or empty when `value` is not an array of
/// alphabetic names.
fn parse_levels(value: Option<&Value>) -> Result<Vec<String>, ThrowlerError> {
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    let pattern = compile(LEVEL_PATTERN)?;
    let mut levels = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(level) if pattern.is_match(level) => {
                let level = level.to_lowercase();
                if !levels.contains(&level) {
                    levels.push(level);
                }
            }
            _ => return Ok(Vec::new()),
        }
    }
    Ok(levels)
}

/// Check the configured base directory, creating it when only its parent
/// exists.
fn ensure_directory(dir: &Path) -> Result<PathBuf, ThrowlerError> {
    if dir.exists() {
        let is_file = fs::symlink_metadata(dir).map(|m| m.is_file()).unwrap_or(false);
        if is_file {
            return Err(ThrowlerError::InvalidDirectory(dir.to_path_buf()));
        }
        return Ok(dir.to_path_buf());
    }

    let parent = match dir.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Err(ThrowlerError::DirectoryNotFound(dir.to_path_buf())),
    };
    if !parent.exists() {
        return Err(ThrowlerError::DirectoryNotFound(dir.to_path_buf()));
    }

    match fs::create_dir(dir) {
        Ok(()) => Ok(dir.to_path_buf()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(dir.to_path_buf()),
        Err(err) => Err(ThrowlerError::CreateDirectoryFailed(dir.to_path_buf(), err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn empty_options_resolve_to_defaults() {
        let options = resolve(&RawOptions::new()).unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.output(), Output::File);
        assert!(options.timestamp());
        assert_eq!(options.autorotate(), Autorotate::Hourly);
        assert_eq!(options.dir_date_format().as_str(), "DD-MMMM-YYYY");
        assert_eq!(options.date_format().as_str(), "DD-MMMM-YYYYTHH");
        assert_eq!(options.dir(), Path::new("."));
        assert_eq!(options.threshold_bytes(), 10 * 1024 * 1024);
        assert!(options.levels().is_empty());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let raw = RawOptions::new()
            .output("other")
            .timestamp(1_700_000_000_000u64)
            .autorotate("yearly")
            .dir_date_format("")
            .date_format("")
            .dir(true)
            .size("l");
        assert_eq!(resolve(&raw).unwrap(), Options::default());
    }

    #[test]
    fn output_is_case_sensitive() {
        let options = resolve(&RawOptions::new().output("Console")).unwrap();
        assert_eq!(options.output(), Output::File);
        let options = resolve(&RawOptions::new().output("console")).unwrap();
        assert_eq!(options.output(), Output::Console);
    }

    #[test]
    fn timestamp_requires_a_boolean() {
        assert!(!resolve(&RawOptions::new().timestamp(false)).unwrap().timestamp());
        assert!(resolve(&RawOptions::new().timestamp("false")).unwrap().timestamp());
    }

    #[test]
    fn autorotate_values() {
        assert_eq!(
            resolve(&RawOptions::new().autorotate("daily")).unwrap().autorotate(),
            Autorotate::Daily
        );
        assert_eq!(
            resolve(&RawOptions::new().autorotate("none")).unwrap().autorotate(),
            Autorotate::None
        );
    }

    #[test]
    fn date_formats() {
        let options = resolve(&RawOptions::new().dir_date_format("YYYY/MM/DD").date_format("YYYY-MM-DDTHH")).unwrap();
        assert_eq!(options.dir_date_format().as_str(), "YYYY/MM/DD");
        assert_eq!(options.date_format().as_str(), "YYYY-MM-DDTHH");

        // `H` and `T` are stem tokens only.
        let options = resolve(&RawOptions::new().dir_date_format("YYYYTHH")).unwrap();
        assert_eq!(options.dir_date_format().as_str(), "DD-MMMM-YYYY");
        let options = resolve(&RawOptions::new().date_format("hh:mm")).unwrap();
        assert_eq!(options.date_format().as_str(), "DD-MMMM-YYYYTHH");
    }

    #[test]
    fn sizes() {
        assert_eq!(resolve(&RawOptions::new().size("10K")).unwrap().threshold_bytes(), 10 * 1024);
        assert_eq!(resolve(&RawOptions::new().size("3m")).unwrap().size(), RotationSize::MB(3));
        assert_eq!(
            resolve(&RawOptions::new().size("2G")).unwrap().threshold_bytes(),
            2 * 1024 * 1024 * 1024
        );
        for invalid in ["0K", "10", "K", "10T", "-1M", "1.5M"] {
            assert_eq!(
                resolve(&RawOptions::new().size(invalid)).unwrap().size(),
                RotationSize::MB(10),
                "{invalid}"
            );
        }
        assert_eq!(
            resolve(&RawOptions::new().size(99999999999999999999999u128.to_string() + "K"))
                .unwrap()
                .size(),
            RotationSize::MB(10)
        );
    }

    #[test]
    fn levels_are_lowercased_and_deduplicated() {
        let options = resolve(&RawOptions::new().levels(["Warn", "ERROR", "warn"])).unwrap();
        assert_eq!(options.levels(), ["warn", "error"]);
    }

    #[test]
    fn invalid_levels_disable_filtering() {
        let options = resolve(&RawOptions::new().levels(["warn", "not a level"])).unwrap();
        assert!(options.levels().is_empty());
        let raw = RawOptions {
            levels: Some(json!("warn")),
            ..RawOptions::default()
        };
        assert!(resolve(&raw).unwrap().levels().is_empty());
    }

    #[test]
    fn json_options() {
        let raw = RawOptions::from_json_str(
            r#"{ "output": "console", "timestamp": false, "dirDateFormat": "YYYY", "size": "1k", "levels": ["info"] }"#,
        )
        .unwrap();
        let options = raw.resolve().unwrap();
        assert_eq!(options.output(), Output::Console);
        assert!(!options.timestamp());
        assert_eq!(options.dir_date_format().as_str(), "YYYY");
        assert_eq!(options.threshold_bytes(), 1024);
        assert_eq!(options.levels(), ["info"]);
    }

    #[test]
    fn json_null_is_missing() {
        let raw = RawOptions::from_json_str(r#"{ "output": null }"#).unwrap();
        assert_eq!(raw.output, None);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = RawOptions::from_json_str("{ output").unwrap_err();
        assert_eq!(err.kind(), "InvalidOptions");
    }

    #[test]
    fn directory_that_is_a_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("app.log");
        fs::write(&file, b"").unwrap();
        let err = resolve(&RawOptions::new().dir(file.to_string_lossy().into_owned())).unwrap_err();
        assert!(matches!(err, ThrowlerError::InvalidDirectory(_)));
    }

    #[test]
    fn directory_without_parent_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("missing").join("logs");
        let err = resolve(&RawOptions::new().dir(dir.to_string_lossy().into_owned())).unwrap_err();
        assert!(matches!(err, ThrowlerError::DirectoryNotFound(_)));
        assert!(!dir.exists());
    }

    #[test]
    fn missing_directory_with_parent_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let options = resolve(&RawOptions::new().dir(dir.to_string_lossy().into_owned())).unwrap();
        assert!(dir.is_dir());
        assert_eq!(options.dir(), dir.as_path());
    }

    #[test]
    fn existing_directory_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let options = resolve(&RawOptions::new().dir(tmp.path().to_string_lossy().into_owned())).unwrap();
        assert_eq!(options.dir(), tmp.path());
    }
}
