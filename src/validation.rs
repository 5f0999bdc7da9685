//! Input file validation.
//!
//! Checks that run before any FFmpeg work: the concatenator refuses files
//! that are missing or whose extension is not a known video container.
//!
//! # Example
//!
//! ```
//! use vidkit::validation::has_supported_extension;
//!
//! assert!(has_supported_extension("holiday.MKV"));
//! assert!(!has_supported_extension("notes.txt"));
//! ```

use std::path::Path;

use crate::error::VidkitError;

/// Container extensions accepted by the concatenator, lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 14] = [
    "mp4", "avi", "mkv", "mov", "flv", "wmv", "webm", "mpg", "mpeg", "3gp", "ts", "vob", "ogv",
    "rmvb",
];

/// Whether `path` ends in one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn has_supported_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(extension))
        })
}

/// Check every input in order, stopping at the first problem.
///
/// # Errors
///
/// - [`VidkitError::InvalidInput`] for an empty list.
/// - [`VidkitError::FileOpen`] for a path that does not exist.
/// - [`VidkitError::UnsupportedExtension`] for an unknown extension.
pub fn validate_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<(), VidkitError> {
    if paths.is_empty() {
        return Err(VidkitError::InvalidInput(
            "at least one input video is required".to_string(),
        ));
    }

    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VidkitError::FileOpen {
                path: path.to_path_buf(),
                reason: format!("The file '{}' does not exist.", path.display()),
            });
        }
        if !has_supported_extension(path) {
            return Err(VidkitError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
    }

    log::debug!("Validated {} input(s)", paths.len());
    Ok(())
}
