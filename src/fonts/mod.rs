//! Font discovery for the PDF renderer.
//!
//! The Roboto family is looked up in `USABILITY_REPORT_FONTS_DIR`, next to the
//! running executable, and under this crate's `assets/fonts`.  When none of
//! those hold the four font files, Arial is loaded from the Windows font
//! directory instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Directory searched first for the bundled fonts.
pub const FONTS_DIR_VAR: &str = "USABILITY_REPORT_FONTS_DIR";

/// Overrides the directory the Windows fallback fonts are loaded from.
pub const WINDOWS_FONTS_DIR_VAR: &str = "USABILITY_REPORT_WINDOWS_FONTS_DIR";

const ROBOTO_FILES: [&str; 4] = [
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

const FALLBACK_FAMILY_NAME: &str = "Arial";

// regular, bold, italic, bold italic
const ARIAL_FILES: [&str; 4] = ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn not_found(message: String, detail: &str) -> Error {
    Error::new(message, io::Error::new(io::ErrorKind::NotFound, detail.to_string()))
}

fn search_directories() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_VAR) {
        push(path);
    }
    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        push(bin_dir.join("assets/fonts"));
    }
    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    candidates
}

/// Checks `directory` for the Roboto files, describing what is wrong if any
/// is missing.
fn inspect_directory(directory: &Path) -> Result<(), String> {
    if !directory.is_dir() {
        return Err("directory missing".to_string());
    }
    let missing: Vec<&str> = ROBOTO_FILES
        .iter()
        .copied()
        .filter(|name| !directory.join(name).is_file())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing files [{}]", missing.join(", ")))
    }
}

fn bundled_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();
    for candidate in search_directories() {
        match inspect_directory(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(reason) => attempts.push(format!("{} ({})", candidate.display(), reason)),
        }
    }

    Err(not_found(
        format!(
            "Unable to locate the {} fonts. Checked: {}. See assets/fonts/README.md or set {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_VAR
        ),
        "bundled fonts directory not found",
    ))
}

fn load_bundled_family() -> Result<FontFamily<FontData>, Error> {
    let directory = bundled_font_directory()?;
    debug!("Loading {} fonts from {}", DEFAULT_FONT_FAMILY_NAME, directory.display());
    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_VAR) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(candidate) = env_path(var).map(|root| root.join("Fonts")) {
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn load_fallback_font(directory: &Path, file: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!("Failed to load fallback font {}: {}", path.display(), err),
            io::Error::new(kind, err.to_string()),
        )
    })
}

fn load_fallback_family() -> Result<FontFamily<FontData>, Error> {
    let directory = windows_font_directory().ok_or_else(|| {
        not_found(
            format!("No {} fallback directory configured", FALLBACK_FAMILY_NAME),
            "windows fonts directory not found",
        )
    })?;

    let [regular, bold, italic, bold_italic] = ARIAL_FILES;
    Ok(FontFamily {
        regular: load_fallback_font(&directory, regular)?,
        bold: load_fallback_font(&directory, bold)?,
        italic: load_fallback_font(&directory, italic)?,
        bold_italic: load_fallback_font(&directory, bold_italic)?,
    })
}

fn is_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if matches!(io_err.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
    )
}

/// Loads the Roboto family, falling back to Windows Arial when the bundled
/// fonts cannot be found.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let err = match load_bundled_family() {
        Ok(family) => return Ok(family),
        Err(err) if is_missing(&err) => err,
        Err(err) => return Err(err),
    };

    match load_fallback_family() {
        Ok(family) => {
            warn!(
                "{} fonts unavailable ({}); using the '{}' family instead",
                DEFAULT_FONT_FAMILY_NAME, err, FALLBACK_FAMILY_NAME
            );
            Ok(family)
        }
        Err(fallback_err) => {
            warn!(
                "{} fonts unavailable ({}); {} fallback failed: {}",
                DEFAULT_FONT_FAMILY_NAME, err, FALLBACK_FAMILY_NAME, fallback_err
            );
            Err(not_found(
                format!("No usable fonts: {}", fallback_err),
                "default fonts are not available",
            ))
        }
    }
}

/// Whether the bundled Roboto family can be found on disk.
pub fn default_fonts_available() -> bool {
    bundled_font_directory().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_reports_missing_directory() {
        let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("no-such-fonts-dir");
        assert_eq!(
            inspect_directory(&missing),
            Err("directory missing".to_string())
        );
    }

    #[test]
    fn inspect_lists_missing_files() {
        let directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
        let reason = inspect_directory(&directory).unwrap_err();
        assert!(reason.starts_with("missing files ["));
        assert!(reason.contains("Roboto-Regular.ttf"));
    }

    #[test]
    fn manifest_assets_are_always_searched() {
        let expected = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        assert!(search_directories().contains(&expected));
    }
}
