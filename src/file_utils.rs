use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extension of Qt Linguist translation sources
pub const TS_EXTENSION: &str = "ts";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find `.ts` files in a directory, sorted by path.
    ///
    /// Only the top level is searched unless `recursive` is set.
    pub fn find_ts_files<P: AsRef<Path>>(dir: P, recursive: bool) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", dir));
        }

        let mut walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut result = Vec::new();
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if entry.file_type().is_file() && Self::is_ts_file(path) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    // @checks: Linguist source by extension
    pub fn is_ts_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(TS_EXTENSION))
            .unwrap_or(false)
    }

    // @checks: File written by an earlier run
    // @params: path, suffix ({lang} is replaced), target_languages
    //
    // True when the file stem ends with the output suffix for one of the
    // targets, with or without the `_<lang>` tag. An empty suffix matches nothing.
    pub fn is_translated_output<P: AsRef<Path>>(path: P, suffix: &str, target_languages: &[String]) -> bool {
        let stem = path.as_ref().file_stem().unwrap_or_default().to_string_lossy().to_string();

        let endings: Vec<String> = if suffix.contains("{lang}") {
            target_languages.iter().map(|lang| suffix.replace("{lang}", lang)).collect()
        } else {
            std::iter::once(suffix.to_string())
                .chain(target_languages.iter().map(|lang| format!("{}_{}", suffix, lang)))
                .collect()
        };

        endings.iter().any(|ending| !ending.is_empty() && stem.ends_with(ending.as_str()))
    }

    // @generates: Output file name for a translated file
    // @params: input_file, suffix ({lang} is replaced), target_language, tag_language
    //
    // With `tag_language` set and no `{lang}` in the suffix, `_<lang>` is appended
    // so several target languages never write to the same file.
    pub fn output_file_name<P: AsRef<Path>>(
        input_file: P,
        suffix: &str,
        target_language: &str,
        tag_language: bool,
    ) -> String {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy().to_string();

        let mut output_filename = stem;
        if suffix.contains("{lang}") {
            output_filename.push_str(&suffix.replace("{lang}", target_language));
        } else {
            output_filename.push_str(suffix);
            if tag_language {
                output_filename.push('_');
                output_filename.push_str(target_language);
            }
        }
        output_filename.push('.');
        output_filename.push_str(TS_EXTENSION);
        output_filename
    }

    // @generates: Output path next to the input, or inside output_dir
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: Option<&Path>,
        file_name: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let directory = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        directory.join(file_name)
    }

    // @generates: Output path mirroring the input tree under output_root
    pub fn mirrored_output_path<P: AsRef<Path>>(
        input_file: P,
        input_root: &Path,
        output_root: &Path,
        file_name: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let relative_dir = input_file
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        output_root.join(relative_dir).join(file_name)
    }
}
