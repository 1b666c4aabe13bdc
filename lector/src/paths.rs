//! Derived file names for outputs, checkpoints and logs.

use std::path::{Path, PathBuf};

/// Files a run reads and writes, derived from the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub log: PathBuf,
}

impl RunPaths {
    /// `<stem><suffix>.<extension>`, `<stem>_checkpoint.json` and
    /// `<stem>_process.log` in `output_dir`, or next to the input.
    pub fn derive(input: &Path, output_dir: Option<&Path>, suffix: &str, extension: &str) -> Self {
        let stem = file_stem(input);
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        Self {
            input: input.to_path_buf(),
            output: dir.join(format!("{}{}.{}", stem, suffix, extension)),
            checkpoint: dir.join(format!("{}_checkpoint.json", stem)),
            log: dir.join(format!("{}_process.log", stem)),
        }
    }
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// `path` if it does not exist yet, otherwise the first free
/// `<stem>(n).<ext>` for n = 1, 2, …
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = file_stem(path);
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|counter| path.with_file_name(format!("{}({}){}", stem, counter, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
