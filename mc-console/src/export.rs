use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Fixed export target, written into the working directory.
pub const EXPORT_FILENAME: &str = "mc_console_log.txt";

/// Saves the pane's full text under the fixed filename.
pub fn export_log(text: &str) -> io::Result<PathBuf> {
    export_log_to(Path::new("."), text)
}

pub fn export_log_to(dir: &Path, text: &str) -> io::Result<PathBuf> {
    let path = dir.join(EXPORT_FILENAME);
    fs::write(&path, text)?;
    Ok(path)
}
