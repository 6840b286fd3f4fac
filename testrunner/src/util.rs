use std::ffi::{OsStr, OsString};
use std::fs::DirEntry;
use std::io;
use std::path::Path;

/// Returns the paths of all `.js` files below `dir`, skipping the harness directory
pub fn get_all_files(dir: &OsStr, harness: &Path) -> io::Result<Vec<OsString>> {
    let mut ve = Vec::new();

    let read_dir = std::fs::read_dir(dir)?;

    for entry in read_dir {
        let entry: DirEntry = entry?;
        let path = entry.path();

        let ty = entry.file_type()?;
        if ty.is_file() && path.extension().is_some_and(|ext| ext == "js") {
            ve.push(path.into_os_string());
        } else if ty.is_dir() && !path.ends_with(harness.file_name().unwrap_or_default()) {
            let files = get_all_files(path.as_os_str(), harness)?;
            ve.extend(files);
        }
    }

    ve.sort();
    Ok(ve)
}
