// src/store.rs
//! Whole-file JSON persistence: write to a sibling temp file, then rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(std::io::Error::from)?;
    let tmp = tmp_path(path);
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    f.write_all(b"\n")?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("state").join("ids.json");
        write_json_atomic(&p, &vec!["a", "b"]).unwrap();
        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&p).unwrap()).unwrap();
        assert_eq!(back, vec!["a", "b"]);
        assert!(!dir.path().join("state").join("ids.json.tmp").exists());
    }
}
