//! Atomic document replacement inside a capability directory.
//!
//! A document is written to a hidden sibling temp file, synced, then renamed
//! over the target, so readers see either the old or the new contents.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` in `dir` with `contents`.
///
/// `file_name` must be a bare file name; the temp file is removed again if
/// any step fails.
pub(super) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let tmp_name = temp_name_for(file_name);
    let written =
        write_temp(dir, &tmp_name, contents).and_then(|()| replace(dir, &tmp_name, file_name));
    if let Err(err) = written {
        discard(dir, &tmp_name);
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

fn temp_name_for(file_name: &str) -> String {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    format!(".{file_name}.tmp.{}.{nanos}.{counter}", std::process::id())
}

fn write_temp(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn replace(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, tmp_name: &str, target: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target)
}

fn discard(dir: &Dir, tmp_name: &str) {
    if dir.remove_file(tmp_name).is_err() {
        // Already gone or never created.
    }
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Best effort; not every platform can sync a directory handle.
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::test_support::temp_data_dir;
    use cap_std::ambient_authority;
    use rstest::rstest;

    fn open(path: &std::path::Path) -> Dir {
        Dir::open_ambient_dir(path, ambient_authority()).expect("open temp dir")
    }

    #[rstest]
    fn replaces_existing_contents_without_leftovers() {
        let tmp = temp_data_dir();
        let dir = open(tmp.path());
        write_atomic(&dir, "posts.json", "[]").expect("first write");
        write_atomic(&dir, "posts.json", "[1]").expect("second write");

        assert_eq!(dir.read_to_string("posts.json").expect("read back"), "[1]");
        let names: Vec<String> = dir
            .entries()
            .expect("list dir")
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        assert_eq!(names, vec!["posts.json".to_owned()]);
    }

    #[rstest]
    fn temp_names_are_unique_and_hidden() {
        let first = temp_name_for("users.json");
        let second = temp_name_for("users.json");
        assert_ne!(first, second);
        assert!(first.starts_with(".users.json.tmp."));
    }
}
