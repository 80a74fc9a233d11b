//! Linux process enumeration via procfs.

use std::path::Path;

/// Returns the image name of every process visible in `/proc`.
pub(crate) fn process_names() -> Vec<String> {
    process_names_in(Path::new("/proc"))
}

pub(crate) fn process_names_in(proc_root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(proc_root) else {
        tracing::warn!(path = %proc_root.display(), "cannot read process table");
        return Vec::new();
    };

    let mut names = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name.is_empty() || !file_name.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Some(name) = image_name(&entry.path()) {
            names.push(name);
        }
    }
    names
}

/// Basename of argv[0], falling back to `comm` for kernel threads and
/// processes with an empty command line.
fn image_name(pid_dir: &Path) -> Option<String> {
    if let Ok(cmdline) = std::fs::read(pid_dir.join("cmdline")) {
        let argv0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
        if !argv0.is_empty() {
            let argv0 = String::from_utf8_lossy(argv0);
            let base = argv0.rsplit(['/', '\\']).next().unwrap_or_default();
            if !base.is_empty() {
                return Some(base.to_string());
            }
        }
    }

    std::fs::read_to_string(pid_dir.join("comm"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
