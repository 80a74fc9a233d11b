//! Windows process enumeration via `tasklist`.

use std::process::Command;

/// Returns the image name of every running process.
pub(crate) fn process_names() -> Vec<String> {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let output = Command::new("tasklist")
        .args(["/FO", "CSV", "/NH"])
        .creation_flags(CREATE_NO_WINDOW)
        .output();

    match output {
        Ok(o) if o.status.success() => parse_tasklist_csv(&String::from_utf8_lossy(&o.stdout)),
        Ok(o) => {
            tracing::warn!(code = ?o.status.code(), "tasklist returned non-zero");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to run tasklist");
            Vec::new()
        }
    }
}

/// Extracts the first CSV column (`"Image Name"`) from tasklist output.
pub(crate) fn parse_tasklist_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix('"')?;
            let end = rest.find('"')?;
            Some(rest[..end].to_string())
        })
        .filter(|name| !name.is_empty())
        .collect()
}
