//! Snapshot of running process image names for liveness polling.
//!
//! Platform-specific enumeration lives in `proc_table_linux.rs` and
//! `proc_table_windows.rs`. Comparison is case-insensitive exact match.

use std::collections::HashSet;

/// Lower-cased process image names captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSnapshot {
    names: HashSet<String>,
}

impl ProcessSnapshot {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Returns true if a process named `image_name` is running.
    pub fn contains(&self, image_name: &str) -> bool {
        !image_name.is_empty() && self.names.contains(&image_name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Source of process snapshots. Swappable for tests.
pub trait ProcessTable: Send + Sync {
    fn snapshot(&self) -> ProcessSnapshot;
}

/// Reads the host operating system's process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot::from_names(platform::process_names())
    }
}

#[cfg(target_os = "linux")]
use crate::proc_table_linux as platform;

#[cfg(target_os = "windows")]
use crate::proc_table_windows as platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod platform {
    pub(crate) fn process_names() -> Vec<String> {
        tracing::debug!("process enumeration not supported on this platform");
        Vec::new()
    }
}
