//! Steam's own per-app playtime from each account's `localconfig.vdf`.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::paths::Paths;
use crate::vdf::{self, Object, Value};

/// Reads playtime minutes keyed by app id for every local account.
///
/// Accounts without a readable `localconfig.vdf` are skipped. When several
/// accounts played the same app, the largest value wins.
pub fn read_playtime(paths: &Paths) -> HashMap<u32, u64> {
    let accounts = match paths.account_ids() {
        Ok(ids) => ids,
        Err(e) => {
            debug!(error = %e, "no steam users for playtime");
            return HashMap::new();
        }
    };

    let mut minutes = HashMap::new();
    for account in &accounts {
        let path = paths.local_config_path(account);
        if !path.is_file() {
            continue;
        }
        match vdf::load(&path) {
            Ok(root) => {
                for (app_id, mins) in parse_playtime(&root) {
                    let slot = minutes.entry(app_id).or_insert(0);
                    *slot = (*slot).max(mins);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read localconfig.vdf"),
        }
    }

    info!(apps = minutes.len(), "steam playtime loaded");
    minutes
}

/// Collects every `"<appid>" { "Playtime" "<minutes>" }` entry in the tree.
pub fn parse_playtime(root: &Object) -> HashMap<u32, u64> {
    let mut out = HashMap::new();
    collect(root, &mut out);
    out
}

fn collect(obj: &Object, out: &mut HashMap<u32, u64>) {
    for (key, value) in obj.iter() {
        let Value::Object(child) = value else {
            continue;
        };
        if let Ok(app_id) = key.parse::<u32>() {
            if let Some(mins) = child.get_str("Playtime").and_then(|s| s.trim().parse().ok()) {
                out.insert(app_id, mins);
                continue;
            }
        }
        collect(child, out);
    }
}
