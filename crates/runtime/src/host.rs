//! Host process inspection.
//!
//! The League client owns the lockfile and the RPC service; everything here
//! answers two questions about it: is it running, and where is it installed.
//! Process-table lookups are deliberately used for liveness instead of
//! failed HTTP calls, so a momentary transport hiccup is never mistaken for
//! the client exiting.

use std::path::PathBuf;

use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Executable name of the LCU UX process that writes the lockfile.
pub const HOST_PROCESS_NAME: &str = "LeagueClientUx";

fn process_table() -> System {
    System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new()),
    )
}

/// Returns `true` while the League client process is in the process table.
pub fn host_is_running() -> bool {
    process_table()
        .processes_by_name(HOST_PROCESS_NAME)
        .next()
        .is_some()
}

/// Install directories derived from running client processes.
///
/// Each entry is the parent directory of a live `LeagueClientUx` executable;
/// the lockfile sits next to the executable. Empty when the client isn't
/// running or its executable path can't be read.
pub fn host_install_dirs() -> Vec<PathBuf> {
    let table = process_table();
    let mut dirs: Vec<PathBuf> = table
        .processes_by_name(HOST_PROCESS_NAME)
        .filter_map(|process| Some(process.exe()?.parent()?.to_path_buf()))
        .collect();
    dirs.dedup();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_check_does_not_panic_without_host() {
        // The League client won't be running on CI; we only assert the call
        // completes and the two probes agree with each other.
        let running = host_is_running();
        let dirs = host_install_dirs();
        if !running {
            assert!(dirs.is_empty());
        }
    }
}
