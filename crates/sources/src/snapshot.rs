//! Live process snapshot from `/proc`
//!
//! Provides a point-in-time list of all processes as records with the fields
//! `pid`, `ppid`, `path`, `cmd` and `time` (creation time in epoch seconds).

use crate::error::{SourceError, SourceResult};
use ptree_core::{FieldValue, Record};

/// Field names produced by [`snapshot_processes`]
pub mod fields {
    pub const PID: &str = "pid";
    pub const PPID: &str = "ppid";
    pub const PATH: &str = "path";
    pub const CMD: &str = "cmd";
    pub const TIME: &str = "time";
}

/// A process entry read from `/proc/<pid>`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcEntry {
    pub pid: u32,
    pub ppid: u32,
    /// Executable path, or the short command name when `exe` is unreadable
    pub path: String,
    pub cmdline: String,
    /// Start time in seconds since the epoch, if boot time is known
    pub start_time: Option<f64>,
}

impl ProcEntry {
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert(fields::PID.to_string(), FieldValue::Integer(self.pid.into()));
        record.insert(fields::PPID.to_string(), FieldValue::Integer(self.ppid.into()));
        record.insert(fields::PATH.to_string(), FieldValue::Text(self.path));
        record.insert(fields::CMD.to_string(), FieldValue::Text(self.cmdline));
        record.insert(
            fields::TIME.to_string(),
            self.start_time.map_or(FieldValue::Null, FieldValue::Float),
        );
        record
    }
}

/// Fields of `/proc/<pid>/stat` that the snapshot needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub comm: String,
    pub ppid: u32,
    /// Start time in clock ticks since boot
    pub start_ticks: u64,
}

/// Parse `/proc/<pid>/stat`; `comm` may itself contain spaces and parentheses
pub fn parse_stat(stat: &str) -> Option<StatFields> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let comm = stat.get(open + 1..close)?.to_string();
    // Fields after ")": state(3) ppid(4) ... starttime(22)
    let rest: Vec<&str> = stat.get(close + 1..)?.split_whitespace().collect();
    let ppid = rest.get(1)?.parse().ok()?;
    let start_ticks = rest.get(19)?.parse().ok()?;
    Some(StatFields {
        comm,
        ppid,
        start_ticks,
    })
}

/// Read boot time (`btime`) from the contents of `/proc/stat`
pub fn parse_boot_time(proc_stat: &str) -> Option<u64> {
    proc_stat
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|v| v.trim().parse().ok())
}

/// Join a NUL-separated `/proc/<pid>/cmdline`
pub fn parse_cmdline(raw: &[u8]) -> String {
    raw.split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(target_os = "linux")]
mod imp {
    use super::*;
    use std::fs;
    use std::path::Path;

    /// Standard userspace tick rate, used when sysconf cannot report one
    const DEFAULT_USER_HZ: f64 = 100.0;

    /// Clock ticks per second used by `/proc/<pid>/stat` start times
    pub fn clock_ticks() -> f64 {
        // SAFETY: sysconf has no preconditions and only reads configuration
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if ticks > 0 {
            ticks as f64
        } else {
            DEFAULT_USER_HZ
        }
    }

    pub fn snapshot_processes() -> SourceResult<Vec<Record>> {
        let proc_root = Path::new("/proc");
        let boot_time = fs::read_to_string(proc_root.join("stat"))
            .ok()
            .as_deref()
            .and_then(parse_boot_time);
        let hz = clock_ticks();

        let mut records = Vec::new();
        let dir = fs::read_dir(proc_root).map_err(|e| SourceError::io(proc_root, e))?;
        for entry in dir.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
                continue;
            };
            // Processes may exit while we scan
            match read_entry(&entry.path(), pid, boot_time, hz) {
                Some(proc_entry) => records.push(proc_entry.into_record()),
                None => log::debug!("pid {} vanished during snapshot", pid),
            }
        }
        log::debug!("snapshot captured {} processes", records.len());
        Ok(records)
    }

    fn read_entry(dir: &Path, pid: u32, boot_time: Option<u64>, hz: f64) -> Option<ProcEntry> {
        let stat = parse_stat(&fs::read_to_string(dir.join("stat")).ok()?)?;
        let path = fs::read_link(dir.join("exe"))
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| stat.comm.clone());
        let cmdline = fs::read(dir.join("cmdline"))
            .map(|raw| parse_cmdline(&raw))
            .unwrap_or_default();
        let start_time = boot_time.map(|boot| boot as f64 + stat.start_ticks as f64 / hz);
        Some(ProcEntry {
            pid,
            ppid: stat.ppid,
            path,
            cmdline,
            start_time,
        })
    }
}

/// Capture every running process as a record
#[cfg(target_os = "linux")]
pub fn snapshot_processes() -> SourceResult<Vec<Record>> {
    imp::snapshot_processes()
}

// Stub for other platforms
#[cfg(not(target_os = "linux"))]
pub fn snapshot_processes() -> SourceResult<Vec<Record>> {
    Err(SourceError::Unsupported("Live process snapshot"))
}
