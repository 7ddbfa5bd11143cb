//! Archive naming and age/count based pruning
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, Months, NaiveDateTime, TimeDelta};
use tracing::{debug, info, warn};

use crate::config::{AgeUnit, RetentionConfig};

const ARCHIVE_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Pruning statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    pub expired: usize,
    pub over_limit: usize,
}

impl PruneStats {
    pub fn total(&self) -> usize {
        self.expired + self.over_limit
    }
}

/// Free archive path for a file rotated at `at`
///
/// `<base>.<YYYYmmdd-HHMMSS>.log`, with `-N` appended to the timestamp when
/// several rotations land in the same second.
pub fn archive_path(dir: &Path, base_name: &str, at: DateTime<Local>) -> PathBuf {
    let stamp = at.format(ARCHIVE_TIME_FORMAT).to_string();
    let mut candidate = dir.join(format!("{base_name}.{stamp}.log"));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{base_name}.{stamp}-{n}.log"));
        n += 1;
    }
    candidate
}

/// Whether `file_name` was produced by [`archive_path`] for `base_name`
pub fn is_archive(file_name: &str, base_name: &str) -> bool {
    file_name
        .strip_prefix(base_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".log"))
        .is_some_and(is_archive_stamp)
}

// "YYYYmmdd-HHMMSS"
const ARCHIVE_STAMP_LEN: usize = 15;

/// `YYYYmmdd-HHMMSS`, optionally followed by a `-N` collision suffix
fn is_archive_stamp(stamp: &str) -> bool {
    let (Some(time), Some(suffix)) = (stamp.get(..ARCHIVE_STAMP_LEN), stamp.get(ARCHIVE_STAMP_LEN..))
    else {
        return false;
    };
    if NaiveDateTime::parse_from_str(time, ARCHIVE_TIME_FORMAT).is_err() {
        return false;
    }

    match suffix.strip_prefix('-') {
        Some(n) => !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()),
        None => suffix.is_empty(),
    }
}

/// Oldest modification time an archive may have under `max_age` `unit`s
pub fn cutoff(now: DateTime<Local>, max_age: u32, unit: AgeUnit) -> Option<DateTime<Local>> {
    match unit {
        AgeUnit::Days => now.checked_sub_signed(TimeDelta::days(i64::from(max_age))),
        AgeUnit::Months => now.checked_sub_months(Months::new(max_age)),
        AgeUnit::Years => now.checked_sub_months(Months::new(max_age.saturating_mul(12))),
    }
}

struct Archive {
    path: PathBuf,
    modified: SystemTime,
}

/// Archives in `dir` for `base_name`, oldest first
pub fn list_archives(dir: &Path, base_name: &str) -> io::Result<Vec<PathBuf>> {
    Ok(scan(dir, base_name)?.into_iter().map(|a| a.path).collect())
}

fn scan(dir: &Path, base_name: &str) -> io::Result<Vec<Archive>> {
    let mut archives = Vec::new();

    for item in fs::read_dir(dir)? {
        let item = item?;
        let name = item.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_archive(name, base_name) {
            continue;
        }

        let meta = item.metadata()?;
        if !meta.is_file() {
            continue;
        }
        archives.push(Archive {
            path: item.path(),
            modified: meta.modified()?,
        });
    }

    archives.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(archives)
}

/// Delete archives older than the configured age, then trim to `max_archives`
///
/// A file that cannot be removed is reported and skipped.
pub fn prune_archives(
    dir: &Path,
    base_name: &str,
    retention: &RetentionConfig,
    now: DateTime<Local>,
) -> io::Result<PruneStats> {
    let mut stats = PruneStats::default();
    let mut archives = scan(dir, base_name)?;

    if let Some(cutoff) = cutoff(now, retention.max_age, retention.max_age_unit) {
        let cutoff = SystemTime::from(cutoff);
        archives.retain(|archive| {
            if archive.modified >= cutoff {
                return true;
            }
            if remove(&archive.path) {
                stats.expired += 1;
                false
            } else {
                true
            }
        });
    }

    if let Some(limit) = retention.max_archives {
        let excess = archives.len().saturating_sub(limit);
        for archive in archives.iter().take(excess) {
            if remove(&archive.path) {
                stats.over_limit += 1;
            }
        }
    }

    if stats.total() > 0 {
        info!(
            expired = stats.expired,
            over_limit = stats.over_limit,
            "Pruned log archives"
        );
    }
    Ok(stats)
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed archive");
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to remove archive");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap()
    }

    fn touch(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::from(fixed_now()) - age).unwrap();
        path
    }

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_archive_name_recognition() {
        assert!(is_archive("app.20260101-101010.log", "app"));
        assert!(is_archive("app.20260101-101010-3.log", "app"));
        assert!(!is_archive("app.log", "app"));
        assert!(!is_archive("app.notes.log", "app"));
        assert!(!is_archive("other.20260101-101010.log", "app"));
        assert!(!is_archive("app.20260101-101010.txt", "app"));
        assert!(!is_archive("app.---------------.log", "app"));
        assert!(!is_archive("app.20261340-000000.log", "app"));
        assert!(!is_archive("app.20260101-101010-.log", "app"));
        assert!(!is_archive("app.20260101-101010-3-4.log", "app"));
        assert!(!is_archive("app.20260101-1010101.log", "app"));
    }

    #[test]
    fn test_archive_path_avoids_collisions() {
        let temp = TempDir::new().unwrap();
        let at = fixed_now();

        let first = archive_path(temp.path(), "app", at);
        assert_eq!(first.file_name().unwrap(), "app.20260731-120000.log");
        File::create(&first).unwrap();

        let second = archive_path(temp.path(), "app", at);
        assert_eq!(second.file_name().unwrap(), "app.20260731-120000-1.log");
    }

    #[test]
    fn test_cutoff_uses_calendar_months() {
        let now = fixed_now();
        assert_eq!(
            cutoff(now, 1, AgeUnit::Months).unwrap(),
            Local.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
        );
        assert_eq!(
            cutoff(now, 1, AgeUnit::Years).unwrap(),
            Local.with_ymd_and_hms(2025, 7, 31, 12, 0, 0).unwrap()
        );
        assert_eq!(
            cutoff(now, 10, AgeUnit::Days).unwrap(),
            Local.with_ymd_and_hms(2026, 7, 21, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_prune_by_age() {
        let temp = TempDir::new().unwrap();
        let old = touch(temp.path(), "app.20250101-000000.log", 40 * DAY);
        let fresh = touch(temp.path(), "app.20260730-000000.log", DAY);
        let active = touch(temp.path(), "app.log", 400 * DAY);

        let retention = RetentionConfig {
            enabled: true,
            max_age: 30,
            max_age_unit: AgeUnit::Days,
            max_archives: None,
        };
        let stats = prune_archives(temp.path(), "app", &retention, fixed_now()).unwrap();

        assert_eq!(stats, PruneStats { expired: 1, over_limit: 0 });
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(active.exists());
    }

    #[test]
    fn test_prune_by_count_keeps_newest() {
        let temp = TempDir::new().unwrap();
        let names = [
            "app.20260721-000000.log",
            "app.20260722-000000.log",
            "app.20260723-000000.log",
            "app.20260724-000000.log",
        ];
        for (i, name) in names.iter().enumerate() {
            touch(temp.path(), name, (10 - i as u32) * DAY);
        }

        let retention = RetentionConfig {
            enabled: true,
            max_age: 1,
            max_age_unit: AgeUnit::Years,
            max_archives: Some(2),
        };
        let stats = prune_archives(temp.path(), "app", &retention, fixed_now()).unwrap();

        assert_eq!(stats.over_limit, 2);
        let left: Vec<_> = list_archives(temp.path(), "app")
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec![names[2], names[3]]);
    }
}
