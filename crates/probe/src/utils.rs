use crate::host::DiskUsage;
use std::path::Path;

/// Percentage of `used` over `total`, zero when `total` is zero.
///
/// ```
/// # use probe::utils::percent;
/// assert_eq!(percent(1, 4), 25.0);
/// assert_eq!(percent(5, 0), 0.0);
/// ```
#[inline]
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// Pick the filesystem reported as "the disk": the one mounted at `/`, or
/// the largest one when there is no root mount (e.g. on Windows).
pub fn select_root_disk(disks: &[DiskUsage]) -> Option<&DiskUsage> {
    disks
        .iter()
        .find(|disk| disk.mount_point == Path::new("/"))
        .or_else(|| disks.iter().max_by_key(|disk| disk.total))
}

/// Check that a service name can be handed to `systemctl` as a unit name.
///
/// Names must not look like an option and may only contain the characters
/// systemd allows in unit names.
///
/// ```
/// # use probe::utils::is_valid_unit_name;
/// assert!(is_valid_unit_name("nginx"));
/// assert!(is_valid_unit_name("getty@tty1.service"));
/// assert!(!is_valid_unit_name("--now"));
/// assert!(!is_valid_unit_name("a b"));
/// ```
#[inline]
pub fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 256
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.' | '@' | '\\'))
}
