//! Memory and parentage parsing from `/proc/<pid>/stat`.
//!
//! `stat` carries everything a process record needs besides the name: the
//! parent pid (field 4), the virtual size in bytes (field 23) and the resident
//! set size in pages (field 24).

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

/// Get the system page size in bytes (usually 4096).
fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        // Returns -1 on error, handled by the > 0 check
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// System page size (for converting RSS pages to bytes).
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Fields extracted from one `/proc/<pid>/stat` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub comm: String,
    pub parent_pid: u32,
    pub virtual_bytes: u64,
    pub resident_bytes: u64,
}

/// Parses the content of `/proc/<pid>/stat`.
///
/// The command name sits in parentheses and may itself contain spaces or
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str, page_size: u64) -> Option<StatFields> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let comm = content[open + 1..close].to_string();

    // fields[0] is field 3 (state)
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if fields.len() <= 21 {
        return None;
    }

    let parent_pid: u32 = fields[1].parse().ok()?;
    let virtual_bytes: u64 = fields[20].parse().ok()?;
    // rss can be reported negative for some kernel threads
    let rss_pages: i64 = fields[21].parse().ok()?;

    Some(StatFields {
        comm,
        parent_pid,
        virtual_bytes,
        resident_bytes: (rss_pages.max(0) as u64).saturating_mul(page_size),
    })
}

/// Reads and parses `/proc/<pid>/stat` for the given process directory.
pub fn read_proc_stat(proc_path: &Path) -> Result<StatFields, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("stat"))?;
    parse_stat(&content, *PAGE_SIZE).ok_or_else(|| std::io::Error::other("Invalid stat format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1234 (my (weird) proc) S 987 1234 1234 0 -1 4194560 1500 0 0 0 \
                          12 5 0 0 20 0 4 0 34567 225280000 5120 18446744073709551615 \
                          1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";

    // -------------------------------------------------------------------------
    // Tests for parse_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_stat_fields() {
        let stat = parse_stat(SAMPLE, 4096).unwrap();
        assert_eq!(stat.comm, "my (weird) proc");
        assert_eq!(stat.parent_pid, 987);
        assert_eq!(stat.virtual_bytes, 225_280_000);
        assert_eq!(stat.resident_bytes, 5120 * 4096);
    }

    #[test]
    fn test_parse_stat_uses_page_size() {
        let stat = parse_stat(SAMPLE, 16384).unwrap();
        assert_eq!(stat.resident_bytes, 5120 * 16384);
    }

    #[test]
    fn test_parse_stat_invalid() {
        assert_eq!(parse_stat("", 4096), None);
        assert_eq!(parse_stat("1234 (short) S 1 2 3", 4096), None);
        assert_eq!(parse_stat("1234 no parens at all", 4096), None);
        assert_eq!(
            parse_stat(
                "1 (init) S x 1 1 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 5 100 10 0",
                4096
            ),
            None
        );
    }

    #[test]
    fn test_page_size_is_sane() {
        assert!(*PAGE_SIZE >= 4096);
        assert!(PAGE_SIZE.is_power_of_two());
    }
}
