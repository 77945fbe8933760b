//! Versioned target paths.
//!
//! Every publish lands at `<deploy location>/<module>-<YYYYMMDDHHmmss>.jar`,
//! next to the location the host would have used. Two publishes of the same
//! module within one wall-clock second get the same path.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::types::ModuleTree;

/// Extension of every published artifact, whatever the packaging strategy
pub const ARCHIVE_EXTENSION: &str = "jar";

/// Timestamp layout embedded in artifact names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of local wall-clock time for versioned names.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// `<name>-<YYYYMMDDHHmmss>.jar`
pub fn versioned_segment(module_name: &str, now: NaiveDateTime) -> String {
    format!(
        "{}-{}.{}",
        module_name,
        now.format(TIMESTAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Replace the last segment of `base_location` with a versioned name for the
/// leaf module of `tree`.
pub fn compute_target_path(tree: &ModuleTree, base_location: &Path, now: NaiveDateTime) -> PathBuf {
    let parent = base_location.parent().unwrap_or_else(|| Path::new(""));
    parent.join(versioned_segment(&tree.leaf().name, now))
}

/// Whether `segment` looks like `<module_name>-<14 digits>.jar`.
pub fn is_versioned_segment(segment: &str, module_name: &str) -> bool {
    let Some(rest) = segment.strip_prefix(module_name) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix('-') else {
        return false;
    };
    let Some(stamp) = rest.strip_suffix(&format!(".{}", ARCHIVE_EXTENSION)) else {
        return false;
    };
    stamp.len() == 14 && stamp.chars().all(|c| c.is_ascii_digit())
}
