//! Status vocabularies reported by Docker Compose.
//!
//! Compose prints free-form status words. These sets are what the parsers
//! and the change helpers know how to interpret; anything else is passed
//! through untouched.

/// Statuses of a finished resource transition.
pub const STATUS_DONE: &[&str] = &[
    "Started",
    "Healthy",
    "Exited",
    "Restarted",
    "Running",
    "Created",
    "Stopped",
    "Killed",
    "Removed",
    // containers only
    "Recreated",
    // pull events
    "Pulled",
    // build events
    "Built",
];

/// Statuses of a transition in progress. Seeing one of these means Compose
/// changed something.
pub const STATUS_WORKING: &[&str] = &[
    "Creating",
    "Starting",
    "Restarting",
    "Stopping",
    "Killing",
    "Removing",
    // containers only
    "Recreate",
    // pull events
    "Pulling",
    // build events
    "Building",
];

/// Service pull statuses.
pub const STATUS_PULL: &[&str] = &["Pulled", "Pulling"];

/// Service build statuses.
pub const STATUS_BUILD: &[&str] = &["Built", "Building"];

/// Error status.
pub const STATUS_ERROR: &str = "Error";

/// Warning status.
pub const STATUS_WARNING: &str = "Warning";

/// Waiting status (dependency or healthcheck wait).
pub const STATUS_WAITING: &str = "Waiting";

/// Skipped status (pull skipped for a service).
pub const STATUS_SKIPPED: &str = "Skipped";

/// Generic progress states used by the JSON progress writer of newer
/// Compose releases next to a more specific `text`.
pub const PROGRESS_WORKING: &str = "Working";
pub const PROGRESS_DONE: &str = "Done";

/// Layer statuses of a finished pull.
pub const PULL_PROGRESS_DONE: &[&str] = &["Already exists", "Download complete", "Pull complete"];

/// Layer statuses of a pull in progress.
pub const PULL_PROGRESS_WORKING: &[&str] = &[
    "Pulling fs layer",
    "Waiting",
    "Downloading",
    "Verifying Checksum",
    "Extracting",
];

pub fn is_done(status: &str) -> bool {
    STATUS_DONE.contains(&status)
}

pub fn is_working(status: &str) -> bool {
    STATUS_WORKING.contains(&status)
}

pub fn is_pull(status: &str) -> bool {
    STATUS_PULL.contains(&status)
}

pub fn is_build(status: &str) -> bool {
    STATUS_BUILD.contains(&status)
}

pub fn is_error(status: &str) -> bool {
    status == STATUS_ERROR
}

pub fn is_warning(status: &str) -> bool {
    status == STATUS_WARNING
}

/// Any status the parsers recognize as a resource lifecycle status.
pub fn is_known(status: &str) -> bool {
    is_done(status) || is_working(status) || is_error(status) || status == STATUS_WAITING
}

/// [`is_known`] plus `Warning`.
pub fn is_known_or_warning(status: &str) -> bool {
    is_known(status) || is_warning(status)
}

pub fn is_pull_progress_done(status: &str) -> bool {
    PULL_PROGRESS_DONE.contains(&status)
}

pub fn is_pull_progress_working(status: &str) -> bool {
    PULL_PROGRESS_WORKING.contains(&status)
}

pub fn is_pull_progress(status: &str) -> bool {
    is_pull_progress_done(status) || is_pull_progress_working(status)
}

/// `Working` or `Done`.
pub fn is_generic_progress(status: &str) -> bool {
    status == PROGRESS_WORKING || status == PROGRESS_DONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_and_build_are_lifecycle_statuses() {
        for status in STATUS_PULL.iter().chain(STATUS_BUILD) {
            assert!(is_known(status), "{status} should be known");
        }
    }

    #[test]
    fn test_waiting_is_both_lifecycle_and_layer_status() {
        assert!(is_known("Waiting"));
        assert!(is_pull_progress_working("Waiting"));
        assert!(!is_working("Waiting"));
    }

    #[test]
    fn test_warning_only_known_with_warning() {
        assert!(!is_known("Warning"));
        assert!(is_known_or_warning("Warning"));
        assert!(!is_known_or_warning("Working"));
    }

    #[test]
    fn test_layer_statuses() {
        assert!(is_pull_progress("Pull complete"));
        assert!(is_pull_progress("Verifying Checksum"));
        assert!(!is_pull_progress("Pulled"));
    }
}
