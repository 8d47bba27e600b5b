//! Constants used throughout the core crate.

/// Titles of the intake wizard steps, in order.
pub const STEP_TITLES: [&str; 8] = [
    "Application Info",
    "Patient Info",
    "Test Monitoring",
    "Treatment History",
    "TB History",
    "ART Interruptions",
    "Adherence",
    "Review",
];

/// Index of the ART interruptions step, the only gated step.
pub const INTERRUPTIONS_STEP: usize = 5;

/// Message shown when the interruptions step refuses to advance.
pub const INTERRUPTIONS_INCOMPLETE: &str =
    "Please complete the Date Stopped and Reason for Stopping fields for all ART interruptions.";

/// Index of the final step, from which the draft is submitted.
pub const REVIEW_STEP: usize = STEP_TITLES.len() - 1;

/// Minimum number of reviewers per application when none is configured.
pub const DEFAULT_MIN_REVIEWERS: usize = 2;

/// Number of prior draft versions kept for undo when none is configured.
pub const DEFAULT_UNDO_DEPTH: usize = 32;

/// Environment variable names read by the embedding application at startup.
pub const ENV_MIN_REVIEWERS: &str = "DRT_MIN_REVIEWERS";
pub const ENV_DISPATCH_POLICY: &str = "DRT_DISPATCH_POLICY";
pub const ENV_UNDO_DEPTH: &str = "DRT_UNDO_DEPTH";
