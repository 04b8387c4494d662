//! Timed assessments ("tests") attached to job postings.
//!
//! Recruiters author and publish tests in `handlers`; candidates take them
//! through `attempts`. Scheduling and grading are pure and live in their own
//! modules.

pub mod attempts;
pub mod grading;
pub mod handlers;
pub mod schedule;
