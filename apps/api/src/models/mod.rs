//! Row types and the string-backed enums stored in TEXT columns.
//!
//! Status-like columns are kept as `String` on the row structs and converted at
//! the edges through the enums below, so a new value in the database never
//! breaks decoding of old rows.

pub mod application;
pub mod assessment;
pub mod candidate;
pub mod company;
pub mod job;
pub mod notification;
pub mod user;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an enum whose variants map one-to-one onto fixed strings.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "Invalid {} '{}'. Expected one of: {}",
                        stringify!($name),
                        other,
                        $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Account type chosen at registration.
    Role {
        JobSeeker => "job_seeker",
        Recruiter => "recruiter",
    }
);

text_enum!(JobStatus {
    Open => "open",
    Closed => "closed",
    Deleted => "deleted",
});

text_enum!(ExperienceLevel {
    Fresher => "Fresher",
    Junior => "Junior",
    Mid => "Mid",
    Senior => "Senior",
    Lead => "Lead",
});

text_enum!(
    /// Input type of a screening question on a job posting.
    QuestionType {
        Text => "text",
        Number => "number",
        Boolean => "boolean",
        Dropdown => "dropdown",
    }
);

text_enum!(ApplicationStatus {
    Applied => "applied",
    Shortlisted => "shortlisted",
    Interview => "interview",
    Rejected => "rejected",
    Hired => "hired",
});

text_enum!(
    /// Assessment progress as tracked on the application row.
    ApplicationTestStatus {
        NotAssigned => "not_assigned",
        Pending => "pending",
        Completed => "completed",
    }
);

text_enum!(TestStatus {
    Draft => "draft",
    Published => "published",
    Closed => "closed",
});

text_enum!(AttemptStatus {
    InProgress => "in_progress",
    Submitted => "submitted",
    Evaluated => "evaluated",
});

text_enum!(AssessmentQuestionType {
    Objective => "objective",
    Descriptive => "descriptive",
});

impl Role {
    /// Maps the sign-up intent (`job` / `employee`) onto an account role.
    pub fn from_intent(intent: &str) -> Option<Role> {
        match intent {
            "job" => Some(Role::JobSeeker),
            "employee" => Some(Role::Recruiter),
            _ => None,
        }
    }
}

impl AttemptStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, AttemptStatus::Submitted | AttemptStatus::Evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_text() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>(), Ok(*status));
        }
        assert_eq!("Senior".parse::<ExperienceLevel>(), Ok(ExperienceLevel::Senior));
    }

    #[test]
    fn test_unknown_value_lists_choices() {
        let err = "archived".parse::<JobStatus>().unwrap_err();
        assert!(err.contains("open, closed, deleted"), "{err}");
    }

    #[test]
    fn test_intent_mapping() {
        assert_eq!(Role::from_intent("job"), Some(Role::JobSeeker));
        assert_eq!(Role::from_intent("employee"), Some(Role::Recruiter));
        assert_eq!(Role::from_intent("admin"), None);
    }

    #[test]
    fn test_serde_uses_column_text() {
        assert_eq!(
            serde_json::to_string(&AttemptStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!(AttemptStatus::Evaluated.is_finished());
        assert!(!AttemptStatus::InProgress.is_finished());
    }
}
