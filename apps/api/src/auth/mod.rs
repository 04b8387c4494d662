pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod validation;

pub use extractor::{AuthUser, JobSeeker, Recruiter};
