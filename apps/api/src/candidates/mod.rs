pub mod dates;
pub mod handlers;
pub mod profile;
