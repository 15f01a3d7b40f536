pub mod catalog;
pub mod policies;
pub mod preferences;
pub mod profile;
pub mod records;
pub mod user;
