pub mod catalog;
pub mod choices;
pub mod forms;
pub mod handlers;
pub mod lookup;
pub mod policies;
pub mod preferences;
pub mod profile;
pub mod records;
pub mod slug;
pub mod ssn;
pub mod users;
pub mod validation;
