pub mod auth;
pub mod dashboard;
pub mod evidence;
pub mod records;
pub mod users;
