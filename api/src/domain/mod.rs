pub mod evidence;
pub mod organization;
pub mod paging;
pub mod planning;
pub mod territory;
pub mod users;
pub mod validation;
