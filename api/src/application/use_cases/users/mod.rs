pub mod create_user;
pub mod ensure_admin;
pub mod list_users;
pub mod reset_password;
pub mod update_user;

#[cfg(test)]
pub(crate) mod fakes;
