pub mod get_record;
pub mod list_records;
pub mod save_record;
pub mod set_record_active;

#[cfg(test)]
pub(crate) mod fakes;
