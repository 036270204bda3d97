pub mod download_evidence;
pub mod list_evidence;
pub mod set_evidence_active;
pub mod upload_evidence;

#[cfg(test)]
pub(crate) mod fakes;
