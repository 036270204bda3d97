use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv", "txt",
    "zip",
];

#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub id: Uuid,
    pub indicator_id: Uuid,
    pub original_filename: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub storage_path: String,
    pub content_hash: String,
    pub description: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_by_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub indicator_id: Uuid,
    pub original_filename: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub storage_path: String,
    pub content_hash: String,
    pub description: Option<String>,
    pub uploaded_by: Uuid,
}

pub fn extension_allowed(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

pub fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
