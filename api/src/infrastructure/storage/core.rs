use std::path::{Component, Path, PathBuf};

const MAX_NAME_LEN: usize = 100;

/// Filesystem-safe version of an uploaded file name; keeps the extension.
pub fn sanitize_filename(name: &str) -> String {
    // browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let mut s: String = base
        .trim()
        .chars()
        .map(|ch| match ch {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '-',
            c if c.is_control() => '-',
            ' ' => '_',
            c => c,
        })
        .collect();
    s = s.trim_start_matches('.').to_string();
    if s.chars().count() > MAX_NAME_LEN {
        let ext = Path::new(&s)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let keep = MAX_NAME_LEN.saturating_sub(ext.chars().count());
        let stem: String = s.chars().take(keep).collect();
        s = format!("{}{}", stem, ext);
    }
    if s.is_empty() {
        s = "file".into();
    }
    s
}

pub fn relative_from_uploads(uploads_root: &Path, full: &Path) -> String {
    match full.strip_prefix(uploads_root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => full.to_string_lossy().to_string(),
    }
}

/// Joins `rel` under `uploads_root`, rejecting absolute paths and `..`.
pub fn resolve_under(uploads_root: &Path, rel: &str) -> anyhow::Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => continue,
            _ => anyhow::bail!("forbidden"),
        }
    }
    if relative.as_os_str().is_empty() {
        anyhow::bail!("forbidden");
    }
    let full = uploads_root.join(relative);
    if !full.starts_with(uploads_root) {
        anyhow::bail!("forbidden");
    }
    Ok(full)
}
