use std::path::Path;

use tokio::fs;

use crate::errors::Result;

pub const ID_PLACEHOLDER: &str = "{video.id}";
pub const TITLE_PLACEHOLDER: &str = "{video.title}";

/// Characters that can't appear in a file name on any supported platform.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Fills `{video.id}` and `{video.title}` in a file name template.
pub fn apply_template(template: &str, video_id: &str, title: &str) -> String {
    template
        .replace(ID_PLACEHOLDER, video_id)
        .replace(TITLE_PLACEHOLDER, title)
}

/// Removes characters that are illegal in file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !ILLEGAL_CHARS.contains(c))
        .collect()
}

/// Creates a directory (and its parents) if it doesn't exist yet.
pub async fn ensure_dir(dir_path: &Path) -> Result<()> {
    if fs::metadata(dir_path).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(dir_path).await?;
    Ok(())
}
