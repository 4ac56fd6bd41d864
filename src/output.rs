use crate::Summary;

pub const TXT_FILE_NAME: &str = "youtube_summary.txt";
pub const MD_FILE_NAME: &str = "youtube_summary.md";

/// Render summary for the plain-text download
pub fn render_txt(summary: &Summary) -> String {
    summary.text.clone()
}

/// Render summary for the Markdown download
pub fn render_markdown(summary: &Summary) -> String {
    format!("# YouTube Summary\n\n{}", summary.text)
}
