pub const DOWNLOAD_PAGE: &str = include_str!("../data/templates/download_page.html");
pub const SUMMARY: &str = include_str!("../data/templates/summary.txt");

/// Values interpolated into both the download page and the summary.
#[derive(Debug, Clone)]
pub struct LinkDetails<'a> {
    pub app_name: &'a str,
    pub file_name: &'a str,
    pub file_size: &'a str,
    pub uploaded_at: &'a str,
    pub repository: &'a str,
    pub storage_path: &'a str,
    pub download_url: &'a str,
    pub view_url: &'a str,
}

impl LinkDetails<'_> {
    fn vars(&self) -> [(&str, &str); 8] {
        [
            ("app_name", self.app_name),
            ("file_name", self.file_name),
            ("file_size", self.file_size),
            ("uploaded_at", self.uploaded_at),
            ("repository", self.repository),
            ("storage_path", self.storage_path),
            ("download_url", self.download_url),
            ("view_url", self.view_url),
        ]
    }
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass, so placeholder text inside a value is left
/// as-is. Unknown placeholders are kept verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Self-contained download page. Every value is treated as untrusted text.
pub fn render_download_page(details: &LinkDetails<'_>) -> String {
    let escaped: Vec<(&str, String)> = details
        .vars()
        .into_iter()
        .map(|(key, value)| (key, escape_html(value)))
        .collect();
    let vars: Vec<(&str, &str)> = escaped
        .iter()
        .map(|(key, value)| (*key, value.as_str()))
        .collect();
    render(DOWNLOAD_PAGE, &vars)
}

pub fn render_summary(details: &LinkDetails<'_>) -> String {
    render(SUMMARY, &details.vars())
}
