//! Extension-based entry classification and MIME lookup.

/// Broad category of an archive entry, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Markup,
    Stylesheet,
    Script,
    Other,
}

impl EntryKind {
    pub fn from_path(path: &str) -> Self {
        match extension(path).as_deref() {
            Some("jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "svg" | "avif") => Self::Image,
            Some("html" | "htm" | "xhtml") => Self::Markup,
            Some("css") => Self::Stylesheet,
            Some("js" | "mjs") => Self::Script,
            _ => Self::Other,
        }
    }
}

/// Content type for an internal path, `application/octet-stream` when the
/// extension is unknown.
pub fn mime_type(path: &str) -> &'static str {
    match extension(path).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("xhtml") => "application/xhtml+xml",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_case_insensitive() {
        assert_eq!(EntryKind::from_path("a/B.JPG"), EntryKind::Image);
        assert_eq!(EntryKind::from_path("ch1/Page.Html"), EntryKind::Markup);
        assert_eq!(EntryKind::from_path("s.css"), EntryKind::Stylesheet);
        assert_eq!(EntryKind::from_path("README"), EntryKind::Other);
        assert_eq!(EntryKind::from_path("dir.png/readme"), EntryKind::Other);
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_type("x/1.jpg"), "image/jpeg");
        assert_eq!(mime_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(mime_type("blob"), "application/octet-stream");
    }
}
