//! Listing pages: the archive gallery and an archive's document list.

use quick_xml::escape::escape;
use std::fmt::Write;

use crate::boundary::{BoundaryRef, Route, encode_segment};

const STYLE: &str = r#"<style>
body { background: #121212; color: #e0e0e0; font-family: sans-serif; margin: 0; padding: 20px; }
h1, h2 { font-weight: 300; border-bottom: 1px solid #333; padding-bottom: 10px; }
a { color: inherit; text-decoration: none; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 20px; }
.card { background: #1e1e1e; border-radius: 8px; overflow: hidden; display: flex; flex-direction: column; }
.card:hover { outline: 2px solid #0084ff; }
.poster { width: 100%; aspect-ratio: 2/3; object-fit: cover; background: #222; }
.title { padding: 10px; font-size: 0.9em; text-align: center; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.back { display: inline-block; margin-bottom: 20px; color: #0084ff; font-weight: bold; }
.files { list-style: none; padding: 0; }
.files li a { display: block; padding: 15px; margin: 5px 0; background: #1e1e1e; border-radius: 4px; }
.files li a:hover { background: #333; color: #0084ff; }
</style>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>{STYLE}</head><body>{body}</body></html>",
        escape(title)
    )
}

/// Gallery of every archive under the root, one card per archive.
pub fn render_gallery(archives: &[String]) -> String {
    let mut body = String::from("<h1>Library</h1><div class=\"grid\">");
    for archive in archives {
        let id = encode_segment(archive);
        let name = escape(archive.as_str());
        let _ = write!(
            body,
            "<a class=\"card\" href=\"/list/{id}\">\
             <img class=\"poster\" src=\"/thumbnail/{id}\" alt=\"Cover\">\
             <div class=\"title\">{name}</div></a>"
        );
    }
    body.push_str("</div>");
    page("Library", &body)
}

/// Links to every document in one archive.
pub fn render_document_list(archive: &str, documents: &[String]) -> String {
    let title = escape(archive);
    let mut body = format!("<a class=\"back\" href=\"/\">&larr; Back to library</a><h2>{title}</h2><ul class=\"files\">");
    for document in documents {
        let href = BoundaryRef::new(archive, document.as_str()).href(Route::View);
        let _ = write!(
            body,
            "<li><a href=\"{href}\">{}</a></li>",
            escape(document.as_str())
        );
    }
    body.push_str("</ul>");
    page(archive, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_links_list_and_thumbnail() {
        let html = render_gallery(&["vol 1.zip".to_string(), "<b>.zip".to_string()]);
        assert!(html.contains(r#"href="/list/vol%201.zip""#));
        assert!(html.contains(r#"src="/thumbnail/vol%201.zip""#));
        assert!(html.contains("&lt;b&gt;.zip"));
        assert!(!html.contains("<b>.zip"));
    }

    #[test]
    fn document_list_links_through_view() {
        let html = render_document_list("vol1.zip", &["ch 1/index.html".to_string()]);
        assert!(html.contains(r#"<a href="/view/vol1.zip/ch%201/index.html">ch 1/index.html</a>"#));
        assert!(html.contains("<title>vol1.zip</title>"));
    }
}
