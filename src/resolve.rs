//! Reference classification and archive-internal path resolution.
//!
//! Paths here are lookup keys into an archive's entry table, never
//! filesystem paths. Everything is pure string manipulation.

/// How a reference found in markup or CSS should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceClass {
    /// Absolute URL, data URI, fragment or empty: passed through untouched
    Opaque,
    /// Archive-relative path: must be resolved and rewritten
    Internal,
}

/// Classify a raw reference.
///
/// Opaque: blank, fragment-only (`#top`), protocol-relative (`//host/x`),
/// or starting with a URI scheme (`http:`, `https:`, `data:`, `mailto:`...).
pub fn classify(reference: &str) -> ReferenceClass {
    let reference = reference.trim();
    if reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with("//")
        || has_scheme(reference)
    {
        ReferenceClass::Opaque
    } else {
        ReferenceClass::Internal
    }
}

/// RFC 3986: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join `reference` onto `current_dir` and normalize the result.
///
/// A reference starting with `/` is rooted at the top of the archive.
pub fn resolve(current_dir: &str, reference: &str) -> String {
    if reference.starts_with('/') || reference.starts_with('\\') {
        return normalize(reference);
    }
    normalize(&format!("{current_dir}/{reference}"))
}

/// Canonical forward-slash form: `\` becomes `/`, empty and `.` segments
/// are dropped, `..` pops one segment and clamps at the archive root.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Directory portion of an internal path (`""` for top-level entries).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_joins() {
        assert_eq!(resolve("a/b", "../c.png"), "a/c.png");
        assert_eq!(resolve("a/b", "./d.css"), "a/b/d.css");
        assert_eq!(resolve("", "x.png"), "x.png");
        assert_eq!(resolve("chapters/01", "../covers/1.jpg"), "chapters/covers/1.jpg");
        assert_eq!(resolve("a", "b//c/./d.png"), "a/b/c/d.png");
    }

    #[test]
    fn dotdot_clamps_at_root() {
        assert_eq!(resolve("a", "../../../x.png"), "x.png");
        assert_eq!(resolve("", ".."), "");
        assert_eq!(normalize("../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn rooted_reference_ignores_current_dir() {
        assert_eq!(resolve("deep/dir", "/img/a.png"), "img/a.png");
    }

    #[test]
    fn backslashes_become_separators() {
        assert_eq!(normalize(r"img\sub\a.png"), "img/sub/a.png");
        assert_eq!(resolve("a", r"..\b\c.png"), "b/c.png");
    }

    #[test]
    fn resolution_is_idempotent_on_canonical_paths() {
        for path in ["x.png", "a/c.png", "chapters/covers/1.jpg", "a b/ü.png", ""] {
            assert_eq!(resolve("", path), path);
            assert_eq!(normalize(&normalize(path)), normalize(path));
        }
    }

    #[test]
    fn classifies_opaque_references() {
        for reference in [
            "http://example.com/a.png",
            "https://example.com/",
            "HTTPS://EXAMPLE.COM/",
            "data:image/png;base64,AAAA",
            "#section-2",
            "mailto:someone@example.com",
            "javascript:void(0)",
            "//cdn.example.com/lib.js",
            "",
            "   ",
        ] {
            assert_eq!(classify(reference), ReferenceClass::Opaque, "{reference:?}");
        }
    }

    #[test]
    fn classifies_internal_references() {
        for reference in [
            "page.html",
            "../img/a.png",
            "./style.css",
            "/root.css",
            "img/http-logo.png",
            "httpfoo.png",
            "1:2.png",
            "page.html#top",
        ] {
            assert_eq!(classify(reference), ReferenceClass::Internal, "{reference:?}");
        }
    }

    #[test]
    fn parent_dir_of_paths() {
        assert_eq!(parent_dir("chapters/01/page.html"), "chapters/01");
        assert_eq!(parent_dir("index.html"), "");
        assert_eq!(parent_dir("x/y.html"), "x");
    }
}
