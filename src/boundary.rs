//! Boundary references: how archive content is addressed from outside.
//!
//! `/<prefix>/<archive_id>/<internal/path>` where the archive id is encoded
//! as one segment and each path segment is encoded on its own, keeping `/`
//! as the separator. Only `A-Z a-z 0-9 - . _ ~` are left bare.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Which boundary endpoint a reference targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Raw bytes with an inferred content type
    Content,
    /// Document view: markup is rewritten before it is returned
    View,
}

impl Route {
    pub const fn prefix(self) -> &'static str {
        match self {
            Route::Content => "zip_content",
            Route::View => "view",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "zip_content" => Some(Route::Content),
            "view" => Some(Route::View),
            _ => None,
        }
    }
}

/// An `(archive_id, internal_path)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRef {
    pub archive_id: String,
    pub internal_path: String,
}

impl BoundaryRef {
    pub fn new(archive_id: impl Into<String>, internal_path: impl Into<String>) -> Self {
        Self {
            archive_id: archive_id.into(),
            internal_path: internal_path.into(),
        }
    }

    /// Serialized form, e.g. `/zip_content/vol%201.zip/img/a%20b.png`.
    pub fn href(&self, route: Route) -> String {
        format!(
            "/{}/{}/{}",
            route.prefix(),
            encode_segment(&self.archive_id),
            encode_path(&self.internal_path)
        )
    }

    /// Inverse of [`BoundaryRef::href`].
    pub fn parse(href: &str) -> Option<(Route, Self)> {
        let rest = href.strip_prefix('/')?;
        let (prefix, rest) = rest.split_once('/')?;
        let route = Route::from_prefix(prefix)?;
        let (archive, path) = rest.split_once('/').unwrap_or((rest, ""));
        let archive_id = percent_decode_str(archive).decode_utf8().ok()?;
        let internal_path = percent_decode_str(path).decode_utf8().ok()?;
        Some((route, Self::new(archive_id, internal_path)))
    }
}

/// Percent-encode a single path segment (a `/` is encoded too).
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Percent-encode each segment of `path`, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
