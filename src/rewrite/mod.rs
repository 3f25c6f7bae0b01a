//! Link rewriting across the archive boundary.
//!
//! A document served from `chapters/01/page.html` may say
//! `<img src="../covers/1.jpg">`. Once it is served over HTTP that relative
//! reference would resolve against the request URL, not against the
//! archive, so every internal reference is replaced by its boundary form:
//!
//! ```text
//! ../covers/1.jpg  ->  /zip_content/vol1.zip/chapters/covers/1.jpg
//! ```
//!
//! Opaque references (absolute URLs, data URIs, fragments) are left exactly
//! as written.

mod markup;
mod style;

pub use markup::{
    HtmlMarkup, HtmlTree, Location, Markup, ReferenceSite, Rewrite, SiteKind,
};
pub use style::rewrite_css_urls;

use percent_encoding::percent_decode_str;

use crate::archive::EntryKind;
use crate::boundary::{BoundaryRef, Route};
use crate::resolve::{ReferenceClass, classify, parent_dir, resolve};

/// Attribute positions that carry a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSlot {
    /// `img@src`
    ImageSource,
    /// `img@data-src`, used by lazy loaders
    ImageFallbackSource,
    /// `link@href`
    Stylesheet,
    /// `script@src`
    ScriptSource,
    /// `a@href`
    Hyperlink,
}

impl AttributeSlot {
    /// Slot for a lowercase element/attribute pair.
    pub fn lookup(element: &[u8], attribute: &[u8]) -> Option<Self> {
        match (element, attribute) {
            (b"img", b"src") => Some(Self::ImageSource),
            (b"img", b"data-src") => Some(Self::ImageFallbackSource),
            (b"link", b"href") => Some(Self::Stylesheet),
            (b"script", b"src") => Some(Self::ScriptSource),
            (b"a", b"href") => Some(Self::Hyperlink),
            _ => None,
        }
    }
}

/// Where a reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceContext {
    Attribute(AttributeSlot),
    /// A `url()` token in an inline style or a `<style>` block
    CssUrl,
}

/// A reference to another resource, as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub raw: &'a str,
    pub context: ReferenceContext,
}

/// Resolution state for one document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentScope<'a> {
    archive_id: &'a str,
    current_dir: &'a str,
}

impl<'a> DocumentScope<'a> {
    /// Scope for the document at `document_path` inside `archive_id`.
    pub fn new(archive_id: &'a str, document_path: &'a str) -> Self {
        Self {
            archive_id,
            current_dir: parent_dir(document_path),
        }
    }

    /// Boundary form of `reference`, or `None` if it must stay untouched.
    ///
    /// The path part is percent-decoded before resolution and encoded again
    /// per segment; a `?query` or `#fragment` suffix is carried over as is.
    pub fn rewrite_reference(&self, reference: &Reference<'_>) -> Option<String> {
        if classify(reference.raw) == ReferenceClass::Opaque {
            return None;
        }

        let raw = reference.raw.trim();
        let (path, suffix) = raw.split_at(raw.find(['?', '#']).unwrap_or(raw.len()));
        let path = percent_decode_str(path).decode_utf8_lossy();
        let target = resolve(self.current_dir, &path);

        let route = match reference.context {
            ReferenceContext::Attribute(AttributeSlot::Hyperlink)
                if EntryKind::from_path(&target) == EntryKind::Markup =>
            {
                Route::View
            }
            _ => Route::Content,
        };

        Some(format!(
            "{}{}",
            BoundaryRef::new(self.archive_id, target).href(route),
            suffix
        ))
    }

    /// Rewrite one reference site's value; `None` when nothing changed.
    fn rewrite_site(&self, site: &ReferenceSite) -> Option<String> {
        match site.kind {
            SiteKind::Attribute(slot) => self.rewrite_reference(&Reference {
                raw: &site.value,
                context: ReferenceContext::Attribute(slot),
            }),
            SiteKind::InlineStyle | SiteKind::StyleBlock => {
                rewrite_css_urls(&site.value, |r| self.rewrite_reference(r))
            }
        }
    }
}

/// Rewrites internal references in a markup document.
#[derive(Debug, Clone, Default)]
pub struct LinkRewriter<M = HtmlMarkup> {
    markup: M,
}

impl LinkRewriter<HtmlMarkup> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Markup> LinkRewriter<M> {
    /// Use a different markup implementation.
    pub fn with_markup(markup: M) -> Self {
        Self { markup }
    }

    /// Rewrite `text`, the document stored at `document_path` in
    /// `archive_id`.
    ///
    /// Never fails: markup that cannot be parsed is returned unchanged.
    pub fn rewrite(&self, text: &str, document_path: &str, archive_id: &str) -> String {
        match self.try_rewrite(text, document_path, archive_id) {
            Ok(rewritten) => rewritten,
            Err(err) => {
                tracing::warn!(
                    archive = archive_id,
                    document = document_path,
                    error = %err,
                    "markup not rewritten, serving original"
                );
                text.to_string()
            }
        }
    }

    fn try_rewrite(
        &self,
        text: &str,
        document_path: &str,
        archive_id: &str,
    ) -> Result<String, crate::error::MarkupError> {
        let tree = self.markup.parse(text)?;
        let scope = DocumentScope::new(archive_id, document_path);

        let rewrites: Vec<Rewrite> = self
            .markup
            .find_references(&tree)
            .into_iter()
            .filter_map(|site| {
                let value = scope.rewrite_site(&site)?;
                Some(Rewrite {
                    location: site.location,
                    value,
                })
            })
            .collect();

        if rewrites.is_empty() {
            return Ok(text.to_string());
        }
        let tree = self.markup.apply_rewrites(tree, rewrites);
        self.markup.serialize(&tree)
    }
}
