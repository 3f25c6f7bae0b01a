//! `url(...)` tokens in CSS text.

use regex::Regex;
use std::sync::LazyLock;

use super::{Reference, ReferenceContext};

/// `url(x)`, `url('x')`, `url("x")`, whitespace allowed inside the parens.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"'()\s]*))\s*\)"#)
        .expect("CSS url() pattern is valid")
});

/// Run `rewrite` over every `url()` token in `css`.
///
/// Only the token's value is replaced; quotes, whitespace and everything
/// outside the tokens stay as they were. Returns `None` when no token was
/// changed.
pub fn rewrite_css_urls<F>(css: &str, mut rewrite: F) -> Option<String>
where
    F: FnMut(&Reference<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    let mut changed = false;

    for caps in CSS_URL.captures_iter(css) {
        let Some(value) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };
        let reference = Reference {
            raw: value.as_str(),
            context: ReferenceContext::CssUrl,
        };
        if let Some(replacement) = rewrite(&reference) {
            out.push_str(&css[last..value.start()]);
            out.push_str(&replacement);
            last = value.end();
            changed = true;
        }
    }

    changed.then(|| {
        out.push_str(&css[last..]);
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(r: &Reference<'_>) -> Option<String> {
        (!r.raw.is_empty()).then(|| r.raw.to_uppercase())
    }

    #[test]
    fn preserves_quote_style_and_surroundings() {
        assert_eq!(
            rewrite_css_urls("background:url('img/bg.png') no-repeat", upper).as_deref(),
            Some("background:url('IMG/BG.PNG') no-repeat")
        );
        assert_eq!(
            rewrite_css_urls(r#"a:url("x.png");b:URL( y.png )"#, upper).as_deref(),
            Some(r#"a:url("X.PNG");b:URL( Y.PNG )"#)
        );
    }

    #[test]
    fn untouched_tokens_report_no_change() {
        assert_eq!(rewrite_css_urls("color: red", upper), None);
        assert_eq!(rewrite_css_urls("background: url()", upper), None);
        assert_eq!(rewrite_css_urls("background: url(a.png)", |_| None), None);
    }

    #[test]
    fn every_token_is_a_css_reference() {
        let mut seen = Vec::new();
        rewrite_css_urls("url(a.png), url('b.png'), url(\"c.png\")", |r| {
            assert_eq!(r.context, ReferenceContext::CssUrl);
            seen.push(r.raw.to_string());
            None
        });
        assert_eq!(seen, ["a.png", "b.png", "c.png"]);
    }
}
