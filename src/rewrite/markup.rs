//! Markup capability: parse, locate reference sites, patch, serialize.

use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::error::MarkupError;

use super::AttributeSlot;

/// Position of a reference site inside a parsed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Node index in document order
    pub node: usize,
    /// Attribute index on that node, `None` for text content
    pub attribute: Option<usize>,
}

/// What a reference site holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// A single reference in a known attribute
    Attribute(AttributeSlot),
    /// A `style` attribute, which may hold any number of `url()` tokens
    InlineStyle,
    /// The text of a `<style>` element
    StyleBlock,
}

/// A place in the tree whose value may contain references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub location: Location,
    pub kind: SiteKind,
    /// Attribute value with entities decoded, or raw style text
    pub value: String,
}

/// Replacement value for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub location: Location,
    pub value: String,
}

/// Parse markup into an attribute-addressable tree and write it back.
pub trait Markup {
    type Tree;

    fn parse(&self, text: &str) -> Result<Self::Tree, MarkupError>;

    fn find_references(&self, tree: &Self::Tree) -> Vec<ReferenceSite>;

    fn apply_rewrites(&self, tree: Self::Tree, rewrites: Vec<Rewrite>) -> Self::Tree;

    fn serialize(&self, tree: &Self::Tree) -> Result<String, MarkupError>;
}

/// Lenient HTML handling on top of the `quick-xml` tokenizer.
///
/// The tree is the flat event list. Unmatched and misnamed end tags are
/// tolerated and attributes are read with HTML rules (unquoted and
/// valueless attributes). `<script>` and `<style>` bodies are raw text and
/// become a single text event. Events that are not rewritten are written
/// back exactly as they were read; a patched tag is re-emitted with its
/// attributes double-quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMarkup;

/// Event list produced by [`HtmlMarkup`].
#[derive(Debug, Clone)]
pub struct HtmlTree {
    events: Vec<Event<'static>>,
}

impl Markup for HtmlMarkup {
    type Tree = HtmlTree;

    fn parse(&self, text: &str) -> Result<HtmlTree, MarkupError> {
        let mut events = Vec::new();
        let mut offset = 0;

        // Tokenize up to the next raw text element, take its body verbatim,
        // then resume after its end tag.
        while offset < text.len() {
            let mut reader = Reader::from_str(&text[offset..]);
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;

            let element = loop {
                let event = match reader.read_event() {
                    Ok(Event::Eof) => return Ok(HtmlTree { events }),
                    Ok(event) => html_event(event),
                    Err(err) => {
                        return Err(MarkupError::Parse {
                            position: offset as u64 + reader.error_position() as u64,
                            message: err.to_string(),
                        });
                    }
                };
                let raw_text = match &event {
                    Event::Start(tag) if is_raw_text(tag.name().as_ref()) => {
                        Some(tag.name().as_ref().to_vec())
                    }
                    _ => None,
                };
                events.push(event);
                if let Some(element) = raw_text {
                    break element;
                }
            };

            let body_start = offset + reader.buffer_position() as usize;
            let rest = &text[body_start..];
            let Some((body_len, end_tag)) = find_end_tag(rest, &element) else {
                // Unterminated: the body runs to the end of the document.
                if !rest.is_empty() {
                    events.push(Event::Text(BytesText::from_escaped(rest.to_string())));
                }
                break;
            };

            if body_len > 0 {
                events.push(Event::Text(BytesText::from_escaped(rest[..body_len].to_string())));
            }
            let name = &rest[body_len + 2..body_len + end_tag - 1];
            events.push(Event::End(BytesEnd::new(name.to_string())));
            offset = body_start + body_len + end_tag;
        }

        Ok(HtmlTree { events })
    }

    fn find_references(&self, tree: &HtmlTree) -> Vec<ReferenceSite> {
        let mut sites = Vec::new();

        for (node, event) in tree.events.iter().enumerate() {
            match event {
                Event::Start(tag) | Event::Empty(tag) => {
                    let element = tag.name().as_ref().to_ascii_lowercase();

                    // A tag whose attributes do not parse is left alone.
                    let Some(attributes) = attributes(tag) else {
                        continue;
                    };
                    for (index, attr) in attributes.iter().enumerate() {
                        let name = attr.key.as_ref().to_ascii_lowercase();
                        let kind = if name == b"style" {
                            SiteKind::InlineStyle
                        } else if let Some(slot) = AttributeSlot::lookup(&element, &name) {
                            SiteKind::Attribute(slot)
                        } else {
                            continue;
                        };
                        sites.push(ReferenceSite {
                            location: Location {
                                node,
                                attribute: Some(index),
                            },
                            kind,
                            value: decoded_value(attr),
                        });
                    }
                }
                Event::Text(text) if node > 0 && opens_style(&tree.events[node - 1]) => {
                    let bytes: &[u8] = text;
                    sites.push(ReferenceSite {
                        location: Location {
                            node,
                            attribute: None,
                        },
                        kind: SiteKind::StyleBlock,
                        value: String::from_utf8_lossy(bytes).into_owned(),
                    });
                }
                _ => {}
            }
        }

        sites
    }

    fn apply_rewrites(&self, mut tree: HtmlTree, rewrites: Vec<Rewrite>) -> HtmlTree {
        let mut by_node: BTreeMap<usize, Vec<Rewrite>> = BTreeMap::new();
        for rewrite in rewrites {
            by_node.entry(rewrite.location.node).or_default().push(rewrite);
        }

        for (node, edits) in by_node {
            let Some(event) = tree.events.get_mut(node) else {
                continue;
            };
            let attribute_edits: HashMap<usize, &str> = edits
                .iter()
                .filter_map(|e| Some((e.location.attribute?, e.value.as_str())))
                .collect();
            let text_edit = edits.iter().find(|e| e.location.attribute.is_none());

            let replacement = match event {
                Event::Start(tag) => rebuild(tag, &attribute_edits).map(Event::Start),
                Event::Empty(tag) => rebuild(tag, &attribute_edits).map(Event::Empty),
                Event::Text(_) => {
                    text_edit.map(|e| Event::Text(BytesText::from_escaped(e.value.clone())))
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                *event = replacement;
            }
        }

        tree
    }

    fn serialize(&self, tree: &HtmlTree) -> Result<String, MarkupError> {
        let mut writer = Writer::new(Vec::new());
        for event in &tree.events {
            writer
                .write_event(event.clone())
                .map_err(|err| MarkupError::Serialize(err.to_string()))?;
        }
        String::from_utf8(writer.into_inner()).map_err(|err| MarkupError::Serialize(err.to_string()))
    }
}

/// Elements whose content HTML reads as raw text rather than markup.
fn is_raw_text(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"script") || name.eq_ignore_ascii_case(b"style")
}

fn opens_style(event: &Event<'_>) -> bool {
    matches!(event, Event::Start(tag) if tag.name().as_ref().eq_ignore_ascii_case(b"style"))
}

/// Find the end tag of raw text element `name` in `body`.
///
/// Returns the body length and the length of the end tag itself. As in
/// HTML, the match is case-insensitive and the name must be followed by
/// whitespace, `/` or `>`.
fn find_end_tag(body: &str, name: &[u8]) -> Option<(usize, usize)> {
    let bytes = body.as_bytes();
    let mut from = 0;
    while let Some(found) = body[from..].find("</") {
        let start = from + found;
        let name_end = start + 2 + name.len();
        let boundary = bytes.get(name_end).copied();
        if bytes.get(start + 2..name_end).is_some_and(|n| n.eq_ignore_ascii_case(name))
            && matches!(boundary, Some(b'>' | b'/') | Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c'))
        {
            let close = body[name_end..].find('>')?;
            return Some((start, name_end + close + 1 - start));
        }
        from = start + 2;
    }
    None
}

/// Adjust a tokenizer event to HTML attribute rules.
///
/// `<a href=ch/>` is a start tag whose unquoted value is `ch/` in HTML, not
/// a self-closing tag.
fn html_event(event: Event<'_>) -> Event<'static> {
    let Event::Empty(tag) = event else {
        return event.into_owned();
    };
    let content: &[u8] = &tag;
    let last_token = content
        .rsplit(|b| b.is_ascii_whitespace())
        .next()
        .unwrap_or_default();
    let unquoted_value = content.len() > last_token.len()
        && last_token.contains(&b'=')
        && !matches!(last_token.last(), Some(b'"' | b'\''));
    if !unquoted_value {
        return Event::Empty(tag.into_owned());
    }

    let name_len = tag.name().as_ref().len();
    let mut with_slash = String::from_utf8_lossy(content).into_owned();
    with_slash.push('/');
    Event::Start(BytesStart::from_content(with_slash, name_len))
}

/// All attributes of `tag`, or `None` if any of them is malformed.
fn attributes<'a>(tag: &'a BytesStart<'_>) -> Option<Vec<Attribute<'a>>> {
    let mut attrs = tag.html_attributes();
    attrs.with_checks(false);
    attrs.collect::<Result<Vec<_>, _>>().ok()
}

fn decoded_value(attr: &Attribute<'_>) -> String {
    match attr.unescape_value() {
        Ok(value) => value.into_owned(),
        // HTML named entities quick-xml does not know, e.g. `&nbsp;`
        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
    }
}

/// Re-emit `tag` with some attribute values replaced.
fn rebuild(tag: &BytesStart<'_>, edits: &HashMap<usize, &str>) -> Option<BytesStart<'static>> {
    let attributes = attributes(tag)?;
    let mut rebuilt = BytesStart::new(String::from_utf8_lossy(tag.name().as_ref()).into_owned());

    for (index, attr) in attributes.into_iter().enumerate() {
        let value: Vec<u8> = match edits.get(&index) {
            Some(value) => partial_escape(*value).replace('"', "&quot;").into_bytes(),
            None => requote(&attr.value),
        };
        rebuilt.push_attribute(Attribute {
            key: attr.key,
            value: Cow::Owned(value),
        });
    }

    Some(rebuilt)
}

/// Raw value made safe for a double-quoted attribute.
fn requote(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &b in raw {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_documents_serialize_verbatim() {
        let html = "<!DOCTYPE html>\n<html><head><title>T &amp; U</title></head>\
                    <body><p class=x>hi<br/>there</p><!-- note --></body></html>";
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        assert_eq!(markup.serialize(&tree).unwrap(), html);
    }

    #[test]
    fn finds_known_sites_only() {
        let html = r#"<img src="a.png" data-src="b.png" alt="x"><a href="p.html">p</a>
<link rel="stylesheet" href="s.css"><script src="j.js"></script>
<div style="background:url(c.png)"></div><iframe src="f.html"></iframe>"#;
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        let sites = markup.find_references(&tree);

        let found: Vec<(SiteKind, &str)> =
            sites.iter().map(|s| (s.kind, s.value.as_str())).collect();
        assert_eq!(
            found,
            [
                (SiteKind::Attribute(AttributeSlot::ImageSource), "a.png"),
                (SiteKind::Attribute(AttributeSlot::ImageFallbackSource), "b.png"),
                (SiteKind::Attribute(AttributeSlot::Hyperlink), "p.html"),
                (SiteKind::Attribute(AttributeSlot::Stylesheet), "s.css"),
                (SiteKind::Attribute(AttributeSlot::ScriptSource), "j.js"),
                (SiteKind::InlineStyle, "background:url(c.png)"),
            ]
        );
    }

    #[test]
    fn style_block_text_is_a_site() {
        let html = "<style>body { background: url(bg.png) }</style><p>url(x.png)</p>";
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        let sites = markup.find_references(&tree);

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].kind, SiteKind::StyleBlock);
        assert_eq!(sites[0].location.attribute, None);
    }

    #[test]
    fn rewrites_patch_only_target_attribute() {
        let html = r#"<p>x</p><img alt='say "hi"' src=a.png>"#;
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        let site = markup.find_references(&tree).remove(0);

        let tree = markup.apply_rewrites(
            tree,
            vec![Rewrite {
                location: site.location,
                value: "/zip_content/t.zip/a.png".into(),
            }],
        );
        assert_eq!(
            markup.serialize(&tree).unwrap(),
            r#"<p>x</p><img alt="say &quot;hi&quot;" src="/zip_content/t.zip/a.png">"#
        );
    }

    #[test]
    fn unclosed_tag_is_a_parse_error() {
        assert!(matches!(
            HtmlMarkup.parse(r#"<p>text</p><img src="a.png""#),
            Err(MarkupError::Parse { .. })
        ));
    }

    #[test]
    fn raw_text_bodies_are_single_events() {
        let html = "<script>if (a<b && c>d) { x('</p>'); }</script><STYLE>p{}</Style >";
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        assert_eq!(tree.events.len(), 6);
        assert!(matches!(&tree.events[1], Event::Text(t) if &**t == b"if (a<b && c>d) { x('</p>'); }"));
        assert_eq!(markup.serialize(&tree).unwrap(), html);
    }

    #[test]
    fn unterminated_script_runs_to_end() {
        let html = "<p>x</p><script>var s = '<img src=a.png>';";
        let markup = HtmlMarkup;
        let tree = markup.parse(html).unwrap();
        assert!(markup.find_references(&tree).is_empty());
        assert_eq!(markup.serialize(&tree).unwrap(), html);
    }

    #[test]
    fn unquoted_value_keeps_trailing_slash() {
        let markup = HtmlMarkup;
        let tree = markup.parse("<a href=ch/>x</a><br/><img src=a.png />").unwrap();
        assert!(matches!(tree.events[0], Event::Start(_)));
        assert!(matches!(tree.events[3], Event::Empty(_)));
        assert!(matches!(tree.events[4], Event::Empty(_)));

        let values: Vec<_> = markup
            .find_references(&tree)
            .into_iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, ["ch/", "a.png"]);
    }
}
