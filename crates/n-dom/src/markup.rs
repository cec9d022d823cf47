// SPDX-License-Identifier: MIT
//
// Markup reader: tags and text in, an element tree out.
//
// A small tokenizer, not an HTML parser: no implied
// end tags, no foster parenting, no scripts. What it does support:
//
// - `<!DOCTYPE …>`, `<?…?>` and `<!-- … -->` are skipped
// - quoted (`"` or `'`) and bare attribute values, plus valueless
//   attributes which read as `"true"`
// - self-closing tags (`<br/>`)
// - the five XML entities
//
// Every element starts from `Attributes::element_defaults`, inherits from
// its parent, then applies its own attributes in source order.

use thiserror::Error;
use tracing::debug;

use crate::attributes::Attributes;
use crate::tree::{Element, ElementId, Placement, Tree};

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unexpected end tag </{found}>, expected </{expected}>")]
    MismatchedEndTag { expected: String, found: String },

    #[error("unexpected end of input inside <{open}>")]
    UnexpectedEof { open: String },

    #[error("malformed markup at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },

    #[error("document has no <body> element")]
    MissingBody,

    #[error("markup contains no element")]
    Empty,
}

// ─── Document ───────────────────────────────────────────────────────────────

/// A loaded page: the `<title>` text and the tree rooted at `<body>`.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub tree: Tree,
}

impl Document {
    #[must_use]
    pub const fn body(&self) -> ElementId {
        self.tree.root()
    }
}

/// Parse a full `<html><head>…</head><body>…</body></html>` page.
///
/// # Errors
///
/// Returns [`MarkupError`] for broken tag structure or when no `<body>`
/// element exists.
pub fn parse_document(src: &str) -> Result<Document, MarkupError> {
    let tree = parse_fragment(src)?;
    let root = tree.root();

    let title = find_named(&tree, root, "title")
        .and_then(|id| tree.get(id))
        .map(|title| title.content.trim().to_owned())
        .unwrap_or_default();

    let body = find_named(&tree, root, "body").ok_or(MarkupError::MissingBody)?;
    let tree = if body == root {
        tree
    } else {
        // Re-root on <body>, dropping <html> and <head>.
        let mut source = tree;
        source.split_off(body).ok_or(MarkupError::MissingBody)?
    };
    debug!(%title, elements = tree.len(), "document parsed");
    Ok(Document { title, tree })
}

/// Parse markup holding a single root element (and its descendants).
///
/// # Errors
///
/// Returns [`MarkupError`] for broken tag structure or input with no element.
pub fn parse_fragment(src: &str) -> Result<Tree, MarkupError> {
    let mut builder = Builder::default();
    let mut reader = Reader::new(src);

    while let Some(token) = reader.next_token()? {
        builder.feed(token)?;
    }
    builder.finish()
}

fn find_named(tree: &Tree, from: ElementId, name: &str) -> Option<ElementId> {
    tree.descendants(from)
        .into_iter()
        .find(|&id| tree.get(id).is_some_and(|el| el.name == name))
}

// ─── Tree builder ───────────────────────────────────────────────────────────

#[derive(Default)]
struct Builder {
    tree: Option<Tree>,
    open: Vec<ElementId>,
    closed_root: bool,
}

impl Builder {
    fn feed(&mut self, token: Token<'_>) -> Result<(), MarkupError> {
        match token {
            Token::Open {
                name,
                attrs,
                self_closing,
            } => {
                let id = self.open_element(name, &attrs)?;
                if !self_closing {
                    self.open.push(id);
                }
            }
            Token::Close { name } => {
                let Some(&top) = self.open.last() else {
                    return Err(MarkupError::MismatchedEndTag {
                        expected: String::new(),
                        found: name.to_owned(),
                    });
                };
                let expected = self.name_of(top);
                if expected != name {
                    return Err(MarkupError::MismatchedEndTag {
                        expected,
                        found: name.to_owned(),
                    });
                }
                self.open.pop();
                if self.open.is_empty() {
                    self.closed_root = true;
                }
            }
            Token::Text(text) => {
                let top = self.open.last().copied();
                if let Some(element) = top.zip(self.tree.as_mut()).and_then(|(id, tree)| tree.get_mut(id)) {
                    element.content.push_str(&text);
                }
            }
        }
        Ok(())
    }

    fn open_element(&mut self, name: &str, raw: &[(String, String)]) -> Result<ElementId, MarkupError> {
        let pairs = raw.iter().map(|(k, v)| (k.as_str(), v.as_str()));

        let Some(tree) = self.tree.as_mut() else {
            let mut attrs = Attributes::element_defaults();
            attrs.apply(pairs);
            let tree = Tree::new(Element::new(name, attrs));
            let root = tree.root();
            self.tree = Some(tree);
            return Ok(root);
        };

        let parent = match self.open.last() {
            Some(&parent) if !self.closed_root => parent,
            _ => {
                return Err(MarkupError::Malformed {
                    offset: 0,
                    reason: "more than one root element",
                });
            }
        };

        let mut attrs = Attributes::element_defaults();
        if let Some(parent) = tree.get(parent) {
            attrs.inherit_from(&parent.attrs);
        }
        attrs.apply(pairs);
        tree.insert_child(parent, Element::new(name, attrs), Placement::Back)
            .ok_or(MarkupError::Malformed {
                offset: 0,
                reason: "parent element vanished",
            })
    }

    fn name_of(&self, id: ElementId) -> String {
        self.tree
            .as_ref()
            .and_then(|tree| tree.get(id))
            .map(|el| el.name.clone())
            .unwrap_or_default()
    }

    fn finish(self) -> Result<Tree, MarkupError> {
        if let Some(&top) = self.open.last() {
            return Err(MarkupError::UnexpectedEof {
                open: self.name_of(top),
            });
        }
        self.tree.ok_or(MarkupError::Empty)
    }
}

// ─── Tokenizer ──────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open {
        name: &'a str,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: &'a str,
    },
    Text(String),
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn malformed(&self, reason: &'static str) -> MarkupError {
        MarkupError::Malformed {
            offset: self.pos,
            reason,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, MarkupError> {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Ok(None);
            }

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                let raw = &rest[..end];
                self.pos += end;
                if raw.trim().is_empty() {
                    continue;
                }
                return Ok(Some(Token::Text(normalize_text(raw))));
            }

            if rest.starts_with("<!--") {
                let end = rest.find("-->").ok_or_else(|| self.malformed("unterminated comment"))?;
                self.pos += end + 3;
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest.find('>').ok_or_else(|| self.malformed("unterminated declaration"))?;
                self.pos += end + 1;
                continue;
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').ok_or_else(|| self.malformed("unterminated end tag"))?;
                let name = after[..end].trim();
                if name.is_empty() {
                    return Err(self.malformed("empty end tag"));
                }
                self.pos += 2 + end + 1;
                return Ok(Some(Token::Close { name }));
            }

            return self.open_tag().map(Some);
        }
    }

    fn open_tag(&mut self) -> Result<Token<'a>, MarkupError> {
        self.pos += 1;
        let name = self.take_while(is_name_char);
        if name.is_empty() {
            return Err(self.malformed("expected tag name"));
        }

        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.malformed("unterminated start tag"));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(Token::Open {
                    name,
                    attrs,
                    self_closing: true,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(Token::Open {
                    name,
                    attrs,
                    self_closing: false,
                });
            }

            let key = self.take_while(is_name_char);
            if key.is_empty() {
                return Err(self.malformed("expected attribute name"));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attr_value()?
            } else {
                "true".to_owned()
            };
            attrs.push((key.to_owned(), value));
        }
    }

    fn attr_value(&mut self) -> Result<String, MarkupError> {
        let rest = self.rest();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            let bare = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
            return Ok(decode_entities(bare));
        };
        let inner = &rest[1..];
        let end = inner
            .find(quote)
            .ok_or_else(|| self.malformed("unterminated attribute value"))?;
        self.pos += 1 + end + 1;
        Ok(decode_entities(&inner[..end]))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

/// Map line breaks and tabs to spaces and decode entities.
fn normalize_text(raw: &str) -> String {
    let flat: String = raw
        .chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
        .collect();
    decode_entities(&flat)
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .into_iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match decoded {
            Some((entity, ch)) => {
                out.push(ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Display, FlexDirection};
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
    <head><title> Table demo </title></head>
    <body display="flex" flex-direction="column" color="7" id="body">
        <!-- header row -->
        <div height="3" border>Name &amp; Age</div>
        <div id="table-body" background-color="0"/>
    </body>
</html>"#;

    // ── Documents ────────────────────────────────────────────────────

    #[test]
    fn document_title_and_body() {
        let doc = parse_document(PAGE).unwrap();
        assert_eq!(doc.title, "Table demo");
        let body = doc.tree.get(doc.body()).unwrap();
        assert_eq!(body.name, "body");
        assert_eq!(body.attrs.display, Display::Flex);
        assert_eq!(body.attrs.flex_direction, FlexDirection::Column);
        assert_eq!(body.children().len(), 2);
    }

    #[test]
    fn document_children_inherit_color_only() {
        let doc = parse_document(PAGE).unwrap();
        let body = doc.tree.get(doc.body()).unwrap();
        let header = doc.tree.get(body.children()[0]).unwrap();
        assert_eq!(header.attrs.color, 7);
        assert_eq!(header.attrs.display, Display::Block);
        assert_eq!(header.attrs.flex, 1);
        assert!(header.attrs.border);
        assert_eq!(header.attrs.height, 3);
        assert!(header.attrs.id.is_empty());
    }

    #[test]
    fn document_text_is_decoded() {
        let doc = parse_document(PAGE).unwrap();
        let body = doc.tree.get(doc.body()).unwrap();
        let header = doc.tree.get(body.children()[0]).unwrap();
        assert_eq!(header.content, "Name & Age");
    }

    #[test]
    fn document_tree_parents_point_at_body() {
        let doc = parse_document(PAGE).unwrap();
        for &child in doc.tree.children(doc.body()) {
            assert_eq!(doc.tree.parent(child), Some(doc.body()));
        }
    }

    #[test]
    fn missing_body_is_an_error() {
        let err = parse_document("<html><head></head></html>").unwrap_err();
        assert_eq!(err, MarkupError::MissingBody);
    }

    // ── Structure errors ─────────────────────────────────────────────

    #[test]
    fn mismatched_end_tag() {
        let err = parse_fragment("<div><p>text</div>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::MismatchedEndTag {
                expected: "p".into(),
                found: "div".into(),
            }
        );
    }

    #[test]
    fn unclosed_element() {
        let err = parse_fragment("<div><p>text</p>").unwrap_err();
        assert_eq!(err, MarkupError::UnexpectedEof { open: "div".into() });
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_fragment("  \n ").unwrap_err(), MarkupError::Empty);
    }

    #[test]
    fn two_roots_rejected() {
        assert!(matches!(
            parse_fragment("<a></a><b></b>"),
            Err(MarkupError::Malformed { .. })
        ));
    }

    #[test]
    fn unterminated_attribute_value() {
        assert!(matches!(
            parse_fragment(r#"<div id="x></div>"#),
            Err(MarkupError::Malformed { .. })
        ));
    }

    // ── Fragments ────────────────────────────────────────────────────

    #[test]
    fn fragment_row_with_cells() {
        let tree = parse_fragment(
            r#"
            <trow display="flex" height="1">
                <p>row 1</p>
                <p>row 1</p>
            </trow>"#,
        )
        .unwrap();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.name, "trow");
        assert_eq!(root.attrs.height, 1);
        assert_eq!(root.content, "");
        let cells: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&id| tree.get(id).unwrap().content.clone())
            .collect();
        assert_eq!(cells, ["row 1", "row 1"]);
    }

    #[test]
    fn newlines_and_tabs_become_spaces() {
        let tree = parse_fragment("<p>one\n\ttwo</p>").unwrap();
        assert_eq!(tree.get(tree.root()).unwrap().content, "one  two");
    }

    #[test]
    fn single_quoted_and_bare_values() {
        let tree = parse_fragment("<div id='a' width=4 focusable></div>").unwrap();
        let attrs = &tree.get(tree.root()).unwrap().attrs;
        assert_eq!(attrs.id, "a");
        assert_eq!(attrs.width, 4);
        assert!(attrs.focusable);
    }

    // ── Tokenizer ────────────────────────────────────────────────────

    #[test]
    fn entities_decode() {
        assert_eq!(decode_entities("&lt;b&gt; &quot;x&apos; &amp;"), "<b> \"x' &");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&nbsp;"), "&nbsp;");
    }

    #[test]
    fn tokens_in_order() {
        let mut reader = Reader::new("<a x=\"1\">hi</a>");
        assert_eq!(
            reader.next_token().unwrap(),
            Some(Token::Open {
                name: "a",
                attrs: vec![("x".into(), "1".into())],
                self_closing: false,
            })
        );
        assert_eq!(reader.next_token().unwrap(), Some(Token::Text("hi".into())));
        assert_eq!(reader.next_token().unwrap(), Some(Token::Close { name: "a" }));
        assert_eq!(reader.next_token().unwrap(), None);
    }
}
