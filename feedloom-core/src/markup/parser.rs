//! Single-pass, error-tolerant markup parser.
//!
//! The parser walks the input once with a cursor and a pointer to the
//! currently open element. It understands just enough XML for RSS and Atom:
//!
//! - elements, with self-closing `<x/>`
//! - text content and `<![CDATA[...]]>` sections
//! - comments, processing instructions and DOCTYPE, which are skipped
//! - attributes, but only on elements whose name contains `link`
//!
//! Closing tags are not matched against the open element's name; each one
//! pops exactly one level. On the first structural error the parser stops
//! descending and returns what it has built so far.

use feedloom_types::{MarkupError, MarkupErrorKind, NodeId, Span};
use memchr::{memchr, memmem};

use super::tree::{Attribute, ContentKind, MarkupTree, Node};

#[inline(always)]
const fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline(always)]
const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.')
}

/// Parses `source` into a markup tree.
///
/// Never fails: problems are recorded in [`MarkupTree::errors`] and the
/// partial tree is returned.
pub fn parse(source: &[u8]) -> MarkupTree<'_> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        current: None,
        tree: MarkupTree::empty(source),
    };
    parser.run();
    parser.finish()
}

struct Parser<'s> {
    src: &'s [u8],
    pos: usize,
    current: Option<NodeId>,
    tree: MarkupTree<'s>,
}

impl<'s> Parser<'s> {
    fn run(&mut self) {
        while self.tree.errors.is_empty() {
            self.skip_ws();
            if self.pos >= self.src.len() {
                break;
            }
            if self.src[self.pos] == b'<' {
                self.markup();
            } else {
                self.text();
            }
        }
    }

    fn finish(mut self) -> MarkupTree<'s> {
        let mut depth = 0u32;
        let mut open = self.current;
        while let Some(id) = open {
            depth += 1;
            open = self.tree.node(id).parent;
        }
        self.tree.open_depth = depth;

        if depth > 0 {
            log::trace!(target: "feedloom.markup", "input ended with {} open elements", depth);
        }
        self.tree
    }

    #[inline]
    fn error(&mut self, kind: MarkupErrorKind, offset: usize) {
        log::trace!(target: "feedloom.markup", "error at {}: {}", offset, kind.message());
        self.tree.errors.push(MarkupError::new(kind, offset));
    }

    #[inline]
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && is_ws(self.src[self.pos]) {
            self.pos += 1;
        }
    }

    #[inline]
    fn rest(&self) -> &'s [u8] {
        &self.src[self.pos..]
    }

    fn markup(&mut self) {
        let rest = self.rest();
        if rest.starts_with(b"</") {
            self.close_tag();
        } else if rest.starts_with(b"<!--") {
            self.skip_past(4, b"-->", "comment");
        } else if rest.starts_with(b"<![CDATA[") {
            self.cdata();
        } else if rest.starts_with(b"<!") {
            self.declaration();
        } else if rest.starts_with(b"<?") {
            self.skip_past(2, b"?>", "processing instruction");
        } else {
            self.open_tag();
        }
    }

    /// Moves the cursor past the next `marker`, searching from `skip` bytes in.
    fn skip_past(&mut self, skip: usize, marker: &[u8], context: &'static str) {
        let from = self.pos + skip;
        match memmem::find(&self.src[from.min(self.src.len())..], marker) {
            Some(rel) => self.pos = from + rel + marker.len(),
            None => {
                let at = self.pos;
                self.pos = self.src.len();
                self.error(MarkupErrorKind::UnexpectedEof { context }, at);
            }
        }
    }

    fn close_tag(&mut self) {
        let start = self.pos;
        let Some(rel) = memchr(b'>', &self.src[start + 2..]) else {
            self.pos = self.src.len();
            self.error(
                MarkupErrorKind::UnexpectedEof {
                    context: "closing tag",
                },
                start,
            );
            return;
        };
        self.pos = start + 2 + rel + 1;

        match self.current {
            Some(id) => self.current = self.tree.node(id).parent,
            None => self.error(MarkupErrorKind::UnbalancedClose, start),
        }
    }

    fn cdata(&mut self) {
        const OPEN: usize = b"<![CDATA[".len();
        let start = self.pos + OPEN;
        let Some(rel) = memmem::find(&self.src[start..], b"]]>") else {
            let at = self.pos;
            self.pos = self.src.len();
            self.error(
                MarkupErrorKind::UnexpectedEof {
                    context: "CDATA section",
                },
                at,
            );
            return;
        };

        if let Some(id) = self.current {
            let span = Span::from_range(start, start + rel);
            self.tree.nodes[id.index()].content = Some((span, ContentKind::Cdata));
        }
        self.pos = start + rel + 3;
    }

    /// `<!DOCTYPE ...>` and other declarations, including an internal
    /// `[...]` subset.
    fn declaration(&mut self) {
        let start = self.pos;
        let mut i = start + 2;
        let mut in_subset = false;
        while i < self.src.len() {
            match self.src[i] {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => {
                    self.pos = i + 1;
                    return;
                }
                _ => {}
            }
            i += 1;
        }
        self.pos = self.src.len();
        self.error(
            MarkupErrorKind::UnexpectedEof {
                context: "declaration",
            },
            start,
        );
    }

    fn open_tag(&mut self) {
        let tag_start = self.pos;
        self.pos += 1;

        let name_start = self.pos;
        while self.pos < self.src.len() && is_name_byte(self.src[self.pos]) {
            self.pos += 1;
        }
        if self.pos == name_start {
            self.error(MarkupErrorKind::MissingTagName, name_start);
            return;
        }
        let name = Span::from_range(name_start, self.pos);

        match self.src.get(self.pos) {
            Some(&b) if !is_ws(b) && b != b'/' && b != b'>' => {
                self.error(
                    MarkupErrorKind::UnexpectedChar {
                        found: b,
                        context: "tag name",
                    },
                    self.pos,
                );
                return;
            }
            _ => {}
        }

        if self.current.is_none() && self.tree.root.is_some() {
            self.error(MarkupErrorKind::MultipleRoots, tag_start);
            return;
        }

        let node = Node::new(name, self.tree.attributes.len() as u32);
        let id = self.tree.push_node(node);
        match self.current {
            Some(parent) => self.tree.append_child(parent, id),
            None => self.tree.root = Some(id),
        }

        if memmem::find(&self.src[name.range()], b"link").is_some() {
            self.attributes(id);
            if !self.tree.errors.is_empty() {
                return;
            }
        }

        let Some(gt) = self.find_tag_end() else {
            let at = self.pos;
            self.pos = self.src.len();
            self.error(MarkupErrorKind::UnexpectedEof { context: "tag" }, at);
            return;
        };

        let self_closing = gt > name.end() && self.src[gt - 1] == b'/';
        self.pos = gt + 1;
        if !self_closing {
            self.current = Some(id);
        }
    }

    /// Finds the `>` ending the current tag, stepping over quoted values.
    fn find_tag_end(&self) -> Option<usize> {
        let mut i = self.pos;
        while i < self.src.len() {
            match self.src[i] {
                b'>' => return Some(i),
                quote @ (b'"' | b'\'') => {
                    let close = memchr(quote, &self.src[i + 1..])?;
                    i += close + 2;
                }
                _ => i += 1,
            }
        }
        None
    }

    /// Reads `name="value"` pairs up to the tag terminator.
    fn attributes(&mut self, id: NodeId) {
        loop {
            self.skip_ws();
            if self.pos >= self.src.len() {
                self.error(
                    MarkupErrorKind::UnexpectedEof {
                        context: "attribute list",
                    },
                    self.pos,
                );
                return;
            }

            let b = self.src[self.pos];
            if b == b'/' || b == b'>' {
                return;
            }

            let name_start = self.pos;
            while self.pos < self.src.len() && is_name_byte(self.src[self.pos]) {
                self.pos += 1;
            }
            if self.pos == name_start {
                self.error(
                    MarkupErrorKind::UnexpectedChar {
                        found: b,
                        context: "attribute name",
                    },
                    name_start,
                );
                return;
            }
            let name = Span::from_range(name_start, self.pos);

            self.skip_ws();
            if self.pos >= self.src.len() || self.src[self.pos] != b'=' {
                self.error(MarkupErrorKind::MissingEquals, self.pos);
                return;
            }
            self.pos += 1;
            self.skip_ws();

            let quote = self.src.get(self.pos).copied();
            let Some(quote @ (b'"' | b'\'')) = quote else {
                self.error(MarkupErrorKind::MissingQuote, self.pos);
                return;
            };
            let value_start = self.pos + 1;
            let Some(rel) = memchr(quote, &self.src[value_start..]) else {
                self.pos = self.src.len();
                self.error(
                    MarkupErrorKind::UnexpectedEof {
                        context: "attribute value",
                    },
                    value_start,
                );
                return;
            };
            let value = Span::from_range(value_start, value_start + rel);
            self.pos = value_start + rel + 1;

            self.tree.attributes.push(Attribute { name, value });
            self.tree.nodes[id.index()].attr_len += 1;
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        let end = memchr(b'<', self.rest()).map_or(self.src.len(), |rel| start + rel);
        self.pos = end;

        let mut trimmed = end;
        while trimmed > start && is_ws(self.src[trimmed - 1]) {
            trimmed -= 1;
        }

        if let Some(id) = self.current {
            let span = Span::from_range(start, trimmed);
            self.tree.nodes[id.index()].content = Some((span, ContentKind::Text));
        }
    }
}
