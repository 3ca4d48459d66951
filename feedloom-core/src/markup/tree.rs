//! Arena-backed markup tree.
//!
//! All nodes live in one vector owned by the tree and refer to each other by
//! [`NodeId`]. Names, text and attribute values are [`Span`]s into the
//! source document, which the tree borrows.

use std::borrow::Cow;

use feedloom_types::{MarkupError, NodeId, Span};

use super::entities::decode_entities;

/// How a node's text content was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Character data; may contain entity references.
    Text,
    /// A `<![CDATA[...]]>` section; taken literally.
    Cdata,
}

/// One `name="value"` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: Span,
    /// Value without the surrounding quotes.
    pub value: Span,
}

/// A named element.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub(crate) name: Span,
    pub(crate) content: Option<(Span, ContentKind)>,
    pub(crate) attr_start: u32,
    pub(crate) attr_len: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(name: Span, attr_start: u32) -> Self {
        Self {
            name,
            content: None,
            attr_start,
            attr_len: 0,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    /// Span of the tag name.
    #[inline(always)]
    pub fn name_span(&self) -> Span {
        self.name
    }

    /// Span and kind of the text content, if any.
    #[inline(always)]
    pub fn content(&self) -> Option<(Span, ContentKind)> {
        self.content
    }

    /// Enclosing element; `None` for the root.
    #[inline(always)]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// First child in document order.
    #[inline(always)]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// Last child in document order.
    #[inline(always)]
    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    /// Previous sibling in document order.
    #[inline(always)]
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    /// Next sibling in document order.
    #[inline(always)]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }
}

/// Result of parsing one document.
///
/// A tree is returned even when parsing failed; check [`errors`](Self::errors).
pub struct MarkupTree<'src> {
    pub(crate) source: &'src [u8],
    pub(crate) nodes: Vec<Node>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) errors: Vec<MarkupError>,
    pub(crate) root: Option<NodeId>,
    pub(crate) open_depth: u32,
    pub(crate) feed_title: Option<NodeId>,
    pub(crate) first_item: Option<NodeId>,
}

impl<'src> MarkupTree<'src> {
    pub(crate) fn empty(source: &'src [u8]) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            attributes: Vec::new(),
            errors: Vec::new(),
            root: None,
            open_depth: 0,
            feed_title: None,
            first_item: None,
        }
    }

    /// The document the tree was built from.
    #[inline(always)]
    pub fn source(&self) -> &'src [u8] {
        self.source
    }

    /// The top-level element.
    #[inline(always)]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no element was parsed.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Structural errors, in detection order.
    #[inline(always)]
    pub fn errors(&self) -> &[MarkupError] {
        &self.errors
    }

    /// Returns true if the parser recorded any error.
    #[inline(always)]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of elements still open when the input ended.
    ///
    /// Non-zero means the document had unbalanced tags. This is not recorded
    /// as an error.
    #[inline(always)]
    pub fn open_depth(&self) -> u32 {
        self.open_depth
    }

    /// Title node found by [`locate_feed`](Self::locate_feed).
    #[inline(always)]
    pub fn feed_title(&self) -> Option<NodeId> {
        self.feed_title
    }

    /// First item/entry node found by [`locate_feed`](Self::locate_feed).
    #[inline(always)]
    pub fn first_item(&self) -> Option<NodeId> {
        self.first_item
    }

    /// Node data.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Raw bytes of a span of the source.
    #[inline(always)]
    pub fn slice(&self, span: Span) -> &'src [u8] {
        &self.source[span.range()]
    }

    /// Tag name of a node.
    #[inline]
    pub fn name(&self, id: NodeId) -> &'src str {
        let bytes = self.slice(self.node(id).name);
        // SAFETY: the parser only accepts ASCII alphanumerics and `:_-.` as
        // name bytes, so every name span is valid UTF-8.
        unsafe { core::str::from_utf8_unchecked(bytes) }
    }

    /// Raw text content of a node, as written.
    #[inline]
    pub fn raw_content(&self, id: NodeId) -> Option<&'src [u8]> {
        self.node(id).content.map(|(span, _)| self.slice(span))
    }

    /// Text content with character references decoded.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD. CDATA content is returned
    /// literally.
    pub fn text(&self, id: NodeId) -> Option<Cow<'src, str>> {
        let (span, kind) = self.node(id).content?;
        let text = String::from_utf8_lossy(self.slice(span));
        Some(match kind {
            ContentKind::Cdata => text,
            ContentKind::Text => decode_cow(text),
        })
    }

    /// Attributes of a node in source order.
    #[inline]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        let node = self.node(id);
        let start = node.attr_start as usize;
        &self.attributes[start..start + node.attr_len as usize]
    }

    /// Decoded value of the first attribute named `name`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<Cow<'src, str>> {
        self.attributes(id)
            .iter()
            .find(|a| self.slice(a.name) == name.as_bytes())
            .map(|a| self.attribute_value(a))
    }

    /// Decoded value of an attribute.
    pub fn attribute_value(&self, attr: &Attribute) -> Cow<'src, str> {
        decode_cow(String::from_utf8_lossy(self.slice(attr.value)))
    }

    /// Direct children of `id` in document order.
    #[inline]
    pub fn children(&self, id: NodeId) -> Children<'_, 'src> {
        Children {
            tree: self,
            next: self.node(id).first_child,
        }
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev = self.nodes[parent.index()].last_child;
        {
            let c = &mut self.nodes[child.index()];
            c.parent = Some(parent);
            c.prev_sibling = prev;
        }
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }
}

fn decode_cow(text: Cow<'_, str>) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => decode_entities(s),
        Cow::Owned(s) => {
            let decoded = match decode_entities(&s) {
                Cow::Owned(decoded) => Some(decoded),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(decoded.unwrap_or(s))
        }
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'t, 'src> {
    tree: &'t MarkupTree<'src>,
    next: Option<NodeId>,
}

impl Iterator for Children<'_, '_> {
    type Item = NodeId;

    #[inline]
    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.node(id).next_sibling;
        Some(id)
    }
}
