//! Post-parse lookups on a completed tree.
//!
//! The depth-first searches keep their traversal stack in a scratch region
//! and roll it back before returning, so nothing leaks into the caller's
//! allocations.

use std::borrow::Cow;

use feedloom_types::NodeId;

use super::tree::MarkupTree;
use crate::region::{IdStack, PageSource, Region};

impl<'src> MarkupTree<'src> {
    /// First node named `title` in document order.
    pub fn find_feed_title<P: PageSource>(&self, scratch: &mut Region<P>) -> Option<NodeId> {
        self.find_first(scratch, |name| name == "title")
    }

    /// First `item` (RSS) or `entry` (Atom) node in document order.
    pub fn find_item_node<P: PageSource>(&self, scratch: &mut Region<P>) -> Option<NodeId> {
        self.find_first(scratch, is_item_name)
    }

    /// Runs both lookups and records the results on the tree.
    pub fn locate_feed<P: PageSource>(&mut self, scratch: &mut Region<P>) {
        self.feed_title = self.find_feed_title(scratch);
        self.first_item = self.find_item_node(scratch);
    }

    /// Direct child of `item` named `name`.
    pub fn find_item_child_node(&self, item: NodeId, name: &str) -> Option<NodeId> {
        self.children(item).find(|&child| self.name(child) == name)
    }

    /// Following siblings of `item` that are items or entries too.
    pub fn item_siblings(&self, item: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(Some(item), move |&id| self.node(id).next_sibling())
            .filter(move |&id| is_item_name(self.name(id)))
    }

    /// Web link of an item.
    ///
    /// In order of preference:
    /// 1. the text of a `link` child (RSS)
    /// 2. the `href` of a `link` with `rel="alternate"` and `type="text/html"`
    /// 3. the first `href` of any `link`
    pub fn find_link(&self, item: NodeId) -> Option<Cow<'src, str>> {
        let is_link = |id: &NodeId| self.name(*id) == "link";
        let own = Some(item).filter(is_link);
        let links = || own.into_iter().chain(self.children(item).filter(is_link));

        for link in links() {
            if let Some(text) = self.text(link) {
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        let mut fallback = None;
        for link in links() {
            let Some(href) = self.attribute(link, "href") else {
                continue;
            };
            let rel = self.attribute(link, "rel");
            let kind = self.attribute(link, "type");
            if rel.as_deref() == Some("alternate") && kind.as_deref() == Some("text/html") {
                return Some(href);
            }
            if fallback.is_none() {
                fallback = Some(href);
            }
        }
        fallback
    }

    fn find_first<P, F>(&self, scratch: &mut Region<P>, matches: F) -> Option<NodeId>
    where
        P: PageSource,
        F: Fn(&str) -> bool,
    {
        let root = self.root?;
        let checkpoint = scratch.checkpoint();

        let found = {
            let mut stack = IdStack::new(scratch);
            stack.push(root.0);
            let mut found = None;

            while let Some(raw) = stack.pop() {
                let id = NodeId(raw);
                if matches(self.name(id)) {
                    found = Some(id);
                    break;
                }
                // Reverse order so the first child is popped first.
                let mut child = self.node(id).last_child();
                while let Some(c) = child {
                    stack.push(c.0);
                    child = self.node(c).prev_sibling();
                }
            }
            found
        };

        scratch.restore(checkpoint);
        found
    }
}

#[inline]
fn is_item_name(name: &str) -> bool {
    name == "item" || name == "entry"
}
