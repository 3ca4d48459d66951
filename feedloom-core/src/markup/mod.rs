//! Markup tree parsing for RSS and Atom documents.
//!
//! This module provides the document side of the pipeline:
//! - **Parser**: turns raw bytes into a [`MarkupTree`] without ever failing
//! - **Tree**: arena of nodes addressed by [`NodeId`](feedloom_types::NodeId)
//! - **Lookups**: title, item and link discovery on a finished tree
//! - **Entities**: decoding of XML character references in text

pub mod entities;
mod lookup;
pub mod parser;
pub mod tree;

pub use parser::parse;
pub use tree::{Attribute, Children, ContentKind, MarkupTree, Node};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{HeapPages, Region};
    use feedloom_types::{MarkupErrorKind, RegionConfig};

    fn scratch() -> Region<HeapPages> {
        Region::reserve_with(RegionConfig::small()).expect("reserve")
    }

    fn child_names<'a>(tree: &'a MarkupTree<'_>, id: feedloom_types::NodeId) -> Vec<&'a str> {
        tree.children(id).map(|c| tree.name(c)).collect()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated -->
<rss version="2.0">
  <channel>
    <title>Example &amp; Co</title>
    <link>https://example.test/</link>
    <item>
      <title>First</title>
      <link>https://example.test/1</link>
      <pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate>
    </item>
    <item>
      <title><![CDATA[Second <b>bold</b>]]></title>
      <link>https://example.test/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_rss_structure() {
        let tree = parse(RSS.as_bytes());
        assert!(!tree.has_errors(), "{:?}", tree.errors());
        assert_eq!(tree.open_depth(), 0);

        let root = tree.root().expect("root");
        assert_eq!(tree.name(root), "rss");
        let channel = tree.find_item_child_node(root, "channel").expect("channel");
        assert_eq!(
            child_names(&tree, channel),
            vec!["title", "link", "item", "item"]
        );
    }

    #[test]
    fn text_is_decoded_and_trimmed() {
        let tree = parse(b"<a>  Tom &amp; Jerry \n </a>");
        let root = tree.root().expect("root");
        assert_eq!(tree.text(root).as_deref(), Some("Tom & Jerry"));
        assert_eq!(tree.raw_content(root), Some(&b"Tom &amp; Jerry"[..]));
    }

    #[test]
    fn cdata_is_literal() {
        let tree = parse(b"<t><![CDATA[a &amp; <b>]]></t>");
        let root = tree.root().expect("root");
        assert_eq!(tree.text(root).as_deref(), Some("a &amp; <b>"));
        assert_eq!(tree.node(root).content().map(|c| c.1), Some(ContentKind::Cdata));
        assert!(tree.node(root).first_child().is_none());
    }

    #[test]
    fn comments_pi_and_doctype_create_no_nodes() {
        let src = b"<?xml version='1.0'?><!DOCTYPE rss [<!ENTITY x 'y'>]><!-- c --><rss><!-- inner --></rss>";
        let tree = parse(src);
        assert!(!tree.has_errors(), "{:?}", tree.errors());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn self_closing_pops_one_level() {
        let tree = parse(b"<a><b/><c>x</c></a>");
        let root = tree.root().expect("root");
        assert_eq!(child_names(&tree, root), vec!["b", "c"]);
        assert_eq!(tree.open_depth(), 0);
    }

    #[test]
    fn self_closing_inside_text_pops_one_level() {
        let tree = parse(b"<r><a>hi<b/>there</a><c/></r>");
        assert!(!tree.has_errors(), "{:?}", tree.errors());
        assert_eq!(tree.open_depth(), 0);
        let root = tree.root().expect("root");
        assert_eq!(child_names(&tree, root), vec!["a", "c"]);
        let a = tree.find_item_child_node(root, "a").expect("a");
        assert_eq!(child_names(&tree, a), vec!["b"]);
    }

    #[test]
    fn junk_after_tag_name_is_an_error() {
        let tree = parse(b"<r><title@x>T</title></r>");
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(
            tree.errors()[0].kind,
            MarkupErrorKind::UnexpectedChar {
                found: b'@',
                context: "tag name"
            }
        );
        assert_eq!(tree.errors()[0].offset, 9);
        let root = tree.root().expect("root");
        assert!(child_names(&tree, root).is_empty());
    }

    #[test]
    fn siblings_are_doubly_linked() {
        let tree = parse(b"<r><a/><b/><c/></r>");
        let root = tree.root().expect("root");
        let first = tree.node(root).first_child().expect("a");
        let last = tree.node(root).last_child().expect("c");
        let middle = tree.node(first).next_sibling().expect("b");
        assert_eq!(tree.name(middle), "b");
        assert_eq!(tree.node(middle).prev_sibling(), Some(first));
        assert_eq!(tree.node(middle).next_sibling(), Some(last));
        assert_eq!(tree.node(last).parent(), Some(root));
    }

    #[test]
    fn attributes_only_on_link_like_tags() {
        let tree = parse(br#"<feed a="1"><atom:link href="x" rel='self'/><id b="2">u</id></feed>"#);
        assert!(!tree.has_errors(), "{:?}", tree.errors());
        let root = tree.root().expect("root");
        assert!(tree.attributes(root).is_empty());

        let link = tree.find_item_child_node(root, "atom:link").expect("link");
        assert_eq!(tree.attributes(link).len(), 2);
        assert_eq!(tree.attribute(link, "rel").as_deref(), Some("self"));

        let id = tree.find_item_child_node(root, "id").expect("id");
        assert!(tree.attributes(id).is_empty());
        assert_eq!(tree.text(id).as_deref(), Some("u"));
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let tree = parse(br#"<r><a title="x>y">t</a></r>"#);
        assert!(!tree.has_errors());
        let root = tree.root().expect("root");
        let a = tree.find_item_child_node(root, "a").expect("a");
        assert_eq!(tree.text(a).as_deref(), Some("t"));
    }

    #[test]
    fn missing_equals_is_an_error() {
        let tree = parse(br#"<r><link href "x"/><after/></r>"#);
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.errors()[0].kind, MarkupErrorKind::MissingEquals);
        assert_eq!(tree.errors()[0].offset, 14);
        // Parsing stopped; the partial tree is still there.
        let root = tree.root().expect("root");
        assert_eq!(child_names(&tree, root), vec!["link"]);
    }

    #[test]
    fn unquoted_value_is_an_error() {
        let tree = parse(b"<link href=x/>");
        assert_eq!(tree.errors()[0].kind, MarkupErrorKind::MissingQuote);
    }

    #[test]
    fn bad_attribute_name_is_an_error() {
        let tree = parse(b"<link #x='1'/>");
        assert!(matches!(
            tree.errors()[0].kind,
            MarkupErrorKind::UnexpectedChar { found: b'#', .. }
        ));
    }

    #[test]
    fn unterminated_markup_degrades() {
        let tree = parse(b"<rss><channel>");
        assert!(!tree.has_errors());
        assert_eq!(tree.open_depth(), 2);
        let root = tree.root().expect("root");
        assert_eq!(child_names(&tree, root), vec!["channel"]);
    }

    #[test]
    fn unterminated_comment_is_reported() {
        let tree = parse(b"<r><!-- never closed");
        assert!(matches!(
            tree.errors()[0].kind,
            MarkupErrorKind::UnexpectedEof { context: "comment" }
        ));
    }

    #[test]
    fn stray_close_and_second_root() {
        let tree = parse(b"</x>");
        assert_eq!(tree.errors()[0].kind, MarkupErrorKind::UnbalancedClose);

        let tree = parse(b"<a/><b/>");
        assert_eq!(tree.errors()[0].kind, MarkupErrorKind::MultipleRoots);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn empty_and_text_only_input() {
        assert!(parse(b"").root().is_none());
        let tree = parse(b"   just words  ");
        assert!(tree.root().is_none());
        assert!(!tree.has_errors());
    }

    #[test]
    fn finds_title_and_first_item() {
        let mut scratch = scratch();
        let mut tree = parse(RSS.as_bytes());
        tree.locate_feed(&mut scratch);

        let title = tree.feed_title().expect("title");
        assert_eq!(tree.text(title).as_deref(), Some("Example & Co"));

        let item = tree.first_item().expect("item");
        let item_title = tree.find_item_child_node(item, "title").expect("title");
        assert_eq!(tree.text(item_title).as_deref(), Some("First"));
        assert_eq!(tree.item_siblings(item).count(), 2);

        assert_eq!(scratch.current(), 0);
    }

    #[test]
    fn atom_entry_is_an_item() {
        let mut scratch = scratch();
        let src = br#"<feed><title>A</title><entry><title>E</title></entry></feed>"#;
        let tree = parse(src);
        let entry = tree.find_item_node(&mut scratch).expect("entry");
        assert_eq!(tree.name(entry), "entry");
    }

    #[test]
    fn missing_title_and_items() {
        let mut scratch = scratch();
        let tree = parse(b"<rss><channel><description>d</description></channel></rss>");
        assert!(tree.find_feed_title(&mut scratch).is_none());
        assert!(tree.find_item_node(&mut scratch).is_none());
    }

    #[test]
    fn deep_documents_do_not_leak_scratch() {
        let mut scratch = scratch();
        let mut src = String::new();
        for _ in 0..5000 {
            src.push_str("<d>");
        }
        src.push_str("<title>deep</title>");
        let tree = parse(src.as_bytes());
        let before = scratch.current();
        let title = tree.find_feed_title(&mut scratch).expect("title");
        assert_eq!(tree.text(title).as_deref(), Some("deep"));
        assert_eq!(scratch.current(), before);
    }

    #[test]
    fn link_from_alternate_html_attributes() {
        let tree = parse(br#"<link href="X" rel="alternate" type="text/html"/>"#);
        let link = tree.root().expect("link");
        assert_eq!(tree.find_link(link).as_deref(), Some("X"));
    }

    #[test]
    fn link_prefers_text_then_alternate_then_any_href() {
        let tree = parse(
            br#"<entry><link rel="replies" href="R"/><link rel="alternate" type="text/html" href="A"/></entry>"#,
        );
        let entry = tree.root().expect("entry");
        assert_eq!(tree.find_link(entry).as_deref(), Some("A"));

        let tree = parse(br#"<entry><link rel="self" href="S"/><link href="T"/></entry>"#);
        let entry = tree.root().expect("entry");
        assert_eq!(tree.find_link(entry).as_deref(), Some("S"));

        let tree = parse(br#"<item><link>https://t.test/?a=1&amp;b=2</link></item>"#);
        let item = tree.root().expect("item");
        assert_eq!(tree.find_link(item).as_deref(), Some("https://t.test/?a=1&b=2"));

        let tree = parse(b"<item><title>x</title></item>");
        let item = tree.root().expect("item");
        assert!(tree.find_link(item).is_none());
    }
}
