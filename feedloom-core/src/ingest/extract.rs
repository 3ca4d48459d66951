//! Turning a located markup tree into persistence records.

use core::fmt;

use feedloom_types::{DateTimeError, EntryRecord, FeedRecord, MarkupError, NodeId};
use smallvec::SmallVec;

use crate::datetime::parse_date_time;
use crate::markup::MarkupTree;

/// Child names that may carry an entry's date, most preferred first.
pub const DATE_KEYS: [&str; 4] = ["pubDate", "published", "dc:date", "updated"];

/// Entries of one feed. Most feeds fit inline.
pub type EntryBatch = SmallVec<[EntryRecord; 32]>;

/// A feed that produced records.
#[derive(Debug)]
pub struct ExtractedFeed {
    pub feed: FeedRecord,
    pub entries: EntryBatch,
    /// Entries dropped for a missing link or date.
    pub skipped: u64,
}

/// Why a whole feed was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRejection {
    /// The parser recorded errors.
    Malformed(Vec<MarkupError>),
    /// No `title` element anywhere in the document.
    MissingTitle,
}

impl fmt::Display for FeedRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedRejection::Malformed(errors) => {
                write!(f, "malformed markup")?;
                for e in errors {
                    write!(f, "; {}", e)?;
                }
                Ok(())
            }
            FeedRejection::MissingTitle => write!(f, "no title element"),
        }
    }
}

/// Why a single entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySkip {
    MissingLink,
    MissingDate,
    BadDate(DateTimeError),
}

impl fmt::Display for EntrySkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySkip::MissingLink => write!(f, "no link"),
            EntrySkip::MissingDate => write!(f, "no date"),
            EntrySkip::BadDate(e) => write!(f, "bad date: {}", e),
        }
    }
}

/// Builds the feed record and every usable entry.
///
/// Expects [`MarkupTree::locate_feed`] to have run. Nothing is returned for
/// a rejected feed, so a partial feed can never reach persistence.
pub fn extract_feed(tree: &MarkupTree<'_>, url: &str) -> Result<ExtractedFeed, FeedRejection> {
    if tree.has_errors() {
        return Err(FeedRejection::Malformed(tree.errors().to_vec()));
    }
    let title = tree.feed_title().ok_or(FeedRejection::MissingTitle)?;

    let feed = FeedRecord {
        url: url.to_string(),
        title: tree.text(title).map(|t| t.into_owned()).unwrap_or_default(),
    };

    let mut entries = EntryBatch::new();
    let mut skipped = 0;
    if let Some(first) = tree.first_item() {
        for item in tree.item_siblings(first) {
            match extract_entry(tree, item, url) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    log::warn!(target: "feedloom.ingest", "{}: skipping entry {}: {}", url, item, reason);
                    skipped += 1;
                }
            }
        }
    }

    Ok(ExtractedFeed {
        feed,
        entries,
        skipped,
    })
}

/// One `item`/`entry` node to a record.
pub fn extract_entry(
    tree: &MarkupTree<'_>,
    item: NodeId,
    feed_url: &str,
) -> Result<EntryRecord, EntrySkip> {
    let link = tree.find_link(item).ok_or(EntrySkip::MissingLink)?;

    let date = DATE_KEYS
        .iter()
        .find_map(|key| tree.find_item_child_node(item, key))
        .and_then(|node| tree.text(node))
        .ok_or(EntrySkip::MissingDate)?;
    let published = parse_date_time(&date).map_err(EntrySkip::BadDate)?;

    let title = tree
        .find_item_child_node(item, "title")
        .and_then(|node| tree.text(node))
        .map(|t| t.into_owned())
        .unwrap_or_default();

    Ok(EntryRecord {
        link: link.into_owned(),
        title,
        published: published.unix_seconds,
        feed_url: feed_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;
    use crate::region::{HeapPages, Region};
    use feedloom_types::{DateErrorKind, RegionConfig};

    fn extract(src: &str) -> Result<ExtractedFeed, FeedRejection> {
        let mut scratch: Region<HeapPages> =
            Region::reserve_with(RegionConfig::small()).expect("reserve");
        let mut tree = parse(src.as_bytes());
        tree.locate_feed(&mut scratch);
        extract_feed(&tree, "https://feed.test/rss")
    }

    #[test]
    fn rss_feed() {
        let out = extract(
            r#"<rss><channel><title>News</title>
            <item><title>One</title><link>https://n.test/1</link>
              <pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate></item>
            <item><link>https://n.test/2</link>
              <pubDate>Mon, 15 May 2023 19:32:11 GMT</pubDate></item>
            </channel></rss>"#,
        )
        .expect("feed");

        assert_eq!(out.feed.title, "News");
        assert_eq!(out.feed.url, "https://feed.test/rss");
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.skipped, 0);
        assert_eq!(out.entries[0].title, "One");
        assert_eq!(out.entries[0].published, 1_684_092_731);
        assert_eq!(out.entries[1].title, "");
        assert_eq!(out.entries[1].published, 1_684_092_731 + 86_400);
        assert_eq!(out.entries[1].feed_url, "https://feed.test/rss");
    }

    #[test]
    fn pub_date_beats_updated() {
        let out = extract(
            r#"<rss><title>T</title><item><link>L</link>
              <updated>2020-01-01T00:00:00Z</updated>
              <pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate>
            </item></rss>"#,
        )
        .expect("feed");
        assert_eq!(out.entries[0].published, 1_684_092_731);
    }

    #[test]
    fn atom_feed_uses_alternate_link_and_updated() {
        let out = extract(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
              <title>Atom</title>
              <link rel="self" href="https://a.test/feed"/>
              <entry>
                <title>E</title>
                <link rel="alternate" type="text/html" href="https://a.test/e"/>
                <updated>2023-05-14T19:32:11Z</updated>
              </entry>
            </feed>"#,
        )
        .expect("feed");
        assert_eq!(out.feed.title, "Atom");
        assert_eq!(out.entries[0].link, "https://a.test/e");
        assert_eq!(out.entries[0].published, 1_684_092_731);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let out = extract(
            r#"<rss><title>T</title>
              <item><title>no link</title><pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate></item>
              <item><link>x</link></item>
              <item><link>y</link><pubDate>yesterday</pubDate></item>
              <item><link>z</link><pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate></item>
            </rss>"#,
        )
        .expect("feed");
        assert_eq!(out.skipped, 3);
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].link, "z");
    }

    #[test]
    fn feed_without_items_is_valid() {
        let out = extract("<rss><channel><title>Empty</title></channel></rss>").expect("feed");
        assert!(out.entries.is_empty());
    }

    #[test]
    fn rejections() {
        assert_eq!(
            extract("<rss><channel></channel></rss>").unwrap_err(),
            FeedRejection::MissingTitle
        );
        let err = extract(r#"<rss><title>T</title><link href=x/></rss>"#).unwrap_err();
        assert!(matches!(err, FeedRejection::Malformed(ref e) if e.len() == 1));
        assert!(err.to_string().starts_with("malformed markup; "));
    }

    #[test]
    fn entry_skip_reasons() {
        let mut scratch: Region<HeapPages> =
            Region::reserve_with(RegionConfig::small()).expect("reserve");
        let mut tree = parse(b"<item><link>l</link><dc:date>soon</dc:date></item>");
        tree.locate_feed(&mut scratch);
        let item = tree.first_item().expect("item");
        match extract_entry(&tree, item, "f") {
            Err(EntrySkip::BadDate(e)) => assert!(matches!(
                e.kind,
                DateErrorKind::MissingDelimiter {
                    field: "weekday",
                    ..
                }
            )),
            other => panic!("unexpected {:?}", other),
        }
    }
}
