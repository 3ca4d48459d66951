//! End-to-end runs of the worker pool with an in-memory fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use feedloom_core::ingest::{Fetcher, FileFetcher, MemorySink, WorkerPool};
use feedloom_types::{FetchError, PersistPolicy, PipelineConfig};

struct StaticFetcher(HashMap<&'static str, &'static str>);

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.0
            .get(url)
            .map(|doc| doc.as_bytes().to_vec())
            .ok_or_else(|| FetchError {
                url: url.to_string(),
                reason: "404".to_string(),
            })
    }
}

const RSS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Release notes</title>
    <link>https://rss.test/</link>
    <item>
      <title>v1.0 &amp; friends</title>
      <link>https://rss.test/v1</link>
      <updated>2020-01-01T00:00:00Z</updated>
      <pubDate>Sun, 14 May 2023 19:32:11 GMT</pubDate>
    </item>
    <item>
      <title>v1.1</title>
      <link>https://rss.test/v1.1</link>
      <dc:date>2023-05-15T19:32:11+00:00</dc:date>
    </item>
    <item>
      <title>undated</title>
      <link>https://rss.test/v1.2</link>
    </item>
  </channel>
</rss>"#;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">Atom log</title>
  <link rel="self" href="https://atom.test/feed.xml"/>
  <entry>
    <title><![CDATA[Tags <like> these]]></title>
    <link rel="replies" href="https://atom.test/a/comments"/>
    <link rel="alternate" type="text/html" href="https://atom.test/a"/>
    <published>2023-05-14T21:32:11+02:00</published>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

const UNTITLED: &str = "<rss><channel><item><link>https://x.test/</link></item></channel></rss>";
const MALFORMED: &str = r#"<rss><channel><title>T</title><link href="unterminated></channel></rss>"#;

fn fetcher() -> Arc<StaticFetcher> {
    Arc::new(StaticFetcher(HashMap::from([
        ("rss", RSS),
        ("atom", ATOM),
        ("untitled", UNTITLED),
        ("malformed", MALFORMED),
        ("empty", ""),
    ])))
}

fn run(config: PipelineConfig, urls: &[&str]) -> (Arc<MemorySink>, feedloom_core::IngestStats) {
    let sink = Arc::new(MemorySink::new());
    let mut pool = WorkerPool::spawn(config, fetcher(), sink.clone()).expect("spawn");
    for url in urls {
        assert!(pool.enqueue(*url));
    }
    let stats = pool.join();
    (sink, stats)
}

#[test]
fn rss_and_atom_end_to_end() {
    let (sink, stats) = run(PipelineConfig::single_worker(), &["rss", "atom"]);

    assert_eq!(stats.feeds_ok, 2);
    assert_eq!(stats.feeds_failed, 0);
    assert_eq!(stats.entries_emitted, 3);
    assert_eq!(stats.entries_skipped, 1);

    let rss = sink.feed("rss").expect("rss feed");
    assert_eq!(rss.title, "Release notes");

    let v1 = sink.entry("https://rss.test/v1").expect("v1");
    assert_eq!(v1.title, "v1.0 & friends");
    assert_eq!(v1.published, 1_684_092_731);
    assert_eq!(v1.feed_url, "rss");

    let v11 = sink.entry("https://rss.test/v1.1").expect("v1.1");
    assert_eq!(v11.published, 1_684_092_731 + 86_400);
    assert!(sink.entry("https://rss.test/v1.2").is_none());

    let atom = sink.feed("atom").expect("atom feed");
    assert_eq!(atom.title, "Atom log");
    let a = sink.entry("https://atom.test/a").expect("atom entry");
    assert_eq!(a.title, "Tags <like> these");
    assert_eq!(a.published, 1_684_092_731);
}

#[test]
fn broken_feeds_are_dropped_whole() {
    let (sink, stats) = run(
        PipelineConfig::single_worker(),
        &["untitled", "malformed", "empty", "missing", "rss"],
    );

    assert_eq!(stats.feeds_failed, 4);
    assert_eq!(stats.feeds_ok, 1);
    assert_eq!(sink.feed_count(), 1);
    assert!(sink.feed("untitled").is_none());
    assert!(sink.entry("https://x.test/").is_none());
    assert!(sink.feed("malformed").is_none());
}

#[test]
fn parallel_workers_retaining_documents() {
    let config = PipelineConfig {
        workers: 3,
        persist: PersistPolicy::RetainAll,
        ..PipelineConfig::single_worker()
    };
    let urls: Vec<&str> = ["rss", "atom", "untitled"]
        .iter()
        .cycle()
        .take(30)
        .copied()
        .collect();
    let (sink, stats) = run(config, &urls);

    assert_eq!(stats.feeds_ok, 20);
    assert_eq!(stats.feeds_failed, 10);
    assert_eq!(stats.entries_emitted, 30);
    assert_eq!(sink.feed_count(), 2);
    assert_eq!(sink.entry_count(), 3);
}

#[test]
fn file_fetcher_feeds_the_pool() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("feed.xml"), RSS).expect("write");

    let sink = Arc::new(MemorySink::new());
    let mut pool = WorkerPool::spawn(
        PipelineConfig::single_worker(),
        Arc::new(FileFetcher::with_root(dir.path())),
        sink.clone(),
    )
    .expect("spawn");
    pool.enqueue("feed.xml");
    pool.enqueue("absent.xml");
    let stats = pool.join();

    assert_eq!(stats.feeds_ok, 1);
    assert_eq!(stats.feeds_failed, 1);
    assert_eq!(
        sink.feed("feed.xml").map(|f| f.title).as_deref(),
        Some("Release notes")
    );
}
