//! Crawl controller tests: in-memory store, fake HTTP client, temp dirs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{AlbumCrawl, CrawlContext, ListingCrawl};
use crate::assets::{AssetAcquirer, ShardFrom, ShardLayout};
use crate::cache::ResponseCache;
use crate::checkpoint::{open_memory, CheckpointStore};
use crate::cursor::ResumeCursor;
use crate::fetcher::Fetcher;
use crate::http::fake::{FakeClient, FakeResponse};
use crate::rate::RateController;
use crate::retry::RetryPolicy;
use crate::scheduler::BatchScheduler;
use crate::sources::{allmusic, itunes};

const LIMIT: u32 = 200;

struct Harness {
    cache: tempfile::TempDir,
    data: tempfile::TempDir,
    client: Arc<FakeClient>,
    store: CheckpointStore,
}

impl Harness {
    async fn new(keys: &[&str]) -> Self {
        let store = open_memory().await.unwrap();
        store.add_keys(keys).await.unwrap();
        Self {
            cache: tempfile::tempdir().unwrap(),
            data: tempfile::tempdir().unwrap(),
            client: Arc::new(FakeClient::new()),
            store,
        }
    }

    fn cursor_path(&self) -> PathBuf {
        self.data.path().join("cursor.txt")
    }

    fn asset_root(&self) -> PathBuf {
        self.data.path().join("itunes")
    }

    fn context(&self, store: CheckpointStore, batch: usize, delay_ms: u64) -> CrawlContext {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        };
        let fetcher = Fetcher::new(
            ResponseCache::new(self.cache.path()),
            self.client.clone(),
            policy,
        );
        CrawlContext::new(
            fetcher,
            store,
            RateController::from_millis(delay_ms),
            BatchScheduler::new(batch),
        )
    }

    fn albums(&self, batch: usize, delay_ms: u64) -> Arc<AlbumCrawl> {
        self.albums_with_store(self.store.clone(), batch, delay_ms)
    }

    fn albums_with_store(&self, store: CheckpointStore, batch: usize, delay_ms: u64) -> Arc<AlbumCrawl> {
        let ctx = self.context(store, batch, delay_ms);
        let acquirer = AssetAcquirer::new(
            self.asset_root(),
            ShardLayout::new(3, ShardFrom::Leading),
            ctx.fetcher.clone(),
        );
        Arc::new(AlbumCrawl::new(ctx, acquirer, self.cursor_path(), LIMIT))
    }

    /// Route a search for `artist` returning albums with the given ids.
    fn search(&self, artist: &str, ids: &[u64]) {
        let results: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"wrapperType":"collection","collectionType":"Album","collectionId":{id},
                        "artistName":"{artist}","artworkUrl100":"https://art.test/{id}/source/100x100bb.jpg"}}"#
                )
            })
            .collect();
        let body = format!(
            r#"{{"resultCount":{},"results":[{}]}}"#,
            ids.len(),
            results.join(",")
        );
        self.client
            .route(&itunes::search_url(artist, LIMIT), vec![FakeResponse::text(&body)]);
        for id in ids {
            self.client
                .route(&artwork(*id), vec![FakeResponse::text("JPEG")]);
        }
    }

    fn cursor_line(&self) -> String {
        std::fs::read_to_string(self.cursor_path()).unwrap()
    }
}

fn artwork(id: u64) -> String {
    format!("https://art.test/{}/source/500x500bb.jpg", id)
}

#[tokio::test]
async fn fresh_run_checkpoints_and_writes_assets() {
    let h = Harness::new(&["A", "B"]).await;
    h.search("A", &[1001234, 2005678]);
    h.search("B", &[]);

    let summary = h.albums(2, 0).run(None).await.unwrap();

    assert_eq!(h.store.checkpoint("A").await.unwrap(), Some(2));
    assert_eq!(h.store.checkpoint("B").await.unwrap(), Some(0));
    assert_eq!(h.cursor_line(), "B|||2");
    assert_eq!(summary.checkpointed, 2);
    assert_eq!(summary.totals.successes, 2);
    assert_eq!(summary.totals.errors, 0);
    assert_eq!(summary.total, 2);

    let root = h.asset_root();
    for (shard, id) in [("100", "1001234"), ("200", "2005678")] {
        assert!(root.join(shard).join(format!("{}.jpg", id)).exists());
        assert!(root.join(shard).join(format!("{}.jpg.json", id)).exists());
        assert!(root.join(shard).join(format!("{}.jpg.full", id)).exists());
    }
    // Two searches plus two artwork downloads.
    assert_eq!(h.client.call_count(), 4);
}

#[tokio::test]
async fn rerun_with_same_stores_is_a_no_op() {
    let h = Harness::new(&["A", "B"]).await;
    h.search("A", &[1001234, 2005678]);
    h.search("B", &[]);
    h.albums(2, 0).run(None).await.unwrap();
    let calls = h.client.call_count();

    // The finished pass rolls over: every key is a checkpoint hit.
    let summary = h.albums(2, 0).run(None).await.unwrap();
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.checkpointed, 0);
    assert_eq!(summary.total, 2);
    assert_eq!(h.client.call_count(), calls);
    assert_eq!(h.cursor_line(), "B|||2");
    assert_eq!(h.store.checkpoint("A").await.unwrap(), Some(2));
    assert_eq!(h.store.checkpoint("B").await.unwrap(), Some(0));
}

#[tokio::test]
async fn checkpointed_keys_skip_network_and_add_stored_count() {
    let h = Harness::new(&["A", "B"]).await;
    h.store.record("A", 5).await.unwrap();
    h.search("B", &[3000001]);

    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.total, 6);
    assert_eq!(h.cursor_line(), "B|||6");
    assert!(!h
        .client
        .calls()
        .contains(&itunes::search_url("A", LIMIT)));
}

#[tokio::test]
async fn resume_cursor_fast_forwards_work_list() {
    let h = Harness::new(&["A", "B", "C", "D"]).await;
    ResumeCursor::new("B", 10).save(&h.cursor_path()).await.unwrap();
    h.search("C", &[4000001]);
    h.search("D", &[5000001]);

    let summary = h.albums(3, 0).run(None).await.unwrap();
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.total, 12);
    assert_eq!(h.cursor_line(), "D|||12");
    let calls = h.client.calls();
    assert!(!calls.contains(&itunes::search_url("A", LIMIT)));
    assert!(!calls.contains(&itunes::search_url("B", LIMIT)));
    assert_eq!(h.store.checkpoint("A").await.unwrap(), None);
}

#[tokio::test]
async fn partial_failure_leaves_no_checkpoint_and_is_retried() {
    let h = Harness::new(&["A"]).await;
    h.search("A", &[1001234, 2005678]);
    h.client.route(&artwork(2005678), vec![FakeResponse::Status(404)]);

    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.partial, 1);
    assert_eq!(summary.totals.successes, 1);
    assert_eq!(summary.totals.errors, 1);
    assert_eq!(h.store.checkpoint("A").await.unwrap(), None);
    assert_eq!(h.cursor_line(), "A|||0");
    let failed = h.asset_root().join("200").join("2005678.jpg");
    assert!(!failed.exists());
    assert!(h.asset_root().join("200").join("2005678.jpg.json").exists());

    // Next run with the same stores: search comes from cache, only the missing artwork is fetched.
    h.client.route(&artwork(2005678), vec![FakeResponse::text("JPEG")]);
    let before = h.client.call_count();
    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.checkpointed, 1);
    assert_eq!(h.store.checkpoint("A").await.unwrap(), Some(2));
    assert_eq!(h.client.calls()[before..], [artwork(2005678)]);
    assert!(failed.exists());
    assert_eq!(summary.total, 2);
    assert_eq!(h.cursor_line(), "A|||2");
}

#[tokio::test]
async fn failed_key_mid_list_is_retried_next_pass() {
    let h = Harness::new(&["A", "B", "C"]).await;
    h.search("A", &[1000001]);
    h.client
        .route(&itunes::search_url("B", LIMIT), vec![FakeResponse::Status(404)]);
    h.search("C", &[3000001]);
    h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(h.store.checkpoint("B").await.unwrap(), None);
    assert_eq!(h.cursor_line(), "C|||2");

    h.search("B", &[2000001]);
    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.checkpointed, 1);
    assert_eq!(h.store.checkpoint("B").await.unwrap(), Some(1));
    assert_eq!(summary.total, 3);
    assert_eq!(h.cursor_line(), "C|||3");
}

#[tokio::test]
async fn keys_added_behind_a_finished_cursor_are_crawled() {
    let h = Harness::new(&["A", "C"]).await;
    h.search("A", &[1000001]);
    h.search("C", &[3000001]);
    h.albums(2, 0).run(None).await.unwrap();
    assert_eq!(h.cursor_line(), "C|||2");

    h.store.add_keys(&["B"]).await.unwrap();
    h.search("B", &[2000001, 2000002]);
    let summary = h.albums(2, 0).run(None).await.unwrap();
    assert_eq!(summary.checkpointed, 1);
    assert_eq!(h.store.checkpoint("B").await.unwrap(), Some(2));
    assert_eq!(summary.total, 4);
    let searches_for_a = h
        .client
        .calls()
        .iter()
        .filter(|u| **u == itunes::search_url("A", LIMIT))
        .count();
    assert_eq!(searches_for_a, 1);
}

#[tokio::test]
async fn keys_with_the_same_search_term_in_one_batch() {
    // "AC/DC" and "ACDC" share one search URL and one album, so both items
    // write the same cache entry and asset files concurrently.
    for _ in 0..10 {
        let h = Harness::new(&["AC/DC", "ACDC"]).await;
        assert_eq!(itunes::search_url("AC/DC", LIMIT), itunes::search_url("ACDC", LIMIT));
        h.search("ACDC", &[7000001]);

        let summary = h.albums(2, 0).run(None).await.unwrap();
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.partial, 0);
        assert_eq!(summary.checkpointed, 2);
        assert_eq!(h.store.checkpoint("AC/DC").await.unwrap(), Some(1));
        assert_eq!(h.store.checkpoint("ACDC").await.unwrap(), Some(1));
        let shard = h.asset_root().join("700");
        assert_eq!(std::fs::read(shard.join("7000001.jpg")).unwrap(), b"JPEG");
        assert!(shard.join("7000001.jpg.json").exists());
    }
}

#[tokio::test]
async fn failed_checkpoint_write_adds_nothing_to_total() {
    let h = Harness::new(&["A"]).await;
    h.search("A", &[1000001, 1000002]);
    sqlx::query(
        "CREATE TRIGGER artists_frozen BEFORE INSERT ON artists BEGIN SELECT RAISE(ABORT, 'frozen'); END;",
    )
    .execute(&h.store.pool)
    .await
    .unwrap();

    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.checkpointed, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total, 0);
    assert_eq!(h.cursor_line(), "A|||0");
    assert_eq!(h.store.checkpoint("A").await.unwrap(), None);

    sqlx::query("DROP TRIGGER artists_frozen")
        .execute(&h.store.pool)
        .await
        .unwrap();
    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.checkpointed, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(h.cursor_line(), "A|||2");
}

#[tokio::test]
async fn failed_search_counts_as_error_and_crawl_continues() {
    let h = Harness::new(&["A", "B"]).await;
    h.client
        .route(&itunes::search_url("A", LIMIT), vec![FakeResponse::Status(404)]);
    h.search("B", &[6000001]);

    let summary = h.albums(2, 0).run(None).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.totals.errors, 1);
    assert_eq!(h.store.checkpoint("A").await.unwrap(), None);
    assert_eq!(h.store.checkpoint("B").await.unwrap(), Some(1));
    assert_eq!(h.cursor_line(), "B|||1");
}

#[tokio::test]
async fn malformed_search_is_purged_and_refetched_next_run() {
    let h = Harness::new(&["A"]).await;
    let url = itunes::search_url("A", LIMIT);
    h.client.route(
        &url,
        vec![
            FakeResponse::text("<html>busy</html>"),
            FakeResponse::text(r#"{"resultCount":0,"results":[]}"#),
        ],
    );

    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(!h.albums(1, 0).ctx.fetcher.cache().contains(&url).await);

    let summary = h.albums(1, 0).run(None).await.unwrap();
    assert_eq!(summary.checkpointed, 1);
    assert_eq!(h.store.checkpoint("A").await.unwrap(), Some(0));
}

#[tokio::test]
async fn cached_rerun_is_not_paced() {
    let h = Harness::new(&["A", "B"]).await;
    h.search("A", &[1001234]);
    h.search("B", &[2005678]);
    h.albums(1, 0).run(None).await.unwrap();

    // Fresh checkpoints; same cache, asset tree and (finished) cursor.
    let store = open_memory().await.unwrap();
    store.add_keys(&["A", "B"]).await.unwrap();
    let calls = h.client.call_count();
    let crawl = h.albums_with_store(store, 1, 60_000);

    let summary = tokio::time::timeout(Duration::from_secs(10), crawl.run(None))
        .await
        .expect("cached run must not wait on the rate controller")
        .unwrap();
    assert_eq!(summary.checkpointed, 2);
    assert_eq!(h.client.call_count(), calls);
}

#[tokio::test]
async fn failure_replayed_from_cache_is_not_paced() {
    let h = Harness::new(&["A", "B"]).await;
    let crawl = h.albums(1, 60_000);
    for key in ["A", "B"] {
        crawl
            .ctx
            .fetcher
            .cache()
            .store(&itunes::search_url(key, LIMIT), b"<html>not json</html>")
            .await
            .unwrap();
    }

    let summary = tokio::time::timeout(Duration::from_secs(10), crawl.run(None))
        .await
        .expect("a failure that never left the cache must not wait on the rate controller")
        .unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(h.client.call_count(), 0);
}

#[tokio::test]
async fn progress_is_reported_per_batch() {
    let h = Harness::new(&["A", "B", "C"]).await;
    for k in ["A", "B", "C"] {
        h.search(k, &[]);
    }
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    h.albums(2, 0).run(Some(&tx)).await.unwrap();
    drop(tx);

    let mut snapshots = Vec::new();
    while let Some(p) = rx.recv().await {
        snapshots.push(p);
    }
    let done: Vec<usize> = snapshots.iter().map(|p| p.done).collect();
    assert_eq!(done, vec![2, 3]);
    assert!(snapshots.iter().all(|p| p.total == 3));
}

#[tokio::test]
async fn listing_crawl_fills_store_once() {
    let h = Harness::new(&[]).await;
    let dates = vec!["19600101".to_string(), "19600108".to_string()];
    h.client.route(
        &allmusic::listing_url("19600101"),
        vec![FakeResponse::text(
            r#"<table><tr><td class="artist"><a>ABBA</a></td></tr><tr><td class="artist"><a>Queen</a></td></tr></table>"#,
        )],
    );
    h.client.route(
        &allmusic::listing_url("19600108"),
        vec![FakeResponse::text(
            r#"<table><tr><td class="artist"><a>Queen</a></td></tr></table>"#,
        )],
    );

    let crawl = Arc::new(ListingCrawl::new(h.context(h.store.clone(), 10, 0), dates.clone()));
    let summary = crawl.run(None).await.unwrap();
    assert_eq!(summary.pages.successes, 2);
    assert_eq!(summary.names_found, 3);
    assert_eq!(summary.new_keys, 2);
    assert_eq!(h.store.keys().await.unwrap(), vec!["ABBA", "Queen"]);

    let calls = h.client.call_count();
    let again = Arc::new(ListingCrawl::new(h.context(h.store.clone(), 10, 0), dates));
    let summary = again.run(None).await.unwrap();
    assert_eq!(summary.new_keys, 0);
    assert_eq!(h.client.call_count(), calls);
}

#[tokio::test]
async fn listing_failures_are_counted() {
    let h = Harness::new(&[]).await;
    let dates = vec!["19600101".to_string()];
    h.client
        .route(&allmusic::listing_url("19600101"), vec![FakeResponse::Refused]);
    let crawl = Arc::new(ListingCrawl::new(h.context(h.store.clone(), 10, 0), dates));
    let summary = crawl.run(None).await.unwrap();
    assert_eq!(summary.pages.errors, 1);
    assert!(h.store.keys().await.unwrap().is_empty());
}
