use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use collector::{
    CollectOptions, Collector, CollectorError, Comment, Ledger, OutputLayout, RecordStore, Result,
    Submission, SubmissionSource, Tier, TimeFilter,
};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FakeSource {
    submissions: Vec<Submission>,
    comments: HashMap<String, Vec<Comment>>,
    broken_images: Vec<String>,
    image_fetches: Arc<AtomicUsize>,
    cancel_after_fetches: Option<(usize, CancellationToken)>,
}

#[async_trait]
impl SubmissionSource for FakeSource {
    async fn top_submissions(&self, _tf: TimeFilter, limit: usize) -> Result<Vec<Submission>> {
        Ok(self.submissions.iter().take(limit).cloned().collect())
    }

    async fn top_comments(&self, submission_id: &str) -> Result<Vec<Comment>> {
        Ok(self.comments.get(submission_id).cloned().unwrap_or_default())
    }

    async fn fetch_image(&self, url: &str) -> Result<Option<Bytes>> {
        let n = self.image_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after_fetches {
            if n >= *after {
                token.cancel();
            }
        }
        if self.broken_images.iter().any(|b| url.contains(b.as_str())) {
            return Err(CollectorError::Source("connection reset".into()));
        }
        Ok(Some(Bytes::from_static(b"\xff\xd8jpeg")))
    }
}

fn submission(id: &str) -> Submission {
    Submission {
        id: id.into(),
        title: format!("Roast me {id}"),
        url: format!("https://i.redd.it/{id}.jpg"),
        score: 800,
        num_comments: 60,
        created_utc: 1_700_000_000.0,
        stickied: false,
        over_18: false,
    }
}

fn good_comments() -> Vec<Comment> {
    vec![
        Comment { body: "Your forehead has its own weather system".into(), score: 900, distinguished: None },
        Comment { body: "You look like a thumb with a bad haircut".into(), score: 600, distinguished: None },
        Comment { body: "Your eyebrows are on different time zones".into(), score: 300, distinguished: None },
    ]
}

fn tier() -> Tier {
    Tier {
        name: "Tier 1".into(),
        time_filter: TimeFilter::All,
        limit: 100,
        min_comment_score: 100,
        min_submission_score: 500,
        min_comments: 30,
        min_roasts: 3,
    }
}

fn opts() -> CollectOptions {
    CollectOptions { request_delay: Duration::from_millis(0), ..Default::default() }
}

fn source_with(ids: &[&str]) -> FakeSource {
    FakeSource {
        submissions: ids.iter().map(|id| submission(id)).collect(),
        comments: ids.iter().map(|id| (id.to_string(), good_comments())).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_collects_records_images_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let mut src = source_with(&["a1", "b2", "c3"]);
    src.comments.insert("c3".into(), good_comments()[..2].to_vec());

    let mut c = Collector::open(src, layout.clone(), opts(), CancellationToken::new()).unwrap();
    let summary = c.run(&[tier()]).await.unwrap();
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.skipped, 1);
    assert!(!summary.interrupted);

    let records = RecordStore::new(&layout.store_path).load().unwrap();
    assert_eq!(records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a1", "b2"]);
    assert_eq!(records[0].roast_scores, vec![900, 600, 300]);
    assert_eq!(records[0].image_filename.as_deref(), Some("a1.jpg"));
    assert_eq!(records[0].tier, "Tier 1");
    assert!(layout.images_dir.join("a1.jpg").exists());

    let ledger = Ledger::load(&layout.ledger_path).unwrap();
    assert!(ledger.contains("a1") && ledger.contains("b2") && !ledger.contains("c3"));

    let meta: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&layout.metadata_path).unwrap()).unwrap();
    assert_eq!(meta["total_samples"], 2);
    assert_eq!(meta["total_roasts"], 6);
    assert_eq!(meta["source"], "r/RoastMe");
}

#[tokio::test]
async fn test_second_run_skips_processed_ids() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let mut c = Collector::open(source_with(&["a1", "b2"]), layout.clone(), opts(), CancellationToken::new()).unwrap();
    c.run(&[tier()]).await.unwrap();

    let mut c = Collector::open(source_with(&["a1", "b2", "d4"]), layout.clone(), opts(), CancellationToken::new()).unwrap();
    let summary = c.run(&[tier()]).await.unwrap();
    assert_eq!(summary.collected, 1);
    assert_eq!(summary.store_total, 3);

    let ids = RecordStore::new(&layout.store_path).ids().unwrap();
    assert_eq!(ids, vec!["a1", "b2", "d4"]);
}

#[tokio::test]
async fn test_fetch_failure_skips_single_item() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let mut src = source_with(&["a1", "b2", "c3"]);
    src.broken_images.push("b2".into());

    let mut c = Collector::open(src, layout.clone(), opts(), CancellationToken::new()).unwrap();
    let summary = c.run(&[tier()]).await.unwrap();
    assert_eq!(summary.collected, 2);
    assert!(!c.ledger().contains("b2"));
}

#[tokio::test]
async fn test_ledger_reconciled_with_store_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let mut c = Collector::open(source_with(&["a1", "b2"]), layout.clone(), opts(), CancellationToken::new()).unwrap();
    c.run(&[tier()]).await.unwrap();

    // simulate a crash after append but before the ledger flush
    std::fs::remove_file(&layout.ledger_path).unwrap();

    let c = Collector::open(source_with(&[]), layout.clone(), opts(), CancellationToken::new()).unwrap();
    assert!(c.ledger().contains("a1") && c.ledger().contains("b2"));
    assert!(Ledger::load(&layout.ledger_path).unwrap().contains("a1"));
}

#[tokio::test]
async fn test_interrupt_keeps_only_completed_items() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let cancel = CancellationToken::new();
    let mut src = source_with(&["a1", "b2", "c3", "d4"]);
    src.cancel_after_fetches = Some((2, cancel.clone()));

    let mut c = Collector::open(src, layout.clone(), opts(), cancel).unwrap();
    let summary = c.run(&[tier(), tier()]).await.unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.collected, 2);

    let ledger = Ledger::load(&layout.ledger_path).unwrap();
    let stored = RecordStore::new(&layout.store_path).ids().unwrap();
    assert_eq!(ledger.len(), stored.len());
    for id in &stored {
        assert!(ledger.contains(id));
    }
}

#[tokio::test]
async fn test_stops_at_target() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let ids: Vec<String> = (0..5).map(|i| format!("s{i}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut o = opts();
    o.target_total = 3;
    let mut t1 = tier();
    t1.limit = 3;
    let mut c = Collector::open(source_with(&id_refs), layout, o, CancellationToken::new()).unwrap();
    let summary = c.run(&[t1, tier()]).await.unwrap();
    assert_eq!(summary.collected, 3);
}
