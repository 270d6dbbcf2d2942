use std::time::Duration;

use dataset::RawRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{Comment, Ledger, Metadata, OutputLayout, RecordStore, Result, Submission, SubmissionSource, Tier};

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", "i.redd.it", "imgur"];
const REMOVED_MARKERS: &[&str] = &["removed", "deleted"];

#[derive(Clone, Debug)]
pub struct CollectOptions {
    pub target_total: usize,
    pub request_delay: Duration,
    pub save_every: usize,
    pub max_roasts: usize,
    pub min_comment_len: usize,
    pub max_comment_len: usize,
    pub source_label: String,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            target_total: 1000,
            request_delay: Duration::from_millis(500),
            save_every: 10,
            max_roasts: 15,
            min_comment_len: 20,
            max_comment_len: 400,
            source_label: "r/RoastMe".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub collected: usize,
    pub skipped: usize,
    pub interrupted: bool,
    pub store_total: usize,
}

/// Why a listed submission is not worth fetching, if any.
pub fn submission_skip_reason(sub: &Submission, tier: &Tier, ledger: &Ledger) -> Option<&'static str> {
    if ledger.contains(&sub.id) {
        return Some("already processed");
    }
    if sub.stickied {
        return Some("stickied");
    }
    let url = sub.url.to_lowercase();
    if url.is_empty() || !IMAGE_EXTENSIONS.iter().any(|ext| url.contains(ext)) {
        return Some("not an image post");
    }
    if sub.score < tier.min_submission_score {
        return Some("low submission score");
    }
    if sub.num_comments < tier.min_comments {
        return Some("too few comments");
    }
    if sub.over_18 {
        return Some("nsfw");
    }
    None
}

/// Keep top comments that look like real roasts, best first, up to `opts.max_roasts`.
pub fn extract_roasts<'a>(comments: &'a [Comment], min_score: i64, opts: &CollectOptions) -> Vec<&'a Comment> {
    comments
        .iter()
        .filter(|c| c.score >= min_score)
        .filter(|c| (opts.min_comment_len..=opts.max_comment_len).contains(&c.body.chars().count()))
        .filter(|c| c.distinguished.is_none())
        .filter(|c| {
            let lower = c.body.to_lowercase();
            !REMOVED_MARKERS.iter().any(|m| lower.contains(m))
        })
        .take(opts.max_roasts)
        .collect()
}

/// Tiered collection loop writing records, images and the ledger.
pub struct Collector<S> {
    source: S,
    layout: OutputLayout,
    store: RecordStore,
    ledger: Ledger,
    opts: CollectOptions,
    cancel: CancellationToken,
}

impl<S: SubmissionSource> Collector<S> {
    /// Open the output directory and reconcile the ledger with the store.
    pub fn open(source: S, layout: OutputLayout, opts: CollectOptions, cancel: CancellationToken) -> Result<Self> {
        layout.create_dirs()?;
        let store = RecordStore::new(&layout.store_path);
        let mut ledger = Ledger::load(&layout.ledger_path)?;

        let recovered = ledger.reconcile(store.ids()?);
        if recovered > 0 {
            warn!(recovered, "ledger was missing stored records; reconciled");
            ledger.save()?;
        }
        info!(processed = ledger.len(), "previously processed submissions");

        Ok(Self { source, layout, store, ledger, opts, cancel })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn run(&mut self, tiers: &[Tier]) -> Result<CollectionSummary> {
        let mut summary = CollectionSummary::default();

        for tier in tiers {
            if self.cancel.is_cancelled() {
                break;
            }
            let (collected, skipped) = self.collect_tier(tier).await?;
            summary.collected += collected;
            summary.skipped += skipped;
            self.ledger.save()?;
            info!(tier = %tier.name, collected, skipped, running_total = summary.collected, "tier done");

            if summary.collected >= self.opts.target_total {
                info!(target = self.opts.target_total, "target reached");
                break;
            }
        }

        summary.interrupted = self.cancel.is_cancelled();
        self.ledger.save()?;

        let records = self.store.load()?;
        summary.store_total = records.len();
        let metadata = Metadata::summarize(&records, &self.opts.source_label);
        dataset::write_json_atomic(&self.layout.metadata_path, &metadata)?;
        Ok(summary)
    }

    async fn collect_tier(&mut self, tier: &Tier) -> Result<(usize, usize)> {
        info!(
            tier = %tier.name,
            filter = tier.time_filter.as_str(),
            limit = tier.limit,
            min_submission_score = tier.min_submission_score,
            min_comment_score = tier.min_comment_score,
            "collecting"
        );

        let submissions = tokio::select! {
            _ = self.cancel.cancelled() => return Ok((0, 0)),
            res = self.source.top_submissions(tier.time_filter, tier.limit) => res,
        };
        let submissions = match submissions {
            Ok(s) => s,
            Err(e) => {
                error!(tier = %tier.name, error = %e, "listing failed, skipping tier");
                return Ok((0, 0));
            }
        };

        let mut collected = 0;
        let mut skipped = 0;
        for sub in &submissions {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(reason) = submission_skip_reason(sub, tier, &self.ledger) {
                debug!(id = %sub.id, reason, "skip");
                skipped += 1;
                continue;
            }

            if self.collect_one(sub, tier).await? {
                collected += 1;
                if self.opts.save_every > 0 && collected % self.opts.save_every == 0 {
                    self.ledger.save()?;
                }
            } else {
                skipped += 1;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.opts.request_delay) => {}
            }
        }
        Ok((collected, skipped))
    }

    /// Fetch, write and record one submission. Per-item source failures are
    /// skips; local I/O failures propagate.
    async fn collect_one(&mut self, sub: &Submission, tier: &Tier) -> Result<bool> {
        let image = match self.source.fetch_image(&sub.url).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(id = %sub.id, error = %e, "image fetch failed");
                return Ok(false);
            }
        };

        let comments = match self.source.top_comments(&sub.id).await {
            Ok(c) => c,
            Err(e) => {
                warn!(id = %sub.id, error = %e, "comment fetch failed");
                return Ok(false);
            }
        };
        let roasts = extract_roasts(&comments, tier.min_comment_score, &self.opts);
        if roasts.len() < tier.min_roasts {
            return Ok(false);
        }

        let image_filename = format!("{}.jpg", sub.id);
        tokio::fs::write(self.layout.images_dir.join(&image_filename), &image).await?;

        let record = RawRecord {
            id: sub.id.clone(),
            title: sub.title.clone(),
            url: sub.url.clone(),
            submission_score: sub.score,
            num_comments: sub.num_comments,
            created_utc: sub.created_utc,
            image_filename: Some(image_filename),
            roasts: roasts.iter().map(|c| c.body.clone()).collect(),
            roast_scores: roasts.iter().map(|c| c.score).collect(),
            tier: tier.name.clone(),
        };
        self.store.append(&record)?;
        self.ledger.insert(sub.id.clone());
        Ok(true)
    }
}
