use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use dataset::{
    load_raw_records, partition, preview, read_samples, select_stage1, write_json_atomic,
    write_samples, Assessment, Classifier, ClassifierProfile, FilterReport, FilterStats,
    FilteredCorpus, LengthStats, Pipeline, StagedWrites, Stage1Options, TextCorpus,
};
use tracing::{info, warn};

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Built-in classifier profile: strict, lenient, text-only
    #[arg(long)]
    pub profile: Option<String>,

    /// JSON profile file; takes precedence over --profile
    #[arg(long)]
    pub profile_file: Option<PathBuf>,

    /// Minimum comment score
    #[arg(long)]
    pub min_score: Option<i64>,

    /// Disable the score rule entirely
    #[arg(long, conflicts_with = "min_score")]
    pub no_score: bool,

    /// Minimum cleaned length in characters
    #[arg(long)]
    pub min_len: Option<usize>,

    /// Maximum cleaned length in characters
    #[arg(long)]
    pub max_len: Option<usize>,
}

impl ProfileArgs {
    pub fn resolve(&self, default: &str) -> Result<ClassifierProfile> {
        let mut profile = match &self.profile_file {
            Some(path) => ClassifierProfile::from_json_file(path)
                .with_context(|| format!("Failed to load profile {}", path.display()))?,
            None => {
                let name = self.profile.as_deref().unwrap_or(default);
                match ClassifierProfile::builtin(name) {
                    Some(p) => p,
                    None => bail!(
                        "Unknown profile {name:?} (expected one of {})",
                        ClassifierProfile::builtin_names().join(", ")
                    ),
                }
            }
        };

        if let Some(v) = self.min_score {
            profile.min_score = Some(v);
        }
        if self.no_score {
            profile.min_score = None;
        }
        if let Some(v) = self.min_len {
            profile.min_len = v;
        }
        if let Some(v) = self.max_len {
            profile.max_len = v;
        }
        profile.validate()?;
        Ok(profile)
    }
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Collected record store (NDJSON)
    #[arg(long, default_value = "data/raw/training_data.jsonl")]
    pub input: PathBuf,

    /// Accepted samples (JSON array)
    #[arg(long, default_value = "data/filtered/filtered.json")]
    pub output: PathBuf,

    /// Filter report; defaults to filter_report.json next to --output
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Process records on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Number of kept samples to log
    #[arg(long, default_value = "5")]
    pub preview: usize,

    /// Seed for the preview sampler
    #[arg(long, default_value = "7")]
    pub sample_seed: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    #[arg(long, default_value = "data/filtered/filtered.json")]
    pub input: PathBuf,

    #[arg(long, default_value = "data/llava_format/train.json")]
    pub train_output: PathBuf,

    #[arg(long, default_value = "data/llava_format/val.json")]
    pub val_output: PathBuf,

    #[arg(long, default_value = "42")]
    pub seed: u64,

    #[arg(long, default_value = "0.1")]
    pub val_fraction: f64,
}

#[derive(Args, Debug, Clone)]
pub struct FilterTextArgs {
    /// Corpus of the form {"roasts": [...]}
    #[arg(long, default_value = "data/huggingface/hf_roasts.json")]
    pub input: PathBuf,

    #[arg(long, default_value = "data/huggingface/hf_visual_filtered.json")]
    pub output: PathBuf,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Args, Debug, Clone)]
pub struct Stage1Args {
    #[arg(long, default_value = "data/huggingface/hf_visual_filtered.json")]
    pub input: PathBuf,

    #[arg(long, default_value = "data/llava_format/stage1_text_only.json")]
    pub output: PathBuf,

    #[arg(long, default_value = "20000")]
    pub num_samples: usize,

    #[arg(long, default_value = "25")]
    pub min_len: usize,

    #[arg(long, default_value = "100")]
    pub max_len: usize,

    #[arg(long, default_value = "42")]
    pub seed: u64,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long, default_value = "data/llava_format/train.json")]
    pub input: PathBuf,

    #[arg(long, default_value = "10")]
    pub preview: usize,

    #[arg(long, default_value = "7")]
    pub sample_seed: u64,
}

fn ensure_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Input not found: {}", path.display());
    }
    Ok(())
}

fn log_lengths(lengths: Option<&LengthStats>) {
    if let Some(l) = lengths {
        info!(min = l.min, max = l.max, mean = l.mean, median = l.median, "lengths");
    }
}

fn log_preview(texts: &[&str], n: usize, seed: u64) {
    for (i, text) in preview(texts, n, seed).iter().enumerate() {
        info!("{}. [{} chars] {}", i + 1, text.chars().count(), text);
    }
}

fn log_stats(stats: &FilterStats) {
    info!(
        total = stats.total,
        kept = stats.kept(),
        survival_rate = stats.survival_rate(),
        "filter complete"
    );
    for (label, n) in stats.removal_breakdown() {
        info!(reason = label, count = n, "removed");
    }
}

pub fn filter(args: &FilterArgs) -> Result<()> {
    ensure_input(&args.input)?;
    let profile = args.profile.resolve("strict")?;
    let pipeline = Pipeline::new(Classifier::new(profile.clone())?);
    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| args.output.with_file_name("filter_report.json"));

    info!(input = %args.input.display(), profile = %profile.name, version = profile.version, "filtering");
    let loaded = load_raw_records(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    if !loaded.skipped.is_empty() {
        warn!(skipped = loaded.skipped.len(), "records skipped while loading");
    }

    let out = if args.parallel {
        pipeline.run_parallel(&loaded.records)
    } else {
        pipeline.run(&loaded.records)
    };
    if !out.stats.is_total_partition() || out.stats.kept() != out.accepted.len() as u64 {
        bail!("Fate counts do not add up: {:?}", out.stats);
    }

    let report = FilterReport::build(&profile, &out.stats, &out.accepted);
    let mut outputs = StagedWrites::new();
    outputs
        .stage(&args.output, &out.accepted)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    outputs
        .stage(&report_path, &report)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    outputs.commit().context("Failed to move outputs into place")?;

    log_stats(&out.stats);
    log_lengths(report.lengths.as_ref());
    match report.assessment {
        Assessment::Insufficient => warn!(kept = report.kept, "dataset too small for fine-tuning (< 300)"),
        Assessment::Marginal => warn!(kept = report.kept, "dataset is marginal (< 500)"),
        Assessment::Sufficient => info!(kept = report.kept, "dataset size sufficient"),
    }
    let texts: Vec<&str> = out.accepted.iter().filter_map(|s| s.response()).collect();
    log_preview(&texts, args.preview, args.sample_seed);

    info!(output = %args.output.display(), report = %report_path.display(), "saved");
    Ok(())
}

pub fn split(args: &SplitArgs) -> Result<()> {
    ensure_input(&args.input)?;
    let samples = read_samples(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let parts = partition(&samples, args.seed, args.val_fraction)?;
    let mut outputs = StagedWrites::new();
    outputs
        .stage(&args.train_output, &parts.train)
        .with_context(|| format!("Failed to write {}", args.train_output.display()))?;
    outputs
        .stage(&args.val_output, &parts.val)
        .with_context(|| format!("Failed to write {}", args.val_output.display()))?;
    outputs.commit().context("Failed to move outputs into place")?;

    info!(
        train = parts.train.len(),
        val = parts.val.len(),
        seed = args.seed,
        "split written"
    );
    Ok(())
}

pub fn filter_text(args: &FilterTextArgs) -> Result<()> {
    ensure_input(&args.input)?;
    let profile = args.profile.resolve("text-only")?;
    let pipeline = Pipeline::new(Classifier::new(profile.clone())?);

    let corpus = TextCorpus::load(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let (kept, stats) = pipeline.run_texts(&corpus.roasts);

    let lengths = LengthStats::of_texts(kept.iter().map(String::as_str));
    let out = FilteredCorpus {
        source: args.input.display().to_string(),
        filtering: format!("{} v{}", profile.name, profile.version),
        total_raw: stats.total,
        total_kept: stats.kept(),
        survival_rate: stats.survival_rate(),
        mean_length: lengths.as_ref().map(|l| l.mean).unwrap_or(0.0),
        roasts: kept,
    };
    write_json_atomic(&args.output, &out)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log_stats(&stats);
    log_lengths(lengths.as_ref());
    info!(output = %args.output.display(), "saved");
    Ok(())
}

pub fn stage1(args: &Stage1Args) -> Result<()> {
    ensure_input(&args.input)?;
    let corpus = TextCorpus::load(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let opts = Stage1Options {
        num_samples: args.num_samples,
        min_len: args.min_len,
        max_len: args.max_len,
        seed: args.seed,
    };
    let selection = select_stage1(&corpus.roasts, &opts)?;
    if selection.eligible < opts.num_samples {
        warn!(
            eligible = selection.eligible,
            requested = opts.num_samples,
            "fewer eligible texts than requested, using all"
        );
    }

    write_samples(&args.output, &selection.samples)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(samples = selection.samples.len(), eligible = selection.eligible, "stage1 selection");
    log_lengths(selection.lengths.as_ref());
    for b in &selection.buckets {
        info!("{:3}-{:3} chars: {}", b.low, b.high, b.count);
    }
    info!(output = %args.output.display(), "saved");
    Ok(())
}

pub fn inspect(args: &InspectArgs) -> Result<()> {
    ensure_input(&args.input)?;
    let samples = read_samples(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let with_image = samples.iter().filter(|s| s.image.is_some()).count();
    info!(samples = samples.len(), with_image, "loaded");

    let texts: Vec<&str> = samples.iter().filter_map(|s| s.response()).collect();
    log_lengths(LengthStats::of_texts(texts.iter().copied()).as_ref());
    log_preview(&texts, args.preview, args.sample_seed);
    Ok(())
}
