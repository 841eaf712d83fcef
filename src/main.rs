use anyhow::{Context, Result, anyhow};
use chrono::{NaiveTime, TimeZone};
use chrono_tz::Tz;
use clap::Parser;
use datenorm::config::{self, NormalizeOptions};
use datenorm::documents::{self, FieldStatus, NormalizedRecord};
use datenorm::input::{self, Batch};
use datenorm::output;
use datenorm::{DisplayPattern, Normalizer};
use log::info;
use memmap2::Mmap;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::fmt;
use std::fs::File;
use std::iter::Sum;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with default options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Date field to normalize; repeat for several, dotted paths reach nested objects
    #[arg(short, long = "field")]
    fields: Vec<String>,

    #[arg(short, long, default_value = "stdout")]
    output: String,

    #[arg(long, value_enum)]
    pattern: Option<DisplayPattern>,

    /// Text shown for unset dates
    #[arg(long)]
    fallback: Option<String>,

    /// Text shown for dates that failed to normalize
    #[arg(long)]
    invalid_text: Option<String>,

    /// Move instants at exactly local midnight to this time (HH:MM)
    #[arg(long, value_parser = config::parse_time_of_day)]
    midnight_default: Option<NaiveTime>,

    /// Sort output by this field, most recent first, unset last
    #[arg(long)]
    sort_by: Option<String>,

    /// IANA time zone for wall-clock input and display; defaults to the system zone
    #[arg(long)]
    tz: Option<String>,

    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[arg(long, default_value = "100000")]
    batch_size: usize,

    #[arg(long)]
    benchmark: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct BatchStats {
    lines: usize,
    records: usize,
    fields: usize,
    rejected: usize,
}

impl BatchStats {
    fn of(batch: &Batch, records: &[NormalizedRecord]) -> Self {
        let fields = records.iter().flat_map(|r| &r.fields);
        BatchStats {
            lines: batch.line_count,
            records: records.len(),
            fields: fields.clone().count(),
            rejected: fields.filter(|f| f.status == FieldStatus::Invalid).count(),
        }
    }
}

impl Sum for BatchStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BatchStats::default(), |acc, s| BatchStats {
            lines: acc.lines + s.lines,
            records: acc.records + s.records,
            fields: acc.fields + s.fields,
            rejected: acc.rejected + s.rejected,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let options = resolve_options(&args)?;

    match options.timezone.as_deref() {
        Some(name) => {
            let zone: Tz = name
                .parse()
                .map_err(|err| anyhow!("unknown time zone `{name}`: {err}"))?;
            run(&args, &options, &Normalizer::new(zone))
        }
        None => run(&args, &options, &Normalizer::local()),
    }
}

fn resolve_options(args: &Args) -> Result<NormalizeOptions> {
    let mut options = match &args.config {
        Some(path) => NormalizeOptions::from_file(path)?,
        None => NormalizeOptions::default(),
    };
    if !args.fields.is_empty() {
        options.fields = args.fields.clone();
    }
    if let Some(pattern) = args.pattern {
        options.pattern = pattern;
    }
    if let Some(text) = &args.fallback {
        options.fallback_text = text.clone();
    }
    if let Some(text) = &args.invalid_text {
        options.invalid_text = text.clone();
    }
    if args.midnight_default.is_some() {
        options.midnight_default = args.midnight_default;
    }
    if args.sort_by.is_some() {
        options.sort_by = args.sort_by.clone();
    }
    if args.tz.is_some() {
        options.timezone = args.tz.clone();
    }
    options.validate()?;
    Ok(options)
}

fn run<Z>(args: &Args, options: &NormalizeOptions, normalizer: &Normalizer<Z>) -> Result<()>
where
    Z: TimeZone + Sync,
    Z::Offset: fmt::Display,
{
    let start_time = Instant::now();
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let file_size = file.metadata()?.len();

    // mmap the file; empty files cannot be mapped on every platform
    let mmap;
    let bytes: &[u8] = if file_size == 0 {
        &[]
    } else {
        mmap = unsafe { Mmap::map(&file)? };
        &mmap
    };

    let batches = input::line_batches(bytes, args.batch_size);
    info!(
        "event=run_start file={} bytes={} batches={} fields={:?}",
        args.file.display(),
        file_size,
        batches.len(),
        options.fields
    );

    let normalize = |batch: &Batch| -> Result<Vec<NormalizedRecord>> {
        let text = input::batch_text(bytes, batch)?;
        Ok(documents::normalize_batch(text, batch.first_line, normalizer, options))
    };

    let mut writer = output::create_writer(&args.output)?;

    let stats = match options.sort_by.as_deref() {
        Some(field) => {
            let per_batch = map_batches(&batches, |batch| {
                let records = normalize(batch)?;
                Ok((BatchStats::of(batch, &records), records))
            })?;
            let stats: BatchStats = per_batch.iter().map(|(s, _)| *s).sum();
            let mut records: Vec<NormalizedRecord> =
                per_batch.into_iter().flat_map(|(_, r)| r).collect();
            documents::sort_records(&mut records, field);
            writer.write_batch(&records)?;
            writer.finish()?;
            stats
        }
        None => {
            // channel for sending normalized batches to writer
            let (tx, rx) = crossbeam::channel::unbounded::<Vec<NormalizedRecord>>();

            let writer_handle = std::thread::spawn(move || -> Result<()> {
                for batch in rx {
                    writer.write_batch(&batch)?;
                }
                writer.finish()
            });

            let produced = map_batches(&batches, |batch| {
                let records = normalize(batch)?;
                let stats = BatchStats::of(batch, &records);
                tx.send(records)
                    .map_err(|_| anyhow!("writer thread stopped early"))?;
                Ok(stats)
            });

            // close channel so writer thread can finish
            drop(tx);
            writer_handle
                .join()
                .map_err(|_| anyhow!("writer thread panicked"))??;
            produced?.into_iter().sum()
        }
    };

    info!(
        "event=run_done records={} fields={} rejected={}",
        stats.records, stats.fields, stats.rejected
    );

    if args.benchmark {
        print_benchmark_results(file_size, stats, start_time.elapsed());
    }

    Ok(())
}

#[cfg(feature = "parallel")]
fn map_batches<T, F>(batches: &[Batch], f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&Batch) -> Result<T> + Sync + Send,
{
    batches.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_batches<T, F>(batches: &[Batch], f: F) -> Result<Vec<T>>
where
    F: Fn(&Batch) -> Result<T>,
{
    batches.iter().map(f).collect()
}

fn print_benchmark_results(file_size: u64, stats: BatchStats, duration: std::time::Duration) {
    let duration_secs = duration.as_secs_f64();
    let file_size_mb = file_size as f64 / (1024.0 * 1024.0);
    let throughput_mbs = file_size_mb / duration_secs;
    let throughput_records = stats.records as f64 / duration_secs;
    let throughput_fields = stats.fields as f64 / duration_secs;

    eprintln!("\n=== BENCHMARK RESULTS ===");
    eprintln!("File size: {:.2} MB", file_size_mb);
    eprintln!("Total lines: {}", stats.lines);
    eprintln!("Documents: {}", stats.records);
    eprintln!("Date fields: {}", stats.fields);
    eprintln!("Rejected dates: {}", stats.rejected);
    eprintln!("Processing time: {:.3}s", duration_secs);
    eprintln!("Throughput: {:.2} MB/s", throughput_mbs);
    eprintln!("Throughput: {:.0} documents/s", throughput_records);
    eprintln!("Throughput: {:.0} fields/s", throughput_fields);
    if stats.fields > 0 {
        eprintln!(
            "Date success rate: {:.1}%",
            ((stats.fields - stats.rejected) as f64 / stats.fields as f64) * 100.0
        );
    }
}
