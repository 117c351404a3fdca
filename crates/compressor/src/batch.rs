use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use crate::config::{ConvertConfig, Quality};
use crate::console;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::gate::SerializedEncoder;
use crate::job::{ConversionOutcome, Job};
use crate::pool::WorkerPool;
use crate::preview::{Confirm, Preview};
use crate::scan::{self, ScanOptions};
use crate::stats::StatsSnapshot;

/// How a batch run ended, short of a process-level error
#[derive(Debug)]
pub enum BatchOutcome {
    Completed(BatchReport),
    /// The confirmation gate declined; nothing was written
    Cancelled,
}

/// Final, post-join view of a run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub directory: PathBuf,
    pub output_location: PathBuf,
    pub quality: Quality,
    pub in_place: bool,
    pub workers: usize,
    pub stats: StatsSnapshot,
    pub outcomes: Vec<ConversionOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn print_summary(&self) {
        let stats = &self.stats;
        console::rule();
        console::info(&format!("Total files: {}", stats.total));
        console::success(&format!("Converted: {}", stats.converted));

        if stats.failed > 0 {
            console::failure(&format!("Failed: {}", stats.failed));
        }

        if let Some(reduction) = stats.reduction_percent() {
            console::stats(&format!(
                "Original size: {} → Converted: {} ({:.1}% reduction)",
                console::human_size(stats.bytes_before),
                console::human_size(stats.bytes_after),
                reduction
            ));
        }

        console::info(&format!("Elapsed: {}", format_duration(self.elapsed())));
        console::rule();
    }
}

/// Wires scanning, confirmation, the worker pool and reporting together
pub struct BatchConverter<E> {
    cfg: ConvertConfig,
    encoder: Arc<SerializedEncoder<E>>,
}

impl<E: Encoder + 'static> BatchConverter<E> {
    pub fn new(cfg: ConvertConfig, encoder: E) -> Self {
        BatchConverter {
            cfg,
            encoder: Arc::new(SerializedEncoder::new(encoder)),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.cfg
    }

    /// Convert every eligible image directly inside `dir`.
    ///
    /// Fails only on configuration or discovery problems; individual job failures are
    /// reported through the returned stats.
    pub async fn run<C: Confirm>(&self, dir: &Path, confirm: &mut C) -> Result<BatchOutcome> {
        let started_at = Utc::now();
        let directory = validate_directory(dir)?;

        self.encoder.check_available().await?;

        let output_location = if self.cfg.in_place {
            directory.clone()
        } else {
            directory.join(&self.cfg.output_dir_name)
        };

        let opts = ScanOptions {
            extensions: self.cfg.effective_extensions(),
        };
        let images = scan::candidates(scan::scan_dir(&directory, &opts)?);
        if images.is_empty() {
            return Err(Error::NoImages(directory));
        }

        let jobs = self.build_jobs(images, &output_location)?;

        console::info(&format!("Found {} image(s) to process", jobs.len()));
        console::info(&format!("Quality: {}%", self.cfg.quality));
        println!();

        if !self.cfg.skip_preview {
            let preview = Preview::from_jobs(&jobs, output_location.clone());
            if !confirm.confirm(&preview) {
                info!("Run cancelled at confirmation");
                return Ok(BatchOutcome::Cancelled);
            }
            println!();
        }

        if !self.cfg.in_place {
            fs::create_dir_all(&output_location).map_err(|e| {
                Error::io(format!("Failed to create output directory {}", output_location.display()), e)
            })?;
        }

        let pool = WorkerPool::new(self.cfg.pool_width());
        let report = pool
            .run(jobs, self.encoder.clone(), self.cfg.quality, self.cfg.in_place)
            .await;

        Ok(BatchOutcome::Completed(BatchReport {
            directory,
            output_location,
            quality: self.cfg.quality,
            in_place: self.cfg.in_place,
            workers: pool.width(),
            stats: report.stats,
            outcomes: report.outcomes,
            started_at,
            finished_at: Utc::now(),
        }))
    }

    /// Map sources to destinations. Two sources sharing a destination is only a warning when
    /// writing into the output directory; in place it is refused, since the second source
    /// would be deleted after its output overwrote the first.
    fn build_jobs(&self, images: Vec<PathBuf>, output_location: &Path) -> Result<Vec<Job>> {
        let jobs: Vec<Job> = images
            .into_iter()
            .map(|src| {
                if self.cfg.in_place {
                    Job::in_place(src)
                } else {
                    Job::into_dir(src, output_location)
                }
            })
            .collect();

        let mut seen: HashMap<&Path, &Path> = HashMap::new();
        for job in &jobs {
            if let Some(first) = seen.insert(&job.destination, &job.source) {
                if self.cfg.in_place {
                    return Err(Error::DestinationCollision {
                        destination: job.destination.clone(),
                        first: first.to_path_buf(),
                        second: job.source.clone(),
                    });
                }
                warn!(
                    "{} and {} both convert to {}; the later conversion overwrites the earlier",
                    first.display(),
                    job.source.display(),
                    job.destination.display()
                );
            }
        }

        Ok(jobs)
    }
}

/// Resolve the target directory, rejecting missing paths and non-directories
fn validate_directory(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }
    fs::canonicalize(dir).map_err(|e| Error::io(format!("Failed to resolve {}", dir.display()), e))
}

/// Helper function to format duration for the summary
fn format_duration(d: chrono::Duration) -> String {
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;
    let seconds = d.num_seconds() % 60;
    let millis = d.num_milliseconds() % 1000;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEncoder;
    use tempfile::TempDir;

    fn config(skip_preview: bool, in_place: bool) -> ConvertConfig {
        ConvertConfig {
            skip_preview,
            in_place,
            workers: Some(4),
            ..Default::default()
        }
    }

    fn accept_all(_: &Preview) -> bool {
        true
    }

    fn completed(outcome: BatchOutcome) -> BatchReport {
        match outcome {
            BatchOutcome::Completed(report) => report,
            BatchOutcome::Cancelled => panic!("expected a completed run"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_end_to_end_into_output_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), vec![1u8; 2_000_000]).unwrap();
        fs::write(dir.path().join("b.jpg"), vec![1u8; 1_000_000]).unwrap();

        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let report = completed(converter.run(dir.path(), &mut accept_all).await.unwrap());

        let out = dir.path().join("compressed");
        let a_size = fs::metadata(out.join("a.webp")).unwrap().len();
        let b_size = fs::metadata(out.join("b.webp")).unwrap().len();

        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.converted, 2);
        assert_eq!(report.stats.failed, 0);
        assert_eq!(report.stats.bytes_before, 3_000_000);
        assert_eq!(report.stats.bytes_after, a_size + b_size);

        let expected = (3_000_000.0 - (a_size + b_size) as f64) / 3_000_000.0 * 100.0;
        assert!((report.stats.reduction_percent().unwrap() - expected).abs() < 1e-9);

        // sources untouched outside in-place mode
        assert!(dir.path().join("a.png").exists());
        assert!(dir.path().join("b.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_encoder_touches_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"png").unwrap();

        let converter = BatchConverter::new(config(true, false), FakeEncoder::missing());
        let err = converter.run(dir.path(), &mut accept_all).await.unwrap_err();

        assert!(matches!(err, Error::EncoderNotFound { .. }));
        assert!(!dir.path().join("compressed").exists());
        assert_eq!(converter.encoder.inner().calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let err = converter.run(&missing, &mut accept_all).await.unwrap_err();

        assert!(matches!(err, Error::DirectoryNotFound(_)));
        assert!(!missing.join("compressed").exists());
    }

    #[tokio::test]
    async fn test_file_instead_of_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.png");
        fs::write(&file, b"png").unwrap();

        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let err = converter.run(&file, &mut accept_all).await.unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_no_images_is_an_error_without_side_effects() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        fs::write(dir.path().join(".secret.png"), b"png").unwrap();

        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let err = converter.run(dir.path(), &mut accept_all).await.unwrap_err();

        assert!(matches!(err, Error::NoImages(_)));
        assert!(!dir.path().join("compressed").exists());
    }

    #[tokio::test]
    async fn test_declined_preview_cancels_without_writing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), vec![1u8; 64]).unwrap();

        let mut shown = 0usize;
        let mut decline = |preview: &Preview| {
            shown = preview.entries.len();
            false
        };

        let converter = BatchConverter::new(config(false, true), FakeEncoder::default());
        let outcome = converter.run(dir.path(), &mut decline).await.unwrap();

        assert!(matches!(outcome, BatchOutcome::Cancelled));
        assert_eq!(shown, 1);
        assert!(dir.path().join("a.png").exists());
        assert!(!dir.path().join("a.webp").exists());
    }

    #[tokio::test]
    async fn test_skip_preview_never_asks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), vec![1u8; 64]).unwrap();

        let mut never = |_: &Preview| -> bool { panic!("preview should be skipped") };
        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let report = completed(converter.run(dir.path(), &mut never).await.unwrap());
        assert_eq!(report.stats.converted, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_failure_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.png"), vec![1u8; 800]).unwrap();
        fs::write(dir.path().join("corrupt.jpg"), vec![1u8; 800]).unwrap();

        let converter = BatchConverter::new(config(true, true), FakeEncoder::failing_on(&["corrupt"]));
        let report = completed(converter.run(dir.path(), &mut accept_all).await.unwrap());

        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.converted, 1);
        assert_eq!(report.stats.failed, 1);
        assert!(dir.path().join("good.webp").exists());
        assert!(!dir.path().join("good.png").exists());
        assert!(dir.path().join("corrupt.jpg").exists());
        assert!(!dir.path().join("compressed").exists());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_outputs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), vec![1u8; 4000]).unwrap();

        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        completed(converter.run(dir.path(), &mut accept_all).await.unwrap());
        let first = fs::read(dir.path().join("compressed/a.webp")).unwrap();

        let report = completed(converter.run(dir.path(), &mut accept_all).await.unwrap());
        let second = fs::read(dir.path().join("compressed/a.webp")).unwrap();

        // outputs from the first run are not picked up as sources
        assert_eq!(report.stats.total, 1);
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(dir.path().join("compressed")).unwrap().count(), 1);
    }

    #[test]
    fn test_colliding_destinations_still_build_both_jobs() {
        let converter = BatchConverter::new(config(true, false), FakeEncoder::default());
        let jobs = converter.build_jobs(
            vec![PathBuf::from("/p/a.png"), PathBuf::from("/p/a.jpg")],
            Path::new("/p/compressed"),
        )
        .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].destination, jobs[1].destination);
    }

    #[tokio::test]
    async fn test_in_place_collision_refused_before_any_job() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), vec![1u8; 400]).unwrap();
        fs::write(dir.path().join("a.jpg"), vec![2u8; 400]).unwrap();

        let converter = BatchConverter::new(config(true, true), FakeEncoder::default());
        let err = converter.run(dir.path(), &mut accept_all).await.unwrap_err();

        match err {
            Error::DestinationCollision { destination, .. } => assert!(destination.ends_with("a.webp")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(dir.path().join("a.png")).unwrap(), vec![1u8; 400]);
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), vec![2u8; 400]);
        assert!(!dir.path().join("a.webp").exists());
        assert_eq!(converter.encoder.inner().calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_place_versioned_names_both_convert() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("photo.png"), vec![1u8; 400]).unwrap();
        fs::write(dir.path().join("photo.v2.png"), vec![1u8; 800]).unwrap();

        let converter = BatchConverter::new(config(true, true), FakeEncoder::default());
        let report = completed(converter.run(dir.path(), &mut accept_all).await.unwrap());

        assert_eq!(report.stats.converted, 2);
        assert_eq!(fs::metadata(dir.path().join("photo.webp")).unwrap().len(), 100);
        assert_eq!(fs::metadata(dir.path().join("photo.v2.webp")).unwrap().len(), 200);
        assert!(!dir.path().join("photo.png").exists());
        assert!(!dir.path().join("photo.v2.png").exists());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::milliseconds(1_250)), "1.250s");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(3_725)), "1h 2m 5s");
    }
}
