use std::path::PathBuf;
use crate::console;
use crate::job::{display_name, Job};

/// One line of the preview listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub source_name: String,
    pub size: Option<u64>,
    pub destination_name: String,
}

/// What a run is about to do, shown before asking for confirmation
#[derive(Debug, Clone)]
pub struct Preview {
    pub entries: Vec<PreviewEntry>,
    pub output_location: PathBuf,
    /// Sum of the readable source sizes
    pub total_bytes: u64,
}

impl Preview {
    pub fn from_jobs(jobs: &[Job], output_location: PathBuf) -> Self {
        let entries: Vec<PreviewEntry> = jobs
            .iter()
            .map(|job| PreviewEntry {
                source_name: display_name(&job.source),
                size: std::fs::metadata(&job.source).ok().map(|m| m.len()),
                destination_name: display_name(&job.destination),
            })
            .collect();
        let total_bytes = entries.iter().filter_map(|e| e.size).sum();

        Preview {
            entries,
            output_location,
            total_bytes,
        }
    }

    pub fn print(&self) {
        console::rule();
        console::info("PREVIEW - files to be converted:");
        println!();
        for entry in &self.entries {
            println!(
                "  {} ({}) → {}",
                entry.source_name,
                console::optional_size(entry.size),
                entry.destination_name
            );
        }
        println!();
        console::info(&format!("Destination: {}", self.output_location.display()));
        console::info(&format!("Total size: {}", console::human_size(self.total_bytes)));
        console::rule();
    }
}

/// Decides whether a previewed run goes ahead
pub trait Confirm {
    fn confirm(&mut self, preview: &Preview) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&Preview) -> bool,
{
    fn confirm(&mut self, preview: &Preview) -> bool {
        self(preview)
    }
}

/// Interpret a prompt answer: only `y` or `yes` (any case) accept
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
