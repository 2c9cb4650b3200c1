//! Console summary of a finished crawl

use crate::output::traits::{CrawlOutcome, CrawlReport};

/// Prints a report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {} seconds", report.duration_seconds());
    println!("  Outcome: {}", outcome_label(&report.outcome));
    println!();

    println!("Categories:");
    println!("  In bound: {}", report.categories_total);
    println!("  Entered: {}", report.entered.len());
    if !report.controls.is_empty() {
        println!("  Controls ignored: {:?}", report.controls);
    }
    if !report.skipped.is_empty() {
        println!("  Skipped after failure: {:?}", report.skipped);
    }
    println!();

    let bare = report.records_without_contact();
    let share = if report.records.is_empty() {
        0.0
    } else {
        (bare as f64 / report.records.len() as f64) * 100.0
    };
    println!("Records:");
    println!("  Extracted: {}", report.records.len());
    println!("  Without contact details: {} ({:.1}%)", bare, share);
}

/// One-line description of how the crawl ended
pub fn outcome_label(outcome: &CrawlOutcome) -> String {
    match outcome {
        CrawlOutcome::Completed => "completed".to_string(),
        CrawlOutcome::Cancelled => "cancelled (partial results)".to_string(),
        CrawlOutcome::Aborted(e) => format!("aborted (partial results): {}", e),
    }
}
