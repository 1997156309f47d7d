//! A/B Session Simulation
//!
//! Simulates a batch of participants answering against an in-memory store,
//! then prints the per-condition summary, the Welch t-test and the CSV
//! export.
//!
//! Run with: cargo run --example ab_session

use chart_ab::chart::PlotlyRenderer;
use chart_ab::clock::ManualClock;
use chart_ab::config::AppConfig;
use chart_ab::experiment::{Condition, ParticipantSession, RandomSelector};
use chart_ab::export::export_csv;
use chart_ab::session::ExperimentSession;
use chart_ab::store::{MemoryStore, Table};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

fn penguins() -> Table {
    let mut table = Table::new(["species", "bill_length_mm", "bill_depth_mm"]);
    let rows = [
        ("Adelie", 39.1, 18.7),
        ("Adelie", 39.5, 17.4),
        ("Adelie", 40.3, 18.0),
        ("Chinstrap", 46.5, 17.9),
        ("Chinstrap", 50.0, 19.5),
        ("Chinstrap", 51.3, 19.2),
        ("Gentoo", 46.1, 13.2),
        ("Gentoo", 50.0, 16.3),
        ("Gentoo", 48.7, 14.1),
    ];
    for (species, length, depth) in rows {
        table
            .push_row(vec![species.to_string(), length.to_string(), depth.to_string()])
            .expect("three columns");
    }
    table
}

#[tokio::main]
async fn main() -> chart_ab::Result<()> {
    println!("=== chart-ab Session Simulation ===\n");

    let store = Arc::new(MemoryStore::with_tables([("penguins".to_string(), penguins())]));
    let clock = Arc::new(ManualClock::new(Local::now().naive_local()));
    let config = AppConfig::default();
    let mut answers = StdRng::seed_from_u64(7);

    // -------------------------------------------------------------------------
    // 1. Ten participants, three trials each
    // -------------------------------------------------------------------------
    println!("1. Running trials...");
    for participant in 0..10_u64 {
        let mut session = ExperimentSession::with_parts(
            Arc::clone(&store),
            &config,
            ParticipantSession::new(),
            RandomSelector::seeded(participant),
            PlotlyRenderer::new(),
            Arc::clone(&clock),
        );

        for _ in 0..3 {
            let shown = session.show_chart().await?;
            // Pair charts are slower to read in this simulation.
            let base = match shown.chart.condition() {
                Condition::Violin => 4.0,
                Condition::Pair => 6.5,
            };
            let millis = (base + answers.gen_range(-1.5..1.5)) * 1000.0;
            clock.advance(Duration::from_millis(millis as u64));

            let answer = session.answered().await?;
            println!(
                "   {} {:<6} {}",
                &session.participant_id().as_str()[..8],
                shown.chart.condition(),
                answer.message().unwrap_or_default()
            );
        }
    }

    // -------------------------------------------------------------------------
    // 2. Analysis
    // -------------------------------------------------------------------------
    println!("\n2. Analysis...");
    let observer = ExperimentSession::new(Arc::clone(&store), &config);
    let analysis = observer.analysis().await;
    for (condition, stats) in analysis.summary.iter() {
        println!(
            "   {condition:<6} n={:<3} mean={:.2}s min={:.2}s max={:.2}s",
            stats.count, stats.mean, stats.min, stats.max
        );
    }
    println!("   {}", analysis.significance);

    // -------------------------------------------------------------------------
    // 3. Export
    // -------------------------------------------------------------------------
    println!("\n3. CSV export (first lines)...");
    let info = observer.debug_info().await;
    for line in export_csv(&info.log.records).lines().take(4) {
        println!("   {line}");
    }
    println!("   Total interactions recorded: {}", info.total);

    Ok(())
}
