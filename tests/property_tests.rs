//! Property-based tests for chart-ab
//!
//! - Exactly-once logging under arbitrary action sequences and failures
//! - CSV export round-trips
//! - Summary and significance invariants
//! - Run with ProptestConfig::with_cases(100)

use chart_ab::clock::ManualClock;
use chart_ab::experiment::{
    AppendMode, CompleteOutcome, Condition, InteractionLogger, InteractionRecord,
    ParticipantSession, RandomSelector, StartOutcome, TrialStateMachine, TrialStatus,
};
use chart_ab::export::{export_csv, parse_csv};
use chart_ab::stats::{compute_significance, compute_summary, Significance, SignificancePolicy};
use chart_ab::store::{FlakyStore, MemoryStore};
use chrono::{DateTime, NaiveDate};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// User-visible and fault-injection actions against a trial state machine
#[derive(Debug, Clone)]
enum Action {
    Start,
    Complete,
    Wait(u64),
    FailNextWrite,
    Skip,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Start),
        3 => Just(Action::Complete),
        2 => (0u64..5_000).prop_map(Action::Wait),
        1 => Just(Action::FailNextWrite),
        1 => Just(Action::Skip),
    ]
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop_oneof![Just(Condition::Violin), Just(Condition::Pair)]
}

/// Generate a record with awkward-but-valid field contents
fn arb_record() -> impl Strategy<Value = InteractionRecord> {
    (
        0i64..4_000_000_000,
        "[a-zA-Z0-9 ,\"\n-]{0,16}",
        arb_condition(),
        0.0f64..100_000.0,
    )
        .prop_map(|(secs, participant, condition, elapsed)| {
            let timestamp = DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            InteractionRecord::new(timestamp, participant.into(), condition, elapsed)
        })
}

fn arb_records(max: usize) -> impl Strategy<Value = Vec<InteractionRecord>> {
    proptest::collection::vec(arb_record(), 0..max)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Trial State Machine Properties
    // ========================================================================

    /// Property: records written == Logged outcomes <= trials started,
    /// with equality when no trial was skipped or left open
    #[test]
    fn prop_exactly_once_logging(
        actions in proptest::collection::vec(arb_action(), 0..60),
        seed in any::<u64>()
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let store = Arc::new(FlakyStore::new(MemoryStore::new()));
            let clock = Arc::new(ManualClock::new(
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            ));
            let logger = InteractionLogger::with_clock(
                Arc::clone(&store),
                "interactions",
                AppendMode::Native,
                Arc::clone(&clock),
            );
            let mut machine = TrialStateMachine::new(
                ParticipantSession::new(),
                RandomSelector::seeded(seed),
                logger,
            );

            let mut started = 0usize;
            let mut logged = 0usize;
            let mut skipped = 0usize;
            for action in &actions {
                match action {
                    Action::Start => {
                        let before = machine.status();
                        match machine.start_trial() {
                            StartOutcome::Started { .. } => {
                                prop_assert_eq!(before, TrialStatus::Idle);
                                started += 1;
                            }
                            StartOutcome::Ignored(status) => {
                                prop_assert_ne!(status, TrialStatus::Idle);
                            }
                        }
                    }
                    Action::Complete => match machine.complete_trial().await {
                        Ok(CompleteOutcome::Logged(record)) => {
                            prop_assert!(record.elapsed_seconds() >= 0.0);
                            prop_assert_eq!(machine.status(), TrialStatus::Idle);
                            logged += 1;
                        }
                        Ok(CompleteOutcome::Ignored(status)) => {
                            prop_assert_eq!(status, TrialStatus::Idle);
                        }
                        Err(_) => {
                            prop_assert_eq!(machine.status(), TrialStatus::AwaitingLog);
                        }
                    },
                    Action::Wait(ms) => clock.advance(Duration::from_millis(*ms)),
                    Action::FailNextWrite => store.fail_next_writes(1),
                    Action::Skip => {
                        if machine.skip_logging() {
                            skipped += 1;
                        }
                    }
                }
            }

            let open = usize::from(machine.status() != TrialStatus::Idle);
            prop_assert_eq!(store.inner().row_count("interactions"), logged);
            prop_assert!(logged <= started);
            prop_assert_eq!(logged + skipped + open, started);
            Ok(())
        })?;
    }

    // ========================================================================
    // Export Properties
    // ========================================================================

    /// Property: export then parse yields equal records
    #[test]
    fn prop_csv_round_trip(records in arb_records(30)) {
        let csv = export_csv(&records);
        let parsed = parse_csv(&csv).unwrap();
        prop_assert_eq!(parsed, records);
    }

    /// Property: export is header + one logical record per input
    #[test]
    fn prop_export_is_deterministic(records in arb_records(30)) {
        let first = export_csv(&records);
        prop_assert_eq!(&first, &export_csv(&records));
        prop_assert!(first.starts_with("timestamp,participant_id,chart_type,time_taken\n"));
    }

    // ========================================================================
    // Aggregation Properties
    // ========================================================================

    /// Property: per-condition counts partition the records and
    /// min <= mean <= max
    #[test]
    fn prop_summary_invariants(records in arb_records(60)) {
        let summary = compute_summary(&records);
        prop_assert_eq!(summary.total(), records.len());

        for condition in Condition::ALL {
            let expected = records.iter().filter(|r| r.condition() == condition).count();
            match summary.get(condition) {
                None => prop_assert_eq!(expected, 0),
                Some(stats) => {
                    prop_assert_eq!(stats.count, expected);
                    let tolerance = 1e-9 * stats.max.abs().max(1.0);
                    prop_assert!(stats.min <= stats.mean + tolerance);
                    prop_assert!(stats.mean <= stats.max + tolerance);
                    prop_assert_eq!(stats.std_dev.is_none(), stats.count == 1);
                    if let Some(sd) = stats.std_dev {
                        prop_assert!(sd >= 0.0);
                    }
                }
            }
        }
    }

    /// Property: a computed test has a p-value in [0, 1] and positive df;
    /// otherwise the total or a group explains why
    #[test]
    fn prop_significance_well_formed(records in arb_records(60)) {
        let policy = SignificancePolicy::default();
        match compute_significance(&records, &policy) {
            Significance::Computed(test) => {
                prop_assert!(records.len() > policy.min_total_samples);
                prop_assert!((0.0..=1.0).contains(&test.p_value));
                prop_assert!(test.degrees_of_freedom > 0.0);
                prop_assert_eq!(test.is_significant(), test.p_value < policy.alpha);
            }
            Significance::InsufficientData { total, required } => {
                prop_assert_eq!(total, records.len());
                prop_assert!(total <= required);
            }
            Significance::Unavailable(_) => {}
        }
    }
}
