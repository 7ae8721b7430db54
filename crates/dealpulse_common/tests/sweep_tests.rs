//! Health-score sweep tests against the SQLite store and a failing store.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p dealpulse_common --test sweep_tests
//! ```

use chrono::{DateTime, Duration, Utc};
use dealpulse_common::{
    Deal, DealStatus, DealStore, HealthScoreJob, JobError, SqliteDealStore, StoreError,
    UserSettingsRow,
};
use std::sync::Mutex;

// ============================================================================
// Fixtures
// ============================================================================

const DECAY_5: &str = r#"{"enableTimeDecay": true, "timeDecayRate": 5}"#;

fn deal(id: &str, user: &str, score: Option<i64>, status: DealStatus, idle_days: i64, now: DateTime<Utc>) -> Deal {
    Deal {
        id: id.to_string(),
        user_id: user.to_string(),
        name: format!("Deal {}", id),
        health_score: score,
        status,
        updated_at: now - Duration::days(idle_days),
        last_decay_at: None,
    }
}

fn store_with(users: &[(&str, Option<&str>)], deals: &[Deal]) -> SqliteDealStore {
    let store = SqliteDealStore::open_in_memory().unwrap();
    for (id, settings) in users {
        store
            .upsert_user(id, &format!("{}@example.com", id), *settings)
            .unwrap();
    }
    for d in deals {
        store.upsert_deal(d).unwrap();
    }
    store
}

fn score(store: &SqliteDealStore, id: &str) -> Option<i64> {
    store.deal(id).unwrap().unwrap().health_score
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_fourteen_idle_days_drop_ten_points() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 14, now)],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    assert!(summary.success);
    assert_eq!(summary.message, "Updated health scores for 1 deals");
    assert_eq!(summary.results[0].previous_health, Some(50));
    assert_eq!(summary.results[0].new_health, 40);
    assert_eq!(score(&store, "d1"), Some(40));
}

#[test]
fn test_three_idle_days_change_nothing() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 3, now)],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    assert!(summary.results.is_empty());
    assert_eq!(summary.message, "Updated health scores for 0 deals");
    assert_eq!(score(&store, "d1"), Some(50));
}

#[test]
fn test_frozen_and_disabled_deals_are_untouched() {
    let now = Utc::now();
    let store = store_with(
        &[
            ("u1", Some(DECAY_5)),
            ("u2", Some(r#"{"enableTimeDecay": false, "timeDecayRate": 5}"#)),
            ("u3", None),
        ],
        &[
            deal("won", "u1", Some(50), DealStatus::Won, 70, now),
            deal("lost", "u1", Some(50), DealStatus::Lost, 70, now),
            deal("off", "u2", Some(50), DealStatus::Open, 70, now),
            deal("none", "u3", Some(50), DealStatus::Stalled, 70, now),
        ],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    assert!(summary.results.is_empty());
    for id in ["won", "lost", "off", "none"] {
        assert_eq!(score(&store, id), Some(50), "deal {} changed", id);
    }
}

#[test]
fn test_clamps_at_zero() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(r#"{"enableTimeDecay": true, "timeDecayRate": 20}"#))],
        &[deal("d1", "u1", Some(5), DealStatus::Stalled, 7, now)],
    );

    HealthScoreJob::new(&store).run(now).unwrap();
    assert_eq!(score(&store, "d1"), Some(0));
}

#[test]
fn test_out_of_range_score_kept_when_decay_disabled() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(r#"{"enableTimeDecay": false, "timeDecayRate": 5}"#))],
        &[deal("d1", "u1", Some(130), DealStatus::Open, 30, now)],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    assert!(summary.results.is_empty());
    assert_eq!(score(&store, "d1"), Some(130));
}

#[test]
fn test_fractional_rate_rounds_per_run() {
    let start = Utc::now();
    let rate_2_5 = r#"{"enableTimeDecay": true, "timeDecayRate": 2.5}"#;

    // Four weekly runs: each rounds 2.5 up to 3
    let weekly = store_with(
        &[("u1", Some(rate_2_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 7, start)],
    );
    let job = HealthScoreJob::new(&weekly);
    for week in 0..4 {
        job.run(start + Duration::days(7 * week)).unwrap();
    }
    assert_eq!(score(&weekly, "d1"), Some(38));

    // One late run charges 4 * 2.5 = 10
    let late = store_with(
        &[("u1", Some(rate_2_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 28, start)],
    );
    HealthScoreJob::new(&late).run(start).unwrap();
    assert_eq!(score(&late, "d1"), Some(40));
}

#[test]
fn test_immediate_rerun_is_a_no_op() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 14, now)],
    );
    let job = HealthScoreJob::new(&store);

    assert_eq!(job.run(now).unwrap().updated_count(), 1);
    let second = job.run(now + Duration::minutes(5)).unwrap();

    assert_eq!(second.updated_count(), 0);
    assert_eq!(score(&store, "d1"), Some(40));
}

#[test]
fn test_weekly_runs_charge_one_week_each() {
    let start = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(80), DealStatus::Open, 10, start)],
    );
    let job = HealthScoreJob::new(&store);

    job.run(start).unwrap();
    assert_eq!(score(&store, "d1"), Some(75));

    // Three days of the first idle stretch carried over: 3 + 7 = 10 days
    job.run(start + Duration::days(7)).unwrap();
    assert_eq!(score(&store, "d1"), Some(70));

    job.run(start + Duration::days(14)).unwrap();
    assert_eq!(score(&store, "d1"), Some(65));
}

#[test]
fn test_activity_restarts_the_clock() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 14, now)],
    );
    let job = HealthScoreJob::new(&store);
    job.run(now).unwrap();

    // Someone touches the deal two days later
    let mut touched = store.deal("d1").unwrap().unwrap();
    touched.updated_at = now + Duration::days(2);
    store.upsert_deal(&touched).unwrap();

    assert_eq!(job.run(now + Duration::days(8)).unwrap().updated_count(), 0);
    assert_eq!(job.run(now + Duration::days(9)).unwrap().updated_count(), 1);
    assert_eq!(score(&store, "d1"), Some(35));
}

#[test]
fn test_null_score_is_persisted_as_default() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", None, DealStatus::Open, 1, now)],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    assert_eq!(summary.results[0].previous_health, None);
    assert_eq!(score(&store, "d1"), Some(50));
}

#[test]
fn test_invalid_settings_skip_the_user_only() {
    let now = Utc::now();
    let store = store_with(
        &[
            ("bad", Some(r#"{"enableTimeDecay": true, "timeDecayRate": -4}"#)),
            ("garbled", Some("{not json")),
            ("u1", Some(DECAY_5)),
        ],
        &[
            deal("b1", "bad", Some(50), DealStatus::Open, 30, now),
            deal("d1", "u1", Some(50), DealStatus::Open, 14, now),
        ],
    );

    let summary = HealthScoreJob::new(&store).run(now).unwrap();

    let skipped: Vec<&str> = summary
        .skipped_users
        .iter()
        .map(|s| s.user_id.as_str())
        .collect();
    assert_eq!(skipped, vec!["bad", "garbled"]);
    assert_eq!(summary.updated_count(), 1);
    assert_eq!(score(&store, "b1"), Some(50));
}

#[test]
fn test_preview_writes_nothing() {
    let now = Utc::now();
    let store = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 14, now)],
    );

    let summary = HealthScoreJob::new(&store).preview(now).unwrap();

    assert_eq!(summary.message, "Would update health scores for 1 deals");
    assert_eq!(summary.results[0].new_health, 40);
    assert_eq!(score(&store, "d1"), Some(50));
}

// ============================================================================
// Failure handling
// ============================================================================

/// Wraps the SQLite store and fails the n-th write or any read on request
struct FlakyStore {
    inner: SqliteDealStore,
    fail_users: bool,
    fail_write_at: Option<usize>,
    writes: Mutex<usize>,
}

impl FlakyStore {
    fn new(inner: SqliteDealStore) -> Self {
        Self {
            inner,
            fail_users: false,
            fail_write_at: None,
            writes: Mutex::new(0),
        }
    }
}

impl DealStore for FlakyStore {
    fn automation_users(&self) -> Result<Vec<UserSettingsRow>, StoreError> {
        if self.fail_users {
            return Err(StoreError::InvalidRow("users table unavailable".to_string()));
        }
        self.inner.automation_users()
    }

    fn scored_deals_for_user(&self, user_id: &str) -> Result<Vec<Deal>, StoreError> {
        self.inner.scored_deals_for_user(user_id)
    }

    fn update_health_score(
        &self,
        deal_id: &str,
        health_score: i64,
        last_decay_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut writes = self.writes.lock().unwrap();
        if Some(*writes) == self.fail_write_at {
            return Err(StoreError::InvalidRow("disk full".to_string()));
        }
        *writes += 1;
        self.inner.update_health_score(deal_id, health_score, last_decay_at)
    }
}

#[test]
fn test_write_failure_aborts_and_keeps_earlier_writes() {
    let now = Utc::now();
    let inner = store_with(
        &[("u1", Some(DECAY_5)), ("u2", Some(DECAY_5))],
        &[
            deal("d1", "u1", Some(50), DealStatus::Open, 14, now),
            deal("d2", "u1", Some(50), DealStatus::Open, 14, now),
            deal("d3", "u2", Some(50), DealStatus::Open, 14, now),
        ],
    );
    let mut store = FlakyStore::new(inner);
    store.fail_write_at = Some(1);

    let err = HealthScoreJob::new(&store).run(now).unwrap_err();

    match &err {
        JobError::WriteDeal { deal_id, .. } => assert_eq!(deal_id, "d2"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("disk full"));
    assert_eq!(score(&store.inner, "d1"), Some(40));
    assert_eq!(score(&store.inner, "d2"), Some(50));
    assert_eq!(score(&store.inner, "d3"), Some(50));
}

#[test]
fn test_read_failure_aborts_before_any_write() {
    let now = Utc::now();
    let inner = store_with(
        &[("u1", Some(DECAY_5))],
        &[deal("d1", "u1", Some(50), DealStatus::Open, 14, now)],
    );
    let mut store = FlakyStore::new(inner);
    store.fail_users = true;

    let err = HealthScoreJob::new(&store).run(now).unwrap_err();

    assert!(matches!(err, JobError::ReadUsers(_)));
    assert_eq!(score(&store.inner, "d1"), Some(50));
}
