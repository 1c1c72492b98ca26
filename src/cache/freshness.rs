use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::cache::store::CacheState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Ok,
    Stale,
    NoData,
}

/// Whether a cached state can be served without refreshing. Manual
/// entries bypass the timer.
pub fn is_fresh(state: &CacheState, now: DateTime<Utc>, threshold: Duration) -> bool {
    state.manual || state.snapshot.age(now) < to_delta(threshold)
}

/// Health of the cache for the status endpoint, judged against a
/// threshold separate from the refresh TTL.
pub fn status(state: Option<&CacheState>, now: DateTime<Utc>, stale_after: Duration) -> CacheStatus {
    match state {
        None => CacheStatus::NoData,
        Some(state) if state.snapshot.age(now) < to_delta(stale_after) => CacheStatus::Ok,
        Some(_) => CacheStatus::Stale,
    }
}

/// Snapshot age in minutes, one decimal place.
pub fn age_minutes(state: &CacheState, now: DateTime<Utc>) -> f64 {
    let minutes = state.snapshot.age(now).num_seconds() as f64 / 60.0;
    (minutes * 10.0).round() / 10.0
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
