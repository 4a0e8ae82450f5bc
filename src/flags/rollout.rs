//! Deterministic rollout bucketing.
//!
//! A subject lands in bucket `md5("{flag_id}:{subject_id}")[0..4] % 10_000 / 100`,
//! a value in `[0, 100)` with two decimals of resolution. The bucket depends
//! only on the two ids, so a verdict is stable across calls, processes and
//! platforms.

use md5::{Digest, Md5};

/// Stable bucket in `[0, 100)` for a (flag, subject) pair.
pub fn rollout_bucket(flag_id: &str, subject_id: &str) -> f64 {
    let mut hasher = Md5::new();
    hasher.update(flag_id.as_bytes());
    hasher.update(b":");
    hasher.update(subject_id.as_bytes());
    let digest = hasher.finalize();

    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(prefix % 10_000) / 100.0
}

/// Whether `subject_id` falls inside a `percentage` rollout of `flag_id`.
pub fn in_rollout(flag_id: &str, subject_id: &str, percentage: f64) -> bool {
    rollout_bucket(flag_id, subject_id) < percentage
}
