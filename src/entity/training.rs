//! Time-accumulation skill training.
//!
//! A player queues sessions, starts the clock with [`TrainingQueue::begin`],
//! and later [`TrainingQueue::check`] spends the elapsed wall time on the
//! queued sessions, cheapest first.
//!
//! ```text
//! Idle --begin--> Accruing --check--> Idle
//! ```
//!
//! The first session the elapsed time cannot pay for is dropped without
//! being committed and the walk stops there; sessions after it stay queued
//! for a later check.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::SkillId;

pub const CLOSING_NOTICE: &str = "Thus completes your training, for now.";
pub const REGIMEN_CHANGED_NOTICE: &str = "You decide to change your training regimen.";

/// A pending skill upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingSession {
    pub id: SkillId,
    /// Display name of the skill.
    pub skill: String,
    /// Ordering key; lower cost trains first.
    pub cost: i64,
    pub new_level: u32,
    /// Milliseconds of training needed.
    pub duration: u64,
    /// Shown when the session completes.
    pub message: String,
}

impl TrainingSession {
    pub fn new(id: SkillId, cost: i64, new_level: u32, duration: u64) -> Self {
        Self {
            id,
            skill: id.name().to_string(),
            cost,
            new_level,
            duration,
            message: format!("You have improved your {} skill to level {}.", id.name(), new_level),
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn shortfall_notice(&self) -> String {
        format!(
            "You were able to spend some time training {}, but did not make any breakthroughs.",
            self.skill
        )
    }
}

/// Result of one [`TrainingQueue::check`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrainingReport {
    /// Sessions that completed, in the order they were applied.
    pub committed: Vec<TrainingSession>,
    /// The session dropped for lack of time, if the walk stopped early.
    pub abandoned: Option<TrainingSession>,
    /// Elapsed milliseconds left over after the walk.
    pub unspent_ms: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingQueue {
    /// Cumulative banked training time.
    #[serde(default)]
    time: i64,
    #[serde(default)]
    begin_training: Option<DateTime<Utc>>,
    #[serde(default)]
    sessions: BTreeMap<SkillId, TrainingSession>,
}

impl TrainingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `session`, replacing any pending session for the same skill.
    pub fn set_session(&mut self, session: TrainingSession) {
        self.sessions.insert(session.id, session);
    }

    pub fn session(&self, id: SkillId) -> Option<&TrainingSession> {
        self.sessions.get(&id)
    }

    pub fn remove_session(&mut self, id: SkillId) -> Option<TrainingSession> {
        self.sessions.remove(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &TrainingSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn set_time(&mut self, time: i64) {
        self.time = time;
    }

    pub fn begin_training(&self) -> Option<DateTime<Utc>> {
        self.begin_training
    }

    pub fn set_begin_training(&mut self, at: Option<DateTime<Utc>>) {
        self.begin_training = at;
    }

    /// Start accruing time at `now`.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.begin_training = Some(now);
    }

    pub fn is_accruing(&self) -> bool {
        self.begin_training.is_some()
    }

    /// Spend the time elapsed since training began on the queued sessions.
    ///
    /// Returns `None` when training never began or nothing is queued; the
    /// start timestamp is left alone in both cases.
    pub fn check(&mut self, now: DateTime<Utc>) -> Option<TrainingReport> {
        let beginning = self.begin_training?;
        if self.sessions.is_empty() {
            return None;
        }

        let mut queued: Vec<TrainingSession> = self.sessions.values().cloned().collect();
        queued.sort_by_key(|s| s.cost);
        debug!("checking {} queued training sessions", queued.len());

        let mut elapsed = now.signed_duration_since(beginning).num_milliseconds().max(0);
        let mut report = TrainingReport::default();

        for session in queued {
            let needed = i64::try_from(session.duration).unwrap_or(i64::MAX);
            self.sessions.remove(&session.id);
            if elapsed >= needed {
                elapsed -= needed;
                report.committed.push(session);
            } else {
                report.abandoned = Some(session);
                break;
            }
        }

        self.begin_training = None;
        report.unspent_ms = elapsed;
        Some(report)
    }

    /// Drop every queued session, refunding each one's level into the time
    /// bucket, and stop accruing. Returns the total refunded.
    pub fn clear(&mut self) -> i64 {
        let refunded: i64 = self
            .sessions
            .values()
            .map(|s| i64::from(s.new_level))
            .sum();
        self.time += refunded;
        self.sessions.clear();
        self.begin_training = None;
        refunded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn queue_with(sessions: &[TrainingSession]) -> TrainingQueue {
        let mut q = TrainingQueue::new();
        for s in sessions {
            q.set_session(s.clone());
        }
        q
    }

    #[test]
    fn check_without_begin_is_a_no_op() {
        let mut q = queue_with(&[TrainingSession::new(SkillId::Stealth, 1, 2, 100)]);
        assert_eq!(q.check(Utc::now()), None);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn check_with_empty_queue_keeps_timestamp() {
        let mut q = TrainingQueue::new();
        let start = Utc::now();
        q.begin(start);
        assert_eq!(q.check(start + Duration::seconds(10)), None);
        assert_eq!(q.begin_training(), Some(start));
    }

    #[test]
    fn commits_in_cost_order_and_drops_first_shortfall() {
        let a = TrainingSession::new(SkillId::Dodging, 1, 2, 1000);
        let b = TrainingSession::new(SkillId::Blades, 2, 3, 500);
        let mut q = queue_with(&[b.clone(), a.clone()]);
        let start = Utc::now();
        q.begin(start);

        let report = q.check(start + Duration::milliseconds(1200)).expect("report");
        assert_eq!(report.committed, vec![a]);
        assert_eq!(report.abandoned, Some(b));
        assert_eq!(report.unspent_ms, 200);
        assert!(q.is_empty());
        assert!(!q.is_accruing());
    }

    #[test]
    fn sessions_after_the_shortfall_stay_queued() {
        let cheap = TrainingSession::new(SkillId::Stun, 1, 2, 5000);
        let pricey = TrainingSession::new(SkillId::Perception, 9, 4, 10);
        let mut q = queue_with(&[cheap.clone(), pricey.clone()]);
        let start = Utc::now();
        q.begin(start);

        let report = q.check(start + Duration::milliseconds(100)).expect("report");
        assert!(report.committed.is_empty());
        assert_eq!(report.abandoned, Some(cheap));
        assert_eq!(q.session(SkillId::Perception), Some(&pricey));
        assert_eq!(q.begin_training(), None);
    }

    #[test]
    fn enough_time_commits_everything() {
        let mut q = queue_with(&[
            TrainingSession::new(SkillId::Brawling, 3, 2, 300),
            TrainingSession::new(SkillId::Lockpicking, 1, 2, 100),
        ]);
        let start = Utc::now();
        q.begin(start);

        let report = q.check(start + Duration::milliseconds(450)).expect("report");
        let order: Vec<SkillId> = report.committed.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![SkillId::Lockpicking, SkillId::Brawling]);
        assert_eq!(report.abandoned, None);
        assert_eq!(report.unspent_ms, 50);
    }

    #[test]
    fn clear_refunds_new_levels_into_time() {
        let mut q = queue_with(&[TrainingSession::new(SkillId::Dodging, 1, 5, 100)]);
        q.set_time(7);
        q.begin(Utc::now());

        assert_eq!(q.clear(), 5);
        assert_eq!(q.time(), 12);
        assert!(q.is_empty());
        assert!(!q.is_accruing());
    }

    #[test]
    fn clock_skew_counts_as_no_time() {
        let mut q = queue_with(&[TrainingSession::new(SkillId::Stealth, 1, 2, 0)]);
        let start = Utc::now();
        q.begin(start);

        let report = q.check(start - Duration::seconds(5)).expect("report");
        assert_eq!(report.committed.len(), 1);
        assert_eq!(report.unspent_ms, 0);
    }
}
