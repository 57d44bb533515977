//! The background job queue seam.
//!
//! Jobs are identified by a string key. Every operation is idempotent by key:
//! scheduling again replaces, cancelling a missing key is a no-op.

use std::time::Duration;

/// Work the scheduler hands back to the server when it comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
  /// Deliver notifications for the voicemail with this recording sid.
  VoicemailNotification { sid: String },
  /// Purge expired recordings from the provider.
  ExpirySweep,
}

/// Key of the deferred notification job for a recording.
pub fn transcript_job_key(sid: &str) -> String { format!("transcript-{sid}") }

pub trait JobQueue: Send + Sync {
  /// Run `job` once after `delay`, replacing any pending job under `key`.
  fn schedule_once(&self, key: &str, delay: Duration, job: Job);

  /// Run `job` after `first`, then every `every`, replacing any job under
  /// `key`.
  fn schedule_every(&self, key: &str, first: Duration, every: Duration, job: Job);

  /// Drop the pending job under `key`. Returns `false` if there was none,
  /// which includes a one-shot job that already fired.
  fn cancel(&self, key: &str) -> bool;

  /// Change the cadence of a recurring job; the next run is `every` from
  /// now. Returns `false` if no recurring job exists under `key`.
  fn reschedule(&self, key: &str, every: Duration) -> bool;
}
