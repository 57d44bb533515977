//! Expiry sweeper: purges aged voicemail recordings from the provider.
//!
//! Runs first within an hour of startup, then daily. The switch from the
//! bootstrap cadence happens on the first run and is tracked in memory only.

use std::{
  sync::atomic::{AtomicBool, Ordering},
  time::Duration,
};

use chrono::{DateTime, Utc};
use switchboard_core::{
  jobs::{Job, JobQueue},
  notify::{ProviderError, Recordings},
  store::CallCenterStore,
};
use tracing::{debug, error, info};

use crate::error::{Error, Result};

pub const SWEEP_JOB_KEY: &str = "voicemail_check";

const BOOTSTRAP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const DAILY_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
pub struct ExpirySweeper {
  lifespan:               chrono::Duration,
  initial_check_complete: AtomicBool,
}

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
  pub removed: usize,
  pub failed:  usize,
}

impl ExpirySweeper {
  /// `None` disables sweeping; a lifespan of zero days or less is rejected.
  pub fn from_lifespan_days(days: Option<i64>) -> Result<Option<Self>> {
    match days {
      None => Ok(None),
      Some(d) if d <= 0 => Err(Error::InvalidConfig(format!(
        "voicemail_lifespan_days must be an integer greater than 0, got {d}"
      ))),
      Some(d) => Ok(Some(Self {
        lifespan:               chrono::Duration::days(d),
        initial_check_complete: AtomicBool::new(false),
      })),
    }
  }

  pub fn lifespan(&self) -> chrono::Duration { self.lifespan }

  pub fn initial_check_complete(&self) -> bool {
    self.initial_check_complete.load(Ordering::Acquire)
  }

  /// Registers the recurring sweep, replacing any earlier registration.
  pub fn begin(&self, jobs: &dyn JobQueue) {
    jobs.schedule_every(SWEEP_JOB_KEY, BOOTSTRAP_INTERVAL, BOOTSTRAP_INTERVAL, Job::ExpirySweep);
    info!(lifespan_days = self.lifespan.num_days(), "voicemail expiry sweeper scheduled");
  }

  pub async fn run<S, R>(
    &self,
    store: &S,
    recordings: &R,
    jobs: &dyn JobQueue,
    now: DateTime<Utc>,
  ) -> Result<SweepReport>
  where
    S: CallCenterStore,
    R: Recordings,
  {
    if !self.initial_check_complete.swap(true, Ordering::AcqRel) {
      jobs.reschedule(SWEEP_JOB_KEY, DAILY_INTERVAL);
      debug!("expiry sweeper moved to daily cadence");
    }

    let mut report = SweepReport::default();
    let voicemails = store.list_unremoved_voicemails().await.map_err(Error::store)?;
    for voicemail in voicemails.iter().filter(|v| v.is_expired(self.lifespan, now)) {
      let deleted = match recordings.delete_recording(&voicemail.sid).await {
        Ok(()) => true,
        Err(ProviderError::NotFound) => {
          debug!(sid = %voicemail.sid, "recording already gone");
          true
        }
        Err(e) => {
          error!(sid = %voicemail.sid, error = %e, "failed deleting recording");
          false
        }
      };

      if deleted {
        store
          .mark_voicemail_removed(&voicemail.sid)
          .await
          .map_err(Error::store)?;
        report.removed += 1;
      } else {
        report.failed += 1;
      }
    }

    if report.removed > 0 || report.failed > 0 {
      info!(removed = report.removed, failed = report.failed, "expiry sweep finished");
    }
    Ok(report)
  }
}
