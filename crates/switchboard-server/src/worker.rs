//! Drains due jobs from the scheduler and runs them against the app state.

use chrono::Utc;
use switchboard_core::{jobs::Job, store::CallCenterStore};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{AppState, Provider, voicemail};

/// Runs until the scheduler side of the channel is dropped.
pub async fn run<S, P>(state: AppState<S, P>, mut due: mpsc::UnboundedReceiver<Job>)
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  while let Some(job) = due.recv().await {
    run_job(&state, job).await;
  }
  info!("job worker stopped");
}

pub async fn run_job<S, P>(state: &AppState<S, P>, job: Job)
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  match job {
    Job::VoicemailNotification { sid } => {
      if let Err(e) = voicemail::notification_job(state, &sid).await {
        error!(sid = %sid, error = %e, "voicemail notification job failed");
      }
    }
    Job::ExpirySweep => {
      let Some(sweeper) = &state.sweeper else {
        warn!("expiry sweep fired but the sweeper is disabled");
        return;
      };
      let result = sweeper
        .run(
          state.store.as_ref(),
          state.provider.as_ref(),
          state.jobs.as_ref(),
          Utc::now(),
        )
        .await;
      if let Err(e) = result {
        error!(error = %e, "expiry sweep failed");
      }
    }
  }
}
