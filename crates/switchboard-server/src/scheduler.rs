//! [`TokioScheduler`], the in-process [`JobQueue`].
//!
//! Every key owns one tokio task that sleeps until its job is due and then
//! sends the job down an unbounded channel drained by the worker
//! ([`crate::worker`]). Replacing or cancelling a key aborts its task.
//! Nothing is persisted: pending jobs die with the process.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use switchboard_core::jobs::{Job, JobQueue};
use tokio::{
  sync::{mpsc, watch},
  task::JoinHandle,
};
use tracing::{debug, warn};

struct Entry {
  generation: u64,
  handle:     JoinHandle<()>,
  /// Present for recurring jobs.
  cadence:    Option<watch::Sender<Duration>>,
}

struct Inner {
  entries:         Mutex<HashMap<String, Entry>>,
  next_generation: AtomicU64,
  due:             mpsc::UnboundedSender<Job>,
}

impl Inner {
  fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Forget a fired one-shot unless it was replaced meanwhile.
  fn finish(&self, key: &str, generation: u64) {
    let mut entries = self.entries();
    if entries.get(key).is_some_and(|e| e.generation == generation) {
      entries.remove(key);
    }
  }

  fn dispatch(&self, key: &str, job: Job) -> bool {
    if self.due.send(job).is_err() {
      warn!(key, "job worker has stopped; dropping job");
      return false;
    }
    true
  }
}

/// Cheap to clone; clones share the same job table.
#[derive(Clone)]
pub struct TokioScheduler {
  inner: Arc<Inner>,
}

impl TokioScheduler {
  /// The scheduler and the receiving end its due jobs arrive on.
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
    let (due, rx) = mpsc::unbounded_channel();
    let inner = Inner {
      entries: Mutex::new(HashMap::new()),
      next_generation: AtomicU64::new(0),
      due,
    };
    (Self { inner: Arc::new(inner) }, rx)
  }

  pub fn is_pending(&self, key: &str) -> bool { self.inner.entries().contains_key(key) }

  fn insert(&self, key: &str, spawn: impl FnOnce(u64) -> Entry) {
    let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
    // The lock is held across the spawn so a fast task cannot finish before
    // its entry exists.
    let mut entries = self.inner.entries();
    if let Some(old) = entries.insert(key.to_owned(), spawn(generation)) {
      old.handle.abort();
      debug!(key, "replaced pending job");
    }
  }
}

enum Tick {
  Due,
  CadenceChanged,
  Closed,
}

impl JobQueue for TokioScheduler {
  fn schedule_once(&self, key: &str, delay: Duration, job: Job) {
    self.insert(key, |generation| {
      let inner = Arc::clone(&self.inner);
      let key = key.to_owned();
      let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        inner.finish(&key, generation);
        inner.dispatch(&key, job);
      });
      Entry { generation, handle, cadence: None }
    });
  }

  fn schedule_every(&self, key: &str, first: Duration, every: Duration, job: Job) {
    self.insert(key, |generation| {
      let inner = Arc::clone(&self.inner);
      let key = key.to_owned();
      let (cadence, mut cadence_rx) = watch::channel(every);
      let handle = tokio::spawn(async move {
        let mut wait = first;
        loop {
          let tick = tokio::select! {
            _ = tokio::time::sleep(wait) => Tick::Due,
            changed = cadence_rx.changed() => {
              if changed.is_ok() { Tick::CadenceChanged } else { Tick::Closed }
            }
          };
          match tick {
            Tick::Due => {
              if !inner.dispatch(&key, job.clone()) {
                break;
              }
              wait = *cadence_rx.borrow();
            }
            Tick::CadenceChanged => wait = *cadence_rx.borrow_and_update(),
            Tick::Closed => break,
          }
        }
      });
      Entry { generation, handle, cadence: Some(cadence) }
    });
  }

  fn cancel(&self, key: &str) -> bool {
    match self.inner.entries().remove(key) {
      Some(entry) => {
        entry.handle.abort();
        true
      }
      None => false,
    }
  }

  fn reschedule(&self, key: &str, every: Duration) -> bool {
    match self.inner.entries().get(key) {
      Some(Entry { cadence: Some(cadence), .. }) => cadence.send(every).is_ok(),
      _ => false,
    }
  }
}
