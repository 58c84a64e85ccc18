//! Periodic overdue sweeps.
//!
//! [`OverdueSweeper::spawn`] reloads the view-model with
//! [`RecordViewModel::load`] on a background task, once immediately and then
//! once per period, until the returned [`SweepHandle`] is cancelled or
//! dropped. Each reload sweeps the fresh list, so records changed elsewhere
//! since the last tick are judged by their stored state. Remote writes issued
//! by a sweep are detached and outlive cancellation.

use std::{sync::Arc, time::Duration};

use tokio::{
  sync::{Mutex, oneshot},
  task::JoinHandle,
  time::MissedTickBehavior,
};

use crate::{clock::Clock, store::RecordStore, view::RecordViewModel};

/// Owns a running sweeper. Dropping it stops the sweeper at its next wake-up.
pub struct SweepHandle {
  shutdown: oneshot::Sender<()>,
  task:     JoinHandle<()>,
}

impl SweepHandle {
  /// Stop the sweeper and wait for it to exit. A sweep already in progress
  /// finishes first.
  pub async fn cancel(self) {
    let Self { shutdown, task } = self;
    let _ = shutdown.send(());
    if let Err(e) = task.await {
      tracing::error!(error = %e, "overdue sweeper task failed");
    }
  }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

pub struct OverdueSweeper;

impl OverdueSweeper {
  pub fn spawn<S, C>(vm: Arc<Mutex<RecordViewModel<S, C>>>, period: Duration) -> SweepHandle
  where
    S: RecordStore + 'static,
    C: Clock + 'static,
  {
    let (shutdown, mut stop) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
      let mut ticks = tokio::time::interval(period);
      ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
      tracing::info!(period_secs = period.as_secs(), "overdue sweeper started");

      loop {
        tokio::select! {
          // Fires on an explicit cancel and when the handle is dropped.
          _ = &mut stop => break,
          _ = ticks.tick() => match vm.lock().await.load().await {
            Ok(pending) if !pending.is_empty() => {
              tracing::debug!(count = pending.ids().len(), "overdue sweep issued updates");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "overdue sweep could not reload records"),
          },
        }
      }

      tracing::info!("overdue sweeper stopped");
    });

    SweepHandle { shutdown, task }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    client::RecordStoreClient,
    record::{
      BorrowStatus::{self, *},
      RecordId, RecordPatch,
    },
    store::{FailureKind, RecordStore},
    testing::{MemoryStore, date, record},
  };
  use chrono::NaiveDate;

  const PERIOD: Duration = Duration::from_secs(60);

  #[derive(Clone)]
  struct StepClock(Arc<std::sync::Mutex<NaiveDate>>);

  impl StepClock {
    fn set(&self, day: &str) { *self.0.lock().unwrap() = date(day); }
  }

  impl Clock for StepClock {
    fn today(&self) -> NaiveDate { *self.0.lock().unwrap() }
  }

  async fn setup() -> (Arc<Mutex<RecordViewModel<MemoryStore, StepClock>>>, Arc<MemoryStore>, StepClock) {
    let store = Arc::new(MemoryStore::with_records(vec![
      record("1", "Jane Doe", "Laptop", "2024-01-01", "2024-01-05", Borrowed),
      record("2", "Sam Roe", "Camera", "2024-01-01", "2024-01-20", Borrowed),
    ]));
    let clock = StepClock(Arc::new(std::sync::Mutex::new(date("2024-01-05"))));
    let mut vm = RecordViewModel::with_clock(RecordStoreClient::new(Arc::clone(&store)), clock.clone());
    assert!(vm.load().await.unwrap().is_empty());
    (Arc::new(Mutex::new(vm)), store, clock)
  }

  async fn statuses(vm: &Mutex<RecordViewModel<MemoryStore, StepClock>>) -> Vec<BorrowStatus> {
    vm.lock().await.records().iter().map(|r| r.status).collect()
  }

  #[tokio::test(start_paused = true)]
  async fn sweeps_once_per_period() {
    let (vm, store, clock) = setup().await;
    let handle = OverdueSweeper::spawn(Arc::clone(&vm), PERIOD);

    // The immediate sweep runs at 2024-01-05 and changes nothing.
    tokio::time::sleep(PERIOD / 2).await;
    assert_eq!(statuses(&vm).await, [Borrowed, Borrowed]);

    clock.set("2024-01-10");
    tokio::time::sleep(PERIOD).await;
    assert_eq!(statuses(&vm).await, [Overdue, Borrowed]);
    assert_eq!(store.stored()[0].status, Overdue);

    clock.set("2024-01-21");
    tokio::time::sleep(PERIOD).await;
    assert_eq!(statuses(&vm).await, [Overdue, Overdue]);

    handle.cancel().await;
  }

  #[tokio::test(start_paused = true)]
  async fn sweep_sees_records_returned_elsewhere() {
    let (vm, store, clock) = setup().await;
    let handle = OverdueSweeper::spawn(Arc::clone(&vm), PERIOD);
    tokio::time::sleep(PERIOD / 2).await;

    // Another session returns record 1 while this view still holds it as Borrowed.
    store
      .update_record(RecordId::from("1"), RecordPatch::status(Returned))
      .await
      .unwrap();
    assert_eq!(statuses(&vm).await, [Borrowed, Borrowed]);

    clock.set("2024-01-10");
    tokio::time::sleep(PERIOD).await;
    assert_eq!(statuses(&vm).await, [Returned, Borrowed]);
    assert_eq!(store.stored()[0].status, Returned);

    handle.cancel().await;
  }

  #[tokio::test(start_paused = true)]
  async fn failed_reload_keeps_the_sweeper_running() {
    let (vm, store, clock) = setup().await;
    store.fail_lists(Some(FailureKind::Unavailable));
    let handle = OverdueSweeper::spawn(Arc::clone(&vm), PERIOD);
    tokio::time::sleep(PERIOD / 2).await;
    assert!(!handle.is_finished());

    store.fail_lists(None);
    clock.set("2024-01-10");
    tokio::time::sleep(PERIOD).await;
    assert_eq!(statuses(&vm).await, [Overdue, Borrowed]);

    handle.cancel().await;
  }

  #[tokio::test(start_paused = true)]
  async fn cancelled_sweeper_stops_sweeping() {
    let (vm, _store, clock) = setup().await;
    let handle = OverdueSweeper::spawn(Arc::clone(&vm), PERIOD);
    handle.cancel().await;

    clock.set("2024-02-01");
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(statuses(&vm).await, [Borrowed, Borrowed]);
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_the_handle_stops_the_sweeper() {
    let (vm, _store, clock) = setup().await;
    drop(OverdueSweeper::spawn(Arc::clone(&vm), PERIOD));
    tokio::task::yield_now().await;

    clock.set("2024-02-01");
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(statuses(&vm).await, [Borrowed, Borrowed]);
  }
}
