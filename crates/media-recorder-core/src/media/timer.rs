use crate::media::{
    GroupEvent,
    session_group::{GroupInner, TickOutcome, stop_members},
};

use std::{sync::Weak, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::{debug, info, warn};

/// Resolution of the recording clock.
pub(crate) const TICK: Duration = Duration::from_secs(1);

/// Cancellable one-second clock owned by a session group.
///
/// Holds only a weak reference to the group so a dropped group ends the
/// task on its next tick.
#[derive(Debug, Default)]
pub(crate) struct RecordingTimer {
    handle: Option<JoinHandle<()>>,
}

impl RecordingTimer {
    /// Starts a fresh clock, cancelling any previous one.
    pub(crate) fn start(&mut self, group: Weak<Mutex<GroupInner>>) {
        self.cancel();
        self.handle = Some(tokio::spawn(run(group)));

        debug!("Recording timer started");
    }

    /// Aborts the clock. Safe to call when nothing runs.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Recording timer cancelled");
        }
    }

    /// Forgets the clock without aborting it.
    ///
    /// Used by the clock task itself before it stops the group, so that the
    /// stop does not abort the task that is running it.
    pub(crate) fn release(&mut self) {
        self.handle = None;
    }

    /// Whether a clock is attached.
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(group: Weak<Mutex<GroupInner>>) {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);

    loop {
        ticker.tick().await;

        let Some(group) = group.upgrade() else {
            return;
        };
        let mut inner = group.lock().await;

        match inner.tick_recording() {
            TickOutcome::Continue => {}
            TickOutcome::Idle => {
                inner.timer.release();
                debug!("Group no longer recording, timer exits");
                return;
            }
            TickOutcome::CeilingReached => {
                inner.timer.release();
                drop(inner);

                let outcome = stop_members(&group).await;
                let failed_members = outcome.failures.iter().map(|f| f.index).collect();
                group.lock().await.emit(GroupEvent::AutoStopped {
                    recordings: outcome.recordings.clone(),
                    failed_members,
                });

                if outcome.failures.is_empty() {
                    info!(
                        recordings = outcome.recordings.len(),
                        "Maximum recording time reached, recording stopped"
                    );
                } else {
                    warn!(
                        failures = outcome.failures.len(),
                        "Maximum recording time reached, some members failed to stop"
                    );
                }
                return;
            }
        }
    }
}
