//! Sequencer worker: runs every report sequence that needs delays between
//! reports.
//!
//! One tokio task drains a job queue in FIFO order.  Each job holds the
//! session's send lane from its first report to its last, so a click's
//! press and release (or a whole typed string) reach the host back-to-back.
//! Callers get a [`SequenceHandle`] future and are never blocked by the
//! delays themselves.
//!
//! A job stops at the first report that fails or that the transport
//! declines.  Leaving `Connected` mid-run makes the next send fail with
//! `NotConnected`, which is how an in-flight sequence is aborted.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use remote_hid_core::report::encoder;
use remote_hid_core::{KeyboardReport, MouseButton, Report, ResolvedKey, TextPlan};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::session::{HeldInput, HidSession, SendLane, SessionError};

const QUEUE_CAPACITY: usize = 32;

/// A delayed report sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceJob {
    /// Press `button` on top of the held buttons, hold, release it.
    Click { button: MouseButton, hold: Duration },
    /// Tap a keyboard or media key.
    Key { key: ResolvedKey, hold: Duration },
    /// Type a planned string.
    Text {
        plan: TextPlan,
        hold: Duration,
        gap: Duration,
    },
}

/// Result of a job that ran without error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOutcome {
    pub reports_sent: usize,
    /// Characters of a text job that had no key stroke.
    pub skipped: Vec<char>,
    /// `false` if the transport declined a report and the run stopped.
    pub completed: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence interrupted after {reports_sent} report(s): {source}")]
    Interrupted {
        reports_sent: usize,
        #[source]
        source: SessionError,
    },

    #[error("sequencer worker has stopped")]
    WorkerStopped,
}

struct Envelope {
    job: SequenceJob,
    reply: oneshot::Sender<Result<SequenceOutcome, SequenceError>>,
}

/// Completion of a submitted job.
pub struct SequenceHandle {
    rx: oneshot::Receiver<Result<SequenceOutcome, SequenceError>>,
}

impl Future for SequenceHandle {
    type Output = Result<SequenceOutcome, SequenceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|reply| reply.unwrap_or(Err(SequenceError::WorkerStopped)))
    }
}

/// Submission side of the worker.  Cloning shares the same worker.
#[derive(Clone)]
pub struct Sequencer {
    tx: mpsc::Sender<Envelope>,
}

impl Sequencer {
    /// Spawns the worker task.  It exits once every `Sequencer` clone is
    /// dropped and the queue is drained.
    pub fn spawn(session: Arc<HidSession>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(Envelope { job, reply }) = rx.recv().await {
                let result = run_job(&session, job).await;
                if reply.send(result).is_err() {
                    debug!(session = %session.id(), "sequence caller went away");
                }
            }
            debug!(session = %session.id(), "sequencer worker stopped");
        });
        Self { tx }
    }

    /// Queues `job` behind any earlier submissions.
    pub async fn submit(&self, job: SequenceJob) -> Result<SequenceHandle, SequenceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { job, reply })
            .await
            .map_err(|_| SequenceError::WorkerStopped)?;
        Ok(SequenceHandle { rx })
    }
}

/// Counts reports for one job and stops it on the first failure.
///
/// A release the transport declines is retried once so a pressed key or
/// button is not left down on the host.
struct Run<'a> {
    session: &'a HidSession,
    lane: &'a SendLane<'a>,
    sent: usize,
}

enum Step {
    Sent,
    Declined,
}

impl<'a> Run<'a> {
    async fn send<F>(&mut self, build: F) -> Result<Step, SequenceError>
    where
        F: FnOnce(&mut HeldInput) -> Report,
    {
        match self.session.send(self.lane, build).await {
            Ok(true) => {
                self.sent += 1;
                Ok(Step::Sent)
            }
            Ok(false) => Ok(Step::Declined),
            Err(source) => Err(SequenceError::Interrupted {
                reports_sent: self.sent,
                source,
            }),
        }
    }

    /// Second attempt at a declined release.  The job still ends incomplete.
    async fn retry_release<F>(&mut self, build: F)
    where
        F: FnOnce(&mut HeldInput) -> Report,
    {
        match self.send(build).await {
            Ok(Step::Sent) => {}
            Ok(Step::Declined) => {
                warn!(session = %self.session.id(), "release declined twice; input may stay down on the host");
            }
            Err(e) => {
                warn!(session = %self.session.id(), error = %e, "release retry failed");
            }
        }
    }

    fn finish(self, completed: bool, skipped: Vec<char>) -> SequenceOutcome {
        if !completed {
            warn!(session = %self.session.id(), reports_sent = self.sent, "transport declined a report; sequence stopped");
        }
        SequenceOutcome {
            reports_sent: self.sent,
            skipped,
            completed,
        }
    }
}

async fn run_job(session: &HidSession, job: SequenceJob) -> Result<SequenceOutcome, SequenceError> {
    let lane = session.lane().await;
    let mut run = Run {
        session,
        lane: &lane,
        sent: 0,
    };

    match job {
        SequenceJob::Click { button, hold } => {
            let release = |held: &mut HeldInput| -> Report { encoder::mouse_buttons(held.buttons).into() };
            if let Step::Declined = run
                .send(|held| encoder::mouse_buttons(held.buttons.with(button, true)).into())
                .await?
            {
                return Ok(run.finish(false, Vec::new()));
            }
            sleep(hold).await;
            if let Step::Declined = run.send(release).await? {
                run.retry_release(release).await;
                return Ok(run.finish(false, Vec::new()));
            }
        }

        SequenceJob::Key { key, hold } => {
            let press = move |held: &mut HeldInput| -> Report {
                match key {
                    ResolvedKey::Keyboard(code) => encoder::key_press(held.modifiers, code).into(),
                    ResolvedKey::Media(usage) => encoder::consumer_press(usage).into(),
                }
            };
            let release = move |held: &mut HeldInput| -> Report {
                match key {
                    ResolvedKey::Keyboard(_) => encoder::modifiers_only(held.modifiers).into(),
                    ResolvedKey::Media(_) => encoder::consumer_release().into(),
                }
            };
            if let Step::Declined = run.send(press).await? {
                return Ok(run.finish(false, Vec::new()));
            }
            sleep(hold).await;
            if let Step::Declined = run.send(release).await? {
                run.retry_release(release).await;
                return Ok(run.finish(false, Vec::new()));
            }
        }

        SequenceJob::Text { plan, hold, gap } => {
            let TextPlan { steps, skipped } = plan;
            for step in steps {
                // Modifiers held through `set_modifier_state` stay down
                // across the typed keys.
                let press = move |held: &mut HeldInput| -> Report {
                    KeyboardReport {
                        modifiers: step.press.modifiers | held.modifiers,
                        ..step.press
                    }
                    .into()
                };
                let release =
                    |held: &mut HeldInput| -> Report { encoder::modifiers_only(held.modifiers).into() };
                if let Step::Declined = run.send(press).await? {
                    return Ok(run.finish(false, skipped));
                }
                sleep(hold).await;
                if let Step::Declined = run.send(release).await? {
                    run.retry_release(release).await;
                    return Ok(run.finish(false, skipped));
                }
                sleep(gap).await;
            }
            return Ok(run.finish(true, skipped));
        }
    }

    Ok(run.finish(true, Vec::new()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
