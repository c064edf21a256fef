//! Background feed polling.
//!
//! The poller runs as a tokio task.  It sits idle until it receives its
//! first [`PollCommand::Configure`], then fetches immediately and again on
//! every interval tick, filters the result and hands it to the UI thread as
//! a [`PollMsg`] over an unbounded channel.
//!
//! ## For contributors
//!
//! The fetch runs inline in the task's select loop, so at most one request is
//! ever outstanding.  Ticks that fall due while a fetch is in flight are
//! skipped ([`MissedTickBehavior::Skip`]), and on-demand refreshes go through
//! a small bounded command channel that drops requests when full.  Nothing is
//! ever queued without bound.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::filter::{filter, FilterConfig};
use crate::source::{FailureDetail, FeedItem, FeedSource};

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 8;

/// Messages sent from the poller to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PollMsg {
    /// A successful poll; the complete filtered feed, in feed order.
    NewFeed(Vec<FeedItem>),
    /// A failed poll.  The previous feed stays valid.
    ServiceFailure(FailureDetail),
    /// A one-line diagnostic for the status bar.
    Log(String),
}

/// Everything the poller needs once it is told to start.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub filter: FilterConfig,
}

/// Commands accepted by the poller task.
#[derive(Debug)]
pub enum PollCommand {
    /// Start polling.  Only the first one is honoured.
    Configure(PollSettings),
    /// Poll now instead of waiting for the next tick.
    RefreshNow,
    /// Stop the task.
    Shutdown,
}

/// Handle for talking to a running poller.
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollCommand>,
}

impl PollerHandle {
    /// Send the startup configuration.  Returns `false` if the poller is gone
    /// or its command queue is full.
    pub fn configure(&self, settings: PollSettings) -> bool {
        self.sender.try_send(PollCommand::Configure(settings)).is_ok()
    }

    /// Ask for an immediate poll.  Dropped if the queue is full.
    pub fn refresh_now(&self) {
        if let Err(e) = self.sender.try_send(PollCommand::RefreshNow) {
            debug!("refresh request dropped: {e}");
        }
    }

    /// Ask the poller to stop after the current fetch, if any.
    pub fn shutdown(&self) {
        let _ = self.sender.try_send(PollCommand::Shutdown);
    }
}

/// Spawn the poller task on the current tokio runtime.
///
/// Nothing is fetched until [`PollerHandle::configure`] is called.  The task
/// ends on [`PollerHandle::shutdown`], when every handle is dropped, or when
/// the receiving end of `tx` is gone.
pub fn spawn<S: FeedSource>(source: S, tx: mpsc::UnboundedSender<PollMsg>) -> PollerHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_CAPACITY);
    let poller = Poller {
        source,
        tx,
        receiver,
    };
    tokio::spawn(poller.run());
    PollerHandle { sender }
}

struct Poller<S> {
    source: S,
    tx: mpsc::UnboundedSender<PollMsg>,
    receiver: mpsc::Receiver<PollCommand>,
}

impl<S: FeedSource> Poller<S> {
    async fn run(mut self) {
        let Some(settings) = self.wait_for_configuration().await else {
            debug!("poller stopped before it was configured");
            return;
        };

        info!(
            source = self.source.name(),
            interval_ms = settings.interval.as_millis() as u64,
            areas = ?settings.filter.areas(),
            always_national = settings.filter.always_national(),
            exclusions = ?settings.filter.exclusions(),
            unrestricted = settings.filter.is_unrestricted(),
            "poller started"
        );

        // The first tick completes immediately, so the first poll happens at
        // startup rather than one interval later.
        let mut timer = time::interval(settings.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if !self.poll_once(&settings.filter).await {
                        break;
                    }
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(PollCommand::Configure(_)) => {
                        debug!("poller already configured; ignoring new configuration");
                    }
                    Some(PollCommand::RefreshNow) => {
                        if !self.poll_once(&settings.filter).await {
                            break;
                        }
                        timer.reset();
                    }
                    Some(PollCommand::Shutdown) | None => break,
                },
            }
        }

        info!("poller stopped");
    }

    async fn wait_for_configuration(&mut self) -> Option<PollSettings> {
        loop {
            match self.receiver.recv().await? {
                PollCommand::Configure(settings) => return Some(settings),
                PollCommand::RefreshNow => debug!("refresh before configuration ignored"),
                PollCommand::Shutdown => return None,
            }
        }
    }

    /// Fetch, filter and report one poll.  Returns `false` once nobody is
    /// listening any more.
    async fn poll_once(&self, cfg: &FilterConfig) -> bool {
        let name = self.source.name();
        info!(source = name, "polling feed");

        let messages = match self.source.fetch().await {
            Ok(items) => {
                let accepted = filter(&items, cfg);
                let summary = format!(
                    "Fetched {} messages, {} after filtering",
                    items.len(),
                    accepted.len()
                );
                info!(source = name, total = items.len(), accepted = accepted.len(), "feed updated");
                vec![PollMsg::NewFeed(accepted), PollMsg::Log(summary)]
            }
            Err(e) => {
                warn!(source = name, error = %e, "poll failed");
                vec![PollMsg::ServiceFailure(e.failure_detail())]
            }
        };

        for msg in messages {
            // If the receiver is gone the UI has exited; stop polling.
            if self.tx.send(msg).is_err() {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
