use std::time::Duration;

use itemcache::{
    CancelToken, FetchError, FetchOutcome, FetchRequest, FetchTicket, IndexRange, VirtualizedFeed,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::Fetcher;

/// Commands accepted by [`FeedController::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedCommand {
    RangesChanged {
        visible: IndexRange,
        tracked: Vec<IndexRange>,
    },
    RefreshCount,
    Reload,
}

struct InFlight<T> {
    ticket: FetchTicket,
    cancel: CancelToken,
    handle: JoinHandle<FetchOutcome<T>>,
}

/// A tokio-driven owner for a [`VirtualizedFeed`].
///
/// The feed itself is sans-IO; this type supplies the two things it leaves to the host:
/// - a clock, measured in milliseconds since the controller was created, with the cache's
///   debounce deadline mapped onto `tokio::time::sleep_until`
/// - fetching, with each request run as a spawned task that is aborted once superseded
///
/// The controller is the single owner of the feed. Drive it either by awaiting
/// [`FeedController::step`] / [`FeedController::run_until_idle`] after each range change, or by
/// handing it to [`FeedController::run`] together with a command channel.
pub struct FeedController<T, F> {
    feed: VirtualizedFeed<T>,
    fetcher: F,
    epoch: Instant,
    in_flight: Option<InFlight<T>>,
}

impl<T, F> FeedController<T, F>
where
    T: Clone + PartialEq + Send + 'static,
    F: Fetcher<T>,
{
    pub fn new(feed: VirtualizedFeed<T>, fetcher: F) -> Self {
        Self {
            feed,
            fetcher,
            epoch: Instant::now(),
            in_flight: None,
        }
    }

    pub fn feed(&self) -> &VirtualizedFeed<T> {
        &self.feed
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Milliseconds elapsed since the controller was created; the clock handed to the cache.
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn count(&self) -> usize {
        self.feed.count()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.feed.get(index)
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.feed.index_of(value)
    }

    /// Whether there is neither a pending fetch decision nor a running fetch task.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.feed.cache().is_idle()
    }

    pub fn on_ranges_changed(&mut self, visible: IndexRange, tracked: &[IndexRange]) -> bool {
        let now_ms = self.now_ms();
        let changed = self.feed.on_ranges_changed(visible, tracked, now_ms);
        self.sync_in_flight();
        changed
    }

    pub fn refresh_count(&mut self) -> usize {
        let now_ms = self.now_ms();
        let count = self.feed.refresh_count(now_ms);
        self.sync_in_flight();
        count
    }

    pub fn reload(&mut self) {
        let now_ms = self.now_ms();
        self.feed.reload(now_ms);
        self.sync_in_flight();
    }

    pub fn apply_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::RangesChanged { visible, tracked } => {
                self.on_ranges_changed(visible, &tracked);
            }
            FeedCommand::RefreshCount => {
                self.refresh_count();
            }
            FeedCommand::Reload => self.reload(),
        }
    }

    /// Waits for the next thing the feed is waiting on and applies it.
    ///
    /// That is either the running fetch task finishing or the debounce/retry deadline passing.
    /// Returns `Ok(false)` when there is nothing to wait for. A failed fetch is returned as
    /// `Err` after the cache has scheduled its retry, so stepping can simply continue.
    ///
    /// Cancel-safe: dropping the returned future before it completes loses no state.
    pub async fn step(&mut self) -> Result<bool, FetchError> {
        self.sync_in_flight();

        if let Some(in_flight) = &mut self.in_flight {
            let joined = (&mut in_flight.handle).await;
            let ticket = in_flight.ticket;
            self.in_flight = None;

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => FetchOutcome::Cancelled,
                Err(err) => FetchOutcome::failed(err),
            };
            let now_ms = self.now_ms();
            if let Some(request) = self.feed.complete_fetch(ticket, outcome, now_ms)? {
                self.launch(request);
            }
            return Ok(true);
        }

        let Some(deadline_ms) = self.feed.cache().deadline_ms() else {
            return Ok(false);
        };
        tokio::time::sleep_until(self.epoch + Duration::from_millis(deadline_ms)).await;
        let now_ms = self.now_ms();
        if let Some(request) = self.feed.poll_fetch(now_ms) {
            self.launch(request);
        }
        Ok(true)
    }

    /// Steps until the feed is idle.
    ///
    /// Failures are retried per the cache options. Returns the last error if the cache gave up
    /// with items still missing.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run_until_idle(&mut self) -> Result<(), FetchError> {
        loop {
            match self.step().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    awarn!(error = %err, "fetch step failed");
                }
            }
        }
        let cache = self.feed.cache();
        match cache.last_error() {
            Some(err) if !cache.missing_ranges().is_empty() => Err(err.clone()),
            _ => Ok(()),
        }
    }

    /// Owner loop: applies commands as they arrive and advances fetching in between.
    ///
    /// Returns once `commands` is closed and outstanding work has settled.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<FeedCommand>,
    ) -> Result<(), FetchError> {
        loop {
            let busy = !self.is_idle();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        atrace!(?command, "FeedController::run: command");
                        self.apply_command(command);
                    }
                    None => break,
                },
                result = self.step(), if busy => {
                    if let Err(err) = result {
                        awarn!(error = %err, "fetch step failed");
                    }
                }
            }
        }
        self.run_until_idle().await
    }

    fn launch(&mut self, request: FetchRequest) {
        atrace!(range = %request.range, ticket = request.ticket.get(), "spawning fetch");
        let future = self.fetcher.fetch(request.range, request.cancel.clone());
        self.in_flight = Some(InFlight {
            ticket: request.ticket,
            cancel: request.cancel,
            handle: tokio::spawn(future),
        });
    }

    // Aborts the running task once the cache no longer considers its ticket current.
    fn sync_in_flight(&mut self) {
        let current = self.feed.cache().in_flight().map(|r| r.ticket);
        if let Some(in_flight) = &self.in_flight {
            if current != Some(in_flight.ticket) {
                atrace!(ticket = in_flight.ticket.get(), "aborting superseded fetch task");
                in_flight.cancel.cancel();
                in_flight.handle.abort();
                self.in_flight = None;
            }
        }
    }
}

impl<T, F> Drop for FeedController<T, F> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
            in_flight.handle.abort();
        }
    }
}

impl<T, F> core::fmt::Debug for FeedController<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedController")
            .field("feed", &self.feed)
            .field("in_flight", &self.in_flight.as_ref().map(|i| i.ticket))
            .finish_non_exhaustive()
    }
}
