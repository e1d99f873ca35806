use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};
use web_time::Instant;

use crate::ai::{MoveSelector, RandomMoveSelector};
use crate::board::Board;
use crate::types::{Coordinate, Side};

pub const DEFAULT_THINK_DELAY: Duration = Duration::from_secs(2);
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one thinking task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Coordinate(Coordinate),
    /// Nothing was placeable.
    Pass,
    /// The task was cancelled; any chosen coordinate is discarded.
    Cancelled,
}

/// Runs a [`MoveSelector`] on a background thread after a thinking delay.
#[derive(Clone)]
pub struct ComputerPlayer {
    selector: Arc<dyn MoveSelector>,
    think_delay: Duration,
}

impl ComputerPlayer {
    pub fn new(selector: Arc<dyn MoveSelector>, think_delay: Duration) -> Self {
        Self {
            selector,
            think_delay,
        }
    }

    pub fn with_random_selector(think_delay: Duration) -> Self {
        Self::new(Arc::new(RandomMoveSelector), think_delay)
    }

    pub fn think_delay(&self) -> Duration {
        self.think_delay
    }

    /// Starts choosing a move for `side`. The returned task owns the
    /// cancellation flag; dropping it cancels the selection.
    pub fn start(&self, board: Board, side: Side) -> ThinkTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();
        let selector = Arc::clone(&self.selector);
        let delay = self.think_delay;
        let flag = Arc::clone(&cancelled);
        let started = Instant::now();
        let deadline = started + delay;

        debug!(%side, ?delay, "computer started thinking");
        thread::spawn(move || {
            let choice = selector.select_move(&board, side);
            sleep_unless_cancelled(deadline, &flag);

            // Checked after the delay so a late cancel still wins.
            let result = if flag.load(Ordering::Acquire) {
                OperationResult::Cancelled
            } else {
                match choice {
                    Some(coordinate) => OperationResult::Coordinate(coordinate),
                    None => OperationResult::Pass,
                }
            };
            trace!(%side, ?result, "computer finished thinking");
            let _ = sender.send(result);
        });

        ThinkTask {
            side,
            cancelled,
            receiver,
            started,
        }
    }
}

impl Default for ComputerPlayer {
    fn default() -> Self {
        Self::with_random_selector(DEFAULT_THINK_DELAY)
    }
}

fn sleep_unless_cancelled(deadline: Instant, cancelled: &AtomicBool) {
    loop {
        if cancelled.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
    }
}

/// Handle to a move selection running in the background.
///
/// A task yields its result once. After [`ThinkTask::cancel`] every
/// observation reports [`OperationResult::Cancelled`].
#[derive(Debug)]
pub struct ThinkTask {
    side: Side,
    cancelled: Arc<AtomicBool>,
    receiver: Receiver<OperationResult>,
    started: Instant,
}

impl ThinkTask {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Non-blocking; `None` while the task is still thinking.
    pub fn try_result(&self) -> Option<OperationResult> {
        if self.is_cancelled() {
            return Some(OperationResult::Cancelled);
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(self.screen(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(OperationResult::Cancelled),
        }
    }

    /// Blocks until the task finishes or is cancelled.
    pub fn wait(&self) -> OperationResult {
        if self.is_cancelled() {
            return OperationResult::Cancelled;
        }
        match self.receiver.recv() {
            Ok(result) => self.screen(result),
            Err(_) => OperationResult::Cancelled,
        }
    }

    /// Like [`ThinkTask::wait`] but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<OperationResult> {
        if self.is_cancelled() {
            return Some(OperationResult::Cancelled);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(self.screen(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(OperationResult::Cancelled),
        }
    }

    fn screen(&self, result: OperationResult) -> OperationResult {
        if self.is_cancelled() {
            OperationResult::Cancelled
        } else {
            result
        }
    }
}

impl Drop for ThinkTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
