//! The answer stream: a bounded channel of [`ConstraintStore`]s plus a
//! shared "producer finished" flag, with a pull-based "take N" interface.
//! `Disj`/`Conde` branches and `Conj`'s per-answer continuations dispatch
//! their producers onto the process-wide `rayon` pool so they genuinely
//! run concurrently; a stream's consumer receives each store at-most-once.
use crate::context::Context;
use crate::store::ConstraintStore;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CAPACITY: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Producer-side handle: `put` pushes one answer, `close` marks the
/// stream finished. Dropping every sender without calling `close` still
/// disconnects the channel, but `close` additionally flips the flag a
/// `take` loop checks to decide whether "channel empty" means "done" or
/// "wait for more".
#[derive(Clone)]
pub struct StreamSender {
    sender: Sender<ConstraintStore>,
    finished: Arc<AtomicBool>,
}

impl StreamSender {
    pub fn put(&self, store: ConstraintStore) -> bool {
        self.sender.send(store).is_ok()
    }

    pub fn close(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Stream {
    receiver: Receiver<ConstraintStore>,
    finished: Arc<AtomicBool>,
}

/// A bounded channel pair: `capacity` buffered stores before a `put`
/// blocks the producer.
pub fn channel(capacity: usize) -> (StreamSender, Stream) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    let finished = Arc::new(AtomicBool::new(false));
    (
        StreamSender {
            sender,
            finished: Arc::clone(&finished),
        },
        Stream { receiver, finished },
    )
}

impl Stream {
    /// A stream that is already closed and empty: the degenerate case for
    /// `Failure` and other goals that never produce an answer.
    pub fn empty() -> Stream {
        let (sender, stream) = channel(1);
        sender.close();
        stream
    }

    /// A stream with exactly one answer, already closed.
    pub fn single(store: ConstraintStore) -> Stream {
        let (sender, stream) = channel(1);
        sender.put(store);
        sender.close();
        stream
    }

    /// Drains up to `n` stores, blocking (with short polling sleeps) until
    /// either `n` are collected or the stream is provably drained and
    /// closed. `has_more` is `false` only in the latter case.
    pub fn take(&self, n: usize) -> (Vec<ConstraintStore>, bool) {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.receiver.try_recv() {
                Ok(store) => out.push(store),
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {
                    if self.finished.load(Ordering::Acquire) {
                        break;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
        let drained = self.finished.load(Ordering::Acquire) && self.receiver.is_empty();
        (out, !drained)
    }

    /// As [`Stream::take`], but every blocking poll also checks `ctx` for
    /// cancellation. A cancelled context stops the drain early and is
    /// reported the same way as a provably-exhausted stream would be
    /// (`has_more = false`) -- the caller sees whatever was collected so
    /// far and no indication that more might still arrive.
    pub fn take_cancellable(&self, n: usize, ctx: &Context) -> (Vec<ConstraintStore>, bool) {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if ctx.is_cancelled() {
                return (out, false);
            }
            match self.receiver.try_recv() {
                Ok(store) => out.push(store),
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {
                    if self.finished.load(Ordering::Acquire) {
                        break;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
        let drained = self.finished.load(Ordering::Acquire) && self.receiver.is_empty();
        (out, !drained && !ctx.is_cancelled())
    }

    pub fn default_capacity() -> usize {
        DEFAULT_CAPACITY
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_stream_reports_no_more() {
        let stream = Stream::empty();
        let (stores, has_more) = stream.take(5);
        assert!(stores.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn single_stream_yields_exactly_one() {
        let stream = Stream::single(ConstraintStore::new());
        let (stores, has_more) = stream.take(5);
        assert_eq!(stores.len(), 1);
        assert!(!has_more);
    }

    #[test]
    fn take_reports_has_more_before_close() {
        let (sender, stream) = channel(4);
        sender.put(ConstraintStore::new());
        let (stores, has_more) = stream.take(1);
        assert_eq!(stores.len(), 1);
        assert!(has_more);
        sender.close();
        let (stores, has_more) = stream.take(1);
        assert!(stores.is_empty());
        assert!(!has_more);
    }
}
