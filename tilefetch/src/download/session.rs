//! Download session bookkeeping.
//!
//! Pure state, no I/O: the scheduler holds it behind a mutex and every queue
//! pop or counter update happens inside one critical section.

use std::collections::VecDeque;

use super::progress::DownloadSnapshot;

/// One pending fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedTile {
    pub url: String,
    pub region_id: String,
}

/// What an enqueue did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueued {
    /// Nothing to do: idle and still empty
    Ignored,
    /// A new session started with this many workers
    Started { workers: usize, total: u64 },
    /// Items were appended to the draining session
    Merged { added: u64, total: u64 },
}

/// What a worker got from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Popped {
    Item(QueuedTile),
    /// The queue was empty and the worker is done; `last` when the session
    /// went idle with it
    Finished { last: bool },
}

#[derive(Debug, Default)]
pub(crate) struct DownloadSession {
    queue: VecDeque<QueuedTile>,
    total: u64,
    processed: u64,
    succeeded: u64,
    workers: usize,
    finished: usize,
    draining: bool,
}

impl DownloadSession {
    /// Appends items, starting a session when idle.
    ///
    /// The caller spawns the returned number of workers.
    pub fn enqueue(&mut self, items: Vec<QueuedTile>, concurrency_limit: usize) -> Enqueued {
        let added = items.len() as u64;
        self.queue.extend(items);

        if self.draining {
            self.total += added;
            return Enqueued::Merged {
                added,
                total: self.total,
            };
        }
        if self.queue.is_empty() {
            return Enqueued::Ignored;
        }

        self.total = self.queue.len() as u64;
        self.processed = 0;
        self.succeeded = 0;
        self.finished = 0;
        self.workers = concurrency_limit.max(1).min(self.queue.len());
        self.draining = true;
        Enqueued::Started {
            workers: self.workers,
            total: self.total,
        }
    }

    /// Takes the head of the queue, or retires the calling worker when the
    /// queue is empty.
    ///
    /// Both happen under the same borrow, so an enqueue can never land
    /// between a worker seeing the empty queue and reporting in.
    pub fn pop_or_finish(&mut self) -> Popped {
        match self.pop() {
            Some(item) => Popped::Item(item),
            None => Popped::Finished {
                last: self.worker_finished(),
            },
        }
    }

    /// Takes the head of the queue, counting it as processed.
    fn pop(&mut self) -> Option<QueuedTile> {
        let item = self.queue.pop_front()?;
        self.processed += 1;
        Some(item)
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Records a worker that saw an empty queue.
    ///
    /// Returns true when it was the last one and the session is now idle.
    fn worker_finished(&mut self) -> bool {
        self.finished += 1;
        if self.draining && self.finished == self.workers {
            self.draining = false;
            return true;
        }
        false
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn snapshot(&self) -> DownloadSnapshot {
        DownloadSnapshot {
            total: self.total,
            processed: self.processed,
            succeeded: self.succeeded,
            queued: self.queue.len() as u64,
            workers: self.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize, region: &str) -> Vec<QueuedTile> {
        (0..n)
            .map(|i| QueuedTile {
                url: format!("https://tile.example/{i}"),
                region_id: region.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_workers_capped_by_queue_length() {
        let mut session = DownloadSession::default();
        assert_eq!(
            session.enqueue(items(5, "r"), 20),
            Enqueued::Started { workers: 5, total: 5 }
        );

        let mut session = DownloadSession::default();
        assert_eq!(
            session.enqueue(items(50, "r"), 20),
            Enqueued::Started { workers: 20, total: 50 }
        );
    }

    #[test]
    fn test_empty_enqueue_while_idle_is_ignored() {
        let mut session = DownloadSession::default();
        assert_eq!(session.enqueue(Vec::new(), 20), Enqueued::Ignored);
        assert!(!session.is_draining());
        assert_eq!(session.snapshot(), DownloadSnapshot::default());
    }

    #[test]
    fn test_merge_while_draining_grows_total() {
        let mut session = DownloadSession::default();
        session.enqueue(items(3, "a"), 2);
        session.pop();
        assert_eq!(
            session.enqueue(items(4, "b"), 2),
            Enqueued::Merged { added: 4, total: 7 }
        );
        let snapshot = session.snapshot();
        assert_eq!(snapshot.queued, 6);
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.workers, 2);
    }

    #[test]
    fn test_idle_only_after_every_worker_saw_empty_queue() {
        let mut session = DownloadSession::default();
        session.enqueue(items(3, "r"), 3);
        while session.pop().is_some() {}

        assert!(!session.worker_finished());
        assert!(!session.worker_finished());
        assert!(session.is_draining());
        assert!(session.worker_finished());
        assert!(!session.is_draining());
    }

    #[test]
    fn test_counters_survive_completion_and_reset_on_next_session() {
        let mut session = DownloadSession::default();
        session.enqueue(items(2, "r"), 1);
        while session.pop().is_some() {
            session.record_success();
        }
        session.worker_finished();

        let done = session.snapshot();
        assert_eq!((done.total, done.processed, done.succeeded), (2, 2, 2));

        session.enqueue(items(1, "s"), 1);
        let fresh = session.snapshot();
        assert_eq!((fresh.total, fresh.processed, fresh.succeeded), (1, 0, 0));
    }

    #[test]
    fn test_items_keep_their_region() {
        let mut session = DownloadSession::default();
        session.enqueue(items(1, "first"), 4);
        session.enqueue(items(1, "second"), 4);
        assert_eq!(session.pop().unwrap().region_id, "first");
        assert_eq!(session.pop().unwrap().region_id, "second");
        assert_eq!(session.pop(), None);
    }

    #[test]
    fn test_last_worker_finishing_goes_idle() {
        let mut session = DownloadSession::default();
        session.enqueue(items(1, "r"), 1);

        assert!(matches!(session.pop_or_finish(), Popped::Item(_)));
        assert_eq!(session.pop_or_finish(), Popped::Finished { last: true });
        assert!(!session.is_draining());
    }

    #[test]
    fn test_enqueue_after_empty_pop_is_not_stranded() {
        let mut session = DownloadSession::default();
        session.enqueue(items(1, "a"), 1);
        assert!(matches!(session.pop_or_finish(), Popped::Item(_)));
        assert_eq!(session.pop_or_finish(), Popped::Finished { last: true });

        // The only worker already retired, so the next batch starts afresh
        assert_eq!(
            session.enqueue(items(1, "b"), 1),
            Enqueued::Started { workers: 1, total: 1 }
        );
        assert!(session.is_draining());
    }

    #[test]
    fn test_merge_before_empty_pop_is_drained_by_live_worker() {
        let mut session = DownloadSession::default();
        session.enqueue(items(1, "a"), 1);
        assert!(matches!(session.pop_or_finish(), Popped::Item(_)));

        assert_eq!(
            session.enqueue(items(1, "b"), 1),
            Enqueued::Merged { added: 1, total: 2 }
        );
        match session.pop_or_finish() {
            Popped::Item(item) => assert_eq!(item.region_id, "b"),
            other => panic!("expected the merged item, got {other:?}"),
        }
        assert_eq!(session.pop_or_finish(), Popped::Finished { last: true });
        assert_eq!(session.snapshot().queued, 0);
        assert_eq!(session.snapshot().processed, 2);
    }
}
