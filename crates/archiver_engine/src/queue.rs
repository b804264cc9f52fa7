use std::any::Any;
use std::io;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use archiver_logging::{archive_debug, archive_error, archive_warn};

use crate::JobError;

/// Intake slots per worker when no explicit capacity is given.
pub const SLOTS_PER_WORKER: usize = 4;

/// A unit of work for the [`JobQueue`].
pub trait Job: Send + 'static {
    /// Label used in log lines.
    fn name(&self) -> String;

    fn run(self: Box<Self>) -> Result<(), JobError>;
}

impl<F> Job for F
where
    F: FnOnce() -> Result<(), JobError> + Send + 'static,
{
    fn name(&self) -> String {
        "job".to_string()
    }

    fn run(self: Box<Self>) -> Result<(), JobError> {
        (*self)()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue already started")]
    AlreadyStarted,
    #[error("queue not started")]
    NotStarted,
    #[error("queue stopped")]
    Stopped,
    #[error("spawning worker failed: {0}")]
    Spawn(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn summary(&self) -> QueueSummary {
        QueueSummary {
            submitted: self.submitted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

type Intake = Arc<Mutex<Receiver<Box<dyn Job>>>>;

enum State {
    Idle,
    Running {
        intake: SyncSender<Box<dyn Job>>,
        workers: Vec<JoinHandle<()>>,
    },
    Stopped,
}

/// Fixed pool of worker threads fed through one bounded intake.
///
/// Nothing runs before [`start`](JobQueue::start). [`stop`](JobQueue::stop)
/// drains every accepted job before it returns, and dropping the queue stops it.
pub struct JobQueue {
    worker_count: usize,
    capacity: usize,
    state: State,
    counters: Arc<Counters>,
}

impl JobQueue {
    /// `worker_count == 0` picks the machine's available parallelism.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = if worker_count == 0 {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            worker_count
        };
        Self {
            worker_count,
            capacity: worker_count * SLOTS_PER_WORKER,
            state: State::Idle,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Overrides the intake size; `submit` blocks while this many jobs are waiting.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn start(&mut self) -> Result<(), QueueError> {
        match self.state {
            State::Idle => {}
            State::Running { .. } => return Err(QueueError::AlreadyStarted),
            State::Stopped => return Err(QueueError::Stopped),
        }

        let (tx, rx) = mpsc::sync_channel::<Box<dyn Job>>(self.capacity);
        let intake: Intake = Arc::new(Mutex::new(rx));
        let mut workers = Vec::with_capacity(self.worker_count);
        for index in 0..self.worker_count {
            let intake = Arc::clone(&intake);
            let counters = Arc::clone(&self.counters);
            let spawned = thread::Builder::new()
                .name(format!("archive-worker-{index}"))
                .spawn(move || worker_loop(index, intake, counters));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    drop(tx);
                    join_workers(workers);
                    return Err(QueueError::Spawn(err));
                }
            }
        }

        archive_debug!(
            "job queue started with {} workers, {} intake slots",
            self.worker_count,
            self.capacity
        );
        self.state = State::Running {
            intake: tx,
            workers,
        };
        Ok(())
    }

    /// Blocks while the intake is full. A job that cannot be accepted is
    /// reported through the error, never dropped silently.
    pub fn submit(&self, job: impl Job) -> Result<(), QueueError> {
        let intake = match &self.state {
            State::Idle => return Err(QueueError::NotStarted),
            State::Stopped => return Err(QueueError::Stopped),
            State::Running { intake, .. } => intake,
        };
        intake
            .send(Box::new(job))
            .map_err(|_| QueueError::Stopped)?;
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Closes the intake, waits for every accepted job, and joins the workers.
    pub fn stop(&mut self) -> QueueSummary {
        if let State::Running { intake, workers } =
            std::mem::replace(&mut self.state, State::Stopped)
        {
            drop(intake);
            join_workers(workers);
            let summary = self.counters.summary();
            archive_debug!(
                "job queue stopped: {} submitted, {} succeeded, {} failed",
                summary.submitted,
                summary.succeeded,
                summary.failed
            );
        }
        self.counters.summary()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(index: usize, intake: Intake, counters: Arc<Counters>) {
    loop {
        // The receiver carries no invariant a panicking holder could break.
        let next = intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        let Ok(job) = next else {
            break;
        };

        let name = job.name();
        match catch_unwind(AssertUnwindSafe(|| job.run())) {
            Ok(Ok(())) => {
                counters.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Err(err)) => {
                archive_warn!("worker {index}: job {name} failed: {err}");
                counters.failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(payload) => {
                let err = JobError::Panicked(panic_message(payload.as_ref()));
                archive_error!("worker {index}: job {name} {err}");
                counters.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
    archive_debug!("worker {index} exiting");
}

fn join_workers(workers: Vec<JoinHandle<()>>) {
    for (index, handle) in workers.into_iter().enumerate() {
        if handle.join().is_err() {
            archive_error!("worker {index} join failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
