//! Fixed-size pool of worker threads with a completion channel.
//!
//! Jobs go to the workers through a shared queue; every finished job comes
//! back on a completion channel tagged with the id it was submitted under.
//! Panics inside the handler are caught and returned as the job's result.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Job handler shared by all workers.
pub type Handler<J, R> = Arc<dyn Fn(J) -> R + Send + Sync>;

/// A finished job.
pub struct Completion<R> {
    /// Id passed to [`WorkerPool::submit`]
    pub id: usize,
    /// Handler result, or the panic payload
    pub result: Result<R, Box<dyn Any + Send>>,
}

/// Bounded pool of OS threads.
pub struct WorkerPool<J, R> {
    jobs: Option<Sender<(usize, J)>>,
    completions: Receiver<Completion<R>>,
    handles: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl<J: Send + 'static, R: Send + 'static> WorkerPool<J, R> {
    /// Spawn `workers` threads (at least one) named `<name>-<i>`.
    pub fn new(name: &str, workers: usize, handler: Handler<J, R>) -> io::Result<Self> {
        let (job_sender, job_receiver) = mpsc::channel::<(usize, J)>();
        let (done_sender, done_receiver) = mpsc::channel::<Completion<R>>();
        let job_receiver = Arc::new(Mutex::new(job_receiver));

        let mut handles = Vec::with_capacity(workers.max(1));
        for i in 0..workers.max(1) {
            let job_receiver = Arc::clone(&job_receiver);
            let done_sender = done_sender.clone();
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || Self::worker_loop(job_receiver, done_sender, handler))?;
            handles.push(handle);
        }

        Ok(Self {
            jobs: Some(job_sender),
            completions: done_receiver,
            handles,
            in_flight: 0,
        })
    }

    fn worker_loop(
        jobs: Arc<Mutex<Receiver<(usize, J)>>>,
        completions: Sender<Completion<R>>,
        handler: Handler<J, R>,
    ) {
        loop {
            let job = {
                let receiver = match jobs.lock() {
                    Ok(receiver) => receiver,
                    Err(_) => break,
                };
                receiver.recv()
            };

            let (id, job) = match job {
                Ok(job) => job,
                // Pool dropped
                Err(_) => break,
            };

            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(job)));
            if completions.send(Completion { id, result }).is_err() {
                break;
            }
        }
    }

    /// Queue a job. Returns `false` if the workers are gone.
    pub fn submit(&mut self, id: usize, job: J) -> bool {
        let sent = self
            .jobs
            .as_ref()
            .map(|jobs| jobs.send((id, job)).is_ok())
            .unwrap_or(false);
        if sent {
            self.in_flight += 1;
        }
        sent
    }

    /// Number of submitted jobs not yet received.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Wait up to `timeout` for the next completion.
    ///
    /// Returns `None` on timeout or when nothing is in flight.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Completion<R>> {
        if self.in_flight == 0 {
            return None;
        }
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight -= 1;
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take an already available completion without waiting.
    pub fn try_recv(&mut self) -> Option<Completion<R>> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completions.try_recv().ok()?;
        self.in_flight -= 1;
        Some(completion)
    }

    /// Block until the next completion.
    pub fn recv(&mut self) -> Option<Completion<R>> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completions.recv().ok()?;
        self.in_flight -= 1;
        Some(completion)
    }

}

impl<J, R> WorkerPool<J, R> {
    /// Close the job queue and wait for the workers to exit. Later
    /// submissions return `false`.
    pub fn close(&mut self) {
        // Closing the queue ends every worker loop
        self.jobs.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<J, R> Drop for WorkerPool<J, R> {
    fn drop(&mut self) {
        self.close();
    }
}
