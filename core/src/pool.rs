use parking_lot::{Condvar, Mutex};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of OS threads draining a shared job channel. Dropping
/// the pool closes the channel and joins every worker.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|_| {
                let receiver: Arc<Mutex<Receiver<Job>>> = Arc::clone(&receiver);
                thread::spawn(move || loop {
                    // The guard is held across recv, serializing dequeues.
                    let job = receiver.lock().recv();
                    match job {
                        Ok(job) => job(),
                        Err(_) => break,
                    }
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(job));
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Count of in-flight tasks. Work registers itself before being submitted
/// and deregisters when its [`TaskGuard`] drops, so one caller can block
/// until the count returns to zero even when the task total is not known
/// upfront.
pub struct PendingTasks {
    outstanding: Mutex<usize>,
    all_done: Condvar,
}

/// Deregisters its task on drop, including on unwind.
pub struct TaskGuard {
    tasks: Arc<PendingTasks>,
}

impl PendingTasks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outstanding: Mutex::new(0),
            all_done: Condvar::new(),
        })
    }

    /// Register one task. Call on the dispatching thread before handing
    /// the returned guard to the task itself.
    pub fn register(self: &Arc<Self>) -> TaskGuard {
        *self.outstanding.lock() += 1;
        TaskGuard {
            tasks: Arc::clone(self),
        }
    }

    /// Block until every registered task has deregistered.
    pub fn wait(&self) {
        let mut outstanding = self.outstanding.lock();
        while *outstanding > 0 {
            self.all_done.wait(&mut outstanding);
        }
    }

    fn finish(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.all_done.notify_all();
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tasks.finish();
    }
}
