use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::error::PipelineError;
use crate::ml::ModelFamily;

use super::{Pipeline, PipelineOutcome, UploadForm};

type JobResult = Result<PipelineOutcome, PipelineError>;

struct Job {
    form: UploadForm,
    family: ModelFamily,
    reply: Sender<JobResult>,
}

/// Fixed pool of named threads running whole requests off the caller's thread.
pub struct PipelineWorkers {
    sender: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

/// Handle to a submitted request.
pub struct PendingClassification {
    reply: Receiver<JobResult>,
}

impl PendingClassification {
    /// Block until the request finishes.
    pub fn wait(self) -> JobResult {
        self.reply
            .recv()
            .map_err(|_| PipelineError::WorkerUnavailable)?
    }
}

impl PipelineWorkers {
    /// Spawn `count` workers (at least one) sharing one job queue.
    pub fn new(pipeline: Pipeline, count: usize) -> Result<Self, PipelineError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let pipeline = Arc::new(pipeline);
        let mut handles = Vec::with_capacity(count.max(1));
        for index in 0..count.max(1) {
            let receiver = Arc::clone(&receiver);
            let pipeline = Arc::clone(&pipeline);
            let handle = thread::Builder::new()
                .name(format!("cryscope-worker-{index}"))
                .spawn(move || worker_loop(&pipeline, &receiver))
                .map_err(|err| {
                    error!("Pipeline worker {index} failed to start: {err}");
                    PipelineError::WorkerUnavailable
                })?;
            handles.push(handle);
        }
        debug!(workers = handles.len(), "Pipeline workers started");
        Ok(Self {
            sender: Some(sender),
            handles,
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Queue a request; the returned handle yields its result.
    pub fn submit(&self, form: UploadForm, family: ModelFamily) -> PendingClassification {
        let (reply, receiver) = mpsc::channel();
        let job = Job {
            form,
            family,
            reply,
        };
        match &self.sender {
            Some(sender) => {
                if let Err(mpsc::SendError(job)) = sender.send(job) {
                    let _ = job.reply.send(Err(PipelineError::WorkerUnavailable));
                }
            }
            None => {
                let _ = job.reply.send(Err(PipelineError::WorkerUnavailable));
            }
        }
        PendingClassification { reply: receiver }
    }
}

impl Drop for PipelineWorkers {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Pipeline worker exited with a panic");
            }
        }
    }
}

fn worker_loop(pipeline: &Pipeline, receiver: &Mutex<Receiver<Job>>) {
    loop {
        let job = {
            let Ok(guard) = receiver.lock() else {
                return;
            };
            match guard.recv() {
                Ok(job) => job,
                Err(_) => return,
            }
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pipeline.classify(&job.form, job.family)
        }));
        let result = match result {
            Ok(result) => result,
            Err(_) => {
                error!(family = %job.family, "Pipeline job panicked");
                Err(PipelineError::WorkerUnavailable)
            }
        };
        if job.reply.send(result).is_err() {
            debug!("Caller dropped a pending classification");
        }
    }
}
