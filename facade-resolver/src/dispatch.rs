//! Fire-and-forget background dispatch.
//!
//! `process` queues an image id and returns at once. A fixed pool of named
//! worker threads drains the queue, running one workflow per image. There
//! is no result channel; outcomes are only logged.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::Result;
use crate::workflow::LabelResolutionWorkflow;

/// Background queue of image ids.
pub struct Dispatcher {
    sender: Option<Sender<String>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn `worker_count` workers (at least one).
    pub fn start(workflow: Arc<LabelResolutionWorkflow>, worker_count: usize) -> Result<Self> {
        let (sender, receiver) = unbounded::<String>();
        let mut workers = Vec::with_capacity(worker_count.max(1));

        for n in 0..worker_count.max(1) {
            let receiver = receiver.clone();
            let workflow = Arc::clone(&workflow);
            let handle = thread::Builder::new()
                .name(format!("resolver-{n}"))
                .spawn(move || worker_loop(&workflow, &receiver))?;
            workers.push(handle);
        }
        log::info!("Started {} resolver workers", workers.len());

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue an image for processing. Returns false (and logs) when the id
    /// is blank or the queue is closed.
    pub fn process(&self, image_id: &str) -> bool {
        let image_id = image_id.trim();
        if image_id.is_empty() {
            log::warn!("Rejected empty image_id");
            return false;
        }
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.send(image_id.to_string()) {
            Ok(()) => {
                log::info!("Queued image {image_id}");
                true
            }
            Err(_) => {
                log::error!("Dispatch queue closed, dropping image {image_id}");
                false
            }
        }
    }

    /// Stop accepting work, let the workers drain the queue, and join them.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::error!("Worker {name} panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(workflow: &LabelResolutionWorkflow, receiver: &Receiver<String>) {
    for image_id in receiver.iter() {
        let summary = workflow.run(&image_id);
        log::debug!("Finished {} in state {}", summary.image_id, summary.state);
    }
}
