//! Single-worker FIFO task queue.
//!
//! Tasks run one at a time, end to end, in submission order. A task that
//! awaits a user prompt holds the queue until the prompt resolves.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};

use crate::error::{WebTrayError, WebTrayResult};

type Job = BoxFuture<'static, ()>;

pub struct TaskQueue {
    name: &'static str,
    tx: mpsc::UnboundedSender<Job>,
}

impl TaskQueue {
    pub fn new(name: &'static str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tauri::async_runtime::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            log::debug!("[QUEUE] {} worker stopped", name);
        });
        Self { name, tx }
    }

    /// Enqueue `task` and wait for its result.
    pub async fn run<F, T>(&self, task: F) -> WebTrayResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job = async move {
            let _ = done_tx.send(task.await);
        }
        .boxed();
        self.tx
            .send(job)
            .map_err(|_| WebTrayError::Other(format!("{} queue is closed", self.name)))?;
        done_rx
            .await
            .map_err(|_| WebTrayError::Other(format!("{} task was dropped", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_tasks_run_in_order_one_at_a_time() {
        let queue = Arc::new(TaskQueue::new("test"));
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (i, delay) in [(0, 40u64), (1, 0), (2, 10)] {
            let queue = queue.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .run(async move {
                        log.lock().push(format!("start {}", i));
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        log.lock().push(format!("end {}", i));
                        i
                    })
                    .await
            }));
            // Fix submission order.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(results, vec![0, 1, 2]);
        assert_eq!(
            *log.lock(),
            vec!["start 0", "end 0", "start 1", "end 1", "start 2", "end 2"]
        );
    }
}
