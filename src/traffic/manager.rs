//! Concurrent session scheduling
//!
//! A fixed pool of workers drains the shared URL queue. Each worker acquires
//! an isolated session per URL, runs the simulator, appends the record, and
//! always releases the session before the next dequeue. One worker's per-URL
//! failure never stops the other workers or the run.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info};

use crate::browser::SessionProvider;
use crate::stats::RunStats;
use crate::storage::{DatasetWriter, UrlQueue};
use crate::traffic::Simulator;

pub struct SessionManager<P, A> {
    provider: Arc<P>,
    simulator: Arc<A>,
    queue: Arc<UrlQueue>,
    writer: Arc<DatasetWriter>,
    stats: Arc<RunStats>,
    max_interactions: u32,
    concurrency: usize,
    delay_between_sessions: Duration,
}

impl<P, A> SessionManager<P, A>
where
    P: SessionProvider + 'static,
    A: Simulator<P::Session> + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<P>,
        simulator: Arc<A>,
        queue: Arc<UrlQueue>,
        writer: Arc<DatasetWriter>,
        stats: Arc<RunStats>,
        max_interactions: u32,
        concurrency: usize,
        delay_between_sessions: Duration,
    ) -> Self {
        Self {
            provider,
            simulator,
            queue,
            writer,
            stats,
            max_interactions,
            concurrency: concurrency.max(1),
            delay_between_sessions,
        }
    }

    /// Spawn the worker pool and block until every worker has drained out.
    pub async fn run(&self) {
        info!(
            "Starting session manager with concurrency={}",
            self.concurrency
        );

        let mut workers = Vec::with_capacity(self.concurrency);
        for worker_id in 0..self.concurrency {
            let provider = self.provider.clone();
            let simulator = self.simulator.clone();
            let queue = self.queue.clone();
            let writer = self.writer.clone();
            let stats = self.stats.clone();
            let max_interactions = self.max_interactions;
            let delay = self.delay_between_sessions;

            workers.push(tokio::spawn(worker_loop(
                worker_id,
                provider,
                simulator,
                queue,
                writer,
                stats,
                max_interactions,
                delay,
            )));
        }

        for result in join_all(workers).await {
            if let Err(e) = result {
                error!("Worker task panicked: {}", e);
            }
        }

        info!("All workers completed");
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop<P, A>(
    worker_id: usize,
    provider: Arc<P>,
    simulator: Arc<A>,
    queue: Arc<UrlQueue>,
    writer: Arc<DatasetWriter>,
    stats: Arc<RunStats>,
    max_interactions: u32,
    delay_between_sessions: Duration,
) where
    P: SessionProvider,
    A: Simulator<P::Session>,
{
    info!("Worker {} started", worker_id);

    while let Some(url) = queue.try_dequeue() {
        match provider.new_session().await {
            Ok(mut session) => {
                info!("Worker {} visiting: {}", worker_id, url);
                let record = simulator
                    .simulate(&mut session, &url, max_interactions)
                    .await;
                info!(
                    "Worker {} completed: {} | status={} | time={}s",
                    worker_id, url, record.status_code, record.response_time
                );
                stats.record_visit(&record);
                writer.add_record(record);
                provider.close_session(session).await;
            }
            Err(e) => {
                // Known asymmetry: the URL is dropped without a record
                error!(
                    "Worker {} failed to acquire a session for {}: {}",
                    worker_id, url, e
                );
                stats.record_dropped();
            }
        }

        if !delay_between_sessions.is_zero() {
            tokio::time::sleep(delay_between_sessions).await;
        }
    }

    info!("Worker {} exiting (queue empty)", worker_id);
}
