//! Render service - cache ownership, in-flight tracking, prefetch and delivery.

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, trace, warn};

use crate::config::{RenderConfig, format_byte_size};
use crate::document::PageProvider;

use super::cache::BoundedCache;
use super::codec;
use super::inflight::{BeginOutcome, InFlightRegistry, JobKind};
use super::prefetch::{self, PrefetchStrategy};
use super::request::{JobOutcome, RenderJob, ViewRequest};
use super::types::{CompressedRender, RawBitmap, RenderKey, Size};
use super::worker::render_worker;

/// A finished render, broadcast to every subscriber.
///
/// Delivery is broadcast-and-filter: all subscribers receive all results
/// and keep a bitmap only when `key` matches the render they last asked
/// for.
#[derive(Clone, Debug)]
pub struct NewRender {
    pub key: RenderKey,
    pub bitmap: Arc<RawBitmap>,
}

/// Serves render requests from a compressed cache, deduplicates in-flight
/// work, schedules prefetch and broadcasts completions.
///
/// The service owns the cache and the registry exclusively; both are only
/// touched from `&mut self` methods, so all mutation is serialized on the
/// owning thread. Worker threads hand results back through a channel,
/// applied in [`RenderService::poll_completions`].
pub struct RenderService {
    provider: Arc<dyn PageProvider>,
    cache: BoundedCache,
    in_flight: InFlightRegistry,
    strategy: Box<dyn PrefetchStrategy>,
    job_tx: Sender<RenderJob>,
    completion_rx: Receiver<JobOutcome>,
    subscribers: Vec<Sender<NewRender>>,
    min_render_dimension: u32,
    workers: usize,
    render_failures: u64,
}

impl RenderService {
    /// Spawn the worker pool and build the service.
    #[must_use]
    pub fn new(provider: Arc<dyn PageProvider>, config: &RenderConfig) -> Self {
        let (job_tx, job_rx) = flume::unbounded();
        let (completion_tx, completion_rx) = flume::unbounded();

        // Workers pull from one shared MPMC queue; flume receivers clone.
        let workers = config.render_workers.max(1);
        for _ in 0..workers {
            let provider = Arc::clone(&provider);
            let jobs = job_rx.clone();
            let results = completion_tx.clone();
            std::thread::spawn(move || render_worker(provider, jobs, results));
        }

        let strategy = prefetch::strategy_by_name(&config.prefetch_strategy).unwrap_or_else(|| {
            warn!(
                "unknown prefetch strategy {:?}, using the default",
                config.prefetch_strategy
            );
            prefetch::default_strategy()
        });

        Self {
            provider,
            cache: BoundedCache::new(config.max_cache_bytes),
            in_flight: InFlightRegistry::new(),
            strategy,
            job_tx,
            completion_rx,
            subscribers: Vec::new(),
            min_render_dimension: config.min_render_dimension,
            workers,
            render_failures: 0,
        }
    }

    /// Subscribe to the `new_render` event stream.
    pub fn subscribe(&mut self) -> Receiver<NewRender> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Serve a view's request: from cache when possible, otherwise by
    /// scheduling a render, then warm the prefetch window.
    ///
    /// Never blocks on rendering; either publishes synchronously from the
    /// cache or returns right after scheduling asynchronous work.
    pub fn request_render(&mut self, request: ViewRequest) {
        let Some(page) = self.provider.resolve(request.current_page, request.role) else {
            // Nothing is shown in this role here (e.g. no next transition).
            return;
        };
        let size = self.provider.preferred_size(page, request.target_box);
        if !self.worth_rendering(size) {
            debug!("ignoring {:?} request at {size}", request.role);
            return;
        }
        let key = RenderKey { page, size };
        debug!(
            "request {key:?} role {:?} cause {:?}",
            request.role, request.cause
        );

        if let Some(compressed) = self.cache.get(&key) {
            match codec::decode(&compressed) {
                Ok(bitmap) => {
                    trace!("-> cached {key:?}");
                    self.publish(key, bitmap);
                }
                Err(fault) => {
                    // Entry is unusable: drop it and render again.
                    warn!("cached render {key:?} failed to decode: {fault}");
                    self.cache.remove(&key);
                    self.schedule(key, JobKind::Requested);
                }
            }
        } else {
            self.schedule(key, JobKind::Requested);
        }

        self.schedule_prefetch(&request, key);
    }

    /// Apply completed worker jobs; returns how many were applied.
    ///
    /// Call from the owning event loop; never blocks.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.completion_rx.try_recv() {
            match outcome {
                JobOutcome::Rendered {
                    key,
                    compressed,
                    bitmap,
                } => self.finish_render(key, compressed, bitmap),

                JobOutcome::Failed { key, fault } => {
                    self.render_failures += 1;
                    warn!("render of {key:?} failed: {fault}");
                    if self.in_flight.finish(key).is_none() {
                        warn!("failure reported for untracked render {key:?}");
                    }
                }
            }
            applied += 1;
        }
        applied
    }

    fn finish_render(&mut self, key: RenderKey, compressed: CompressedRender, bitmap: RawBitmap) {
        // An oversized render is rejected by the cache but still delivered.
        self.cache.insert(key, compressed);
        match self.in_flight.finish(key) {
            Some(JobKind::Requested) => self.publish(key, bitmap),
            Some(JobKind::Prefetch) => trace!("prefetched {key:?}"),
            None => warn!("completion for untracked render {key:?}"),
        }
    }

    fn schedule(&mut self, key: RenderKey, kind: JobKind) -> bool {
        match self.in_flight.try_begin(key, kind) {
            BeginOutcome::Started => {
                let _ = self.job_tx.send(RenderJob::Render { key });
                true
            }
            BeginOutcome::AlreadyRunning { promoted } => {
                if promoted {
                    trace!("promoted in-flight prefetch {key:?}");
                }
                false
            }
        }
    }

    fn schedule_prefetch(&mut self, request: &ViewRequest, primary: RenderKey) {
        for key in self.strategy.plan(request, self.provider.as_ref()) {
            if key == primary || !self.worth_rendering(key.size) || self.cache.contains(&key) {
                continue;
            }
            if self.schedule(key, JobKind::Prefetch) {
                trace!("-> prefetch {key:?}");
            }
        }
    }

    fn publish(&mut self, key: RenderKey, bitmap: RawBitmap) {
        let bitmap = Arc::new(bitmap);
        self.subscribers.retain(|subscriber| {
            subscriber
                .send(NewRender {
                    key,
                    bitmap: Arc::clone(&bitmap),
                })
                .is_ok()
        });
    }

    fn worth_rendering(&self, size: Size) -> bool {
        size.width >= self.min_render_dimension && size.height >= self.min_render_dimension
    }

    /// Renders currently being computed or queued.
    #[must_use]
    pub fn pending_renders(&self) -> usize {
        self.in_flight.len()
    }

    /// Recovered rasterization failures since construction.
    #[must_use]
    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    /// Bytes of compressed renders currently cached.
    #[must_use]
    pub fn cache_total_cost(&self) -> usize {
        self.cache.total_cost()
    }

    /// Configured cache budget in bytes.
    #[must_use]
    pub fn cache_max_cost(&self) -> usize {
        self.cache.max_cost()
    }

    /// Name of the active prefetch strategy.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Ask every worker to stop after its current job.
    pub fn shutdown(&self) {
        for _ in 0..self.workers {
            let _ = self.job_tx.send(RenderJob::Shutdown);
        }
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        debug!(
            "render cache: used {} of {}",
            format_byte_size(self.cache.total_cost() as u64),
            format_byte_size(self.cache.max_cost() as u64)
        );
        self.shutdown();
    }
}
