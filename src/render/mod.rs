//! Render-serving subsystem: cache, codec, worker pool, prefetch, delivery.

pub mod cache;
pub mod codec;
pub mod inflight;
pub mod prefetch;
pub mod request;
pub mod service;
pub mod types;
pub mod worker;

pub use cache::BoundedCache;
pub use inflight::{BeginOutcome, InFlightRegistry, JobKind};
pub use prefetch::{
    DefaultStrategy, DisabledStrategy, PrefetchStrategy, default_strategy, strategy_by_name,
    strategy_names,
};
pub use request::{JobOutcome, RenderFault, RenderJob, ViewRequest};
pub use service::{NewRender, RenderService};
pub use types::{CompressedRender, PixelFormat, RawBitmap, RenderKey, Size};
