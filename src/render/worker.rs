//! Render worker - runs in dedicated threads.

use std::sync::Arc;

use flume::{Receiver, Sender};

use crate::document::PageProvider;

use super::codec;
use super::request::{JobOutcome, RenderFault, RenderJob};
use super::types::{CompressedRender, RawBitmap, RenderKey};

/// Worker loop: pull jobs from the shared queue until shutdown.
///
/// Workers never touch the cache or the in-flight registry; every result
/// goes back through `results` and is applied by the service on its own
/// thread.
pub fn render_worker(
    provider: Arc<dyn PageProvider>,
    jobs: Receiver<RenderJob>,
    results: Sender<JobOutcome>,
) {
    for job in jobs {
        match job {
            RenderJob::Render { key } => {
                let outcome = match render_page(provider.as_ref(), key) {
                    Ok((compressed, bitmap)) => JobOutcome::Rendered {
                        key,
                        compressed,
                        bitmap,
                    },
                    Err(fault) => JobOutcome::Failed { key, fault },
                };
                if results.send(outcome).is_err() {
                    // Service is gone, nobody to report to.
                    break;
                }
            }

            RenderJob::Shutdown => break,
        }
    }
}

/// Rasterize one page and compress the result for caching.
///
/// Returns both forms so a requested render can be delivered without
/// decompressing the data just compressed.
pub fn render_page(
    provider: &dyn PageProvider,
    key: RenderKey,
) -> Result<(CompressedRender, RawBitmap), RenderFault> {
    let bitmap = provider.rasterize(key.page, key.size)?;
    if bitmap.size != key.size {
        return Err(RenderFault::generic(format!(
            "rasterizer produced {} for a {} request",
            bitmap.size, key.size,
        )));
    }
    let compressed = codec::encode(&bitmap)?;
    Ok((compressed, bitmap))
}
