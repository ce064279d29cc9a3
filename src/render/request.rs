//! Request and completion types exchanged with render workers.

use crate::document::{PageId, RasterError, RedrawCause, ViewRole};

use super::types::{CompressedRender, RawBitmap, RenderKey, Size};

/// A view's render request, as issued by the GUI layer.
///
/// Resolves to a concrete [`RenderKey`] through the page provider's role
/// resolution; a request that resolves to no page is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct ViewRequest {
    /// Page currently shown to the audience.
    pub current_page: PageId,
    /// Pixel box the view has available.
    pub target_box: Size,
    /// Which viewport the request renders for.
    pub role: ViewRole,
    /// What triggered the request.
    pub cause: RedrawCause,
}

/// Work item sent to the worker pool.
#[derive(Debug)]
pub enum RenderJob {
    /// Rasterize and compress one render.
    Render { key: RenderKey },
    /// Stop the worker thread.
    Shutdown,
}

/// Errors from the render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("document: {0}")]
    Raster(#[from] RasterError),

    #[error("codec: {0}")]
    Codec(#[from] std::io::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Completion reported by a worker.
#[derive(Debug)]
pub enum JobOutcome {
    /// Finished render: the compressed form for the cache plus the raw
    /// bitmap for immediate delivery, from the same rasterize call.
    Rendered {
        key: RenderKey,
        compressed: CompressedRender,
        bitmap: RawBitmap,
    },

    /// The render failed; the key's in-flight slot must be released.
    Failed { key: RenderKey, fault: RenderFault },
}
