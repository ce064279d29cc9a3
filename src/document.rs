//! Document collaborator contract: page identities, roles and navigation.
//!
//! The render service never opens documents itself. The embedding
//! application implements [`PageProvider`] on top of its document layer and
//! the service only ever sees opaque [`PageId`] handles.

use crate::render::types::{RawBitmap, Size};

/// Stable identity of a page for the lifetime of an open document.
///
/// Issued by the [`PageProvider`]; compares by identity, not content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(u32);

impl PageId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the provider's page numbering (0-based).
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Logical viewport a render is destined for.
///
/// The current page is the page shown to the audience; the other roles are
/// derived from it through the page graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewRole {
    /// Audience screen.
    CurrentPublic,
    /// Presenter's main panel.
    CurrentPresenter,
    /// Preview of the first page of the next slide.
    NextSlide,
    /// Preview of the next in-slide transition.
    NextTransition,
    /// Preview of the previous in-slide transition.
    PrevTransition,
}

impl ViewRole {
    /// Roles that show the current page itself rather than a derived one.
    #[must_use]
    pub const fn shows_current_page(self) -> bool {
        matches!(self, ViewRole::CurrentPublic | ViewRole::CurrentPresenter)
    }
}

/// What triggered a render request. Only used to size the prefetch window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawCause {
    Resize,
    ForwardMove,
    BackwardMove,
    RandomMove,
}

/// Fault reported by the document side while rasterizing a page.
#[derive(Debug, Clone, thiserror::Error)]
#[error("rasterization of page {page}: {detail}")]
pub struct RasterError {
    pub page: u32,
    pub detail: String,
}

impl RasterError {
    pub fn new(page: PageId, detail: impl Into<String>) -> Self {
        Self {
            page: page.index(),
            detail: detail.into(),
        }
    }
}

/// Document access used by the render service.
///
/// Implementations are shared between the service and its worker threads,
/// so they must be callable concurrently.
pub trait PageProvider: Send + Sync {
    /// Largest size preserving the page's aspect ratio that fits in
    /// `bounding_box`. A page without an intrinsic size yields a zero size.
    fn preferred_size(&self, page: PageId, bounding_box: Size) -> Size;

    /// Produce pixel data at exactly `size`.
    fn rasterize(&self, page: PageId, size: Size) -> Result<RawBitmap, RasterError>;

    /// Page shown for `role` when `current` is the current page, or `None`
    /// when there is none (no next transition, end of document, ...).
    fn resolve(&self, current: PageId, role: ViewRole) -> Option<PageId>;

    /// Sequential successor of `page`, if any.
    fn next_page(&self, page: PageId) -> Option<PageId>;

    /// Sequential predecessor of `page`, if any.
    fn previous_page(&self, page: PageId) -> Option<PageId>;
}
