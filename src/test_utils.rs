//! Test fixtures: an in-memory document with a deterministic page graph.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::document::{PageId, PageProvider, RasterError, ViewRole};
use crate::render::types::{PixelFormat, RawBitmap, RenderKey, Size};

/// Upper bound on how long a gated rasterize call will wait. Keeps a test
/// that forgets to release the gate from hanging the whole run.
const GATE_WAIT_CAP: Duration = Duration::from_secs(10);

/// Intrinsic page size of the scripted document (4:3).
const PAGE_WIDTH: f64 = 800.0;
const PAGE_HEIGHT: f64 = 600.0;

/// An in-memory linear document with `page_count` pages.
///
/// `next`/`previous` follow page order; `NextSlide` resolves to the
/// following page; the transition roles resolve to nothing. Rasterized
/// pixels are a pure function of page and size, so tests can compare
/// renders bit for bit via [`ScriptedDocument::reference_bitmap`].
///
/// Rasterization can be gated (to hold jobs in flight at a known point)
/// and made to fail for selected pages.
pub struct ScriptedDocument {
    page_count: u32,
    fail_pages: HashSet<PageId>,
    gate_closed: Mutex<bool>,
    gate_opened: Condvar,
    rasterize_counts: Mutex<HashMap<RenderKey, usize>>,
}

impl ScriptedDocument {
    #[must_use]
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            fail_pages: HashSet::new(),
            gate_closed: Mutex::new(false),
            gate_opened: Condvar::new(),
            rasterize_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Make rasterization of `page` fail.
    #[must_use]
    pub fn failing(mut self, page: PageId) -> Self {
        self.fail_pages.insert(page);
        self
    }

    /// Hold every rasterize call until [`ScriptedDocument::release_renders`].
    pub fn hold_renders(&self) {
        *self
            .gate_closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Let held rasterize calls proceed.
    pub fn release_renders(&self) {
        *self
            .gate_closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = false;
        self.gate_opened.notify_all();
    }

    /// How many times `key` has been rasterized.
    #[must_use]
    pub fn rasterize_count(&self, key: &RenderKey) -> usize {
        self.rasterize_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Total rasterize calls across all keys.
    #[must_use]
    pub fn total_rasterizations(&self) -> usize {
        self.rasterize_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// The exact pixels [`PageProvider::rasterize`] produces for `page` at
    /// `size`.
    #[must_use]
    pub fn reference_bitmap(&self, page: PageId, size: Size) -> RawBitmap {
        let mut pixels = Vec::with_capacity(size.area() as usize * 3);
        for y in 0..size.height {
            for x in 0..size.width {
                pixels.push((x + y + page.index()) as u8);
                pixels.push((x ^ y) as u8);
                pixels.push(x.wrapping_mul(31).wrapping_add(page.index().wrapping_mul(7)) as u8);
            }
        }
        RawBitmap::packed(size, PixelFormat::Rgb8, pixels)
    }

    fn wait_for_gate(&self) {
        let mut closed = self
            .gate_closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *closed {
            let (guard, timeout) = self
                .gate_opened
                .wait_timeout(closed, GATE_WAIT_CAP)
                .unwrap_or_else(PoisonError::into_inner);
            closed = guard;
            if timeout.timed_out() {
                break;
            }
        }
    }
}

impl PageProvider for ScriptedDocument {
    fn preferred_size(&self, _page: PageId, bounding_box: Size) -> Size {
        if bounding_box.is_empty() {
            return Size::default();
        }
        let scale = (f64::from(bounding_box.width) / PAGE_WIDTH)
            .min(f64::from(bounding_box.height) / PAGE_HEIGHT);
        Size::new(
            (PAGE_WIDTH * scale) as u32,
            (PAGE_HEIGHT * scale) as u32,
        )
    }

    fn rasterize(&self, page: PageId, size: Size) -> Result<RawBitmap, RasterError> {
        self.wait_for_gate();
        *self
            .rasterize_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(RenderKey { page, size })
            .or_insert(0) += 1;

        if self.fail_pages.contains(&page) {
            return Err(RasterError::new(page, "scripted failure"));
        }
        Ok(self.reference_bitmap(page, size))
    }

    fn resolve(&self, current: PageId, role: ViewRole) -> Option<PageId> {
        match role {
            ViewRole::CurrentPublic | ViewRole::CurrentPresenter => Some(current),
            ViewRole::NextSlide => self.next_page(current),
            ViewRole::NextTransition | ViewRole::PrevTransition => None,
        }
    }

    fn next_page(&self, page: PageId) -> Option<PageId> {
        (page.index() + 1 < self.page_count).then(|| PageId::new(page.index() + 1))
    }

    fn previous_page(&self, page: PageId) -> Option<PageId> {
        page.index().checked_sub(1).map(PageId::new)
    }
}
