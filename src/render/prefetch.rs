//! Prefetch strategies: which renders to warm after a request.

use crate::document::{PageProvider, RedrawCause};

use super::request::ViewRequest;
use super::types::RenderKey;

/// Pages walked in the direction of movement by the default strategy.
pub const DEFAULT_LONG_SPAN: usize = 5;

/// A prefetch policy.
///
/// Called once a request has been accepted; returns additional keys worth
/// computing ahead of time, in priority order (empty allowed). Strategies
/// are stateless and shared across concurrent calls.
pub trait PrefetchStrategy: Send + Sync {
    /// Registered name, used for selection and display.
    fn name(&self) -> &'static str;

    /// Keys worth warming for `request`.
    fn plan(&self, request: &ViewRequest, provider: &dyn PageProvider) -> Vec<RenderKey>;
}

/// Never prefetches.
pub struct DisabledStrategy;

impl PrefetchStrategy for DisabledStrategy {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn plan(&self, _request: &ViewRequest, _provider: &dyn PageProvider) -> Vec<RenderKey> {
        Vec::new()
    }
}

/// Window prefetch around the current page.
///
/// Always warms the adjacent page on both sides. For the roles showing the
/// current page itself, directional navigation widens the window to
/// `long_span` pages in the direction of movement.
pub struct DefaultStrategy {
    long_span: usize,
}

impl DefaultStrategy {
    #[must_use]
    pub fn new(long_span: usize) -> Self {
        Self { long_span }
    }
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_SPAN)
    }
}

impl PrefetchStrategy for DefaultStrategy {
    fn name(&self) -> &'static str {
        "default"
    }

    fn plan(&self, request: &ViewRequest, provider: &dyn PageProvider) -> Vec<RenderKey> {
        let directional = request.role.shows_current_page();
        let (forward, backward) = if directional && request.cause == RedrawCause::ForwardMove {
            (self.long_span, 1)
        } else if directional && request.cause == RedrawCause::BackwardMove {
            (1, self.long_span)
        } else {
            (1, 1)
        };

        let mut keys = Vec::with_capacity(forward + backward);
        walk(request, provider, forward, Step::Forward, &mut keys);
        walk(request, provider, backward, Step::Backward, &mut keys);
        keys
    }
}

#[derive(Clone, Copy)]
enum Step {
    Forward,
    Backward,
}

/// Walk the page chain from the request's current page, emitting a key for
/// each reached page that resolves under the request's role. Stops at the
/// document boundary.
fn walk(
    request: &ViewRequest,
    provider: &dyn PageProvider,
    steps: usize,
    step: Step,
    out: &mut Vec<RenderKey>,
) {
    let mut page = Some(request.current_page);
    for _ in 0..steps {
        page = page.and_then(|p| match step {
            Step::Forward => provider.next_page(p),
            Step::Backward => provider.previous_page(p),
        });
        let Some(reached) = page else { break };
        if let Some(shown) = provider.resolve(reached, request.role) {
            let size = provider.preferred_size(shown, request.target_box);
            out.push(RenderKey { page: shown, size });
        }
    }
}

/// Names of the registered strategies.
#[must_use]
pub fn strategy_names() -> &'static [&'static str] {
    &["disabled", "default"]
}

/// Look up a strategy by its registered name. Surrounding whitespace is
/// ignored; `None` for unknown names.
#[must_use]
pub fn strategy_by_name(name: &str) -> Option<Box<dyn PrefetchStrategy>> {
    match name.trim() {
        "disabled" => Some(Box::new(DisabledStrategy)),
        "default" => Some(Box::new(DefaultStrategy::default())),
        _ => None,
    }
}

/// The strategy used when none is configured.
#[must_use]
pub fn default_strategy() -> Box<dyn PrefetchStrategy> {
    Box::new(DefaultStrategy::default())
}
