//! Scoped busy-state tracking for async view-model work.
//!
//! Every operation that mutates aggregated state holds a [`WorkScope`] for
//! its duration. Scopes nest; the owning tracker reads busy while at least
//! one scope is alive, and the marker is released on every exit path because
//! release happens in [`Drop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Per-owner busy marker with nesting.
///
/// Cheap to clone; clones share the same counter. One tracker belongs to one
/// view-model, so a UI can suppress interaction during in-flight work without
/// knowing which operation is running.
#[derive(Debug, Clone)]
pub struct WorkTracker {
	shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
	active: AtomicUsize,
	busy: watch::Sender<bool>,
}

impl Default for WorkTracker {
	fn default() -> Self {
		Self::new()
	}
}

impl WorkTracker {
	pub fn new() -> Self {
		let (busy, _) = watch::channel(false);
		Self {
			shared: Arc::new(Shared { active: AtomicUsize::new(0), busy }),
		}
	}

	/// Acquires a busy scope. The tracker reads busy until every outstanding
	/// scope has been dropped.
	pub fn begin(&self) -> WorkScope {
		let previous = self.shared.active.fetch_add(1, Ordering::AcqRel);
		if previous == 0 {
			self.shared.busy.send_replace(true);
		}
		tracing::trace!(active = previous + 1, "work.scope.begin");
		WorkScope { shared: Arc::clone(&self.shared) }
	}

	/// Whether any scope is currently held.
	pub fn is_busy(&self) -> bool {
		self.shared.active.load(Ordering::Acquire) > 0
	}

	/// Watch for busy-state edges.
	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.shared.busy.subscribe()
	}
}

/// Guard for one unit of in-flight work.
#[derive(Debug)]
#[must_use = "dropping the scope immediately marks the work as finished"]
pub struct WorkScope {
	shared: Arc<Shared>,
}

impl Drop for WorkScope {
	fn drop(&mut self) {
		let previous = self.shared.active.fetch_sub(1, Ordering::AcqRel);
		if previous == 1 {
			self.shared.busy.send_replace(false);
		}
		tracing::trace!(active = previous - 1, "work.scope.end");
	}
}
