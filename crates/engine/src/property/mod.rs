//! Per-property aggregated state machine.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::watch;

use facet_contracts::{
	EditingHost, ObjectEditor, PropertyDescriptor, PropertyId, PropertyVariation, ResourceRef, SourceDescriptor, SourceKind,
	SourceKinds, Value, ValueSnapshot,
};
use facet_work::WorkTracker;

use crate::autocomplete::AutocompleteEngine;
use crate::availability;
use crate::registry::{self, KindSpec};


/// Aggregated, editable state for one property across the live editor set.
///
/// The view-model exclusively owns its state; the aggregator only reaches in
/// through the membership methods during a selection diff. Mutating commands
/// come in guard/execute pairs so a UI can query executability up front.
pub struct PropertyViewModel {
	descriptor: Arc<PropertyDescriptor>,
	host: Arc<EditingHost>,
	spec: KindSpec,
	work: WorkTracker,
	autocomplete: AutocompleteEngine,
	/// Properties whose change notifications trigger availability requery.
	constraining: HashSet<PropertyId>,
	state: RwLock<PropertyState>,
	revision: watch::Sender<u64>,
}

struct PropertyState {
	editors: Vec<Arc<dyn ObjectEditor>>,
	snapshot: ValueSnapshot,
	disagree: bool,
	available: bool,
	error: Option<String>,
	variation: Option<PropertyVariation>,
	suggestions: Vec<String>,
}

impl PropertyViewModel {
	pub(crate) fn new(descriptor: Arc<PropertyDescriptor>, host: Arc<EditingHost>, editors: Vec<Arc<dyn ObjectEditor>>) -> Arc<Self> {
		let spec = registry::kind_spec(&descriptor);
		let constraining = descriptor
			.constraints
			.iter()
			.flat_map(|constraint| constraint.constraining.iter().cloned())
			.collect();
		let snapshot = ValueSnapshot::neutral(descriptor.kind, SourceKind::Default);
		let (revision, _) = watch::channel(0);

		Arc::new(Self {
			descriptor,
			host,
			spec,
			work: WorkTracker::new(),
			autocomplete: AutocompleteEngine::new(),
			constraining,
			state: RwLock::new(PropertyState {
				editors,
				snapshot,
				disagree: false,
				available: true,
				error: None,
				variation: None,
				suggestions: Vec::new(),
			}),
			revision,
		})
	}

	pub fn descriptor(&self) -> &Arc<PropertyDescriptor> {
		&self.descriptor
	}

	pub fn name(&self) -> &str {
		&self.descriptor.name
	}

	pub fn category(&self) -> &str {
		&self.descriptor.category
	}

	/// The current aggregated snapshot. Replaced wholesale by resolution;
	/// never observed half-updated.
	pub fn snapshot(&self) -> ValueSnapshot {
		self.state.read().snapshot.clone()
	}

	pub fn value(&self) -> Value {
		self.state.read().snapshot.value.clone()
	}

	pub fn source(&self) -> SourceKind {
		self.state.read().snapshot.source
	}

	pub fn custom_expression(&self) -> Option<String> {
		self.state.read().snapshot.custom_expression.clone()
	}

	/// The linked resource, when the value is resource-sourced.
	pub fn resource(&self) -> Option<ResourceRef> {
		match &self.state.read().snapshot.source_descriptor {
			Some(SourceDescriptor::Resource(resource)) => Some(resource.clone()),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<String> {
		self.state.read().error.clone()
	}

	pub fn is_available(&self) -> bool {
		self.state.read().available
	}

	/// Whether the live editors currently disagree on this property.
	pub fn has_multiple_values(&self) -> bool {
		self.state.read().disagree
	}

	pub fn suggestions(&self) -> Vec<String> {
		self.state.read().suggestions.clone()
	}

	pub fn variation(&self) -> Option<PropertyVariation> {
		self.state.read().variation.clone()
	}

	/// Switches the variation the value is resolved under.
	pub async fn set_variation(&self, variation: Option<PropertyVariation>) {
		{
			let mut state = self.state.write();
			if state.variation == variation {
				return;
			}
			state.variation = variation;
		}
		self.bump();
		self.resolve_value().await;
	}

	pub fn editors(&self) -> Vec<Arc<dyn ObjectEditor>> {
		self.state.read().editors.clone()
	}

	pub fn editor_count(&self) -> usize {
		self.state.read().editors.len()
	}

	/// Observers see a new revision after every externally visible change.
	pub fn changes(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	pub fn is_busy(&self) -> bool {
		self.work.is_busy()
	}

	pub fn work(&self) -> &WorkTracker {
		&self.work
	}

	pub fn supports_autocomplete(&self) -> bool {
		self.host.supports_custom_expressions && self.state.read().editors.iter().any(|editor| editor.as_completer().is_some())
	}

	pub fn supports_resources(&self) -> bool {
		self.host.resources.is_some() && self.descriptor.can_write && self.descriptor.sources.contains(SourceKinds::RESOURCE)
	}

	pub fn supports_bindings(&self) -> bool {
		self.host.bindings.is_some() && self.descriptor.can_write && self.descriptor.sources.contains(SourceKinds::BINDING)
	}

	pub fn supports_source_navigation(&self) -> bool {
		self.state.read().editors.iter().any(|editor| editor.as_navigator().is_some())
	}

	// ---- commands ----

	/// Sets a local value. The write is skipped when the coerced value equals
	/// the currently resolved one, and when a validator rejects it; rejection
	/// still notifies observers so a UI can snap back the edit.
	pub async fn set_value(&self, value: Value) {
		let value = self.coerce(value);
		if value == self.value() {
			return;
		}
		if !self.is_valid(&value) {
			tracing::debug!(property = %self.descriptor.id, "property.set.rejected");
			self.bump();
			return;
		}
		self.dispatch(ValueSnapshot::local(value)).await;
	}

	pub fn can_set_resource(&self) -> bool {
		self.supports_resources()
	}

	pub async fn set_resource(&self, resource: ResourceRef) {
		if !self.can_set_resource() {
			return;
		}
		self.dispatch(ValueSnapshot::resource(self.descriptor.kind, resource)).await;
	}

	pub fn can_clear_value(&self) -> bool {
		!matches!(self.source(), SourceKind::Default | SourceKind::Unset | SourceKind::Unknown)
	}

	pub async fn clear_value(&self) {
		if !self.can_clear_value() {
			return;
		}
		self.dispatch(ValueSnapshot::unset(self.descriptor.kind)).await;
	}

	pub fn can_convert_to_local(&self) -> bool {
		!matches!(self.source(), SourceKind::Local | SourceKind::Unset)
	}

	/// Freezes the currently resolved value as a local literal.
	pub async fn convert_to_local(&self) {
		if !self.can_convert_to_local() {
			return;
		}
		self.dispatch(ValueSnapshot::local(self.value())).await;
	}

	pub fn can_create_binding(&self) -> bool {
		self.supports_bindings() && self.editor_count() == 1
	}

	/// Solicits a binding from the binding provider and dispatches it.
	/// Bindings are not defined for multi-object aggregation.
	pub async fn create_binding(&self) {
		if !self.can_create_binding() {
			return;
		}
		let Some(provider) = self.host.bindings.clone() else {
			return;
		};
		let Some(editor) = self.editors().into_iter().next() else {
			return;
		};
		let Some(binding) = provider.request_binding(&self.descriptor, &editor).await else {
			return;
		};
		self.dispatch(ValueSnapshot::binding(self.descriptor.kind, binding)).await;
	}

	pub fn can_create_resource(&self) -> bool {
		self.supports_resources()
			&& self.host.resources.as_ref().is_some_and(|provider| provider.can_create_resources())
			&& !self.has_multiple_values()
	}

	/// Solicits a site from the resource provider, materializes a resource
	/// from the current value, and links the property to it.
	pub async fn create_resource(&self) {
		if !self.can_create_resource() {
			return;
		}
		let Some(provider) = self.host.resources.clone() else {
			return;
		};
		let value = self.value();
		let Some(site) = provider.request_site(&self.descriptor, &value).await else {
			return;
		};
		match provider.create_resource(&site, &value).await {
			Ok(resource) => self.dispatch(ValueSnapshot::resource(self.descriptor.kind, resource)).await,
			Err(error) => self.set_error(Some(error.to_string())),
		}
	}

	pub fn can_navigate_to_source(&self) -> bool {
		let editors = self.editors();
		if editors.len() != 1 {
			return false;
		}
		if matches!(self.source(), SourceKind::Default | SourceKind::Unset) {
			return false;
		}
		editors[0].as_navigator().is_some_and(|navigator| navigator.can_navigate())
	}

	/// Delegates to the single live editor; no state change.
	pub fn navigate_to_source(&self) {
		if !self.can_navigate_to_source() {
			return;
		}
		let editors = self.editors();
		if let Some(navigator) = editors[0].as_navigator() {
			navigator.navigate();
		}
	}

	/// Sets or clears the user-typed expression. Clearing unsets the value.
	pub async fn set_custom_expression(&self, expression: Option<String>) {
		match expression {
			Some(text) => self.dispatch(ValueSnapshot::expression(self.descriptor.kind, text)).await,
			None => self.dispatch(ValueSnapshot::unset(self.descriptor.kind)).await,
		}
	}

	/// Probes autocomplete for an expression being typed. Supersedes any
	/// outstanding probe.
	pub async fn preview_expression(&self, text: &str) {
		if !self.supports_autocomplete() {
			return;
		}
		let editors = self.editors();
		let _scope = self.work.begin();
		self.autocomplete
			.probe(&self.descriptor, &editors, text, |suggestions| {
				self.state.write().suggestions = suggestions;
				self.bump();
			})
			.await;
	}

	// ---- resolution ----

	/// Re-resolves the aggregated value from the live editors.
	///
	/// Idempotent: always recomputes from current editor state, so coalesced
	/// or overlapping triggers settle on the same answer. Skipped entirely
	/// with no live editors.
	pub async fn resolve_value(&self) {
		let (editors, variation) = {
			let state = self.state.read();
			(state.editors.clone(), state.variation.clone())
		};
		if editors.is_empty() {
			return;
		}

		let _scope = self.work.begin();
		let queries = editors.iter().map(|editor| editor.value(&self.descriptor, variation.as_ref()));
		let results = join_all(queries).await;

		let mut resolved: Option<ValueSnapshot> = None;
		let mut disagree = false;
		for result in results {
			let snapshot = match result {
				Ok(snapshot) => snapshot,
				Err(error) => {
					// Resolution failure is "no contribution", not an error.
					tracing::warn!(property = %self.descriptor.id, %error, "property.resolve.failed");
					continue;
				}
			};
			match &mut resolved {
				None => resolved = Some(snapshot),
				// Field-wise collapse: only a disagreeing field goes neutral,
				// fields the editors agree on survive.
				Some(current) => {
					if current.source != snapshot.source {
						current.source = SourceKind::Unknown;
						disagree = true;
					}
					if current.value != snapshot.value {
						current.value = self.descriptor.kind.default_value();
						disagree = true;
					}
					if current.source_descriptor != snapshot.source_descriptor {
						current.source_descriptor = None;
						disagree = true;
					}
					if current.value_descriptor != snapshot.value_descriptor {
						current.value_descriptor = None;
						disagree = true;
					}
					if current.custom_expression != snapshot.custom_expression {
						current.custom_expression = None;
						disagree = true;
					}
				}
			}
		}
		let Some(snapshot) = resolved else {
			return;
		};

		{
			let mut state = self.state.write();
			if state.editors.is_empty() {
				// Torn down while the queries were in flight.
				return;
			}
			if state.snapshot == snapshot && state.disagree == disagree {
				return;
			}
			state.snapshot = snapshot;
			state.disagree = disagree;
		}
		self.bump();
	}

	/// Entry point for editor notifications routed by the aggregator.
	///
	/// A change to a constraining property requeries availability; a change
	/// to this property (or the `None` wildcard) re-resolves the value.
	pub async fn handle_editor_event(&self, changed: Option<&PropertyId>) {
		if let Some(id) = changed {
			if self.constraining.contains(id) {
				self.requery_availability().await;
			}
			if *id != self.descriptor.id {
				return;
			}
		}
		self.resolve_value().await;
	}

	/// Initial population after construction or reseeding.
	pub(crate) async fn refresh(&self) {
		if !self.descriptor.constraints.is_empty() {
			self.requery_availability().await;
		}
		self.resolve_value().await;
	}

	async fn requery_availability(&self) {
		let editors = self.editors();
		let _scope = self.work.begin();
		let available = availability::evaluate(&self.descriptor, &editors).await;
		let changed = {
			let mut state = self.state.write();
			if state.available == available {
				false
			} else {
				state.available = available;
				true
			}
		};
		if changed {
			self.bump();
		}
	}

	// ---- membership (driven by the aggregator during selection diffs) ----

	/// Bulk membership update during a selection diff.
	pub(crate) fn update_editors(&self, removed: &[Arc<dyn ObjectEditor>], added: &[Arc<dyn ObjectEditor>]) {
		{
			let mut state = self.state.write();
			state
				.editors
				.retain(|editor| !removed.iter().any(|gone| Arc::ptr_eq(editor, gone)));
			for editor in added {
				if !state.editors.iter().any(|existing| Arc::ptr_eq(existing, editor)) {
					state.editors.push(Arc::clone(editor));
				}
			}
		}
		self.sync_completion_support();
		self.bump();
	}

	/// First step of teardown: with the editor list empty, in-flight
	/// operations settle to a neutral state instead of committing.
	pub(crate) fn clear_editors(&self) {
		self.autocomplete.cancel();
		{
			let mut state = self.state.write();
			state.editors.clear();
			state.suggestions.clear();
		}
		self.bump();
	}

	// ---- internals ----

	fn coerce(&self, value: Value) -> Value {
		let value = (self.spec.coerce)(&self.descriptor, value);
		match &self.descriptor.constrainer {
			Some(constrainer) => constrainer.coerce(value),
			None => value,
		}
	}

	fn is_valid(&self, value: &Value) -> bool {
		if !(self.spec.validate)(&self.descriptor, value) {
			return false;
		}
		self.descriptor.constrainer.as_ref().is_none_or(|constrainer| constrainer.is_valid(value))
	}

	/// Fans a write out to every live editor and joins. Partial failure is
	/// intentional: succeeded writes stay, the first failure becomes the
	/// property error.
	async fn dispatch(&self, snapshot: ValueSnapshot) {
		self.set_error(None);
		let editors = self.editors();
		if editors.is_empty() {
			return;
		}

		let _scope = self.work.begin();
		tracing::debug!(property = %self.descriptor.id, source = ?snapshot.source, editors = editors.len(), "property.write.dispatch");
		let writes = editors.iter().map(|editor| editor.set_value(&self.descriptor, snapshot.clone()));
		let results = join_all(writes).await;
		if let Some(error) = results.into_iter().find_map(Result::err) {
			self.set_error(Some(error.to_string()));
		}
		// Editors emit change notifications for landed writes; resolution
		// observes reality rather than the command forcing the state.
	}

	fn set_error(&self, error: Option<String>) {
		let changed = {
			let mut state = self.state.write();
			if state.error == error {
				false
			} else {
				state.error = error;
				true
			}
		};
		if changed {
			self.bump();
		}
	}

	fn sync_completion_support(&self) {
		if self.supports_autocomplete() {
			return;
		}
		self.autocomplete.cancel();
		self.state.write().suggestions.clear();
	}

	fn bump(&self) {
		self.revision.send_modify(|revision| *revision += 1);
	}
}
