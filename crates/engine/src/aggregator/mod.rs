//! Selection-to-members aggregation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_util::sync::CancellationToken;

use facet_contracts::{
	EditingHost, EditorEvent, EventDescriptor, EventId, KnownPropertyKey, ObjectEditor, PropertyDescriptor, PropertyId,
	TargetObject,
};

use crate::events::EventViewModel;
use crate::known::KnownPropertyIndex;
use crate::property::PropertyViewModel;


/// One mutation of the selection set.
#[derive(Debug, Clone)]
pub enum SelectionChange {
	Add(Vec<TargetObject>),
	Remove(Vec<TargetObject>),
	Replace { index: usize, target: TargetObject },
	Move { from: usize, to: usize },
	Reset(Vec<TargetObject>),
}

/// Granular notification about the aggregated surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateEvent {
	PropertyAdded(PropertyId),
	PropertyRemoved(PropertyId),
	EventAdded(EventId),
	EventRemoved(EventId),
	NameChanged,
	TypeNameChanged,
	NameableChanged,
	ErrorsChanged,
}

struct EditorEntry {
	target: TargetObject,
	editor: Arc<dyn ObjectEditor>,
	/// Cancelling this detaches the notification listener, which must happen
	/// before the editor is released so no stale callbacks arrive.
	listener: CancellationToken,
}

struct AggregateState {
	selection: Vec<TargetObject>,
	entries: Vec<EditorEntry>,
	properties: IndexMap<PropertyId, Arc<PropertyViewModel>>,
	events: IndexMap<EventId, Arc<EventViewModel>>,
	/// Allocated lazily, only once some editor declares known properties.
	known: Option<KnownPropertyIndex>,
	object_name: Option<String>,
	name_read_only: bool,
	nameable: bool,
	type_name: Option<String>,
	name_error: Option<String>,
}

impl Default for AggregateState {
	fn default() -> Self {
		Self {
			selection: Vec::new(),
			entries: Vec::new(),
			properties: IndexMap::new(),
			events: IndexMap::new(),
			known: None,
			object_name: None,
			name_read_only: true,
			nameable: false,
			type_name: None,
			name_error: None,
		}
	}
}

/// Owns the selection set and keeps one aggregated property/event view
/// consistent with it.
///
/// Selection handling is strictly serialized: a change submitted while a
/// previous one is still in flight waits its turn, so no observer ever sees
/// a half-applied intersection.
pub struct PropertiesAggregator {
	host: Arc<EditingHost>,
	gate: Mutex<()>,
	state: RwLock<AggregateState>,
	events_tx: broadcast::Sender<AggregateEvent>,
	revision: watch::Sender<u64>,
}

impl PropertiesAggregator {
	pub fn new(host: Arc<EditingHost>) -> Arc<Self> {
		let (events_tx, _) = broadcast::channel(256);
		let (revision, _) = watch::channel(0);
		Arc::new(Self {
			host,
			gate: Mutex::new(()),
			state: RwLock::new(AggregateState::default()),
			events_tx,
			revision,
		})
	}

	// ---- observable surface ----

	pub fn selection(&self) -> Vec<TargetObject> {
		self.state.read().selection.clone()
	}

	/// Aggregated property entries, in insertion order.
	pub fn properties(&self) -> Vec<Arc<PropertyViewModel>> {
		self.state.read().properties.values().cloned().collect()
	}

	pub fn property(&self, id: &PropertyId) -> Option<Arc<PropertyViewModel>> {
		self.state.read().properties.get(id).cloned()
	}

	/// Aggregated event entries, in insertion order.
	pub fn events(&self) -> Vec<Arc<EventViewModel>> {
		self.state.read().events.values().cloned().collect()
	}

	pub fn event(&self, id: &EventId) -> Option<Arc<EventViewModel>> {
		self.state.read().events.get(id).cloned()
	}

	/// Looks a property up by its well-known key.
	pub fn known_property(&self, key: &KnownPropertyKey) -> Option<Arc<PropertyViewModel>> {
		let state = self.state.read();
		let id = state.known.as_ref()?.property(key)?.clone();
		state.properties.get(&id).cloned()
	}

	pub fn object_name(&self) -> Option<String> {
		self.state.read().object_name.clone()
	}

	pub fn is_object_nameable(&self) -> bool {
		self.state.read().nameable
	}

	pub fn is_name_read_only(&self) -> bool {
		self.state.read().name_read_only
	}

	pub fn type_name(&self) -> Option<String> {
		self.state.read().type_name.clone()
	}

	pub fn name_error(&self) -> Option<String> {
		self.state.read().name_error.clone()
	}

	/// Error recorded for one property, keyed by identity.
	pub fn error_for(&self, id: &PropertyId) -> Option<String> {
		self.property(id)?.error()
	}

	pub fn has_errors(&self) -> bool {
		let state = self.state.read();
		state.name_error.is_some() || state.properties.values().any(|vm| vm.error().is_some())
	}

	pub fn subscribe(&self) -> broadcast::Receiver<AggregateEvent> {
		self.events_tx.subscribe()
	}

	pub fn changes(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	// ---- selection mutation ----

	pub async fn add_targets(self: &Arc<Self>, targets: Vec<TargetObject>) {
		self.apply(SelectionChange::Add(targets)).await;
	}

	pub async fn remove_targets(self: &Arc<Self>, targets: Vec<TargetObject>) {
		self.apply(SelectionChange::Remove(targets)).await;
	}

	pub async fn set_selection(self: &Arc<Self>, targets: Vec<TargetObject>) {
		self.apply(SelectionChange::Reset(targets)).await;
	}

	pub async fn clear_selection(self: &Arc<Self>) {
		self.apply(SelectionChange::Reset(Vec::new())).await;
	}

	/// Applies one selection mutation.
	///
	/// The gate is a fair mutex, so concurrent submissions apply strictly in
	/// arrival order and never interleave. Replace/Move/Reset deliberately
	/// degrade to "release every editor, re-process the whole selection":
	/// one conservative, well-tested consistency path.
	pub async fn apply(self: &Arc<Self>, change: SelectionChange) {
		let _ticket = self.gate.lock().await;
		tracing::debug!(?change, "aggregator.selection.apply");

		let (removed, added) = match change {
			SelectionChange::Add(targets) => {
				// Already-selected targets are skipped so no target ever holds
				// more than one editor entry.
				let fresh = {
					let mut state = self.state.write();
					let mut fresh: Vec<TargetObject> = Vec::new();
					for target in targets {
						if state.selection.contains(&target) {
							continue;
						}
						state.selection.push(target.clone());
						fresh.push(target);
					}
					fresh
				};
				let added = self.attach_editors(&fresh).await;
				(Vec::new(), added)
			}
			SelectionChange::Remove(targets) => {
				let mut removed = Vec::new();
				{
					let mut state = self.state.write();
					for target in &targets {
						state.selection.retain(|candidate| candidate != target);
						if let Some(position) = state.entries.iter().position(|entry| &entry.target == target) {
							let entry = state.entries.remove(position);
							entry.listener.cancel();
							removed.push(entry.editor);
						}
					}
				}
				(removed, Vec::new())
			}
			SelectionChange::Replace { index, target } => {
				self.release_all_with(|selection| {
					if index < selection.len() {
						selection[index] = target;
					}
				})
				.await
			}
			SelectionChange::Move { from, to } => {
				self.release_all_with(|selection| {
					if from < selection.len() && to < selection.len() {
						let target = selection.remove(from);
						selection.insert(to, target);
					}
				})
				.await
			}
			SelectionChange::Reset(targets) => self.release_all_with(|selection| *selection = targets).await,
		};

		self.update_members(&removed, &added).await;
	}

	/// Releases every current editor, edits the selection, and re-attaches
	/// editors for whatever the selection now contains.
	async fn release_all_with(
		self: &Arc<Self>,
		edit: impl FnOnce(&mut Vec<TargetObject>),
	) -> (Vec<Arc<dyn ObjectEditor>>, Vec<Arc<dyn ObjectEditor>>) {
		let targets = {
			let mut state = self.state.write();
			edit(&mut state.selection);
			state.selection.clone()
		};
		let mut removed = Vec::new();
		{
			let mut state = self.state.write();
			for entry in state.entries.drain(..) {
				entry.listener.cancel();
				removed.push(entry.editor);
			}
		}
		let added = self.attach_editors(&targets).await;
		(removed, added)
	}

	/// Resolves an editor per target, concurrently. A target whose resolution
	/// fails or yields nothing stays selected but contributes no members.
	async fn attach_editors(self: &Arc<Self>, targets: &[TargetObject]) -> Vec<Arc<dyn ObjectEditor>> {
		let resolutions = join_all(targets.iter().map(|target| self.host.editors.object_editor(target))).await;

		let mut added = Vec::new();
		for (target, resolution) in targets.iter().zip(resolutions) {
			let editor = match resolution {
				Ok(Some(editor)) => editor,
				Ok(None) => continue,
				Err(error) => {
					tracing::debug!(?target, %error, "aggregator.editor.unresolved");
					continue;
				}
			};
			if self.state.read().entries.iter().any(|entry| &entry.target == target) {
				continue;
			}
			let listener = CancellationToken::new();
			self.spawn_listener(Arc::clone(&editor), listener.clone());
			self.state.write().entries.push(EditorEntry {
				target: target.clone(),
				editor: Arc::clone(&editor),
				listener,
			});
			added.push(editor);
		}
		added
	}

	fn spawn_listener(self: &Arc<Self>, editor: Arc<dyn ObjectEditor>, token: CancellationToken) {
		let weak = Arc::downgrade(self);
		let mut notifications = editor.subscribe();
		tokio::spawn(async move {
			loop {
				let event = tokio::select! {
					_ = token.cancelled() => break,
					event = notifications.recv() => event,
				};
				let Some(aggregator) = weak.upgrade() else {
					break;
				};
				match event {
					Ok(event) => aggregator.on_editor_event(&editor, event).await,
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "aggregator.listener.lagged");
						aggregator.on_editor_event(&editor, EditorEvent::PropertyChanged(None)).await;
					}
					Err(RecvError::Closed) => break,
				}
			}
		});
	}

	async fn on_editor_event(self: &Arc<Self>, editor: &Arc<dyn ObjectEditor>, event: EditorEvent) {
		match event {
			EditorEvent::PropertyChanged(changed) => {
				let view_models = self.properties();
				for vm in view_models {
					if vm.editors().iter().any(|live| Arc::ptr_eq(live, editor)) {
						vm.handle_editor_event(changed.as_ref()).await;
					}
				}
			}
			EditorEvent::MembersChanged => {
				let _ticket = self.gate.lock().await;
				self.update_members(&[], &[]).await;
			}
		}
	}

	// ---- recompute ----

	/// Recomputes the intersected members and diffs them into the existing
	/// view-model collections. Runs under the selection gate.
	async fn update_members(&self, removed: &[Arc<dyn ObjectEditor>], added: &[Arc<dyn ObjectEditor>]) {
		let editors: Vec<Arc<dyn ObjectEditor>> = self.state.read().entries.iter().map(|entry| Arc::clone(&entry.editor)).collect();
		if editors.is_empty() {
			self.clear_members();
			return;
		}

		// Intersections, in the first editor's declaration order.
		let mut fresh_properties: IndexMap<PropertyId, Arc<PropertyDescriptor>> = IndexMap::new();
		for descriptor in editors[0].properties() {
			fresh_properties.entry(descriptor.id.clone()).or_insert(descriptor);
		}
		let mut fresh_events: IndexMap<EventId, Arc<EventDescriptor>> = IndexMap::new();
		for descriptor in editors[0].events() {
			fresh_events.entry(descriptor.id.clone()).or_insert(descriptor);
		}
		for editor in &editors[1..] {
			let property_ids: HashSet<PropertyId> = editor.properties().iter().map(|descriptor| descriptor.id.clone()).collect();
			fresh_properties.retain(|id, _| property_ids.contains(id));
			let event_ids: HashSet<EventId> = editor.events().iter().map(|descriptor| descriptor.id.clone()).collect();
			fresh_events.retain(|id, _| event_ids.contains(id));
		}

		let mut type_name = editors[0].type_name();
		if editors[1..].iter().any(|editor| editor.type_name() != type_name) {
			type_name = multiple_types_label(editors.len());
		}

		let nameable = editors.iter().any(|editor| editor.as_nameable().is_some());
		let has_knowns = editors.iter().any(|editor| !editor.known_properties().is_empty());
		let mut known_map: HashMap<PropertyId, KnownPropertyKey> = HashMap::new();
		if has_knowns {
			for editor in &editors {
				for (key, id) in editor.known_properties() {
					known_map.insert(id, key);
				}
			}
		}

		// Display name: single selection queries the editor, multiple get a
		// fixed read-only placeholder. A failed query is a name-level error,
		// not a failed selection update.
		let (object_name, name_read_only, name_error) = if editors.len() == 1 {
			match editors[0].as_nameable() {
				Some(nameable) => match nameable.name().await {
					Ok(name) => (name, false, None),
					Err(error) => (None, false, Some(error.to_string())),
				},
				None => (None, true, None),
			}
		} else {
			(Some(multiple_objects_label(editors.len())), true, None)
		};

		// Diff the fresh intersection against the live view-models. After
		// this, `fresh_*` holds only the newly intersected members.
		let mut surviving_properties = Vec::new();
		let mut gone_properties = Vec::new();
		let mut surviving_events = Vec::new();
		let mut gone_events = Vec::new();
		{
			let state = self.state.read();
			for (id, vm) in &state.properties {
				if fresh_properties.shift_remove(id).is_some() {
					surviving_properties.push(Arc::clone(vm));
				} else {
					gone_properties.push((id.clone(), Arc::clone(vm)));
				}
			}
			for (id, vm) in &state.events {
				if fresh_events.shift_remove(id).is_some() {
					surviving_events.push(Arc::clone(vm));
				} else {
					gone_events.push((id.clone(), Arc::clone(vm)));
				}
			}
		}

		// Surviving members keep their in-flight state; only their editor
		// membership is patched, then they re-resolve.
		let membership_changed = !removed.is_empty() || !added.is_empty();
		if membership_changed {
			for vm in &surviving_properties {
				vm.update_editors(removed, added);
			}
			for vm in &surviving_events {
				vm.update_editors(removed, added);
			}
			join_all(surviving_properties.iter().map(|vm| vm.resolve_value())).await;
			join_all(surviving_events.iter().map(|vm| vm.resolve_handlers())).await;
		}

		// New members are fully populated before they become visible.
		let mut built_properties = Vec::new();
		for (id, descriptor) in fresh_properties {
			let vm = PropertyViewModel::new(descriptor, Arc::clone(&self.host), editors.clone());
			vm.refresh().await;
			built_properties.push((id, vm));
		}
		let mut built_events = Vec::new();
		for (id, descriptor) in fresh_events {
			let vm = EventViewModel::new(descriptor, editors.clone());
			vm.resolve_handlers().await;
			built_events.push((id, vm));
		}

		// Single commit so a reader never observes a partially diffed set.
		let mut notifications = Vec::new();
		{
			let mut state = self.state.write();
			if state.type_name.as_deref() != Some(type_name.as_str()) {
				state.type_name = Some(type_name);
				notifications.push(AggregateEvent::TypeNameChanged);
			}
			if state.nameable != nameable {
				state.nameable = nameable;
				notifications.push(AggregateEvent::NameableChanged);
			}
			if state.object_name != object_name || state.name_read_only != name_read_only {
				state.object_name = object_name;
				state.name_read_only = name_read_only;
				notifications.push(AggregateEvent::NameChanged);
			}
			if state.name_error != name_error {
				state.name_error = name_error;
				notifications.push(AggregateEvent::ErrorsChanged);
			}
			for (id, vm) in gone_properties {
				vm.clear_editors();
				state.properties.shift_remove(&id);
				notifications.push(AggregateEvent::PropertyRemoved(id));
			}
			for (id, vm) in built_properties {
				state.properties.insert(id.clone(), vm);
				notifications.push(AggregateEvent::PropertyAdded(id));
			}
			// The index is rebuilt against the final member set in the same
			// transaction, so survivors gain and lose entries with the
			// declaring editors.
			let known = has_knowns.then(|| {
				let mut index = KnownPropertyIndex::new();
				for id in state.properties.keys() {
					if let Some(key) = known_map.get(id) {
						index.insert(key.clone(), id.clone());
					}
				}
				index
			});
			state.known = known;
			for (id, vm) in gone_events {
				vm.clear_editors();
				state.events.shift_remove(&id);
				notifications.push(AggregateEvent::EventRemoved(id));
			}
			for (id, vm) in built_events {
				state.events.insert(id.clone(), vm);
				notifications.push(AggregateEvent::EventAdded(id));
			}
		}

		for notification in notifications {
			let _ = self.events_tx.send(notification);
		}
		self.bump();
	}

	fn clear_members(&self) {
		let mut notifications = Vec::new();
		{
			let mut state = self.state.write();
			let properties: Vec<_> = state.properties.drain(..).collect();
			for (id, vm) in properties {
				vm.clear_editors();
				notifications.push(AggregateEvent::PropertyRemoved(id));
			}
			let events: Vec<_> = state.events.drain(..).collect();
			for (id, vm) in events {
				vm.clear_editors();
				notifications.push(AggregateEvent::EventRemoved(id));
			}
			state.known = None;
			if state.type_name.take().is_some() {
				notifications.push(AggregateEvent::TypeNameChanged);
			}
			if state.object_name.take().is_some() {
				notifications.push(AggregateEvent::NameChanged);
			}
			state.name_read_only = true;
			if state.nameable {
				state.nameable = false;
				notifications.push(AggregateEvent::NameableChanged);
			}
			if state.name_error.take().is_some() {
				notifications.push(AggregateEvent::ErrorsChanged);
			}
		}
		for notification in notifications {
			let _ = self.events_tx.send(notification);
		}
		self.bump();
	}

	// ---- naming ----

	/// Renames the selected object through its naming capability. A write
	/// failure becomes the name-level error; the displayed name still tracks
	/// what the user entered so the UI stays consistent.
	pub async fn set_object_name(&self, name: impl Into<String>) {
		let name = name.into();
		let editor = {
			let state = self.state.read();
			state
				.entries
				.iter()
				.map(|entry| Arc::clone(&entry.editor))
				.find(|editor| editor.as_nameable().is_some())
		};
		let Some(editor) = editor else {
			return;
		};
		let Some(nameable) = editor.as_nameable() else {
			return;
		};
		let result = nameable.set_name(&name).await;

		let mut notifications = vec![AggregateEvent::NameChanged];
		{
			let mut state = self.state.write();
			state.object_name = Some(name);
			state.name_read_only = false;
			match result {
				Ok(()) => {
					if state.name_error.take().is_some() {
						notifications.push(AggregateEvent::ErrorsChanged);
					}
				}
				Err(error) => {
					state.name_error = Some(error.to_string());
					notifications.push(AggregateEvent::ErrorsChanged);
				}
			}
		}
		for notification in notifications {
			let _ = self.events_tx.send(notification);
		}
		self.bump();
	}

	fn bump(&self) {
		self.revision.send_modify(|revision| *revision += 1);
	}
}

fn multiple_objects_label(count: usize) -> String {
	format!("{count} objects selected")
}

fn multiple_types_label(count: usize) -> String {
	format!("{count} types selected")
}
