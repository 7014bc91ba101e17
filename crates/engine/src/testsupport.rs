//! Scripted editors and providers shared by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use facet_contracts::{
	AvailabilityConstraint, CompleteValues, EditingHost, EditorError, EditorEvent, EditorProvider, EvaluateConstraints,
	EventDescriptor, EventId, KnownPropertyKey, Nameable, NavigateToSource, ObjectEditor, PropertyDescriptor, PropertyId,
	PropertyVariation, SourceKind, TargetObject, ValueSnapshot,
};

/// Fully scripted in-memory editor. Capabilities are opt-in so each test
/// only wires up what it exercises.
pub struct MockEditor {
	target: TargetObject,
	type_name: String,
	properties: Mutex<Vec<Arc<PropertyDescriptor>>>,
	events: Mutex<Vec<Arc<EventDescriptor>>>,
	knowns: Mutex<Vec<(KnownPropertyKey, PropertyId)>>,
	values: Mutex<HashMap<PropertyId, ValueSnapshot>>,
	writes: Mutex<Vec<(PropertyId, ValueSnapshot)>>,
	fail_writes: AtomicBool,
	fail_reads: AtomicBool,
	handlers: Mutex<HashMap<EventId, Vec<String>>>,
	notifications: broadcast::Sender<EditorEvent>,

	nameable: AtomicBool,
	name: Mutex<Option<String>>,
	fail_set_name: AtomicBool,

	completer: AtomicBool,
	completions: Mutex<Vec<String>>,
	completion_delay: Mutex<Option<Duration>>,

	constrained: AtomicBool,
	unavailable_keys: Mutex<HashSet<String>>,
	fail_constraints: AtomicBool,

	navigator: AtomicBool,
	navigations: AtomicUsize,
}

impl MockEditor {
	pub fn new(type_name: &str, properties: Vec<Arc<PropertyDescriptor>>) -> Arc<Self> {
		let (notifications, _) = broadcast::channel(64);
		Arc::new(Self {
			target: TargetObject::new(type_name.to_owned()),
			type_name: type_name.to_owned(),
			properties: Mutex::new(properties),
			events: Mutex::new(Vec::new()),
			knowns: Mutex::new(Vec::new()),
			values: Mutex::new(HashMap::new()),
			writes: Mutex::new(Vec::new()),
			fail_writes: AtomicBool::new(false),
			fail_reads: AtomicBool::new(false),
			handlers: Mutex::new(HashMap::new()),
			notifications,
			nameable: AtomicBool::new(false),
			name: Mutex::new(None),
			fail_set_name: AtomicBool::new(false),
			completer: AtomicBool::new(false),
			completions: Mutex::new(Vec::new()),
			completion_delay: Mutex::new(None),
			constrained: AtomicBool::new(false),
			unavailable_keys: Mutex::new(HashSet::new()),
			fail_constraints: AtomicBool::new(false),
			navigator: AtomicBool::new(false),
			navigations: AtomicUsize::new(0),
		})
	}

	// ---- scripting ----

	pub fn seed_value(&self, property: &PropertyId, snapshot: ValueSnapshot) {
		self.values.lock().insert(property.clone(), snapshot);
	}

	pub fn seed_events(&self, events: Vec<Arc<EventDescriptor>>) {
		*self.events.lock() = events;
	}

	pub fn seed_handlers(&self, event: &EventId, handlers: Vec<&str>) {
		self.handlers
			.lock()
			.insert(event.clone(), handlers.into_iter().map(str::to_owned).collect());
	}

	pub fn declare_known(&self, key: KnownPropertyKey, property: PropertyId) {
		self.knowns.lock().push((key, property));
	}

	pub fn fail_writes(&self) {
		self.fail_writes.store(true, Ordering::SeqCst);
	}

	pub fn allow_writes(&self) {
		self.fail_writes.store(false, Ordering::SeqCst);
	}

	pub fn fail_reads(&self) {
		self.fail_reads.store(true, Ordering::SeqCst);
	}

	pub fn enable_naming(&self, name: Option<&str>) {
		self.nameable.store(true, Ordering::SeqCst);
		*self.name.lock() = name.map(str::to_owned);
	}

	pub fn fail_renames(&self) {
		self.fail_set_name.store(true, Ordering::SeqCst);
	}

	pub fn enable_completion(&self, suggestions: Vec<&str>) {
		self.completer.store(true, Ordering::SeqCst);
		*self.completions.lock() = suggestions.into_iter().map(str::to_owned).collect();
	}

	/// Makes completion queries sleep before answering, to script orderings.
	pub fn delay_completions(&self, delay: Duration) {
		*self.completion_delay.lock() = Some(delay);
	}

	pub fn enable_constraints(&self) {
		self.constrained.store(true, Ordering::SeqCst);
	}

	pub fn mark_unavailable(&self, key: &str) {
		self.unavailable_keys.lock().insert(key.to_owned());
	}

	pub fn fail_constraints(&self) {
		self.fail_constraints.store(true, Ordering::SeqCst);
	}

	pub fn enable_navigation(&self) {
		self.navigator.store(true, Ordering::SeqCst);
	}

	// ---- observation ----

	pub fn recorded_writes(&self) -> Vec<(PropertyId, ValueSnapshot)> {
		self.writes.lock().clone()
	}

	pub fn write_count(&self) -> usize {
		self.writes.lock().len()
	}

	pub fn recorded_name(&self) -> Option<String> {
		self.name.lock().clone()
	}

	pub fn navigation_count(&self) -> usize {
		self.navigations.load(Ordering::SeqCst)
	}

	// ---- stimuli ----

	pub fn replace_properties(&self, properties: Vec<Arc<PropertyDescriptor>>) {
		*self.properties.lock() = properties;
		let _ = self.notifications.send(EditorEvent::MembersChanged);
	}

	pub fn notify_changed(&self, property: Option<PropertyId>) {
		let _ = self.notifications.send(EditorEvent::PropertyChanged(property));
	}
}

#[async_trait]
impl ObjectEditor for MockEditor {
	fn target(&self) -> &TargetObject {
		&self.target
	}

	fn type_name(&self) -> String {
		self.type_name.clone()
	}

	fn properties(&self) -> Vec<Arc<PropertyDescriptor>> {
		self.properties.lock().clone()
	}

	fn events(&self) -> Vec<Arc<EventDescriptor>> {
		self.events.lock().clone()
	}

	fn known_properties(&self) -> Vec<(KnownPropertyKey, PropertyId)> {
		self.knowns.lock().clone()
	}

	fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
		self.notifications.subscribe()
	}

	async fn value(&self, property: &PropertyDescriptor, _variation: Option<&PropertyVariation>) -> Result<ValueSnapshot, EditorError> {
		if self.fail_reads.load(Ordering::SeqCst) {
			return Err(EditorError::failed("scripted read failure"));
		}
		Ok(self
			.values
			.lock()
			.get(&property.id)
			.cloned()
			.unwrap_or_else(|| ValueSnapshot::neutral(property.kind, SourceKind::Default)))
	}

	async fn set_value(&self, property: &PropertyDescriptor, snapshot: ValueSnapshot) -> Result<(), EditorError> {
		if self.fail_writes.load(Ordering::SeqCst) {
			return Err(EditorError::failed("scripted write failure"));
		}
		self.writes.lock().push((property.id.clone(), snapshot.clone()));
		self.values.lock().insert(property.id.clone(), snapshot);
		self.notify_changed(Some(property.id.clone()));
		Ok(())
	}

	async fn event_handlers(&self, event: &EventDescriptor) -> Result<Vec<String>, EditorError> {
		Ok(self.handlers.lock().get(&event.id).cloned().unwrap_or_default())
	}

	fn as_nameable(&self) -> Option<&dyn Nameable> {
		self.nameable.load(Ordering::SeqCst).then_some(self as &dyn Nameable)
	}

	fn as_completer(&self) -> Option<&dyn CompleteValues> {
		self.completer.load(Ordering::SeqCst).then_some(self as &dyn CompleteValues)
	}

	fn as_constrained(&self) -> Option<&dyn EvaluateConstraints> {
		self.constrained.load(Ordering::SeqCst).then_some(self as &dyn EvaluateConstraints)
	}

	fn as_navigator(&self) -> Option<&dyn NavigateToSource> {
		self.navigator.load(Ordering::SeqCst).then_some(self as &dyn NavigateToSource)
	}
}

#[async_trait]
impl Nameable for MockEditor {
	async fn name(&self) -> Result<Option<String>, EditorError> {
		Ok(self.name.lock().clone())
	}

	async fn set_name(&self, name: &str) -> Result<(), EditorError> {
		if self.fail_set_name.load(Ordering::SeqCst) {
			return Err(EditorError::failed("scripted rename failure"));
		}
		*self.name.lock() = Some(name.to_owned());
		Ok(())
	}
}

#[async_trait]
impl CompleteValues for MockEditor {
	async fn completions(&self, _property: &PropertyDescriptor, probe: &str, cancel: CancellationToken) -> Result<Vec<String>, EditorError> {
		let delay = *self.completion_delay.lock();
		if let Some(delay) = delay {
			tokio::select! {
				_ = tokio::time::sleep(delay) => {}
				_ = cancel.cancelled() => return Ok(Vec::new()),
			}
		}
		Ok(self
			.completions
			.lock()
			.iter()
			.filter(|suggestion| suggestion.starts_with(probe))
			.cloned()
			.collect())
	}
}

#[async_trait]
impl EvaluateConstraints for MockEditor {
	async fn is_available(&self, constraint: &AvailabilityConstraint) -> Result<bool, EditorError> {
		if self.fail_constraints.load(Ordering::SeqCst) {
			return Err(EditorError::failed("scripted constraint failure"));
		}
		Ok(!self.unavailable_keys.lock().contains(&constraint.key))
	}
}

impl NavigateToSource for MockEditor {
	fn can_navigate(&self) -> bool {
		true
	}

	fn navigate(&self) {
		self.navigations.fetch_add(1, Ordering::SeqCst);
	}
}

/// Provider mapping registered targets to their scripted editors.
#[derive(Default)]
pub struct MockProvider {
	editors: Mutex<HashMap<TargetObject, Arc<dyn ObjectEditor>>>,
	failing: Mutex<HashSet<TargetObject>>,
}

impl MockProvider {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn register(&self, editor: &Arc<MockEditor>) {
		self.editors
			.lock()
			.insert(editor.target().clone(), Arc::clone(editor) as Arc<dyn ObjectEditor>);
	}

	/// Makes resolution of `target` fail outright.
	pub fn refuse(&self, target: &TargetObject) {
		self.failing.lock().insert(target.clone());
	}
}

#[async_trait]
impl EditorProvider for MockProvider {
	async fn object_editor(&self, target: &TargetObject) -> Result<Option<Arc<dyn ObjectEditor>>, EditorError> {
		if self.failing.lock().contains(target) {
			return Err(EditorError::failed("scripted resolution failure"));
		}
		Ok(self.editors.lock().get(target).cloned())
	}
}

/// Host wired to `provider`, with custom expressions enabled.
pub fn host(provider: Arc<MockProvider>) -> Arc<EditingHost> {
	let mut host = EditingHost::new(provider as Arc<dyn EditorProvider>);
	host.supports_custom_expressions = true;
	Arc::new(host)
}
