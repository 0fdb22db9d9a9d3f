use crate::config::{DispatcherConfig, OverflowPolicy};
use crate::error::Result;
use crate::event::Event;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, error, warn};

/// A callback registered for one event type.
///
/// Listeners run on the dispatching task, one after another. A listener that
/// awaits a long operation (a whole dance script) holds up every later event.
#[async_trait]
pub trait EventListener: Send + Sync {
	async fn on_event(&self, event: &Event) -> Result<()>;
}

/// Adapter so plain closures can be registered as listeners
struct FnListener<F>(F);

#[async_trait]
impl<F> EventListener for FnListener<F>
where
	F: Fn(&Event) -> Result<()> + Send + Sync,
{
	async fn on_event(&self, event: &Event) -> Result<()> {
		(self.0)(event)
	}
}

/// Outcome of one `handle_events` batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleReport {
	pub handled: usize,
	pub dropped: usize,
	pub pending: usize,
}

/// Bounded FIFO of pending events plus a listener registry.
///
/// Producers (timeline ticks, transport callbacks) call [`send_event`](Self::send_event)
/// from any task; exactly one driver calls [`handle_events`](Self::handle_events).
pub struct EventDispatcher {
	config: DispatcherConfig,
	queue: Mutex<VecDeque<Event>>,
	listeners: RwLock<HashMap<String, Vec<Arc<dyn EventListener>>>>,
}

impl EventDispatcher {
	pub fn new(config: DispatcherConfig) -> Self {
		Self {
			config,
			queue: Mutex::new(VecDeque::new()),
			listeners: RwLock::new(HashMap::new()),
		}
	}

	pub fn config(&self) -> &DispatcherConfig {
		&self.config
	}

	/// Append to the tail of the pending queue. Never blocks on listeners and never fails.
	pub fn send_event(&self, event: Event) {
		self.lock_queue().push_back(event);
	}

	/// Register a listener for an exact event type. Duplicates are kept and all fire.
	pub fn add_listener(&self, event_type: impl Into<String>, listener: Arc<dyn EventListener>) {
		let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
		listeners.entry(event_type.into()).or_default().push(listener);
	}

	pub fn add_listener_fn<F>(&self, event_type: impl Into<String>, listener: F)
	where
		F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
	{
		self.add_listener(event_type, Arc::new(FnListener(listener)));
	}

	pub fn listener_count(&self, event_type: &str) -> usize {
		self.listeners.read().unwrap_or_else(PoisonError::into_inner).get(event_type).map_or(0, Vec::len)
	}

	/// Number of events waiting for delivery
	pub fn pending(&self) -> usize {
		self.lock_queue().len()
	}

	/// Snapshot of the pending queue, head first
	pub fn pending_events(&self) -> Vec<Event> {
		self.lock_queue().iter().cloned().collect()
	}

	/// Deliver up to `events_per_tick` events from the head of the queue.
	///
	/// Each event goes to every listener registered for its type, in registration
	/// order. If a listener fails, the error is returned at once: the failing event
	/// and everything before it are consumed, the rest of the batch stays queued.
	pub async fn handle_events(&self) -> Result<HandleReport> {
		// Only this consumer removes from the head, so the first `len` events stay put
		// while producers append behind them.
		let batch: Vec<Event> = self.lock_queue().iter().take(self.config.events_per_tick).cloned().collect();

		let mut handled = 0;
		for event in &batch {
			for listener in self.listeners_for(event.event_type()) {
				if let Err(e) = listener.on_event(event).await {
					error!("Listener for '{}' failed on {}: {}", event.event_type(), event, e);
					self.lock_queue().drain(..=handled);
					return Err(e);
				}
			}
			handled += 1;
			debug!("Handled {}", event);
		}

		let mut queue = self.lock_queue();
		queue.drain(..handled);
		let dropped = self.trim(&mut queue);

		Ok(HandleReport {
			handled,
			dropped,
			pending: queue.len(),
		})
	}

	fn trim(&self, queue: &mut VecDeque<Event>) -> usize {
		let limit = self.config.overflow_limit;
		if queue.len() <= limit {
			return 0;
		}

		let excess = queue.len() - limit;
		warn!("Event queue has overflowed ({} pending, limit {}); dropping {} events ({:?})", queue.len(), limit, excess, self.config.overflow_policy);

		match self.config.overflow_policy {
			OverflowPolicy::DropNewest => queue.truncate(limit),
			OverflowPolicy::DropOldest => {
				queue.drain(..excess);
			}
		}
		excess
	}

	fn listeners_for(&self, event_type: &str) -> Vec<Arc<dyn EventListener>> {
		self.listeners.read().unwrap_or_else(PoisonError::into_inner).get(event_type).cloned().unwrap_or_default()
	}

	fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Event>> {
		self.queue.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for EventDispatcher {
	fn default() -> Self {
		Self::new(DispatcherConfig::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ChoreoError;

	fn recorder(dispatcher: &EventDispatcher, event_type: &str, tag: &'static str, log: &Arc<Mutex<Vec<String>>>) {
		let log = Arc::clone(log);
		dispatcher.add_listener_fn(event_type, move |event| {
			log.lock().unwrap().push(format!("{tag}:{}", event.event_type()));
			Ok(())
		});
	}

	fn types(events: &[Event]) -> Vec<&str> {
		events.iter().map(Event::event_type).collect()
	}

	#[tokio::test]
	async fn test_fifo_batching() {
		let dispatcher = EventDispatcher::new(DispatcherConfig::new(3, 100));
		let log = Arc::new(Mutex::new(Vec::new()));

		for i in 1..=10 {
			recorder(&dispatcher, &format!("e{i}"), "l", &log);
			dispatcher.send_event(Event::new(format!("e{i}"), "test"));
		}

		for _ in 0..3 {
			let report = dispatcher.handle_events().await.unwrap();
			assert_eq!(report.handled, 3);
		}

		let expected: Vec<String> = (1..=9).map(|i| format!("l:e{i}")).collect();
		assert_eq!(*log.lock().unwrap(), expected);
		assert_eq!(types(&dispatcher.pending_events()), vec!["e10"]);
	}

	#[tokio::test]
	async fn test_listeners_fire_in_registration_order() {
		let dispatcher = EventDispatcher::default();
		let log = Arc::new(Mutex::new(Vec::new()));

		recorder(&dispatcher, "dance", "first", &log);
		recorder(&dispatcher, "dance", "second", &log);
		recorder(&dispatcher, "dance", "first", &log);
		assert_eq!(dispatcher.listener_count("dance"), 3);

		dispatcher.send_event(Event::new("dance", "test"));
		dispatcher.handle_events().await.unwrap();

		assert_eq!(*log.lock().unwrap(), vec!["first:dance", "second:dance", "first:dance"]);
	}

	#[tokio::test]
	async fn test_unknown_event_type_is_consumed() {
		let dispatcher = EventDispatcher::default();
		dispatcher.send_event(Event::new("nobody_listens", "test"));

		let report = dispatcher.handle_events().await.unwrap();
		assert_eq!(report, HandleReport { handled: 1, dropped: 0, pending: 0 });
		assert_eq!(dispatcher.listener_count("nobody_listens"), 0);
	}

	#[tokio::test]
	async fn test_overflow_drops_newest() {
		let dispatcher = EventDispatcher::new(DispatcherConfig::new(1, 5));
		for i in 0..12 {
			dispatcher.send_event(Event::new(format!("e{i}"), "test"));
		}

		let report = dispatcher.handle_events().await.unwrap();
		assert_eq!(report.handled, 1);
		assert_eq!(report.dropped, 6);
		assert_eq!(report.pending, 5);
		assert_eq!(types(&dispatcher.pending_events()), vec!["e1", "e2", "e3", "e4", "e5"]);
	}

	#[tokio::test]
	async fn test_overflow_drop_oldest_policy() {
		let config = DispatcherConfig::new(1, 5).with_overflow_policy(OverflowPolicy::DropOldest);
		let dispatcher = EventDispatcher::new(config);
		for i in 0..12 {
			dispatcher.send_event(Event::new(format!("e{i}"), "test"));
		}

		let report = dispatcher.handle_events().await.unwrap();
		assert_eq!(report.dropped, 6);
		assert_eq!(types(&dispatcher.pending_events()), vec!["e7", "e8", "e9", "e10", "e11"]);
	}

	#[tokio::test]
	async fn test_queue_at_limit_is_not_trimmed() {
		let dispatcher = EventDispatcher::new(DispatcherConfig::new(2, 3));
		for i in 0..5 {
			dispatcher.send_event(Event::new(format!("e{i}"), "test"));
		}

		let report = dispatcher.handle_events().await.unwrap();
		assert_eq!(report, HandleReport { handled: 2, dropped: 0, pending: 3 });
	}

	#[tokio::test]
	async fn test_failing_listener_stops_the_batch() {
		let dispatcher = EventDispatcher::new(DispatcherConfig::new(10, 100));
		let log = Arc::new(Mutex::new(Vec::new()));

		recorder(&dispatcher, "a", "ok", &log);
		dispatcher.add_listener_fn("b", |_| Err(ChoreoError::Listener("stage door jammed".into())));
		recorder(&dispatcher, "b", "after_failure", &log);
		recorder(&dispatcher, "c", "ok", &log);

		for name in ["a", "b", "c"] {
			dispatcher.send_event(Event::new(name, "test"));
		}

		let err = dispatcher.handle_events().await.unwrap_err();
		assert!(matches!(err, ChoreoError::Listener(_)));
		assert_eq!(*log.lock().unwrap(), vec!["ok:a"]);
		assert_eq!(types(&dispatcher.pending_events()), vec!["c"]);

		dispatcher.handle_events().await.unwrap();
		assert_eq!(*log.lock().unwrap(), vec!["ok:a", "ok:c"]);
	}

	#[tokio::test]
	async fn test_events_sent_during_dispatch_wait_for_next_batch() {
		let dispatcher = Arc::new(EventDispatcher::new(DispatcherConfig::new(10, 100)));
		let producer = Arc::clone(&dispatcher);
		dispatcher.add_listener_fn("first", move |_| {
			producer.send_event(Event::new("second", "listener"));
			Ok(())
		});

		dispatcher.send_event(Event::new("first", "test"));
		let report = dispatcher.handle_events().await.unwrap();

		assert_eq!(report.handled, 1);
		assert_eq!(types(&dispatcher.pending_events()), vec!["second"]);
	}
}
