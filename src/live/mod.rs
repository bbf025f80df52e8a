//! Live-update channel: a server-push subscription that triggers refreshes.
//!
//! Lifecycle per credential session:
//!
//! ```text
//! Disconnected -> Connecting -> Connected --(routing_updated)--> Connected + refresh
//!                    |              |
//!                    +---(error)----+--> PendingReconnect --(5s)--> Connecting ...
//!                                                  |
//!                                                  +--(5 attempts spent)--> Exhausted
//! ```
//!
//! The attempt counter only resets when a new credential session starts.
//! Every connect and every teardown bumps an epoch; callbacks and timers
//! carrying an older epoch are ignored, so nothing outlives a teardown.

pub mod web;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{Endpoints, MAX_RECONNECTS, RECONNECT_DELAY, ROUTING_UPDATED_EVENT};

/// Where the channel is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
	/// No stream and nothing scheduled.
	#[default]
	Disconnected,
	/// Stream opened, waiting for the server.
	Connecting,
	/// Stream open and delivering events.
	Connected,
	/// Stream dropped; a reconnect is scheduled.
	PendingReconnect,
	/// Reconnect budget spent; only a new credential session restarts it.
	Exhausted,
}

/// What a push connection reports back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushSignal {
	/// The stream is live.
	Opened,
	/// A named server event arrived.
	Event(String),
	/// The stream failed or was dropped.
	Error,
}

/// Why a stream could not be opened.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
	/// The subscribe URL could not be built.
	#[error("invalid subscribe url: {0}")]
	Url(String),
	/// The transport refused to open the stream.
	#[error("could not open stream: {0}")]
	Open(String),
}

/// Opens server-push streams.
pub trait PushTransport {
	/// Handle for an open stream, returned to [`PushTransport::close`].
	type Connection: 'static;

	/// Open a stream at `url`, reporting its signals to `on_signal`.
	fn open(
		&self,
		url: &str,
		on_signal: Rc<dyn Fn(PushSignal)>,
	) -> Result<Self::Connection, ChannelError>;

	/// Close a stream; its handler must not fire afterwards.
	fn close(&self, connection: Self::Connection);
}

/// Runs a task once after a delay. Faked in tests.
pub trait Scheduler {
	/// Run `task` once after `delay`.
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

struct Session<C> {
	credential: Option<String>,
	connection: Option<C>,
	state: ChannelState,
	attempts: u32,
	epoch: u64,
}

struct Inner<T: PushTransport, S> {
	transport: T,
	scheduler: S,
	endpoints: Endpoints,
	on_refresh: Box<dyn Fn()>,
	session: RefCell<Session<T::Connection>>,
}

/// Handle to the live-update channel. Cloning shares the same channel.
pub struct LiveUpdates<T: PushTransport, S> {
	inner: Rc<Inner<T, S>>,
}

impl<T: PushTransport, S> Clone for LiveUpdates<T, S> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: PushTransport + 'static, S: Scheduler + 'static> LiveUpdates<T, S> {
	/// Channel that calls `on_refresh` on each update notification. Starts disconnected.
	pub fn new(
		transport: T,
		scheduler: S,
		endpoints: Endpoints,
		on_refresh: impl Fn() + 'static,
	) -> Self {
		Self {
			inner: Rc::new(Inner {
				transport,
				scheduler,
				endpoints,
				on_refresh: Box::new(on_refresh),
				session: RefCell::new(Session {
					credential: None,
					connection: None,
					state: ChannelState::Disconnected,
					attempts: 0,
					epoch: 0,
				}),
			}),
		}
	}

	/// Current lifecycle state.
	pub fn state(&self) -> ChannelState {
		self.inner.session.borrow().state
	}

	/// Reconnect attempts scheduled in the current credential session.
	pub fn attempts(&self) -> u32 {
		self.inner.session.borrow().attempts
	}

	/// Whether a stream is currently held.
	pub fn is_connected(&self) -> bool {
		self.inner.session.borrow().connection.is_some()
	}

	/// Start a fresh session for `credential`, or just tear down on `None`.
	pub fn set_credential(&self, credential: Option<String>) {
		self.teardown();
		let Some(credential) = credential.filter(|c| !c.is_empty()) else {
			return;
		};
		{
			let mut session = self.inner.session.borrow_mut();
			session.credential = Some(credential);
			session.attempts = 0;
		}
		self.connect();
	}

	/// Close any open stream and cancel pending reconnects. Safe to call at any point.
	pub fn teardown(&self) {
		let connection = {
			let mut session = self.inner.session.borrow_mut();
			session.epoch += 1;
			session.credential = None;
			session.state = ChannelState::Disconnected;
			session.connection.take()
		};
		if let Some(connection) = connection {
			debug!("flow-suite: closing live-update stream");
			self.inner.transport.close(connection);
		}
	}

	/// Open a stream for the current credential. No-op without a credential or
	/// while a stream is already held.
	pub fn connect(&self) {
		let (url, epoch) = {
			let mut session = self.inner.session.borrow_mut();
			if session.connection.is_some() {
				return;
			}
			let Some(credential) = session.credential.as_deref() else {
				return;
			};
			let url = self
				.inner
				.endpoints
				.subscribe_url(credential)
				.map_err(|e| ChannelError::Url(e.to_string()));
			session.epoch += 1;
			session.state = ChannelState::Connecting;
			(url, session.epoch)
		};

		let weak = Rc::downgrade(&self.inner);
		let on_signal: Rc<dyn Fn(PushSignal)> = Rc::new(move |signal| {
			if let Some(live) = Self::upgrade(&weak) {
				live.handle(epoch, signal);
			}
		});

		match url.and_then(|url| self.inner.transport.open(&url, on_signal)) {
			Ok(connection) => {
				let mut session = self.inner.session.borrow_mut();
				if session.epoch == epoch {
					session.connection = Some(connection);
				} else {
					drop(session);
					self.inner.transport.close(connection);
				}
			}
			Err(err) => {
				warn!("flow-suite: live-update stream failed to open: {err}");
				self.on_transport_error(epoch);
			}
		}
	}

	fn upgrade(weak: &Weak<Inner<T, S>>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}

	fn handle(&self, epoch: u64, signal: PushSignal) {
		{
			let mut session = self.inner.session.borrow_mut();
			if session.epoch != epoch || session.connection.is_none() {
				return;
			}
			if signal == PushSignal::Opened {
				session.state = ChannelState::Connected;
				info!("flow-suite: live-update stream connected");
				return;
			}
		}

		match signal {
			PushSignal::Event(name) if name == ROUTING_UPDATED_EVENT => {
				info!("flow-suite: {ROUTING_UPDATED_EVENT} received, refreshing");
				(self.inner.on_refresh)();
			}
			PushSignal::Event(name) => debug!("flow-suite: ignoring push event {name}"),
			PushSignal::Error => {
				warn!("flow-suite: live-update stream dropped");
				self.on_transport_error(epoch);
			}
			PushSignal::Opened => {}
		}
	}

	fn on_transport_error(&self, epoch: u64) {
		let connection = {
			let mut session = self.inner.session.borrow_mut();
			if session.epoch != epoch {
				return;
			}
			session.connection.take()
		};
		if let Some(connection) = connection {
			self.inner.transport.close(connection);
		}

		let attempt = {
			let mut session = self.inner.session.borrow_mut();
			if session.attempts >= MAX_RECONNECTS {
				session.state = ChannelState::Exhausted;
				None
			} else {
				session.attempts += 1;
				session.state = ChannelState::PendingReconnect;
				Some(session.attempts)
			}
		};

		let Some(attempt) = attempt else {
			warn!("flow-suite: giving up on live updates after {MAX_RECONNECTS} reconnects");
			return;
		};

		debug!("flow-suite: reconnect attempt {attempt}/{MAX_RECONNECTS} scheduled");
		let weak = Rc::downgrade(&self.inner);
		self.inner.scheduler.schedule(
			RECONNECT_DELAY,
			Box::new(move || {
				let Some(live) = Self::upgrade(&weak) else {
					return;
				};
				if live.inner.session.borrow().epoch == epoch {
					live.connect();
				}
			}),
		);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	/// Records opened streams and keeps their signal handlers so tests can fire them.
	#[derive(Default)]
	struct FakeTransport {
		opened: RefCell<Vec<(String, Rc<dyn Fn(PushSignal)>)>>,
		closed: RefCell<Vec<usize>>,
		refuse: Cell<bool>,
	}

	impl PushTransport for Rc<FakeTransport> {
		type Connection = usize;

		fn open(
			&self,
			url: &str,
			on_signal: Rc<dyn Fn(PushSignal)>,
		) -> Result<usize, ChannelError> {
			if self.refuse.get() {
				return Err(ChannelError::Open("refused".into()));
			}
			let mut opened = self.opened.borrow_mut();
			opened.push((url.to_string(), on_signal));
			Ok(opened.len() - 1)
		}

		fn close(&self, connection: usize) {
			self.closed.borrow_mut().push(connection);
		}
	}

	impl FakeTransport {
		fn fire(&self, index: usize, signal: PushSignal) {
			let handler = self.opened.borrow()[index].1.clone();
			handler(signal);
		}

		fn opens(&self) -> usize {
			self.opened.borrow().len()
		}
	}

	/// Queues tasks instead of waiting; `run_next` advances virtual time.
	#[derive(Default)]
	struct FakeScheduler {
		queue: RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>,
		scheduled: Cell<usize>,
	}

	impl Scheduler for Rc<FakeScheduler> {
		fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
			self.scheduled.set(self.scheduled.get() + 1);
			self.queue.borrow_mut().push((delay, task));
		}
	}

	impl FakeScheduler {
		fn run_next(&self) -> Option<Duration> {
			let (delay, task) = {
				let mut queue = self.queue.borrow_mut();
				if queue.is_empty() {
					return None;
				}
				queue.remove(0)
			};
			task();
			Some(delay)
		}
	}

	struct Harness {
		transport: Rc<FakeTransport>,
		scheduler: Rc<FakeScheduler>,
		refreshes: Rc<Cell<usize>>,
		live: LiveUpdates<Rc<FakeTransport>, Rc<FakeScheduler>>,
	}

	fn harness() -> Harness {
		let transport = Rc::new(FakeTransport::default());
		let scheduler = Rc::new(FakeScheduler::default());
		let refreshes = Rc::new(Cell::new(0));
		let counter = refreshes.clone();
		let live = LiveUpdates::new(
			transport.clone(),
			scheduler.clone(),
			Endpoints {
				api_url: "https://api.test/routing".into(),
				sse_url: "https://api.test/subscribe".into(),
			},
			move || counter.set(counter.get() + 1),
		);
		Harness {
			transport,
			scheduler,
			refreshes,
			live,
		}
	}

	#[test]
	fn starts_disconnected_and_needs_a_credential() {
		let h = harness();
		assert_eq!(h.live.state(), ChannelState::Disconnected);
		h.live.connect();
		assert_eq!(h.transport.opens(), 0);
		h.live.set_credential(Some(String::new()));
		assert_eq!(h.transport.opens(), 0);
	}

	#[test]
	fn credential_opens_stream_with_token() {
		let h = harness();
		h.live.set_credential(Some("key with space".into()));
		assert_eq!(h.live.state(), ChannelState::Connecting);
		assert_eq!(
			h.transport.opened.borrow()[0].0,
			"https://api.test/subscribe?token=key+with+space"
		);
		h.transport.fire(0, PushSignal::Opened);
		assert_eq!(h.live.state(), ChannelState::Connected);
	}

	#[test]
	fn routing_updated_triggers_refresh_and_stays_connected() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.transport.fire(0, PushSignal::Opened);
		h.transport.fire(0, PushSignal::Event(ROUTING_UPDATED_EVENT.into()));
		h.transport.fire(0, PushSignal::Event("heartbeat".into()));
		h.transport.fire(0, PushSignal::Event(ROUTING_UPDATED_EVENT.into()));
		assert_eq!(h.refreshes.get(), 2);
		assert_eq!(h.live.state(), ChannelState::Connected);
	}

	#[test]
	fn connect_is_a_noop_while_a_stream_is_held() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.live.connect();
		h.live.connect();
		assert_eq!(h.transport.opens(), 1);
	}

	#[test]
	fn error_closes_stream_and_schedules_reconnect() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.transport.fire(0, PushSignal::Error);

		assert_eq!(*h.transport.closed.borrow(), vec![0]);
		assert!(!h.live.is_connected());
		assert_eq!(h.live.state(), ChannelState::PendingReconnect);
		assert_eq!(h.scheduler.run_next(), Some(RECONNECT_DELAY));
		assert_eq!(h.transport.opens(), 2);
		assert_eq!(h.live.state(), ChannelState::Connecting);
	}

	#[test]
	fn reconnects_are_bounded_at_five() {
		let h = harness();
		h.live.set_credential(Some("k".into()));

		for attempt in 0..5 {
			h.transport.fire(attempt, PushSignal::Error);
			assert_eq!(h.scheduler.run_next(), Some(Duration::from_millis(5000)));
		}
		assert_eq!(h.scheduler.scheduled.get(), 5);
		assert_eq!(h.transport.opens(), 6);

		h.transport.fire(5, PushSignal::Error);
		assert_eq!(h.scheduler.scheduled.get(), 5);
		assert_eq!(h.scheduler.run_next(), None);
		assert_eq!(h.live.state(), ChannelState::Exhausted);
	}

	#[test]
	fn successful_open_does_not_reset_the_budget() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.transport.fire(0, PushSignal::Error);
		h.scheduler.run_next();
		h.transport.fire(1, PushSignal::Opened);
		assert_eq!(h.live.attempts(), 1);
	}

	#[test]
	fn new_credential_session_resets_the_budget() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		for attempt in 0..6 {
			h.transport.fire(attempt, PushSignal::Error);
			h.scheduler.run_next();
		}
		assert_eq!(h.live.state(), ChannelState::Exhausted);

		h.live.set_credential(None);
		h.live.set_credential(Some("k2".into()));
		assert_eq!(h.live.attempts(), 0);
		assert_eq!(h.transport.opens(), 7);
	}

	#[test]
	fn teardown_cancels_pending_reconnect() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.transport.fire(0, PushSignal::Error);
		h.live.teardown();

		assert_eq!(h.scheduler.run_next(), Some(RECONNECT_DELAY));
		assert_eq!(h.transport.opens(), 1);
		assert_eq!(h.live.state(), ChannelState::Disconnected);
	}

	#[test]
	fn teardown_closes_open_stream_and_silences_it() {
		let h = harness();
		h.live.set_credential(Some("k".into()));
		h.live.teardown();
		assert_eq!(*h.transport.closed.borrow(), vec![0]);

		h.transport.fire(0, PushSignal::Event(ROUTING_UPDATED_EVENT.into()));
		h.transport.fire(0, PushSignal::Error);
		assert_eq!(h.refreshes.get(), 0);
		assert_eq!(h.scheduler.scheduled.get(), 0);
	}

	#[test]
	fn teardown_before_any_connection_is_harmless() {
		let h = harness();
		h.live.teardown();
		h.live.set_credential(None);
		assert!(h.transport.closed.borrow().is_empty());
	}

	#[test]
	fn failed_open_counts_as_transport_error() {
		let h = harness();
		h.transport.refuse.set(true);
		h.live.set_credential(Some("k".into()));
		assert_eq!(h.live.state(), ChannelState::PendingReconnect);
		assert_eq!(h.live.attempts(), 1);

		h.transport.refuse.set(false);
		h.scheduler.run_next();
		assert!(h.live.is_connected());
	}
}
