//! Browser `EventSource` stream and `setTimeout` scheduler.

use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::set_timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventSource};

use super::{ChannelError, PushSignal, PushTransport, Scheduler};
use crate::config::ROUTING_UPDATED_EVENT;

/// Opens `EventSource` streams listening for `routing_updated`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventSourceTransport;

/// An open stream together with the callbacks registered on it.
pub struct EventSourceConnection {
	source: EventSource,
	callbacks: Vec<Closure<dyn FnMut(Event)>>,
}

impl PushTransport for EventSourceTransport {
	type Connection = EventSourceConnection;

	fn open(
		&self,
		url: &str,
		on_signal: Rc<dyn Fn(PushSignal)>,
	) -> Result<EventSourceConnection, ChannelError> {
		let source = EventSource::new(url).map_err(|e| ChannelError::Open(format!("{e:?}")))?;

		let signal = on_signal.clone();
		let on_open = Closure::<dyn FnMut(Event)>::new(move |_: Event| signal(PushSignal::Opened));
		source.set_onopen(Some(on_open.as_ref().unchecked_ref()));

		let signal = on_signal.clone();
		let on_update = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			signal(PushSignal::Event(ROUTING_UPDATED_EVENT.to_string()))
		});
		let listening = source
			.add_event_listener_with_callback(ROUTING_UPDATED_EVENT, on_update.as_ref().unchecked_ref());

		let signal = on_signal;
		let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| signal(PushSignal::Error));
		source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

		let connection = EventSourceConnection {
			source,
			callbacks: vec![on_open, on_update, on_error],
		};

		if let Err(e) = listening {
			self.close(connection);
			return Err(ChannelError::Open(format!("{e:?}")));
		}
		Ok(connection)
	}

	fn close(&self, connection: EventSourceConnection) {
		connection.source.close();
		connection.source.set_onopen(None);
		connection.source.set_onerror(None);
		// `close` usually runs from inside one of these callbacks; free them on a later tick.
		let EventSourceConnection { source, callbacks } = connection;
		set_timeout(move || drop((source, callbacks)), Duration::ZERO);
	}
}

/// Schedules tasks with `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerScheduler;

impl Scheduler for TimerScheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
		set_timeout(task, delay);
	}
}
