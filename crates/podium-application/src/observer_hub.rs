//! Transport bridge between the event bus and connected observers.
//!
//! Each observer owns an unbounded channel of serialized envelopes. The hub
//! never blocks on an observer; a closed channel only removes that observer.

use podium_core::event::{Event, EventDispatcher, EventHandler, ReadyPayload};
use podium_core::{PodiumError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

/// A connected observer of one room.
#[derive(Debug)]
pub struct Observer {
    pub id: u64,
    pub room_id: String,
    /// JSON envelopes `{ "event": ..., "payload": ... }` in publish order.
    pub receiver: mpsc::UnboundedReceiver<String>,
}

#[derive(Debug)]
struct ObserverSender {
    id: u64,
    sender: mpsc::UnboundedSender<String>,
}

/// Fans published events out to the observers of the event's room.
#[derive(Debug, Default)]
pub struct ObserverHub {
    next_id: AtomicU64,
    rooms: RwLock<HashMap<String, Vec<ObserverSender>>>,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer and queues its `ready` envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ready` envelope cannot be serialized.
    pub fn connect(&self, room_id: &str) -> Result<Observer> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = mpsc::unbounded_channel();

        let ready = Event::Ready(ReadyPayload {
            room_id: room_id.to_string(),
        })
        .to_json()?;
        sender
            .send(ready)
            .map_err(|_| PodiumError::internal("observer channel closed before ready"))?;

        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        rooms
            .entry(room_id.to_string())
            .or_default()
            .push(ObserverSender { id, sender });

        tracing::info!(room_id, observer_id = id, "Observer connected");
        Ok(Observer {
            id,
            room_id: room_id.to_string(),
            receiver,
        })
    }

    /// Removes an observer. Returns `false` if it was not connected.
    pub fn disconnect(&self, room_id: &str, observer_id: u64) -> bool {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let Some(observers) = rooms.get_mut(room_id) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|observer| observer.id != observer_id);
        let removed = observers.len() != before;
        if observers.is_empty() {
            rooms.remove(room_id);
        }
        if removed {
            tracing::info!(room_id, observer_id, "Observer disconnected");
        }
        removed
    }

    pub fn observer_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms.get(room_id).map_or(0, Vec::len)
    }

    /// Sends one event to every observer of its room.
    ///
    /// Returns the number of observers reached.
    pub fn deliver(&self, event: &Event) -> Result<usize> {
        let room_id = event.room_id();
        if self.observer_count(room_id) == 0 {
            return Ok(0);
        }
        let envelope = event.to_json()?;

        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let Some(observers) = rooms.get_mut(room_id) else {
            return Ok(0);
        };
        observers.retain(|observer| match observer.sender.send(envelope.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(room_id, observer_id = observer.id, "Dropping closed observer");
                false
            }
        });
        let delivered = observers.len();
        if observers.is_empty() {
            rooms.remove(room_id);
        }
        Ok(delivered)
    }
}

impl EventHandler for ObserverHub {
    fn name(&self) -> &str {
        "observer_hub"
    }

    fn handle(&self, event: &Event, _dispatcher: &Arc<EventDispatcher>) -> Result<()> {
        self.deliver(event).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_core::event::{LeavePayload, ReactionPayload};
    use podium_core::reaction::Reaction;

    fn reaction(room_id: &str) -> Event {
        Event::Reaction(ReactionPayload {
            room_id: room_id.to_string(),
            bot_id: "b1".to_string(),
            reaction: Reaction::new("U+1F44F", "Nice", 1),
        })
    }

    #[test]
    fn test_connect_queues_ready() {
        let hub = ObserverHub::new();
        let mut observer = hub.connect("room-1").unwrap();
        assert_eq!(observer.id, 1);
        assert_eq!(
            observer.receiver.try_recv().unwrap(),
            r#"{"event":"ready","payload":{"roomId":"room-1"}}"#
        );
        assert_eq!(hub.observer_count("room-1"), 1);
    }

    #[test]
    fn test_delivers_only_to_the_event_room() {
        let hub = ObserverHub::new();
        let mut a = hub.connect("room-a").unwrap();
        let mut b = hub.connect("room-b").unwrap();
        a.receiver.try_recv().unwrap();
        b.receiver.try_recv().unwrap();

        assert_eq!(hub.deliver(&reaction("room-a")).unwrap(), 1);
        assert!(a.receiver.try_recv().unwrap().contains(r#""event":"reaction""#));
        assert!(b.receiver.try_recv().is_err());
    }

    #[test]
    fn test_closed_observer_is_dropped_without_affecting_others() {
        let hub = ObserverHub::new();
        let gone = hub.connect("room-1").unwrap();
        let mut alive = hub.connect("room-1").unwrap();
        drop(gone);

        assert_eq!(hub.deliver(&reaction("room-1")).unwrap(), 1);
        assert_eq!(hub.observer_count("room-1"), 1);
        alive.receiver.try_recv().unwrap();
        assert!(alive.receiver.try_recv().is_ok());
    }

    #[test]
    fn test_disconnect_prunes_empty_rooms() {
        let hub = ObserverHub::new();
        let observer = hub.connect("room-1").unwrap();
        assert!(!hub.disconnect("room-1", observer.id + 10));
        assert!(hub.disconnect("room-1", observer.id));
        assert!(!hub.disconnect("room-1", observer.id));
        assert_eq!(hub.observer_count("room-1"), 0);

        let leave = Event::Leave(LeavePayload {
            room_id: "room-1".to_string(),
            bot_id: "b1".to_string(),
            reason: "removed".to_string(),
        });
        assert_eq!(hub.deliver(&leave).unwrap(), 0);
    }
}
