//! Publish/subscribe plumbing for the state holders
//!
//! A [`ChangeHub`] fans an event out to every live [`Subscription`] over
//! unbounded crossbeam channels. Subscribers that have been dropped are pruned
//! on the next publish, so holders never need explicit unsubscription.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::sync::{Mutex, PoisonError};

/// Change notifications broadcast by the state holders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// A problem instance finished loading
    ProblemLoaded,
    /// The problem instance was unloaded
    ProblemUnloaded,
    /// The analysis handle was created, replaced or dropped
    AnalysisReplaced,
    /// Analysis results changed (a function was sampled)
    AnalysisDataChanged,
    /// The `analysing` projection flipped
    AnalysingChanged(bool),
    /// Temporary variable bounds changed
    BoundsChanged,
    /// Analysis settings or histogram bins changed
    SettingsChanged,
}

/// Fan-out point for events of type `E`
pub struct ChangeHub<E> {
    subscribers: Mutex<Vec<Sender<E>>>,
}

impl<E: Clone> Default for ChangeHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> ChangeHub<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription { receiver: rx }
    }

    /// Deliver `event` to every live subscriber, returning how many received it
    pub fn publish(&self, event: E) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Receiving end of a [`ChangeHub`]
pub struct Subscription<E> {
    receiver: Receiver<E>,
}

impl<E> Subscription<E> {
    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<E> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Receive all pending events
    pub fn drain(&self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until an event arrives or the timeout expires
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<E> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let hub = ChangeHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        assert_eq!(hub.publish(StateEvent::ProblemLoaded), 2);
        assert_eq!(a.try_recv(), Some(StateEvent::ProblemLoaded));
        assert_eq!(b.drain(), vec![StateEvent::ProblemLoaded]);
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn test_dropped_subscribers_pruned() {
        let hub = ChangeHub::new();
        let keep = hub.subscribe();
        {
            let _gone = hub.subscribe();
            assert_eq!(hub.subscriber_count(), 2);
        }
        assert_eq!(hub.publish(StateEvent::BoundsChanged), 1);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(keep.drain().len(), 1);
    }

    #[test]
    fn test_events_keep_order() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe();
        hub.publish(StateEvent::AnalysingChanged(true));
        hub.publish(StateEvent::AnalysisDataChanged);
        hub.publish(StateEvent::AnalysingChanged(false));
        assert_eq!(
            sub.drain(),
            vec![
                StateEvent::AnalysingChanged(true),
                StateEvent::AnalysisDataChanged,
                StateEvent::AnalysingChanged(false),
            ]
        );
    }
}
