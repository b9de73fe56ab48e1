use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::event::Event;

/// Default bound on queued events between the receivers and the consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Create the bounded hand-off between receiver threads and the consumer.
///
/// Each receiver holds an [`EventSink`] clone; the consumer drains the
/// single [`EventQueue`]. Producers block briefly when the queue is full, so
/// no event is lost or delivered twice.
pub fn event_queue(capacity: usize) -> (EventSink, EventQueue) {
    let (tx, rx) = sync_channel(capacity.max(1));
    (EventSink { tx }, EventQueue { rx })
}

/// Producer half: enqueues classified events from a receiver thread.
#[derive(Clone)]
pub struct EventSink {
    tx: SyncSender<Event>,
}

impl EventSink {
    /// Enqueue one event. Returns `false` once the consumer is gone, which
    /// a receiver loop treats as its exit condition.
    pub fn push(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half: non-blocking drain of everything currently queued.
pub struct EventQueue {
    rx: Receiver<Event>,
}

impl EventQueue {
    /// Take every queued event without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn drain_on_empty_queue_does_not_block() {
        let (_sink, queue) = event_queue(4);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn events_from_one_producer_keep_their_order() {
        let (sink, queue) = event_queue(16);
        for i in 0..10 {
            assert!(sink.push(Event::Ack {
                detail: i.to_string()
            }));
        }

        let details: Vec<String> = queue
            .drain()
            .into_iter()
            .map(|event| match event {
                Event::Ack { detail } => detail,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(details, (0..10).map(|i| i.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn two_producers_lose_and_duplicate_nothing() {
        let (sink, queue) = event_queue(8);
        const PER_PRODUCER: usize = 500;

        let producers: Vec<_> = [Link::A, Link::B]
            .into_iter()
            .map(|tag| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        assert!(sink.push(Event::Ack {
                            detail: format!("{tag:?}-{i}"),
                        }));
                    }
                })
            })
            .collect();
        drop(sink);

        let mut seen = std::collections::HashSet::new();
        while seen.len() < 2 * PER_PRODUCER {
            for event in queue.drain() {
                let Event::Ack { detail } = event else {
                    panic!("unexpected event");
                };
                assert!(seen.insert(detail), "event delivered twice");
            }
        }

        for producer in producers {
            producer.join().unwrap();
        }
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn push_fails_once_consumer_is_dropped() {
        let (sink, queue) = event_queue(4);
        drop(queue);
        assert!(!sink.push(Event::Ack {
            detail: String::new()
        }));
    }

    #[derive(Debug, Clone, Copy)]
    enum Link {
        A,
        B,
    }
}
