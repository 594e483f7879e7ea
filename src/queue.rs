// src/queue.rs

//! Unbounded single-producer/single-consumer queue.
//!
//! The queue is a singly linked list of heap nodes that starts with a stub
//! node. The producer appends behind its private tail pointer and publishes
//! the new node with a release store; the consumer follows `next` pointers
//! from its private head with acquire loads. Neither side takes a lock and
//! `push` never blocks or fails.
//!
//! The single-producer/single-consumer contract is carried by the types:
//! [`spsc_queue`] returns exactly one [`Producer`] and one [`Consumer`],
//! neither is `Clone` nor `Sync`, and both are `Send`.
//!
//! # Safety
//!
//! Nodes hold `MaybeUninit<T>` and are linked through `AtomicPtr`.
//! Safety invariants:
//! - Only the producer writes a node's `next` (the node behind `tail`)
//! - Only the consumer reads and moves `head`
//! - A node's value is written before the release store that links it
//! - A value is read once, with `assume_init_read`, when its node becomes the stub
//! - The stub's value is never dropped (never written, or already moved out)
//! - A node is freed only after the consumer has moved past it

use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Arc;

struct Node<T> {
    value: MaybeUninit<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn alloc(value: MaybeUninit<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            value,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

struct Inner<T> {
    /// Stub node; its `next` is the oldest pending value. Consumer only.
    head: UnsafeCell<*mut Node<T>>,
    producer_alive: AtomicBool,
    consumer_alive: AtomicBool,
    _owns: PhantomData<T>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // Both halves are gone. The stub's value was either never written
        // or already moved out by `try_pop`; every later node is still live.
        let mut node = *self.head.get_mut();
        let mut is_stub = true;
        while !node.is_null() {
            // SAFETY: every node was created by `Node::alloc` and is
            // reachable exactly once from the head chain.
            let mut boxed = unsafe { Box::from_raw(node) };
            if !is_stub {
                // SAFETY: non-stub nodes hold an initialised, unpopped value.
                unsafe { boxed.value.assume_init_drop() };
            }
            is_stub = false;
            node = *boxed.next.get_mut();
        }
    }
}

/// Creates a connected producer/consumer pair.
pub fn spsc_queue<T>() -> (Producer<T>, Consumer<T>) {
    let stub = Node::alloc(MaybeUninit::uninit());
    let inner = Arc::new(Inner {
        head: UnsafeCell::new(stub),
        producer_alive: AtomicBool::new(true),
        consumer_alive: AtomicBool::new(true),
        _owns: PhantomData,
    });
    (
        Producer {
            inner: Arc::clone(&inner),
            tail: Cell::new(stub),
        },
        Consumer { inner },
    )
}

/// The sending half. Owned by the thread that produces values.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
    tail: Cell<*mut Node<T>>,
}

// SAFETY: the producer only touches its private tail and the `next` field of
// the node behind it. Moving it to another thread moves that exclusive access
// along with it. It is not `Sync` (`Cell`), so `push` never races itself.
unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
    /// Appends `value` at the tail. Never blocks and never fails.
    ///
    /// If the consumer is already gone the value stays queued and is dropped
    /// together with the queue.
    pub fn push(&self, value: T) {
        let node = Node::alloc(MaybeUninit::new(value));
        let tail = self.tail.get();
        // SAFETY: the tail node is never freed by the consumer, which only
        // frees a node after moving past it, and it cannot move past the
        // last node.
        unsafe { (*tail).next.store(node, Ordering::Release) };
        self.tail.set(node);
    }

    /// True once the consumer half has been dropped.
    pub fn is_disconnected(&self) -> bool {
        !self.inner.consumer_alive.load(Ordering::Acquire)
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.inner.producer_alive.store(false, Ordering::Release);
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("disconnected", &self.is_disconnected())
            .finish()
    }
}

/// Why [`Consumer::try_pop`] returned no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing queued right now; the producer may push more.
    Empty,
    /// The producer is gone and every value it pushed has been popped.
    Disconnected,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "queue is empty"),
            TryRecvError::Disconnected => write!(f, "queue producer disconnected"),
        }
    }
}

impl std::error::Error for TryRecvError {}

/// The receiving half. Owned by the thread that consumes values.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

// SAFETY: the consumer alone reads and writes `head`; `try_pop` takes
// `&mut self`, and the type is not `Sync` because `Inner` holds raw pointers.
unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
    /// Removes the oldest value without blocking.
    pub fn try_pop(&mut self) -> Result<T, TryRecvError> {
        if let Some(value) = self.pop_next() {
            return Ok(value);
        }
        if self.inner.producer_alive.load(Ordering::Acquire) {
            return Err(TryRecvError::Empty);
        }
        // The producer's last push happened-before its release of the flag,
        // so a value we raced with is visible now.
        self.pop_next().ok_or(TryRecvError::Disconnected)
    }

    /// Iterates over everything currently queued.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { consumer: self }
    }

    /// True once the producer half has been dropped. Values it pushed may
    /// still be waiting.
    pub fn is_disconnected(&self) -> bool {
        !self.inner.producer_alive.load(Ordering::Acquire)
    }

    fn pop_next(&mut self) -> Option<T> {
        // SAFETY: `head` is only accessed through `&mut Consumer`. A non-null
        // `next` was fully written before the producer's release store.
        unsafe {
            let head_slot = self.inner.head.get();
            let head = *head_slot;
            let next = (*head).next.load(Ordering::Acquire);
            if next.is_null() {
                return None;
            }
            let value = (*next).value.assume_init_read();
            // `next` becomes the new stub; its value slot is now logically empty.
            *head_slot = next;
            drop(Box::from_raw(head));
            Some(value)
        }
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.inner.consumer_alive.store(false, Ordering::Release);
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("disconnected", &self.is_disconnected())
            .finish()
    }
}

/// Iterator returned by [`Consumer::drain`].
pub struct Drain<'a, T> {
    consumer: &'a mut Consumer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.try_pop().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn pops_in_push_order() {
        let (tx, mut rx) = spsc_queue();
        assert_eq!(rx.try_pop(), Err(TryRecvError::Empty));
        for i in 0..5 {
            tx.push(i);
        }
        assert_eq!(rx.drain().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(rx.try_pop(), Err(TryRecvError::Empty));
        tx.push(9);
        assert_eq!(rx.try_pop(), Ok(9));
    }

    #[test_log::test]
    fn cross_thread_transfer_keeps_order_without_loss() {
        const COUNT: u64 = 100_000;
        let (tx, mut rx) = spsc_queue::<u64>();
        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                tx.push(i);
            }
        });

        let mut expected = 0;
        loop {
            match rx.try_pop() {
                Ok(v) => {
                    assert_eq!(v, expected);
                    expected += 1;
                }
                Err(TryRecvError::Empty) => thread::yield_now(),
                Err(TryRecvError::Disconnected) => break,
            }
        }
        producer.join().unwrap();
        assert_eq!(expected, COUNT);
    }

    #[test]
    fn disconnected_only_after_everything_is_popped() {
        let (tx, mut rx) = spsc_queue();
        tx.push("a");
        tx.push("b");
        drop(tx);
        assert!(rx.is_disconnected());
        assert_eq!(rx.try_pop(), Ok("a"));
        assert_eq!(rx.try_pop(), Ok("b"));
        assert_eq!(rx.try_pop(), Err(TryRecvError::Disconnected));
        assert_eq!(rx.try_pop(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn push_after_consumer_drop_still_succeeds() {
        let (tx, rx) = spsc_queue();
        assert!(!tx.is_disconnected());
        drop(rx);
        assert!(tx.is_disconnected());
        tx.push(String::from("late"));
    }

    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn pending_values_are_dropped_with_the_queue() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = spsc_queue();
        for _ in 0..4 {
            tx.push(Counted(Arc::clone(&drops)));
        }
        let popped = rx.try_pop().ok();
        assert!(popped.is_some());
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(popped);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        drop(rx);
        drop(tx);
        assert_eq!(drops.load(Ordering::SeqCst), 4);
    }
}
