//! Field-level diff between two structs.
//!
//! Both structs keep their fields sorted by name, so the diff is a single
//! merge pass over the two field lists. Changes come out in ascending
//! field-name order.
//!
//! Two delivery styles share the same walk:
//! - [`Struct::diff`] returns a lazy [`StructDiff`] iterator;
//! - [`send_diff`] pushes changes into a bounded `tokio` channel, stopping
//!   as soon as the consumer cancels or hangs up.

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::trace;

use crate::structs::Struct;
use crate::value::Value;

/// What happened to a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffChangeType {
    /// Present in the current struct only.
    Added,
    /// Present in the previous struct only.
    Removed,
    /// Present in both with different values.
    Modified,
}

/// One change record. `key` is the field name as a string value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueChanged {
    pub change: DiffChangeType,
    pub key: Value,
}

impl ValueChanged {
    pub fn new(change: DiffChangeType, field: &str) -> Self {
        Self {
            change,
            key: Value::String(field.to_string()),
        }
    }

    pub fn added(field: &str) -> Self {
        Self::new(DiffChangeType::Added, field)
    }

    pub fn removed(field: &str) -> Self {
        Self::new(DiffChangeType::Removed, field)
    }

    pub fn modified(field: &str) -> Self {
        Self::new(DiffChangeType::Modified, field)
    }
}

/// Cancellation signal shared between a diff consumer and its producer.
#[derive(Clone, Debug, Default)]
pub struct DiffCancel {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl DiffCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the producer to stop. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, AtomicOrdering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(AtomicOrdering::SeqCst)
    }

    /// Resolves once [`cancel`](DiffCancel::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Lazy diff of `current` against `previous`.
///
/// Finite and not restartable. Once cancelled or exhausted it yields
/// nothing further.
#[derive(Debug)]
pub struct StructDiff<'a> {
    current: &'a Struct,
    previous: &'a Struct,
    i1: usize,
    i2: usize,
    done: bool,
    cancel: Option<DiffCancel>,
}

impl<'a> StructDiff<'a> {
    fn new(current: &'a Struct, previous: &'a Struct) -> Self {
        Self {
            current,
            previous,
            i1: 0,
            i2: 0,
            done: current.equals(previous),
            cancel: None,
        }
    }

    /// Check `cancel` before producing each change.
    pub fn with_cancel(mut self, cancel: DiffCancel) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(DiffCancel::is_cancelled)
    }
}

impl Iterator for StructDiff<'_> {
    type Item = ValueChanged;

    fn next(&mut self) -> Option<ValueChanged> {
        let (current, previous) = (self.current, self.previous);
        let fs1 = current.struct_type().fields();
        let fs2 = previous.struct_type().fields();

        loop {
            if self.done || self.is_cancelled() {
                self.done = true;
                return None;
            }

            match (fs1.get(self.i1), fs2.get(self.i2)) {
                (Some(f1), Some(f2)) => match f1.name.cmp(&f2.name) {
                    Ordering::Equal => {
                        let v1 = &current.values()[self.i1];
                        let v2 = &previous.values()[self.i2];
                        self.i1 += 1;
                        self.i2 += 1;
                        if !v1.equals(v2) {
                            return Some(ValueChanged::modified(&f1.name));
                        }
                    }
                    Ordering::Less => {
                        self.i1 += 1;
                        return Some(ValueChanged::added(&f1.name));
                    }
                    Ordering::Greater => {
                        self.i2 += 1;
                        return Some(ValueChanged::removed(&f2.name));
                    }
                },
                (Some(f1), None) => {
                    self.i1 += 1;
                    return Some(ValueChanged::added(&f1.name));
                }
                (None, Some(f2)) => {
                    self.i2 += 1;
                    return Some(ValueChanged::removed(&f2.name));
                }
                (None, None) => self.done = true,
            }
        }
    }
}

impl FusedIterator for StructDiff<'_> {}

impl Struct {
    /// Diff this struct against `previous`. Hash-equal structs produce no
    /// changes.
    pub fn diff<'a>(&'a self, previous: &'a Struct) -> StructDiff<'a> {
        StructDiff::new(self, previous)
    }
}

/// Send the diff of `current` against `previous` into `tx`.
///
/// Every send waits for channel capacity and races `cancel`; the function
/// stops before the next change once `cancel` fires or the receiver is
/// dropped. Returns the number of changes delivered.
pub async fn send_diff(
    current: Struct,
    previous: Struct,
    tx: mpsc::Sender<ValueChanged>,
    cancel: DiffCancel,
) -> usize {
    let mut sent = 0;
    for change in current.diff(&previous).with_cancel(cancel.clone()) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!(sent, "diff cancelled by consumer");
                break;
            }
            result = tx.send(change) => {
                if result.is_err() {
                    trace!(sent, "diff receiver dropped");
                    break;
                }
                sent += 1;
            }
        }
    }
    sent
}
