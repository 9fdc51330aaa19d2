//! Revocable cancellation groups
//!
//! A [`CancelGroup`] stores cleanup actions ("cancellers") keyed by
//! [`CancelId`] and owns zero or more child groups.
//!
//! ```text
//! root ──┬── canceller(remove countdown listener)
//!        ├── canceller(remove movement listener)
//!        └── child (race arena) ──┬── canceller(remove delay listener)
//!                                 └── canceller(remove chest listener)
//! ```
//!
//! Cancelling a group runs each of its cancellers once, cancels every child,
//! and leaves the group permanently inert. Cancelling a child never touches
//! its parent or siblings. Parents hold children strongly and children point
//! back weakly, so a cancelled child detaches itself and is freed.

use crate::CancelId;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// A cleanup action; `FnOnce` so it can only ever run once
pub type Canceller = Box<dyn FnOnce()>;

#[derive(Default)]
struct GroupInner {
    next_id: u64,
    cancellers: IndexMap<CancelId, Canceller>,
    next_child: u64,
    children: IndexMap<u64, CancelGroup>,
    parent: Option<(Weak<RefCell<GroupInner>>, u64)>,
    cancelled: bool,
}

/// Handle to a cancellation group
///
/// Cloning the handle shares the same group.
#[derive(Clone, Default)]
pub struct CancelGroup {
    inner: Rc<RefCell<GroupInner>>,
}

impl CancelGroup {
    /// Create a root group
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a canceller and return its id
    ///
    /// If the group is already cancelled the canceller runs immediately; it is
    /// never silently dropped.
    pub fn add(&self, canceller: impl FnOnce() + 'static) -> CancelId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = CancelId::new(inner.next_id);
        if inner.cancelled {
            drop(inner);
            trace!(%id, "group already cancelled, running canceller now");
            canceller();
        } else {
            inner.cancellers.insert(id, Box::new(canceller));
        }
        id
    }

    /// Discard a canceller without running it
    ///
    /// Used when the owner finished normally and already cleaned up. Unknown
    /// ids are ignored; returns whether anything was removed.
    pub fn advance(&self, id: CancelId) -> bool {
        let removed = self.inner.borrow_mut().cancellers.shift_remove(&id);
        removed.is_some()
    }

    /// Run every canceller, cancel every child, and mark the group dead
    ///
    /// Calling this again is a no-op.
    pub fn cancel_all(&self) {
        let (cancellers, children, parent) = {
            let mut inner = self.inner.borrow_mut();
            if inner.cancelled {
                return;
            }
            inner.cancelled = true;
            (
                std::mem::take(&mut inner.cancellers),
                std::mem::take(&mut inner.children),
                inner.parent.take(),
            )
        };
        debug!(
            cancellers = cancellers.len(),
            children = children.len(),
            "cancelling group"
        );

        for (_, canceller) in cancellers {
            canceller();
        }
        for (_, child) in children {
            child.cancel_all();
        }
        if let Some((parent, key)) = parent {
            if let Some(parent) = parent.upgrade() {
                let detached = parent.borrow_mut().children.shift_remove(&key);
                drop(detached);
            }
        }
    }

    /// Create a sub-group bounded by this group's lifetime
    ///
    /// A child of an already cancelled group starts out cancelled.
    pub fn child(&self) -> CancelGroup {
        let child = CancelGroup::new();
        let mut inner = self.inner.borrow_mut();
        if inner.cancelled {
            child.inner.borrow_mut().cancelled = true;
            return child;
        }
        inner.next_child += 1;
        let key = inner.next_child;
        child.inner.borrow_mut().parent = Some((Rc::downgrade(&self.inner), key));
        inner.children.insert(key, child.clone());
        child
    }

    /// Check if `cancel_all` has run on this group or an ancestor
    pub fn is_cancelled(&self) -> bool {
        self.inner.borrow().cancelled
    }

    /// Number of pending cancellers
    pub fn len(&self) -> usize {
        self.inner.borrow().cancellers.len()
    }

    /// Check if no cancellers are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live child groups
    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }
}

impl fmt::Debug for CancelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CancelGroup")
            .field("pending", &inner.cancellers.len())
            .field("children", &inner.children.len())
            .field("cancelled", &inner.cancelled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn bump(count: &Rc<Cell<u32>>) -> impl FnOnce() + 'static {
        let count = Rc::clone(count);
        move || count.set(count.get() + 1)
    }

    #[test]
    fn test_ids_are_unique() {
        let group = CancelGroup::new();
        let a = group.add(|| {});
        let b = group.add(|| {});
        group.advance(a);
        let c = group.add(|| {});
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let group = CancelGroup::new();
        let count = counter();
        group.add(bump(&count));
        group.add(bump(&count));

        group.cancel_all();
        assert_eq!(count.get(), 2);
        assert!(group.is_cancelled());
        assert!(group.is_empty());

        group.cancel_all();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_advance_discards_without_running() {
        let group = CancelGroup::new();
        let count = counter();
        let id = group.add(bump(&count));

        assert!(group.advance(id));
        assert!(!group.advance(id));
        assert!(!group.advance(CancelId::new(999)));

        group.cancel_all();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_add_after_cancel_runs_immediately() {
        let group = CancelGroup::new();
        group.cancel_all();

        let count = counter();
        group.add(bump(&count));
        assert_eq!(count.get(), 1);
        assert!(group.is_empty());
    }

    #[test]
    fn test_parent_cancels_children() {
        let root = CancelGroup::new();
        let child = root.child();
        let grandchild = child.child();
        let count = counter();
        child.add(bump(&count));
        grandchild.add(bump(&count));

        root.cancel_all();
        assert_eq!(count.get(), 2);
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn test_child_cancel_leaves_parent_and_siblings() {
        let root = CancelGroup::new();
        let left = root.child();
        let right = root.child();
        let count = counter();
        root.add(bump(&count));
        right.add(bump(&count));
        assert_eq!(root.child_count(), 2);

        left.cancel_all();
        assert!(!root.is_cancelled());
        assert!(!right.is_cancelled());
        assert_eq!(count.get(), 0);
        assert_eq!(root.child_count(), 1);

        root.cancel_all();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_child_of_cancelled_group_is_cancelled() {
        let root = CancelGroup::new();
        root.cancel_all();
        let child = root.child();
        assert!(child.is_cancelled());
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_canceller_may_touch_its_group() {
        let group = CancelGroup::new();
        let g = group.clone();
        let other = group.add(|| {});
        group.add(move || {
            g.advance(other);
            g.add(|| {});
        });
        group.cancel_all();
        assert!(group.is_cancelled());
    }
}
