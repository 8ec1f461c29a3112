use crate::config::{LruStrategy, PolicyKind};
use crate::replacement_policies::{Clock, FirstInFirstOut, LeastRecentlyUsed, ReplacementPolicy, TimestampedLru};
use crate::PageId;

/// A fixed capacity, ordered set of resident pages
///
/// Occupancy is tracked explicitly rather than with a sentinel page, so any page identifier can
/// be resident. Slots are filled in order from slot 0, and once full the frame only changes by
/// replacing a slot. The owning pager guarantees no page is resident twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSetFrame {
    slots: Vec<PageId>,
    capacity: usize,
}

impl WorkingSetFrame {
    /// Creates an empty frame
    ///
    /// # Panics
    ///
    /// If `capacity` is zero, a frame which can never hold a page can't evict one either
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "working set capacity must be at least 1");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// True if any occupied slot holds `page`
    pub fn contains(&self, page: PageId) -> bool {
        self.slots.contains(&page)
    }

    /// The first occupied slot holding `page`, scanning from slot 0
    pub fn index_of(&self, page: PageId) -> Option<usize> {
        self.slots.iter().position(|&resident| resident == page)
    }

    /// The occupied slots, in slot order
    pub fn slots(&self) -> &[PageId] {
        &self.slots
    }

    /// Places `page` in the next free slot, returning that slot
    fn occupy(&mut self, page: PageId) -> usize {
        debug_assert!(!self.is_full());
        self.slots.push(page);
        self.slots.len() - 1
    }

    fn replace(&mut self, slot: usize, page: PageId) {
        self.slots[slot] = page;
    }
}

/// The outcome of a single reference
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Access {
    /// The page was already resident
    Hit,
    /// The page was placed in a free slot. Not counted as a fault
    Fill,
    /// The frame was full, and a resident page was evicted to make room
    Fault,
}

/// A generic trait for working sets
///
/// Technically not required as we're using static dispatch, but this gives a single interface
/// over both the generic pager and the enum of concrete pagers
pub trait WorkingSet {
    /// Applies the reference at `trace[position]`, updating the frame and the replacement policy
    ///
    /// # Arguments
    ///
    /// * `trace`: The whole reference trace. Policies may look at earlier references
    /// * `position`: The index of the reference to apply
    ///
    /// returns: Access
    fn access(&mut self, trace: &[PageId], position: usize) -> Access;

    /// The number of faults seen so far
    fn faults(&self) -> u64;

    /// The resident pages
    fn frame(&self) -> &WorkingSetFrame;

    /// Applies every reference in `trace`, in order, and returns the total fault count
    fn run(&mut self, trace: &[PageId]) -> u64 {
        for position in 0..trace.len() {
            self.access(trace, position);
        }
        self.faults()
    }
}

/// A generic pager, parameterised by a replacement policy
///
/// The general approach here is to have one implementation of hit detection, free slot filling
/// and fault counting, with only victim selection differing between policies. Monomorphisation
/// lets the compiler inline the policy hooks
pub struct Pager<R: ReplacementPolicy> {
    frame: WorkingSetFrame,
    policy: R,
    faults: u64,
}

impl<R: ReplacementPolicy> Pager<R> {
    pub fn new(capacity: usize, policy: R) -> Self {
        Self {
            frame: WorkingSetFrame::new(capacity),
            policy,
            faults: 0,
        }
    }

    pub fn policy(&self) -> &R {
        &self.policy
    }
}

impl<R: ReplacementPolicy> WorkingSet for Pager<R> {
    fn access(&mut self, trace: &[PageId], position: usize) -> Access {
        let page = trace[position];
        if let Some(slot) = self.frame.index_of(page) {
            self.policy.update_on_hit(slot);
            return Access::Hit;
        }
        if !self.frame.is_full() {
            let slot = self.frame.occupy(page);
            self.policy.update_on_insert(slot);
            return Access::Fill;
        }
        let slot = self.policy.get_victim_slot(&self.frame, trace, position);
        self.frame.replace(slot, page);
        self.policy.update_on_insert(slot);
        self.faults += 1;
        Access::Fault
    }

    fn faults(&self) -> u64 {
        self.faults
    }

    fn frame(&self) -> &WorkingSetFrame {
        &self.frame
    }
}

/// Enum for every pager provided by the library
///
/// The simulator picks policies at runtime from the configuration; branching explicitly on the
/// concrete types keeps the policy hooks inlinable, which a trait object would not
pub enum GenericPager {
    LeastRecentlyUsed(Pager<LeastRecentlyUsed>),
    TimestampedLru(Pager<TimestampedLru>),
    FirstInFirstOut(Pager<FirstInFirstOut>),
    Clock(Pager<Clock>),
}

impl GenericPager {
    /// Creates an empty pager for a policy
    ///
    /// # Arguments
    ///
    /// * `kind`: The policy to use
    /// * `lru_strategy`: How LRU finds its victim. Ignored for other policies
    /// * `capacity`: The working set size
    ///
    /// returns: GenericPager
    pub fn new(kind: PolicyKind, lru_strategy: LruStrategy, capacity: usize) -> Self {
        match (kind, lru_strategy) {
            (PolicyKind::LeastRecentlyUsed, LruStrategy::Rescan) => {
                GenericPager::from(Pager::new(capacity, LeastRecentlyUsed::new(capacity)))
            }
            (PolicyKind::LeastRecentlyUsed, LruStrategy::Timestamp) => {
                GenericPager::from(Pager::new(capacity, TimestampedLru::new(capacity)))
            }
            (PolicyKind::FirstInFirstOut, _) => {
                GenericPager::from(Pager::new(capacity, FirstInFirstOut::new(capacity)))
            }
            (PolicyKind::Clock, _) => {
                GenericPager::from(Pager::new(capacity, Clock::new(capacity)))
            }
        }
    }
}

impl From<Pager<LeastRecentlyUsed>> for GenericPager {
    fn from(value: Pager<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Pager<TimestampedLru>> for GenericPager {
    fn from(value: Pager<TimestampedLru>) -> Self {
        Self::TimestampedLru(value)
    }
}

impl From<Pager<FirstInFirstOut>> for GenericPager {
    fn from(value: Pager<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Pager<Clock>> for GenericPager {
    fn from(value: Pager<Clock>) -> Self {
        Self::Clock(value)
    }
}

impl WorkingSet for GenericPager {
    fn access(&mut self, trace: &[PageId], position: usize) -> Access {
        match self {
            GenericPager::LeastRecentlyUsed(p) => p.access(trace, position),
            GenericPager::TimestampedLru(p) => p.access(trace, position),
            GenericPager::FirstInFirstOut(p) => p.access(trace, position),
            GenericPager::Clock(p) => p.access(trace, position),
        }
    }

    fn faults(&self) -> u64 {
        match self {
            GenericPager::LeastRecentlyUsed(p) => p.faults(),
            GenericPager::TimestampedLru(p) => p.faults(),
            GenericPager::FirstInFirstOut(p) => p.faults(),
            GenericPager::Clock(p) => p.faults(),
        }
    }

    fn frame(&self) -> &WorkingSetFrame {
        match self {
            GenericPager::LeastRecentlyUsed(p) => p.frame(),
            GenericPager::TimestampedLru(p) => p.frame(),
            GenericPager::FirstInFirstOut(p) => p.frame(),
            GenericPager::Clock(p) => p.frame(),
        }
    }
}

/// Runs a single policy over a whole trace from an empty frame, returning the fault count
pub fn count_faults(kind: PolicyKind, lru_strategy: LruStrategy, capacity: usize, trace: &[PageId]) -> u64 {
    GenericPager::new(kind, lru_strategy, capacity).run(trace)
}
