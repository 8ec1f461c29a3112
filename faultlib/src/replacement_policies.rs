use crate::frame::WorkingSetFrame;
use crate::PageId;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Pager.
pub trait ReplacementPolicy {
    /// Updates the policy when a reference hits a resident page
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `slot`: The frame slot holding the page which was referenced
    ///
    /// returns: ()
    fn update_on_hit(&mut self, _slot: usize) {}

    /// Updates the policy when a page is placed into a slot, either filling a free slot or
    /// replacing the victim returned by `get_victim_slot`
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_insert(&mut self, _slot: usize) {}

    /// Used by the pager to choose which resident page to evict when the frame is full and the
    /// reference at `position` misses.
    ///
    /// Implementations should assume that when this method is called, the returned slot will be
    /// overwritten with `trace[position]`
    ///
    /// # Arguments
    ///
    /// * `frame`: The full working set frame
    /// * `trace`: The whole reference trace being replayed
    /// * `position`: The index into `trace` of the reference which missed
    ///
    /// returns: usize, the slot to evict
    fn get_victim_slot(&mut self, frame: &WorkingSetFrame, trace: &[PageId], position: usize) -> usize;
}

/// Standard first in first out policy
///
/// The cursor tracks eviction order only. Free slots are filled in occupancy order without
/// touching it, so the first eviction always targets slot 0, the first page to arrive.
pub struct FirstInFirstOut {
    cursor: usize,
    capacity: usize,
}

impl FirstInFirstOut {
    pub fn new(capacity: usize) -> Self {
        Self {
            cursor: 0,
            capacity,
        }
    }

    /// The slot which will be evicted on the next fault
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl ReplacementPolicy for FirstInFirstOut {
    fn get_victim_slot(&mut self, _frame: &WorkingSetFrame, _trace: &[PageId], _position: usize) -> usize {
        let victim = self.cursor;
        self.cursor = (self.cursor + 1) % self.capacity;
        victim
    }
}

/// Least Recently Used replacement policy
///
/// No recency state is kept between references. On every fault the trace is scanned backwards
/// from the faulting reference, recording each resident page the first time it is seen, until
/// every resident page has been recorded. The last page recorded is the one whose latest
/// reference lies furthest in the past.
///
/// This is O(trace length * capacity) per fault in the worst case, see `TimestampedLru` for a
/// maintained alternative which selects identical victims
pub struct LeastRecentlyUsed {
    // Scratch space, reused between faults to avoid reallocating
    recent: Vec<PageId>,
}

impl LeastRecentlyUsed {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: Vec::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn get_victim_slot(&mut self, frame: &WorkingSetFrame, trace: &[PageId], position: usize) -> usize {
        self.recent.clear();
        for &page in trace[..=position].iter().rev() {
            if frame.contains(page) && !self.recent.contains(&page) {
                self.recent.push(page);
                if self.recent.len() == frame.capacity() {
                    break;
                }
            }
        }
        // Every resident page was referenced when it was inserted, so the scan always records
        // all of them before running off the start of the trace
        debug_assert_eq!(self.recent.len(), frame.capacity());
        self.recent
            .last()
            .and_then(|&victim| frame.index_of(victim))
            .unwrap_or(0)
    }
}

/// Least Recently Used replacement policy with maintained recency
///
/// This keeps track of when each slot was last referenced using a logical clock, which is
/// updated each time a slot is used. Picks the same victims as `LeastRecentlyUsed` since every
/// timestamp is distinct, but a fault costs O(capacity) instead of a rescan of the trace
pub struct TimestampedLru {
    last_used_times: Vec<u64>,
    // Tracking logical time means we have fewer comparisons when finding a victim
    time: u64,
}

impl TimestampedLru {
    pub fn new(capacity: usize) -> Self {
        Self {
            last_used_times: vec![0; capacity],
            time: 0,
        }
    }

    fn touch(&mut self, slot: usize) {
        self.last_used_times[slot] = self.time;
        self.time += 1;
    }
}

impl ReplacementPolicy for TimestampedLru {
    fn update_on_hit(&mut self, slot: usize) {
        self.touch(slot);
    }

    fn update_on_insert(&mut self, slot: usize) {
        self.touch(slot);
    }

    fn get_victim_slot(&mut self, _frame: &WorkingSetFrame, _trace: &[PageId], _position: usize) -> usize {
        let mut min_value = u64::MAX;
        let mut min_index = 0;
        for (index, &used) in self.last_used_times.iter().enumerate() {
            if used < min_value {
                min_value = used;
                min_index = index;
            }
        }
        min_index
    }
}

/// Clock (second chance) replacement policy
///
/// Each slot carries a use bit which is set when its page is hit. On a fault the hand sweeps
/// forward clearing set bits, and evicts the first slot whose bit is already clear. A cleared
/// bit can only be set again by a later hit, so the sweep stops within one revolution.
pub struct Clock {
    use_bits: Vec<bool>,
    hand: usize,
}

impl Clock {
    pub fn new(capacity: usize) -> Self {
        Self {
            use_bits: vec![false; capacity],
            hand: 0,
        }
    }

    /// The slot the hand currently points at
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// The use bit of every slot, in slot order
    pub fn use_bits(&self) -> &[bool] {
        &self.use_bits
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.use_bits.len();
    }
}

impl ReplacementPolicy for Clock {
    fn update_on_hit(&mut self, slot: usize) {
        self.use_bits[slot] = true;
    }

    // Freshly inserted pages start without a second chance
    fn update_on_insert(&mut self, slot: usize) {
        self.use_bits[slot] = false;
    }

    fn get_victim_slot(&mut self, _frame: &WorkingSetFrame, _trace: &[PageId], _position: usize) -> usize {
        while self.use_bits[self.hand] {
            self.use_bits[self.hand] = false;
            self.advance();
        }
        let victim = self.hand;
        self.advance();
        victim
    }
}
