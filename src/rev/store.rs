use serde::{Deserialize, Serialize};

/// Handle to a reversible scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevInt(usize);

/// Handle to a reversible managed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevVec(usize);

/// How a managed array records its history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogMode {
    /// Log the whole array once per depth.
    Bulk,
    /// Log the header once per depth and individual slots on write.
    #[default]
    PerElement,
}

#[derive(Debug, Clone)]
struct ArrayState {
    values: Vec<i64>,
    size: usize,
    max_size: usize,
    mode: LogMode,
    // Depth of the last header snapshot; 0 means none.
    stamp: u32,
}

#[derive(Debug, Clone)]
enum Undo {
    Int {
        cell: usize,
        prev: i64,
    },
    Slots {
        array: usize,
        index: usize,
        prev: Vec<i64>,
    },
    Header {
        array: usize,
        size: usize,
        max_size: usize,
        stamp: u32,
        values: Option<Vec<i64>>,
    },
}

#[derive(Debug, Clone)]
struct TrailEntry {
    depth: u32,
    undo: Undo,
}

/// Depth-stamped undo log owning every reversible value.
///
/// Depth 0 is the base level: nothing can be rolled back below it, so
/// mutations made there are not logged.
#[derive(Debug, Clone, Default)]
pub struct RevStore {
    depth: u32,
    trail: Vec<TrailEntry>,
    ints: Vec<i64>,
    arrays: Vec<ArrayState>,
}

impl RevStore {
    /// Creates an empty store at depth 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current checkpoint depth.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of pending undo entries.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Opens a new checkpoint and returns its depth.
    pub fn checkpoint(&mut self) -> u32 {
        self.depth += 1;
        self.depth
    }

    /// Restores every value to its state as of `depth`.
    ///
    /// Entries recorded at a depth greater than `depth` are replayed in
    /// reverse order. Backtracking to the current depth or deeper is a no-op.
    pub fn backtrack(&mut self, depth: u32) {
        if depth >= self.depth {
            return;
        }
        while let Some(entry) = self.trail.last() {
            if entry.depth <= depth {
                break;
            }
            if let Some(entry) = self.trail.pop() {
                self.apply(entry.undo);
            }
        }
        self.depth = depth;
    }

    fn apply(&mut self, undo: Undo) {
        match undo {
            Undo::Int { cell, prev } => self.ints[cell] = prev,
            Undo::Slots { array, index, prev } => {
                let state = &mut self.arrays[array];
                state.values[index..index + prev.len()].copy_from_slice(&prev);
            }
            Undo::Header {
                array,
                size,
                max_size,
                stamp,
                values,
            } => {
                let state = &mut self.arrays[array];
                if let Some(values) = values {
                    state.values[..values.len()].copy_from_slice(&values);
                }
                state.size = size;
                state.max_size = max_size;
                state.stamp = stamp;
            }
        }
    }

    // ---------------------------------------------------------------- scalars

    /// Allocates a reversible scalar.
    pub fn new_int(&mut self, value: i64) -> RevInt {
        self.ints.push(value);
        RevInt(self.ints.len() - 1)
    }

    /// Reads a scalar.
    #[inline]
    pub fn get(&self, cell: RevInt) -> i64 {
        self.ints[cell.0]
    }

    /// Records the current value of `cell` at the current depth.
    pub fn rev_set(&mut self, cell: RevInt) {
        if self.depth == 0 {
            return;
        }
        self.trail.push(TrailEntry {
            depth: self.depth,
            undo: Undo::Int {
                cell: cell.0,
                prev: self.ints[cell.0],
            },
        });
    }

    /// Writes a scalar, recording its prior value when it changes.
    pub fn set(&mut self, cell: RevInt, value: i64) {
        if self.ints[cell.0] == value {
            return;
        }
        self.rev_set(cell);
        self.ints[cell.0] = value;
    }

    // ----------------------------------------------------------------- arrays

    /// Allocates an empty managed array.
    pub fn new_vec(&mut self, mode: LogMode) -> RevVec {
        self.arrays.push(ArrayState {
            values: Vec::new(),
            size: 0,
            max_size: 0,
            mode,
            stamp: 0,
        });
        RevVec(self.arrays.len() - 1)
    }

    /// Logical length of an array.
    #[inline]
    pub fn len(&self, vec: RevVec) -> usize {
        self.arrays[vec.0].size
    }

    /// Whether an array is empty.
    #[inline]
    pub fn is_empty(&self, vec: RevVec) -> bool {
        self.len(vec) == 0
    }

    /// High-water mark of observed sizes.
    pub fn max_size(&self, vec: RevVec) -> usize {
        self.arrays[vec.0].max_size
    }

    /// Reads one slot.
    #[inline]
    pub fn at(&self, vec: RevVec, index: usize) -> i64 {
        debug_assert!(index < self.arrays[vec.0].size);
        self.arrays[vec.0].values[index]
    }

    /// Live prefix of an array.
    pub fn slice(&self, vec: RevVec) -> &[i64] {
        let state = &self.arrays[vec.0];
        &state.values[..state.size]
    }

    /// Records `count` slots starting at `index` at the current depth.
    pub fn rev_set_indirect(&mut self, vec: RevVec, index: usize, count: usize) {
        if self.depth == 0 || count == 0 {
            return;
        }
        let state = &self.arrays[vec.0];
        let end = (index + count).min(state.values.len());
        if index >= end {
            return;
        }
        let prev = state.values[index..end].to_vec();
        self.trail.push(TrailEntry {
            depth: self.depth,
            undo: Undo::Slots {
                array: vec.0,
                index,
                prev,
            },
        });
    }

    /// Appends a value.
    pub fn push(&mut self, vec: RevVec, value: i64) {
        self.touch_header(vec);
        let index = self.arrays[vec.0].size;
        if index < self.arrays[vec.0].values.len() {
            self.touch_slot(vec, index);
            self.arrays[vec.0].values[index] = value;
        } else {
            self.arrays[vec.0].values.push(value);
        }
        self.arrays[vec.0].size += 1;
    }

    /// Overwrites one slot.
    pub fn put(&mut self, vec: RevVec, index: usize, value: i64) {
        debug_assert!(index < self.arrays[vec.0].size);
        if self.arrays[vec.0].values[index] == value {
            return;
        }
        self.touch_header(vec);
        self.touch_slot(vec, index);
        self.arrays[vec.0].values[index] = value;
    }

    /// Removes a slot by swapping the last element into it.
    pub fn swap_remove(&mut self, vec: RevVec, index: usize) -> i64 {
        debug_assert!(index < self.arrays[vec.0].size);
        self.touch_header(vec);
        let last = self.arrays[vec.0].size - 1;
        self.touch_slot(vec, index);
        let removed = self.arrays[vec.0].values[index];
        if index != last {
            self.touch_slot(vec, last);
            let moved = self.arrays[vec.0].values[last];
            self.arrays[vec.0].values[index] = moved;
        }
        self.arrays[vec.0].size = last;
        removed
    }

    /// Empties an array.
    pub fn clear(&mut self, vec: RevVec) {
        if self.arrays[vec.0].size == 0 {
            return;
        }
        self.touch_header(vec);
        self.arrays[vec.0].size = 0;
    }

    fn touch_header(&mut self, vec: RevVec) {
        if self.depth == 0 {
            return;
        }
        let depth = self.depth;
        let state = &mut self.arrays[vec.0];
        if state.stamp == depth {
            return;
        }
        let values = match state.mode {
            LogMode::Bulk => Some(state.values[..state.size].to_vec()),
            LogMode::PerElement => None,
        };
        let undo = Undo::Header {
            array: vec.0,
            size: state.size,
            max_size: state.max_size,
            stamp: state.stamp,
            values,
        };
        state.stamp = depth;
        state.max_size = state.max_size.max(state.size);
        self.trail.push(TrailEntry { depth, undo });
    }

    fn touch_slot(&mut self, vec: RevVec, index: usize) {
        if self.depth == 0 {
            return;
        }
        let state = &self.arrays[vec.0];
        // Bulk arrays carry the live prefix in their header entry, and no
        // checkpoint ever observed a slot above the high-water mark.
        if state.mode == LogMode::Bulk || index >= state.max_size {
            return;
        }
        self.rev_set_indirect(vec, index, 1);
    }
}
