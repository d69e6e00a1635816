//! Storyboard splice-and-provenance model.
//!
//! A [`Storyboard`] is the ordered frame sequence of one editing session,
//! the user's current two-frame [`Selection`], and the list of
//! [`ProvenanceRange`]s marking runs that came back from the interpolation
//! service. All operations are synchronous and leave the state untouched
//! when they return an error.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of anchor frames the user can pick at once.
pub const MAX_SELECTION: usize = 2;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// An encoded still image, usually a `data:image/jpeg;base64,...` URI.
///
/// Frames carry no identity of their own; a frame is addressed by its
/// position in the storyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame(String);

impl Frame {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Frame {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Frame {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Half-open interval `[start, end)` of frames inserted by one splice.
///
/// Ranges are stamped with the positions valid at the moment of their
/// splice and are never shifted by later splices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRange {
    pub start: usize,
    pub end: usize,
    pub count: usize,
}

impl ProvenanceRange {
    /// Build the range covering `count` frames starting at `start`.
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start,
            end: start + count,
            count,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Up to two distinct frame indices.
///
/// `indices` is always sorted ascending (the order splices consume);
/// `pick_order` keeps the same indices in the order they were clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    indices: Vec<usize>,
    pick_order: Vec<usize>,
}

impl Selection {
    /// Selected indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Selected indices in the order the user picked them.
    pub fn pick_order(&self) -> &[usize] {
        &self.pick_order
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// The `(lower, upper)` anchor pair, only when exactly two are selected.
    pub fn pair(&self) -> Option<(usize, usize)> {
        match self.indices.as_slice() {
            [lo, hi] => Some((*lo, *hi)),
            _ => None,
        }
    }

    /// Apply one click.
    ///
    /// - a selected index is removed;
    /// - otherwise, with fewer than two selected, it is added;
    /// - otherwise the selection becomes `[indices[0], index]`, sorted. The
    ///   lower of the current pair stays and the upper one is evicted.
    fn toggle(&mut self, index: usize) {
        if self.contains(index) {
            self.indices.retain(|i| *i != index);
            self.pick_order.retain(|i| *i != index);
            return;
        }

        if self.indices.len() < MAX_SELECTION {
            self.indices.push(index);
            self.indices.sort_unstable();
            self.pick_order.push(index);
            return;
        }

        let kept = self.indices[0];
        let evicted = self.indices[1];
        self.indices = vec![kept, index];
        self.indices.sort_unstable();
        self.pick_order.retain(|i| *i != evicted);
        self.pick_order.push(index);
    }

    fn clear(&mut self) {
        self.indices.clear();
        self.pick_order.clear();
    }
}

// ---------------------------------------------------------------------------
// Storyboard
// ---------------------------------------------------------------------------

/// Frame sequence, selection and provenance for one editing session.
#[derive(Debug, Clone, Default)]
pub struct Storyboard {
    frames: Vec<Frame>,
    selection: Selection,
    provenance: Vec<ProvenanceRange>,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn provenance(&self) -> &[ProvenanceRange] {
        &self.provenance
    }

    /// Anchor pair for the next splice, when exactly two frames are picked.
    pub fn selected_pair(&self) -> Option<(usize, usize)> {
        self.selection.pair()
    }

    pub fn pick_order(&self) -> &[usize] {
        self.selection.pick_order()
    }

    /// Replace the frame sequence with a fresh extraction.
    ///
    /// Clears the selection and all provenance ranges.
    pub fn load(&mut self, frames: Vec<Frame>) -> Result<(), CoreError> {
        if frames.is_empty() {
            return Err(CoreError::Validation(
                "cannot load an empty frame sequence".to_string(),
            ));
        }
        self.frames = frames;
        self.selection.clear();
        self.provenance.clear();
        Ok(())
    }

    /// Drop everything. Used when a new video replaces the current one.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.selection.clear();
        self.provenance.clear();
    }

    /// Toggle `index` in the selection (see [`Selection`] for the policy).
    pub fn toggle_select(&mut self, index: usize) -> Result<&Selection, CoreError> {
        self.check_index(index)?;
        self.selection.toggle(index);
        Ok(&self.selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Insert `new_frames` between the anchors `start` and `end`.
    ///
    /// The result is `frames[..=start] ++ new_frames ++ frames[end..]`: both
    /// anchors are kept and anything strictly between them is replaced.
    /// Bounds are `start <= end <= len`; `start == len` appends at the tail.
    /// Appends one provenance range `[start + 1, start + 1 + k)` and clears
    /// the selection. Returns the appended range.
    pub fn splice(
        &mut self,
        start: usize,
        end: usize,
        new_frames: Vec<Frame>,
    ) -> Result<ProvenanceRange, CoreError> {
        let len = self.frames.len();
        if end > len {
            return Err(CoreError::Validation(format!(
                "splice end {end} is out of range for {len} frames"
            )));
        }
        if start > end {
            return Err(CoreError::Validation(format!(
                "splice start {start} must not exceed end {end}"
            )));
        }

        let inserted = new_frames.len();
        let head = (start + 1).min(len);
        let mut spliced = Vec::with_capacity(head + inserted + (len - end));
        spliced.extend_from_slice(&self.frames[..head]);
        spliced.extend(new_frames);
        spliced.extend_from_slice(&self.frames[end..]);

        let range = ProvenanceRange::new(start + 1, inserted);
        self.frames = spliced;
        self.provenance.push(range);
        self.selection.clear();
        Ok(range)
    }

    /// Whether `index` falls inside any recorded provenance range.
    pub fn is_provenance_at(&self, index: usize) -> bool {
        self.provenance.iter().any(|r| r.contains(index))
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.frames.len() {
            return Err(CoreError::Validation(format!(
                "frame index {index} is out of range for {} frames",
                self.frames.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
