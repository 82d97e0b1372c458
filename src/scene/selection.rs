//! Selection state: CPU id set plus a one-word-per-instance GPU encoding.
//!
//! Word `i` of the encoding is `1` exactly when the record in slot `i` is
//! in the CPU set. Single selections patch one word; clears, loads and
//! deletes rewrite the whole encoding.

use rustc_hash::FxHashSet;

use crate::error::GpuError;
use crate::gpu::buffer::{BufferView, GpuBuffer};
use crate::scene::instance_store::SlotMap;
use crate::scene::record::RecordId;

const WORD: u64 = size_of::<u32>() as u64;

/// Selected ids, the last touched id, and the GPU selection words.
pub struct Selection<B: GpuBuffer> {
    selected: FxHashSet<RecordId>,
    last_touched: Option<RecordId>,
    words: Vec<u32>,
    buffer: B,
}

impl<B: GpuBuffer> Selection<B> {
    /// Empty selection over zero instances.
    pub fn new(buffer: B) -> Self {
        Self {
            selected: FxHashSet::default(),
            last_touched: None,
            words: Vec::new(),
            buffer,
        }
    }

    /// Allocate an encoding for `count` instances without installing it.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if the buffer cannot be allocated.
    pub fn stage_resize(&self, count: usize) -> Result<B::Allocation, GpuError> {
        self.buffer.allocate(count as u64 * WORD)
    }

    /// Forget everything and install a zeroed encoding for a freshly
    /// loaded record set of `count` records.
    pub fn reset(&mut self, allocation: B::Allocation, count: usize) {
        self.selected.clear();
        self.last_touched = None;
        self.words = vec![0; count];
        self.buffer.install(allocation);
    }

    /// Set or unset `id`, which currently lives at `slot`. Writes only
    /// that slot's word.
    pub fn apply(&mut self, id: &RecordId, slot: u32, selected: bool) {
        let Some(word) = self.words.get_mut(slot as usize) else {
            return;
        };
        if selected {
            let _ = self.selected.insert(id.clone());
        } else {
            let _ = self.selected.remove(id);
        }
        self.last_touched = Some(id.clone());
        *word = u32::from(selected);
        self.buffer
            .write(u64::from(slot) * WORD, bytemuck::bytes_of(&*word));
    }

    /// Empty the set, forget the last touched id, and zero the encoding in
    /// one write.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_touched = None;
        self.words.fill(0);
        self.write_all();
    }

    /// Drop deleted ids and install a zeroed encoding sized for the
    /// surviving records, then re-resolve the surviving selected ids
    /// through the new `slots`.
    pub fn on_records_deleted(
        &mut self,
        deleted: &[RecordId],
        allocation: B::Allocation,
        slots: &SlotMap,
    ) {
        for id in deleted {
            let _ = self.selected.remove(id);
        }
        if self
            .last_touched
            .as_ref()
            .is_some_and(|id| deleted.contains(id))
        {
            self.last_touched = None;
        }
        self.selected.retain(|id| slots.get(id.as_str()).is_some());

        self.buffer.install(allocation);
        self.words = vec![0; slots.len()];
        for id in &self.selected {
            if let Some(slot) = slots.get(id.as_str()) {
                self.words[slot as usize] = 1;
            }
        }
        if !self.selected.is_empty() {
            self.write_all();
        }
    }

    fn write_all(&mut self) {
        if !self.words.is_empty() {
            self.buffer.write(0, bytemuck::cast_slice(&self.words));
        }
    }

    /// Currently selected ids.
    #[must_use]
    pub fn selected(&self) -> &FxHashSet<RecordId> {
        &self.selected
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Id most recently passed to [`Selection::apply`], for highlight.
    #[must_use]
    pub fn last_touched(&self) -> Option<&RecordId> {
        self.last_touched.as_ref()
    }

    /// CPU mirror of the encoding.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// The encoding buffer and its word count, for the draw step.
    #[must_use]
    pub fn view(&self) -> BufferView<'_, B> {
        BufferView {
            buffer: &self.buffer,
            count: self.words.len() as u32,
            generation: self.buffer.generation(),
        }
    }

    /// Read the encoding back from the GPU.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Readback`] if the staging read fails.
    pub fn read_back(&self) -> Result<Vec<u32>, GpuError> {
        let bytes = self.buffer.read_back()?;
        let len = self.words.len() * WORD as usize;
        Ok(bytemuck::pod_collect_to_vec(bytes.get(..len).unwrap_or(&bytes)))
    }
}
