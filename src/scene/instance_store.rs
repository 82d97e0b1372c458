//! GPU-resident per-instance attribute buffer and the record ↔ slot map.

use std::mem::offset_of;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::GpuError;
use crate::gpu::buffer::{BufferView, GpuBuffer};
use crate::layout::{
    compute_layout, InstanceAttributes, LayoutParams, LayoutStrategy,
};
use crate::scene::record::{Record, RecordId};

const STRIDE: u64 = size_of::<InstanceAttributes>() as u64;
const SELECTED_OFFSET: u64 = offset_of!(InstanceAttributes, selected) as u64;

/// Explicit record id → instance slot mapping.
///
/// Rebuilt on every change of the record sequence; slot `i` is always the
/// position of the record in that sequence.
#[derive(Debug, Clone, Default)]
pub struct SlotMap {
    slots: FxHashMap<RecordId, u32>,
}

impl SlotMap {
    fn build(records: &[Record]) -> Self {
        let slots = records
            .iter()
            .enumerate()
            .map(|(slot, record)| (record.id.clone(), slot as u32))
            .collect();
        Self { slots }
    }

    /// Slot currently holding `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<u32> {
        self.slots.get(id).copied()
    }

    /// Number of mapped records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no record is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A new record sequence with its layout and buffer allocation, built but
/// not yet installed.
///
/// Produced by [`InstanceStore::stage_upload`] and
/// [`InstanceStore::stage_delete`]; nothing observable changes until
/// [`InstanceStore::commit`].
pub struct StagedInstances<B: GpuBuffer> {
    records: Vec<Record>,
    slots: SlotMap,
    attributes: Vec<InstanceAttributes>,
    allocation: B::Allocation,
    removed: usize,
}

impl<B: GpuBuffer> StagedInstances<B> {
    /// Number of records after commit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the staged sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Slot map that becomes current on commit.
    #[must_use]
    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// Records dropped relative to the current sequence (deletes only).
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed
    }
}

/// Owns the record sequence and its instance buffer.
///
/// Slot `i` of the buffer, the attribute mirror and the slot map always
/// describe record `i`. Every method that changes the record sequence
/// rewrites the whole buffer before returning.
pub struct InstanceStore<B: GpuBuffer> {
    records: Vec<Record>,
    slots: SlotMap,
    attributes: Vec<InstanceAttributes>,
    buffer: B,
    strategy: LayoutStrategy,
    params: LayoutParams,
}

impl<B: GpuBuffer> InstanceStore<B> {
    /// Empty store writing into `buffer`.
    pub fn new(buffer: B, strategy: LayoutStrategy, params: LayoutParams) -> Self {
        Self {
            records: Vec::new(),
            slots: SlotMap::default(),
            attributes: Vec::new(),
            buffer,
            strategy,
            params,
        }
    }

    /// Lay out `records` and allocate a buffer for them.
    ///
    /// Later duplicates of an id are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if the buffer cannot be allocated.
    pub fn stage_upload(
        &self,
        records: Vec<Record>,
    ) -> Result<StagedInstances<B>, GpuError> {
        let records = dedupe(records);
        self.stage(records, &FxHashSet::default(), 0)
    }

    /// Drop every record whose id is in `ids`, lay out the survivors with
    /// `selected` flags applied, and allocate a buffer for them.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if the buffer cannot be allocated.
    pub fn stage_delete(
        &self,
        ids: &[RecordId],
        selected: &FxHashSet<RecordId>,
    ) -> Result<StagedInstances<B>, GpuError> {
        let doomed: FxHashSet<&RecordId> = ids.iter().collect();
        let survivors: Vec<Record> = self
            .records
            .iter()
            .filter(|r| !doomed.contains(&r.id))
            .cloned()
            .collect();
        let removed = self.records.len() - survivors.len();
        self.stage(survivors, selected, removed)
    }

    fn stage(
        &self,
        records: Vec<Record>,
        selected: &FxHashSet<RecordId>,
        removed: usize,
    ) -> Result<StagedInstances<B>, GpuError> {
        let allocation = self.buffer.allocate(records.len() as u64 * STRIDE)?;
        let mut attributes = compute_layout(&records, self.strategy, &self.params);
        apply_flags(&mut attributes, &records, selected);
        Ok(StagedInstances {
            slots: SlotMap::build(&records),
            records,
            attributes,
            allocation,
            removed,
        })
    }

    /// Install a staged sequence and write it in one full write.
    pub fn commit(&mut self, staged: StagedInstances<B>) {
        self.buffer.install(staged.allocation);
        self.records = staged.records;
        self.slots = staged.slots;
        self.attributes = staged.attributes;
        self.write_all();
        log::debug!(
            "instance store: {} records, {} bytes",
            self.records.len(),
            self.buffer.size()
        );
    }

    /// Replace the record sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if the buffer cannot be allocated; the store
    /// is unchanged in that case.
    pub fn upload(&mut self, records: Vec<Record>) -> Result<(), GpuError> {
        let staged = self.stage_upload(records)?;
        self.commit(staged);
        Ok(())
    }

    /// Remove records by id, keeping the relative order of the rest.
    /// Returns how many records were removed.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if the buffer cannot be allocated; the store
    /// is unchanged in that case.
    pub fn delete_by_ids(
        &mut self,
        ids: &[RecordId],
        selected: &FxHashSet<RecordId>,
    ) -> Result<usize, GpuError> {
        let staged = self.stage_delete(ids, selected)?;
        let removed = staged.removed();
        self.commit(staged);
        Ok(removed)
    }

    /// Re-run the layout under `strategy` and rewrite the whole buffer,
    /// reapplying `selected` flags afterwards.
    pub fn recompute(
        &mut self,
        strategy: LayoutStrategy,
        selected: &FxHashSet<RecordId>,
    ) {
        self.strategy = strategy;
        self.attributes = compute_layout(&self.records, strategy, &self.params);
        apply_flags(&mut self.attributes, &self.records, selected);
        self.write_all();
    }

    /// Replace the layout tunables. Takes effect on the next layout pass.
    pub fn set_params(&mut self, params: LayoutParams) {
        self.params = params;
    }

    /// Set the `selected` attribute of one instance, writing only that
    /// slot's flag.
    pub fn patch_selected(&mut self, slot: u32, selected: bool) {
        let Some(attrs) = self.attributes.get_mut(slot as usize) else {
            return;
        };
        attrs.selected = if selected { 1.0 } else { 0.0 };
        let offset = u64::from(slot) * STRIDE + SELECTED_OFFSET;
        self.buffer.write(offset, bytemuck::bytes_of(&attrs.selected));
    }

    /// Clear every `selected` attribute in one full write.
    pub fn clear_selected(&mut self) {
        for attrs in &mut self.attributes {
            attrs.selected = 0.0;
        }
        self.write_all();
    }

    fn write_all(&mut self) {
        if !self.attributes.is_empty() {
            self.buffer.write(0, bytemuck::cast_slice(&self.attributes));
        }
    }

    /// Slot currently holding `id`.
    #[must_use]
    pub fn slot_of(&self, id: &str) -> Option<u32> {
        self.slots.get(id)
    }

    /// The current id → slot map.
    #[must_use]
    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// Record at `slot`.
    #[must_use]
    pub fn record_at(&self, slot: u32) -> Option<&Record> {
        self.records.get(slot as usize)
    }

    /// The record sequence, in slot order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// CPU mirror of the instance buffer.
    #[must_use]
    pub fn attributes(&self) -> &[InstanceAttributes] {
        &self.attributes
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Strategy used by the last layout pass.
    #[must_use]
    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    /// Current layout tunables.
    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// The instance buffer and its element count, for the draw step.
    #[must_use]
    pub fn attributes_view(&self) -> BufferView<'_, B> {
        BufferView {
            buffer: &self.buffer,
            count: self.records.len() as u32,
            generation: self.buffer.generation(),
        }
    }

    /// Read the instance buffer back from the GPU.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Readback`] if the staging read fails.
    pub fn read_back(&self) -> Result<Vec<InstanceAttributes>, GpuError> {
        let bytes = self.buffer.read_back()?;
        let len = self.records.len() * STRIDE as usize;
        Ok(bytemuck::pod_collect_to_vec(bytes.get(..len).unwrap_or(&bytes)))
    }
}

fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen: FxHashSet<RecordId> = FxHashSet::default();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.clone()) {
            out.push(record);
        } else {
            log::warn!("duplicate record id '{}' dropped", record.id);
        }
    }
    out
}

fn apply_flags(
    attributes: &mut [InstanceAttributes],
    records: &[Record],
    selected: &FxHashSet<RecordId>,
) {
    if selected.is_empty() {
        return;
    }
    for (attrs, record) in attributes.iter_mut().zip(records) {
        if selected.contains(&record.id) {
            attrs.selected = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::buffer::HostBuffer;

    fn store() -> InstanceStore<HostBuffer> {
        InstanceStore::new(
            HostBuffer::new("instances"),
            LayoutStrategy::Grid,
            LayoutParams::default(),
        )
    }

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id, "2000", "c")).collect()
    }

    #[test]
    fn upload_sizes_buffer_and_writes_layout() {
        let mut store = store();
        store.upload(records(&["a", "b", "c"])).unwrap();
        assert_eq!(store.attributes_view().count, 3);
        assert_eq!(store.attributes_view().buffer.size(), 3 * 32);
        assert_eq!(store.read_back().unwrap(), store.attributes());
        assert_eq!(store.slot_of("c"), Some(2));
        assert_eq!(store.slot_of("z"), None);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let mut store = store();
        let mut input = records(&["a", "b"]);
        input.push(Record::new("a", "1900", "other"));
        store.upload(input).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.record_at(0).unwrap().year, "2000");
        assert_eq!(store.slots().len(), 2);
    }

    #[test]
    fn delete_preserves_order_and_rebuilds_slots() {
        let mut store = store();
        store.upload(records(&["a", "b", "c", "d"])).unwrap();
        let removed = store
            .delete_by_ids(
                &[RecordId::from("b"), RecordId::from("zz")],
                &FxHashSet::default(),
            )
            .unwrap();
        assert_eq!(removed, 1);
        let ids: Vec<_> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "d"]);
        assert_eq!(store.slot_of("c"), Some(1));
        assert_eq!(store.slot_of("b"), None);
        assert_eq!(store.read_back().unwrap().len(), 3);
    }

    #[test]
    fn recompute_reapplies_selection_flags() {
        let mut store = store();
        store.upload(records(&["a", "b", "c"])).unwrap();
        let selected: FxHashSet<RecordId> =
            std::iter::once(RecordId::from("b")).collect();
        store.recompute(LayoutStrategy::TemporalBanding, &selected);
        let gpu = store.read_back().unwrap();
        assert!(!gpu[0].is_selected());
        assert!(gpu[1].is_selected());
        assert_eq!(store.strategy(), LayoutStrategy::TemporalBanding);
    }

    #[test]
    fn patch_writes_only_the_flag() {
        let mut store = store();
        store.upload(records(&["a", "b"])).unwrap();
        let before = store.read_back().unwrap();
        store.patch_selected(1, true);
        let after = store.read_back().unwrap();
        assert_eq!(before[0], after[0]);
        assert_eq!(before[1].position, after[1].position);
        assert!(after[1].is_selected());
        store.patch_selected(7, true);
        assert_eq!(store.read_back().unwrap(), after);
    }

    #[test]
    fn failed_allocation_leaves_store_untouched() {
        let mut store = InstanceStore::new(
            HostBuffer::with_limit("instances", 64),
            LayoutStrategy::Grid,
            LayoutParams::default(),
        );
        store.upload(records(&["a", "b"])).unwrap();
        let err = store.upload(records(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, GpuError::BufferTooLarge { requested: 96, .. }));
        assert_eq!(store.len(), 2);
        assert_eq!(store.read_back().unwrap().len(), 2);
    }

    #[test]
    fn empty_upload_is_valid() {
        let mut store = store();
        store.upload(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.attributes_view().count, 0);
        assert!(store.read_back().unwrap().is_empty());
    }
}
