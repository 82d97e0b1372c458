//! Authoritative scene: records, their instances, and the selection.
//!
//! [`Scene`] is the only mutator of the instance buffer and the selection
//! encoding. Every mutating call allocates whatever new GPU storage it
//! needs before it changes anything, so a resource failure leaves the
//! previous state fully intact and a success leaves store and selection
//! describing the same record sequence.

/// Per-instance buffer and id → slot map.
pub mod instance_store;
/// CPU nearest-hit picking.
pub mod pick;
/// Input records.
pub mod record;
/// Selection set and GPU encoding.
pub mod selection;

use rustc_hash::FxHashSet;

use crate::error::GpuError;
use crate::gpu::buffer::{BufferView, GpuBuffer};
use crate::layout::{LayoutParams, LayoutStrategy};
use crate::math::Ray;
use instance_store::InstanceStore;
pub use pick::PickHit;
use record::{Record, RecordId};
use selection::Selection;

/// Records, instance buffer and selection, kept mutually consistent.
pub struct Scene<B: GpuBuffer> {
    store: InstanceStore<B>,
    selection: Selection<B>,
    pick_radius_scale: f32,
}

impl<B: GpuBuffer> Scene<B> {
    /// Empty scene over the two buffers.
    pub fn new(
        instance_buffer: B,
        selection_buffer: B,
        strategy: LayoutStrategy,
        params: LayoutParams,
        pick_radius_scale: f32,
    ) -> Self {
        Self {
            store: InstanceStore::new(instance_buffer, strategy, params),
            selection: Selection::new(selection_buffer),
            pick_radius_scale,
        }
    }

    /// Replace all records and reset the selection.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if either buffer cannot be allocated; nothing
    /// changes in that case.
    pub fn load(&mut self, records: Vec<Record>) -> Result<(), GpuError> {
        let staged = self.store.stage_upload(records)?;
        let encoding = self.selection.stage_resize(staged.len())?;
        self.selection.reset(encoding, staged.len());
        self.store.commit(staged);
        log::info!(
            "scene loaded {} records ({} layout)",
            self.store.len(),
            self.store.strategy()
        );
        Ok(())
    }

    /// Re-lay out every record under `strategy`, keeping the selection.
    pub fn set_strategy(&mut self, strategy: LayoutStrategy) {
        self.store.recompute(strategy, self.selection.selected());
    }

    /// Replace layout tunables and re-lay out.
    pub fn set_layout_params(&mut self, params: LayoutParams) {
        self.store.set_params(params);
        self.store
            .recompute(self.store.strategy(), self.selection.selected());
    }

    /// Scale applied to instance size to get the pick sphere radius.
    pub fn set_pick_radius_scale(&mut self, scale: f32) {
        self.pick_radius_scale = scale;
    }

    /// Delete the records with these ids. Unknown ids are ignored.
    /// Returns how many records were removed.
    ///
    /// Surviving selected records stay selected at their new slots.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] if either buffer cannot be allocated; nothing
    /// changes in that case.
    pub fn delete_by_ids(&mut self, ids: &[RecordId]) -> Result<usize, GpuError> {
        let staged = self.store.stage_delete(ids, self.selection.selected())?;
        if staged.removed() == 0 {
            return Ok(0);
        }
        let encoding = self.selection.stage_resize(staged.len())?;
        let removed = staged.removed();
        self.selection
            .on_records_deleted(ids, encoding, staged.slots());
        self.store.commit(staged);
        log::info!("deleted {removed} records, {} remain", self.store.len());
        Ok(removed)
    }

    /// Select or deselect `id`. Returns `false`, changing nothing, when no
    /// record has that id.
    pub fn select(&mut self, id: &str, selected: bool) -> bool {
        let Some(slot) = self.store.slot_of(id) else {
            return false;
        };
        let Some(record_id) = self.store.record_at(slot).map(|r| r.id.clone())
        else {
            return false;
        };
        self.selection.apply(&record_id, slot, selected);
        self.store.patch_selected(slot, selected);
        true
    }

    /// Flip the selection of `id`. Returns the new state, or `None` for an
    /// unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let next = !self.selection.contains(id);
        self.select(id, next).then_some(next)
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.store.clear_selected();
    }

    /// Delete every selected record.
    ///
    /// # Errors
    ///
    /// See [`Scene::delete_by_ids`].
    pub fn delete_selected(&mut self) -> Result<usize, GpuError> {
        let ids = self.selected_ids();
        self.delete_by_ids(&ids)
    }

    /// Id of the nearest record hit by `ray`.
    #[must_use]
    pub fn pick(&self, ray: &Ray) -> Option<RecordId> {
        self.pick_hit(ray)
            .and_then(|hit| self.record_id_at(hit.slot))
    }

    /// Nearest hit with slot and distance.
    #[must_use]
    pub fn pick_hit(&self, ray: &Ray) -> Option<PickHit> {
        pick::pick_nearest(ray, self.store.attributes(), self.pick_radius_scale)
    }

    /// Id of the record in `slot`.
    #[must_use]
    pub fn record_id_at(&self, slot: u32) -> Option<RecordId> {
        self.store.record_at(slot).map(|r| r.id.clone())
    }

    /// Currently selected ids.
    #[must_use]
    pub fn selected(&self) -> &FxHashSet<RecordId> {
        self.selection.selected()
    }

    /// Selected ids in slot order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.store
            .records()
            .iter()
            .filter(|r| self.selection.contains(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Most recently selected or deselected id.
    #[must_use]
    pub fn last_touched(&self) -> Option<&RecordId> {
        self.selection.last_touched()
    }

    /// Current records in slot order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Active layout strategy.
    #[must_use]
    pub fn strategy(&self) -> LayoutStrategy {
        self.store.strategy()
    }

    /// Scale applied to instance size to get the pick sphere radius.
    #[must_use]
    pub fn pick_radius_scale(&self) -> f32 {
        self.pick_radius_scale
    }

    /// The instance store.
    #[must_use]
    pub fn store(&self) -> &InstanceStore<B> {
        &self.store
    }

    /// The selection subsystem.
    #[must_use]
    pub fn selection(&self) -> &Selection<B> {
        &self.selection
    }

    /// Instance buffer snapshot for the draw step.
    #[must_use]
    pub fn attributes_view(&self) -> BufferView<'_, B> {
        self.store.attributes_view()
    }

    /// Selection encoding snapshot for the draw step.
    #[must_use]
    pub fn selection_view(&self) -> BufferView<'_, B> {
        self.selection.view()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::gpu::buffer::HostBuffer;

    fn scene() -> Scene<HostBuffer> {
        Scene::new(
            HostBuffer::new("instances"),
            HostBuffer::new("selection"),
            LayoutStrategy::Grid,
            LayoutParams::default(),
            1.5,
        )
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("a", "1990", "x"),
            Record::new("b", "1990", "x"),
            Record::new("c", "2000", "y"),
            Record::new("d", "2010", "y"),
        ]
    }

    /// GPU words, GPU instance flags and CPU set all agree.
    fn assert_consistent(scene: &Scene<HostBuffer>) {
        let words = scene.selection().read_back().unwrap();
        let instances = scene.store().read_back().unwrap();
        assert_eq!(words.len(), scene.len());
        assert_eq!(instances.len(), scene.len());
        for (slot, record) in scene.records().iter().enumerate() {
            let selected = scene.selected().contains(&record.id);
            assert_eq!(words[slot] == 1, selected, "word {slot}");
            assert_eq!(instances[slot].is_selected(), selected, "flag {slot}");
        }
        assert_eq!(scene.attributes_view().count as usize, scene.len());
        assert_eq!(scene.selection_view().count as usize, scene.len());
    }

    #[test]
    fn select_then_deselect() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("c", true));
        assert!(scene.selected().contains("c"));
        assert_consistent(&scene);
        assert!(scene.select("c", false));
        assert!(!scene.selected().contains("c"));
        assert_eq!(scene.last_touched().unwrap().as_str(), "c");
        assert_consistent(&scene);
    }

    #[test]
    fn selecting_unknown_id_fails_without_change() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("b", true));
        assert!(!scene.select("zzz", true));
        let ids: Vec<_> = scene.selected().iter().cloned().collect();
        assert_eq!(ids, vec![RecordId::from("b")]);
        assert_eq!(scene.last_touched().unwrap().as_str(), "b");
        assert_consistent(&scene);
    }

    #[test]
    fn delete_removes_ids_and_shrinks_count() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("a", true));
        assert!(scene.select("d", true));

        let removed = scene
            .delete_by_ids(&[RecordId::from("a"), RecordId::from("missing")])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(scene.attributes_view().count, 3);
        assert!(!scene.selected().contains("a"));
        assert!(scene.selected().contains("d"));
        assert_eq!(scene.store().slot_of("d"), Some(2));
        assert_consistent(&scene);
    }

    #[test]
    fn delete_of_unknown_ids_is_a_no_op() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        let generation = scene.attributes_view().generation;
        assert_eq!(scene.delete_by_ids(&[RecordId::from("q")]).unwrap(), 0);
        assert_eq!(scene.attributes_view().generation, generation);
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn selection_survives_relayout() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("b", true));
        for strategy in LayoutStrategy::ALL {
            scene.set_strategy(strategy);
            assert!(scene.selected().contains("b"));
            assert_consistent(&scene);
        }
    }

    #[test]
    fn clear_empties_everything() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("a", true));
        assert!(scene.select("b", true));
        scene.clear();
        assert!(scene.selected().is_empty());
        assert!(scene.last_touched().is_none());
        assert_consistent(&scene);
    }

    #[test]
    fn load_resets_selection() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert!(scene.select("a", true));
        scene.load(records()).unwrap();
        assert!(scene.selected().is_empty());
        assert_consistent(&scene);
    }

    #[test]
    fn pick_resolves_ids() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        // "a" sits at (-1.25, 0, -1.25); fire straight down at it.
        let ray =
            Ray::new(Vec3::new(-1.25, 10.0, -1.25), Vec3::NEG_Y).unwrap();
        assert_eq!(scene.pick(&ray), Some(RecordId::from("a")));

        let miss = Ray::new(Vec3::new(50.0, 10.0, 50.0), Vec3::NEG_Y).unwrap();
        assert_eq!(scene.pick(&miss), None);
    }

    #[test]
    fn toggle_and_delete_selected() {
        let mut scene = scene();
        scene.load(records()).unwrap();
        assert_eq!(scene.toggle("b"), Some(true));
        assert_eq!(scene.toggle("c"), Some(true));
        assert_eq!(scene.toggle("c"), Some(false));
        assert_eq!(scene.toggle("nope"), None);
        assert_eq!(scene.delete_selected().unwrap(), 1);
        assert_eq!(scene.len(), 3);
        assert!(scene.selected().is_empty());
        assert_consistent(&scene);
    }

    #[test]
    fn resource_failure_leaves_scene_consistent() {
        let mut scene = Scene::new(
            HostBuffer::new("instances"),
            HostBuffer::with_limit("selection", 16),
            LayoutStrategy::Grid,
            LayoutParams::default(),
            1.5,
        );
        scene.load(records()).unwrap();
        assert!(scene.select("a", true));

        let mut more = records();
        more.push(Record::new("e", "2020", "z"));
        assert!(matches!(
            scene.load(more),
            Err(GpuError::BufferTooLarge { requested: 20, .. })
        ));
        assert_eq!(scene.len(), 4);
        assert!(scene.selected().contains("a"));
        assert_consistent(&scene);
    }
}
