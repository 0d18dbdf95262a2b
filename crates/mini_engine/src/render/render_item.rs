//! Render item registry
//!
//! A render item is one drawable: a world transform, the shared geometry and
//! the draw arguments of one of its sub-meshes. Because every frame slot has
//! its own object constant buffer, a changed transform has to be uploaded N
//! times, once into each slot, before the item is clean again.

use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use super::commands::PrimitiveTopology;
use super::error::{RenderError, RenderResult};
use super::frame_resource::{ObjectConstants, UploadBuffer};
use super::geometry::{GeometryBuffer, ShapeKind, SubmeshGeometry};
use crate::foundation::math::Mat4;

new_key_type! {
    /// Stable handle to a registered render item
    pub struct RenderItemId;
}

/// One drawable object
#[derive(Debug, Clone)]
pub struct RenderItem {
    world: Mat4,
    pending_frames: usize,
    cb_index: u32,
    geometry: Arc<GeometryBuffer>,
    shape: ShapeKind,
    submesh: SubmeshGeometry,
    topology: PrimitiveTopology,
}

impl RenderItem {
    /// World matrix
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Slots that still need the current transform
    pub fn pending_frames(&self) -> usize {
        self.pending_frames
    }

    /// Element index inside every slot's object constant buffer
    pub fn cb_index(&self) -> u32 {
        self.cb_index
    }

    /// Shared geometry
    pub fn geometry(&self) -> &Arc<GeometryBuffer> {
        &self.geometry
    }

    /// Which sub-mesh of the geometry this item draws
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Draw arguments
    pub fn submesh(&self) -> SubmeshGeometry {
        self.submesh
    }

    /// Primitive topology
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }
}

/// Owns all render items and their upload bookkeeping
#[derive(Debug)]
pub struct RenderItemRegistry {
    items: SlotMap<RenderItemId, RenderItem>,
    order: Vec<RenderItemId>,
    frame_count: usize,
}

impl RenderItemRegistry {
    /// Create a registry for a ring of `frame_count` slots
    pub fn new(frame_count: usize) -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
            frame_count,
        }
    }

    /// Register an item drawing `shape` from `geometry`
    ///
    /// The item gets the next constant buffer index and is dirty for every
    /// slot.
    pub fn register(
        &mut self,
        world: Mat4,
        geometry: &Arc<GeometryBuffer>,
        shape: ShapeKind,
    ) -> RenderResult<RenderItemId> {
        let submesh = geometry
            .submesh(shape)
            .ok_or(RenderError::UnknownShape(shape))?;
        let cb_index = self.order.len() as u32;

        let id = self.items.insert(RenderItem {
            world,
            pending_frames: self.frame_count,
            cb_index,
            geometry: Arc::clone(geometry),
            shape,
            submesh,
            topology: PrimitiveTopology::TriangleList,
        });
        self.order.push(id);

        log::debug!("Registered {:?} render item at constant buffer index {}", shape, cb_index);
        Ok(id)
    }

    /// Replace an item's world matrix; returns `false` for an unknown id
    pub fn set_transform(&mut self, id: RenderItemId, world: Mat4) -> bool {
        let frame_count = self.frame_count;
        match self.items.get_mut(id) {
            Some(item) => {
                item.world = world;
                item.pending_frames = frame_count;
                true
            }
            None => false,
        }
    }

    /// Force the item to be re-uploaded into every slot
    pub fn mark_dirty(&mut self, id: RenderItemId) -> bool {
        let frame_count = self.frame_count;
        if let Some(item) = self.items.get_mut(id) {
            item.pending_frames = frame_count;
            true
        } else {
            false
        }
    }

    /// Upload every dirty item into one slot's object buffer
    ///
    /// Returns the number of items written.
    pub fn flush_dirty(&mut self, object_cb: &mut UploadBuffer<ObjectConstants>) -> usize {
        let mut written = 0;
        for item in self.items.values_mut().filter(|item| item.pending_frames > 0) {
            object_cb.copy_data(item.cb_index as usize, &ObjectConstants::from_world(&item.world));
            item.pending_frames -= 1;
            written += 1;
        }
        if written > 0 {
            log::trace!("Flushed {} dirty render items", written);
        }
        written
    }

    /// Look up an item
    pub fn get(&self, id: RenderItemId) -> Option<&RenderItem> {
        self.items.get(id)
    }

    /// Items in registration order
    pub fn items(&self) -> impl Iterator<Item = &RenderItem> {
        self.order.iter().filter_map(|id| self.items.get(*id))
    }

    /// Number of registered items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ring size the pending counters are based on
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backend::{HeadlessConfig, HeadlessDevice};
    use crate::render::geometry::GeometryBuilder;
    use crate::render::primitives::ShapeBuilder;

    fn geometry() -> Arc<GeometryBuffer> {
        Arc::new(
            GeometryBuilder::new("test")
                .add(ShapeKind::Box, &ShapeBuilder::create_box(1.0, 1.0, 1.0), [1.0; 4])
                .build(),
        )
    }

    fn object_buffers(device: &HeadlessDevice, slots: usize, items: usize) -> Vec<UploadBuffer<ObjectConstants>> {
        (0..slots)
            .map(|_| UploadBuffer::new(device, "objects", items, true).expect("buffer"))
            .collect()
    }

    #[test]
    fn test_indices_are_sequential_and_stable() {
        let geometry = geometry();
        let mut registry = RenderItemRegistry::new(3);
        let a = registry.register(Mat4::identity(), &geometry, ShapeKind::Box).expect("a");
        let b = registry.register(Mat4::identity(), &geometry, ShapeKind::Box).expect("b");

        assert_eq!(registry.get(a).map(RenderItem::cb_index), Some(0));
        assert_eq!(registry.get(b).map(RenderItem::cb_index), Some(1));
        assert!(registry.set_transform(a, Mat4::new_scaling(2.0)));
        assert_eq!(registry.get(a).map(RenderItem::cb_index), Some(0));
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let mut registry = RenderItemRegistry::new(3);
        let err = registry
            .register(Mat4::identity(), &geometry(), ShapeKind::Grid)
            .unwrap_err();
        assert_eq!(err, RenderError::UnknownShape(ShapeKind::Grid));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dirty_item_written_once_per_slot() {
        const SLOTS: usize = 3;
        let device = HeadlessDevice::new(HeadlessConfig::default()).expect("device");
        let mut buffers = object_buffers(&device, SLOTS, 1);
        let geometry = geometry();

        let mut registry = RenderItemRegistry::new(SLOTS);
        let id = registry.register(Mat4::identity(), &geometry, ShapeKind::Box).expect("item");

        let moved = Mat4::new_translation(&Vec3::new(4.0, 0.0, 0.0));
        registry.set_transform(id, moved);

        let writes: Vec<usize> = buffers.iter_mut().map(|cb| registry.flush_dirty(cb)).collect();
        assert_eq!(writes, vec![1; SLOTS]);
        for cb in &buffers {
            assert_eq!(cb.read(0), Some(ObjectConstants::from_world(&moved)));
        }

        assert_eq!(registry.flush_dirty(&mut buffers[0]), 0);
        assert_eq!(registry.get(id).map(RenderItem::pending_frames), Some(0));

        assert!(registry.mark_dirty(id));
        assert_eq!(registry.get(id).map(RenderItem::pending_frames), Some(SLOTS));
    }

    #[test]
    fn test_items_iterate_in_registration_order() {
        let geometry = geometry();
        let mut registry = RenderItemRegistry::new(2);
        for x in 0..5 {
            registry
                .register(Mat4::new_translation(&Vec3::new(x as f32, 0.0, 0.0)), &geometry, ShapeKind::Box)
                .expect("item");
        }
        let indices: Vec<u32> = registry.items().map(RenderItem::cb_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(registry.len(), 5);
    }
}
