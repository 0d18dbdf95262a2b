//! The shapes scene: two boxes, a ground grid and a pyramid

use std::sync::Arc;

use super::error::RenderResult;
use super::geometry::{GeometryBuffer, GeometryBuilder, ShapeKind};
use super::primitives::ShapeBuilder;
use super::render_item::{RenderItemId, RenderItemRegistry};
use crate::foundation::math::{Transform, Vec3};

/// Box color (dark green)
pub const BOX_COLOR: [f32; 4] = [0.0, 0.392, 0.0, 1.0];
/// Grid color (aqua)
pub const GRID_COLOR: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
/// Pyramid color (coral)
pub const PYRAMID_COLOR: [f32; 4] = [1.0, 0.498, 0.314, 1.0];

/// Where the pyramid stands
pub const PYRAMID_POSITION: [f32; 3] = [-4.0, 0.0, 6.0];

/// Build the concatenated box/grid/pyramid geometry
pub fn build_shape_geometry() -> GeometryBuffer {
    GeometryBuilder::new("shapeGeo")
        .add(ShapeKind::Box, &ShapeBuilder::create_box(1.5, 1.5, 1.5), BOX_COLOR)
        .add(ShapeKind::Grid, &ShapeBuilder::create_grid(50.0, 50.0, 10, 10), GRID_COLOR)
        .add(ShapeKind::Pyramid, &ShapeBuilder::create_pyramid(2.0, 2.0, 4.0), PYRAMID_COLOR)
        .build()
}

/// Handles of the scene's render items
#[derive(Debug, Clone, Copy)]
pub struct SceneItems {
    /// Box at the left, scaled by 2
    pub left_box: RenderItemId,
    /// Box at the right, scaled by 3
    pub right_box: RenderItemId,
    /// Ground grid
    pub grid: RenderItemId,
    /// Pyramid
    pub pyramid: RenderItemId,
}

/// Geometry plus registered render items, ready to hand to the renderer
#[derive(Debug)]
pub struct Scene {
    /// Shared geometry
    pub geometry: Arc<GeometryBuffer>,
    /// Registered items
    pub items: RenderItemRegistry,
    /// Handles of the four items
    pub handles: SceneItems,
}

impl Scene {
    /// Build the shapes scene for a ring of `frame_count` slots
    pub fn shapes(frame_count: usize) -> RenderResult<Self> {
        let geometry = Arc::new(build_shape_geometry());
        let mut items = RenderItemRegistry::new(frame_count);

        let left_box = items.register(
            Transform::from_position(Vec3::new(-5.0, 1.5, -6.0))
                .with_uniform_scale(2.0)
                .to_matrix(),
            &geometry,
            ShapeKind::Box,
        )?;
        let right_box = items.register(
            Transform::from_position(Vec3::new(5.0, 2.0, 6.0))
                .with_uniform_scale(3.0)
                .to_matrix(),
            &geometry,
            ShapeKind::Box,
        )?;
        let grid = items.register(Transform::identity().to_matrix(), &geometry, ShapeKind::Grid)?;
        let pyramid = items.register(pyramid_transform(0.0).to_matrix(), &geometry, ShapeKind::Pyramid)?;

        Ok(Self {
            geometry,
            items,
            handles: SceneItems {
                left_box,
                right_box,
                grid,
                pyramid,
            },
        })
    }
}

/// Pyramid placement turned by `yaw` radians about its own axis
pub fn pyramid_transform(yaw: f32) -> Transform {
    Transform::from_position(Vec3::from(PYRAMID_POSITION)).with_yaw(yaw)
}
