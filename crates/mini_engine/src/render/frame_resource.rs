//! Per-frame GPU resources
//!
//! Each frame slot owns a command allocator and its own copies of the object
//! and pass constant buffers. The CPU writes a slot only after the frame ring
//! confirmed the GPU is done with it.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use super::backend::{GpuBuffer, RenderDevice};
use super::commands::CommandAllocator;
use super::error::RenderResult;
use crate::foundation::math::{Mat4, Mat4Ext};

/// Round a constant buffer element up to the 256-byte hardware alignment
pub const fn constant_buffer_byte_size(byte_size: usize) -> usize {
    (byte_size + 255) & !255
}

/// Typed view over an upload buffer
///
/// Constant buffers pad every element to 256 bytes; plain upload buffers pack
/// elements tightly.
#[derive(Debug)]
pub struct UploadBuffer<T: Pod> {
    buffer: GpuBuffer,
    element_count: usize,
    element_byte_size: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    /// Allocate room for `element_count` elements
    pub fn new<D: RenderDevice>(
        device: &D,
        label: &'static str,
        element_count: usize,
        is_constant_buffer: bool,
    ) -> RenderResult<Self> {
        let element_byte_size = if is_constant_buffer {
            constant_buffer_byte_size(std::mem::size_of::<T>())
        } else {
            std::mem::size_of::<T>()
        };
        let buffer = device.create_upload_buffer(label, element_byte_size * element_count)?;
        Ok(Self {
            buffer,
            element_count,
            element_byte_size,
            _marker: PhantomData,
        })
    }

    /// Write one element
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn copy_data(&mut self, index: usize, data: &T) {
        assert!(
            index < self.element_count,
            "upload buffer '{}' index {} out of range ({})",
            self.buffer.label(),
            index,
            self.element_count
        );
        self.buffer
            .write(index * self.element_byte_size, bytemuck::bytes_of(data));
    }

    /// Read one element back
    pub fn read(&self, index: usize) -> Option<T> {
        if index >= self.element_count {
            return None;
        }
        self.buffer
            .read(index * self.element_byte_size, std::mem::size_of::<T>())
            .map(|bytes| bytemuck::pod_read_unaligned(&bytes))
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Stride between elements in bytes
    pub fn element_byte_size(&self) -> usize {
        self.element_byte_size
    }

    /// Underlying GPU memory
    pub fn gpu_buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

/// Per-object constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// World matrix as rows of the column-vector matrix
    pub world: [[f32; 4]; 4],
}

impl ObjectConstants {
    /// Constants for a world matrix
    pub fn from_world(world: &Mat4) -> Self {
        Self {
            world: world.to_rows(),
        }
    }

    /// Padded stride of one element inside a constant buffer
    pub const fn element_byte_size() -> usize {
        constant_buffer_byte_size(std::mem::size_of::<Self>())
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self::from_world(&Mat4::identity())
    }
}

/// Per-pass constants
///
/// Matrices are stored as rows of nalgebra's column-vector matrices. Fields
/// are grouped in 16-byte registers with explicit padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    /// World to view
    pub view: [[f32; 4]; 4],
    /// View to world
    pub inv_view: [[f32; 4]; 4],
    /// View to clip
    pub proj: [[f32; 4]; 4],
    /// Clip to view
    pub inv_proj: [[f32; 4]; 4],
    /// World to clip
    pub view_proj: [[f32; 4]; 4],
    /// Clip to world
    pub inv_view_proj: [[f32; 4]; 4],
    /// Camera position in world space
    pub eye_pos: [f32; 3],
    /// Padding
    pub _pad0: f32,
    /// Render target size in pixels
    pub render_target_size: [f32; 2],
    /// Reciprocal of the render target size
    pub inv_render_target_size: [f32; 2],
    /// Near plane distance
    pub near_z: f32,
    /// Far plane distance
    pub far_z: f32,
    /// Seconds since start
    pub total_time: f32,
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Ambient light color
    pub ambient_light: [f32; 4],
    /// Fresnel reflectance at normal incidence
    pub fresnel_r0: [f32; 3],
    /// Surface roughness
    pub roughness: f32,
    /// Light strength
    pub light_strength: [f32; 3],
    /// Distance at which attenuation starts
    pub falloff_start: f32,
    /// Light direction
    pub light_direction: [f32; 3],
    /// Distance at which the light reaches zero
    pub falloff_end: f32,
    /// Light position
    pub light_position: [f32; 3],
    /// Padding
    pub _pad1: f32,
}

impl Default for PassConstants {
    fn default() -> Self {
        let identity = Mat4::identity().to_rows();
        Self {
            view: identity,
            inv_view: identity,
            proj: identity,
            inv_proj: identity,
            view_proj: identity,
            inv_view_proj: identity,
            eye_pos: [0.0; 3],
            _pad0: 0.0,
            render_target_size: [0.0; 2],
            inv_render_target_size: [0.0; 2],
            near_z: 1.0,
            far_z: 1000.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient_light: [0.25, 0.25, 0.35, 1.0],
            fresnel_r0: [0.02, 0.02, 0.02],
            roughness: 0.1,
            light_strength: [2.0, 2.0, 2.0],
            falloff_start: 0.3,
            light_direction: [-1.0, -1.0, 0.0],
            falloff_end: 15.0,
            light_position: [0.0, 2.5, 0.0],
            _pad1: 0.0,
        }
    }
}

impl PassConstants {
    /// Fill the camera matrices and their inverses
    ///
    /// Singular matrices fall back to identity for the inverse.
    pub fn set_camera(&mut self, view: &Mat4, proj: &Mat4) {
        let view_proj = proj * view;
        let invert = |m: &Mat4| m.try_inverse().unwrap_or_else(Mat4::identity).to_rows();

        self.view = view.to_rows();
        self.inv_view = invert(view);
        self.proj = proj.to_rows();
        self.inv_proj = invert(proj);
        self.view_proj = view_proj.to_rows();
        self.inv_view_proj = invert(&view_proj);
    }

    /// Set the render target dimensions
    pub fn set_render_target_size(&mut self, width: u32, height: u32) {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        self.render_target_size = [w, h];
        self.inv_render_target_size = [1.0 / w, 1.0 / h];
    }
}

/// Fence state of one ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never submitted or already retired by the GPU
    Idle,
    /// Submitted with this fence value and not yet retired
    Submitted(u64),
}

/// Resources of one frame in flight
#[derive(Debug)]
pub struct FrameResource {
    /// Recording memory for this slot's command lists
    pub allocator: CommandAllocator,
    /// One element per pass
    pub pass_cb: UploadBuffer<PassConstants>,
    /// One element per render item
    pub object_cb: UploadBuffer<ObjectConstants>,
}

impl FrameResource {
    /// Allocate the slot's allocator and constant buffers
    pub fn new<D: RenderDevice>(
        device: &D,
        slot: usize,
        pass_count: usize,
        object_count: usize,
    ) -> RenderResult<Self> {
        Ok(Self {
            allocator: device.create_command_allocator(slot)?,
            pass_cb: UploadBuffer::new(device, "pass constants", pass_count, true)?,
            object_cb: UploadBuffer::new(device, "object constants", object_count, true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backend::{HeadlessConfig, HeadlessDevice};
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_buffer_size_rounds_to_256() {
        assert_eq!(constant_buffer_byte_size(1), 256);
        assert_eq!(constant_buffer_byte_size(64), 256);
        assert_eq!(constant_buffer_byte_size(256), 256);
        assert_eq!(constant_buffer_byte_size(257), 512);
        assert_eq!(std::mem::size_of::<PassConstants>(), 512);
        assert_eq!(constant_buffer_byte_size(std::mem::size_of::<PassConstants>()), 512);
    }

    #[test]
    fn test_upload_buffer_strides_elements() {
        let device = HeadlessDevice::new(HeadlessConfig::default()).expect("device");
        let mut buffer: UploadBuffer<ObjectConstants> =
            UploadBuffer::new(&device, "objects", 4, true).expect("buffer");

        assert_eq!(buffer.element_byte_size(), 256);
        assert_eq!(buffer.gpu_buffer().byte_size(), 1024);

        let world = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        buffer.copy_data(2, &ObjectConstants::from_world(&world));

        assert_eq!(buffer.read(2), Some(ObjectConstants::from_world(&world)));
        assert_eq!(buffer.read(1).map(|c| c.world), Some([[0.0; 4]; 4]));
        assert!(buffer.read(4).is_none());
    }

    #[test]
    fn test_pass_constants_inverses() {
        let view = Mat4::new_translation(&Vec3::new(0.0, -5.0, 30.0));
        let proj = Mat4::perspective_lh(0.785, 1.5, 1.0, 1000.0);
        let mut pass = PassConstants::default();
        pass.set_camera(&view, &proj);

        let inv_view = Mat4::from_fn(|r, c| pass.inv_view[r][c]);
        assert_relative_eq!(inv_view * view, Mat4::identity(), epsilon = 1e-5);

        let view_proj = Mat4::from_fn(|r, c| pass.view_proj[r][c]);
        assert_relative_eq!(view_proj, proj * view, epsilon = 1e-5);
    }

    #[test]
    fn test_render_target_size_reciprocal() {
        let mut pass = PassConstants::default();
        pass.set_render_target_size(800, 600);
        assert_eq!(pass.render_target_size, [800.0, 600.0]);
        assert_relative_eq!(pass.inv_render_target_size[1], 1.0 / 600.0);
    }
}
