//! # Frame driver
//!
//! [`Renderer`] runs one frame in two steps, mirroring a classic update/draw
//! loop:
//!
//! 1. [`Renderer::update`] acquires the next ring slot (blocking on its fence
//!    if the GPU is behind), uploads dirty render items into the slot's object
//!    buffer and writes the pass constants from the camera.
//! 2. [`Renderer::draw`] records clear, bindings and one indexed draw per
//!    render item with the slot's allocator, submits the list and stamps the
//!    slot with a new fence value.
//!
//! Shutdown drains the queue before any slot resource is released.

use std::sync::Arc;

use super::backend::RenderDevice;
use super::commands::{CommandQueue, FillMode, PipelineDesc, PipelineHandle, PrimitiveTopology};
use super::error::{RenderError, RenderResult};
use super::frame_resource::{FrameResource, PassConstants};
use super::frame_ring::{FrameResourceRing, RingStats};
use super::geometry::GeometryBuffer;
use super::primitives::{Camera, ViewState, VERTEX_LAYOUT};
use super::render_item::{RenderItemId, RenderItemRegistry};
use super::scene::Scene;
use crate::core::config::EngineConfig;
use crate::foundation::math::Mat4;
use crate::foundation::time::Timer;

/// Drives frames through the frame resource ring
pub struct Renderer<D: RenderDevice> {
    device: D,
    ring: FrameResourceRing<FrameResource>,
    items: RenderItemRegistry,
    pipeline: PipelineHandle,
    pass: PassConstants,
    clear_color: [f32; 4],
    width: u32,
    height: u32,
    frame_open: bool,
    frames_drawn: u64,
    shut_down: bool,
}

impl<D: RenderDevice> Renderer<D> {
    /// Create the pipeline and one frame resource per ring slot
    ///
    /// # Errors
    /// Invalid configuration, or any device allocation failure.
    pub fn new(device: D, config: &EngineConfig, scene: Scene) -> RenderResult<Self> {
        config.validate()?;

        let frame_count = config.frames.frame_resource_count;
        if scene.items.frame_count() != frame_count {
            return Err(RenderError::InvalidConfig(format!(
                "scene built for {} frame resources, renderer configured for {}",
                scene.items.frame_count(),
                frame_count
            )));
        }

        let pipeline = device.create_pipeline(&PipelineDesc {
            name: "opaque".to_string(),
            vertex_shader: "standard_vs".to_string(),
            pixel_shader: "opaque_ps".to_string(),
            vertex_layout: &VERTEX_LAYOUT,
            topology: PrimitiveTopology::TriangleList,
            fill_mode: FillMode::Solid,
        })?;

        let object_count = scene.items.len().max(1);
        let resources = (0..frame_count)
            .map(|slot| FrameResource::new(&device, slot, 1, object_count))
            .collect::<RenderResult<Vec<_>>>()?;
        let ring = FrameResourceRing::new(resources, device.fence(), config.frames.fence_timeout())?;

        let mut pass = PassConstants::default();
        pass.set_render_target_size(config.window.width, config.window.height);

        log::info!(
            "Renderer ready: {} frame resources, {} render items, geometry '{}'",
            frame_count,
            scene.items.len(),
            scene.geometry.name()
        );

        Ok(Self {
            device,
            ring,
            items: scene.items,
            pipeline,
            pass,
            clear_color: config.clear_color,
            width: config.window.width,
            height: config.window.height,
            frame_open: false,
            frames_drawn: 0,
            shut_down: false,
        })
    }

    /// Begin a frame: wait for a free slot and upload this frame's constants
    ///
    /// Calling it again before [`Renderer::draw`] refreshes the pass
    /// constants of the same slot without advancing the ring. Dirty render
    /// items are uploaded only once per slot acquisition, so each pending
    /// transform still reaches N distinct slots.
    pub fn update(&mut self, camera: &Camera, timer: &Timer) -> RenderResult<()> {
        let acquired = !self.frame_open;
        if acquired {
            self.ring.begin_frame()?;
            self.frame_open = true;
        }

        let view = match camera.view_state() {
            ViewState::Clean => camera.view(),
            ViewState::Stale => {
                log::trace!("Camera view stale at update, using computed view");
                camera.compute_view().1
            }
        };

        self.pass.set_camera(&view, &camera.proj());
        self.pass.eye_pos = camera.position().into();
        self.pass.near_z = camera.near_z();
        self.pass.far_z = camera.far_z();
        self.pass.total_time = timer.total_time();
        self.pass.delta_time = timer.delta_time();

        let frame = self.ring.current_mut();
        if acquired {
            self.items.flush_dirty(&mut frame.object_cb);
        }
        frame.pass_cb.copy_data(0, &self.pass);
        Ok(())
    }

    /// Record and submit the frame started by [`Renderer::update`]
    pub fn draw(&mut self) -> RenderResult<()> {
        if !self.frame_open {
            log::warn!("draw called without update; frame skipped");
            return Ok(());
        }

        let completed = self.ring.completed_fence();
        let frame = self.ring.current_mut();
        frame.allocator.reset(completed);

        let pass_cb = frame.pass_cb.gpu_buffer().clone();
        let object_cb = frame.object_cb.gpu_buffer().clone();

        let mut list = frame.allocator.begin(self.pipeline);
        list.clear(self.clear_color, 1.0);
        list.set_pass_constants(pass_cb);
        list.set_object_constants(object_cb);

        let mut bound: Option<&Arc<GeometryBuffer>> = None;
        for item in self.items.items() {
            if !bound.is_some_and(|geometry| Arc::ptr_eq(geometry, item.geometry())) {
                list.set_geometry(Arc::clone(item.geometry()));
                bound = Some(item.geometry());
            }
            list.draw_indexed(item.cb_index(), item.submesh(), item.topology());
        }
        let recorded = list.close();

        self.device.queue().submit(recorded)?;
        let fence = self.ring.end_frame(self.device.queue())?;
        self.ring.current_mut().allocator.mark_submitted(fence);

        self.frame_open = false;
        self.frames_drawn += 1;
        Ok(())
    }

    /// Adopt a new render target size and update the camera's aspect ratio
    pub fn on_resize(&mut self, width: u32, height: u32, camera: &mut Camera) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.pass.set_render_target_size(self.width, self.height);
        camera.set_frustum(
            camera.fov_y(),
            self.width as f32 / self.height as f32,
            camera.near_z(),
            camera.far_z(),
        );
        log::debug!("Render target resized to {}x{}", self.width, self.height);
    }

    /// Replace a render item's transform; it is re-uploaded to every slot
    pub fn set_transform(&mut self, id: RenderItemId, world: Mat4) -> bool {
        self.items.set_transform(id, world)
    }

    /// Wait for the GPU to finish all submitted work
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn shutdown(&mut self) -> RenderResult<()> {
        if self.shut_down {
            return Ok(());
        }
        self.ring.flush(self.device.queue())?;
        self.shut_down = true;

        let stats = self.ring.stats();
        log::info!(
            "Renderer shut down after {} frames ({} stalls, {:?} waiting)",
            self.frames_drawn,
            stats.stalls,
            stats.wait_time
        );
        Ok(())
    }

    /// Registered render items
    pub fn render_items(&self) -> &RenderItemRegistry {
        &self.items
    }

    /// The frame resource ring
    pub fn ring(&self) -> &FrameResourceRing<FrameResource> {
        &self.ring
    }

    /// Ring counters
    pub fn ring_stats(&self) -> &RingStats {
        self.ring.stats()
    }

    /// The device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Frames submitted so far
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Render target size
    pub fn render_target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<D: RenderDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(err) = self.ring.flush(self.device.queue()) {
                log::error!("Failed to drain GPU queue on drop: {}", err);
            }
        }
    }
}
