//! # Mini Engine
//!
//! A small real-time rendering core built around a fenced ring of frame
//! resources.
//!
//! ## Features
//!
//! - **Frame Resource Ring**: the CPU records up to N frames ahead of the GPU
//!   and blocks only when it would overwrite buffers still in flight
//! - **First-Person Camera**: walk/strafe/pitch/yaw with a re-orthonormalized
//!   basis and an explicit clean/stale view state
//! - **Procedural Shapes**: box, grid and pyramid packed into one shared
//!   geometry buffer
//! - **Render Item Registry**: per-slot dirty tracking of object transforms
//! - **Headless Device**: a simulated GPU queue for running without a window
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mini_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let config = EngineConfig::default();
//!     let device = HeadlessDevice::new(HeadlessConfig::from_frame_config(&config.frames))?;
//!     let scene = Scene::shapes(config.frames.frame_resource_count)?;
//!     let mut renderer = Renderer::new(device, &config, scene)?;
//!
//!     let mut camera = Camera::new();
//!     camera.set_position(0.0, 5.0, -30.0);
//!     let mut timer = Timer::new();
//!
//!     for _ in 0..60 {
//!         timer.tick();
//!         camera.update_view();
//!         renderer.update(&camera, &timer)?;
//!         renderer.draw()?;
//!     }
//!     renderer.shutdown()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ConfigFormat},
        core::config::{CameraConfig, EngineConfig, FrameConfig, InputConfig, WindowConfig},
        foundation::{
            logging,
            math::{Mat4, Transform, Vec3},
            time::{Timer, WaitTimer},
        },
        input::{CameraController, KeyCode, MouseButton, MovementKeys},
        render::{
            Camera, CommandQueue, HeadlessConfig, HeadlessDevice, RenderDevice, RenderError, RenderItemId,
            RenderResult, Renderer, Scene, ShapeKind,
        },
    };
}
