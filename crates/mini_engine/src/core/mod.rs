//! Engine core: configuration shared by the renderer and the demo application

pub mod config;

pub use config::{CameraConfig, EngineConfig, FrameConfig, InputConfig, WindowConfig};
