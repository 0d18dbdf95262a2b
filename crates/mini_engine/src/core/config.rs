//! # Unified Configuration System
//!
//! Concrete configuration structures for the engine and the demo application.
//! Every struct derives serde with `#[serde(default)]`, so a configuration
//! file only has to name the values it overrides.
//!
//! ## Configuration Categories
//!
//! - **Frame Config**: frame-resource ring size and fence wait policy
//! - **Camera Config**: initial position and frustum
//! - **Input Config**: movement step and mouse sensitivity
//! - **Window Config**: render target size (drives the aspect ratio)

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::config::{Config, ConfigError};

/// Largest ring the engine accepts; each slot duplicates every constant buffer
pub const MAX_FRAME_RESOURCES: usize = 8;

/// # Frame Configuration
///
/// Controls how many frames the CPU may record ahead of the GPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Number of frame-resource slots in the ring (3 = triple buffering)
    pub frame_resource_count: usize,
    /// Upper bound on a single fence wait in milliseconds; `None` waits forever
    pub fence_timeout_ms: Option<u64>,
    /// Artificial execution time of the headless GPU per submission
    pub simulated_gpu_latency_ms: u64,
}

impl FrameConfig {
    /// Fence timeout as a `Duration`
    pub fn fence_timeout(&self) -> Option<Duration> {
        self.fence_timeout_ms.map(Duration::from_millis)
    }

    /// Simulated GPU latency as a `Duration`
    pub fn simulated_gpu_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_gpu_latency_ms)
    }

    /// Set the ring size
    #[must_use]
    pub fn with_frame_resource_count(mut self, count: usize) -> Self {
        self.frame_resource_count = count;
        self
    }

    /// Set the fence timeout, `None` for an unbounded wait
    #[must_use]
    pub fn with_fence_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fence_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_resource_count == 0 {
            return Err(ConfigError::Invalid(
                "frame_resource_count must be at least 1".to_string(),
            ));
        }
        if self.frame_resource_count > MAX_FRAME_RESOURCES {
            return Err(ConfigError::Invalid(format!(
                "frame_resource_count must not exceed {MAX_FRAME_RESOURCES}"
            )));
        }
        if self.fence_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "fence_timeout_ms of 0 would fail every contended frame".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_resource_count: 3,
            fence_timeout_ms: Some(1000),
            simulated_gpu_latency_ms: 4,
        }
    }
}

/// # Camera Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial camera position in world space
    pub position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, -30.0],
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

/// # Input Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Distance moved per tick while a movement key is held
    pub move_step: f32,
    /// Rotation per pixel of mouse drag, in degrees
    pub mouse_degrees_per_pixel: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            mouse_degrees_per_pixel: 0.25,
        }
    }
}

/// # Window Configuration
///
/// No window is created by the engine; the size only sets the render target
/// dimensions carried in the pass constants and the camera aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Render target width in pixels
    pub width: u32,
    /// Render target height in pixels
    pub height: u32,
}

impl WindowConfig {
    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Shapes".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// # Engine Configuration
///
/// Root configuration loaded by the demo application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Background clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Frame-resource ring settings
    pub frames: FrameConfig,
    /// Camera settings
    pub camera: CameraConfig,
    /// Input settings
    pub input: InputConfig,
    /// Render target settings
    pub window: WindowConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the frame settings
    #[must_use]
    pub fn with_frames(mut self, frames: FrameConfig) -> Self {
        self.frames = frames;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frames.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            // LightGray
            clear_color: [0.827, 0.827, 0.827, 1.0],
            frames: FrameConfig::default(),
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults_are_valid_and_triple_buffered() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frames.frame_resource_count, 3);
        assert_eq!(config.frames.fence_timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_frame_resources_rejected() {
        let frames = FrameConfig::default().with_frame_resource_count(0);
        assert!(matches!(frames.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_ring_rejected() {
        let frames = FrameConfig::default().with_frame_resource_count(MAX_FRAME_RESOURCES + 1);
        assert!(frames.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = "log_level = \"debug\"\n[frames]\nframe_resource_count = 2\nfence_timeout_ms = 250\n";
        let config = EngineConfig::from_str_as(text, ConfigFormat::Toml).expect("valid toml");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.frames.frame_resource_count, 2);
        assert_eq!(config.frames.fence_timeout_ms, Some(250));
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_toml_and_ron_round_trip() {
        let config = EngineConfig::default()
            .with_log_level("trace")
            .with_frames(
                FrameConfig::default()
                    .with_frame_resource_count(2)
                    .with_fence_timeout(Some(Duration::from_millis(500))),
            );

        for format in [ConfigFormat::Toml, ConfigFormat::Ron] {
            let text = config.to_string_as(format).expect("serializes");
            let parsed = EngineConfig::from_str_as(&text, format).expect("parses back");
            assert_eq!(parsed, config);
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = EngineConfig::load_from_file("settings.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
