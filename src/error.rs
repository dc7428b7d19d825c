//! Error types for Mandala.
//!
//! Construction is the only place the engine can fail in a meaningful way:
//! a bad [`SpawnConfig`](crate::SpawnConfig) or a missing collaborator stops
//! the engine before the first frame. Everything after that is the outer
//! shell (window, GPU, texture files) or the render surface.

use thiserror::Error;

/// Top-level error for building and running the engine.
#[derive(Debug, Error)]
pub enum MandalaError {
    /// A tunable is outside the domain the lifecycle math is total over.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The clock, texture pool or render surface was not supplied.
    #[error("missing collaborator: {0} was not supplied")]
    MissingCollaborator(&'static str),
    /// Texture loading failed.
    #[error(transparent)]
    Texture(#[from] TextureError),
    /// Configuration file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// GPU initialisation failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// A frame could not be drawn and the viewer gave up.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Failed to create the event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode an image file.
    #[error("failed to load image '{path}': {source}")]
    ImageLoad {
        /// File that failed to decode.
        path: String,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// Failed to read a file or directory from disk.
    #[error("failed to read texture source: {0}")]
    Io(#[from] std::io::Error),
    /// Raw pixel data does not match the declared dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// `width * height * 4`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
    /// A directory contained no loadable images.
    #[error("no images found in '{0}'")]
    Empty(String),
}

/// Errors that can occur while loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`MandalaConfig`](crate::MandalaConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialised.
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable GPU is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors reported by a [`RenderSurface`](crate::RenderSurface) while presenting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The swapchain texture could not be acquired.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
