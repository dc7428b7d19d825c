//! Image pool and round-robin texture hand-out.
//!
//! Textures are decoded once, before the engine starts, into a fixed
//! [`TexturePool`]. Planes never own pixels; they hold a [`TextureHandle`],
//! a cheap shared reference tagged with a stable [`TextureId`] so the renderer
//! uploads each image to the GPU only once.
//!
//! # Quick Start
//!
//! ```ignore
//! use mandala::textures::{TextureCycler, TexturePool};
//!
//! // creations/1.png .. creations/24.png
//! let pool = TexturePool::load_numbered("creations", 24, "png")?;
//! let mut cycler = TextureCycler::new(pool)?;
//! let first = cycler.next();
//! ```
//!
//! # Supported Formats
//!
//! - PNG (recommended, keeps the alpha channel the cutout relies on)
//! - JPEG

use crate::error::{MandalaError, TextureError};
use std::path::Path;
use std::sync::Arc;

/// Stable index of a texture within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// Human-readable name (file name for loaded images).
    pub label: String,
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureImage {
    /// Wrap raw RGBA data.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // 2x1: white, transparent
    /// let img = TextureImage::from_rgba("pair", vec![255, 255, 255, 255, 0, 0, 0, 0], 2, 1)?;
    /// ```
    pub fn from_rgba(
        label: impl Into<String>,
        data: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            label: label.into(),
            data,
            width,
            height,
        })
    }

    /// Decode an image file into RGBA8.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::ImageLoad {
                path: path.display().to_string(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            label,
            data: img.into_raw(),
            width,
            height,
        })
    }

    /// 1x1 texture of a single colour.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            label: format!("solid #{r:02x}{g:02x}{b:02x}{a:02x}"),
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
        }
    }

    /// Soft round petal: `inner` at the centre blending to `outer` at the rim,
    /// fully transparent outside the circle.
    ///
    /// Stands in for artwork when no image directory is available.
    pub fn petal(size: u32, inner: [u8; 3], outer: [u8; 3]) -> Self {
        let size = size.max(2);
        let half = (size - 1) as f32 / 2.0;
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 - half) / half;
                let dy = (y as f32 - half) / half;
                let d = (dx * dx + dy * dy).sqrt().min(1.0);
                data.push(lerp_u8(inner[0], outer[0], d));
                data.push(lerp_u8(inner[1], outer[1], d));
                data.push(lerp_u8(inner[2], outer[2], d));
                // Opaque core, soft rim
                let alpha = 1.0 - ((d - 0.6) / 0.4).clamp(0.0, 1.0);
                data.push((alpha * 255.0).round() as u8);
            }
        }
        Self {
            label: format!("petal {size}px"),
            data,
            width: size,
            height: size,
        }
    }
}

/// Helper function for linear interpolation of u8 values.
fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round() as u8
}

/// Shared, read-only reference to a pooled texture.
#[derive(Debug, Clone)]
pub struct TextureHandle {
    id: TextureId,
    image: Arc<TextureImage>,
}

impl TextureHandle {
    /// Pool index of this texture.
    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// The decoded pixels.
    #[inline]
    pub fn image(&self) -> &TextureImage {
        &self.image
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Ordered, fixed-size collection of decoded textures.
#[derive(Debug, Clone, Default)]
pub struct TexturePool {
    handles: Vec<TextureHandle>,
}

impl TexturePool {
    /// Build a pool; ids follow the order of `images`.
    pub fn new(images: impl IntoIterator<Item = TextureImage>) -> Self {
        let handles = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| TextureHandle {
                id: TextureId(i as u32),
                image: Arc::new(image),
            })
            .collect();
        Self { handles }
    }

    /// Load `1.<ext>` through `<count>.<ext>` from `dir`.
    pub fn load_numbered(dir: impl AsRef<Path>, count: u32, extension: &str) -> Result<Self, TextureError> {
        let dir = dir.as_ref();
        let images = (1..=count)
            .map(|i| TextureImage::from_file(dir.join(format!("{i}.{extension}"))))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} textures from {}", images.len(), dir.display());
        Ok(Self::new(images))
    }

    /// Load every PNG/JPEG in `dir`, ordered by file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, TextureError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(TextureError::Empty(dir.display().to_string()));
        }
        paths.sort();
        let images = paths
            .iter()
            .map(TextureImage::from_file)
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} textures from {}", images.len(), dir.display());
        Ok(Self::new(images))
    }

    /// `count` procedural petals in a warm-to-cool palette.
    pub fn procedural(count: u32) -> Self {
        let count = count.max(1);
        let images = (0..count).map(|i| {
            let t = i as f32 / count as f32;
            let outer = [
                lerp_u8(255, 90, t),
                lerp_u8(120, 160, t),
                lerp_u8(80, 255, t),
            ];
            TextureImage::petal(64, [255, 245, 230], outer)
        });
        Self::new(images)
    }

    /// Number of textures.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the pool holds no textures.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Texture at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&TextureHandle> {
        self.handles.get(index)
    }

    /// All textures in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &TextureHandle> {
        self.handles.iter()
    }
}

/// Hands out pool textures in round-robin order.
///
/// The cursor starts at 0 and is advanced *before* each read, so a fresh
/// cycler over `N > 1` textures returns index 1 first and index 0 on the
/// `N`th call.
#[derive(Debug, Clone)]
pub struct TextureCycler {
    pool: TexturePool,
    cursor: usize,
}

impl TextureCycler {
    /// Wrap a non-empty pool.
    pub fn new(pool: TexturePool) -> Result<Self, MandalaError> {
        if pool.is_empty() {
            return Err(MandalaError::MissingCollaborator("texture pool"));
        }
        Ok(Self { pool, cursor: 0 })
    }

    /// Advance the cursor and return the texture under it.
    pub fn next(&mut self) -> TextureHandle {
        self.cursor = (self.cursor + 1) % self.pool.len();
        self.pool.handles[self.cursor].clone()
    }

    /// Index the cursor currently points at.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The underlying pool.
    pub fn pool(&self) -> &TexturePool {
        &self.pool
    }
}
