//! Image decoding, mip chains, cubemap faces and the planet texture atlas.
//!
//! Everything here is CPU-side. [`GpuResources`](crate::GpuResources)
//! uploads the results.

use std::path::{Path, PathBuf};

use image::{RgbaImage, imageops::FilterType};
use orrery_scene::TextureKind;

use crate::error::ResourceError;

/// Number of mip levels for a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decode any supported image file into RGBA8.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, ResourceError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| ResourceError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// `base` followed by successively halved levels, ending at 1x1.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let Some(previous) = chain.last() else { break };
        let width = (previous.width() / 2).max(1);
        let height = (previous.height() / 2).max(1);
        chain.push(image::imageops::resize(previous, width, height, FilterType::Triangle));
    }
    chain
}

/// Six square images of one size, in +X, −X, +Y, −Y, +Z, −Z order.
#[derive(Debug, Clone)]
pub struct CubemapFaces {
    size: u32,
    faces: [RgbaImage; 6],
}

impl CubemapFaces {
    /// `paths` are only used to name the offending file in errors.
    pub fn from_images(faces: [RgbaImage; 6], paths: &[PathBuf; 6]) -> Result<Self, ResourceError> {
        let size = faces[0].width();
        for (face, (image, path)) in faces.iter().zip(paths).enumerate() {
            if image.width() != size || image.height() != size || size == 0 {
                return Err(ResourceError::CubemapFaceSize {
                    face,
                    path: path.clone(),
                    width: image.width(),
                    height: image.height(),
                    size,
                });
            }
        }
        Ok(Self { size, faces })
    }

    /// A cube with every texel set to `color`.
    pub fn solid(color: [u8; 4], size: u32) -> Self {
        let size = size.max(1);
        Self {
            size,
            faces: std::array::from_fn(|_| RgbaImage::from_pixel(size, size, image::Rgba(color))),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[RgbaImage; 6] {
        &self.faces
    }
}

/// Load the six skybox faces. Fails on the first face (in face order) that
/// is missing, undecodable, or not the same square size as the first.
pub fn load_cubemap_faces(paths: &[PathBuf; 6]) -> Result<CubemapFaces, ResourceError> {
    let [px, nx, py, ny, pz, nz] = paths.each_ref().map(|path| load_rgba(path));
    CubemapFaces::from_images([px?, nx?, py?, ny?, pz?, nz?], paths)
}

/// One body's textures, found in `<atlas>/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasEntry {
    pub name: String,
    pub textures: Vec<(TextureKind, PathBuf)>,
}

/// Scan a planet texture directory: one sub-directory per body, each file
/// classified by the letter after the first `_` in its name
/// (`earth_d.jpg` is a diffuse map). Unclassifiable files are skipped.
///
/// Entries and their files come back sorted by name.
pub fn scan_texture_atlas(dir: &Path) -> Result<Vec<AtlasEntry>, ResourceError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ResourceError::Io { path, source }
    };

    let mut entries = Vec::new();
    for body_dir in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let body_dir = body_dir.map_err(io_error(dir))?.path();
        if !body_dir.is_dir() {
            continue;
        }
        let Some(name) = body_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let mut textures = Vec::new();
        for file in std::fs::read_dir(&body_dir).map_err(io_error(&body_dir))? {
            let path = file.map_err(io_error(&body_dir))?.path();
            let kind = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(TextureKind::from_file_name);
            match kind {
                Some(kind) if path.is_file() => textures.push((kind, path)),
                _ => log::debug!("Skipping unrecognised atlas file {}", path.display()),
            }
        }
        textures.sort_by(|a, b| a.1.cmp(&b.1));

        entries.push(AtlasEntry {
            name: name.to_string(),
            textures,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
