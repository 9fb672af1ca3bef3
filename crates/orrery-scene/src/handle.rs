//! Opaque GPU resource handles.
//!
//! Handles are plain indices owned by whichever registry created them; the
//! scene only passes them back to the renderer.

use crate::shader::{Drawable, ShaderContext};

/// A texture registered with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A vertex (and optional index) buffer registered with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Role of a surface texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
    ];

    /// Texture slot the planet program reads this kind from.
    ///
    /// Slot 1 is reserved for the shadow cubemap.
    pub const fn slot(self) -> u32 {
        match self {
            TextureKind::Diffuse => 0,
            TextureKind::Specular => 2,
            TextureKind::Normal => 3,
        }
    }

    /// Kind encoded in an atlas file name: the letter after the first `_`
    /// (`earth_d.jpg` is diffuse, `earth_n.png` a normal map).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, tail) = name.split_once('_')?;
        match tail.chars().next()?.to_ascii_lowercase() {
            'd' => Some(TextureKind::Diffuse),
            's' => Some(TextureKind::Specular),
            'n' => Some(TextureKind::Normal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
}

/// Textures applied to one body, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSet {
    textures: Vec<Texture>,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: TextureKind, handle: TextureHandle) -> Self {
        self.push(kind, handle);
        self
    }

    pub fn push(&mut self, kind: TextureKind, handle: TextureHandle) {
        self.textures.push(Texture { handle, kind });
    }

    /// First texture of the given kind.
    pub fn first(&self, kind: TextureKind) -> Option<TextureHandle> {
        self.textures
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        self.textures.iter()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// The usual [`Drawable`]: bind each texture to its kind's slot, then issue
/// one indexed draw. Kinds the set lacks are unbound so nothing leaks in
/// from the previous body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedMesh {
    pub mesh: MeshHandle,
}

impl Drawable for IndexedMesh {
    fn draw(&self, shader: &mut dyn ShaderContext, textures: &TextureSet) {
        for kind in TextureKind::ALL {
            if textures.first(kind).is_none() {
                shader.unbind_texture(kind.slot());
            }
        }
        for texture in textures.iter() {
            shader.bind_texture(texture.kind.slot(), texture.handle);
        }
        shader.draw_indexed(self.mesh);
    }
}
