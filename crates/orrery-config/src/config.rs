//! Configuration structs with demo defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Render target and projection settings.
    pub render: RenderConfig,
    /// Scene animation settings.
    pub scene: SceneConfig,
    /// Point light and material parameters for the planet program.
    pub light: LightConfig,
    /// Fly camera settings.
    pub camera: CameraConfig,
    /// Asset locations.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in physical pixels.
    pub width: u32,
    /// Window height in physical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Base window title. The FPS readout is appended to it.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Allocate the shadow cubemap and run the shadow pass.
    pub shadows: bool,
    /// Edge length of each shadow cubemap face in texels.
    pub shadow_resolution: u32,
    /// Near plane of the shadow cube projections.
    pub shadow_near: f32,
    /// Far plane of the shadow cube projections; stored depth is
    /// normalized by this distance.
    pub far_plane: f32,
    /// Vertical field of view at zoom level 1.0, in degrees.
    pub fov_degrees: f32,
    /// Camera near plane.
    pub near: f32,
    /// Camera far plane.
    pub far: f32,
    /// Scene clear color (linear RGBA).
    pub clear_color: [f32; 4],
    /// Abort startup on resource failures instead of degrading.
    pub strict_resources: bool,
}

/// Scene animation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Start with planets moving along their orbits.
    pub orbiting: bool,
}

/// Light and material parameters uploaded to the planet program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    pub ambient: f32,
    pub diffuse: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Specular exponent of the planet material.
    pub shininess: f32,
}

/// Fly camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position in world units.
    pub position: [f32; 3],
    /// Starting yaw in degrees (-90 looks down -Z).
    pub yaw_degrees: f32,
    /// Starting pitch in degrees.
    pub pitch_degrees: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub sensitivity: f32,
    /// Smallest field of view reachable with the scroll wheel, in degrees.
    pub min_zoom_degrees: f32,
    /// Largest field of view reachable with the scroll wheel, in degrees.
    pub max_zoom_degrees: f32,
}

/// Asset locations. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding one sub-directory of textures per body.
    pub planet_textures: PathBuf,
    /// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [PathBuf; 6],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the FPS readout in the window title.
    pub show_fps: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadows: false,
            shadow_resolution: 1024,
            shadow_near: 1.0,
            far_plane: 100.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            strict_resources: false,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { orbiting: true }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient: 0.03,
            diffuse: 1.0,
            constant: 1.0,
            linear: 0.0056,
            quadratic: 0.000014,
            shininess: 8.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 61.0, 0.0],
            yaw_degrees: -90.0,
            pitch_degrees: -89.0,
            speed: 2.5,
            sensitivity: 0.1,
            min_zoom_degrees: 1.0,
            max_zoom_degrees: 45.0,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        let skybox = Path::new("assets").join("skybox");
        Self {
            planet_textures: Path::new("assets").join("planets"),
            skybox_faces: [
                skybox.join("right.jpg"),
                skybox.join("left.jpg"),
                skybox.join("top.jpg"),
                skybox.join("bottom.jpg"),
                skybox.join("front.jpg"),
                skybox.join("back.jpg"),
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

impl Config {
    /// Reject values the renderer cannot work with.
    ///
    /// Parsing accepts anything well-typed; this catches zero-sized windows,
    /// empty shadow maps and inverted clip ranges before any GPU resource is
    /// created from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            });
        }
        if self.render.shadow_resolution == 0 {
            return Err(ConfigError::Invalid {
                field: "render.shadow_resolution",
                reason: "must be non-zero".to_string(),
            });
        }
        if !(self.render.near > 0.0 && self.render.near < self.render.far) {
            return Err(ConfigError::Invalid {
                field: "render.near",
                reason: format!(
                    "expected 0 < near < far, got near={} far={}",
                    self.render.near, self.render.far
                ),
            });
        }
        if !(self.render.shadow_near > 0.0 && self.render.shadow_near < self.render.far_plane) {
            return Err(ConfigError::Invalid {
                field: "render.far_plane",
                reason: format!(
                    "expected 0 < shadow_near < far_plane, got shadow_near={} far_plane={}",
                    self.render.shadow_near, self.render.far_plane
                ),
            });
        }
        if self.camera.min_zoom_degrees > self.camera.max_zoom_degrees {
            return Err(ConfigError::Invalid {
                field: "camera.min_zoom_degrees",
                reason: "must not exceed max_zoom_degrees".to_string(),
            });
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::io(config_dir))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&config_path, serialized).map_err(ConfigError::io(&config_path))?;
        Ok(())
    }

    /// Re-read the file; `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::io(path))?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
