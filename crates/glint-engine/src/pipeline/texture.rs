//! Image textures.
//!
//! Images decode on a background thread per texture. Each texture gets its
//! unit when the pass is provisioned and its sampler uniform points at that
//! unit straight away; until the decoded image is uploaded the unit samples
//! the backend's placeholder. Uploads happen at the start of a frame, never
//! mid-frame.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use image::RgbaImage;

use crate::backend::RenderBackend;

use super::error::PipelineError;
use super::target::TextureUnits;

/// Texture coordinate wrapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl FromStr for Wrap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "REPEAT" => Ok(Wrap::Repeat),
            "CLAMP_TO_EDGE" => Ok(Wrap::ClampToEdge),
            "MIRRORED_REPEAT" => Ok(Wrap::MirroredRepeat),
            _ => Err(format!("unknown wrap mode '{s}'")),
        }
    }
}

/// Texel filtering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

impl FromStr for Filter {
    type Err = String;

    /// Mipmapped filter names select their base-level filter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEAREST" | "NEAREST_MIPMAP_NEAREST" | "NEAREST_MIPMAP_LINEAR" => Ok(Filter::Nearest),
            "LINEAR" | "LINEAR_MIPMAP_NEAREST" | "LINEAR_MIPMAP_LINEAR" => Ok(Filter::Linear),
            _ => Err(format!("unknown filter '{s}'")),
        }
    }
}

/// Resolved sampler state of a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Sampling {
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub min: Filter,
    pub mag: Filter,
}

#[derive(Clone)]
pub enum TextureSource {
    Path(PathBuf),
    Image(Arc<RgbaImage>),
}

impl TextureSource {
    pub fn describe(&self) -> String {
        match self {
            TextureSource::Path(p) => p.display().to_string(),
            TextureSource::Image(img) => format!("<image {}x{}>", img.width(), img.height()),
        }
    }
}

impl fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            TextureSource::Image(img) => f
                .debug_tuple("Image")
                .field(&(img.width(), img.height()))
                .finish(),
        }
    }
}

/// A texture a pass samples, bound to the sampler uniform `uniform`.
///
/// `wrap_s`/`wrap_t` take precedence over `wrap`; both default to repeat.
/// Filters default to linear.
#[derive(Debug, Clone)]
pub struct TextureConfig {
    pub source: TextureSource,
    pub uniform: String,
    pub wrap: Option<Wrap>,
    pub wrap_s: Option<Wrap>,
    pub wrap_t: Option<Wrap>,
    pub min: Option<Filter>,
    pub mag: Option<Filter>,
    pub mipmap: bool,
}

impl TextureConfig {
    pub fn from_path(path: impl Into<PathBuf>, uniform: impl Into<String>) -> Self {
        Self::new(TextureSource::Path(path.into()), uniform.into())
    }

    pub fn from_image(image: RgbaImage, uniform: impl Into<String>) -> Self {
        Self::new(TextureSource::Image(Arc::new(image)), uniform.into())
    }

    fn new(source: TextureSource, uniform: String) -> Self {
        Self {
            source,
            uniform,
            wrap: None,
            wrap_s: None,
            wrap_t: None,
            min: None,
            mag: None,
            mipmap: false,
        }
    }

    pub fn wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn wrap_s(mut self, wrap: Wrap) -> Self {
        self.wrap_s = Some(wrap);
        self
    }

    pub fn wrap_t(mut self, wrap: Wrap) -> Self {
        self.wrap_t = Some(wrap);
        self
    }

    pub fn min_filter(mut self, filter: Filter) -> Self {
        self.min = Some(filter);
        self
    }

    pub fn mag_filter(mut self, filter: Filter) -> Self {
        self.mag = Some(filter);
        self
    }

    pub fn mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    pub fn sampling(&self) -> Sampling {
        Sampling {
            wrap_s: self.wrap_s.or(self.wrap).unwrap_or_default(),
            wrap_t: self.wrap_t.or(self.wrap).unwrap_or_default(),
            min: self.min.unwrap_or_default(),
            mag: self.mag.unwrap_or_default(),
        }
    }
}

struct LoadedTexture {
    unit: u32,
    label: String,
    sampling: Sampling,
    image: Result<RgbaImage, PipelineError>,
}

/// Background image decoding with upload on the render thread.
pub struct TextureLoader {
    tx: Sender<LoadedTexture>,
    rx: Receiver<LoadedTexture>,
    pending: usize,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx, pending: 0 }
    }

    /// Starts decoding `config` for `unit`.
    pub fn queue(&mut self, pass: &str, unit: u32, config: &TextureConfig) {
        if config.mipmap {
            log::debug!("pass '{pass}': mipmaps are not generated; '{}' samples level 0", config.uniform);
        }

        log::debug!("pass '{pass}': loading {} into unit {unit}", config.source.describe());
        let label = format!("{pass}/{}", config.uniform);
        let sampling = config.sampling();
        let source = config.source.clone();
        let tx = self.tx.clone();
        self.pending += 1;

        let job = move || {
            let loaded = LoadedTexture {
                unit,
                label,
                sampling,
                image: decode(&source),
            };
            // the receiver is gone once the controller is dropped
            let _ = tx.send(loaded);
        };

        match &config.source {
            TextureSource::Image(_) => job(),
            TextureSource::Path(_) => {
                let spawned = thread::Builder::new()
                    .name(format!("glint texture {unit}"))
                    .spawn(job);
                if let Err(e) = spawned {
                    log::warn!("pass '{pass}': texture thread unavailable ({e}); decoding inline");
                    self.decode_inline(pass, unit, config);
                }
            }
        }
    }

    fn decode_inline(&self, pass: &str, unit: u32, config: &TextureConfig) {
        let loaded = LoadedTexture {
            unit,
            label: format!("{pass}/{}", config.uniform),
            sampling: config.sampling(),
            image: decode(&config.source),
        };
        let _ = self.tx.send(loaded);
    }

    /// Textures queued but not yet uploaded.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Uploads every texture that finished decoding. Returns how many were handled.
    pub fn poll<B: RenderBackend>(&mut self, backend: &mut B, units: &mut TextureUnits) -> usize {
        let mut handled = 0;
        while let Ok(loaded) = self.rx.try_recv() {
            self.upload(backend, units, loaded);
            handled += 1;
        }
        handled
    }

    /// Blocks until every queued texture is uploaded or `timeout` elapses.
    ///
    /// Returns `true` when nothing is left pending.
    pub fn wait<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        units: &mut TextureUnits,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending > 0 {
            match self.rx.recv_deadline(deadline) {
                Ok(loaded) => self.upload(backend, units, loaded),
                Err(_) => break,
            }
        }
        self.pending == 0
    }

    fn upload<B: RenderBackend>(&mut self, backend: &mut B, units: &mut TextureUnits, loaded: LoadedTexture) {
        self.pending = self.pending.saturating_sub(1);

        let image = match loaded.image {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{e}");
                return;
            }
        };

        match backend.create_texture(&loaded.label, &image, loaded.sampling) {
            Ok(handle) => {
                log::debug!(
                    "texture '{}' ({}x{}) bound to unit {}",
                    loaded.label,
                    image.width(),
                    image.height(),
                    loaded.unit
                );
                units.bind(loaded.unit, handle);
            }
            Err(e) => log::warn!("texture '{}' could not be uploaded: {e}", loaded.label),
        }
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes to RGBA8 with the first row at the bottom, as GL samples it.
fn decode(source: &TextureSource) -> Result<RgbaImage, PipelineError> {
    let mut image = match source {
        TextureSource::Path(path) => image::open(path)
            .map_err(|e| PipelineError::TextureLoad {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8(),
        TextureSource::Image(image) => image.as_ref().clone(),
    };
    image::imageops::flip_vertical_in_place(&mut image);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, Recorded};

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    // ── options ───────────────────────────────────────────────────────────

    #[test]
    fn sampling_defaults_to_repeat_and_linear() {
        let config = TextureConfig::from_image(checker(), "tex");
        assert_eq!(config.sampling(), Sampling::default());
        assert_eq!(Sampling::default().wrap_s, Wrap::Repeat);
        assert_eq!(Sampling::default().min, Filter::Linear);
    }

    #[test]
    fn axis_wrap_overrides_shared_wrap() {
        let sampling = TextureConfig::from_image(checker(), "tex")
            .wrap(Wrap::ClampToEdge)
            .wrap_t(Wrap::MirroredRepeat)
            .mag_filter(Filter::Nearest)
            .sampling();
        assert_eq!(sampling.wrap_s, Wrap::ClampToEdge);
        assert_eq!(sampling.wrap_t, Wrap::MirroredRepeat);
        assert_eq!(sampling.mag, Filter::Nearest);
    }

    #[test]
    fn gl_names_parse() {
        assert_eq!("CLAMP_TO_EDGE".parse::<Wrap>(), Ok(Wrap::ClampToEdge));
        assert_eq!("LINEAR_MIPMAP_LINEAR".parse::<Filter>(), Ok(Filter::Linear));
        assert!("BORDER".parse::<Wrap>().is_err());
    }

    // ── loading ───────────────────────────────────────────────────────────

    #[test]
    fn decoded_images_upload_on_poll() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();
        let unit = units.allocate();

        let mut loader = TextureLoader::new();
        loader.queue("p", unit, &TextureConfig::from_image(checker(), "tex"));
        assert_eq!(loader.pending(), 1);
        assert!(units.texture(unit).is_none());

        assert_eq!(loader.poll(&mut backend, &mut units), 1);
        assert_eq!(loader.pending(), 0);
        assert!(units.texture(unit).is_some());
        assert!(backend
            .commands()
            .iter()
            .any(|c| matches!(c, Recorded::CreateTexture { size: [2, 2], .. })));
    }

    #[test]
    fn missing_files_leave_the_placeholder() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();
        let unit = units.allocate();

        let mut loader = TextureLoader::new();
        loader.queue("p", unit, &TextureConfig::from_path("/nonexistent/texture.png", "tex"));

        assert!(loader.wait(&mut backend, &mut units, Duration::from_secs(5)));
        assert!(units.texture(unit).is_none());
    }

    #[test]
    fn images_are_flipped_to_bottom_up_rows() {
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let flipped = decode(&TextureSource::Image(Arc::new(image))).unwrap();
        assert_eq!(flipped.get_pixel(0, 1), &image::Rgba([255, 0, 0, 255]));
    }
}
