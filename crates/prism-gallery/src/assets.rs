//! Image loading for the gallery.
//!
//! Loads run on worker threads and hand their result back through a
//! one-shot channel that the frame loop polls. Missing or unreadable files
//! fall back to procedurally generated images so the page always completes.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use futures::channel::oneshot;
use prism_engine::Value;
use prism_engine::resource::image_value;

/// Cube face file stems, in layer order (+X, -X, +Y, -Y, +Z, -Z).
const FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

const FALLBACK_SIZE: u32 = 64;

/// Diffuse and specular environment cubes, six faces each.
pub struct EnvMaps {
    pub diffuse: Vec<Value>,
    pub specular: Vec<Value>,
}

/// The result of a load started with [`spawn_load`].
pub struct Pending<T> {
    name: &'static str,
    rx: Option<oneshot::Receiver<T>>,
}

impl<T> Pending<T> {
    /// Takes the result if the load finished since the last poll.
    pub fn poll(&mut self) -> Option<T> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(Some(value)) => {
                self.rx = None;
                log::info!("{} loaded", self.name);
                Some(value)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                log::warn!("{} load was dropped; its slot stays empty", self.name);
                self.rx = None;
                None
            }
        }
    }
}

/// Runs `load` on a named worker thread.
pub fn spawn_load<T, F>(name: &'static str, load: F) -> Pending<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new().name(format!("load {name}")).spawn(move || {
        let _ = tx.send(load());
    });
    if let Err(e) = spawned {
        log::error!("failed to spawn loader for {name}: {e}");
    }
    Pending { name, rx: Some(rx) }
}

/// Decodes an image file into an RGBA8 image descriptor.
pub fn load_image(path: &Path) -> Result<Value> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(image_value(width, height, image.into_raw()))
}

/// Loads `<dir>/diffuse_<face>.png` and `<dir>/specular_<face>.png`.
pub fn load_env_maps(dir: &Path) -> Result<EnvMaps> {
    let cube = |prefix: &str| -> Result<Vec<Value>> {
        FACES
            .iter()
            .map(|face| load_image(&dir.join(format!("{prefix}_{face}.png"))))
            .collect()
    };
    Ok(EnvMaps {
        diffuse: cube("diffuse")?,
        specular: cube("specular")?,
    })
}

pub fn env_maps_or_fallback(dir: PathBuf) -> EnvMaps {
    load_env_maps(&dir).unwrap_or_else(|e| {
        log::warn!("{e:#}; using a generated sky");
        fallback_env_maps()
    })
}

pub fn brdf_or_fallback(path: PathBuf) -> Value {
    load_image(&path).unwrap_or_else(|e| {
        log::warn!("{e:#}; using an analytic BRDF table");
        fallback_brdf()
    })
}

pub fn fallback_env_maps() -> EnvMaps {
    EnvMaps {
        diffuse: sky_cube(FALLBACK_SIZE, 0.6),
        specular: sky_cube(FALLBACK_SIZE, 1.0),
    }
}

pub fn fallback_brdf() -> Value {
    brdf_lut(FALLBACK_SIZE)
}

/// Vertical gradient sky, the same on every side face.
fn sky_cube(size: u32, intensity: f32) -> Vec<Value> {
    let zenith = [0.35, 0.55, 0.9];
    let horizon = [0.9, 0.85, 0.75];
    let ground = [0.25, 0.22, 0.2];

    FACES
        .iter()
        .map(|face| {
            let mut pixels = Vec::with_capacity((size * size * 4) as usize);
            for y in 0..size {
                let t = y as f32 / (size - 1).max(1) as f32;
                let color = match *face {
                    "top" => zenith,
                    "bottom" => ground,
                    _ if t < 0.5 => mix(zenith, horizon, t * 2.0),
                    _ => mix(horizon, ground, (t - 0.5) * 2.0),
                };
                for _ in 0..size {
                    pixels.extend(color.map(|c| to_u8(c * intensity)));
                    pixels.push(255);
                }
            }
            image_value(size, size, pixels)
        })
        .collect()
}

/// Split-sum BRDF table from the analytic approximation for mobile
/// (Karis 2014). x is N·V, y is roughness; scale in red, bias in green.
fn brdf_lut(size: u32) -> Value {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        let roughness = (y as f32 + 0.5) / size as f32;
        for x in 0..size {
            let n_dot_v = (x as f32 + 0.5) / size as f32;
            let c0 = [-1.0, -0.0275, -0.572, 0.022];
            let c1 = [1.0, 0.0425, 1.04, -0.04];
            let r = [
                roughness * c0[0] + c1[0],
                roughness * c0[1] + c1[1],
                roughness * c0[2] + c1[2],
                roughness * c0[3] + c1[3],
            ];
            let a004 = (r[0] * r[0]).min((-9.28 * n_dot_v).exp2()) * r[0] + r[1];
            let scale = a004 * -1.04 + r[2];
            let bias = a004 * 1.04 + r[3];
            pixels.extend([to_u8(scale), to_u8(bias), 0, 255]);
        }
    }
    image_value(size, size, pixels)
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Checkerboard base color for the ball.
pub fn checker(size: u32, cells: u32, a: [u8; 3], b: [u8; 3]) -> Value {
    let cell = (size / cells.max(1)).max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            pixels.extend(color);
            pixels.push(255);
        }
    }
    image_value(size, size, pixels)
}

#[cfg(test)]
mod tests {
    use prism_engine::resource::{Resource, SamplerImages};

    use super::*;

    #[test]
    fn fallbacks_are_valid_texture_payloads() {
        let sky = sky_cube(8, 1.0);
        let textures = Resource::textures(Value::object([
            ("u_brdfLUT", brdf_lut(8)),
            ("u_DiffuseEnvSampler", Value::from(sky)),
            ("u_BaseColorSampler", checker(8, 2, [255, 255, 255], [0, 0, 0])),
        ]))
        .unwrap();

        let env = textures.get("u_DiffuseEnvSampler").unwrap();
        assert!(matches!(SamplerImages::from_value(env), Ok(SamplerImages::Cube(faces)) if faces.len() == 6));
    }

    #[test]
    fn missing_files_fall_back() {
        let dir = PathBuf::from("/nonexistent/prism/ibl");
        assert!(load_env_maps(&dir).is_err());

        let maps = env_maps_or_fallback(dir.clone());
        assert_eq!(maps.diffuse.len(), 6);
        assert_eq!(maps.specular.len(), 6);
        assert!(brdf_or_fallback(dir.join("brdfLUT.png")).get("width").is_ok());
    }

    #[test]
    fn spawned_load_is_polled_to_completion() {
        let mut pending = spawn_load("answer", || 42);
        let mut result = None;
        for _ in 0..1000 {
            if let Some(v) = pending.poll() {
                result = Some(v);
                break;
            }
            thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(result, Some(42));
        assert_eq!(pending.poll(), None);
    }
}
