use std::time::Instant;

use crossbeam::{channel, thread};
use log::{info, warn};

use crate::{
    camera::{Camera, CanvasInfo, Sample},
    canvas::{Canvas, Color},
    lighting::Lighting,
    ray::Ray,
    scene::Scene,
    shape::Prim,
};

pub mod march;
pub mod trace;

pub use march::{MarchConfig, Marcher};
pub use trace::Tracer;

const TILE_SIZE: u32 = 16;

/// An individual tile in the rendering target.
#[derive(Debug)]
struct Tile {
    offset_x: u32,
    offset_y: u32,
    width: u32,
    height: u32,
}

/// An iterator for tiles in a rendering target.
#[derive(Debug)]
struct Tiles {
    width: u32,
    height: u32,
    chunks_x: u32,
    chunks_y: u32,
    x: u32,
    y: u32,
}

impl Tiles {
    fn new(width: u32, height: u32) -> Self {
        let chunks_x = (width + TILE_SIZE - 1) / TILE_SIZE;
        let chunks_y = (height + TILE_SIZE - 1) / TILE_SIZE;

        Self {
            width,
            height,
            chunks_x,
            chunks_y,
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.x >= self.chunks_x {
            self.x = 0;
            self.y += 1;
        }

        if self.y >= self.chunks_y {
            return None;
        }

        let offset_x = self.x * TILE_SIZE;
        let offset_y = self.y * TILE_SIZE;
        let width = (self.width - offset_x).min(TILE_SIZE);
        let height = (self.height - offset_y).min(TILE_SIZE);

        self.x += 1;

        Some(Tile {
            offset_x,
            offset_y,
            width,
            height,
        })
    }
}

/// Turns a camera ray into a pixel color.
pub trait Integrator: Sync {
    fn luminance(&self, scene: &Scene, ray: &Ray) -> Color;
}

impl<C> Integrator for Box<C>
where
    C: Integrator + ?Sized,
{
    fn luminance(&self, scene: &Scene, ray: &Ray) -> Color {
        self.as_ref().luminance(scene, ray)
    }
}

/// Which integrator a render pass uses. Fixed for the whole image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Sphere marching with lighting and shadows.
    March,

    /// Analytic intersection with flat colors.
    Trace,
}

impl RenderMode {
    /// Whether shapes of this kind show up in this mode.
    pub fn supports(&self, prim: &Prim) -> bool {
        match self {
            RenderMode::March => prim.marchable(),
            RenderMode::Trace => prim.traceable(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub mode: RenderMode,

    /// Number of worker threads, at least one.
    pub jobs: usize,
    pub march: MarchConfig,
    pub lighting: Lighting,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::March,
            jobs: num_cpus::get(),
            march: MarchConfig::default(),
            lighting: Lighting::default(),
        }
    }
}

impl RenderConfig {
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_march(mut self, march: MarchConfig) -> Self {
        self.march = march;
        self
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    /// Build the integrator for this pass.
    pub fn integrator(&self) -> Box<dyn Integrator> {
        match self.mode {
            RenderMode::March => Box::new(Marcher::new(self.march.clone(), self.lighting.clone())),
            RenderMode::Trace => Box::new(Tracer),
        }
    }
}

/// Render every pixel of the canvas described by `info`. Tiles are handed out to `config.jobs`
/// workers, which share the scene and camera read-only.
pub fn render(config: &RenderConfig, info: &CanvasInfo, scene: &Scene, camera: &dyn Camera) -> Canvas {
    let start = Instant::now();

    info!(
        "rendering {}x{} with {:?} on {} job(s), {} shape(s)",
        info.width,
        info.height,
        config.mode,
        config.jobs,
        scene.len()
    );

    for (id, shape) in scene.iter() {
        if !config.mode.supports(&shape.prim) {
            warn!(
                "shape {} ({:?}) is not rendered in {:?} mode",
                id.index(),
                shape.prim,
                config.mode
            );
        }
    }

    let integrator = config.integrator();
    let integrator = integrator.as_ref();
    let mut canvas = Canvas::new(info.width, info.height);

    let (input, tiles) = channel::unbounded::<Tile>();
    let (results, chunks) = channel::unbounded();

    thread::scope(|s| {
        for _ in 0..config.jobs.max(1) {
            let results = results.clone();
            let tiles = tiles.clone();
            s.spawn(move |_| {
                for tile in tiles {
                    let mut chunk = Canvas::new(tile.width, tile.height);

                    for ((col, row), pixel) in chunk.enumerate_pixels_mut() {
                        let sample = Sample::pixel(col + tile.offset_x, row + tile.offset_y);
                        let ray = camera.generate_ray(&sample);
                        *pixel = integrator.luminance(scene, &ray);
                    }

                    if results.send((tile.offset_x, tile.offset_y, chunk)).is_err() {
                        break;
                    }
                }
            });
        }

        // Only the workers hold senders now, so the loop below ends once they are all done.
        drop(results);

        let tiles = Tiles::new(info.width, info.height);
        s.spawn(move |_| {
            for tile in tiles {
                if input.send(tile).is_err() {
                    break;
                }
            }
        });

        for (offset_x, offset_y, chunk) in chunks {
            canvas.blit(offset_x, offset_y, &chunk)
        }
    })
    .expect("a render worker panicked");

    info!("rendered in {:.2?}", start.elapsed());

    canvas
}
