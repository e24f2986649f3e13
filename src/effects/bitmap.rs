use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::animation::ease::Ease;
use crate::animation::phase::PhaseState;
use crate::effects::dither::{DitherEngine, PixelDraw};
use crate::effects::options::{EffectChanges, EffectOptions, EffectOptionsPatch};
use crate::effects::paint::fill_background;
use crate::effects::particles::{Particle, build_particles};
use crate::effects::reveal::{VisiblePixel, variant_for};
use crate::foundation::core::GridLayout;

/// Where fade particles come from for one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleSource {
    /// Reuse the set captured at the start of the live phase.
    Live,
    /// Build a throwaway set from this frame. Never touches the live cache.
    Fresh,
}

/// The dithered bitmap post-effect: sample buffer, output canvas and the live
/// particle cache.
#[derive(Debug)]
pub struct BitmapEffect {
    options: EffectOptions,
    engine: DitherEngine,
    layout: GridLayout,
    sample: RgbaImage,
    output: RgbaImage,
    particles: Option<Vec<Particle>>,
    scratch: Vec<VisiblePixel>,
}

impl BitmapEffect {
    pub fn new(options: EffectOptions, width: u32, height: u32) -> Self {
        let layout = GridLayout::new(width, height, options.pixel_size);
        Self {
            engine: DitherEngine::new(&options),
            sample: RgbaImage::new(layout.grid_width, layout.grid_height),
            output: RgbaImage::new(layout.canvas_width, layout.canvas_height),
            layout,
            options,
            particles: None,
            scratch: Vec::new(),
        }
    }

    pub fn options(&self) -> &EffectOptions {
        &self.options
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn output(&self) -> &RgbaImage {
        &self.output
    }

    pub fn sample(&self) -> &RgbaImage {
        &self.sample
    }

    pub fn has_live_particles(&self) -> bool {
        self.particles.is_some()
    }

    /// Reallocate both buffers. Any in-flight fade restarts from a fresh particle set.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.layout = GridLayout::new(width, height, self.options.pixel_size);
        self.sample = RgbaImage::new(self.layout.grid_width, self.layout.grid_height);
        self.output = RgbaImage::new(self.layout.canvas_width, self.layout.canvas_height);
        self.reset_particles();
    }

    pub fn update_options(&mut self, patch: &EffectOptionsPatch) -> EffectChanges {
        let changes = self.options.apply(patch);
        self.engine.configure(&self.options, changes.palette);
        if changes.pixel_size {
            self.set_size(self.layout.canvas_width, self.layout.canvas_height);
        } else if changes.palette || changes.dither || changes.fade_variant {
            self.reset_particles();
        }
        changes
    }

    pub fn reset_particles(&mut self) {
        self.particles = None;
    }

    fn downsample(&mut self, frame: &RgbaImage) {
        let (gw, gh) = (self.layout.grid_width, self.layout.grid_height);
        if frame.dimensions() == (gw, gh) {
            self.sample.clone_from(frame);
        } else {
            self.sample = imageops::resize(frame, gw, gh, FilterType::Triangle);
        }
    }

    fn fresh_particles(&self) -> Vec<Particle> {
        let mut particles = build_particles(&self.sample, &self.engine, &self.layout);
        variant_for(self.options.fade_variant).init_metadata(&mut particles, &self.layout);
        particles
    }

    /// Dither `frame` (a full-canvas render) into the output canvas.
    pub fn render(&mut self, frame: &RgbaImage, state: PhaseState, source: ParticleSource) {
        self.downsample(frame);
        fill_background(&mut self.output, self.options.background);

        let Some(direction) = state.phase.fade_direction() else {
            self.engine.draw_static(&self.sample, &mut self.output);
            return;
        };

        let particles = match source {
            ParticleSource::Live => match self.particles.take() {
                Some(cached) => cached,
                None => self.fresh_particles(),
            },
            ParticleSource::Fresh => self.fresh_particles(),
        };

        if particles.is_empty() {
            self.engine.draw_static(&self.sample, &mut self.output);
        } else {
            let mut visible = std::mem::take(&mut self.scratch);
            visible.clear();
            variant_for(self.options.fade_variant).visible_pixels(
                &particles,
                &self.layout,
                state.progress,
                direction,
                Ease::InOutCubic,
                &mut visible,
            );
            for vp in &visible {
                let alpha = self.options.alpha_mode.quantize(vp.alpha);
                let draw = PixelDraw {
                    brightness: vp.brightness,
                    color: vp.color,
                    shape: vp.shape,
                };
                self.engine.draw(&mut self.output, vp.x, vp.y, &draw, alpha);
            }
            self.scratch = visible;
        }

        if source == ParticleSource::Live {
            self.particles = Some(particles);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/bitmap.rs"]
mod tests;
