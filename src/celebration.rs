use rand::seq::SliceRandom;
use rand::Rng;

use crate::summary::{Performance, SessionSummary};

const CONFETTI: [char; 6] = ['*', '✦', '●', '■', '▲', '♦'];
const COLOR_COUNT: usize = 7;
const GRAVITY: f64 = 6.0;

/// One piece of confetti
#[derive(Debug, Clone)]
pub struct Confetto {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
}

impl Confetto {
    fn spawn<R: Rng>(rng: &mut R, width: f64) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            // start above the top edge so pieces rain in over time
            y: rng.gen_range(-8.0..0.0),
            vel_x: rng.gen_range(-1.5..1.5),
            vel_y: rng.gen_range(0.5..2.5),
            symbol: *CONFETTI.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..COLOR_COUNT),
        }
    }

    fn update(&mut self, dt: f64) {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y = (self.vel_y + GRAVITY * dt).min(8.0);
    }
}

/// Confetti shower played over the results screen for a good score
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Confetto>,
    pub headline: &'static str,
    pub duration: f64,
    pub elapsed: f64,
    pub is_active: bool,
    pub width: f64,
    pub height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            headline: "",
            duration: 4.0,
            elapsed: 0.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    /// Start the shower if the summary earned one; returns whether it started
    pub fn start_for(&mut self, summary: &SessionSummary, width: u16, height: u16) -> bool {
        let performance = summary.performance();
        if !performance.celebrate() {
            self.stop();
            return false;
        }
        self.start(performance, width, height, &mut rand::thread_rng());
        true
    }

    pub fn start<R: Rng>(&mut self, performance: Performance, width: u16, height: u16, rng: &mut R) {
        self.width = width as f64;
        self.height = height as f64;
        self.elapsed = 0.0;
        self.is_active = true;
        self.headline = headline(performance);

        let count = (width as usize).clamp(20, 120);
        self.particles = (0..count)
            .map(|_| Confetto::spawn(rng, self.width))
            .collect();
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
    }

    /// Advance the animation by `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            p.update(dt);
            p.y <= height && p.x >= -2.0 && p.x <= width + 2.0
        });
        if self.particles.is_empty() {
            self.is_active = false;
        }
    }

    /// Particles currently inside the visible area
    pub fn visible(&self) -> impl Iterator<Item = &Confetto> {
        self.particles
            .iter()
            .filter(move |p| p.y >= 0.0 && p.x >= 0.0 && p.x < self.width && p.y < self.height)
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

fn headline(performance: Performance) -> &'static str {
    match performance {
        Performance::Outstanding => "SUPERSTAR!",
        Performance::Excellent => "EXCELLENT!",
        _ => "GREAT JOB!",
    }
}
