//! Weather particle overlay.
//!
//! The overlay is a pure function of `(kind, width, height)` over time. It
//! never reads or writes scene content and takes no pointer input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Ambient weather on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    #[default]
    None,
    Rain,
    Snow,
    Embers,
    Fog,
}

impl WeatherKind {
    /// Number of particles in the pool for this kind.
    pub fn particle_count(self) -> usize {
        match self {
            WeatherKind::None => 0,
            WeatherKind::Rain => 500,
            WeatherKind::Snow => 200,
            WeatherKind::Embers => 100,
            WeatherKind::Fog => 50,
        }
    }
}

/// One particle, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Streak length (rain), radius (snow, embers, fog).
    pub size: f64,
    /// Remaining life in frames (embers only).
    pub life: f64,
    pub max_life: f64,
}

impl Particle {
    /// Opacity in `[0, 1]` for the given weather.
    pub fn alpha(&self, kind: WeatherKind) -> f64 {
        match kind {
            WeatherKind::None => 0.0,
            WeatherKind::Rain => 0.5,
            WeatherKind::Snow => 0.8,
            WeatherKind::Embers => {
                if self.max_life > 0.0 {
                    (self.life / self.max_life).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            WeatherKind::Fog => 0.08,
        }
    }
}

/// Fixed-size particle pool for one weather kind and viewport size.
#[derive(Debug, Clone)]
pub struct WeatherOverlay {
    kind: WeatherKind,
    width: f64,
    height: f64,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl WeatherOverlay {
    /// Create an overlay seeded from system entropy.
    pub fn new(kind: WeatherKind, width: f64, height: f64) -> Self {
        Self::with_rng(kind, width, height, StdRng::from_entropy())
    }

    /// Create an overlay with a deterministic random source.
    pub fn with_seed(kind: WeatherKind, width: f64, height: f64, seed: u64) -> Self {
        Self::with_rng(kind, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kind: WeatherKind, width: f64, height: f64, rng: StdRng) -> Self {
        let mut overlay = Self {
            kind,
            width,
            height,
            particles: Vec::new(),
            rng,
        };
        overlay.reseed();
        overlay
    }

    pub fn kind(&self) -> WeatherKind {
        self.kind
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether there is anything to animate.
    pub fn is_active(&self) -> bool {
        self.kind != WeatherKind::None && !self.particles.is_empty()
    }

    /// Change kind or viewport size. The pool is re-seeded only on change.
    /// Returns true if it was re-seeded.
    pub fn configure(&mut self, kind: WeatherKind, width: f64, height: f64) -> bool {
        if kind == self.kind && width == self.width && height == self.height {
            return false;
        }
        self.kind = kind;
        self.width = width;
        self.height = height;
        self.reseed();
        true
    }

    fn reseed(&mut self) {
        let count = if self.width > 0.0 && self.height > 0.0 {
            self.kind.particle_count()
        } else {
            0
        };
        self.particles = (0..count).map(|_| self.spawn()).collect();
    }

    fn random_x(&mut self) -> f64 {
        self.rng.gen_range(0.0..self.width)
    }

    fn spawn(&mut self) -> Particle {
        let x = self.random_x();
        let y = self.rng.gen_range(0.0..self.height);
        match self.kind {
            WeatherKind::Rain => Particle {
                x,
                y,
                vx: 0.0,
                vy: self.rng.gen_range(10.0..=20.0),
                size: self.rng.gen_range(10.0..=20.0),
                life: 0.0,
                max_life: 0.0,
            },
            WeatherKind::Snow => Particle {
                x,
                y,
                vx: 0.0,
                vy: self.rng.gen_range(1.0..=3.0),
                size: self.rng.gen_range(2.0..=5.0),
                life: 0.0,
                max_life: 0.0,
            },
            WeatherKind::Embers => {
                let max_life = self.rng.gen_range(100.0..=200.0);
                Particle {
                    x,
                    y,
                    vx: self.rng.gen_range(-0.5..=0.5),
                    vy: -self.rng.gen_range(1.0..=3.0),
                    size: self.rng.gen_range(1.0..=3.0),
                    life: self.rng.gen_range(0.0..=max_life),
                    max_life,
                }
            }
            WeatherKind::Fog => {
                let heading = self.rng.gen_range(0.0..TAU);
                let speed = self.rng.gen_range(0.1..=0.5);
                Particle {
                    x,
                    y,
                    vx: heading.cos() * speed,
                    vy: heading.sin() * speed,
                    size: self.rng.gen_range(50.0..=150.0),
                    life: 0.0,
                    max_life: 0.0,
                }
            }
            WeatherKind::None => Particle {
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                size: 0.0,
                life: 0.0,
                max_life: 0.0,
            },
        }
    }

    /// Advance the simulation by `dt` seconds (one frame at 60 fps is `1/60`).
    pub fn update(&mut self, dt: f64) {
        if !self.is_active() || dt <= 0.0 {
            return;
        }
        let step = dt * 60.0;
        let (width, height) = (self.width, self.height);
        // Detach the pool so respawns can borrow the rng.
        let mut particles = std::mem::take(&mut self.particles);
        for p in &mut particles {
            match self.kind {
                WeatherKind::Rain => {
                    p.x += p.vx * step;
                    p.y += p.vy * step;
                    if p.y > height {
                        p.y = -p.size;
                        p.x = self.random_x();
                    }
                }
                WeatherKind::Snow => {
                    p.y += p.vy * step;
                    p.x = (p.x + (p.y * 0.01).sin() * 0.5 * step).rem_euclid(width);
                    if p.y > height {
                        p.y = -p.size;
                        p.x = self.random_x();
                    }
                }
                WeatherKind::Embers => {
                    p.x += p.vx * step;
                    p.y += p.vy * step;
                    p.life -= step;
                    if p.life <= 0.0 || p.y < -p.size {
                        p.y = height;
                        p.x = self.random_x();
                        p.life = p.max_life;
                    }
                }
                WeatherKind::Fog => {
                    p.x = (p.x + p.vx * step).rem_euclid(width);
                    p.y = (p.y + p.vy * step).rem_euclid(height);
                }
                WeatherKind::None => {}
            }
        }
        self.particles = particles;
    }
}

/// One rendered frame published by [`WeatherAnimation`].
#[derive(Debug, Clone)]
pub struct WeatherFrame {
    pub kind: WeatherKind,
    pub width: f64,
    pub height: f64,
    pub particles: Vec<Particle>,
}

enum AnimationCommand {
    Configure { kind: WeatherKind, width: f64, height: f64 },
    Stop,
}

/// Runs a [`WeatherOverlay`] on its own thread at a fixed frame rate.
///
/// Frames are published over a small bounded channel; frames nobody polls
/// are dropped. The loop ends on [`stop`](Self::stop), on drop, or when the
/// weather is reconfigured to [`WeatherKind::None`].
pub struct WeatherAnimation {
    cmd_tx: Sender<AnimationCommand>,
    frame_rx: Receiver<WeatherFrame>,
    handle: Option<JoinHandle<()>>,
}

impl WeatherAnimation {
    /// Start animating. Returns `None` for [`WeatherKind::None`].
    pub fn start(kind: WeatherKind, width: f64, height: f64, fps: u32) -> Option<Self> {
        if kind == WeatherKind::None {
            return None;
        }
        let (cmd_tx, cmd_rx) = mpsc::channel::<AnimationCommand>();
        let (frame_tx, frame_rx) = mpsc::sync_channel::<WeatherFrame>(2);
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        let overlay = WeatherOverlay::new(kind, width, height);

        let handle = thread::spawn(move || run_animation(overlay, interval, cmd_rx, frame_tx));
        log::debug!("Weather animation started: {:?} {}x{}", kind, width, height);

        Some(Self {
            cmd_tx,
            frame_rx,
            handle: Some(handle),
        })
    }

    /// Most recent frame, discarding older ones.
    pub fn latest_frame(&self) -> Option<WeatherFrame> {
        let mut latest = None;
        loop {
            match self.frame_rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return latest,
            }
        }
    }

    /// Change weather or viewport. Returns false if the loop has ended.
    pub fn reconfigure(&self, kind: WeatherKind, width: f64, height: f64) -> bool {
        self.cmd_tx.send(AnimationCommand::Configure { kind, width, height }).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn stop(&mut self) {
        let _ = self.cmd_tx.send(AnimationCommand::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Weather animation thread panicked");
            }
        }
    }
}

impl Drop for WeatherAnimation {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_animation(
    mut overlay: WeatherOverlay,
    interval: Duration,
    cmd_rx: Receiver<AnimationCommand>,
    frame_tx: SyncSender<WeatherFrame>,
) {
    let dt = interval.as_secs_f64();
    loop {
        match cmd_rx.recv_timeout(interval) {
            Ok(AnimationCommand::Configure { kind, width, height }) => {
                overlay.configure(kind, width, height);
                if kind == WeatherKind::None {
                    break;
                }
                continue;
            }
            Ok(AnimationCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        overlay.update(dt);
        let (width, height) = overlay.size();
        let frame = WeatherFrame {
            kind: overlay.kind(),
            width,
            height,
            particles: overlay.particles().to_vec(),
        };
        match frame_tx.try_send(frame) {
            Ok(()) | Err(mpsc::TrySendError::Full(_)) => {}
            Err(mpsc::TrySendError::Disconnected(_)) => break,
        }
    }
    log::debug!("Weather animation stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_counts() {
        for (kind, count) in [
            (WeatherKind::Rain, 500),
            (WeatherKind::Snow, 200),
            (WeatherKind::Embers, 100),
            (WeatherKind::Fog, 50),
            (WeatherKind::None, 0),
        ] {
            let overlay = WeatherOverlay::with_seed(kind, 800.0, 600.0, 1);
            assert_eq!(overlay.particles().len(), count, "{kind:?}");
        }
    }

    #[test]
    fn test_rain_wraps_to_top_with_new_x() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Rain, 800.0, 600.0, 7);
        // Push every drop to the bottom edge so one tick moves it past.
        for p in &mut overlay.particles {
            p.y = 599.0;
        }
        overlay.update(1.0 / 60.0);
        for p in overlay.particles() {
            assert!(p.y < 0.0, "drop not wrapped: {}", p.y);
            assert!(p.x >= 0.0 && p.x < 800.0);
        }
    }

    #[test]
    fn test_rain_falls_within_speed_bounds() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Rain, 800.0, 10_000.0, 3);
        for p in &mut overlay.particles {
            p.y = 0.0;
        }
        overlay.update(1.0 / 60.0);
        for p in overlay.particles() {
            assert!(p.y >= 10.0 - 1e-9 && p.y <= 20.0 + 1e-9);
        }
    }

    #[test]
    fn test_snow_falls_and_wraps() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Snow, 800.0, 10_000.0, 5);
        for p in &mut overlay.particles {
            p.y = 0.0;
        }
        overlay.update(1.0 / 60.0);
        for p in overlay.particles() {
            assert!(p.vy >= 1.0 && p.vy <= 3.0);
            assert!((p.y - p.vy).abs() < 1e-9);
            assert!(p.x >= 0.0 && p.x < 800.0, "flake drifted off: {}", p.x);
        }

        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Snow, 800.0, 600.0, 5);
        for p in &mut overlay.particles {
            p.y = 599.5;
        }
        overlay.update(1.0 / 60.0);
        for p in overlay.particles() {
            assert!(p.y < 0.0, "flake not wrapped: {}", p.y);
            assert!(p.x >= 0.0 && p.x < 800.0);
        }
    }

    #[test]
    fn test_embers_reset_when_dead() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Embers, 400.0, 300.0, 11);
        for p in &mut overlay.particles {
            p.life = 0.5;
            p.y = 150.0;
        }
        overlay.update(1.0 / 60.0);
        for p in overlay.particles() {
            assert!((p.y - 300.0).abs() < f64::EPSILON);
            assert!((p.life - p.max_life).abs() < f64::EPSILON);
            assert!((p.alpha(WeatherKind::Embers) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_fog_wraps_toroidally() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Fog, 200.0, 100.0, 5);
        for _ in 0..2_000 {
            overlay.update(1.0 / 60.0);
        }
        for p in overlay.particles() {
            assert!(p.x >= 0.0 && p.x < 200.0);
            assert!(p.y >= 0.0 && p.y < 100.0);
        }
    }

    #[test]
    fn test_configure_reseeds_only_on_change() {
        let mut overlay = WeatherOverlay::with_seed(WeatherKind::Snow, 800.0, 600.0, 2);
        assert!(!overlay.configure(WeatherKind::Snow, 800.0, 600.0));
        assert!(overlay.configure(WeatherKind::Snow, 1024.0, 768.0));
        assert!(overlay.configure(WeatherKind::None, 1024.0, 768.0));
        assert!(!overlay.is_active());
        assert!(overlay.particles().is_empty());
    }

    #[test]
    fn test_zero_viewport_has_no_particles() {
        let overlay = WeatherOverlay::with_seed(WeatherKind::Rain, 0.0, 0.0, 1);
        assert!(!overlay.is_active());
    }

    #[test]
    fn test_animation_not_started_for_none() {
        assert!(WeatherAnimation::start(WeatherKind::None, 800.0, 600.0, 60).is_none());
    }

    #[test]
    fn test_animation_stops_when_weather_cleared() {
        let mut animation = WeatherAnimation::start(WeatherKind::Snow, 320.0, 240.0, 120).unwrap();
        assert!(animation.reconfigure(WeatherKind::None, 320.0, 240.0));
        for _ in 0..200 {
            if !animation.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!animation.is_running());
        animation.stop();
    }

    #[test]
    fn test_animation_publishes_frames() {
        let animation = WeatherAnimation::start(WeatherKind::Embers, 320.0, 240.0, 200).unwrap();
        let mut frame = None;
        for _ in 0..200 {
            frame = animation.latest_frame();
            if frame.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let frame = frame.expect("no frame published");
        assert_eq!(frame.kind, WeatherKind::Embers);
        assert_eq!(frame.particles.len(), 100);
    }
}
