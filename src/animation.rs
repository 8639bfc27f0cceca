//! Starfield background and the timer that drives its redraws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

pub const STAR_COUNT: usize = 200;
const MAX_DEPTH: f32 = 1000.0;
const SPREAD: f32 = 1000.0;

/// Redraw period of the starfield
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
struct Star {
    x: f32,
    y: f32,
    z: f32,
    size: f32,
    opacity: f32,
    speed: f32,
}

/// A star projected onto the terminal grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarPoint {
    pub col: u16,
    pub row: u16,
    /// 0.0 (invisible) to 1.0
    pub brightness: f32,
    /// Close enough to draw with the glow color
    pub glow: bool,
}

/// Stars flying toward the viewer
pub struct Starfield {
    stars: Vec<Star>,
    rng: StdRng,
}

impl Starfield {
    pub fn new() -> Self {
        Self::with_rng(STAR_COUNT, StdRng::from_entropy())
    }

    /// Deterministic field for a given seed
    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::with_rng(count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(count: usize, mut rng: StdRng) -> Self {
        let stars = (0..count)
            .map(|_| Star {
                x: rng.gen_range(-SPREAD..SPREAD),
                y: rng.gen_range(-SPREAD..SPREAD),
                z: rng.gen_range(1.0..MAX_DEPTH),
                size: rng.gen_range(1.0..3.0),
                opacity: rng.gen::<f32>(),
                speed: rng.gen_range(0.5..2.0),
            })
            .collect();
        Self { stars, rng }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Advance one frame. Stars that pass the viewer respawn far away.
    pub fn step(&mut self) {
        for star in &mut self.stars {
            star.z -= star.speed;
            if star.z <= 0.0 {
                star.z = MAX_DEPTH;
                star.x = self.rng.gen_range(-SPREAD..SPREAD);
                star.y = self.rng.gen_range(-SPREAD..SPREAD);
            }
        }
    }

    /// Project every visible star onto a `width` x `height` cell grid
    pub fn project(&self, width: u16, height: u16) -> Vec<StarPoint> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;

        self.stars
            .iter()
            .filter_map(|star| {
                let scale = MAX_DEPTH / star.z;
                let x = cx + star.x / SPREAD * scale * cx;
                let y = cy + star.y / SPREAD * scale * cy;
                if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
                    return None;
                }
                Some(StarPoint {
                    col: x as u16,
                    row: y as u16,
                    brightness: star.opacity * (1.0 - star.z / MAX_DEPTH),
                    glow: star.size * scale > 1.5,
                })
            })
            .collect()
    }
}

impl Default for Starfield {
    fn default() -> Self {
        Self::new()
    }
}

/// Background timer posting a tick every interval.
///
/// Dropping the ticker stops the thread and waits for it, so no tick is
/// ever delivered after the owner is gone.
pub struct Ticker {
    ticks: Receiver<()>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(interval: Duration) -> std::io::Result<Self> {
        let (tick_tx, ticks) = mpsc::channel();
        let (stop, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("nebula-ticker".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if tick_tx.send(()).is_err() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        log::debug!("Ticker started ({:?})", interval);
        Ok(Self {
            ticks,
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Number of ticks received since the last call
    pub fn drain(&self) -> usize {
        self.ticks.try_iter().count()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Closing the stop channel wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Ticker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_seeded_field_is_deterministic() {
        let a = Starfield::seeded(50, 7);
        let b = Starfield::seeded(50, 7);
        assert_eq!(a.len(), 50);
        assert_eq!(a.project(80, 24), b.project(80, 24));
        assert_eq!(Starfield::new().len(), STAR_COUNT);
    }

    #[test]
    fn test_stars_approach_and_respawn() {
        let mut field = Starfield::seeded(20, 1);
        let before: Vec<f32> = field.stars.iter().map(|s| s.z).collect();
        field.step();
        for (old, star) in before.iter().zip(&field.stars) {
            assert!(star.z < *old || star.z == MAX_DEPTH);
        }

        for _ in 0..5000 {
            field.step();
        }
        assert!(field.stars.iter().all(|s| s.z > 0.0 && s.z <= MAX_DEPTH));
    }

    #[test]
    fn test_projection_stays_on_grid() {
        let mut field = Starfield::seeded(200, 3);
        for _ in 0..100 {
            field.step();
            for point in field.project(40, 10) {
                assert!(point.col < 40 && point.row < 10);
                assert!((0.0..=1.0).contains(&point.brightness));
            }
        }
        assert!(field.project(0, 10).is_empty());
    }

    #[test]
    fn test_ticker_ticks_and_stops() {
        let ticker = Ticker::start(Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert!(ticker.drain() > 0);

        let started = Instant::now();
        drop(ticker);
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
