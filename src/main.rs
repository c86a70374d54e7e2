// src/main.rs
// Headless driver: plays a scripted pan/zoom/resize session against the
// grid-tile provider and logs what a renderer would see.

use std::time::{Duration, Instant};

use anyhow::Context;
use glam::DVec2;

use tilestream::app::{Direction, Game, GameEvent, VectoredDirection, ViewportAction, ZoomDirection};
use tilestream::config::{StreamConfig, ViewportConfig};
use tilestream::streaming::StreamEvent;
use tilestream::world::GridTileProvider;

const FRAME: Duration = Duration::from_millis(16);

fn script(frame: u32, window: DVec2) -> Vec<ViewportAction> {
    use Direction::*;

    let pan = |dirs: &[Direction]| {
        ViewportAction::pan(dirs.iter().copied().map(VectoredDirection::unit))
    };

    match frame {
        0 => vec![ViewportAction::Resize(window)],
        1..=119 => vec![pan(&[East])],
        120..=159 => vec![ViewportAction::Zoom {
            direction: ZoomDirection::from_amount(2.0),
            point: window * 0.5,
            within: window,
        }],
        160..=279 => vec![pan(&[North, East])],
        // opposing keys held together cancel out
        280..=299 => vec![pan(&[North, South, West])],
        300 => vec![ViewportAction::Resize(window * 0.5)],
        301..=340 => vec![ViewportAction::Zoom {
            direction: ZoomDirection::from_amount(-3.0),
            point: DVec2::new(window.x * 0.4, window.y * 0.2),
            within: window * 0.5,
        }],
        _ => Vec::new(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let window = DVec2::new(1280.0, 720.0);
    let seed = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u32>().with_context(|| format!("invalid seed {s:?}")))
        .transpose()?
        .unwrap_or(12345);

    let (mut game, events) = Game::new(
        GridTileProvider::new(seed),
        window,
        &StreamConfig::default(),
        ViewportConfig::default(),
    )
    .context("failed to start chunk coordinator")?;

    game.set_stats_period(Duration::from_millis(500));
    log::info!("seed {seed}, window {}x{}", window.x, window.y);

    let start = Instant::now();
    let (mut generated, mut evicted, mut vertices) = (0u64, 0u64, 0usize);

    for frame in 0..420u32 {
        let frame_start = Instant::now();

        for action in script(frame, window) {
            game.apply(action);
        }
        game.frame();

        for ev in events.try_iter() {
            match ev {
                GameEvent::Chunk(StreamEvent::Generated(key)) => {
                    generated += 1;
                    // what an upload pass would do
                    vertices += game.vertices(key).len();
                }
                GameEvent::Chunk(StreamEvent::Evicted(_)) => evicted += 1,
                GameEvent::Viewport(_) => {}
            }
        }

        if let Some(rest) = FRAME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let stats = game.stats();
    game.shutdown();

    log::info!(
        "done in {:.2?}: {} generated, {} evicted, {} vertices uploaded, {} resident",
        start.elapsed(),
        generated,
        evicted,
        vertices,
        stats.resident
    );
    Ok(())
}
