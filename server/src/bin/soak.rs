//! Soak test for the planet simulation.
//!
//! Runs the simulation headless with a fixed time step and checks that bodies
//! stay finite and on the surface:
//! - Spawns N wanderers that keep travelling
//! - Optionally drags the planet around on a fixed schedule
//! - Reports arrivals, containment events and surface drift
//!
//! Usage: cargo run --bin soak -- [OPTIONS]
//!
//! Options:
//!   --bodies N       Number of wanderers (default: 50)
//!   --duration S     Simulated seconds (default: 120)
//!   --seed N         RNG seed (default: 42)
//!   --drag           Inject a scripted drag every few seconds

use glam::DVec3;
use planet_server::config::ServerConfig;
use planet_server::state::SimState;
use planet_shared::gravity::ContainmentEvent;
use std::time::Instant;

/// Seconds between scripted drags
const DRAG_PERIOD: f64 = 4.0;
/// Seconds each scripted drag lasts
const DRAG_LENGTH: f64 = 1.0;

#[derive(Default)]
struct Metrics {
    arrivals: u64,
    paths_planned: u64,
    overruns: u64,
    velocity_clamps: u64,
    non_finite: u64,
    /// Worst distance from the surface seen on a travelling body
    max_moving_drift: f64,
    /// Worst distance from the surface seen on any body
    max_drift: f64,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut bodies: usize = 50;
    let mut duration_secs: f64 = 120.0;
    let mut seed: u64 = 42;
    let mut drag = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bodies" => {
                i += 1;
                bodies = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(120.0);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(42);
            }
            "--drag" => drag = true,
            other => eprintln!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    let config = ServerConfig {
        rng_seed: seed,
        wanderer_count: bodies,
        ..ServerConfig::load().unwrap_or_else(|e| {
            eprintln!("Invalid server configuration: {}", e);
            std::process::exit(2);
        })
    };

    println!("=== Planet Soak Test ===");
    println!("Bodies: {}", bodies);
    println!("Duration: {}s simulated", duration_secs);
    println!("Seed: {}", seed);
    println!("Drag: {}", if drag { "on" } else { "off" });
    println!();

    let mut state = match SimState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to build simulation: {}", e);
            std::process::exit(2);
        }
    };

    let dt = 1.0 / config.tick_rate_hz as f64;
    let total_ticks = (duration_secs / dt).ceil() as u64;
    let report_every = config.tick_rate_hz as u64 * 10;
    let radius = config.sphere_radius;
    let mut metrics = Metrics::default();
    let wall_start = Instant::now();

    for tick in 0..total_ticks {
        let t = tick as f64 * dt;

        if drag {
            let phase = t % DRAG_PERIOD;
            if phase < dt {
                state.world.begin_drag(state.planet);
            }
            if phase < DRAG_LENGTH {
                let dy = (t * 3.0).sin() * 4.0;
                state.world.drag(state.planet, 8.0, dy, DVec3::Y, DVec3::X);
            } else if phase < DRAG_LENGTH + dt {
                state.world.end_drag(state.planet);
            }
        }

        let output = state.tick(dt);
        metrics.arrivals += output.arrivals.len() as u64;
        metrics.paths_planned += output.paths.len() as u64;
        for event in &output.containment {
            match event {
                ContainmentEvent::Overrun { .. } => metrics.overruns += 1,
                ContainmentEvent::VelocityClamped { .. } => metrics.velocity_clamps += 1,
            }
        }

        for body in state.world.bodies().iter() {
            if !body.position.is_finite() || !body.orientation.is_finite() {
                metrics.non_finite += 1;
                continue;
            }
            let drift = (body.position.length() - radius).abs();
            metrics.max_drift = metrics.max_drift.max(drift);
            if state.world.is_moving(body.id) {
                metrics.max_moving_drift = metrics.max_moving_drift.max(drift);
            }
        }

        if (tick + 1) % report_every == 0 {
            println!(
                "[{:4.0}s] arrivals={}, planned={}, travelling={}, overruns={}, max_drift={:.4}",
                t + dt,
                metrics.arrivals,
                metrics.paths_planned,
                state.wanderers.travelling_count(),
                metrics.overruns,
                metrics.max_drift
            );
        }
    }

    let wall = wall_start.elapsed();

    // Final stats
    println!();
    println!("=== Final Results ===");
    println!("Ticks: {}", total_ticks);
    println!("Wall time: {:?} ({:.1}x real time)", wall, duration_secs / wall.as_secs_f64().max(1e-9));
    println!("Paths planned: {}", metrics.paths_planned);
    println!("Arrivals: {}", metrics.arrivals);
    println!("Containment overruns: {}", metrics.overruns);
    println!("Velocity clamps: {}", metrics.velocity_clamps);
    println!("Max drift (travelling): {:.6}", metrics.max_moving_drift);
    println!("Max drift (any body): {:.6}", metrics.max_drift);
    println!("Non-finite samples: {}", metrics.non_finite);

    if metrics.non_finite > 0 {
        eprintln!("FAILED: bodies went non-finite");
        std::process::exit(1);
    }
}
