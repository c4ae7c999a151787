use crate::config::ServerConfig;
use crate::state::SimState;
use glam::DVec3;
use planet_shared::body::BodyId;
use planet_shared::gravity::ContainmentEvent;
use planet_shared::protocol::{vec_to_wire, PathWire, WorldSnapshot};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from clients to the game loop
#[derive(Debug)]
pub enum SimCommand {
    /// Spawn a dynamic body on the planet along `direction`; responds with its id.
    SpawnBody {
        direction: DVec3,
        response: oneshot::Sender<Option<u32>>,
    },
    Navigate {
        body: u32,
        target: DVec3,
    },
    Stop {
        body: u32,
    },
    RemoveBody {
        body: u32,
    },
    DragStart,
    DragMove {
        dx: f64,
        dy: f64,
        camera_up: DVec3,
        camera_right: DVec3,
    },
    DragEnd,
    /// Drop any drag and momentum, e.g. when the client loses focus.
    ResetDrag,
}

/// Broadcasts from game loop to all listeners
#[derive(Debug, Clone)]
pub enum SimBroadcast {
    Snapshot(WorldSnapshot),
    PathPlanned(PathWire),
    Arrived { body: u32, position: [f64; 3] },
    Containment(ContainmentEvent),
}

/// Run the simulation loop. Owns all simulation state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<SimCommand>,
    broadcast_tx: broadcast::Sender<SimBroadcast>,
    server_config: ServerConfig,
) {
    let mut state = match SimState::new(&server_config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to build simulation: {}", e);
            return;
        }
    };

    let dt = 1.0 / server_config.tick_rate_hz as f64;
    let tick_duration = Duration::from_secs_f64(dt);
    let broadcast_every_n = (server_config.tick_rate_hz / server_config.broadcast_rate_hz).max(1);
    let mut tick_count: u64 = 0;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        "Game loop started: {} Hz, {} wanderers",
        server_config.tick_rate_hz,
        state.wanderers.count()
    );

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let output = state.tick(dt);

                for path in output.paths {
                    let _ = broadcast_tx.send(SimBroadcast::PathPlanned(path));
                }
                for (body, position) in output.arrivals {
                    let _ = broadcast_tx.send(SimBroadcast::Arrived {
                        body: body.0,
                        position: vec_to_wire(position),
                    });
                }
                for event in output.containment {
                    let _ = broadcast_tx.send(SimBroadcast::Containment(event));
                }

                // Broadcast snapshot at lower rate
                tick_count += 1;
                if tick_count % broadcast_every_n as u64 == 0 {
                    let _ = broadcast_tx.send(SimBroadcast::Snapshot(state.snapshot()));
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd, &broadcast_tx),
                    // All senders dropped
                    None => break,
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}

fn handle_command(state: &mut SimState, cmd: SimCommand, broadcast_tx: &broadcast::Sender<SimBroadcast>) {
    match cmd {
        SimCommand::SpawnBody { direction, response } => {
            let id = state.spawn_body(direction).map(|id| id.0);
            let _ = response.send(id);
        }
        SimCommand::Navigate { body, target } => {
            match state.navigate(BodyId(body), target) {
                Some(path) => {
                    let _ = broadcast_tx.send(SimBroadcast::PathPlanned(path));
                }
                None => tracing::debug!("Navigation for body {} rejected", body),
            }
        }
        SimCommand::Stop { body } => {
            state.stop(BodyId(body));
        }
        SimCommand::RemoveBody { body } => {
            if !state.remove_body(BodyId(body)) {
                tracing::debug!("Remove for unknown body {}", body);
            }
        }
        SimCommand::DragStart => {
            state.world.begin_drag(state.planet);
        }
        SimCommand::DragMove {
            dx,
            dy,
            camera_up,
            camera_right,
        } => {
            state.world.drag(state.planet, dx, dy, camera_up, camera_right);
        }
        SimCommand::DragEnd => {
            state.world.end_drag(state.planet);
        }
        SimCommand::ResetDrag => {
            state.world.reset_drag_state();
        }
    }
}
