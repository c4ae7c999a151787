use planet_server::config::ServerConfig;
use planet_server::game_loop::{run_game_loop, SimBroadcast, SimCommand};
use tokio::sync::{broadcast, mpsc};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Validate configuration before starting
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (game_tx, game_rx) = mpsc::channel::<SimCommand>(256);
    let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<SimBroadcast>(64);

    // Spawn game loop
    let bc_tx = broadcast_tx.clone();
    let game = tokio::spawn(async move {
        run_game_loop(game_rx, bc_tx, config).await;
    });

    // Log what the loop publishes
    tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(SimBroadcast::Snapshot(snapshot)) => {
                    let moving = snapshot.bodies.iter().filter(|b| b.moving).count();
                    tracing::debug!(
                        "tick {}: {} bodies, {} moving",
                        snapshot.tick,
                        snapshot.bodies.len(),
                        moving
                    );
                }
                Ok(SimBroadcast::PathPlanned(path)) => {
                    tracing::debug!("Body {} planned {} points", path.body, path.points.len());
                }
                Ok(SimBroadcast::Arrived { body, position }) => {
                    tracing::info!("Body {} arrived at {:?}", body, position);
                }
                Ok(SimBroadcast::Containment(event)) => {
                    tracing::warn!("Containment: {:?}", event);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Log listener lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("Planet server running, Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutting down");

    // Dropping the last command sender ends the loop
    drop(game_tx);
    let _ = game.await;
}
