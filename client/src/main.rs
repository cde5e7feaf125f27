use clap::Parser;
use client::bot::{Bot, Strategy};
use client::network::Connection;
use log::info;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5000")]
    server: String,

    /// How the ghost is steered
    #[arg(long, value_enum, default_value = "chase")]
    strategy: Strategy,

    /// Seed for the wandering strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum time between two actions in milliseconds
    #[arg(short = 'a', long, default_value = "200")]
    action_ms: u64,

    /// Socket read timeout in milliseconds
    #[arg(long, default_value = "1000")]
    read_timeout_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut connection = Connection::connect(
        args.server.as_str(),
        Duration::from_millis(args.read_timeout_ms.max(1)),
    )?;
    let mut bot = connection
        .ghost()
        .map(|ghost| Bot::new(ghost, args.strategy, args.seed));
    let action_interval = Duration::from_millis(args.action_ms);
    let mut last_action: Option<Instant> = None;
    let mut last_status = None;

    loop {
        let Some(state) = connection.recv_snapshot()? else {
            continue;
        };

        if last_status != Some(state.status) {
            info!(
                "Status {:?}, lives {}, scores {:?}",
                state.status, state.pacman_lives, state.scores
            );
            last_status = Some(state.status);
        }
        if state.is_finished() {
            info!("Match over, winner {:?}", state.winner);
            break;
        }

        if let Some(bot) = bot.as_mut() {
            if last_action.map_or(true, |at| at.elapsed() >= action_interval) {
                if let Some(action) = bot.decide(&state) {
                    connection.send_action(action)?;
                }
                last_action = Some(Instant::now());
            }
        }
    }

    connection.shutdown();
    Ok(())
}
