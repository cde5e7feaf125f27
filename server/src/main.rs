use clap::Parser;
use log::info;
use server::agent::AgentConfig;
use server::config::ServerConfig;
use server::network::Server;
use shared::Rules;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Socket read timeout in milliseconds
    #[arg(long, default_value = "1000")]
    read_timeout_ms: u64,

    /// Game tick interval in milliseconds
    #[arg(short, long, default_value = "50")]
    tick_ms: u64,

    /// Snapshot broadcast interval in milliseconds
    #[arg(long, default_value = "50")]
    broadcast_ms: u64,

    /// Ghost move interval in milliseconds
    #[arg(long, default_value = "200")]
    ghost_move_ms: u64,

    /// Pac-Man move interval in milliseconds
    #[arg(long, default_value = "200")]
    pacman_move_ms: u64,

    /// Pac-Man lives at the start of a match
    #[arg(long, default_value = "3")]
    lives: u32,

    /// Frightened mode duration in ticks
    #[arg(long, default_value = "300")]
    frightened_ticks: u32,

    /// Points a ghost earns for catching Pac-Man
    #[arg(long, default_value = "200")]
    reward: i32,

    /// Points a ghost loses when eaten
    #[arg(long, default_value = "50")]
    penalty: i32,

    /// Manhattan distance at which Pac-Man considers a ghost dangerous
    #[arg(long, default_value = "4")]
    danger_radius: i32,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            read_timeout: Duration::from_millis(self.read_timeout_ms.max(1)),
            tick_interval: Duration::from_millis(self.tick_ms),
            broadcast_interval: Duration::from_millis(self.broadcast_ms),
            ghost_move_interval: Duration::from_millis(self.ghost_move_ms),
            pacman_move_interval: Duration::from_millis(self.pacman_move_ms),
            rules: Rules {
                pacman_lives: self.lives,
                frightened_duration: self.frightened_ticks,
                eat_pacman_reward: self.reward,
                eat_ghost_penalty: self.penalty,
            },
            agent: AgentConfig {
                danger_radius: self.danger_radius,
                ..AgentConfig::default()
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = args.server_config();
    info!("Starting server with {:?}", config);

    let server = Server::bind((args.host.as_str(), args.port), config)?;
    server.run()?;

    Ok(())
}
