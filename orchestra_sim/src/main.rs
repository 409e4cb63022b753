//! Orchestra simulation CLI
//!
//! Loads a positions file, spawns the conductor and one task per musician,
//! and logs election transitions until interrupted (or a deadline).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use orchestra_core::{ProtocolConfig, Roster};
use orchestra_sim::{Orchestra, PerformerEventKind};

#[derive(Parser, Debug)]
#[command(name = "orchestra-sim")]
#[command(about = "Run a distributed leader-selection election among spatial musicians", long_about = None)]
struct Args {
    /// Path to the positions file (first line N, then N lines "x y")
    #[arg(short, long, default_value = "positions")]
    positions: PathBuf,

    /// Seed for the priority-value draws
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum neighbor distance (inclusive)
    #[arg(short = 'd', long, default_value = "3")]
    neighbor_distance: u32,

    /// Perform heartbeat interval, milliseconds
    #[arg(long, default_value = "500")]
    heartbeat_ms: u64,

    /// Total performance duration, milliseconds
    #[arg(long, default_value = "5000")]
    performance_ms: u64,

    /// Loser lease timeout, milliseconds
    #[arg(long, default_value = "1500")]
    lease_ms: u64,

    /// Break equal priority values by id instead of reproducing the
    /// literal tie stall
    #[arg(long)]
    tie_break_by_id: bool,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let roster = match Roster::load(&args.positions, args.seed) {
        Ok(roster) => roster,
        Err(error) => {
            // Fatal before any musician starts: no partial run.
            error!(path = %args.positions.display(), %error, "invalid positions file");
            std::process::exit(1);
        }
    };

    let config = ProtocolConfig {
        neighbor_max_distance: args.neighbor_distance,
        heartbeat_interval: Duration::from_millis(args.heartbeat_ms),
        performance_duration: Duration::from_millis(args.performance_ms),
        lease_timeout: Duration::from_millis(args.lease_ms),
        tie_break_by_id: args.tie_break_by_id,
    };

    info!(
        musicians = roster.len(),
        seed = args.seed,
        distance = config.neighbor_max_distance,
        "starting orchestra"
    );
    let mut orchestra = Orchestra::start(&roster, config);

    let deadline = async {
        if args.duration == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(args.duration)).await;
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = orchestra.next_event() => {
                match event {
                    Some(event) => {
                        let what = match event.kind {
                            PerformerEventKind::BecameWinner => "won its neighborhood",
                            PerformerEventKind::BecameLoser => "yielded the floor",
                            PerformerEventKind::RoundRestarted => "restarted the round",
                            PerformerEventKind::PerformanceFinished => "finished performing",
                        };
                        info!(musician = %event.id, "{what}");
                    }
                    None => break,
                }
            }
            _ = &mut deadline => {
                info!("run deadline reached");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    orchestra.shutdown();
}
