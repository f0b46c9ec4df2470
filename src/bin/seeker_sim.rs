//! Seeker simulator
//!
//! Drives the core against a simulated robot in a world of rectangular
//! obstacles and logs telemetry while it runs.
//!
//! Usage:
//!   seeker_sim --goal 3,0 --obstacle 1.2,-0.5,1.6,0.7
//!   seeker_sim --config seeker.toml --goal -2,1 --realtime

use anyhow::{bail, Context, Result};
use clap::Parser;
use seeker_core::common::types::Pose;
use seeker_core::config::CoreConfig;
use seeker_core::sim::{Rect, SimRobot, Simulation, World, DEFAULT_DT};
use seeker_core::SeekerCore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Goal as `x,y` in metres
    #[arg(short, long, value_parser = parse_point, default_value = "3,0")]
    goal: (f64, f64),

    /// Start pose as `x,y,theta_deg`
    #[arg(long, value_parser = parse_pose, default_value = "0,0,0")]
    start: Pose,

    /// Rectangular obstacle as `x0,y0,x1,y1`; may be repeated
    #[arg(short, long, value_parser = parse_rect)]
    obstacle: Vec<Rect>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,

    /// Control period in seconds
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f64,

    /// Pace ticks at the control period instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Feed the true heading to the core every tick
    #[arg(long)]
    compass: bool,

    /// Log telemetry every N ticks
    #[arg(long, default_value_t = 50)]
    log_every: u64,
}

fn parse_numbers(s: &str, expected: usize) -> Result<Vec<f64>, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", s, e))?;
    if values.len() != expected {
        return Err(format!("expected {} comma-separated values, got {}", expected, values.len()));
    }
    Ok(values)
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let v = parse_numbers(s, 2)?;
    Ok((v[0], v[1]))
}

fn parse_pose(s: &str) -> Result<Pose, String> {
    let v = parse_numbers(s, 3)?;
    Ok(Pose::new(v[0], v[1], v[2].to_radians()))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let v = parse_numbers(s, 4)?;
    Ok(Rect::new(v[0], v[1], v[2], v[3]))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if !(args.dt.is_finite() && args.dt > 0.0) {
        bail!("--dt must be positive");
    }

    let config = match &args.config {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => CoreConfig::default(),
    };

    let world = args
        .obstacle
        .iter()
        .fold(World::new(), |world, rect| world.with_obstacle(*rect));
    log::info!(
        "World with {} obstacles, start ({:.2}, {:.2}), goal ({:.2}, {:.2})",
        world.obstacles.len(),
        args.start.x,
        args.start.y,
        args.goal.0,
        args.goal.1
    );

    let robot = SimRobot::new(world, config.robot.clone(), config.lidar.clone(), args.start)
        .with_compass(args.compass);

    let mut core = SeekerCore::new(config).context("building core")?;
    core.set_pose(args.start);
    core.init().context("starting core")?;

    let handle = core.command_handle();
    handle.set_goal(args.goal.0, args.goal.1);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut sim = Simulation::new(core, robot, args.dt);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(args.dt));
    let mut reached = false;

    while sim.ticks() < args.max_ticks && !stop.load(Ordering::SeqCst) {
        if args.realtime {
            interval.tick().await;
        } else if sim.ticks() % 256 == 0 {
            tokio::task::yield_now().await;
        }

        let output = sim.step();
        let telemetry = sim.core().telemetry();
        if args.log_every > 0 && telemetry.tick % args.log_every == 0 {
            log::info!(
                "tick {} pose ({:.2}, {:.2}, {:.0} deg) {} obstacle={} wheels ({:.2}, {:.2}) occupied={}",
                telemetry.tick,
                telemetry.pose.x,
                telemetry.pose.y,
                telemetry.theta_deg,
                telemetry.state,
                telemetry.obstacle_detected,
                telemetry.command.left,
                telemetry.command.right,
                telemetry.map.occupied_cells
            );
        }
        if output.reached {
            reached = true;
            break;
        }
    }

    let truth = sim.robot().pose();
    log::info!(
        "{} after {} ticks ({:.1} s); true pose ({:.2}, {:.2}), {} collisions",
        if reached { "Goal reached" } else { "Stopped" },
        sim.ticks(),
        sim.elapsed(),
        truth.x,
        truth.y,
        sim.robot().collisions()
    );

    sim.core_mut().shutdown().context("stopping core")?;
    Ok(())
}
