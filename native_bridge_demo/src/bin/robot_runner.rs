//! robot_runner: 批量推进大量 Core 实例并统计分发吞吐
//!
//! ```bash
//! robot_runner --bots 1000 --frames 300
//! robot_runner --bots 10 --frames 60 --unchecked
//! ```

use std::time::Instant;

use clap::Parser;
use native_bridge::abi::{BridgeMode, CoreConfig};
use native_bridge::runtime::{recycle_streams, tick_many, BridgeCore};
use native_bridge_demo::bindings::host::{dispatch, dispatch_unchecked};
use native_bridge_demo::{DemoAssetApp, RobotHost, RobotStats};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "robot_runner")]
#[command(about = "Ticks many demo cores and dispatches their command streams")]
struct Args {
    /// Number of core instances
    #[arg(long, default_value_t = 1000)]
    bots: usize,

    /// Number of frames to run
    #[arg(long, default_value_t = 300)]
    frames: u32,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Dispatch without bounds checks
    #[arg(long)]
    unchecked: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut cores: Vec<BridgeCore> = (0..args.bots)
        .map(|i| {
            let config = CoreConfig {
                seed: i as u64 + 1,
                mode: BridgeMode::ROBOT.raw(),
                reserved0: 0,
            };
            BridgeCore::new(config, DemoAssetApp::create(&config))
        })
        .collect();
    let mut hosts: Vec<RobotHost> = (0..args.bots).map(|_| RobotHost::new()).collect();

    tracing::info!(
        target: "demo",
        "running {} bots for {} frames (dt = {}, unchecked = {})",
        args.bots,
        args.frames,
        args.dt,
        args.unchecked
    );

    let start = Instant::now();
    let mut scratch = Vec::new();
    for _ in 0..args.frames {
        let streams = tick_many(&mut cores, args.dt, scratch);
        for (stream, host) in streams.iter().zip(hosts.iter_mut()) {
            if args.unchecked {
                // SAFETY: stream 来自本进程的 Core，且在下一次 tick 之前使用
                unsafe {
                    dispatch_unchecked(*stream, host);
                }
            } else {
                dispatch(*stream, host);
            }
        }
        scratch = recycle_streams(streams);

        for (core, host) in cores.iter_mut().zip(hosts.iter_mut()) {
            host.flush_into(core);
        }
    }
    let elapsed = start.elapsed();

    let stats = hosts.iter().fold(RobotStats::default(), |mut acc, host| {
        acc.logs += host.stats.logs;
        acc.spawns += host.stats.spawns;
        acc.transforms += host.stats.transforms;
        acc.destroys += host.stats.destroys;
        acc.asset_requests += host.stats.asset_requests;
        acc.samples += host.stats.samples;
        acc
    });
    let ticks: u64 = cores.iter().map(BridgeCore::steps).sum();
    let total = stats.total_commands();
    let seconds = elapsed.as_secs_f64();
    let per_second = if seconds > 0.0 { total as f64 / seconds } else { 0.0 };

    println!("bots={} frames={}", args.bots, args.frames);
    println!("elapsed={:.3}s", seconds);
    println!("commands={} ({:.0}/s)", total, per_second);
    println!("asset_requests={}", stats.asset_requests);
    println!("ticks={}", ticks);
}
