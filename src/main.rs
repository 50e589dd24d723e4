use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use piahrs::data::{FileData, Sample, SampleSource, Stream};
use piahrs::intg::GyroIntegrator;
use piahrs::{
    DeltaTracker, EstimatorError, EulerAngles, Estimator, FilterConfig, MonotonicClock, TimeSource,
};

/// Replay a sensor log (or a live serial stream) through the attitude filter.
#[derive(Parser)]
#[command(name = "piahrs", version, about, long_about = None)]
struct Cli {
    /// JSON-lines log file, or a serial device such as /dev/ttyUSB0
    #[arg(default_value = "tilt1.txt")]
    input: String,

    /// Filter configuration (JSON)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = 460_800)]
    baud: u32,
}

#[derive(Serialize)]
struct Frame {
    frame: usize,
    q: [f32; 4],
    euler: EulerAngles,
    gyro_only: [f32; 4],
}

/// Picks the time step for each sample: timestamps first, then the logged
/// interval, then the host clock.
struct StepTimer {
    ticks: Option<DeltaTracker<u32>>,
    clock: MonotonicClock,
    wall: DeltaTracker<u32>,
    ticks_per_second: u32,
}

impl StepTimer {
    fn new(ticks_per_second: u32) -> Self {
        let mut clock = MonotonicClock::new();
        let wall = DeltaTracker::new(clock.now(), 1_000_000);
        StepTimer {
            ticks: None,
            clock,
            wall,
            ticks_per_second,
        }
    }

    fn dt(&mut self, s: &Sample) -> f32 {
        let wall = self.wall.elapsed(self.clock.now());
        if let Some(t) = s.t_us {
            match self.ticks {
                Some(ref mut tracker) => return tracker.elapsed(t),
                None => {
                    // first timestamp only starts the tracker
                    self.ticks = Some(DeltaTracker::new(t, self.ticks_per_second));
                    return 0.0;
                }
            }
        }
        match s.dt {
            Some(ms) => ms * 0.001,
            None => wall,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FilterConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FilterConfig::default(),
    };
    let gyro_scale = config.gyro_units.to_radians_scale();
    let mut timer = StepTimer::new(config.ticks_per_second);
    let mut ahrs = Estimator::new(config)?;
    let mut gyro_only = GyroIntegrator::default();

    let name = cli.input.as_str();
    let serial = name.starts_with("/dev/") || name.starts_with("COM");
    let mut source: Box<dyn SampleSource> = if serial {
        Box::new(Stream::start(name, cli.baud))
    } else {
        Box::new(FileData::load(name).with_context(|| format!("reading {name}"))?)
    };
    info!("{}: replaying", name);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut frame = 0;
    while let Some(s) = source.next_sample() {
        let dt = timer.dt(&s);
        match ahrs.update(s.accel(), s.gyro(), s.mag(), dt) {
            Ok(_) => {}
            Err(e @ EstimatorError::QuaternionCollapsed { .. }) => {
                error!("frame {}: {}", frame, e);
                gyro_only.reset();
            }
            Err(e) => {
                error!("frame {}: {}", frame, e);
                continue;
            }
        }
        gyro_only.add_sample(dt, s.gyro() * gyro_scale);

        let f = Frame {
            frame,
            q: ahrs.quaternion().to_array(),
            euler: ahrs.euler(),
            gyro_only: gyro_only.q.to_array(),
        };
        serde_json::to_writer(&mut out, &f)?;
        writeln!(out)?;
        frame += 1;
    }
    info!("{}: {} frames", name, frame);

    Ok(())
}
