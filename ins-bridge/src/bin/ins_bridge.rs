//! Run the INS bridge against a live sensor or a recorded capture.
//!
//! Records are written to stdout as JSON lines. Typing `reset` on stdin
//! clears the reference fix; `quit` stops the session.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ins_bridge::{BridgeConfig, ChannelSink, JsonLinesSink, NavContext, RecordSink, ResetHandle};
use tracing::{info, warn};
use vectornav::connection::{configure_output, query_device_details};
use vectornav::{BaudRate, BinaryOutputConfig, Connector, DeviceFamily, SerialTransport};

#[derive(Parser, Debug)]
#[command(name = "ins_bridge")]
#[command(about = "Republish VectorNav INS output as JSON records")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Target baud rate (overrides config)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Replay a raw capture instead of opening the serial port
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Model number assumed for a replayed capture
    #[arg(long, default_value = "VN-300")]
    model: String,

    /// Publish attitude in ENU instead of the sensor convention
    #[arg(long)]
    enu: bool,

    /// Use the rotation-based ENU conversion
    #[arg(long)]
    frame_based: bool,

    /// Also publish the frame-converted IMU record
    #[arg(long)]
    publish_imu: bool,
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    if let Some(port) = &args.port {
        config.serial_port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.serial_baud = baud;
    }
    config.frames.convert_to_enu |= args.enu;
    config.frames.use_frame_based_rotation |= args.frame_based;
    config.publish_imu |= args.publish_imu;
    config.validate()?;
    Ok(config)
}

fn spawn_console(reset: ResetHandle, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "reset" => {
                    reset.reset();
                    info!("reference fix reset requested");
                }
                "quit" => {
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
                "" => {}
                other => warn!("unknown command {:?}", other),
            }
        }
    });
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let stop = Arc::new(AtomicBool::new(false));

    let (sink, receiver) = ChannelSink::bounded(config.channel_capacity);
    let writer = thread::spawn(move || {
        let mut out = JsonLinesSink::new(io::stdout().lock());
        for publication in receiver {
            out.publish(publication);
        }
    });

    let counters = match &args.replay {
        Some(path) => {
            let family = DeviceFamily::from_model_number(&args.model);
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            info!("replaying {} as {}", path.display(), family);

            let mut ctx = NavContext::new(&config, family, sink);
            spawn_console(ctx.reset_handle(), stop.clone());
            ctx.run_stream(file, &stop)?
        }
        None => {
            let target = BaudRate::from_bps(config.serial_baud)
                .with_context(|| format!("unsupported baud rate {}", config.serial_baud))?;
            info!("connecting to {} @ {} baud", config.serial_port, target.bps());

            let timeout = Duration::from_millis(1000);
            let mut connector = Connector::new(SerialTransport::new(&config.serial_port), target)
                .with_timeout(timeout);
            let device = connector.connect()?;
            let mut transport = connector.into_transport();

            let details = query_device_details(&mut transport, timeout)?;
            info!(
                "model {}, firmware {}, serial number {}",
                device.model, details.firmware_version, details.serial_number
            );
            let output = BinaryOutputConfig::navigation(config.imu_rate, config.async_output_rate);
            configure_output(&mut transport, config.async_output_rate, &output, timeout)?;

            let stream = transport
                .take_stream()
                .context("serial port closed after configuration")?;
            let mut ctx = NavContext::new(&config, device.family, sink);
            spawn_console(ctx.reset_handle(), stop.clone());
            ctx.run_stream(stream, &stop)?
        }
    };

    // the sink was moved into the context, which is gone; the writer drains
    if writer.join().is_err() {
        warn!("output writer panicked");
    }
    info!(
        "published {} records from {} frames",
        counters.records_published, counters.frames_decoded
    );
    Ok(())
}
