//! Decode a raw VectorNav serial capture into CSV.
//!
//! Every CRC-valid binary frame becomes a `data` row; runs of bytes the
//! synchronizer had to discard become `skipped` rows carrying the byte count.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use vectornav::{parse, CompositeData, DeviceFamily, FrameSync};

#[derive(Parser, Debug)]
#[command(name = "parse_dump")]
#[command(about = "Decode a raw VectorNav binary capture to CSV")]
struct Args {
    /// Raw capture file
    input: PathBuf,

    /// CSV output path
    output: PathBuf,

    /// Model number of the capturing device (selects the field set)
    #[arg(long, default_value = "VN-300")]
    model: String,
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn triple<T: std::fmt::Display + Copy>(value: Option<[T; 3]>) -> [String; 3] {
    match value {
        Some([a, b, c]) => [a.to_string(), b.to_string(), c.to_string()],
        None => Default::default(),
    }
}

fn data_row(data: &CompositeData) -> String {
    let mut cols = vec![
        "data".to_string(),
        opt(data.time_of_week().map(|t| format!("{t:.9}"))),
        opt(data.gps_week()),
    ];
    cols.extend(triple(data.yaw_pitch_roll()));
    match data.quaternion() {
        Some(q) => cols.extend(q.iter().map(|v| v.to_string())),
        None => cols.extend(std::iter::repeat(String::new()).take(4)),
    }
    cols.extend(triple(data.angular_rate()));
    cols.extend(triple(data.acceleration()));
    cols.extend(triple(data.position_lla()));
    cols.extend(triple(data.position_ecef()));
    cols.extend(triple(data.velocity_ned()));
    cols.push(opt(data.ins_status().map(|s| format!("{:#06x}", s.bits()))));
    cols.push(String::new());
    cols.join(",")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let family = DeviceFamily::from_model_number(&args.model);

    let mut data = Vec::new();
    File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?
        .read_to_end(&mut data)?;
    info!("read {} bytes from {}", data.len(), args.input.display());

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(
        out,
        "type,gps_tow_s,gps_week,yaw_deg,pitch_deg,roll_deg,qx,qy,qz,qw,\
         rate_x,rate_y,rate_z,accel_x,accel_y,accel_z,lat_deg,lon_deg,alt_m,\
         ecef_x,ecef_y,ecef_z,vel_n,vel_e,vel_d,ins_status,skipped_bytes"
    )?;

    let mut sync = FrameSync::new();
    sync.push(&data);
    let mut skipped_seen = 0;
    let mut decoded = 0u64;
    let mut rejected = 0u64;

    let mut flush_skipped = |sync: &FrameSync, out: &mut BufWriter<File>| -> Result<()> {
        let skipped = sync.skipped_bytes();
        if skipped > skipped_seen {
            writeln!(out, "skipped{}{}", ",".repeat(26), skipped - skipped_seen)?;
            skipped_seen = skipped;
        }
        Ok(())
    };

    while let Some(frame) = sync.next_frame() {
        flush_skipped(&sync, &mut out)?;
        match parse(&frame, family) {
            Ok(composite) => {
                writeln!(out, "{}", data_row(&composite))?;
                decoded += 1;
            }
            Err(e) => {
                warn!("frame {} rejected: {}", sync.frames(), e);
                rejected += 1;
            }
        }
    }
    flush_skipped(&sync, &mut out)?;
    out.flush()?;

    info!(
        "decoded {} frames, rejected {}, skipped {} bytes, {} trailing",
        decoded,
        rejected,
        sync.skipped_bytes(),
        sync.pending()
    );
    info!("wrote {}", args.output.display());
    Ok(())
}
