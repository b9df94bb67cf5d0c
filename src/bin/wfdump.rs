//! Wfdump binary - decode and inspect a raw waveform file
//!
//! Usage:
//!   cargo run --bin wfdump -- C1Trace00000.trc
//!   cargo run --bin wfdump -- C1Trace00000.trc --json
//!   cargo run --bin wfdump -- C1Trace00000.trc --start 100 --stop 120

use clap::Parser;
use lecroy_rs::common::cli::DumpArgs;
use lecroy_rs::decoder::Waveform;

fn main() -> anyhow::Result<()> {
    let args = DumpArgs::parse();

    let raw = std::fs::read(&args.file)?;
    let waveform = Waveform::decode(&raw)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&waveform)?);
        return Ok(());
    }

    println!("File:        {}", args.file.display());
    println!(
        "Origin:      {} ({}), source byte 0x{:02x}",
        waveform.origin,
        waveform.label(),
        waveform.source
    );
    println!(
        "Samples:     {} decoded, {} declared",
        waveform.len(),
        waveform.declared_size
    );
    println!(
        "Vertical:    gain={:e}, offset={:e}, unit {}",
        waveform.y_gain, waveform.y_offset, waveform.y_unit
    );
    println!(
        "Horizontal:  interval={:e}, offset={:e}, unit {}",
        waveform.x_gain, waveform.x_offset, waveform.x_unit
    );

    let stop = args.stop.unwrap_or(waveform.len());
    let (time, samples) = waveform.range(args.start, stop);
    if !samples.is_empty() {
        println!();
        println!("{:>14}  {:>14}", "time", "value");
        for (t, v) in time.iter().zip(samples) {
            println!("{t:>14.6e}  {v:>14.6e}");
        }
    }

    Ok(())
}
