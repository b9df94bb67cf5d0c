//! Acquire binary - reads waveforms from a LeCroy oscilloscope
//!
//! Usage:
//!   cargo run --bin acquire -- --ip 192.168.0.40 -c 1 -c 2
//!   cargo run --bin acquire -- --config lab.toml -n 100 -p AMPL
//!   cargo run --bin acquire -- -c 1 --local-store -n 1000

use clap::Parser;
use lecroy_rs::common::cli::AcquireArgs;
use lecroy_rs::config::Config;
use lecroy_rs::sample::SampleWriter;
use lecroy_rs::scope::{ScopeClient, TriggerMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lecroy_rs=info".parse()?))
        .init();

    let args = AcquireArgs::parse();

    // Load configuration if the file exists; the CLI can drive everything
    // without one.
    let mut config = if std::path::Path::new(&args.common.config_file).exists() {
        let config = Config::load(&args.common.config_file)?;
        info!(config_file = %args.common.config_file, "Loaded configuration from file");
        config
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(host) = args.host.clone() {
        config.scope.host = host;
    }
    if !args.channels.is_empty() {
        config.acquisition.channels = args.channels.clone();
    }
    if !args.functions.is_empty() {
        config.acquisition.functions = args.functions.clone();
    }
    if let Some(parameter) = args.parameter() {
        config.acquisition.parameter = Some(parameter);
    }
    if let Some(time_div) = args.time_div.clone() {
        config.acquisition.time_div = Some(time_div);
    }
    if let Some(count) = args.count {
        config.acquisition.count = count;
    }
    if let Some(output_dir) = args.output_dir.clone() {
        config.output.dir = output_dir;
    }

    config.validate()?;

    info!(
        host = %config.scope.host,
        channels = ?config.acquisition.channels,
        functions = ?config.acquisition.functions,
        count = config.acquisition.count,
        "Acquisition configuration"
    );

    let mut client = ScopeClient::connect(&config.scope_config()).await?;
    client.prepare_data_taking().await?;

    // Remember the timebase when we are about to change it, so the
    // instrument is left the way we found it.
    let previous_time_div = match &config.acquisition.time_div {
        Some(time_div) => {
            let previous = client.time_div().await?;
            client.set_time_div(time_div).await?;
            info!(time_div = %time_div, previous, "Timebase set");
            Some(previous)
        }
        None => None,
    };

    if args.local_store {
        for _ in 0..config.acquisition.count {
            client
                .store_waveforms(&config.acquisition.channels)
                .await?;
        }
        info!(
            count = config.acquisition.count,
            "Waveforms stored on instrument disk"
        );
    } else {
        let mut writer = SampleWriter::new(&config.output.dir, &config.output.prefix)?;
        for index in 0..config.acquisition.count {
            let sample = client
                .acquire_sample(
                    &config.acquisition.channels,
                    &config.acquisition.functions,
                    config.acquisition.parameter.as_deref(),
                )
                .await?;
            let path = writer.write(&sample)?;
            info!(
                index,
                waveforms = sample.len(),
                path = %path.display(),
                "Sample written"
            );
        }
        println!(
            "Wrote {} sample(s) to {}",
            writer.written(),
            config.output.dir
        );
    }

    if let Some(previous) = previous_time_div {
        client.set_time_div(&format!("{previous:E}")).await?;
    }
    client.set_trigger_mode(TriggerMode::Normal).await?;

    info!("Acquisition finished");
    Ok(())
}
