use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use geosr::api::{handle_request, process_raster_to_path, write_georef_sidecars};
use geosr::io::{GdalCodec, LocalStore, OnnxLoader, OnnxSuperResolver};
use geosr::RequestConfig;

use super::args::{CliArgs, Command, RequestArgs, RunArgs};
use super::errors::AppError;

fn init_logging(enabled: bool) {
    if !enabled && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_local(args: RunArgs, mut config: RequestConfig) -> Result<(), AppError> {
    if let Some(tile_size) = args.tile_size {
        config.tiling.tile_size = tile_size;
    }
    if let Some(pad) = args.pad {
        config.tiling.pad = pad;
    }
    if let Some(mode) = args.mode {
        config.tiling.mode = mode;
    }
    config.tiling.validate()?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut model = OnnxSuperResolver::from_file(&args.model)?;
    let summary = process_raster_to_path(
        &GdalCodec,
        &args.input,
        &args.output,
        &mut model,
        &args.bands,
        &config,
    )?;
    info!(
        "Wrote {:?}: {}x{} at scale {}",
        args.output, summary.width, summary.height, summary.scale
    );

    if args.world_file {
        for path in write_georef_sidecars(&args.output, &summary)? {
            info!("Wrote sidecar {:?}", path);
        }
    }
    Ok(())
}

fn run_request(args: RequestArgs, config: RequestConfig) -> Result<(), AppError> {
    if !args.store_root.is_dir() {
        return Err(AppError::MissingStoreRoot {
            path: args.store_root.display().to_string(),
        });
    }
    let request_json = fs::read_to_string(&args.request)?;
    let store = LocalStore::new(&args.store_root);
    let response = handle_request(&request_json, &store, &GdalCodec, &OnnxLoader, &config);
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.is_success() {
        return Err(AppError::RequestFailed {
            status: response.status_code,
        });
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let config = match &args.config {
        Some(path) => RequestConfig::from_json_file(path)?,
        None => RequestConfig::default(),
    };

    match args.command {
        Command::Run(run_args) => run_local(run_args, config)?,
        Command::Request(request_args) => run_request(request_args, config)?,
    }
    Ok(())
}
