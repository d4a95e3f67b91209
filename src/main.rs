use std::{path::PathBuf, sync::Arc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use clap::Parser;
use lpram::{
    circuit::{BuildOptions, CircuitFactory, Design, ReplicaArraySpec, ReplicaBitcellArrayArg},
    export,
    pdk::Pdk,
    ErrorContext
};

fn main_result() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.level())
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // load config
    let config: ArrayConfig = {
        let context = std::fs::read_to_string(&args.config).context("read config file")?;
        serde_json::from_str(&context).context("parse config file")?
    };
    config.create_output_path()?;

    // load pdk
    let pdk = match &config.pdk_path {
        Some(path) => Pdk::load(path).context("load pdk")?,
        None => {
            info!("no pdk path given, use the built-in synthetic cells (end_caps={})", config.end_caps);
            let pdk = if config.end_caps { Pdk::builtin_with_end_caps() } else { Pdk::builtin() };
            pdk.context("load built-in pdk")?
        }
    };
    if config.pdk_path.is_some() && config.end_caps {
        warn!("end_caps is only used with the built-in cells, the pdk decides it otherwise");
    }

    // create replica array
    let netlist_only = config.netlist_only || args.netlist_only;
    let mut factory = CircuitFactory::with_options(Arc::new(pdk), BuildOptions { netlist_only });
    let arg = ReplicaBitcellArrayArg::from_spec(&config.array, &factory).context("resolve replica array")?;
    let array = factory.module(arg).context("create replica array")?;
    info!("built {} with {} module(s)", array.read().name(), factory.module_count());

    // write spice
    let name = array.read().name();
    let spice_file = config.output_path.join(format!("{}.sp", name));
    export::write_spice(array.clone(), spice_file)?;

    // write layout
    if !netlist_only {
        let layout_file = config.output_path.join(format!("{}.layout.json", name));
        export::write_layout(array, layout_file)?;
    }

    Ok(())
}

fn main() {
    if let Err(e) = main_result() {
        eprintln!("Err: {}", e);
        std::process::exit(1);
    }
}

/// Replica bitcell array compiler
#[derive(Parser, Debug)]
#[command(name = "lpram")]
#[command(about = "A replica bitcell array compiler", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: String,

    /// Build the netlist only, skip all geometry
    #[arg(short, long)]
    netlist_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    pub fn level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ArrayConfig {
    /// PDK directory holding a `config.json`, the built-in cells when missing
    #[serde(default)]
    pub pdk_path: Option<PathBuf>,
    /// Pick the built-in cell families with end caps
    #[serde(default)]
    pub end_caps: bool,
    pub output_path: PathBuf,
    #[serde(default)]
    pub netlist_only: bool,
    #[serde(flatten)]
    pub array: ReplicaArraySpec,
}

impl ArrayConfig {
    pub fn create_output_path(&self) -> Result<(), Box<dyn std::error::Error>> {
        // Ensure output directory exists
        if !self.output_path.exists() {
            std::fs::create_dir_all(&self.output_path)?;
            info!("created output directory: {:?}", self.output_path);
        }
        Ok(())
    }
}
