use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use melonrip_core::{
    decode, CommandRecord, DisplayOutcome, FileSink, Polygon, RenderState, Ripper, RipperConfig,
    Vertex, VramBank, VramBanks,
};
use tracing_subscriber::EnvFilter;

fn main() -> melonrip_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { dump, json } => run_inspect(&dump, json),
        Commands::Synth {
            config,
            output_dir,
            frames,
            title,
        } => run_synth(config.as_deref(), output_dir, frames, title.as_deref()),
    }
}

fn run_inspect(path: &Path, json: bool) -> melonrip_core::Result<()> {
    tracing::info!(?path, "inspecting dump");

    let bytes = std::fs::read(path)?;
    let artifact = decode(&bytes)?;
    let summary = artifact.summary(bytes.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}: {} bytes", path.display(), summary.total_bytes);
        println!("  triangles      {}", summary.triangles);
        println!("  quads          {}", summary.quads);
        println!("  tex params     {}", summary.tex_params);
        println!("  tex palettes   {}", summary.tex_palettes);
        println!("  polygon attrs  {}", summary.polygon_attrs);
        println!("  DISP3DCNT      {:#010x}", summary.disp_cnt);
        println!("  texture map    {:x?}", summary.texture_map);
        println!("  palette map    {:x?}", summary.tex_pal_map);
    }
    Ok(())
}

/// Drives a synthetic geometry engine through the ripper, one spinning quad
/// per frame, and writes a dump for each requested frame.
fn run_synth(
    config: Option<&Path>,
    output_dir: Option<PathBuf>,
    frames: u32,
    title: Option<&str>,
) -> melonrip_core::Result<()> {
    let mut config = match config {
        Some(path) => RipperConfig::from_json_file(path)?,
        None => RipperConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    std::fs::create_dir_all(&config.output_dir)?;
    tracing::info!(output_dir = ?config.output_dir, frames, "running synthetic capture");

    let mut sink = FileSink::from_config(&config);
    sink.set_title(title);
    let mut ripper = Ripper::from_config(sink, &config);

    let banks: Vec<Vec<u8>> = VramBank::ALL
        .iter()
        .map(|bank| vec![0; bank.size()])
        .collect();
    let state = RenderState {
        texture_map: [0; 4],
        tex_pal_map: [0; 8],
        banks: VramBanks::new(std::array::from_fn(|i| banks[i].as_slice()))?,
        disp_cnt: 0x0000_0001,
        toon_table: [0; 32],
    };

    ripper.request_rip(frames);

    let mut emitted = 0;
    for frame in 0..synth_frame_count(frames) {
        ripper.polygon_attr(0x001f_0080);
        ripper.tex_param(0);
        ripper.on_command(&CommandRecord::Polygon(spinning_quad(frame)));
        ripper.on_buffer_swap();

        match ripper.on_display(&state) {
            DisplayOutcome::Emitted(name) => {
                emitted += 1;
                println!("{name}");
            }
            DisplayOutcome::Failed => tracing::warn!(frame, "frame was not saved"),
            DisplayOutcome::Idle => {}
        }
    }

    tracing::info!(emitted, "synthetic capture finished");
    Ok(())
}

/// One extra frame for the request to arm and one for the last rip to be
/// rendered.
fn synth_frame_count(frames: u32) -> u32 {
    frames.saturating_add(2)
}

fn spinning_quad(frame: u32) -> Polygon {
    let corners = [(-1, -1), (1, -1), (1, 1), (-1, 1)];
    let shift = (frame % 4) as usize;
    Polygon::Quad(std::array::from_fn(|i| {
        let (x, y) = corners[(i + shift) % 4];
        Vertex {
            position: [x * 0x1000, y * 0x1000, -0x1000],
            color: [0x1f, (i as i32) * 8, 0],
            tex_coords: [(x.max(0) * 64) as i16, (y.max(0) * 64) as i16],
        }
    }))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Capture and inspect DS 3D frame dumps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a dump and print what it contains.
    Inspect {
        /// Path to the `.dump` file.
        dump: PathBuf,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a synthetic frame loop through the ripper and write the dumps.
    Synth {
        /// Optional JSON config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory to write dumps into; overrides the config.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Number of consecutive frames to rip.
        #[arg(short, long, default_value_t = 1)]
        frames: u32,
        /// Game title used for file names.
        #[arg(short, long)]
        title: Option<String>,
    },
}
