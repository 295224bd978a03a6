use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trailreel::{
    Admission, CanonicalTrackSet, PipelineConfig, ProcessingOrder, TrackLoader, run_pipeline,
};

#[derive(Parser, Debug)]
#[command(name = "trailreel", version, about = "Animated map videos from GPX/FIT tracks")]
struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render frames and encode the video (requires `ffmpeg` on PATH unless the clip is skipped).
    Render(RenderArgs),
    /// List the canonical tracks of a folder and whether each would be rendered.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder with .gpx / .fit / .fit.gz files.
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Frame cache folder.
    #[arg(long)]
    frames_folder: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Background music.
    #[arg(long)]
    music: Option<PathBuf>,

    #[arg(long)]
    speed_factor: Option<f64>,

    #[arg(long)]
    max_frames_per_course: Option<usize>,

    /// Pre-rendered map image used as background.
    #[arg(long)]
    base_map: Option<PathBuf>,

    #[arg(long)]
    intermediate_video: Option<PathBuf>,

    #[arg(long, value_enum)]
    order: Option<ProcessingOrder>,

    /// Extra font directory (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    #[arg(long)]
    skip_frames: bool,
    #[arg(long)]
    skip_effects: bool,
    #[arg(long)]
    skip_audio: bool,
    #[arg(long)]
    skip_write: bool,
    #[arg(long)]
    skip_loading: bool,
    #[arg(long)]
    skip_clip: bool,
    /// Clear the frame cache folder before rendering.
    #[arg(long)]
    erase_frame_folder: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// JSON config file supplying cutoff date, center and radius.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    folder: Option<PathBuf>,

    #[arg(long, value_enum)]
    order: Option<ProcessingOrder>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => Ok(PipelineConfig::from_json_file(p)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_ref())?;

    if let Some(v) = args.folder {
        cfg.folder = v;
    }
    if let Some(v) = args.frames_folder {
        cfg.frames_folder = v;
    }
    if let Some(v) = args.output {
        cfg.output_file = v;
    }
    if let Some(v) = args.music {
        cfg.music_path = Some(v);
    }
    if let Some(v) = args.speed_factor {
        cfg.speed_factor = v;
    }
    if let Some(v) = args.max_frames_per_course {
        cfg.max_frames_per_course = v;
    }
    if let Some(v) = args.base_map {
        cfg.base_map = Some(v);
    }
    if let Some(v) = args.intermediate_video {
        cfg.intermediate_video = v;
    }
    if let Some(v) = args.order {
        cfg.processing_order = v;
    }
    cfg.font_dirs.extend(args.font_dirs);
    cfg.skip_frames |= args.skip_frames;
    cfg.skip_effects |= args.skip_effects;
    cfg.skip_audio |= args.skip_audio;
    cfg.skip_write |= args.skip_write;
    cfg.skip_loading |= args.skip_loading;
    cfg.skip_clip |= args.skip_clip;
    cfg.erase_frame_folder |= args.erase_frame_folder;

    let out = run_pipeline(&cfg).context("pipeline failed")?;

    let s = &out.summary;
    eprintln!(
        "tracks: {} seen, {} rendered, {} skipped; frames: {} ({}); distance: {:.1} km",
        s.tracks_seen,
        s.tracks_rendered,
        s.skipped.len(),
        out.frames.len(),
        if out.from_cache { "from cache" } else { "rendered" },
        s.distance_km,
    );
    for item in &s.skipped {
        eprintln!("  skipped {}: {}", item.path.display(), item.reason);
    }
    if out.written {
        eprintln!(
            "wrote {}{}",
            out.path.display(),
            if out.audio_attached { " (with audio)" } else { "" }
        );
    } else {
        eprintln!("final video not written");
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(v) = args.folder {
        cfg.folder = v;
    }
    if let Some(v) = args.order {
        cfg.processing_order = v;
    }

    let set = CanonicalTrackSet::scan(&cfg.folder)
        .with_context(|| format!("scan '{}'", cfg.folder.display()))?;
    let files = TrackLoader::order(set.files(), cfg.processing_order);
    let loader = cfg.loader();

    println!("{} canonical track(s) in {}", files.len(), cfg.folder.display());
    for (index, path) in files.iter().enumerate() {
        match loader.admit(index, path) {
            Admission::Admitted(track) => {
                let start = track
                    .start_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{index:>4}  render  {}  points={} start={start}",
                    path.display(),
                    track.points.len()
                );
            }
            Admission::Skipped(reason) => {
                println!("{index:>4}  skip    {}  {reason}", path.display());
            }
        }
    }
    Ok(())
}
