use clap::{Parser, Subcommand};
use profile_media::crop::{
    CommitOutcome, CropSession, DisplaySize, OutputFormat, Pan, Quality, RustEncoder,
};
use profile_media::media::MediaResolver;
use profile_media::types::{self, MediaTarget};
use profile_media::{config, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn version_string() -> &'static str {
    let describe = env!("GIT_DESCRIBE");
    if describe.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({describe})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "profile-media")]
#[command(about = "Crop profile pictures and resolve stored media references")]
#[command(long_about = "\
Crop profile pictures and resolve stored media references

Cropping takes the same pan/zoom a crop dialog would and writes the pixels
under the crop frame at full source resolution:

  profile-media crop photo.jpg --target avatar --zoom 1.5 --pan-x -40 \\
      --display-width 480 --display-height 480 -o avatar.jpg

Targets and their default shapes:
  avatar   1:1
  banner   3:1
  post     16:9

Resolution turns whatever a record stored into a URL the browser can fetch:
  blob:/data: URLs         unchanged
  http://<api>/uploads/x   /uploads/x      (current or legacy API origin)
  /uploads/x               unchanged
  https://cdn/x            unchanged
  anything else            unchanged

Log verbosity follows RUST_LOG (default: warn).

Run 'profile-media gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve stored media references to fetchable URLs
    Resolve(ResolveArgs),
    /// Crop an image for an avatar, banner or post
    Crop(CropArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ResolveArgs {
    /// Stored references, one per argument
    #[arg(required_unless_present = "json")]
    references: Vec<String>,

    /// Show how each reference was classified
    #[arg(long)]
    explain: bool,

    /// Resolve every media field in a saved API response instead
    #[arg(long, conflicts_with = "references")]
    json: Option<PathBuf>,

    /// Current API origin (overrides config and API_BASE_URL)
    #[arg(long)]
    api_base_url: Option<String>,
}

#[derive(clap::Args)]
struct CropArgs {
    /// Image to crop
    input: PathBuf,

    /// Where to write the cropped image [default: <input>-<target>.<ext>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Media field the crop is for
    #[arg(long, default_value = "avatar")]
    target: MediaTarget,

    /// Zoom factor, 1 shows the whole frame
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Horizontal pan in display pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,

    /// Vertical pan in display pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,

    /// Width the whole image is drawn at on screen at zoom 1; without it pan
    /// is in source pixels
    #[arg(long, requires = "display_height")]
    display_width: Option<f64>,

    /// Height the whole image is drawn at on screen at zoom 1
    #[arg(long, requires = "display_width")]
    display_height: Option<f64>,

    /// Output format: jpeg, png, webp or avif
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Encoder quality 1-100 (lossy formats only)
    #[arg(long)]
    quality: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let media_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Resolve(args) => run_resolve(args, &media_config)?,
        Command::Crop(args) => run_crop(args, &media_config)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_resolve(
    args: ResolveArgs,
    media_config: &config::MediaConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut resolver = MediaResolver::from_config(media_config);
    if let Some(base) = args.api_base_url.as_deref() {
        resolver = resolver.with_api_base_url(base);
    }

    if let Some(path) = args.json {
        let content = std::fs::read_to_string(&path)?;
        let mut response: serde_json::Value = serde_json::from_str(&content)?;
        let changed = types::resolve_media_fields(&mut response, &resolver);
        log::info!("{}: rewrote {changed} media field(s)", path.display());
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let inputs: Vec<&str> = args.references.iter().map(String::as_str).collect();
    let results: Vec<_> = inputs
        .iter()
        .map(|raw| resolver.classify(Some(*raw)))
        .collect();
    output::print_resolutions(&inputs, &results, args.explain);
    Ok(())
}

fn run_crop(
    args: CropArgs,
    media_config: &config::MediaConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoding = media_config.output.encoding();
    if let Some(format) = args.format {
        encoding.format = format;
    }
    if let Some(quality) = args.quality {
        encoding.quality = Quality::new(quality);
    }

    let mut session = CropSession::for_target(Arc::new(RustEncoder::new()), args.target, media_config)
        .with_encoding(encoding);

    session.load_path(&args.input)?;
    let natural = session
        .source()
        .map(|source| source.dimensions())
        .ok_or("no image loaded")?;

    if let (Some(width), Some(height)) = (args.display_width, args.display_height) {
        session.set_display_size(DisplaySize::new(width, height))?;
    }
    session.set_zoom(args.zoom)?;
    session.pan_to(Pan::new(args.pan_x, args.pan_y))?;

    let pending = session.commit()?;
    let rect = pending.rect();
    let blob = match session.complete(pending)? {
        CommitOutcome::Committed(blob) => blob,
        CommitOutcome::Discarded => return Err("crop was discarded before it finished".into()),
    };

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, args.target, encoding.format));
    std::fs::write(&output_path, &blob.bytes)?;

    output::print_crop_output(&output::CropReport {
        source_path: &args.input,
        natural,
        target: args.target,
        ratio: media_config.crop.targets.ratio(args.target),
        rect,
        output_path: &output_path,
        blob: &blob,
    });
    Ok(())
}

/// `photos/me.heic` + avatar + jpeg → `photos/me-avatar.jpg`
fn default_output_path(input: &Path, target: MediaTarget, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crop".to_string());
    input.with_file_name(format!("{stem}-{target}.{}", format.extension()))
}
