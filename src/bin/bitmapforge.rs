use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bitmapforge::{
    CaptureOptions, CssSink, ExportTiming, FfmpegSink, FfmpegSinkOpts, FrameSink, GifSink,
    LottieSink, ProjectSettings, SceneManager, SpriteSheetSink, VideoFormat, export_frames,
    frame_count,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bitmapforge", version)]
struct Cli {
    /// Log at DEBUG level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print loop timing for a settings file.
    Info(InfoArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export one loop as an animation.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Model file (.stl, .obj, .gltf or .glb).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Project settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 400)]
    height: u32,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Project settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Capture rate used for the frame count.
    #[arg(long, default_value_t = bitmapforge::export::capture::DEFAULT_EXPORT_FPS)]
    fps: f64,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Loop time to render, in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Gif,
    Apng,
    Mp4,
    Webm,
    Sprites,
    Css,
    Lottie,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long, value_enum)]
    format: ExportFormat,

    /// Output file (or directory for `css`).
    #[arg(long)]
    out: PathBuf,

    /// Capture rate.
    #[arg(long, default_value_t = bitmapforge::export::capture::DEFAULT_EXPORT_FPS)]
    fps: f64,

    /// Export the short fade-free loop instead of the full loop.
    #[arg(long)]
    short_loop: bool,

    /// Base name for css and lottie output.
    #[arg(long, default_value = "bitmapforge-animation")]
    name: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_settings(path: Option<&Path>) -> anyhow::Result<ProjectSettings> {
    match path {
        Some(path) => ProjectSettings::load(path)
            .with_context(|| format!("read settings '{}'", path.display())),
        None => Ok(ProjectSettings::default()),
    }
}

fn build_scene(args: &SceneArgs) -> anyhow::Result<SceneManager> {
    let mut manager = SceneManager::new(args.width, args.height)?;
    read_settings(args.settings.as_deref())?.apply_to(&mut manager);
    if let Some(model) = &args.model {
        manager
            .load_model_file(model)
            .with_context(|| format!("load model '{}'", model.display()))?;
    }
    manager.pause_live_loop();
    Ok(manager)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let mut manager = SceneManager::new(1, 1)?;
    read_settings(args.settings.as_deref())?.apply_to(&mut manager);
    let loop_ms = manager.loop_duration_ms();
    let short_ms = manager.export_loop_duration_ms();
    println!("loop_duration_ms: {loop_ms:.3}");
    println!("export_loop_duration_ms: {short_ms:.3}");
    println!("frames@{}fps: {}", args.fps, frame_count(loop_ms, args.fps));
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut manager = build_scene(&args.scene)?;
    manager.render_at_time(args.time_ms)?;
    let surface = manager.get_canvas_surface()?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    surface
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn make_sink(args: &ExportArgs) -> Box<dyn FrameSink> {
    let video = |format| Box::new(FfmpegSink::new(FfmpegSinkOpts::new(&args.out, format)));
    match args.format {
        ExportFormat::Gif => Box::new(GifSink::new(&args.out)),
        ExportFormat::Apng => video(VideoFormat::Apng),
        ExportFormat::Mp4 => video(VideoFormat::Mp4),
        ExportFormat::Webm => video(VideoFormat::Webm),
        ExportFormat::Sprites => Box::new(SpriteSheetSink::new(&args.out)),
        ExportFormat::Css => Box::new(CssSink::new(&args.out, args.name.clone())),
        ExportFormat::Lottie => Box::new(LottieSink::new(&args.out, args.name.clone())),
    }
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut manager = build_scene(&args.scene)?;
    let mut sink = make_sink(&args);
    let opts = CaptureOptions {
        fps: args.fps,
        timing: if args.short_loop {
            ExportTiming::ShortLoop
        } else {
            ExportTiming::FullLoop
        },
        cancel: None,
    };

    let mut last_decile = 0;
    let summary = export_frames(&mut manager, sink.as_mut(), &opts, |done, total| {
        let decile = done * 10 / total;
        if decile > last_decile {
            last_decile = decile;
            tracing::info!("captured {done}/{total} frames");
        }
    })
    .with_context(|| format!("export {:?} to '{}'", args.format, args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} ms per frame)",
        args.out.display(),
        summary.frame_count,
        summary.frame_delay_ms
    );
    Ok(())
}
