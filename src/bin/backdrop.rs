use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene as a PNG.
    Render(RenderArgs),
    /// Print the progressive band sequence of one effect as JSON.
    Bands(BandsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BandsArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Effect index (0-based) in the scene's `effects` list.
    #[arg(long, default_value_t = 0)]
    effect: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Bands(args) => cmd_bands(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = backdrop::SceneDoc::from_path(&args.in_path)?;
    let frame = scene.render()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bands(args: BandsArgs) -> anyhow::Result<()> {
    let scene = backdrop::SceneDoc::from_path(&args.in_path)?;
    let bands = scene.bands(args.effect)?;
    let json = serde_json::to_string_pretty(&bands).context("serialize bands")?;
    println!("{json}");
    Ok(())
}
