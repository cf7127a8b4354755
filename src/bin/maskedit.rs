use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use maskedit::{
    BrushStroke, BrushSurface, EditSession, GeminiEditor, GeminiModel, Mask, Point, composite,
};

#[derive(Parser, Debug)]
#[command(name = "maskedit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Blend an edited image into an original, restricted to a mask.
    Composite(CompositeArgs),
    /// Rasterize stroke polylines into a mask PNG.
    Brush(BrushArgs),
    /// Run a full edit against the Gemini image model.
    Edit(EditArgs),
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Original image path.
    #[arg(long)]
    original: PathBuf,

    /// Full-frame edited image path.
    #[arg(long)]
    edited: PathBuf,

    /// Mask PNG path (alpha = coverage).
    #[arg(long)]
    mask: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BrushArgs {
    /// Surface width in pixels.
    #[arg(long)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long)]
    height: u32,

    /// Brush diameter in pixels.
    #[arg(long, default_value_t = 40.0)]
    brush: f32,

    /// Stroke polyline as "x,y x,y ..."; repeat for multiple strokes.
    #[arg(long = "stroke", required = true)]
    strokes: Vec<String>,

    /// Output mask PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// Input image path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Edit instruction.
    #[arg(long)]
    prompt: String,

    /// Optional mask PNG restricting the edit region.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long)]
    api_key: String,

    /// Model variant: "flash" or "pro".
    #[arg(long, default_value = "flash")]
    model: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("maskedit=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Composite(args) => cmd_composite(args),
        Command::Brush(args) => cmd_brush(args),
        Command::Edit(args) => cmd_edit(args),
    }
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let original = read_file(&args.original)?;
    let edited = read_file(&args.edited)?;
    let mask = read_file(&args.mask)?;

    let out = composite(&original, &edited, &mask)?;
    write_file(&args.out, &out.encode_png()?)
}

fn cmd_brush(args: BrushArgs) -> anyhow::Result<()> {
    let mut surface = BrushSurface::new(args.width, args.height)?;
    surface.set_active(true);

    let mut mask = None;
    for raw in &args.strokes {
        let stroke = parse_stroke(raw, args.brush)?;
        if let Some(exported) = surface.paint_stroke(&stroke)? {
            mask = Some(exported);
        }
    }
    let mask = mask.ok_or_else(|| anyhow::anyhow!("strokes painted no content"))?;
    write_file(&args.out, mask.png_bytes())
}

fn cmd_edit(args: EditArgs) -> anyhow::Result<()> {
    let model = match args.model.as_str() {
        "flash" => GeminiModel::Flash,
        "pro" => GeminiModel::Pro,
        other => anyhow::bail!("unknown model '{other}' (expected 'flash' or 'pro')"),
    };

    let provider = GeminiEditor::builder()
        .api_key(args.api_key)
        .model(model)
        .build()?;

    let mut session = EditSession::new(provider);
    session.load_source(read_file(&args.in_path)?, None)?;

    if let Some(mask_path) = &args.mask {
        session.set_mask(Mask::from_png(read_file(mask_path)?)?);
    }

    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    let outcome = runtime.block_on(session.render(&args.prompt))?;

    write_file(&args.out, &outcome.png)
}

fn parse_stroke(raw: &str, brush: f32) -> anyhow::Result<BrushStroke> {
    let mut points = Vec::new();
    for pair in raw.split_whitespace() {
        let (x, y) = pair
            .split_once(',')
            .with_context(|| format!("stroke point '{pair}' is not 'x,y'"))?;
        let x: f64 = x.parse().with_context(|| format!("bad x in '{pair}'"))?;
        let y: f64 = y.parse().with_context(|| format!("bad y in '{pair}'"))?;
        points.push(Point::new(x, y));
    }
    Ok(BrushStroke::new(points, brush)?)
}

fn read_file(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn write_file(path: &PathBuf, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
