use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use ofx_bridge::{
    BridgeOpts, ChannelMask, ClipBridge, EffectOp, ExportOpts, FieldOrder, HostNode, ImageEffect,
    ImageWriter, OUTPUT_CLIP_NAME, Pattern, ProjectSettings, RectD, RenderScale, SOURCE_CLIP_NAME,
    Size, SyntheticEffect, SyntheticNode, Transfer,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ofx-bridge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a synthetic effect chain and write its output clip as a PNG.
    Fetch(FetchArgs),
    /// Print the clip properties of the last effect in the chain as JSON.
    Describe(GraphArgs),
}

#[derive(Parser, Debug)]
struct GraphArgs {
    /// Project and source width in pixels.
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Project and source height in pixels.
    #[arg(long, default_value_t = 48)]
    height: u32,

    /// Number of effects stacked on the native source.
    #[arg(long, default_value_t = 1)]
    chain: usize,

    /// What every effect in the chain does.
    #[arg(long, value_enum, default_value_t = OpChoice::Passthrough)]
    op: OpChoice,

    /// Factor used by `--op gain`.
    #[arg(long, default_value_t = 0.5)]
    gain: f32,

    /// Source scanlines to report as missing.
    #[arg(long = "missing-row")]
    missing_rows: Vec<i32>,

    /// Bridge options JSON (`input_ordering`, `max_upstream_depth`).
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    #[command(flatten)]
    graph: GraphArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Requested region `x1,y1,x2,y2` in canonical coordinates (defaults to the project).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    region: Option<Vec<f64>>,

    /// Frame time.
    #[arg(long, default_value_t = 1.0)]
    time: f64,

    /// Transfer applied when quantising to 8 bits.
    #[arg(long, value_enum, default_value_t = TransferChoice::Srgb)]
    transfer: TransferChoice,

    /// Premultiply colour by alpha in the written file.
    #[arg(long)]
    premultiply: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpChoice {
    Passthrough,
    Invert,
    Gain,
    Fill,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransferChoice {
    Linear,
    Srgb,
}

/// Native source followed by `chain` effect nodes; the last node is the output node.
struct Graph {
    nodes: Vec<Arc<SyntheticNode>>,
    effects: Vec<Arc<SyntheticEffect>>,
    project: ProjectSettings,
}

impl Graph {
    fn last_effect(&self) -> anyhow::Result<&Arc<SyntheticEffect>> {
        self.effects.last().context("effect chain is empty")
    }

    fn output_clip(&self) -> anyhow::Result<Arc<ClipBridge>> {
        self.last_effect()?
            .clip(OUTPUT_CLIP_NAME)
            .context("last effect has no output clip")
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Fetch(args) => cmd_fetch(args),
        Command::Describe(args) => cmd_describe(args),
    }
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<BridgeOpts> {
    match path {
        Some(p) => Ok(BridgeOpts::from_path(p)?),
        None => Ok(BridgeOpts::default()),
    }
}

fn build_graph(args: &GraphArgs) -> anyhow::Result<Graph> {
    if args.chain == 0 {
        anyhow::bail!("--chain must be >= 1");
    }
    if args.width == 0 || args.height == 0 {
        anyhow::bail!("--width and --height must be >= 1");
    }
    let opts = read_opts(args.opts.as_deref())?;
    let dw = RectD::new(0.0, 0.0, f64::from(args.width), f64::from(args.height));
    let project = ProjectSettings {
        extent: Size::new(dw.width(), dw.height()),
        ..ProjectSettings::default()
    };
    let op = match args.op {
        OpChoice::Passthrough => EffectOp::Passthrough,
        OpChoice::Invert => EffectOp::Invert,
        OpChoice::Gain => EffectOp::Gain(args.gain),
        OpChoice::Fill => EffectOp::Fill([0.2, 0.4, 0.8, 1.0]),
    };

    let source = Arc::new(
        SyntheticNode::source("source", dw, Pattern::Gradient)
            .with_missing_rows(args.missing_rows.iter().copied()),
    );
    let mut nodes = vec![Arc::clone(&source)];
    let mut effects = Vec::with_capacity(args.chain);
    for i in 0..args.chain {
        let mut node = SyntheticNode::with_inputs(format!("fx{i}"), dw, &[SOURCE_CLIP_NAME]);
        if i + 1 == args.chain {
            node = node.as_output();
        }
        let node = Arc::new(node);
        if let Some(upstream) = nodes.last() {
            node.connect_input(0, Arc::clone(upstream));
        }
        effects.push(SyntheticEffect::attach(&node, op, project, opts.clone())?);
        nodes.push(node);
    }

    Ok(Graph {
        nodes,
        effects,
        project,
    })
}

fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let graph = build_graph(&args.graph)?;
    let region = match args.region.as_deref() {
        Some(&[x1, y1, x2, y2]) => Some(RectD::new(x1, y1, x2, y2)),
        Some(other) => anyhow::bail!("--region takes 4 values, got {}", other.len()),
        None => None,
    };
    let request = region.unwrap_or_else(|| {
        RectD::from_origin_size(graph.project.offset, graph.project.extent)
    });

    let effect = graph.last_effect()?;
    let status = effect.render_action(
        args.time,
        FieldOrder::None,
        request.to_pixel_enclosing_unit(),
        RenderScale::UNIT,
    );
    if !status.is_ok() {
        anyhow::bail!("render of '{}' failed: {status:?}", OUTPUT_CLIP_NAME);
    }

    let output = graph.output_clip()?;
    let image = output
        .get_image(args.time, region)
        .context("fetch output image")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let writer = ImageWriter::new(ExportOpts {
        transfer: match args.transfer {
            TransferChoice::Linear => Transfer::Linear,
            TransferChoice::Srgb => Transfer::Srgb,
        },
        premultiply: args.premultiply,
    });
    writer.write_image(&args.out, &image, ChannelMask::RGBA)?;

    for effect in &graph.effects {
        if let Some(source) = effect.clip(SOURCE_CLIP_NAME) {
            let stats = source.stats();
            tracing::info!(
                clip = source.name(),
                upstream_renders = stats.upstream_renders,
                rows_skipped = stats.rows_skipped,
                "source clip stats"
            );
        }
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_describe(args: GraphArgs) -> anyhow::Result<()> {
    let graph = build_graph(&args)?;
    let effect = graph.last_effect()?;

    let mut clips = Vec::new();
    for name in [OUTPUT_CLIP_NAME, SOURCE_CLIP_NAME] {
        let Some(clip) = effect.clip(name) else {
            continue;
        };
        let upstream = clip
            .associated_node()?
            .map(|n| n.name().to_string());
        clips.push(serde_json::json!({
            "name": clip.name(),
            "descriptor": clip.descriptor(),
            "connected": clip.connected()?,
            "upstream": upstream,
            "unmapped_bit_depth": clip.unmapped_bit_depth(),
            "unmapped_components": clip.unmapped_components(),
            "premultiplication": clip.premultiplication(),
            "pixel_aspect_ratio": clip.aspect_ratio()?,
            "frame_rate": clip.frame_rate()?,
            "frame_range": clip.frame_range()?,
            "unmapped_frame_rate": clip.unmapped_frame_rate(),
            "unmapped_frame_range": clip.unmapped_frame_range(),
            "field_order": clip.field_order()?.as_ofx_str(),
            "continuous_samples": clip.continuous_samples(),
            "region_of_definition": clip.region_of_definition(1.0)?,
        }));
    }

    let doc = serde_json::json!({
        "nodes": graph.nodes.iter().map(|n| n.name().to_string()).collect::<Vec<_>>(),
        "clips": clips,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
