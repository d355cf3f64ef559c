use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::config::load_config;
use crate::geometry_dump::{GeometryDump, write_geometry_dump};
use crate::scene::{Scene, parse_scene};
use crate::view::GraphView;

#[derive(Parser, Debug)]
#[command(name = "ndv", version, about = "Node-link diagram view validation engine")]
pub struct Args {
    /// Input scene (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON file (overrides the scene's embedded config)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Zoom factor override
    #[arg(short = 's', long = "scale")]
    pub scale: Option<f32>,

    /// Pan offset override, "x,y" in unscaled units
    #[arg(short = 't', long = "translate")]
    pub translate: Option<String>,

    /// Display root cell id (drill into a group)
    #[arg(short = 'r', long = "root")]
    pub root: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Summary,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let input = read_input(args.input.as_deref())?;
    let scene = parse_scene(&input)?;

    let config = match args.config.as_deref() {
        Some(path) => load_config(Some(path))?,
        None => scene.config.clone(),
    };

    let mut view = GraphView::new(config.view);
    let scale = args.scale.unwrap_or(scene.scale);
    let translate = match args.translate.as_deref() {
        Some(pair) => parse_translate(pair)?,
        None => scene.translate,
    };
    view.scale_and_translate(scale, translate);

    let root = match args.root.as_deref() {
        Some(key) => Some(
            scene
                .ids
                .get(key)
                .copied()
                .with_context(|| format!("unknown display root {key:?}"))?,
        ),
        None => scene.root,
    };
    view.set_current_root(root);
    view.validate(&scene.model);

    match args.output_format {
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_geometry_dump(path, &view, &scene.model, &scene.names)?,
            None => {
                let dump = GeometryDump::from_view(&view, &scene.model, &scene.names);
                let stdout = io::stdout();
                serde_json::to_writer_pretty(stdout.lock(), &dump)?;
                println!();
            }
        },
        OutputFormat::Summary => {
            let summary = render_summary(&view, &scene);
            match args.output.as_deref() {
                Some(path) => std::fs::write(path, summary)?,
                None => {
                    io::stdout().write_all(summary.as_bytes())?;
                }
            }
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn parse_translate(pair: &str) -> Result<(f32, f32)> {
    let Some((x, y)) = pair.split_once(',') else {
        anyhow::bail!("expected --translate x,y, got {pair:?}");
    };
    let x = x.trim().parse::<f32>().context("translate x")?;
    let y = y.trim().parse::<f32>().context("translate y")?;
    Ok((x, y))
}

fn render_summary(view: &GraphView, scene: &Scene) -> String {
    let mut vertices = 0usize;
    let mut edges = 0usize;
    let mut evicted = 0usize;
    for &id in scene.names.keys() {
        if view.state(id).is_none() {
            evicted += 1;
        } else if scene.model.is_edge(id) {
            edges += 1;
        } else {
            vertices += 1;
        }
    }
    let bounds = view.graph_bounds();
    let mut out = String::new();
    out.push_str(&format!(
        "scale {} translate {},{}\n",
        view.scale(),
        view.translate().0,
        view.translate().1
    ));
    out.push_str(&format!(
        "states: {vertices} vertices, {edges} edges ({evicted} without state)\n"
    ));
    out.push_str(&format!(
        "bounds: {} {} {} {}\n",
        bounds.x, bounds.y, bounds.width, bounds.height
    ));
    out
}
