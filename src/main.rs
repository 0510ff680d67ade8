use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use geogrid::data::cells_from_path;
use geogrid::{preview, BBox, Color, GeoGrid, GridOptions, LogSink, Payload, Scale, Source};

/// Bind datasets to a cell grid and write the styled GeoJSON
#[derive(Parser, Debug)]
#[command(name = "geogrid", version, about)]
struct Cli {
    /// Grid cells: `[{id, vertices}]` or a GeoJSON polygon collection
    #[arg(long, value_name = "FILE")]
    grid: PathBuf,

    /// Dataset `{resolution?, url?, data: [...]}`, one per source
    #[arg(long = "data", value_name = "FILE", required = true)]
    data: Vec<PathBuf>,

    /// Record field driving fill color
    #[arg(long)]
    color_key: Option<String>,

    #[arg(long)]
    color_min: Option<f64>,

    #[arg(long)]
    color_max: Option<f64>,

    /// Color ramp as FROM,TO (e.g. "#ffffcc,#800026")
    #[arg(long, value_name = "FROM,TO")]
    color_ramp: Option<String>,

    /// Record field driving cell size
    #[arg(long)]
    size_key: Option<String>,

    #[arg(long)]
    size_min: Option<f64>,

    #[arg(long)]
    size_max: Option<f64>,

    /// Size multipliers as LO,HI
    #[arg(long, value_name = "LO,HI")]
    size_range: Option<String>,

    /// Only write features intersecting MINLON,MINLAT,MAXLON,MAXLAT
    #[arg(long, value_name = "MINLON,MINLAT,MAXLON,MAXLAT")]
    bbox: Option<String>,

    /// Print a braille preview of WxH characters instead of GeoJSON
    #[arg(long, value_name = "WxH")]
    preview: Option<String>,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_pair(s: &str) -> Result<(String, String)> {
    match s.split_once(',') {
        Some((a, b)) => Ok((a.trim().to_string(), b.trim().to_string())),
        None => bail!("expected two comma-separated values, got {:?}", s),
    }
}

fn parse_bbox(s: &str) -> Result<BBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid bbox {:?}", s))?;
    match parts[..] {
        [min_lon, min_lat, max_lon, max_lat] => Ok(BBox::new(min_lon, min_lat, max_lon, max_lat)),
        _ => bail!("bbox needs four values, got {}", parts.len()),
    }
}

fn parse_size(s: &str) -> Result<(usize, usize)> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("preview size must look like 80x24, got {:?}", s))?;
    Ok((w.parse()?, h.parse()?))
}

/// Build one source per dataset file, all sharing the CLI encoding flags
fn load_sources(cli: &Cli) -> Result<Vec<Source>> {
    let color_scale = match &cli.color_ramp {
        Some(ramp) => {
            let (from, to) = parse_pair(ramp)?;
            Some(Scale::color_ramp(from.parse::<Color>()?, to.parse::<Color>()?))
        }
        None => None,
    };
    let size_scale = match &cli.size_range {
        Some(range) => {
            let (lo, hi) = parse_pair(range)?;
            Some(Scale::size_range(lo.parse()?, hi.parse()?))
        }
        None => None,
    };

    let mut sources = Vec::with_capacity(cli.data.len());
    for path in &cli.data {
        let payload =
            Payload::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;

        let mut source = Source::new(payload)
            .with_color_range(cli.color_min, cli.color_max)
            .with_size_range(cli.size_min, cli.size_max);
        source.color.key = cli.color_key.clone();
        source.size.key = cli.size_key.clone();
        if let Some(scale) = &color_scale {
            source = source.with_color_scale(scale.clone());
        }
        if let Some(scale) = &size_scale {
            source = source.with_size_scale(scale.clone());
        }
        sources.push(source);
    }
    Ok(sources)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let sources = load_sources(&cli)?;
    let mut grid = GeoGrid::new(GridOptions::default(), sources);
    if grid.cache_data(&mut LogSink).is_none() {
        bail!("no sources to bind");
    }

    let cells = cells_from_path(&cli.grid)
        .with_context(|| format!("failed to load grid {}", cli.grid.display()))?;
    log::info!("{} cells loaded", cells.len());
    grid.set_cells(cells);

    grid.produce_geojson();
    let bbox = cli.bbox.as_deref().map(parse_bbox).transpose()?;

    let rendered = match (&cli.preview, bbox) {
        (Some(size), bbox) => {
            let (width, height) = parse_size(size)?;
            let frame = match bbox.or_else(|| bounds_of(&grid)) {
                Some(frame) => frame,
                None => bail!("nothing to preview"),
            };
            let visible = grid.reduce_geojson(frame).context("no feature collection")?;
            preview::render(&grid, &visible, &frame, width, height)
        }
        (None, Some(bbox)) => {
            let visible = grid.reduce_geojson(bbox).context("no feature collection")?;
            serde_json::to_string(&*visible)?
        }
        (None, None) => serde_json::to_string(grid.geojson().context("no feature collection")?)?,
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered)?;
        }
    }
    Ok(())
}

/// Bounds of every cell with vertices
fn bounds_of(grid: &GeoGrid) -> Option<BBox> {
    grid.cells()
        .iter()
        .filter_map(|c| c.vertices.as_deref().and_then(BBox::of_ring))
        .reduce(|a, b| {
            BBox::new(
                a.min_lon.min(b.min_lon),
                a.min_lat.min(b.min_lat),
                a.max_lon.max(b.max_lon),
                a.max_lat.max(b.max_lat),
            )
        })
}
