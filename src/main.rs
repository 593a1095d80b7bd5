use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::info;
use looproute::osm::{Extent, FileFormat, Options, Profile};
use looproute::round_trip::{LengthBounds, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] looproute::Error);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Biased random walk, fast
    RandomWalk,

    /// Pheromone-guided search preferring round loops, slow
    AntColony,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Only ways which can be walked on
    Foot,

    /// Every way, regardless of its tags
    Any,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

#[derive(Parser)]
struct Cli {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Latitude of the start point
    lat: f64,

    /// Longitude of the start point
    lon: f64,

    /// Requested loop length, in kilometers
    length: f64,

    /// Accepted relative deviation from the requested length
    #[arg(long, default_value_t = 0.1)]
    tolerance: f64,

    /// Loop generation algorithm
    #[arg(long, value_enum, default_value_t = StrategyArg::RandomWalk)]
    strategy: StrategyArg,

    /// Seed for the random number generator; random if not provided
    #[arg(long)]
    seed: Option<u64>,

    /// Only load map data within this distance (in kilometers) from the start point;
    /// defaults to half of the requested length
    #[arg(long)]
    radius: Option<f64>,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Which ways can be used
    #[arg(long, value_enum, default_value_t = ProfileArg::Foot)]
    profile: ProfileArg,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let bounds = LengthBounds::around(cli.length, cli.tolerance)?;
    let extent = Extent {
        lat: cli.lat,
        lon: cli.lon,
        radius: cli.radius.unwrap_or(cli.length / 2.0),
    };
    info!("map extent: {:?}", extent.bbox());

    let g = load_graph(&cli.osm_file, &cli, extent)?;
    info!("loaded {} nodes and {} edges", g.len(), g.edges().len());

    let start = g
        .find_nearest_node(cli.lat, cli.lon)
        .ok_or("no node corresponding to the given start position")?;

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("starting at node {} with seed {seed}", start.id);
    let mut rng = StdRng::seed_from_u64(seed);

    let strategy = match cli.strategy {
        StrategyArg::RandomWalk => Strategy::RandomWalk(Default::default()),
        StrategyArg::AntColony => Strategy::AntColony(Default::default()),
    };

    let route = looproute::round_trip::find_loop(
        &g,
        start.id,
        &bounds,
        &strategy,
        &mut rng,
        &looproute::CancellationToken::new(),
    )?;

    if !bounds.contains(route.length) {
        log::warn!(
            "no loop within [{:.3}, {:.3}] km found, returning a {:.3} km loop",
            bounds.min,
            bounds.max,
            route.length
        );
    }

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{\"length_km\": {}}},", route.length);

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut coordinates = route.coordinates(&g).into_iter().peekable();
    while let Some((lat, lon)) = coordinates.next() {
        let suffix = if coordinates.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", lon, lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    cli: &Cli,
    extent: Extent,
) -> Result<looproute::Graph, GraphLoadError> {
    let profile: &Profile = match cli.profile {
        ProfileArg::Foot => &looproute::osm::FOOT_PROFILE,
        ProfileArg::Any => &looproute::osm::ANY_WAY_PROFILE,
    };

    let options = Options {
        profile,
        file_format: match cli.format {
            FormatArg::Auto => FileFormat::Unknown,
            FormatArg::Xml => FileFormat::Xml,
            FormatArg::XmlGz => FileFormat::XmlGz,
            FormatArg::XmlBz2 => FileFormat::XmlBz2,
        },
        extent: Some(extent),
    };

    looproute::osm::load_from_file(&options, path.as_ref())
        .map_err(|e| GraphLoadError(PathBuf::from(path.as_ref()), e))
}
