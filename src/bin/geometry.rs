//! Cache geometry parameters for each L1 size of the sweep
use clap::{Parser, ValueEnum};
use cli_table::{Cell, Table, print_stdout};
use gem5_sweep::{CacheGeometry, DEFAULT_SIZES, Replacement, parse_size_list};

#[derive(Copy, Clone, ValueEnum)]
enum Policy {
    /// Least recently used
    Lru,
    /// First in first out
    Fifo,
    /// Random
    Random,
}

impl From<Policy> for Replacement {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Lru => Replacement::Lru,
            Policy::Fifo => Replacement::Fifo,
            Policy::Random => Replacement::Random,
        }
    }
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Whitespace separated cache sizes
    #[arg(short, long, env = "SIZES", default_value = DEFAULT_SIZES)]
    sizes: String,

    /// Block size in bytes
    #[arg(short, long, default_value_t = 32)]
    block_size: u64,

    /// Set associativity
    #[arg(short, long, default_value_t = 2)]
    assoc: u64,

    /// Address width in bits
    #[arg(long, default_value_t = 32)]
    address_bits: u32,

    /// Replacement policy for the sim-cache configuration
    #[arg(short, long, default_value = "lru")]
    replacement: Policy,

    /// Print the geometries as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let replacement: Replacement = args.replacement.into();

    let mut geometries = vec![];
    for label in parse_size_list(&args.sizes)? {
        let geometry = CacheGeometry::from_label(&label, args.block_size, args.assoc)?;
        log::debug!("{} -> {:?}", label, geometry);
        geometries.push((label, geometry));
    }

    if args.json {
        let items: Vec<serde_json::Value> = geometries
            .iter()
            .map(|(label, geometry)| {
                serde_json::json!({
                    "label": label,
                    "geometry": geometry,
                    "sets": geometry.sets(),
                    "il1": geometry.sim_cache_spec("il1", replacement),
                    "dl1": geometry.sim_cache_spec("dl1", replacement),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let mut table = vec![];
    for (label, geometry) in &geometries {
        table.push(vec![
            label.cell(),
            geometry.human_size().cell(),
            geometry.sets().cell(),
            geometry.offset_bits().cell(),
            geometry.index_bits().cell(),
            geometry.tag_bits(args.address_bits).cell(),
            geometry.sim_cache_spec("il1", replacement).cell(),
            geometry.sim_cache_spec("dl1", replacement).cell(),
        ]);
    }
    let table = table.table().title(vec![
        "L1".cell(),
        "Size".cell(),
        "Sets".cell(),
        "Offset bits".cell(),
        "Index bits".cell(),
        "Tag bits".cell(),
        "-cache:il1".cell(),
        "-cache:dl1".cell(),
    ]);
    print_stdout(table)?;

    Ok(())
}
