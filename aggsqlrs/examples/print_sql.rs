use std::{env, path::PathBuf};

use aggsql::{AggregateBuilder, AggsqlConfig, DatabaseType, RequestRegistry};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <requests_dir> <request_name> <database>");
    eprintln!("Databases: sqlserver, mysql, postgres, oracle, sqlite");
    eprintln!("Example: cargo run --example print_sql -- demos/requests events_by_year postgres");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 3 {
        usage();
        std::process::exit(1);
    }

    let requests_dir = PathBuf::from(args.remove(0));
    let name = args.remove(0);
    let database: DatabaseType = args.remove(0).parse()?;

    let registry = RequestRegistry::load_from_dir(&requests_dir)?;
    let request = registry.get(&name).with_context(|| {
        format!(
            "no request named '{name}' (available: {})",
            registry.names().join(", ")
        )
    })?;

    let builder = AggregateBuilder::from_config(&AggsqlConfig::load_default());
    let sql = builder.build(database, request)?;
    println!("{sql}");
    Ok(())
}
