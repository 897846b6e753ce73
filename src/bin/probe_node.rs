//! Print the INFO fields of one node, as the scanner parses them
//!
//! The second argument is an INFO section name (`server`, `keyspace`,
//! `cluster`, ...) or `cluster-info` for the CLUSTER INFO command.

use std::env;
use std::time::Duration;

use redis_fleet_status::client::ConnectionFactory;
use redis_fleet_status::probe::{DeploymentQuery, NodeQuery, RespQueries};
use redis_fleet_status::scan::{Credentials, Deployment, Endpoint};

/// Selects CLUSTER INFO; every other word is passed to INFO
const CLUSTER_INFO: &str = "cluster-info";

#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Section(&'a str),
    ClusterInfo,
}

fn target(word: &str) -> Target<'_> {
    if word == CLUSTER_INFO {
        Target::ClusterInfo
    } else {
        Target::Section(word)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <host:port> [section|{}] [password]", args[0], CLUSTER_INFO);
        std::process::exit(1);
    }

    let endpoint: Endpoint = args[1].parse()?;
    let section = args.get(2).map(|s| s.as_str()).unwrap_or("server");
    let credentials = args.get(3).map(|p| Credentials {
        password: p.clone(),
        username: None,
    });

    let factory = ConnectionFactory::new(Duration::from_secs(2), Duration::from_secs(2));
    let queries = RespQueries::new(factory);

    let info = match target(section) {
        Target::ClusterInfo => {
            let mut deployment = Deployment::new("probe", vec![endpoint.clone()]);
            deployment.credentials = credentials;
            queries.cluster_status(&deployment)?
        }
        Target::Section(name) => queries.query(&endpoint, credentials.as_ref(), name)?,
    };

    println!("{} {} ({} fields):", endpoint, section, info.len());
    for (key, value) in info.iter() {
        println!("  {}: {}", key, value);
    }

    Ok(())
}
