#![warn(clippy::pedantic)]
// Sometimes a redundant else is clearer
#![allow(clippy::redundant_else)]
// Don't care enough to fix
#![allow(clippy::match_same_arms)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::wildcard_imports)]

pub mod cache;
pub mod config;
pub mod connection;
pub mod problem;
pub mod pson;
pub mod registrar;
pub mod root;
pub mod solver;

use std::io;

use dns_types::protocol::types::{DomainName, QueryType};

pub use config::ResolverConfig;

use cache::SharedZoneCache;
use connection::Connection;
use problem::addr::Addr;
use problem::record::Record;
use problem::recur::Recur;
use problem::Problem;
use solver::Solver;

/// An iterative resolver: a single shared UDP connection and zone
/// cache, reused across every solve. Cloning a `Resolver` is cheap
/// and gives a handle to the same underlying connection and cache.
#[derive(Clone)]
pub struct Resolver {
    connection: Connection,
    cache: SharedZoneCache,
    config: ResolverConfig,
}

impl Resolver {
    /// Binds a UDP socket and starts its background tasks.
    pub async fn new(config: ResolverConfig) -> io::Result<Self> {
        let connection = Connection::new(&config).await?;
        let cache = SharedZoneCache::new(config.zone_cache_ttl);
        Ok(Resolver {
            connection,
            cache,
            config,
        })
    }

    /// Stop the background tasks. Outstanding solves in progress will
    /// start failing their queries once this returns.
    pub async fn close(&self) {
        self.connection.close().await;
    }

    fn solver(&self) -> Solver {
        Solver::new(self.connection.clone(), self.cache.clone(), self.config)
    }

    /// Resolve a single `(name, qtype)` from the root (or the zone
    /// cache, if it already knows a closer starting point), returning
    /// the finished problem alongside a narrative log of how it was
    /// solved.
    pub async fn recur(&self, name: DomainName, qtype: QueryType) -> (Recur, String) {
        let (problem, log) = self.solver().solve(Problem::Recur(Recur::new(name, qtype))).await;
        let Problem::Recur(recur) = problem else {
            unreachable!("solve returns the same variant it was given");
        };
        (recur, log)
    }

    /// Resolve a nameserver name down to its addresses.
    pub async fn address(&self, name: DomainName) -> (Addr, String) {
        let (problem, log) = self.solver().solve(Problem::Address(Addr::new(name))).await;
        let Problem::Address(addr) = problem else {
            unreachable!("solve returns the same variant it was given");
        };
        (addr, log)
    }

    /// Resolve several record types for the same name. An A lookup
    /// bootstraps the walk down to the authoritative zone; every
    /// requested type is then harvested from whatever responses that
    /// walk (and one more per remaining type, started directly from
    /// the same zone) actually received.
    pub async fn record(&self, name: DomainName, types: Vec<QueryType>) -> (Record, String) {
        let (problem, log) = self.solver().solve(Problem::Record(Record::new(name, types))).await;
        let Problem::Record(record) = problem else {
            unreachable!("solve returns the same variant it was given");
        };
        (record, log)
    }
}
