//! The thing that actually walks a `Problem` to completion.
//!
//! A `Solver` is the sole gateway between a `Problem` and the outside
//! world: it owns the connection, the zone cache, and the
//! resolution-narrative log, and enforces the budgets (maximum
//! nesting depth, maximum number of queries) that keep a solve from
//! running away. It is used exactly once: `solve` takes `self` by
//! value, so the type system rules out the "solved this agent twice"
//! mistake the original guarded against with a runtime panic.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use dns_types::protocol::types::{DomainName, QueryClass, QueryType, Question};

use crate::cache::{SharedZoneCache, ZoneServers};
use crate::config::ResolverConfig;
use crate::connection::{Connection, Response};
use crate::problem::Problem;
use crate::pson::{duration_str, Printer};

/// What came back from a single logical query, after however many
/// retries `ResolverConfig::retries_per_query` allows.
pub enum QueryOutcome {
    Answered(Response),
    /// The query budget (`ResolverConfig::max_queries`) is exhausted;
    /// the whole solve should give up rather than try anything else.
    Busy,
    /// Every retry timed out or errored.
    NoResponse,
}

pub struct Solver {
    connection: Connection,
    cache: SharedZoneCache,
    config: ResolverConfig,
    printer: Printer,
    checkpoint: Instant,
    depth: usize,
    count: usize,
}

impl Solver {
    pub fn new(connection: Connection, cache: SharedZoneCache, config: ResolverConfig) -> Self {
        Solver {
            connection,
            cache,
            config,
            printer: Printer::new(),
            checkpoint: Instant::now(),
            depth: 0,
            count: 0,
        }
    }

    /// Solve `problem` to completion, returning it with its result
    /// fields filled in alongside the resolution-narrative log.
    pub async fn solve(mut self, problem: Problem) -> (Problem, String) {
        self.checkpoint = Instant::now();
        let result = self.solve_sub(problem).await;
        (result, self.printer.fetch())
    }

    /// Expand a sub-problem, subject to the depth budget. Problems
    /// nest through this method alone: `Recur` spawns `Address`
    /// sub-problems, `Record` spawns further `Recur`s, and each such
    /// spawn comes back through here.
    pub async fn solve_sub(&mut self, problem: Problem) -> Problem {
        let (title, meta) = problem.title();

        if self.depth >= self.config.max_depth {
            let meta_refs: Vec<&str> = meta.iter().map(String::as_str).collect();
            self.printer.print(&title, &meta_refs);
            self.printer.print("err", &["too deep"]);
            return problem;
        }

        self.depth += 1;
        let meta_refs: Vec<&str> = meta.iter().map(String::as_str).collect();
        self.printer.print_indent(&title, &meta_refs);
        let result = problem.expand(self).await;
        self.printer.end_indent();
        self.depth -= 1;

        result
    }

    /// Ask `host` about `(name, qtype)`, retrying up to
    /// `ResolverConfig::retries_per_query` times, subject to the
    /// overall query budget.
    pub async fn query(&mut self, host: Ipv4Addr, name: &DomainName, qtype: QueryType) -> QueryOutcome {
        if self.count >= self.config.max_queries {
            self.printer.print("err", &["too many queries"]);
            return QueryOutcome::Busy;
        }
        self.count += 1;

        let question = Question {
            name: name.clone(),
            qtype,
            qclass: QueryClass::IN,
        };

        for _ in 0..self.config.retries_per_query {
            let elapsed = self.lapse();
            self.printer.print(
                "q",
                &[
                    &name.to_dotted_string(),
                    &qtype.to_string(),
                    &host.to_string(),
                    &duration_str(elapsed),
                ],
            );

            match self.connection.query(host, question.clone()).await {
                Ok(response) => {
                    let elapsed = self.lapse();
                    self.printer.print("a", &[&duration_str(elapsed)]);
                    return QueryOutcome::Answered(response);
                }
                Err(err) => {
                    let elapsed = self.lapse();
                    self.printer
                        .print("err", &[&err.to_string(), &duration_str(elapsed)]);
                }
            }
        }

        QueryOutcome::NoResponse
    }

    /// Emit one line to the resolution narrative, for a problem to
    /// note something about its own progress that isn't a query or a
    /// sub-problem expansion (those are logged by `query` and
    /// `solve_sub` themselves).
    pub fn log(&mut self, head: &str, args: &[&str]) {
        self.printer.print(head, args);
    }

    pub fn cache_zone(&self, servers: ZoneServers) {
        self.cache.add(servers);
    }

    pub fn query_cache(&self, zone: &DomainName) -> Option<ZoneServers> {
        self.cache.best_for(zone)
    }

    /// Time since the last call to `lapse` (or since the solve
    /// started, for the first call), used only for the log's `+Ns`
    /// markers. The checkpoint moves forward on every call, so
    /// consecutive log lines show the gap between them rather than
    /// the time since the solve began.
    fn lapse(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.checkpoint);
        self.checkpoint = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use dns_types::protocol::types::test_util::domain;
    use dns_types::protocol::types::{QueryType, RecordType};

    use crate::problem::recur::Recur;

    use super::*;

    async fn solver_with(config: ResolverConfig) -> Solver {
        let connection = Connection::new(&config).await.unwrap();
        let cache = SharedZoneCache::new(config.zone_cache_ttl);
        Solver::new(connection, cache, config)
    }

    #[tokio::test]
    async fn query_reports_busy_once_the_query_budget_is_exhausted() {
        let config = ResolverConfig {
            max_queries: 0,
            ..ResolverConfig::default()
        };
        let mut solver = solver_with(config).await;

        let outcome = solver
            .query(
                Ipv4Addr::new(192, 0, 2, 1),
                &domain("example.com."),
                QueryType::Record(RecordType::A),
            )
            .await;

        assert!(matches!(outcome, QueryOutcome::Busy));
    }

    #[tokio::test]
    async fn solve_sub_gives_up_once_the_depth_budget_is_exhausted() {
        let config = ResolverConfig {
            max_depth: 0,
            ..ResolverConfig::default()
        };
        let mut solver = solver_with(config).await;

        let problem = Problem::Recur(Recur::new(
            domain("example.com."),
            QueryType::Record(RecordType::A),
        ));
        let result = solver.solve_sub(problem).await;

        let Problem::Recur(recur) = result else {
            panic!("solve_sub returned the wrong variant");
        };
        // depth budget hit before expand() ever ran, so the problem
        // comes back exactly as it went in.
        assert!(recur.answer.is_none());
    }

    #[tokio::test]
    async fn query_cache_round_trips_through_cache_zone() {
        let config = ResolverConfig::default();
        let solver = solver_with(config).await;

        assert!(solver.query_cache(&domain("example.com.")).is_none());

        let mut zone = ZoneServers::new(domain("example.com."));
        zone.servers.push(crate::cache::NameServer {
            name: domain("ns1.example.com."),
            ips: vec![Ipv4Addr::new(192, 0, 2, 1)],
        });
        solver.cache_zone(zone.clone());

        let found = solver.query_cache(&domain("www.example.com.")).unwrap();
        assert_eq!(found.zone, domain("example.com."));
    }
}
