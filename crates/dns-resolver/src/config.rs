use std::time::Duration;

/// Every tunable knob the resolver uses, gathered in one place so
/// that budgets and timeouts are fields threaded in at construction
/// rather than constants scattered through the solving code.
///
/// There is no on-disk configuration file for this library: a
/// resolver is just a value embedded in a larger program, so
/// `ResolverConfig` is a plain struct with a sensible `Default`
/// rather than something loaded from YAML.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// How long to wait for a single query attempt before giving up
    /// on it and retrying (or failing).
    pub query_timeout: Duration,

    /// Capacity of the send and receive queues behind a connection's
    /// single UDP socket.
    pub queue_capacity: usize,

    /// How long the connection's serve loop sleeps for when it had
    /// nothing to do on the last pass.
    pub idle_sleep: Duration,

    /// How often the serve loop sweeps outstanding requests for
    /// expired deadlines.
    pub deadline_sweep_interval: Duration,

    /// Maximum depth of nested sub-problems a solver will expand.
    pub max_depth: usize,

    /// Maximum number of queries a single top-level solve may send
    /// before giving up.
    pub max_queries: usize,

    /// Number of attempts made per logical query before moving on to
    /// the next nameserver.
    pub retries_per_query: usize,

    /// Default time-to-live applied to a zone cache entry that has no
    /// more specific expiry of its own.
    pub zone_cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            query_timeout: Duration::from_secs(5),
            queue_capacity: 100,
            idle_sleep: Duration::from_millis(1),
            deadline_sweep_interval: Duration::from_millis(500),
            max_depth: 5,
            max_queries: 50,
            retries_per_query: 3,
            zone_cache_ttl: Duration::from_secs(60 * 60),
        }
    }
}
