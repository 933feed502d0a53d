//! Caching of which nameservers are responsible for a zone.
//!
//! Every `Recur` solve that walks down from the root learns, along
//! the way, which servers are authoritative for each zone it passes
//! through. Caching that means later queries for names under the
//! same zone can start from the known nameservers instead of
//! re-walking from the root.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dns_types::protocol::types::DomainName;

const MUTEX_POISON_MESSAGE: &str =
    "[INTERNAL ERROR] zone cache mutex poisoned, cannot recover from this - aborting";

/// A single nameserver: its own name, and whatever A-record glue
/// addresses are known for it. A server with no known addresses is
/// still worth keeping around: the resolver can look its address up
/// separately via an `Address` sub-problem.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NameServer {
    pub name: DomainName,
    pub ips: Vec<Ipv4Addr>,
}

impl NameServer {
    pub fn has_known_ip(&self) -> bool {
        !self.ips.is_empty()
    }
}

/// The nameservers responsible for a zone, as learned from a
/// delegation or a referral.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ZoneServers {
    pub zone: DomainName,
    pub servers: Vec<NameServer>,
}

impl ZoneServers {
    pub fn new(zone: DomainName) -> Self {
        ZoneServers {
            zone,
            servers: Vec::new(),
        }
    }

    /// Merge another server's glue into this zone's list: if a server
    /// of the same name is already known, its addresses are unioned
    /// in (deduplicated by address); otherwise the server is appended
    /// whole. Returns whether anything was actually added.
    fn merge_server(&mut self, incoming: NameServer) -> bool {
        if let Some(existing) = self
            .servers
            .iter_mut()
            .find(|existing| existing.name == incoming.name)
        {
            let mut added = false;
            for ip in incoming.ips {
                if !existing.ips.contains(&ip) {
                    existing.ips.push(ip);
                    added = true;
                }
            }
            added
        } else {
            self.servers.push(incoming);
            true
        }
    }

    /// Merges `other` in, returning whether any server or address was
    /// actually new.
    fn merge(&mut self, other: ZoneServers) -> bool {
        let mut added = false;
        for server in other.servers {
            added |= self.merge_server(server);
        }
        added
    }

    /// Splits the servers into those with a known address (shuffled),
    /// followed by those without (also shuffled). `Recur::query_zone`
    /// tries servers in this order: known addresses first, so it
    /// doesn't have to spawn an `Address` sub-problem unless it has
    /// to.
    pub fn shuffled(&self) -> Vec<NameServer> {
        use rand::seq::SliceRandom;

        let (mut with_ip, mut without_ip): (Vec<NameServer>, Vec<NameServer>) =
            self.servers.iter().cloned().partition(NameServer::has_known_ip);

        let mut rng = rand::thread_rng();
        with_ip.shuffle(&mut rng);
        without_ip.shuffle(&mut rng);

        with_ip.extend(without_ip);
        with_ip
    }
}

struct CacheEntry {
    servers: ZoneServers,
    expires_at: Instant,
}

/// A convenience wrapper around a `ZoneCache` which lets it be shared
/// between threads.
///
/// Cloning a `SharedZoneCache` gives a new handle to the same
/// underlying cache.
#[derive(Clone)]
pub struct SharedZoneCache {
    inner: Arc<Mutex<ZoneCache>>,
}

impl SharedZoneCache {
    pub fn new(default_ttl: Duration) -> Self {
        SharedZoneCache {
            inner: Arc::new(Mutex::new(ZoneCache::new(default_ttl))),
        }
    }

    /// Atomically merge `servers` into whatever is already cached for
    /// its zone, refreshing the expiry. Concurrent readers never see
    /// a partially-merged entry: the merge happens entirely inside
    /// the lock.
    pub fn add(&self, servers: ZoneServers) {
        self.inner.lock().expect(MUTEX_POISON_MESSAGE).add(servers);
    }

    /// The best known entry for `name`: the cached entry for the
    /// longest unexpired zone that `name` is under or equal to, if
    /// any. Expired entries are treated as absent (lazy expiration;
    /// nothing proactively sweeps them).
    pub fn best_for(&self, name: &DomainName) -> Option<ZoneServers> {
        self.inner.lock().expect(MUTEX_POISON_MESSAGE).best_for(name)
    }
}

struct ZoneCache {
    entries: HashMap<Vec<Vec<u8>>, CacheEntry>,
    default_ttl: Duration,
}

impl ZoneCache {
    fn new(default_ttl: Duration) -> Self {
        ZoneCache {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    fn add(&mut self, servers: ZoneServers) {
        let key = servers.zone.labels.clone();
        let expires_at = Instant::now() + self.default_ttl;

        match self.entries.get_mut(&key) {
            Some(entry) => {
                if entry.servers.merge(servers) {
                    entry.expires_at = expires_at;
                }
            }
            None => {
                self.entries.insert(
                    key,
                    CacheEntry {
                        servers,
                        expires_at,
                    },
                );
            }
        }
    }

    fn best_for(&self, name: &DomainName) -> Option<ZoneServers> {
        let now = Instant::now();
        let mut best: Option<&CacheEntry> = None;

        for entry in self.entries.values() {
            if entry.expires_at <= now {
                continue;
            }
            if entry.servers.zone != *name && !name.is_subdomain_of(&entry.servers.zone) {
                continue;
            }
            let is_better = match best {
                None => true,
                Some(current) => entry.servers.zone.labels.len() > current.servers.zone.labels.len(),
            };
            if is_better {
                best = Some(entry);
            }
        }

        best.map(|entry| entry.servers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dns_types::protocol::types::test_util::domain;

    fn ns(name: &str, ips: &[&str]) -> NameServer {
        NameServer {
            name: domain(name),
            ips: ips.iter().map(|s| s.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn add_then_query_exact_zone() {
        let cache = SharedZoneCache::new(Duration::from_secs(3600));
        let mut zs = ZoneServers::new(domain("example.com."));
        zs.servers.push(ns("ns1.example.com.", &["1.2.3.4"]));
        cache.add(zs);

        let found = cache.best_for(&domain("example.com.")).unwrap();
        assert_eq!(1, found.servers.len());
    }

    #[test]
    fn query_for_subdomain_finds_parent_zone() {
        let cache = SharedZoneCache::new(Duration::from_secs(3600));
        let mut zs = ZoneServers::new(domain("example.com."));
        zs.servers.push(ns("ns1.example.com.", &["1.2.3.4"]));
        cache.add(zs);

        let found = cache.best_for(&domain("www.example.com.")).unwrap();
        assert_eq!(domain("example.com."), found.zone);
    }

    #[test]
    fn best_for_prefers_more_specific_zone() {
        let cache = SharedZoneCache::new(Duration::from_secs(3600));
        cache.add(ZoneServers::new(domain("com.")));
        cache.add(ZoneServers::new(domain("example.com.")));

        let found = cache.best_for(&domain("www.example.com.")).unwrap();
        assert_eq!(domain("example.com."), found.zone);
    }

    #[test]
    fn merge_is_idempotent_and_dedups_by_address() {
        let cache = SharedZoneCache::new(Duration::from_secs(3600));
        let mut zs = ZoneServers::new(domain("example.com."));
        zs.servers.push(ns("ns1.example.com.", &["1.2.3.4"]));
        cache.add(zs.clone());
        cache.add(zs);
        cache.add(zs_with_same_server_more_ips());

        let found = cache.best_for(&domain("example.com.")).unwrap();
        assert_eq!(1, found.servers.len());
        assert_eq!(2, found.servers[0].ips.len());
    }

    fn zs_with_same_server_more_ips() -> ZoneServers {
        let mut zs = ZoneServers::new(domain("example.com."));
        zs.servers.push(ns("ns1.example.com.", &["1.2.3.4", "5.6.7.8"]));
        zs
    }

    #[test]
    fn re_adding_unchanged_servers_does_not_refresh_expiry() {
        let cache = SharedZoneCache::new(Duration::from_millis(20));
        let mut zs = ZoneServers::new(domain("example.com."));
        zs.servers.push(ns("ns1.example.com.", &["1.2.3.4"]));
        cache.add(zs.clone());

        std::thread::sleep(Duration::from_millis(30));
        cache.add(zs);

        assert!(cache.best_for(&domain("example.com.")).is_none());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = SharedZoneCache::new(Duration::from_millis(0));
        cache.add(ZoneServers::new(domain("example.com.")));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.best_for(&domain("example.com.")).is_none());
    }
}
