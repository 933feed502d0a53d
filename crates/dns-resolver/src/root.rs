//! The hardcoded root nameservers every solve starts from if the zone
//! cache has nothing better to offer.

use std::net::Ipv4Addr;

use dns_types::protocol::types::DomainName;

use crate::cache::{NameServer, ZoneServers};

/// Each entry is `(hostname, address)`.
const ROOT_SERVERS: &[(&str, Ipv4Addr)] = &[
    ("b.root-servers.net.", Ipv4Addr::new(192, 228, 79, 201)),
    ("c.root-servers.net.", Ipv4Addr::new(192, 33, 4, 12)),
    ("d.root-servers.net.", Ipv4Addr::new(199, 7, 91, 13)),
    ("e.root-servers.net.", Ipv4Addr::new(192, 203, 230, 10)),
    ("f.root-servers.net.", Ipv4Addr::new(192, 5, 5, 241)),
    ("g.root-servers.net.", Ipv4Addr::new(192, 112, 36, 4)),
    ("h.root-servers.net.", Ipv4Addr::new(198, 97, 190, 53)),
    ("i.root-servers.net.", Ipv4Addr::new(192, 36, 148, 17)),
    ("j.root-servers.net.", Ipv4Addr::new(192, 58, 128, 30)),
    ("k.root-servers.net.", Ipv4Addr::new(193, 0, 14, 129)),
    ("l.root-servers.net.", Ipv4Addr::new(199, 7, 83, 42)),
    ("m.root-servers.net.", Ipv4Addr::new(202, 12, 27, 33)),
];

/// The root zone's `ZoneServers`, built fresh each time: these never
/// change at runtime, so there is nothing to cache them against.
pub fn root_servers() -> ZoneServers {
    let mut zs = ZoneServers::new(DomainName::root());
    for (name, ip) in ROOT_SERVERS {
        zs.servers.push(NameServer {
            name: DomainName::from_dotted_string(name).expect("root server name is well-formed"),
            ips: vec![*ip],
        });
    }
    zs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_root_servers() {
        assert_eq!(12, root_servers().servers.len());
    }

    #[test]
    fn all_have_an_address() {
        for server in root_servers().servers {
            assert_eq!(1, server.ips.len());
        }
    }
}
