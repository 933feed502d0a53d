//! Gathering several record types for the same name.
//!
//! Every lookup bootstraps with an ordinary A lookup for the name,
//! which is the walk that actually finds the authoritative zone. Every
//! other requested type reuses that zone directly rather than walking
//! down from the root again - and every response seen along the way,
//! not just the one each walk finally settles on, is scanned for
//! records matching a requested type.

use async_recursion::async_recursion;

use dns_types::protocol::types::{DomainName, QueryType, RecordClass, RecordType, ResourceRecord};

use crate::solver::Solver;

use super::recur::{AnsCode, QueryRecord, Recur};
use super::Problem;

#[derive(Debug, Clone)]
pub struct Record {
    pub name: DomainName,
    pub types: Vec<QueryType>,
    pub records: Vec<ResourceRecord>,
}

impl Record {
    pub fn new(name: DomainName, types: Vec<QueryType>) -> Self {
        Record {
            name,
            types,
            records: Vec::new(),
        }
    }

    pub fn title(&self) -> (String, Vec<String>) {
        ("record".to_string(), vec![self.name.to_dotted_string()])
    }

    #[async_recursion]
    pub async fn expand(mut self, solver: &mut Solver) -> Record {
        if self.types.is_empty() {
            return self;
        }

        let bootstrap = Recur::new(self.name.clone(), QueryType::Record(RecordType::A));
        let solved = solver.solve_sub(Problem::Recur(bootstrap)).await;
        let Problem::Recur(bootstrap) = solved else {
            unreachable!("solve_sub returns the same variant it was given");
        };

        self.harvest(&bootstrap.history);

        let settled = matches!(bootstrap.ans_code, AnsCode::Okay | AnsCode::NonExist);
        if !settled {
            return self;
        }
        let Some(auth_zone) = bootstrap.ans_zone else {
            return self;
        };

        let remaining: Vec<QueryType> = self
            .types
            .iter()
            .copied()
            .filter(|qt| *qt != QueryType::Record(RecordType::A))
            .collect();

        for qtype in remaining {
            let mut recur = Recur::new(self.name.clone(), qtype);
            recur.start_from(auth_zone.clone());
            let solved = solver.solve_sub(Problem::Recur(recur)).await;
            let Problem::Recur(recur) = solved else {
                unreachable!("solve_sub returns the same variant it was given");
            };
            self.harvest(&recur.history);
        }

        self
    }

    /// Pull every record matching a requested type, for this name, out
    /// of every response a walk actually received - including ones
    /// from servers whose answer didn't end up settling the walk,
    /// since a message that carries a referral in its authority
    /// section can still carry real data in its answer section.
    fn harvest(&mut self, history: &[QueryRecord]) {
        for entry in history {
            let Some(message) = &entry.response else { continue };
            for rr in message.all_in_records() {
                if rr.rclass == RecordClass::IN
                    && rr.name == self.name
                    && self.types.iter().any(|qt| rr.rtype.matches(qt))
                    && !self.records.contains(rr)
                {
                    self.records.push(rr.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use dns_types::protocol::types::test_util::*;
    use dns_types::protocol::types::{Header, Message, Opcode, Rcode};

    use super::*;

    #[test]
    fn harvest_collects_matching_records_and_skips_duplicates() {
        let mut record = Record::new(
            domain("example.com."),
            vec![QueryType::Record(RecordType::A), QueryType::Record(RecordType::TXT)],
        );

        let message = Message {
            header: Header {
                id: 1,
                is_response: true,
                opcode: Opcode::Standard,
                is_authoritative: true,
                is_truncated: false,
                recursion_desired: false,
                recursion_available: false,
                rcode: Rcode::NoError,
            },
            questions: Vec::new(),
            answers: vec![
                a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1)),
                txt_record("example.com.", b"hello"),
                a_record("other.example.com.", Ipv4Addr::new(2, 2, 2, 2)),
            ],
            authority: Vec::new(),
            additional: Vec::new(),
        };

        let history = vec![
            QueryRecord {
                host: Ipv4Addr::new(192, 0, 2, 1),
                name: domain("example.com."),
                qtype: QueryType::Record(RecordType::A),
                zone: domain("example.com."),
                response: Some(message.clone()),
            },
            QueryRecord {
                host: Ipv4Addr::new(192, 0, 2, 1),
                name: domain("example.com."),
                qtype: QueryType::Record(RecordType::TXT),
                zone: domain("example.com."),
                response: Some(message),
            },
        ];

        record.harvest(&history);

        assert_eq!(record.records.len(), 2);
        assert!(record.records.iter().any(|rr| rr.rtype == RecordType::A));
        assert!(record.records.iter().any(|rr| rr.rtype == RecordType::TXT));
    }

    #[tokio::test]
    async fn expand_with_no_requested_types_is_a_no_op() {
        let config = crate::config::ResolverConfig::default();
        let connection = crate::connection::Connection::new(&config).await.unwrap();
        let cache = crate::cache::SharedZoneCache::new(config.zone_cache_ttl);
        let mut solver = Solver::new(connection, cache, config);

        let record = Record::new(domain("example.com."), Vec::new());
        let result = record.expand(&mut solver).await;

        assert!(result.records.is_empty());
    }
}
