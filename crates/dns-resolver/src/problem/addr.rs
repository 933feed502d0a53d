//! Turning a bare nameserver name into an address, by recursing on it
//! like any other name.

use std::net::Ipv4Addr;

use async_recursion::async_recursion;

use dns_types::protocol::types::{DomainName, QueryType, RecordType};

use crate::solver::Solver;

use super::recur::{AnsCode, Recur};
use super::Problem;

#[derive(Debug, Clone)]
pub struct Addr {
    pub name: DomainName,
    pub ips: Vec<Ipv4Addr>,
}

impl Addr {
    pub fn new(name: DomainName) -> Self {
        Addr {
            name,
            ips: Vec::new(),
        }
    }

    pub fn title(&self) -> (String, Vec<String>) {
        ("addr".to_string(), vec![self.name.to_dotted_string()])
    }

    #[async_recursion]
    pub async fn expand(mut self, solver: &mut Solver) -> Addr {
        let recur = Recur::new(self.name.clone(), QueryType::Record(RecordType::A));
        let solved = solver.solve_sub(Problem::Recur(recur)).await;
        let Problem::Recur(recur) = solved else {
            unreachable!("solve_sub returns the same variant it was given");
        };

        if !matches!(recur.ans_code, AnsCode::Okay) {
            return self;
        }
        let Some(message) = &recur.answer else {
            return self;
        };

        let direct: Vec<Ipv4Addr> = message
            .all_in_records()
            .filter(|rr| rr.name == self.name && rr.rtype == RecordType::A)
            .filter_map(|rr| rr.rdata_address())
            .collect();

        if !direct.is_empty() {
            self.ips = direct;
            return self;
        }

        // No direct A record: the name we asked about is itself a
        // CNAME. Follow the chain of targets as far as this one
        // message takes us, and pick up any A record glued to a name
        // along the way.
        let mut chased = vec![self.name.clone()];
        loop {
            let mut grew = false;
            for rr in message.all_in_records() {
                if rr.rtype != RecordType::CNAME || !chased.contains(&rr.name) {
                    continue;
                }
                if let Some(target) = rr.rdata_name() {
                    if !chased.contains(target) {
                        chased.push(target.clone());
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }

        self.ips = message
            .all_in_records()
            .filter(|rr| rr.rtype == RecordType::A && chased.contains(&rr.name))
            .filter_map(|rr| rr.rdata_address())
            .collect();

        self
    }
}
