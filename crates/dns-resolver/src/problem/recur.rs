//! Walking a chain of zones from a starting point down to an answer.
//!
//! `Recur` holds the one piece of state that actually changes shape
//! as a solve progresses: which zone it's currently asking, and what
//! the last zone it tried was. Everything else it produces (the raw
//! answer message, the code describing what that answer means, and
//! the zone that produced it) is filled in once the walk stops.

use std::net::Ipv4Addr;

use async_recursion::async_recursion;

use dns_types::protocol::types::{DomainName, Message, QueryType, Rcode, RecordClass, RecordType};

use crate::cache::{NameServer, ZoneServers};
use crate::registrar::{is_registrar, registrar_parts};
use crate::root::root_servers;
use crate::solver::{QueryOutcome, Solver};

use super::addr::Addr;
use super::Problem;

/// What an answer message actually told us, once the rest of it
/// (ttl, additional glue, and so on) is set aside.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AnsCode {
    /// A real answer (possibly just a CNAME, for the caller to
    /// chase) came back for the name and type asked.
    Okay,
    /// The name does not exist (`NXDOMAIN`), or no record of the
    /// asked type exists there.
    NonExist,
    /// Every server in the zone chain either errored or never
    /// replied.
    NoResponse,
    /// The query budget ran out partway through the walk.
    Busy,
}

/// One query actually sent during a `Recur`'s walk, kept regardless of
/// whether it led anywhere: `Record` harvests matching records out of
/// every response here, not just the one the walk finally settled on.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub host: Ipv4Addr,
    pub name: DomainName,
    pub qtype: QueryType,
    pub zone: DomainName,
    pub response: Option<Message>,
}

#[derive(Debug, Clone)]
pub struct Recur {
    pub name: DomainName,
    pub qtype: QueryType,

    /// Where to start the walk. `None` means "ask the zone cache,
    /// falling back to the root servers" (the ordinary case); `Some`
    /// is used by `Record` to skip straight to a zone it already
    /// knows is authoritative.
    start: Option<ZoneServers>,

    current: Option<ZoneServers>,

    pub answer: Option<Message>,
    pub ans_code: AnsCode,
    /// The zone whose servers produced `answer` (or gave up), so
    /// callers with more lookups to do against the same name can
    /// skip straight back to it.
    pub ans_zone: Option<ZoneServers>,
    /// Every query this walk actually issued, in order.
    pub history: Vec<QueryRecord>,
}

impl Recur {
    pub fn new(name: DomainName, qtype: QueryType) -> Self {
        Recur {
            name,
            qtype,
            start: None,
            current: None,
            answer: None,
            ans_code: AnsCode::NoResponse,
            ans_zone: None,
            history: Vec::new(),
        }
    }

    /// Skip the zone cache and the root servers, and start the walk
    /// from `zone` directly.
    pub fn start_from(&mut self, zone: ZoneServers) {
        self.start = Some(zone);
    }

    pub fn title(&self) -> (String, Vec<String>) {
        (
            "recur".to_string(),
            vec![self.name.to_dotted_string(), self.qtype.to_string()],
        )
    }

    #[async_recursion]
    pub async fn expand(mut self, solver: &mut Solver) -> Recur {
        let initial = match self.start.clone() {
            Some(zone) => zone,
            None => {
                let (registered, _registrar) = registrar_parts(&self.name);
                solver.query_cache(&registered).unwrap_or_else(root_servers)
            }
        };
        self.current = Some(initial);

        while let Some(zone) = self.current.take() {
            match self.query_zone(solver, &zone).await {
                ZoneOutcome::Answer(message, code) => {
                    self.answer = Some(message);
                    self.ans_code = code;
                    self.ans_zone = Some(zone);
                }
                ZoneOutcome::Redirect(next) => {
                    self.current = Some(next);
                }
                ZoneOutcome::GiveUp(code) => {
                    self.ans_code = code;
                    self.ans_zone = Some(zone);
                }
            }
        }

        self
    }

    /// Try every server in `zone`, in shuffled order, until one
    /// gives a usable answer or a referral. Servers that error or
    /// time out are skipped in favour of the next one; a server that
    /// answers authoritatively with neither data nor a referral ends
    /// the whole walk rather than prompting another server to be
    /// tried, since an authoritative "nothing here" is final.
    async fn query_zone(&mut self, solver: &mut Solver, zone: &ZoneServers) -> ZoneOutcome {
        for server in zone.shuffled() {
            let ip = match self.server_address(solver, &server).await {
                Some(ip) => ip,
                None => continue,
            };

            solver.log(
                &format!(
                    "// {} : {}({})",
                    zone.zone.to_dotted_string(),
                    server.name.to_dotted_string(),
                    ip
                ),
                &[],
            );

            let outcome = solver.query(ip, &self.name, self.qtype).await;

            match outcome {
                QueryOutcome::Busy => return ZoneOutcome::GiveUp(AnsCode::Busy),
                QueryOutcome::NoResponse => {
                    solver.log("// unreachable", &[&server.name.to_dotted_string()]);
                    self.history.push(QueryRecord {
                        host: ip,
                        name: self.name.clone(),
                        qtype: self.qtype,
                        zone: zone.zone.clone(),
                        response: None,
                    });
                    continue;
                }
                QueryOutcome::Answered(response) => {
                    self.history.push(QueryRecord {
                        host: ip,
                        name: self.name.clone(),
                        qtype: self.qtype,
                        zone: zone.zone.clone(),
                        response: Some(response.message.clone()),
                    });

                    if !response.message.header.rcode.is_okay_or_nameerror() {
                        solver.log("// server error", &[&server.name.to_dotted_string()]);
                        continue;
                    }

                    match self.find_answer(&response.message, zone) {
                        FindResult::Answer(code) => {
                            solver.log("// answer found", &[]);
                            return ZoneOutcome::Answer(response.message, code);
                        }
                        FindResult::Redirect(next) => {
                            if is_registrar(&next.zone) {
                                solver.log("// caching for zone:", &[&next.zone.to_dotted_string()]);
                                solver.cache_zone(next.clone());
                            }
                            return ZoneOutcome::Redirect(next);
                        }
                        FindResult::NoUsableData => {
                            solver.log("// domain does not exist", &[]);
                            return ZoneOutcome::GiveUp(AnsCode::NonExist);
                        }
                    }
                }
            }
        }

        ZoneOutcome::GiveUp(AnsCode::NoResponse)
    }

    /// A server's known address if it has one, otherwise spawn an
    /// `Address` sub-problem to find one.
    async fn server_address(&self, solver: &mut Solver, server: &NameServer) -> Option<Ipv4Addr> {
        if let Some(ip) = server.ips.first() {
            return Some(*ip);
        }

        let solved = solver.solve_sub(Problem::Address(Addr::new(server.name.clone()))).await;
        let Problem::Address(addr) = solved else {
            unreachable!("solve_sub returns the same variant it was given");
        };
        addr.ips.first().copied()
    }

    /// Look for either a direct answer or an NS referral to a
    /// subzone, in that order. Returns `NoUsableData` if the message
    /// contains neither: the caller should try another server.
    fn find_answer(&self, message: &Message, current_zone: &ZoneServers) -> FindResult {
        let direct_match = message
            .all_in_records()
            .any(|rr| rr.name == self.name && rr.rtype.matches(&self.qtype));

        let cname_match = matches!(self.qtype, QueryType::Record(RecordType::A))
            && message
                .all_in_records()
                .any(|rr| rr.name == self.name && rr.rtype == RecordType::CNAME);

        if direct_match || cname_match {
            return FindResult::Answer(AnsCode::Okay);
        }

        if message.header.rcode == Rcode::NameError {
            return FindResult::Answer(AnsCode::NonExist);
        }

        self.find_referral(message, current_zone)
    }

    fn find_referral(&self, message: &Message, current_zone: &ZoneServers) -> FindResult {
        let mut subzone: Option<DomainName> = None;

        for rr in &message.authority {
            if rr.rclass != RecordClass::IN || rr.rtype != RecordType::NS {
                continue;
            }
            if !rr.name.is_subdomain_of(&current_zone.zone) {
                continue;
            }
            if rr.name != self.name && !self.name.is_subdomain_of(&rr.name) {
                continue;
            }
            match &subzone {
                None => subzone = Some(rr.name.clone()),
                Some(existing) if *existing != rr.name => {
                    tracing::debug!(
                        first = %existing.to_dotted_string(),
                        other = %rr.name.to_dotted_string(),
                        "multiple subzones referred in one message, using the first"
                    );
                }
                _ => {}
            }
        }

        let Some(subzone_name) = subzone else {
            return FindResult::NoUsableData;
        };

        let mut redirect = ZoneServers::new(subzone_name.clone());
        for rr in &message.authority {
            if rr.rclass != RecordClass::IN || rr.rtype != RecordType::NS || rr.name != subzone_name {
                continue;
            }
            let Some(ns_name) = rr.rdata_name().cloned() else {
                continue;
            };
            let mut ips = Vec::new();
            for a in message.answers.iter().chain(&message.authority).chain(&message.additional) {
                if a.rclass != RecordClass::IN || a.rtype != RecordType::A || a.name != ns_name {
                    continue;
                }
                if let Some(ip) = a.rdata_address() {
                    if !ips.contains(&ip) {
                        ips.push(ip);
                    }
                }
            }
            redirect.servers.push(NameServer { name: ns_name, ips });
        }

        if redirect.servers.is_empty() {
            FindResult::NoUsableData
        } else {
            FindResult::Redirect(redirect)
        }
    }
}

enum ZoneOutcome {
    Answer(Message, AnsCode),
    Redirect(ZoneServers),
    GiveUp(AnsCode),
}

enum FindResult {
    Answer(AnsCode),
    Redirect(ZoneServers),
    NoUsableData,
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use dns_types::protocol::types::test_util::*;
    use dns_types::protocol::types::{Header, Message, Opcode};

    use super::*;

    fn response(authority: Vec<dns_types::protocol::types::ResourceRecord>) -> Message {
        Message {
            header: Header {
                id: 1,
                is_response: true,
                opcode: Opcode::Standard,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: false,
                recursion_available: false,
                rcode: Rcode::NoError,
            },
            questions: Vec::new(),
            answers: Vec::new(),
            authority,
            additional: Vec::new(),
        }
    }

    #[test]
    fn find_answer_direct_match() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("example.com."));
        let mut message = response(Vec::new());
        message
            .answers
            .push(a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)));

        assert!(matches!(
            recur.find_answer(&message, &zone),
            FindResult::Answer(AnsCode::Okay)
        ));
    }

    #[test]
    fn find_answer_follows_cname_for_a_queries() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("example.com."));
        let mut message = response(Vec::new());
        message
            .answers
            .push(cname_record("www.example.com.", "target.example.com."));

        assert!(matches!(
            recur.find_answer(&message, &zone),
            FindResult::Answer(AnsCode::Okay)
        ));
    }

    #[test]
    fn find_answer_is_okay_even_when_rcode_is_nameerror_if_a_cname_matches() {
        // a CNAME to a name that itself doesn't exist still comes back
        // as NXDOMAIN, but the CNAME is real and worth chasing.
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("example.com."));
        let mut message = response(Vec::new());
        message
            .answers
            .push(cname_record("www.example.com.", "nonexistent.example.com."));
        message.header.rcode = Rcode::NameError;

        assert!(matches!(
            recur.find_answer(&message, &zone),
            FindResult::Answer(AnsCode::Okay)
        ));
    }

    #[test]
    fn find_answer_nxdomain_with_no_matching_data() {
        let recur = Recur::new(domain("nope.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("example.com."));
        let mut message = response(Vec::new());
        message.header.rcode = Rcode::NameError;

        assert!(matches!(
            recur.find_answer(&message, &zone),
            FindResult::Answer(AnsCode::NonExist)
        ));
    }

    #[test]
    fn find_answer_falls_through_to_referral() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("com."));
        let mut message = response(vec![ns_record("example.com.", "ns1.example.com.")]);
        message.additional.push(a_record(
            "ns1.example.com.",
            Ipv4Addr::new(192, 0, 2, 1),
        ));

        match recur.find_answer(&message, &zone) {
            FindResult::Redirect(next) => {
                assert_eq!(next.zone, domain("example.com."));
                assert_eq!(next.servers.len(), 1);
                assert_eq!(next.servers[0].ips, vec![Ipv4Addr::new(192, 0, 2, 1)]);
            }
            _ => panic!("expected a referral"),
        }
    }

    #[test]
    fn find_referral_ignores_ns_outside_current_zone() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("org."));
        let message = response(vec![ns_record("example.com.", "ns1.example.com.")]);

        assert!(matches!(
            recur.find_referral(&message, &zone),
            FindResult::NoUsableData
        ));
    }

    #[test]
    fn find_referral_drops_glueless_nameservers_with_no_usable_data() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("com."));
        let message = response(vec![ns_record("example.com.", "ns1.example.com.")]);

        match recur.find_referral(&message, &zone) {
            FindResult::Redirect(next) => {
                assert_eq!(next.servers[0].ips, Vec::<Ipv4Addr>::new());
            }
            FindResult::NoUsableData => panic!("expected a glueless referral, not NoUsableData"),
            FindResult::Answer(_) => panic!("expected a glueless referral, not an answer"),
        }
    }

    #[test]
    fn find_referral_collects_glue_from_any_section_and_dedups_it() {
        let recur = Recur::new(domain("www.example.com."), QueryType::Record(RecordType::A));
        let zone = ZoneServers::new(domain("com."));
        let mut message = response(vec![ns_record("example.com.", "ns1.example.com.")]);
        // the same glue address shows up twice, once in the answer
        // section and once in additional - should be counted once.
        message
            .answers
            .push(a_record("ns1.example.com.", Ipv4Addr::new(192, 0, 2, 1)));
        message
            .additional
            .push(a_record("ns1.example.com.", Ipv4Addr::new(192, 0, 2, 1)));
        message
            .additional
            .push(a_record("ns1.example.com.", Ipv4Addr::new(192, 0, 2, 2)));

        match recur.find_referral(&message, &zone) {
            FindResult::Redirect(next) => {
                assert_eq!(
                    next.servers[0].ips,
                    vec![Ipv4Addr::new(192, 0, 2, 1), Ipv4Addr::new(192, 0, 2, 2)]
                );
            }
            _ => panic!("expected a glued referral"),
        }
    }
}
