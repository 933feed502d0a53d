//! The three kinds of problem a `Solver` knows how to work on.
//!
//! `Recur` walks a zone chain from a starting point down to an
//! answer; `Address` turns a bare nameserver name into an IP address
//! (itself by recursing, hence the name); `Record` gathers several
//! record types for the same name, reusing the first lookup's
//! authoritative zone to go straight there for the rest. They call
//! into each other through `Solver::solve_sub`, which is the only
//! thing that nests them.

pub mod addr;
pub mod record;
pub mod recur;

use crate::solver::Solver;

/// Something a `Solver` can expand into a result. Each variant owns
/// both its inputs and, once expanded, its outputs: there is no
/// separate request/response pair to keep in sync.
#[derive(Debug, Clone)]
pub enum Problem {
    Recur(recur::Recur),
    Address(addr::Addr),
    Record(record::Record),
}

impl Problem {
    /// A short name and a list of metadata tokens, used as the
    /// narrative log's block header for this problem.
    pub fn title(&self) -> (String, Vec<String>) {
        match self {
            Problem::Recur(p) => p.title(),
            Problem::Address(p) => p.title(),
            Problem::Record(p) => p.title(),
        }
    }

    pub async fn expand(self, solver: &mut Solver) -> Problem {
        match self {
            Problem::Recur(p) => Problem::Recur(p.expand(solver).await),
            Problem::Address(p) => Problem::Address(p.expand(solver).await),
            Problem::Record(p) => Problem::Record(p.expand(solver).await),
        }
    }
}
