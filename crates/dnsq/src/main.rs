use clap::Parser;
use std::process;

use dns_resolver::problem::recur::AnsCode;
use dns_resolver::{Resolver, ResolverConfig};
use dns_types::protocol::types::{DomainName, QueryType, Rdata, RecordType, ResourceRecord};

fn format_rdata(rdata: &Rdata) -> String {
    match rdata {
        Rdata::A(address) => address.to_string(),
        Rdata::Name(name) => name.to_dotted_string(),
        Rdata::Bytes(octets) => format!("{octets:?}"),
    }
}

fn print_section(heading: &str, rrs: &[ResourceRecord]) {
    if rrs.is_empty() {
        return;
    }

    println!("\n;; {heading}");
    for rr in rrs {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            rr.name,
            rr.ttl,
            rr.rclass,
            rr.rtype,
            format_rdata(&rr.rdata)
        );
    }
}

// the doc comments for this struct turn into the CLI help text
#[derive(Parser)]
/// Iterative DNS lookup utility.
///
/// Walks the delegation chain itself, starting from the nameservers
/// it already has cached or the root servers, rather than asking an
/// upstream recursive resolver to do it for us. Only speaks to
/// upstream nameservers over IPv4.
struct Args {
    /// Domain name to resolve
    #[clap(value_parser)]
    domain: DomainName,

    /// Query type to resolve
    #[clap(default_value_t = QueryType::Record(RecordType::A), value_parser)]
    qtype: QueryType,

    /// Print the narrative log of every zone and server tried
    #[clap(short, long, action(clap::ArgAction::SetTrue))]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!(";; QUESTION");
    println!("{}\tIN\t{}", args.domain, args.qtype);

    let resolver = match Resolver::new(ResolverConfig::default()).await {
        Ok(resolver) => resolver,
        Err(err) => {
            eprintln!("could not open a socket: {err}");
            process::exit(1);
        }
    };

    let (recur, log) = resolver.recur(args.domain, args.qtype).await;
    resolver.close().await;

    if args.verbose {
        println!("\n;; TRACE");
        print!("{log}");
    }

    match recur.ans_code {
        AnsCode::Okay => match &recur.answer {
            Some(message) => {
                print_section("ANSWER", &message.answers);
                print_section("AUTHORITY", &message.authority);
                print_section("ADDITIONAL", &message.additional);
            }
            None => {
                println!("\n;; ANSWER");
                println!("; no answer message recorded");
            }
        },
        AnsCode::NonExist => {
            println!("\n;; ANSWER");
            println!("; name does not exist");
        }
        AnsCode::NoResponse => {
            println!("\n;; ANSWER");
            println!("; no nameserver responded");
            process::exit(1);
        }
        AnsCode::Busy => {
            println!("\n;; ANSWER");
            println!("; query budget exhausted before an answer was found");
            process::exit(1);
        }
    }
}
