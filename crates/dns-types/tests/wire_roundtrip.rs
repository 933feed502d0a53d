use rand::Rng;
use std::net::Ipv4Addr;

use dns_types::protocol::deserialise::ConsumableBuffer;
use dns_types::protocol::serialise::WritableBuffer;
use dns_types::protocol::types::*;

#[test]
fn roundtrip_message() {
    for _ in 0..100 {
        let original = arbitrary_message();
        let serialised = original.clone().into_octets().unwrap();
        let deserialised = Message::from_octets(&serialised);

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_wire_header() {
    for _ in 0..100 {
        let original = arbitrary_wire_header();

        let mut buffer = WritableBuffer::default();
        original.header.serialise(&mut buffer);
        buffer.write_u16(original.qdcount);
        buffer.write_u16(original.ancount);
        buffer.write_u16(original.nscount);
        buffer.write_u16(original.arcount);

        let deserialised = WireHeader::deserialise(&mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_question() {
    for _ in 0..100 {
        let original = arbitrary_question();

        let mut buffer = WritableBuffer::default();
        original.clone().serialise(&mut buffer);
        let deserialised = Question::deserialise(0, &mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_resourcerecord() {
    for _ in 0..100 {
        let original = arbitrary_resourcerecord();

        let mut buffer = WritableBuffer::default();
        original.clone().serialise(&mut buffer).unwrap();
        let deserialised =
            ResourceRecord::deserialise(0, &mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_domainname() {
    for _ in 0..100 {
        let original = arbitrary_domainname();

        let mut buffer = WritableBuffer::default();
        original.clone().serialise(&mut buffer);
        let deserialised = DomainName::deserialise(0, &mut ConsumableBuffer::new(&buffer.octets));

        assert_eq!(Ok(original), deserialised);
    }
}

fn arbitrary_message() -> Message {
    let header = arbitrary_header();
    let num_questions = rand::thread_rng().gen_range(0..3);
    let num_answers = rand::thread_rng().gen_range(0..5);
    let num_authority = rand::thread_rng().gen_range(0..5);
    let num_additional = rand::thread_rng().gen_range(0..5);

    Message {
        header,
        questions: (0..num_questions).map(|_| arbitrary_question()).collect(),
        answers: (0..num_answers).map(|_| arbitrary_resourcerecord()).collect(),
        authority: (0..num_authority)
            .map(|_| arbitrary_resourcerecord())
            .collect(),
        additional: (0..num_additional)
            .map(|_| arbitrary_resourcerecord())
            .collect(),
    }
}

fn arbitrary_header() -> Header {
    let mut rng = rand::thread_rng();
    Header {
        id: rng.gen(),
        is_response: rng.gen(),
        opcode: arbitrary_opcode(),
        is_authoritative: rng.gen(),
        is_truncated: rng.gen(),
        recursion_desired: rng.gen(),
        recursion_available: rng.gen(),
        rcode: arbitrary_rcode(),
    }
}

fn arbitrary_wire_header() -> WireHeader {
    let mut rng = rand::thread_rng();
    WireHeader {
        header: arbitrary_header(),
        qdcount: rng.gen(),
        ancount: rng.gen(),
        nscount: rng.gen(),
        arcount: rng.gen(),
    }
}

fn arbitrary_question() -> Question {
    Question {
        name: arbitrary_domainname(),
        qtype: arbitrary_querytype(),
        qclass: arbitrary_queryclass(),
    }
}

fn arbitrary_resourcerecord() -> ResourceRecord {
    let rtype = arbitrary_recordtype();
    ResourceRecord {
        name: arbitrary_domainname(),
        rdata: arbitrary_rdata(rtype),
        rtype,
        rclass: arbitrary_recordclass(),
        ttl: rand::thread_rng().gen(),
    }
}

fn arbitrary_rdata(rtype: RecordType) -> Rdata {
    match rtype {
        RecordType::A => Rdata::A(Ipv4Addr::from(rand::thread_rng().gen::<u32>())),
        RecordType::NS | RecordType::CNAME => Rdata::Name(arbitrary_domainname()),
        _ => Rdata::Bytes(arbitrary_octets(rand::thread_rng().gen_range(0..64))),
    }
}

fn arbitrary_domainname() -> DomainName {
    let mut rng = rand::thread_rng();
    let num_labels = rng.gen_range(1..5);
    let mut dotted = String::new();

    for _ in 0..num_labels {
        let label_len = rng.gen_range(1..20);
        for i in 0..label_len {
            let c = if i == 0 || i == label_len - 1 || rng.gen_bool(0.8) {
                *b"abcdefghijklmnopqrstuvwxyz0123456789"
                    .get(rng.gen_range(0..36))
                    .unwrap() as char
            } else {
                '-'
            };
            dotted.push(c);
        }
        dotted.push('.');
    }

    DomainName::from_dotted_string(&dotted).unwrap()
}

fn arbitrary_opcode() -> Opcode {
    // opcode is a 4-bit field
    (rand::thread_rng().gen::<u8>() & 0b0000_1111).into()
}

fn arbitrary_rcode() -> Rcode {
    // rcode is a 4-bit field
    (rand::thread_rng().gen::<u8>() & 0b0000_1111).into()
}

fn arbitrary_querytype() -> QueryType {
    rand::thread_rng().gen::<u16>().into()
}

fn arbitrary_queryclass() -> QueryClass {
    rand::thread_rng().gen::<u16>().into()
}

fn arbitrary_recordtype() -> RecordType {
    rand::thread_rng().gen::<u16>().into()
}

fn arbitrary_recordclass() -> RecordClass {
    rand::thread_rng().gen::<u16>().into()
}

fn arbitrary_octets(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut rng = rand::thread_rng();
    for _ in 0..len {
        out.push(rng.gen());
    }
    out
}
