use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Basic DNS message format, used for both queries and responses.
///
/// ```text
///     +---------------------+
///     |        Header       |
///     +---------------------+
///     |       Question      | the question for the name server
///     +---------------------+
///     |        Answer       | RRs answering the question
///     +---------------------+
///     |      Authority      | RRs pointing toward an authority
///     +---------------------+
///     |      Additional     | RRs holding additional information
///     +---------------------+
/// ```
///
/// See section 4.1 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// A fresh outbound query message: standard opcode, recursion not
    /// requested (this resolver does its own iteration), a single
    /// question, no other sections.
    pub fn from_question(id: u16, question: Question) -> Self {
        Self {
            header: Header {
                id,
                is_response: false,
                opcode: Opcode::Standard,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: false,
                recursion_available: false,
                rcode: Rcode::NoError,
            },
            questions: vec![question],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// All class-IN resource records across answer, authority, and
    /// additional sections, in that order.
    pub fn all_in_records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
            .filter(|rr| rr.rclass == RecordClass::IN)
    }
}

/// Common header type for all messages.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      ID                       |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    QDCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ANCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    NSCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ARCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.1 of RFC 1035.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any
    /// kind of query. This identifier is copied into the
    /// corresponding reply and can be used by the requester to match
    /// up replies to outstanding queries.
    pub id: u16,

    /// A one bit field that specifies whether this message is a query
    /// (0), or a response (1).
    pub is_response: bool,

    /// A four bit field that specifies kind of query in this message.
    pub opcode: Opcode,

    /// Authoritative Answer.
    pub is_authoritative: bool,

    /// TrunCation.
    pub is_truncated: bool,

    /// Recursion Desired.
    pub recursion_desired: bool,

    /// Recursion Available.
    pub recursion_available: bool,

    /// Response code.
    pub rcode: Rcode,
}

/// A `Header` as it appears on the network, with the section counts
/// that `Header` itself omits (those are derived fields, kept off the
/// normal type so nothing can construct a `Header` with counts that
/// disagree with its sections).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct WireHeader {
    pub header: Header,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

pub(crate) const HEADER_MASK_QR: u8 = 0b1000_0000;
pub(crate) const HEADER_MASK_OPCODE: u8 = 0b0111_1000;
pub(crate) const HEADER_OFFSET_OPCODE: u8 = 3;
pub(crate) const HEADER_MASK_AA: u8 = 0b0000_0100;
pub(crate) const HEADER_MASK_TC: u8 = 0b0000_0010;
pub(crate) const HEADER_MASK_RD: u8 = 0b0000_0001;
pub(crate) const HEADER_MASK_RA: u8 = 0b1000_0000;
pub(crate) const HEADER_MASK_RCODE: u8 = 0b0000_1111;
pub(crate) const HEADER_OFFSET_RCODE: u8 = 0;

/// The question section has a list of questions (usually 1) being
/// asked. This is the structure for a single question.
///
/// See section 4.1.2 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct Question {
    pub name: DomainName,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

/// The answer, authority, and additional sections are all the same
/// format: a variable number of resource records. This is the
/// structure for a single resource record.
///
/// See section 4.1.3 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(any(feature = "test-util", test), derive(arbitrary::Arbitrary))]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub rdata: Rdata,
}

impl ResourceRecord {
    pub fn matches(&self, question: &Question) -> bool {
        self.rtype.matches(&question.qtype) && self.rclass.matches(&question.qclass)
    }

    /// The name carried in this record's RDATA, for record types
    /// whose data is itself a domain name (NS, CNAME). `None` for any
    /// other type.
    pub fn rdata_name(&self) -> Option<&DomainName> {
        match &self.rdata {
            Rdata::Name(name) => Some(name),
            _ => None,
        }
    }

    /// The address carried by an A record's RDATA. `None` for any
    /// other type.
    pub fn rdata_address(&self) -> Option<Ipv4Addr> {
        match &self.rdata {
            Rdata::A(address) => Some(*address),
            _ => None,
        }
    }
}

/// A closed variant of resource record data. This resolver never
/// inspects the semantic content of any record type besides A, NS,
/// and CNAME, so everything else is carried as opaque bytes.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Rdata {
    /// The 4-octet address carried by an A record.
    A(Ipv4Addr),

    /// A domain name, used for both NS (`nsdname`) and CNAME
    /// (`cname`) records, which are the only two name-valued record
    /// types this resolver's recursion logic cares about.
    Name(DomainName),

    /// Anything else, stored as the raw bytes of the RDATA field.
    /// This covers TXT as well as every record type this resolver
    /// does not interpret.
    Bytes(Vec<u8>),
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Rdata {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        match u.int_in_range(0..=2)? {
            0 => Ok(Rdata::A(u.arbitrary()?)),
            1 => Ok(Rdata::Name(u.arbitrary()?)),
            _ => {
                let len = u.int_in_range(0..=128)?;
                Ok(Rdata::Bytes(Vec::from(u.bytes(len)?)))
            }
        }
    }
}

/// What sort of query this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Opcode {
    Standard,
    Inverse,
    Status,
    Reserved(OpcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Opcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct OpcodeReserved(u8);

impl From<u8> for Opcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Opcode::Standard,
            1 => Opcode::Inverse,
            2 => Opcode::Status,
            other => Opcode::Reserved(OpcodeReserved(other)),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Standard => 0,
            Opcode::Inverse => 1,
            Opcode::Status => 2,
            Opcode::Reserved(OpcodeReserved(octet)) => octet,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Opcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u8>()?))
    }
}

/// What sort of response this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(RcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Rcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RcodeReserved(u8);

impl Rcode {
    pub fn is_okay_or_nameerror(&self) -> bool {
        matches!(self, Rcode::NoError | Rcode::NameError)
    }
}

impl From<u8> for Rcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            other => Rcode::Reserved(RcodeReserved(other)),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::Reserved(RcodeReserved(octet)) => octet,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Rcode {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u8>()?))
    }
}

/// A single DNS label: between 1 and 63 octets matching
/// `[a-z0-9_](-?[a-z0-9_])*`, already case-folded to lower, or the
/// empty label (only valid as the terminal label of a name).
pub type Label = Vec<u8>;

/// A domain name: a sequence of labels, where each label is a length
/// octet followed by that many octets, terminated by the
/// zero-length root label. Names are kept case-folded to lower and
/// validated against the label grammar at construction and at
/// deserialisation time, so every `DomainName` in memory is already
/// known-good.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct DomainName {
    pub octets: Vec<u8>,
    pub labels: Vec<Label>,
}

/// Maximum encoded length of a domain name, including every length
/// octet and the terminating zero.
pub const DOMAINNAME_MAX_LEN: usize = 255;

/// Maximum length of a single label, not including its length octet.
pub const LABEL_MAX_LEN: usize = 63;

impl DomainName {
    pub fn root() -> Self {
        DomainName {
            octets: vec![0],
            labels: vec![Vec::new()],
        }
    }

    pub fn is_root(&self) -> bool {
        self.labels.len() == 1
    }

    /// Strict: a name is never a subdomain of itself.
    pub fn is_subdomain_of(&self, other: &DomainName) -> bool {
        self.labels != other.labels && self.labels.ends_with(&other.labels)
    }

    /// Strict: a name is never an ancestor of itself.
    pub fn is_ancestor_of(&self, other: &DomainName) -> bool {
        other.is_subdomain_of(self)
    }

    /// Drops the leftmost (most specific) label. The root's parent is
    /// `None`.
    pub fn parent(&self) -> Option<DomainName> {
        if self.is_root() {
            return None;
        }
        DomainName::from_labels(self.labels[1..].to_vec())
    }

    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(self.octets.len());
        for label in &self.labels {
            for octet in label {
                out.push(*octet as char);
            }
            out.push('.');
        }
        out
    }

    pub fn from_dotted_string(s: &str) -> Option<Self> {
        if s == "." {
            return Some(Self::root());
        }

        let trimmed = s.strip_suffix('.').unwrap_or(s);
        let chunks = trimmed.split('.').collect::<Vec<_>>();
        let mut labels = Vec::with_capacity(chunks.len() + 1);
        for label in chunks {
            if label.is_empty() {
                return None;
            }
            labels.push(label.as_bytes().to_vec());
        }
        labels.push(Vec::new());

        Self::from_labels(labels)
    }

    /// Validates and case-folds a sequence of labels (the final one
    /// must be empty, marking the root terminator) and builds the
    /// wire-format octets.
    ///
    /// Invariants enforced: each non-root label is 1-63 octets and
    /// matches `[a-z0-9_](-?[a-z0-9_])*`; the whole name is at most
    /// 255 octets once serialised; a name whose first label is
    /// entirely digits is rejected (it is probably an IP address
    /// typed where a name was expected).
    pub fn from_labels(mixed_case_labels: Vec<Vec<u8>>) -> Option<Self> {
        let (last, rest) = mixed_case_labels.split_last()?;
        if !last.is_empty() {
            return None;
        }

        let mut labels = Vec::with_capacity(mixed_case_labels.len());
        let mut octets = Vec::with_capacity(DOMAINNAME_MAX_LEN);

        for (i, raw) in rest.iter().enumerate() {
            let label = validate_label(raw)?;
            if i == 0 && label.iter().all(u8::is_ascii_digit) {
                return None;
            }
            let len: u8 = label.len().try_into().ok()?;
            octets.push(len);
            octets.extend_from_slice(&label);
            labels.push(label);
        }
        octets.push(0);
        labels.push(Vec::new());

        if octets.len() <= DOMAINNAME_MAX_LEN {
            Some(DomainName { octets, labels })
        } else {
            None
        }
    }
}

/// `[a-z0-9_](-?[a-z0-9_])*`, case-folded; rejects a leading or
/// trailing dash and anything longer than 63 octets.
pub(crate) fn validate_label(raw: &[u8]) -> Option<Label> {
    if raw.is_empty() || raw.len() > LABEL_MAX_LEN {
        return None;
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut prev_dash = false;
    for (i, &b) in raw.iter().enumerate() {
        let lower = b.to_ascii_lowercase();
        let is_word = lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == b'_';
        let is_dash = lower == b'-';

        if is_dash {
            if i == 0 {
                return None;
            }
            prev_dash = true;
            out.push(lower);
            continue;
        }
        if !is_word {
            return None;
        }
        prev_dash = false;
        out.push(lower);
    }
    if prev_dash {
        return None;
    }

    Some(out)
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainName")
            .field("to_dotted_string()", &self.to_dotted_string())
            .finish()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dotted_string())
    }
}

impl FromStr for DomainName {
    type Err = DomainNameFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DomainName::from_dotted_string(s).ok_or(DomainNameFromStr::NoParse)
    }
}

/// Errors that can arise when converting a `&str` into a `DomainName`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DomainNameFromStr {
    NoParse,
}

impl fmt::Display for DomainNameFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not parse string to domain name")
    }
}

impl std::error::Error for DomainNameFromStr {}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for DomainName {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_labels = u.int_in_range::<usize>(0..=10)?;
        let mut labels = Vec::new();
        for i in 0..num_labels {
            let label_len = u.int_in_range::<u8>(1..=20)?;
            let mut label = Vec::new();
            for j in 0..label_len {
                let c = u.int_in_range::<u8>(0..=35)?;
                let byte = match c {
                    0..=25 => b'a' + c,
                    _ => b'0' + (c - 26),
                };
                let byte = if i == 0 && j == 0 && byte.is_ascii_digit() {
                    b'a'
                } else {
                    byte
                };
                label.push(byte);
            }
            labels.push(label);
        }
        labels.push(Vec::new());
        Ok(DomainName::from_labels(labels).unwrap_or_else(DomainName::root))
    }
}

/// Query types are a superset of record types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum QueryType {
    Record(RecordType),
    Wildcard,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryType::Record(rtype) => rtype.fmt(f),
            QueryType::Wildcard => write!(f, "ANY"),
        }
    }
}

impl FromStr for QueryType {
    type Err = RecordTypeFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANY" => Ok(QueryType::Wildcard),
            _ => RecordType::from_str(s).map(QueryType::Record),
        }
    }
}

impl From<u16> for QueryType {
    fn from(value: u16) -> Self {
        match value {
            255 => QueryType::Wildcard,
            _ => QueryType::Record(RecordType::from(value)),
        }
    }
}

impl From<QueryType> for u16 {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::Wildcard => 255,
            QueryType::Record(rtype) => rtype.into(),
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for QueryType {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

/// Query classes are a superset of record classes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum QueryClass {
    Record(RecordClass),
    Wildcard,
}

impl QueryClass {
    pub const IN: QueryClass = QueryClass::Record(RecordClass::IN);
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryClass::Record(rclass) => rclass.fmt(f),
            QueryClass::Wildcard => write!(f, "ANY"),
        }
    }
}

impl From<u16> for QueryClass {
    fn from(value: u16) -> Self {
        match value {
            255 => QueryClass::Wildcard,
            _ => QueryClass::Record(RecordClass::from(value)),
        }
    }
}

impl From<QueryClass> for u16 {
    fn from(value: QueryClass) -> Self {
        match value {
            QueryClass::Wildcard => 255,
            QueryClass::Record(rclass) => rclass.into(),
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for QueryClass {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

/// Record types are used by resource records and by queries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordType {
    A,
    NS,
    MD,
    MF,
    CNAME,
    SOA,
    MB,
    MG,
    MR,
    NULL,
    WKS,
    PTR,
    HINFO,
    MINFO,
    MX,
    TXT,
    AAAA,
    Unknown(RecordTypeUnknown),
}

/// A struct with a private constructor, to ensure invalid
/// `RecordType`s cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordTypeUnknown(u16);

impl RecordType {
    pub fn matches(&self, qtype: &QueryType) -> bool {
        match qtype {
            QueryType::Wildcard => true,
            QueryType::Record(rtype) => rtype == self,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::NS => write!(f, "NS"),
            RecordType::MD => write!(f, "MD"),
            RecordType::MF => write!(f, "MF"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::SOA => write!(f, "SOA"),
            RecordType::MB => write!(f, "MB"),
            RecordType::MG => write!(f, "MG"),
            RecordType::MR => write!(f, "MR"),
            RecordType::NULL => write!(f, "NULL"),
            RecordType::WKS => write!(f, "WKS"),
            RecordType::PTR => write!(f, "PTR"),
            RecordType::HINFO => write!(f, "HINFO"),
            RecordType::MINFO => write!(f, "MINFO"),
            RecordType::MX => write!(f, "MX"),
            RecordType::TXT => write!(f, "TXT"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::Unknown(RecordTypeUnknown(n)) => write!(f, "TYPE{n}"),
        }
    }
}

impl FromStr for RecordType {
    type Err = RecordTypeFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "MD" => Ok(RecordType::MD),
            "MF" => Ok(RecordType::MF),
            "CNAME" => Ok(RecordType::CNAME),
            "SOA" => Ok(RecordType::SOA),
            "MB" => Ok(RecordType::MB),
            "MG" => Ok(RecordType::MG),
            "MR" => Ok(RecordType::MR),
            "NULL" => Ok(RecordType::NULL),
            "WKS" => Ok(RecordType::WKS),
            "PTR" => Ok(RecordType::PTR),
            "HINFO" => Ok(RecordType::HINFO),
            "MINFO" => Ok(RecordType::MINFO),
            "MX" => Ok(RecordType::MX),
            "TXT" => Ok(RecordType::TXT),
            "AAAA" => Ok(RecordType::AAAA),
            _ => match s.strip_prefix("TYPE") {
                Some(type_str) => u16::from_str(type_str)
                    .map(RecordType::from)
                    .map_err(|_| RecordTypeFromStr::BadType),
                None => Err(RecordTypeFromStr::NoParse),
            },
        }
    }
}

/// Errors that can arise when converting a `&str` into a `RecordType`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordTypeFromStr {
    BadType,
    NoParse,
}

impl fmt::Display for RecordTypeFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordTypeFromStr::BadType => write!(f, "TYPE<num> number must be a u16"),
            RecordTypeFromStr::NoParse => write!(f, "could not parse string to type"),
        }
    }
}

impl std::error::Error for RecordTypeFromStr {}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            3 => RecordType::MD,
            4 => RecordType::MF,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            7 => RecordType::MB,
            8 => RecordType::MG,
            9 => RecordType::MR,
            10 => RecordType::NULL,
            11 => RecordType::WKS,
            12 => RecordType::PTR,
            13 => RecordType::HINFO,
            14 => RecordType::MINFO,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            other => RecordType::Unknown(RecordTypeUnknown(other)),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::MD => 3,
            RecordType::MF => 4,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::MB => 7,
            RecordType::MG => 8,
            RecordType::MR => 9,
            RecordType::NULL => 10,
            RecordType::WKS => 11,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MINFO => 14,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::Unknown(RecordTypeUnknown(value)) => value,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordType {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

/// Record classes are used by resource records and by queries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordClass {
    IN,
    CS,
    CH,
    HS,
    Unknown(RecordClassUnknown),
}

/// A struct with a private constructor, to ensure invalid
/// `RecordClass`es cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordClassUnknown(u16);

impl RecordClass {
    pub fn matches(&self, qclass: &QueryClass) -> bool {
        match qclass {
            QueryClass::Wildcard => true,
            QueryClass::Record(rclass) => rclass == self,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordClass::IN => write!(f, "IN"),
            RecordClass::CS => write!(f, "CS"),
            RecordClass::CH => write!(f, "CH"),
            RecordClass::HS => write!(f, "HS"),
            RecordClass::Unknown(RecordClassUnknown(n)) => write!(f, "CLASS{n}"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = RecordClassFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(RecordClass::IN),
            "CS" => Ok(RecordClass::CS),
            "CH" => Ok(RecordClass::CH),
            "HS" => Ok(RecordClass::HS),
            _ => match s.strip_prefix("CLASS") {
                Some(class_str) => u16::from_str(class_str)
                    .map(RecordClass::from)
                    .map_err(|_| RecordClassFromStr::BadClass),
                None => Err(RecordClassFromStr::NoParse),
            },
        }
    }
}

/// Errors that can arise when converting a `&str` into a `RecordClass`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordClassFromStr {
    BadClass,
    NoParse,
}

impl fmt::Display for RecordClassFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordClassFromStr::BadClass => write!(f, "CLASS<num> number must be a u16"),
            RecordClassFromStr::NoParse => write!(f, "could not parse string to class"),
        }
    }
}

impl std::error::Error for RecordClassFromStr {}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            2 => RecordClass::CS,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            other => RecordClass::Unknown(RecordClassUnknown(other)),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::CS => 2,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::Unknown(RecordClassUnknown(value)) => value,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for RecordClass {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from(u.arbitrary::<u16>()?))
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn u8_opcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Opcode::from(i)), i);
        }
    }

    #[test]
    fn u8_rcode_roundtrip() {
        for i in 0..15 {
            assert_eq!(u8::from(Rcode::from(i)), i);
        }
    }

    #[test]
    fn u16_recordtype_roundtrip() {
        for i in 0..100 {
            assert_eq!(u16::from(RecordType::from(i)), i);
        }
    }

    #[test]
    fn u16_recordclass_roundtrip() {
        for i in 0..10 {
            assert_eq!(u16::from(RecordClass::from(i)), i);
        }
    }

    #[test]
    fn domainname_root_conversions() {
        assert_eq!(Some(DomainName::root()), DomainName::from_dotted_string("."));
        assert_eq!(Some(DomainName::root()), DomainName::from_labels(vec![Vec::new()]));
        assert_eq!(".", DomainName::root().to_dotted_string());
    }

    #[test]
    fn domainname_conversions() {
        assert_eq!(
            Some("www.example.com.".to_string()),
            DomainName::from_dotted_string("www.example.com.").map(|d| d.to_dotted_string())
        );
        assert_eq!(
            Some("www.example.com.".to_string()),
            DomainName::from_dotted_string("WWW.Example.COM").map(|d| d.to_dotted_string())
        );
    }

    #[test]
    fn domainname_rejects_all_digit_first_label() {
        assert_eq!(None, DomainName::from_dotted_string("127.0.0.1"));
    }

    #[test]
    fn domainname_rejects_consecutive_dots() {
        assert_eq!(None, DomainName::from_dotted_string("www..example.com."));
    }

    #[test]
    fn domainname_rejects_leading_and_trailing_dash() {
        assert_eq!(None, DomainName::from_dotted_string("-foo.com."));
        assert_eq!(None, DomainName::from_dotted_string("foo-.com."));
    }

    #[test]
    fn domainname_label_length_boundary() {
        let ok = "a".repeat(63);
        let bad = "a".repeat(64);
        assert!(DomainName::from_dotted_string(&format!("{ok}.com.")).is_some());
        assert!(DomainName::from_dotted_string(&format!("{bad}.com.")).is_none());
    }

    #[test]
    fn domainname_total_length_boundary() {
        let label = "a".repeat(63);
        let over = format!("{label}.{label}.{label}.{label}.");
        assert_eq!(None, DomainName::from_dotted_string(&over));
    }

    #[test]
    fn domainname_subdomain_is_strict() {
        let a = domain("www.example.com.");
        assert!(!a.is_subdomain_of(&a));
        assert!(a.is_subdomain_of(&domain("example.com.")));
        assert!(a.is_subdomain_of(&domain(".")));
        assert!(!domain("example.com.").is_subdomain_of(&a));
    }

    #[test]
    fn domainname_parent() {
        let a = domain("www.example.com.");
        assert_eq!(Some(domain("example.com.")), a.parent());
        assert_eq!(Some(domain(".")), domain("com.").parent());
        assert_eq!(None, domain(".").parent());
    }
}

#[cfg(any(feature = "test-util", test))]
pub mod test_util {
    use super::*;

    pub fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    pub fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype: RecordType::A,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Rdata::A(address),
        }
    }

    pub fn cname_record(name: &str, target_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype: RecordType::CNAME,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Rdata::Name(domain(target_name)),
        }
    }

    pub fn ns_record(superdomain_name: &str, nameserver_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(superdomain_name),
            rtype: RecordType::NS,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Rdata::Name(domain(nameserver_name)),
        }
    }

    pub fn txt_record(name: &str, octets: &[u8]) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype: RecordType::TXT,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Rdata::Bytes(octets.to_vec()),
        }
    }
}
