use uevent::frame::{encode_frame, OutputBuffer};
use uevent::parser::parse;

/// Minimal external-term decoder covering the subset the encoder emits
#[derive(Debug, PartialEq)]
enum Term {
    Atom(String),
    Binary(Vec<u8>),
    List(Vec<Term>),
    Map(Vec<(Term, Term)>),
    Tuple(Vec<Term>),
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> u8 {
        let b = self.buf[self.pos];
        self.pos += 1;
        b
    }

    fn u32(&mut self) -> usize {
        let bytes = &self.buf[self.pos..self.pos + 4];
        self.pos += 4;
        u32::from_be_bytes(bytes.try_into().unwrap()) as usize
    }

    fn bytes(&mut self, n: usize) -> Vec<u8> {
        let out = self.buf[self.pos..self.pos + n].to_vec();
        self.pos += n;
        out
    }

    fn term(&mut self) -> Term {
        match self.u8() {
            104 => {
                let arity = self.u8() as usize;
                Term::Tuple((0..arity).map(|_| self.term()).collect())
            }
            119 => {
                let len = self.u8() as usize;
                Term::Atom(String::from_utf8(self.bytes(len)).unwrap())
            }
            106 => Term::List(Vec::new()),
            108 => {
                let len = self.u32();
                let items = (0..len).map(|_| self.term()).collect();
                assert_eq!(self.term(), Term::List(Vec::new()), "list tail must be nil");
                Term::List(items)
            }
            109 => {
                let len = self.u32();
                Term::Binary(self.bytes(len))
            }
            116 => {
                let arity = self.u32();
                Term::Map((0..arity).map(|_| (self.term(), self.term())).collect())
            }
            tag => panic!("unexpected tag {tag}"),
        }
    }
}

/// Split a stream into frames and decode each one
fn decode_stream(stream: &[u8]) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut rest = stream;
    while !rest.is_empty() {
        let len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
        let payload = &rest[2..2 + len];
        let mut decoder = Decoder::new(payload);
        assert_eq!(decoder.u8(), 131, "missing version byte");
        terms.push(decoder.term());
        assert_eq!(decoder.pos, payload.len(), "trailing bytes in frame");
        rest = &rest[2 + len..];
    }
    terms
}

fn bin(s: &str) -> Term {
    Term::Binary(s.as_bytes().to_vec())
}

#[test]
fn test_platform_add_roundtrip() {
    let raw = b"add@/devices/platform/foo\0ACTION=add\0DEVPATH=/devices/platform/foo\0SUBSYSTEM=platform\0SEQNUM=5\0";
    let record = parse(raw).unwrap();
    let mut out = Vec::new();
    encode_frame(&record, &mut out).unwrap();

    let terms = decode_stream(&out);
    assert_eq!(
        terms,
        vec![Term::Tuple(vec![
            Term::Atom("add".into()),
            Term::List(vec![bin("devices"), bin("platform"), bin("foo")]),
            Term::Map(vec![(bin("subsystem"), bin("platform"))]),
        ])]
    );
}

#[test]
fn test_usb_event_roundtrip_preserves_order_and_bytes() {
    let raw = b"bind@/devices/pci0000:00/0000:00:14.0/usb1/1-1\0ACTION=bind\0DEVPATH=/devices/pci0000:00/0000:00:14.0/usb1/1-1\0SUBSYSTEM=usb\0DEVNAME=bus/usb/001/002\0DEVTYPE=usb_device\0DRIVER=usb\0PRODUCT=1d6b/2/510\0TYPE=9/0/1\0BUSNUM=001\0DEVNUM=002\0SEQNUM=4211\0MAJOR=189\0MINOR=1\0";
    let record = parse(raw).unwrap();
    let mut out = Vec::new();
    encode_frame(&record, &mut out).unwrap();

    let Term::Tuple(fields) = &decode_stream(&out)[0] else {
        panic!("expected tuple");
    };
    assert_eq!(fields[0], Term::Atom("bind".into()));
    assert_eq!(
        fields[1],
        Term::List(vec![
            bin("devices"),
            bin("pci0000:00"),
            bin("0000:00:14.0"),
            bin("usb1"),
            bin("1-1"),
        ])
    );
    let Term::Map(pairs) = &fields[2] else {
        panic!("expected map");
    };
    let keys: Vec<&Term> = pairs.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            &bin("subsystem"),
            &bin("devname"),
            &bin("devtype"),
            &bin("driver"),
            &bin("product"),
            &bin("type"),
            &bin("busnum"),
            &bin("devnum"),
            &bin("major"),
            &bin("minor"),
        ]
    );
    assert_eq!(pairs[1].1, bin("bus/usb/001/002"));
}

#[test]
fn test_non_utf8_values_roundtrip() {
    let raw = b"change@/devices/virtual/misc/x\0NAME=\xc3\x28\xff\0";
    let record = parse(raw).unwrap();
    let mut out = Vec::new();
    encode_frame(&record, &mut out).unwrap();

    let Term::Tuple(fields) = &decode_stream(&out)[0] else {
        panic!("expected tuple");
    };
    assert_eq!(
        fields[2],
        Term::Map(vec![(bin("name"), Term::Binary(vec![0xc3, 0x28, 0xff]))])
    );
}

#[test]
fn test_output_buffer_stream_decodes_frame_by_frame() {
    let mut buffer = OutputBuffer::new();
    for raw in [
        &b"add@/devices/a\0X=1\0"[..],
        &b"remove@/devices/b/c\0"[..],
        &b"change@/devices/d\0Y=2\0Z=3\0"[..],
    ] {
        buffer.push(&parse(raw).unwrap()).unwrap();
    }

    let terms = decode_stream(buffer.as_bytes());
    assert_eq!(terms.len(), 3);
    let actions: Vec<&Term> = terms
        .iter()
        .map(|t| match t {
            Term::Tuple(fields) => &fields[0],
            other => panic!("expected tuple, got {other:?}"),
        })
        .collect();
    assert_eq!(
        actions,
        vec![
            &Term::Atom("add".into()),
            &Term::Atom("remove".into()),
            &Term::Atom("change".into()),
        ]
    );
}
