use rdfz::header::{FLAG_CRC, Header, PacketKind};
use rdfz::{PacketReader, PacketWriter, RdfzError, Term, WriterOptions};

fn mk_temp(name: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(name);
    p
}

fn body(flags: u16, packets: &[u8]) -> Vec<u8> {
    let mut out = Header::new(flags).to_bytes().to_vec();
    out.extend_from_slice(packets);
    out
}

fn first_error(bytes: &[u8]) -> RdfzError {
    match PacketReader::new(bytes) {
        Err(e) => e,
        Ok(mut r) => r
            .find_map(|t| t.err())
            .expect("stream should not decode cleanly"),
    }
}

#[test]
fn empty_stream_is_valid() {
    let bytes = PacketWriter::new(Vec::new(), WriterOptions::default())
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(bytes.len(), Header::LEN + 1);
    assert_eq!(PacketReader::new(&bytes[..]).unwrap().count(), 0);
}

#[test]
fn file_roundtrip() {
    let path = mk_temp("edge_file_roundtrip.rdfz");
    let f = std::fs::File::create(&path).unwrap();
    let mut w = PacketWriter::new(
        f,
        WriterOptions {
            zstd: false,
            with_crc: true,
        },
    )
    .unwrap();
    let s = Term::Iri("http://ex/s".into());
    w.add(&s, &s, &s).unwrap();
    w.finish().unwrap();

    let r = PacketReader::new(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(r.count(), 1);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn bad_magic_and_version() {
    let mut bytes = body(0, &[0]);
    bytes[0] = b'X';
    assert!(matches!(first_error(&bytes), RdfzError::Invalid("bad magic")));

    let mut bytes = body(0, &[0]);
    bytes[4] = 9;
    assert!(matches!(
        first_error(&bytes),
        RdfzError::Invalid("unsupported version")
    ));
}

#[test]
fn unknown_prefix_id() {
    // IRI packet referencing prefix 3 that was never declared
    let id = PacketKind::Iri(3).to_u64() as u8;
    let bytes = body(0, &[id, 1, b'a', 0]);
    match first_error(&bytes) {
        RdfzError::Corrupt(m) => assert!(m.contains("unknown prefix")),
        e => panic!("unexpected {}", e),
    }
}

#[test]
fn truncated_stream() {
    // BNODE packet announcing 5 bytes, only 2 present
    let bytes = body(0, &[1, 5, b'a', b'b']);
    match first_error(&bytes) {
        RdfzError::Corrupt(m) => assert!(m.contains("truncated")),
        e => panic!("unexpected {}", e),
    }
}

#[test]
fn dangling_terms_before_eof() {
    // one blank node then EOF
    let bytes = body(0, &[1, 1, b'a', 0]);
    match first_error(&bytes) {
        RdfzError::Corrupt(m) => assert!(m.contains("dangling")),
        e => panic!("unexpected {}", e),
    }
}

#[test]
fn datatype_must_be_iri() {
    // LITDT "1" followed by a blank node
    let bytes = body(0, &[4, 1, b'1', 1, 1, b'b', 0]);
    match first_error(&bytes) {
        RdfzError::Corrupt(m) => assert!(m.contains("datatype")),
        e => panic!("unexpected {}", e),
    }
}

#[test]
fn missing_crc_footer() {
    let bytes = body(FLAG_CRC, &[0]);
    match first_error(&bytes) {
        RdfzError::Corrupt(m) => assert!(m.contains("truncated")),
        e => panic!("unexpected {}", e),
    }
}

#[cfg(not(feature = "zstd"))]
#[test]
fn zstd_requires_feature() {
    let err = PacketWriter::new(
        Vec::new(),
        WriterOptions {
            zstd: true,
            with_crc: false,
        },
    )
    .err()
    .expect("zstd unavailable");
    assert!(matches!(err, RdfzError::Invalid(_)));
}
