//! The compressed binary packet format from the `rdfz` crate.
//!
//! Output is always zstd-compressed and checksummed; input may be either.
//! Contexts are not represented.

use super::{ErrorSender, TripleReceiver, TripleSender};
use crate::errors::{Error, Result};
use crate::namespace::PrefixTable;
use crate::term::Term;
use crate::triple::Triple;
use ::rdfz::{PacketReader, PacketWriter, WriterOptions};
use std::io::{Read, Write};

fn read_packets(source: &mut (dyn Read + Send), triples: &TripleSender) -> Result<()> {
    for decoded in PacketReader::new(source)? {
        let (s, p, o) = decoded?;
        triples.send(Triple::new(Term::from(s), Term::from(p), Term::from(o)))?;
    }
    Ok(())
}

pub fn parse_rdfz(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    _prefixes: &mut PrefixTable,
) {
    match read_packets(source, &triples) {
        Ok(()) | Err(Error::Cancelled) => {}
        Err(e) => errors.report(e),
    }
}

fn write_packets(sink: &mut (dyn Write + Send), triples: TripleReceiver) -> Result<()> {
    let opts = WriterOptions {
        zstd: true,
        with_crc: true,
    };
    let mut w = PacketWriter::new(&mut *sink, opts)?;
    for triple in triples {
        w.add(
            &::rdfz::Term::try_from(&triple.subject)?,
            &::rdfz::Term::try_from(&triple.predicate)?,
            &::rdfz::Term::try_from(&triple.object)?,
        )?;
    }
    w.finish()?;
    Ok(())
}

pub fn serialize_rdfz(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    _prefixes: &PrefixTable,
) {
    if let Err(e) = write_packets(sink, triples) {
        errors.report(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{run_parser, run_serializer, CancelToken};

    #[test]
    fn corrupt_input_is_reported() {
        let err = run_parser(
            &parse_rdfz,
            &b"NOPE\x01\x00\x00\x00"[..],
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Rdfz(::rdfz::RdfzError::Invalid("bad magic"))));
    }

    #[test]
    fn output_is_compressed_and_checksummed() {
        let triples = vec![Triple::new(
            Term::resource("http://ex/s"),
            Term::resource("http://ex/p"),
            Term::literal("o"),
        )];
        let bytes = run_serializer(
            &serialize_rdfz,
            Vec::new(),
            &PrefixTable::default(),
            &CancelToken::new(),
            triples,
        )
        .unwrap();
        let reader = PacketReader::new(&bytes[..]).unwrap();
        assert!(reader.header().is_zstd());
        assert!(reader.header().has_crc());
        assert_eq!(reader.count(), 1);
    }
}
