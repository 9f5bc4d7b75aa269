//! Turtle output: prefix declarations, then one block per subject.

use super::{ErrorSender, TripleReceiver};
use crate::consts::A;
use crate::errors::Result;
use crate::namespace::PrefixTable;
use crate::term::{escape_into, Term};
use std::collections::HashMap;
use std::io::Write;

fn encode(term: &Term, prefixes: &PrefixTable) -> Result<String> {
    term.validate()?;
    Ok(match term {
        Term::Resource(uri) => prefixes
            .shrink(uri)
            .unwrap_or_else(|| format!("<{}>", uri)),
        Term::BlankNode(id) => format!("_:{}", id),
        Term::Literal {
            value,
            language,
            datatype,
        } => {
            let mut out = String::with_capacity(value.len() + 2);
            out.push('"');
            // writing into a String cannot fail
            let _ = escape_into(&mut out, value);
            out.push('"');
            if let Some(lang) = language {
                out.push('@');
                out.push_str(lang);
            } else if let Some(dt) = datatype {
                out.push_str("^^");
                out.push_str(&encode(dt, prefixes)?);
            }
            out
        }
    })
}

fn write_turtle(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    prefixes: &PrefixTable,
) -> Result<()> {
    // subjects keep their first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut blocks: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for triple in triples {
        triple.validate()?;
        let s = encode(&triple.subject, prefixes)?;
        let p = if triple.predicate == *A {
            "a".to_string()
        } else {
            encode(&triple.predicate, prefixes)?
        };
        let o = encode(&triple.object, prefixes)?;
        blocks
            .entry(s.clone())
            .or_insert_with(|| {
                order.push(s);
                Vec::new()
            })
            .push((p, o));
    }

    for (base, name) in prefixes.iter() {
        writeln!(sink, "@prefix {}: <{}> .", name, base)?;
    }
    for subject in &order {
        writeln!(sink)?;
        let Some(pairs) = blocks.get(subject) else {
            continue;
        };
        write!(sink, "{}", subject)?;
        for (i, (p, o)) in pairs.iter().enumerate() {
            if i == 0 {
                write!(sink, " {} {}", p, o)?;
            } else {
                write!(sink, " ;\n    {} {}", p, o)?;
            }
        }
        writeln!(sink, " .")?;
    }
    sink.flush()?;
    Ok(())
}

pub fn serialize_turtle(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    prefixes: &PrefixTable,
) {
    if let Err(e) = write_turtle(sink, triples, prefixes) {
        errors.report(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{run_serializer, CancelToken};
    use crate::consts::{FOAF, XSD};
    use crate::errors::Error;
    use crate::triple::Triple;

    fn render(triples: Vec<Triple>, prefixes: &PrefixTable) -> Result<String> {
        let out = run_serializer(
            &serialize_turtle,
            Vec::new(),
            prefixes,
            &CancelToken::new(),
            triples,
        )?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn groups_by_subject_and_abbreviates() {
        let mut prefixes = PrefixTable::default();
        prefixes.bind(FOAF, "foaf");
        prefixes.bind(XSD, "xsd");
        let alice = Term::resource("http://ex.org/alice");
        let triples = vec![
            Triple::new(alice.clone(), A.clone(), Term::resource(format!("{}Person", FOAF))),
            Triple::new(
                alice.clone(),
                Term::resource(format!("{}age", FOAF)),
                Term::literal_with_datatype("30", Term::resource(format!("{}integer", XSD))),
            ),
            Triple::new(
                Term::blank_node("b0"),
                Term::resource(format!("{}name", FOAF)),
                Term::literal("Bob"),
            ),
        ];
        let text = render(triples, &prefixes).unwrap();
        let expected = "\
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .

<http://ex.org/alice> a foaf:Person ;
    foaf:age \"30\"^^xsd:integer .

_:b0 foaf:name \"Bob\" .
";
        assert_eq!(text, expected);
    }

    #[test]
    fn malformed_literal_is_reported() {
        let bad = Term::Literal {
            value: "x".into(),
            language: Some("en".into()),
            datatype: Some(Box::new(Term::resource("http://ex/dt"))),
        };
        let err = render(
            vec![Triple::new(Term::resource("s"), Term::resource("p"), bad)],
            &PrefixTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedLiteral(_)));
    }

    #[test]
    fn literal_subject_is_reported() {
        let err = render(
            vec![Triple::new(
                Term::literal("x"),
                Term::resource("http://ex/p"),
                Term::resource("http://ex/o"),
            )],
            &PrefixTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnindexableTerm(_)));
    }
}
