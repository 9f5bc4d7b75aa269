//! N-Triples and N-Quads: one statement per line.
//!
//! Errors carry the 1-based line and the 0-based character column where the
//! problem was noticed. Parsing stops at the first error.

use super::{ErrorSender, TripleReceiver, TripleSender};
use crate::errors::{Error, Result, SyntaxErrorKind};
use crate::namespace::PrefixTable;
use crate::term::Term;
use crate::triple::Triple;
use std::io::{BufRead, BufReader, Read, Write};

struct LineReader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl LineReader {
    fn new(text: &str, line: usize) -> Self {
        LineReader {
            chars: text.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn error_at(&self, column: usize, kind: SyntaxErrorKind) -> Error {
        Error::Syntax {
            line: self.line,
            column,
            kind,
        }
    }

    fn error(&self, kind: SyntaxErrorKind) -> Error {
        self.error_at(self.pos, kind)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error(SyntaxErrorKind::UnexpectedCharacter)),
            None => Err(self.error(SyntaxErrorKind::UnexpectedEof)),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn at_end_or_comment(&self) -> bool {
        matches!(self.peek(), None | Some('#'))
    }

    fn term(&mut self) -> Result<Term> {
        match self.peek() {
            Some('<') => {
                self.pos += 1;
                Ok(Term::Resource(self.iri()?))
            }
            Some('_') => self.blank_node(),
            Some('"') => self.literal(),
            Some(_) => Err(self.error(SyntaxErrorKind::UnexpectedCharacter)),
            None => Err(self.error(SyntaxErrorKind::UnexpectedEof)),
        }
    }

    /// Body of an IRI, after the opening `<`.
    fn iri(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(SyntaxErrorKind::UnterminatedIri)),
                Some('>') => {
                    if out.is_empty() {
                        return Err(self.error_at(self.pos - 1, SyntaxErrorKind::UnexpectedCharacter));
                    }
                    return Ok(out);
                }
                Some('\\') => match self.bump() {
                    Some('u') => out.push(self.hex_escape(4)?),
                    Some('U') => out.push(self.hex_escape(8)?),
                    Some(_) => {
                        return Err(self.error_at(self.pos - 1, SyntaxErrorKind::UnexpectedCharacter))
                    }
                    None => return Err(self.error(SyntaxErrorKind::UnterminatedIri)),
                },
                Some(c)
                    if c <= ' ' || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`') =>
                {
                    return Err(self.error_at(self.pos - 1, SyntaxErrorKind::UnexpectedCharacter));
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn blank_node(&mut self) -> Result<Term> {
        self.expect('_')?;
        self.expect(':')?;
        let mut id = String::new();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                id.push(c);
                self.pos += 1;
            }
            Some(_) => return Err(self.error(SyntaxErrorKind::UnexpectedCharacter)),
            None => return Err(self.error(SyntaxErrorKind::UnexpectedEof)),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                id.push(c);
                self.pos += 1;
            } else if c == '.' || c == ' ' || c == '\t' {
                break;
            } else {
                return Err(self.error(SyntaxErrorKind::UnexpectedCharacter));
            }
        }
        Ok(Term::BlankNode(id))
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char> {
        let start = self.pos;
        let mut code = 0u32;
        for _ in 0..digits {
            let c = self
                .bump()
                .ok_or_else(|| self.error(SyntaxErrorKind::UnexpectedEof))?;
            let d = c
                .to_digit(16)
                .ok_or_else(|| self.error_at(self.pos - 1, SyntaxErrorKind::UnexpectedCharacter))?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or_else(|| self.error_at(start, SyntaxErrorKind::UnexpectedCharacter))
    }

    fn literal(&mut self) -> Result<Term> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(SyntaxErrorKind::UnterminatedLiteral)),
                Some('"') => break,
                Some('\\') => {
                    let c = match self.bump() {
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u') => self.hex_escape(4)?,
                        Some('U') => self.hex_escape(8)?,
                        Some(_) => {
                            return Err(
                                self.error_at(self.pos - 1, SyntaxErrorKind::UnexpectedCharacter)
                            )
                        }
                        None => return Err(self.error(SyntaxErrorKind::UnterminatedLiteral)),
                    };
                    value.push(c);
                }
                Some(c) => value.push(c),
            }
        }
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let mut lang = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        lang.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if lang.is_empty() {
                    return Err(self.error(SyntaxErrorKind::UnexpectedCharacter));
                }
                Ok(Term::literal_with_language(value, lang))
            }
            Some('^') => {
                self.pos += 1;
                self.expect('^')?;
                self.expect('<')?;
                let dt = self.iri()?;
                Ok(Term::literal_with_datatype(value, Term::Resource(dt)))
            }
            _ => Ok(Term::literal(value)),
        }
    }

    /// Parse one line. `None` for blank and comment lines.
    fn statement(&mut self, max_terms: usize) -> Result<Option<Triple>> {
        self.skip_whitespace();
        if self.at_end_or_comment() {
            return Ok(None);
        }
        let mut terms: Vec<(usize, Term)> = Vec::with_capacity(4);
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    break;
                }
                None => {
                    let kind = if terms.len() >= 3 {
                        SyntaxErrorKind::UnterminatedTriple
                    } else {
                        SyntaxErrorKind::UnexpectedEof
                    };
                    return Err(self.error(kind));
                }
                Some(_) if terms.len() == max_terms => {
                    return Err(self.error(SyntaxErrorKind::TermCount));
                }
                Some(_) => {
                    let start = self.pos;
                    let term = self.term()?;
                    terms.push((start, term));
                }
            }
        }
        self.skip_whitespace();
        if !self.at_end_or_comment() {
            return Err(self.error(SyntaxErrorKind::UnexpectedCharacter));
        }
        if terms.len() < 3 {
            return Err(self.error(SyntaxErrorKind::TermCount));
        }

        let mut terms = terms.into_iter();
        let mut next = || terms.next().ok_or_else(|| self.error(SyntaxErrorKind::TermCount));
        let (s_col, subject) = next()?;
        let (p_col, predicate) = next()?;
        let (_, object) = next()?;
        let context = terms.next();
        if subject.is_literal() {
            return Err(self.error_at(s_col, SyntaxErrorKind::UnexpectedCharacter));
        }
        if !predicate.is_resource() {
            return Err(self.error_at(p_col, SyntaxErrorKind::UnexpectedCharacter));
        }
        let context = match context {
            Some((c_col, ctx)) if ctx.is_literal() => {
                return Err(self.error_at(c_col, SyntaxErrorKind::UnexpectedCharacter))
            }
            Some((_, ctx)) => Some(ctx),
            None => None,
        };
        Ok(Some(Triple {
            subject,
            predicate,
            object,
            context,
        }))
    }
}

/// Parse a single term written in N-Triples syntax, e.g. `<http://ex/a>`,
/// `_:b0` or `"chat"@fr`.
pub fn parse_term(text: &str) -> Result<Term> {
    let mut r = LineReader::new(text.trim(), 1);
    let term = r.term()?;
    if r.peek().is_some() {
        return Err(r.error(SyntaxErrorKind::UnexpectedCharacter));
    }
    Ok(term)
}

fn parse_lines(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    max_terms: usize,
) {
    let reader = BufReader::new(source);
    for (i, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                errors.report(e.into());
                return;
            }
        };
        match LineReader::new(&line, i + 1).statement(max_terms) {
            Ok(Some(triple)) => {
                if triples.send(triple).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                errors.report(e);
                return;
            }
        }
    }
}

pub fn parse_ntriples(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    _prefixes: &mut PrefixTable,
) {
    parse_lines(source, triples, errors, 3)
}

/// Like N-Triples, with an optional fourth term naming the triple's context.
pub fn parse_nquads(
    source: &mut (dyn Read + Send),
    triples: TripleSender,
    errors: ErrorSender,
    _prefixes: &mut PrefixTable,
) {
    parse_lines(source, triples, errors, 4)
}

fn write_line(sink: &mut (dyn Write + Send), triple: &Triple, with_context: bool) -> Result<()> {
    triple.validate()?;
    write!(
        sink,
        "{} {} {}",
        triple.subject, triple.predicate, triple.object
    )?;
    if with_context {
        if let Some(ctx) = &triple.context {
            write!(sink, " {}", ctx)?;
        }
    }
    sink.write_all(b" .\n")?;
    Ok(())
}

fn serialize_lines(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    with_context: bool,
) {
    for triple in triples {
        if let Err(e) = write_line(sink, &triple, with_context) {
            errors.report(e);
            return;
        }
    }
    if let Err(e) = sink.flush() {
        errors.report(e.into());
    }
}

/// Writes one line per triple; contexts are dropped.
pub fn serialize_ntriples(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    _prefixes: &PrefixTable,
) {
    serialize_lines(sink, triples, errors, false)
}

pub fn serialize_nquads(
    sink: &mut (dyn Write + Send),
    triples: TripleReceiver,
    errors: ErrorSender,
    _prefixes: &PrefixTable,
) {
    serialize_lines(sink, triples, errors, true)
}
