use crate::errors::{Error, Result};
use crate::term::Term;
use std::fmt;

/// A statement: subject, predicate, object and an optional context (graph name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub context: Option<Term>,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
            context: None,
        }
    }

    pub fn quad(subject: Term, predicate: Term, object: Term, context: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
            context: Some(context),
        }
    }

    /// Check that each term is well formed and allowed in its position:
    /// no literal subject or context, and a resource predicate.
    pub fn validate(&self) -> Result<()> {
        if self.subject.is_literal() {
            return Err(Error::UnindexableTerm(self.subject.to_string()));
        }
        if !self.predicate.is_resource() {
            return Err(Error::UnindexableTerm(self.predicate.to_string()));
        }
        if let Some(ctx) = self.context.as_ref().filter(|c| c.is_literal()) {
            return Err(Error::UnindexableTerm(ctx.to_string()));
        }
        self.subject.validate()?;
        self.predicate.validate()?;
        self.object.validate()?;
        if let Some(ctx) = &self.context {
            ctx.validate()?;
        }
        Ok(())
    }

    /// True if every given term equals the corresponding position.
    pub fn matches(&self, s: Option<&Term>, p: Option<&Term>, o: Option<&Term>) -> bool {
        s.map_or(true, |s| *s == self.subject)
            && p.map_or(true, |p| *p == self.predicate)
            && o.map_or(true, |o| *o == self.object)
    }
}

/// N-Triples (or N-Quads when a context is present) line, without newline.
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(ctx) = &self.context {
            write!(f, " {}", ctx)?;
        }
        f.write_str(" .")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_context() {
        let t = Triple::new(
            Term::resource("http://ex/s"),
            Term::resource("http://ex/p"),
            Term::literal("o"),
        );
        assert_eq!(t.to_string(), "<http://ex/s> <http://ex/p> \"o\" .");
        let q = Triple::quad(
            t.subject.clone(),
            t.predicate.clone(),
            t.object.clone(),
            Term::resource("http://ex/g"),
        );
        assert_eq!(
            q.to_string(),
            "<http://ex/s> <http://ex/p> \"o\" <http://ex/g> ."
        );
        assert_ne!(t, q);
    }

    #[test]
    fn validate_checks_positions() {
        let s = Term::resource("http://ex/s");
        let p = Term::resource("http://ex/p");
        assert!(Triple::new(s.clone(), p.clone(), Term::literal("o")).validate().is_ok());
        for bad in [
            Triple::new(Term::literal("s"), p.clone(), Term::literal("o")),
            Triple::new(s.clone(), Term::blank_node("p"), Term::literal("o")),
            Triple::new(s.clone(), Term::literal("p"), Term::literal("o")),
            Triple::quad(s.clone(), p.clone(), Term::literal("o"), Term::literal("g")),
        ] {
            assert!(
                matches!(bad.validate(), Err(Error::UnindexableTerm(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn matches_ands_constraints() {
        let t = Triple::new(Term::resource("s"), Term::resource("p"), Term::literal("o"));
        assert!(t.matches(None, None, None));
        assert!(t.matches(Some(&Term::resource("s")), None, Some(&Term::literal("o"))));
        assert!(!t.matches(Some(&Term::resource("s")), Some(&Term::resource("q")), None));
    }
}
