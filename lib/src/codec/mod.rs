//! The streaming codec pipeline.
//!
//! A codec never touches a store. A [`Parser`] reads bytes and sends triples
//! down a channel; a [`Serializer`] receives triples from a channel and writes
//! bytes. The orchestration in [`run_parser`] and [`run_serializer`] runs the
//! codec on its own scoped thread while the calling thread drains or feeds the
//! channel, so the store lock is only ever taken on the calling side.
//!
//! Channel contract:
//!
//! - The triple channel is a rendezvous channel: a producer blocks until the
//!   consumer has taken the previous triple.
//! - The error channel holds one error. Codecs report through
//!   [`ErrorSender::report`], which never blocks; errors beyond the first are
//!   logged and dropped.
//! - A codec owns its senders, so both channels close when the codec returns,
//!   whatever the outcome.
//! - A consumer that stops early drops its receiver, which makes the next
//!   [`TripleSender::send`] fail instead of blocking. Codecs stop producing as
//!   soon as a send fails.

pub mod json;
pub mod ntriples;
#[cfg(feature = "oxigraph")]
pub mod oxi;
pub mod rdfz;
pub mod turtle;

use crate::errors::{Error, Result};
use crate::namespace::PrefixTable;
use crate::triple::Triple;
use log::{debug, warn};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;

/// Shared flag that asks a running pipeline to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Producer end of the triple channel.
#[derive(Debug)]
pub struct TripleSender {
    tx: SyncSender<Triple>,
    cancel: CancelToken,
}

impl TripleSender {
    /// Hand one triple to the consumer, blocking until it is taken.
    ///
    /// Fails with [`Error::Cancelled`] once the pipeline is cancelled or the
    /// consumer has stopped; the codec should return without reporting it.
    pub fn send(&self, triple: Triple) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.tx.send(triple).map_err(|_| Error::Cancelled)
    }
}

/// Consumer end of the triple channel, as an iterator that ends when the
/// producer is done.
#[derive(Debug)]
pub struct TripleReceiver {
    rx: Receiver<Triple>,
}

impl Iterator for TripleReceiver {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        self.rx.recv().ok()
    }
}

/// Error channel handed to every codec.
#[derive(Debug)]
pub struct ErrorSender {
    tx: SyncSender<Error>,
}

impl ErrorSender {
    /// Report a failure without blocking. Only the first report is delivered.
    pub fn report(&self, err: Error) {
        match self.tx.try_send(err) {
            Ok(()) => {}
            Err(TrySendError::Full(err)) => warn!("dropping additional codec error: {}", err),
            Err(TrySendError::Disconnected(err)) => debug!("codec error after shutdown: {}", err),
        }
    }
}

/// Something that turns bytes into triples.
///
/// Implementations send every triple through `triples`, report at most one
/// meaningful error through `errors`, may add prefix bindings they discover
/// to `prefixes`, and return when the input is exhausted or a send fails.
pub trait Parser: Sync {
    fn parse(
        &self,
        source: &mut (dyn Read + Send),
        triples: TripleSender,
        errors: ErrorSender,
        prefixes: &mut PrefixTable,
    );
}

/// Something that turns triples into bytes.
///
/// Implementations consume `triples` until it ends (or stop early on a
/// failure, reporting it through `errors`) and never modify the prefixes.
pub trait Serializer: Sync {
    fn serialize(
        &self,
        sink: &mut (dyn Write + Send),
        triples: TripleReceiver,
        errors: ErrorSender,
        prefixes: &PrefixTable,
    );
}

/// Plain function parsers, as stored in the format registry.
pub type ParseFn = fn(&mut (dyn Read + Send), TripleSender, ErrorSender, &mut PrefixTable);
/// Plain function serializers, as stored in the format registry.
pub type SerializeFn = fn(&mut (dyn Write + Send), TripleReceiver, ErrorSender, &PrefixTable);

impl<F> Parser for F
where
    F: Fn(&mut (dyn Read + Send), TripleSender, ErrorSender, &mut PrefixTable) + Sync,
{
    fn parse(
        &self,
        source: &mut (dyn Read + Send),
        triples: TripleSender,
        errors: ErrorSender,
        prefixes: &mut PrefixTable,
    ) {
        self(source, triples, errors, prefixes)
    }
}

impl<F> Serializer for F
where
    F: Fn(&mut (dyn Write + Send), TripleReceiver, ErrorSender, &PrefixTable) + Sync,
{
    fn serialize(
        &self,
        sink: &mut (dyn Write + Send),
        triples: TripleReceiver,
        errors: ErrorSender,
        prefixes: &PrefixTable,
    ) {
        self(sink, triples, errors, prefixes)
    }
}

/// Run `parser` over `source` on a background thread and pass every triple
/// it produces to `sink`, in emission order.
///
/// Returns the number of triples accepted by `sink`. The outcome is, in
/// order of precedence: the first error returned by `sink`, [`Error::Cancelled`]
/// if `cancel` was set, the first error the parser reported, or the count.
/// Triples accepted before a failure stay wherever `sink` put them.
pub fn run_parser<P, R, F>(
    parser: &P,
    mut source: R,
    prefixes: &mut PrefixTable,
    cancel: &CancelToken,
    mut sink: F,
) -> Result<usize>
where
    P: Parser + ?Sized,
    R: Read + Send,
    F: FnMut(Triple) -> Result<()>,
{
    let (tx, rx) = sync_channel::<Triple>(0);
    let (etx, erx) = sync_channel::<Error>(1);
    let triples = TripleSender {
        tx,
        cancel: cancel.clone(),
    };
    let errors = ErrorSender { tx: etx };

    let mut count = 0usize;
    let mut failure: Option<Error> = None;
    thread::scope(|scope| -> Result<()> {
        let handle = thread::Builder::new()
            .name("trine-parser".to_string())
            .spawn_scoped(scope, move || {
                parser.parse(&mut source, triples, errors, prefixes)
            })?;
        for triple in &rx {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = sink(triple) {
                failure = Some(e);
                break;
            }
            count += 1;
        }
        // unblocks a parser waiting in send
        drop(rx);
        handle
            .join()
            .map_err(|_| Error::CodecPanicked("parser"))
    })?;

    debug!("parser delivered {} triples", count);
    if let Some(e) = failure {
        return Err(e);
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    match erx.try_recv() {
        Ok(e) => Err(e),
        Err(_) => Ok(count),
    }
}

/// Run `serializer` on a background thread, feeding it `triples` from the
/// calling thread, and return the sink once the serializer is done.
///
/// Feeding stops early if the serializer stops reading or `cancel` is set, so
/// a failing serializer never leaves the caller blocked.
pub fn run_serializer<S, W, I>(
    serializer: &S,
    mut sink: W,
    prefixes: &PrefixTable,
    cancel: &CancelToken,
    triples: I,
) -> Result<W>
where
    S: Serializer + ?Sized,
    W: Write + Send,
    I: IntoIterator<Item = Triple>,
{
    let (tx, rx) = sync_channel::<Triple>(0);
    let (etx, erx) = sync_channel::<Error>(1);
    let receiver = TripleReceiver { rx };
    let errors = ErrorSender { tx: etx };

    let mut fed = 0usize;
    let sink = thread::scope(|scope| -> Result<W> {
        let handle = thread::Builder::new()
            .name("trine-serializer".to_string())
            .spawn_scoped(scope, move || {
                serializer.serialize(&mut sink, receiver, errors, prefixes);
                sink
            })?;
        for triple in triples {
            if cancel.is_cancelled() || tx.send(triple).is_err() {
                break;
            }
            fed += 1;
        }
        drop(tx);
        handle
            .join()
            .map_err(|_| Error::CodecPanicked("serializer"))
    })?;

    debug!("serializer consumed {} triples", fed);
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    match erx.try_recv() {
        Ok(e) => Err(e),
        Err(_) => Ok(sink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn numbered(i: usize) -> Triple {
        Triple::new(
            Term::resource("http://ex/s"),
            Term::resource("http://ex/p"),
            Term::literal(i.to_string()),
        )
    }

    fn emit_five(
        _: &mut (dyn Read + Send),
        triples: TripleSender,
        _: ErrorSender,
        _: &mut PrefixTable,
    ) {
        for i in 0..5 {
            if triples.send(numbered(i)).is_err() {
                return;
            }
        }
    }

    #[test]
    fn drains_in_emission_order() {
        let mut seen = Vec::new();
        let n = run_parser(
            &emit_five,
            std::io::empty(),
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |t| {
                seen.push(t);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(seen, (0..5).map(numbered).collect::<Vec<_>>());
    }

    #[test]
    fn only_first_error_is_kept() {
        fn noisy(_: &mut (dyn Read + Send), _: TripleSender, errors: ErrorSender, _: &mut PrefixTable) {
            errors.report(Error::NotFound);
            errors.report(Error::Cancelled);
        }
        let err = run_parser(
            &noisy,
            std::io::empty(),
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[test]
    fn sink_failure_stops_producer() {
        let mut taken = 0;
        let err = run_parser(
            &emit_five,
            std::io::empty(),
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |_| {
                taken += 1;
                if taken == 2 {
                    Err(Error::NotFound)
                } else {
                    Ok(())
                }
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound));
        assert_eq!(taken, 2);
    }

    #[test]
    fn parser_sees_and_extends_prefixes() {
        fn binder(_: &mut (dyn Read + Send), _: TripleSender, _: ErrorSender, prefixes: &mut PrefixTable) {
            assert_eq!(prefixes.len(), 1);
            prefixes.bind("http://ex/", "ex");
        }
        let mut table = PrefixTable::default();
        run_parser(&binder, std::io::empty(), &mut table, &CancelToken::new(), |_| Ok(()))
            .unwrap();
        assert_eq!(table.name_for("http://ex/"), Some("ex"));
    }

    #[test]
    fn panicking_parser_is_reported() {
        fn boom(_: &mut (dyn Read + Send), _: TripleSender, _: ErrorSender, _: &mut PrefixTable) {
            panic!("boom")
        }
        let err = run_parser(
            &boom,
            std::io::empty(),
            &mut PrefixTable::default(),
            &CancelToken::new(),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CodecPanicked("parser")));
    }

    #[test]
    fn serializer_receives_everything() {
        fn counter(sink: &mut (dyn Write + Send), triples: TripleReceiver, errors: ErrorSender, _: &PrefixTable) {
            let n = triples.count();
            if let Err(e) = write!(sink, "{}", n) {
                errors.report(e.into());
            }
        }
        let out = run_serializer(
            &counter,
            Vec::new(),
            &PrefixTable::default(),
            &CancelToken::new(),
            (0..7).map(numbered),
        )
        .unwrap();
        assert_eq!(out, b"7");
    }
}
