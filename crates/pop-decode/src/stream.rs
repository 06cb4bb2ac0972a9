//! # Streaming Decoder
//!
//! [`RecordStream`] reads one fixed-length record at a time into a single
//! reused buffer and yields `Result<CanonicalRecord, DecodeError>`. Memory
//! use is one record regardless of stream length.
//!
//! - A clean end of stream on a record boundary ends iteration.
//! - A short final read yields `TruncatedRecord` and ends iteration.
//! - [`Mode::Strict`] ends iteration after the first error;
//!   [`Mode::Lenient`] continues with the next record.
//! - A [`StopHandle`] ends iteration before the next record is read.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use pop_schema::RecordLayout;

use crate::canonical::CanonicalRecord;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::options::{DecodeOptions, Mode};
use crate::record::decode_record;

/// Cooperative stop request shared between a stream and its controller.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A handle with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the stream stop after the record in progress.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`StopHandle::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters describing a decode run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Records read, including rejected and truncated ones.
    pub records_read: u64,
    /// Records decoded successfully.
    pub records_decoded: u64,
    /// Records that failed to decode.
    pub records_rejected: u64,
    /// Iteration ended because of a stop request.
    pub stopped_early: bool,
}

/// Lazy iterator over the records of a byte stream.
pub struct RecordStream<'a, R> {
    layout: &'a RecordLayout,
    reader: R,
    options: DecodeOptions,
    buffer: Vec<u8>,
    index: u64,
    finished: bool,
    stop: StopHandle,
    summary: DecodeSummary,
}

impl<'a, R: Read> RecordStream<'a, R> {
    /// Create a stream over `reader`.
    pub fn new(layout: &'a RecordLayout, reader: R, options: DecodeOptions) -> Self {
        Self {
            layout,
            reader,
            options,
            buffer: vec![0u8; layout.length],
            index: 0,
            finished: false,
            stop: StopHandle::new(),
            summary: DecodeSummary::default(),
        }
    }

    /// Replace the stop handle, so an external controller can end the run.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// A handle that stops this stream.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The layout records are decoded against.
    pub fn layout(&self) -> &'a RecordLayout {
        self.layout
    }

    /// The options in effect.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Counters so far.
    pub fn summary(&self) -> DecodeSummary {
        self.summary
    }

    fn reject(&mut self, err: &DecodeError) {
        self.summary.records_rejected += 1;
        tracing::warn!(
            record = err.record_index,
            field = %err.field_path,
            error = %err.kind,
            "record rejected"
        );
        if self.options.mode == Mode::Strict {
            self.finished = true;
        }
    }
}

impl<R: Read> Iterator for RecordStream<'_, R> {
    type Item = Result<CanonicalRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.stop.is_stopped() {
            self.finished = true;
            self.summary.stopped_early = true;
            tracing::info!(records_read = self.summary.records_read, "decode stopped on request");
            return None;
        }
        if self.layout.length == 0 {
            self.finished = true;
            return None;
        }

        let index = self.index;
        let filled = match read_full(&mut self.reader, &mut self.buffer) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Some(Err(DecodeError {
                    record_index: index,
                    field_path: String::new(),
                    kind: DecodeErrorKind::Io(e),
                }));
            }
        };
        if filled == 0 {
            self.finished = true;
            return None;
        }
        self.summary.records_read += 1;
        self.index += 1;

        if filled < self.buffer.len() {
            self.finished = true;
            let err = DecodeError {
                record_index: index,
                field_path: String::new(),
                kind: DecodeErrorKind::TruncatedRecord {
                    expected: self.buffer.len(),
                    actual: filled,
                },
            };
            self.reject(&err);
            return Some(Err(err));
        }

        match decode_record(self.layout, &self.buffer, index, &self.options) {
            Ok(record) => {
                self.summary.records_decoded += 1;
                Some(Ok(record))
            }
            Err(err) => {
                self.reject(&err);
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf` as far as the reader allows. Returns the byte count, which is
/// short only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_core::FieldValue;
    use pop_schema::{compile_schema, SchemaOptions};

    fn layout() -> RecordLayout {
        compile_schema("01 R. 05 N PIC 9(2). 05 T PIC X(2).", &SchemaOptions::default()).unwrap()
    }

    /// A reader that hands out at most one byte per call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((b, rest)), Some(slot)) => {
                    *slot = *b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn yields_records_in_order() {
        let layout = layout();
        let stream = RecordStream::new(&layout, &b"01AA02BB"[..], DecodeOptions::default());
        let records: Vec<_> = stream.map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].get("N"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn short_reads_are_reassembled() {
        let layout = layout();
        let stream = RecordStream::new(&layout, Trickle(b"01AA02BB"), DecodeOptions::default());
        assert_eq!(stream.filter(Result::is_ok).count(), 2);
    }

    #[test]
    fn truncated_final_record() {
        let layout = layout();
        let mut stream = RecordStream::new(&layout, &b"01AA02"[..], DecodeOptions::default());
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.record_index, 1);
        assert!(matches!(
            err.kind,
            DecodeErrorKind::TruncatedRecord {
                expected: 4,
                actual: 2
            }
        ));
        assert!(stream.next().is_none());
        let summary = stream.summary();
        assert_eq!((summary.records_read, summary.records_decoded, summary.records_rejected), (2, 1, 1));
    }

    #[test]
    fn strict_stops_and_lenient_continues() {
        let layout = layout();
        let data = b"01AAXXBB03CC";
        let strict: Vec<_> = RecordStream::new(&layout, &data[..], DecodeOptions::default()).collect();
        assert_eq!(strict.len(), 2);
        assert!(strict[1].is_err());

        let lenient_opts = DecodeOptions {
            mode: Mode::Lenient,
            ..DecodeOptions::default()
        };
        let mut lenient = RecordStream::new(&layout, &data[..], lenient_opts);
        let results: Vec<_> = lenient.by_ref().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[1].is_err() && results[2].is_ok());
        assert_eq!(lenient.summary().records_rejected, 1);
    }

    #[test]
    fn stop_handle_ends_after_current_record() {
        let layout = layout();
        let stop = StopHandle::new();
        let mut stream =
            RecordStream::new(&layout, &b"01AA02BB03CC"[..], DecodeOptions::default()).with_stop_handle(stop.clone());
        assert!(stream.next().unwrap().is_ok());
        stop.stop();
        assert!(stream.next().is_none());
        let summary = stream.summary();
        assert!(summary.stopped_early);
        assert_eq!(summary.records_decoded, 1);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let layout = layout();
        let mut stream = RecordStream::new(&layout, std::io::empty(), DecodeOptions::default());
        assert!(stream.next().is_none());
        assert!(!stream.summary().stopped_early);
    }
}
