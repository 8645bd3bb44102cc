//! Strict quoting over the raw CSV byte stream.
//!
//! The `csv` tokenizer repairs stray quotes instead of rejecting them, so a
//! field such as `"Main" St` would load as `Main St`. [`StrictQuotes`] sits
//! between the member and the tokenizer, scans every byte as it passes, and
//! remembers the first quoting fault with its byte offset. The loader checks
//! that offset against the span of each record the tokenizer hands back.

use std::io::{self, Read};

use thiserror::Error;

const BYTE_ORDER_MARK: [u8; 3] = [0xef, 0xbb, 0xbf];

/// A quoting rule broken by the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuoteFault {
    /// A `"` inside a field that did not start with one.
    #[error("quote inside an unquoted field")]
    StrayQuote,

    /// Text between a closing quote and the next delimiter.
    #[error("text after a closing quote")]
    TextAfterQuote,

    /// A quoted field still open at end of input.
    #[error("quoted field is never closed")]
    Unterminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FaultAt {
    pub fault: QuoteFault,
    /// Byte offset of the offending quote or character.
    pub offset: u64,
    /// 1-based line of `offset`.
    pub line: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just saw a `"` inside a quoted field: either an escape or the close.
    QuoteInQuoted,
}

/// Pass-through reader recording the first quoting fault.
pub(crate) struct StrictQuotes<R> {
    inner: R,
    scan: Scan,
    offset: u64,
    line: u64,
    open_quote: (u64, u64),
    bom_seen: usize,
    fault: Option<FaultAt>,
}

impl<R: Read> StrictQuotes<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scan: Scan::FieldStart,
            offset: 0,
            line: 1,
            open_quote: (0, 1),
            bom_seen: 0,
            fault: None,
        }
    }

    /// The first fault at a byte offset below `end`, if any.
    pub fn fault_before(&self, end: u64) -> Option<FaultAt> {
        self.fault.filter(|at| at.offset < end)
    }

    /// The first fault anywhere in the input scanned so far.
    pub fn fault(&self) -> Option<FaultAt> {
        self.fault
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.fault.is_some() {
                return;
            }
            let in_bom = self.bom_seen < BYTE_ORDER_MARK.len()
                && self.bom_seen as u64 == self.offset
                && byte == BYTE_ORDER_MARK[self.bom_seen];
            if in_bom {
                self.bom_seen += 1;
                self.offset += 1;
                continue;
            }

            let at = self.offset;
            self.scan = match (self.scan, byte) {
                (Scan::Quoted, b'"') => Scan::QuoteInQuoted,
                (Scan::Quoted, _) => Scan::Quoted,
                (Scan::QuoteInQuoted, b'"') => Scan::Quoted,
                (_, b',' | b'\n' | b'\r') => Scan::FieldStart,
                (Scan::FieldStart, b'"') => {
                    self.open_quote = (at, self.line);
                    Scan::Quoted
                }
                (Scan::Unquoted, b'"') => {
                    self.record(QuoteFault::StrayQuote, at, self.line);
                    Scan::Unquoted
                }
                (Scan::QuoteInQuoted, _) => {
                    self.record(QuoteFault::TextAfterQuote, at, self.line);
                    Scan::Unquoted
                }
                (Scan::FieldStart | Scan::Unquoted, _) => Scan::Unquoted,
            };
            if byte == b'\n' {
                self.line += 1;
            }
            self.offset += 1;
        }
    }

    fn finish(&mut self) {
        if self.fault.is_none() && self.scan == Scan::Quoted {
            let (offset, line) = self.open_quote;
            self.record(QuoteFault::Unterminated, offset, line);
        }
    }

    fn record(&mut self, fault: QuoteFault, offset: u64, line: u64) {
        self.fault.get_or_insert(FaultAt {
            fault,
            offset,
            line,
        });
    }
}

impl<R: Read> Read for StrictQuotes<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let read = self.inner.read(buf)?;
        if read == 0 {
            self.finish();
        } else {
            self.scan(&buf[..read]);
        }
        Ok(read)
    }
}
