//! Armor decoder
//!
//! Scans a line-oriented text stream for armored envelopes and turns each
//! one into a [`Block`], verifying the embedded CRC-24 checksum.
//!
//! Delimiter lines are matched anywhere within a line, not only at column 0,
//! so `   -----END PGP MESSAGE-----` closes an envelope just like the
//! unindented form. Text outside envelopes is skipped.

use std::collections::BTreeMap;
use std::io::BufRead;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::{debug, trace, warn};

use crate::armor::{Block, BlockType};
use crate::crc24;
use crate::error::{ArmorError, ErrorCategory, ErrorKind, Result};

const DELIMITER_DASHES: &str = "-----";

/// Every recognized tag starts with this.
const TAG_PREFIX: &str = "PGP ";

/// Matcher for one kind of delimiter line, e.g. `-----BEGIN <TAG>-----`.
#[derive(Debug, Clone, Copy)]
struct Delimiter {
    prefix: &'static str,
}

impl Delimiter {
    const BEGIN: Delimiter = Delimiter {
        prefix: "-----BEGIN ",
    };
    const END: Delimiter = Delimiter { prefix: "-----END " };

    /// Returns the tag of the first well-formed delimiter anywhere in `line`.
    ///
    /// Tags are `PGP ` followed by upper-case ASCII letters and spaces.
    /// Delimiters of other armor kinds, such as PEM `CERTIFICATE` blocks,
    /// never match.
    fn tag<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.match_indices(self.prefix).find_map(|(index, prefix)| {
            let rest = &line[index + prefix.len()..];
            let tag = &rest[..rest.find(DELIMITER_DASHES)?];
            let well_formed = tag.strip_prefix(TAG_PREFIX).is_some_and(|name| {
                !name.is_empty() && name.bytes().all(|b| b.is_ascii_uppercase() || b == b' ')
            });
            well_formed.then_some(tag)
        })
    }
}

/// Splits an ASCII `key: value` header line at the first `": "`.
///
/// The value may be empty, the key may not.
fn parse_header(line: &str) -> Option<(&str, &str)> {
    if !line.is_ascii() {
        return None;
    }
    let (key, value) = line.split_once(": ")?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// An envelope whose opening delimiter has been seen.
struct Envelope {
    block_type: BlockType,
    headers: BTreeMap<String, String>,
}

impl Envelope {
    /// Decode the body and checksum line and verify one against the other.
    fn finish(self, body: &str, checksum_line: &str) -> Result<Block> {
        let contents = BASE64_STANDARD.decode(body).map_err(|e| {
            ArmorError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidBase64Body,
                format!("error decoding base64 body: {}", e),
                e,
            )
        })?;

        let encoded_checksum = checksum_line.strip_prefix('=').unwrap_or(checksum_line);
        let expected = BASE64_STANDARD.decode(encoded_checksum).map_err(|e| {
            ArmorError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidChecksumEncoding,
                format!("error decoding checksum: {}", e),
                e,
            )
        })?;

        let actual = crc24::compute(&contents);
        if expected[..] != actual[..] {
            let expected = hex::encode(&expected);
            let actual = hex::encode(actual);
            return Err(ArmorError::mismatch(
                ErrorKind::ChecksumMismatch,
                format!("checksum does not match: expected {}, got {}", expected, actual),
                expected,
                actual,
            ));
        }

        Ok(Block::from_parts(self.block_type, self.headers, contents))
    }
}

enum State {
    /// Outside any envelope, looking for an opening delimiter.
    Seeking,
    /// Reading `key: value` lines up to the first empty line.
    Headers(Envelope),
    /// Reading body lines. The most recent line is withheld in
    /// `pending_checksum_candidate` since it is the checksum if the next
    /// line turns out to be the closing delimiter.
    Body {
        envelope: Envelope,
        body_accumulator: String,
        pending_checksum_candidate: String,
    },
}

/// Armor decoder.
///
/// By default an envelope left open at end of input is dropped with a
/// warning. With [`Dearmorer::strict`] it is an `UnterminatedEnvelope` error.
#[derive(Debug, Clone)]
pub struct Dearmorer {
    begin: Delimiter,
    end: Delimiter,
    strict: bool,
}

impl Default for Dearmorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dearmorer {
    pub fn new() -> Self {
        Self {
            begin: Delimiter::BEGIN,
            end: Delimiter::END,
            strict: false,
        }
    }

    /// Fail instead of silently dropping an envelope cut off by end of input.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Decode every envelope in `input`, in the order they are closed.
    pub fn dearmor<R: BufRead>(&self, mut input: R) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut state = State::Seeking;
        let mut buf = Vec::new();

        while let Some(line) = next_line(&mut input, &mut buf)? {
            state = match state {
                State::Seeking => match self.begin.tag(&line) {
                    Some(tag) => {
                        let block_type = tag.parse::<BlockType>()?;
                        debug!("opening {} envelope", block_type);
                        State::Headers(Envelope {
                            block_type,
                            headers: BTreeMap::new(),
                        })
                    }
                    None => State::Seeking,
                },
                State::Headers(mut envelope) => {
                    if line.is_empty() {
                        State::Body {
                            envelope,
                            body_accumulator: String::new(),
                            pending_checksum_candidate: String::new(),
                        }
                    } else {
                        match parse_header(&line) {
                            Some((key, value)) => {
                                envelope.headers.insert(key.to_owned(), value.to_owned());
                            }
                            None => trace!("ignoring non-header line in header section"),
                        }
                        State::Headers(envelope)
                    }
                }
                State::Body {
                    envelope,
                    mut body_accumulator,
                    pending_checksum_candidate,
                } => {
                    if let Some(tag) = self.end.tag(&line) {
                        let expected = envelope.block_type.as_str();
                        if tag != expected {
                            return Err(ArmorError::mismatch(
                                ErrorKind::ClosingTypeMismatch,
                                format!(
                                    "closing block type does not match: expected {}, received {}",
                                    expected, tag
                                ),
                                expected,
                                tag,
                            ));
                        }
                        let block =
                            envelope.finish(&body_accumulator, &pending_checksum_candidate)?;
                        debug!(
                            "accepted {} block with {} bytes",
                            block.block_type(),
                            block.contents().len()
                        );
                        blocks.push(block);
                        State::Seeking
                    } else {
                        body_accumulator.push_str(&pending_checksum_candidate);
                        State::Body {
                            envelope,
                            body_accumulator,
                            pending_checksum_candidate: line,
                        }
                    }
                }
            };
        }

        match state {
            State::Seeking => {}
            State::Headers(envelope) | State::Body { envelope, .. } => {
                if self.strict {
                    return Err(ArmorError::with_kind(
                        ErrorCategory::User,
                        ErrorKind::UnterminatedEnvelope,
                        format!("input ended inside {} envelope", envelope.block_type),
                    ));
                }
                warn!(
                    "dropping unterminated {} envelope at end of input",
                    envelope.block_type
                );
            }
        }

        Ok(blocks)
    }

    pub fn dearmor_str(&self, input: &str) -> Result<Vec<Block>> {
        self.dearmor(input.as_bytes())
    }
}

/// Decode every envelope in `input` with the default (lenient) decoder.
pub fn dearmor<R: BufRead>(input: R) -> Result<Vec<Block>> {
    Dearmorer::new().dearmor(input)
}

/// Decode every envelope in `input` with the default (lenient) decoder.
pub fn dearmor_str(input: &str) -> Result<Vec<Block>> {
    Dearmorer::new().dearmor_str(input)
}

/// Reads one line without its `\n` or `\r\n` terminator.
fn next_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
    buf.clear();
    let read = input.read_until(b'\n', buf).map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Read,
            format!("error reading armored input: {}", e),
            e,
        )
    })?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    let line = String::from_utf8(buf.clone()).map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Read,
            "armored input is not valid UTF-8",
            e,
        )
    })?;
    Ok(Some(line))
}
