//! Armored blocks and the armor encoder
//!
//! An armored block is a binary payload wrapped in a textual envelope:
//!
//! ```text
//! -----BEGIN PGP MESSAGE-----
//! Version: OpenPrivacy 0.99
//!
//! yDgBO22WxBHv7O8X7O/jygAEzol56iUKiXmV+XmpCtmpqQUKiQrFqclFqUDBovzS
//! vBSFjNSiVHsuAA==
//! =njUN
//! -----END PGP MESSAGE-----
//! ```
//!
//! The body is standard padded base64 wrapped at 64 characters per line and
//! is followed by the base64 of the CRC-24 of the raw payload.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::crc24;
use crate::error::{ArmorError, ErrorCategory, ErrorKind, Result};

/// Maximum number of base64 characters per body line
pub const MAX_LINE_LEN: usize = 64;

/// The purpose of an armored block, named by its delimiter lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Message,
    PublicKey,
    PrivateKey,
    Signature,
}

impl BlockType {
    /// The tag as it appears between `-----BEGIN ` and `-----`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Message => "PGP MESSAGE",
            BlockType::PublicKey => "PGP PUBLIC KEY",
            BlockType::PrivateKey => "PGP PRIVATE KEY",
            BlockType::Signature => "PGP SIGNATURE",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ArmorError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "PGP MESSAGE" => Ok(BlockType::Message),
            "PGP PUBLIC KEY" => Ok(BlockType::PublicKey),
            "PGP PRIVATE KEY" => Ok(BlockType::PrivateKey),
            "PGP SIGNATURE" => Ok(BlockType::Signature),
            other => Err(ArmorError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnsupportedBlockType,
                format!("unsupported block type: {}", other),
            )),
        }
    }
}

/// One armored unit: a typed binary payload plus its header metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    block_type: BlockType,
    headers: BTreeMap<String, String>,
    contents: Vec<u8>,
}

impl Block {
    pub fn new(block_type: BlockType, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            block_type,
            headers: BTreeMap::new(),
            contents: contents.into(),
        }
    }

    /// Adds a header, replacing any earlier value for the same key.
    ///
    /// Keys and values are printable ASCII. The key must be non-empty and
    /// must not contain `": "`, so the header line splits back into the same
    /// pair when dearmored. The value may be empty.
    pub fn with_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into();
        let value = value.into();
        let printable = |s: &str| s.bytes().all(|b| b.is_ascii() && !b.is_ascii_control());
        if key.is_empty() || key.contains(": ") || !printable(&key) || !printable(&value) {
            return Err(ArmorError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidHeader,
                format!("invalid header {:?}: {:?}", key, value),
            ));
        }
        self.headers.insert(key, value);
        Ok(self)
    }

    pub(crate) fn from_parts(
        block_type: BlockType,
        headers: BTreeMap<String, String>,
        contents: Vec<u8>,
    ) -> Self {
        Self {
            block_type,
            headers,
            contents,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Render this block as a complete textual envelope.
    pub fn armored(&self) -> String {
        let mut out = String::new();
        self.armor_into(&mut out);
        out
    }

    fn armor_into(&self, out: &mut String) {
        out.push_str("-----BEGIN ");
        out.push_str(self.block_type.as_str());
        out.push_str("-----\n");

        // BTreeMap iteration is already in ascending key order.
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');

        // An empty payload still produces one (empty) body line.
        let encoded = BASE64_STANDARD.encode(&self.contents);
        let mut rest = encoded.as_str();
        loop {
            let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LEN));
            out.push_str(line);
            out.push('\n');
            rest = tail;
            if rest.is_empty() {
                break;
            }
        }

        out.push('=');
        out.push_str(&BASE64_STANDARD.encode(crc24::compute(&self.contents)));
        out.push('\n');

        out.push_str("-----END ");
        out.push_str(self.block_type.as_str());
        out.push_str("-----\n");
    }
}

/// Armor a sequence of blocks into one string, envelopes back to back.
pub fn armor(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        block.armor_into(&mut out);
    }
    out
}

/// Armor a sequence of blocks into `output`.
///
/// On error the sink may hold a partial envelope; callers must discard it.
pub fn write_armored<W: Write + ?Sized>(output: &mut W, blocks: &[Block]) -> Result<()> {
    for block in blocks {
        output.write_all(block.armored().as_bytes()).map_err(|e| {
            ArmorError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Write,
                format!("failed to write {} block", block.block_type),
                e,
            )
        })?;
    }
    output.flush().map_err(|e| {
        ArmorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Write,
            "failed to flush armored output",
            e,
        )
    })?;
    Ok(())
}
