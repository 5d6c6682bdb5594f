//! pgparmor - OpenPGP-style ASCII armor with CRC-24 checksums

#![forbid(unsafe_code)]

pub mod armor;
pub mod crc24;
pub mod dearmor;
pub mod error;
pub mod file_ops;

pub use armor::{Block, BlockType, armor, write_armored};
pub use dearmor::{Dearmorer, dearmor, dearmor_str};
pub use error::{ArmorError, ErrorCategory, ErrorKind, Mismatch, Result};
