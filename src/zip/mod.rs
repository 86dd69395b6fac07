//! In-memory ZIP archive creation.
//!
//! This module assembles archives byte-for-byte without an archive library.
//!
//! ## Architecture
//!
//! - [`crc`]: table-driven CRC-32 over payload bytes
//! - [`encode`]: little-endian packing and buffer concatenation
//! - [`structures`]: local header, central directory header and end record layouts
//! - [`writer`]: offset bookkeeping and 16/32-bit limit checks
//! - [`builder`]: fetches URLs one by one and feeds them to the writer
//!
//! ## Produced Format
//!
//! A ZIP file consists of:
//! 1. Local file headers (30 bytes + name) each followed by raw payload
//! 2. Central Directory with one 46-byte header (+ name) per entry
//! 3. End of Central Directory (EOCD) record, 22 bytes
//!
//! Every entry uses the STORED method, with zero timestamps, no extra fields
//! and no comments.
//!
//! ## Limitations
//!
//! - No compression
//! - No ZIP64: payloads, offsets and the central directory must stay below 4 GiB
//! - At most 65535 entries
//! - No directory entries or encryption

mod builder;
mod crc;
mod encode;
mod structures;
mod writer;

pub use builder::{ArchiveBuilder, ArchiveRequest, ArchiveResult, DEFAULT_KIND, Progress};
pub use crc::crc32;
pub use encode::{concat, u16_le, u32_le};
pub use structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
pub use writer::ArchiveWriter;
