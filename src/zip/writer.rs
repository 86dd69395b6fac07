//! In-memory assembly of a stored (uncompressed) ZIP archive.

use crate::error::EntryError;

use super::crc::crc32;
use super::encode::concat;
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};

/// Accumulates local records and central directory records in entry order.
///
/// `offset` is the byte position where the next local record will start,
/// which is also the total length of every local record added so far.
#[derive(Default)]
pub struct ArchiveWriter {
    local_records: Vec<Vec<u8>>,
    central_records: Vec<Vec<u8>>,
    offset: u32,
    cd_size: u32,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.central_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central_records.is_empty()
    }

    /// Append one file.
    ///
    /// The entry is validated against every 16/32-bit field it touches before
    /// anything is written, so a rejected entry leaves the archive unchanged.
    pub fn add_entry(&mut self, file_name: &str, data: &[u8]) -> Result<u32, EntryError> {
        let name = file_name.as_bytes();
        if name.len() > u16::MAX as usize {
            return Err(EntryError::NameTooLong { len: name.len() });
        }
        let size =
            u32::try_from(data.len()).map_err(|_| EntryError::PayloadTooLarge { size: data.len() })?;
        if self.central_records.len() >= u16::MAX as usize {
            return Err(EntryError::TooManyEntries);
        }

        let local = LocalFileHeader {
            crc32: crc32(data),
            size,
            file_name: name,
        };
        let central = CentralDirectoryHeader {
            crc32: local.crc32,
            size,
            lfh_offset: self.offset,
            file_name: name,
        };

        let record_len = u32::try_from(local.encoded_len())
            .ok()
            .and_then(|header| header.checked_add(size))
            .ok_or(EntryError::ArchiveFull)?;
        let next_offset = self
            .offset
            .checked_add(record_len)
            .ok_or(EntryError::ArchiveFull)?;
        let next_cd_size = u32::try_from(central.encoded_len())
            .ok()
            .and_then(|len| self.cd_size.checked_add(len))
            .ok_or(EntryError::ArchiveFull)?;
        // EOCD stores both the central directory start and its size as u32
        next_offset
            .checked_add(next_cd_size)
            .ok_or(EntryError::ArchiveFull)?;

        let mut record = local.to_bytes();
        record.extend_from_slice(data);
        self.local_records.push(record);
        self.central_records.push(central.to_bytes());

        let lfh_offset = self.offset;
        self.offset = next_offset;
        self.cd_size = next_cd_size;
        Ok(lfh_offset)
    }

    /// Concatenate local records, central directory and end record.
    pub fn finish(self) -> Vec<u8> {
        let eocd = EndOfCentralDirectory {
            entries: self.central_records.len() as u16,
            cd_size: self.cd_size,
            cd_offset: self.offset,
        };

        let mut out = concat(&self.local_records);
        out.extend_from_slice(&concat(&self.central_records));
        out.extend_from_slice(&eocd.to_bytes());
        out
    }
}
