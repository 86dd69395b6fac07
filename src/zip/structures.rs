use super::encode::{concat, u16_le, u32_le};

/// "Version needed to extract" / "version made by": 2.0, plain stored files
pub const VERSION: u16 = 20;

/// Compression method 0: payload embedded byte-for-byte
pub const METHOD_STORED: u16 = 0;

/// Local File Header (LFH) - 30 bytes + file name
pub struct LocalFileHeader<'a> {
    pub crc32: u32,
    pub size: u32,
    pub file_name: &'a [u8],
}

impl LocalFileHeader<'_> {
    pub const SIGNATURE: u32 = 0x04034b50;
    pub const SIZE: usize = 30;

    /// Encoded length including the file name.
    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        concat(&[
            &u32_le(Self::SIGNATURE)[..],
            &u16_le(VERSION),
            &u16_le(0), // flags
            &u16_le(METHOD_STORED),
            &u16_le(0), // mod time
            &u16_le(0), // mod date
            &u32_le(self.crc32),
            &u32_le(self.size), // compressed
            &u32_le(self.size), // uncompressed
            &u16_le(self.file_name.len() as u16),
            &u16_le(0), // extra field length
            self.file_name,
        ])
    }
}

/// Central Directory File Header (CDFH) - 46 bytes + file name
pub struct CentralDirectoryHeader<'a> {
    pub crc32: u32,
    pub size: u32,
    pub lfh_offset: u32,
    pub file_name: &'a [u8],
}

impl CentralDirectoryHeader<'_> {
    pub const SIGNATURE: u32 = 0x02014b50;
    pub const SIZE: usize = 46;

    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        concat(&[
            &u32_le(Self::SIGNATURE)[..],
            &u16_le(VERSION), // made by
            &u16_le(VERSION), // needed
            &u16_le(0),       // flags
            &u16_le(METHOD_STORED),
            &u16_le(0), // mod time
            &u16_le(0), // mod date
            &u32_le(self.crc32),
            &u32_le(self.size),
            &u32_le(self.size),
            &u16_le(self.file_name.len() as u16),
            &u16_le(0), // extra field length
            &u16_le(0), // comment length
            &u16_le(0), // disk number start
            &u16_le(0), // internal attributes
            &u32_le(0), // external attributes
            &u32_le(self.lfh_offset),
            self.file_name,
        ])
    }
}

/// End of Central Directory (EOCD) - 22 bytes, no comment
pub struct EndOfCentralDirectory {
    pub entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const SIZE: usize = 22;

    pub fn to_bytes(&self) -> Vec<u8> {
        concat(&[
            &u32_le(Self::SIGNATURE)[..],
            &u16_le(0), // this disk
            &u16_le(0), // disk with central directory
            &u16_le(self.entries),
            &u16_le(self.entries),
            &u32_le(self.cd_size),
            &u32_le(self.cd_offset),
            &u16_le(0), // comment length
        ])
    }
}
