//! TKey parsing. Every object in a ROOT file sits behind one of these
//! records; trees and baskets are both resolved through them.

use crate::error::Result;
use crate::rbuffer::RBuffer;

/// A parsed TKey record, trimmed to the fields the reader consumes.
#[derive(Debug, Clone)]
pub struct Key {
    /// Total bytes of key header plus (possibly compressed) object.
    pub n_bytes: u32,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header itself.
    pub key_len: u16,
    /// Cycle number. Bare-name lookups resolve to the highest cycle;
    /// `name;cycle` lookups match it exactly.
    pub cycle: u16,
    /// Absolute file position of this key.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
}

/// Public info about a key, as returned by `RootFile::list_keys`.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class name (e.g. "TTree", "TDirectoryFile").
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl KeyInfo {
    /// Create from an internal Key.
    pub fn from_key(key: &Key) -> Self {
        Self {
            name: key.name.clone(),
            class_name: key.class_name.clone(),
            cycle: key.cycle,
        }
    }
}

impl Key {
    /// Read a TKey at the buffer's current position.
    ///
    /// Keys written past the 2 GiB mark carry `version > 1000` and store
    /// 64-bit seeks; `is_large` forces the wide layout when the file header
    /// has already switched to 64-bit offsets.
    pub fn read(r: &mut RBuffer, is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        r.skip(4)?; // datime
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let wide = version > 1000 || is_large;
        let seek_key = if wide { r.read_u64()? } else { r.read_u32()? as u64 };
        r.skip(if wide { 8 } else { 4 })?; // seek_pdir

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let _title = r.read_string()?;

        Ok(Key {
            n_bytes,
            obj_len,
            key_len,
            cycle,
            seek_key,
            class_name,
            name,
        })
    }
}
