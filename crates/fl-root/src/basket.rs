//! Basket (compressed data block) reading for TTree branches.

use crate::decompress::decompress;
use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Read and decompress a single basket from the file.
///
/// Returns the decompressed payload (big-endian encoded values).
pub fn read_basket_data(
    file_data: &[u8],
    seek: u64,
    is_large: bool,
) -> Result<Vec<u8>> {
    let pos = seek as usize;
    if pos >= file_data.len() {
        return Err(RootError::BufferUnderflow {
            offset: pos,
            need: 1,
            have: 0,
        });
    }

    // Read the TKey header for this basket
    let mut r = RBuffer::new(file_data);
    r.set_pos(pos);
    let key = Key::read(&mut r, is_large)?;

    let key_end = pos + key.n_bytes as usize;
    if key_end > file_data.len() {
        return Err(RootError::BufferUnderflow {
            offset: pos,
            need: key.n_bytes as usize,
            have: file_data.len() - pos,
        });
    }

    let obj_start = pos + key.key_len as usize;
    let compressed_data = &file_data[obj_start..key_end];
    let compressed_len = key.n_bytes as usize - key.key_len as usize;

    if key.obj_len as usize != compressed_len {
        // Compressed — decompress
        let full = decompress(compressed_data, key.obj_len as usize)?;
        // The decompressed payload may contain entry offsets at the end.
        // For fixed-size leaf types, it's just flat big-endian data.
        // We return the full payload and let the caller decide.
        Ok(full)
    } else {
        // Uncompressed
        Ok(compressed_data.to_vec())
    }
}
