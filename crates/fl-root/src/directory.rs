//! Top-level directory navigation: the key list and name/cycle lookup.

use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// The parsed key list of a directory, in file order.
#[derive(Debug, Clone)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Parse the key list stored at `seek_keys`.
    ///
    /// On disk this is a TKey wrapping the list itself, then a u32 count,
    /// then that many TKey records. The wrapper's `key_len` locates the
    /// count, so string padding inside the wrapper cannot shift the parse.
    pub fn read_key_list(
        file_data: &[u8],
        seek_keys: usize,
        nbytes_keys: usize,
        is_large: bool,
    ) -> Result<Self> {
        if seek_keys + nbytes_keys > file_data.len() {
            return Err(RootError::BufferUnderflow {
                offset: seek_keys,
                need: nbytes_keys,
                have: file_data.len().saturating_sub(seek_keys),
            });
        }

        let mut r = RBuffer::new(file_data);
        r.set_pos(seek_keys);
        let list_key = Key::read(&mut r, is_large)?;
        r.set_pos(seek_keys + list_key.key_len as usize);

        let nkeys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(nkeys);
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, is_large)?);
        }

        Ok(Directory { keys })
    }

    /// All keys, in file order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Find a key by bare name, resolving to the highest cycle.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys
            .iter()
            .filter(|k| k.name == name)
            .max_by_key(|k| k.cycle)
    }

    /// Find a key by name and exact cycle number.
    pub fn find_key_cycle(&self, name: &str, cycle: u16) -> Option<&Key> {
        self.keys.iter().find(|k| k.name == name && k.cycle == cycle)
    }
}
