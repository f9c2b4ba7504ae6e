//! TFile header parsing and top-level ROOT file interface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::branch_reader::{BranchReader, ColumnData, JaggedCol};
use crate::datasource::DataSource;
use crate::decompress::decompress;
use crate::directory::Directory;
use crate::error::{Result, RootError};
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;
use crate::tree::Tree;

/// Parsed ROOT file header.
#[allow(dead_code)]
struct FileHeader {
    /// Offset of first data record (also where top-level TKey sits).
    begin: u64,
    /// Whether the file uses large (64-bit) seek pointers (version >= 1000000).
    is_large: bool,
    /// Number of bytes for the name record (TKey + TNamed) at begin.
    nbytes_name: u32,
    /// Offset where top-level directory keys are stored.
    seek_keys: u64,
    /// Number of bytes in the key list.
    nbytes_keys: u32,
}

/// A ROOT file opened for reading trees.
pub struct RootFile {
    /// Raw file bytes (owned or memory-mapped).
    data: DataSource,
    /// Parsed header.
    header: FileHeader,
    /// Path for diagnostics.
    #[allow(dead_code)]
    path: PathBuf,
}

const ROOT_MAGIC: &[u8; 4] = b"root";

impl RootFile {
    /// Open and parse a ROOT file from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        // SAFETY: We only read the file, and rely on the OS to handle
        // concurrent modifications (which is UB for mmap but acceptable
        // for our read-only scientific-data use case).
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        let data = DataSource::Mmap(mmap);
        Self::from_datasource(data, path)
    }

    /// Parse a ROOT file from a byte vector (for testing).
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::Owned(data), path)
    }

    /// Internal constructor from any DataSource.
    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < 64 {
            return Err(RootError::BadMagic);
        }
        if &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }

        let header = Self::parse_header(&data)?;
        Ok(Self { data, header, path })
    }

    /// Parse the file-level header (first ~63 bytes) and the embedded TDirectory.
    ///
    /// ROOT file header layout (small file, version < 1000000):
    /// ```text
    /// offset  size  field
    ///    0      4   magic "root"
    ///    4      4   fVersion
    ///    8      4   fBEGIN
    ///   12      4   fEND
    ///   16      4   fSeekFree
    ///   20      4   fNbytesFree
    ///   24      4   nfree
    ///   28      4   fNbytesName
    ///   32      1   fUnits
    ///   33      4   fCompress
    ///   37      4   fSeekInfo
    ///   41      4   fNbytesInfo
    ///   45     18   fUUID
    ///   63         (end of file header)
    /// ```
    ///
    /// The TDirectory streamer is located at `fBEGIN + fNbytesName`.
    fn parse_header(data: &[u8]) -> Result<FileHeader> {
        let mut r = RBuffer::new(data);
        r.skip(4)?; // magic

        let version = r.read_u32()?;
        let is_large = version >= 1_000_000;

        let begin = r.read_u32()? as u64;

        if is_large {
            let _end = r.read_u64()?;
            let _seek_free = r.read_u64()?;
        } else {
            let _end = r.read_u32()?;
            let _seek_free = r.read_u32()?;
        }
        let _nbytes_free = r.read_u32()?;
        let _nfree = r.read_u32()?;
        let nbytes_name = r.read_u32()?;
        let _units = r.read_u8()?;
        let _compress = r.read_u32()?;
        if is_large {
            let _seek_info = r.read_u64()?;
        } else {
            let _seek_info = r.read_u32()?;
        }
        let _nbytes_info = r.read_u32()?;
        // 18-byte UUID follows — skip it

        // Parse the top-level TDirectory located at fBEGIN + fNbytesName.
        let (seek_keys, nbytes_keys) =
            Self::parse_top_directory(data, begin as usize, nbytes_name as usize, is_large)?;

        Ok(FileHeader { begin, is_large, nbytes_name, seek_keys, nbytes_keys })
    }

    /// Parse the TDirectory streamer at `begin + nbytes_name` to extract seek_keys.
    fn parse_top_directory(
        data: &[u8],
        begin: usize,
        nbytes_name: usize,
        _is_large: bool,
    ) -> Result<(u64, u32)> {
        let dir_offset = begin + nbytes_name;
        if dir_offset >= data.len() {
            return Err(RootError::Deserialization("TDirectory offset past end of file".into()));
        }

        let mut r = RBuffer::new(data);
        r.set_pos(dir_offset);

        let dir_version = r.read_u16()?;
        let _datime_c = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;

        let is_dir_large = dir_version > 1000;

        if is_dir_large {
            let _seek_dir = r.read_u64()?;
            let _seek_parent = r.read_u64()?;
            let seek_keys = r.read_u64()?;
            Ok((seek_keys, nbytes_keys))
        } else {
            let _seek_dir = r.read_u32()? as u64;
            let _seek_parent = r.read_u32()? as u64;
            let seek_keys = r.read_u32()? as u64;
            Ok((seek_keys, nbytes_keys))
        }
    }

    /// List all keys in the top-level directory.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        let dir = self.read_top_directory()?;
        Ok(dir.keys().iter().map(KeyInfo::from_key).collect())
    }

    fn read_top_directory(&self) -> Result<Directory> {
        Directory::read_key_list(
            &self.data,
            self.header.seek_keys as usize,
            self.header.nbytes_keys as usize,
            self.header.is_large,
        )
    }

    /// Read and decompress the payload of a TKey.
    pub(crate) fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        read_key_payload_from(&self.data, key)
    }

    /// Access the raw file data.
    pub fn file_data(&self) -> &[u8] {
        &self.data
    }

    /// Whether file uses 64-bit seek pointers.
    pub fn is_large(&self) -> bool {
        self.header.is_large
    }

    // ── TTree API ──────────────────────────────────────────────

    /// Read a TTree by name from the top-level directory.
    ///
    /// Accepts either a bare name (`"mini"`, resolving to the highest cycle)
    /// or a name with an explicit cycle (`"mini;1"`).
    pub fn get_tree(&self, name: &str) -> Result<Tree> {
        let dir = self.read_top_directory()?;
        let (base, cycle) = split_cycle(name);
        let key = match cycle {
            Some(c) => dir.find_key_cycle(base, c),
            None => dir.find_key(base),
        }
        .ok_or_else(|| RootError::TreeNotFound(name.to_string()))?;

        if key.class_name != "TTree" {
            return Err(RootError::TreeNotFound(format!(
                "'{}' is {} not TTree",
                name, key.class_name
            )));
        }

        let payload = self.read_key_payload(key)?;
        objects::read_ttree(&payload)
    }

    /// Create a [`BranchReader`] for the named branch.
    pub fn branch_reader<'a>(&'a self, tree: &'a Tree, branch: &str) -> Result<BranchReader<'a>> {
        let info = tree
            .find_branch(branch)
            .ok_or_else(|| RootError::BranchNotFound(branch.to_string()))?;
        Ok(BranchReader::new(&self.data, info, self.header.is_large))
    }

    /// Convenience: read all entries from a scalar branch as `f64`.
    pub fn branch_data(&self, tree: &Tree, branch: &str) -> Result<Vec<f64>> {
        self.branch_reader(tree, branch)?.as_f64()
    }

    /// Read a branch as a jagged (variable-length) column.
    pub fn branch_data_jagged(&self, tree: &Tree, branch: &str) -> Result<JaggedCol> {
        self.branch_reader(tree, branch)?.as_jagged_f64()
    }

    /// Read a branch with its shape classified from metadata.
    pub fn branch_column(&self, tree: &Tree, branch: &str) -> Result<ColumnData> {
        self.branch_reader(tree, branch)?.read_column()
    }
}

/// Split a `"name;cycle"` object path into base name and explicit cycle.
///
/// Anything that does not parse as a cycle number is treated as part of
/// the name.
fn split_cycle(name: &str) -> (&str, Option<u16>) {
    match name.rsplit_once(';') {
        Some((base, cycle)) if !base.is_empty() => match cycle.parse::<u16>() {
            Ok(c) => (base, Some(c)),
            Err(_) => (name, None),
        },
        _ => (name, None),
    }
}

/// Read and decompress the payload of a TKey from raw file bytes.
pub(crate) fn read_key_payload_from(data: &[u8], key: &Key) -> Result<Vec<u8>> {
    let seek = key.seek_key as usize;
    if seek + key.n_bytes as usize > data.len() {
        return Err(RootError::BufferUnderflow {
            offset: seek,
            need: key.n_bytes as usize,
            have: data.len().saturating_sub(seek),
        });
    }

    let key_slice = &data[seek..seek + key.n_bytes as usize];

    // Object data starts after the key header.
    let obj_start = key.key_len as usize;
    let compressed_data = &key_slice[obj_start..];

    let compressed_len = key.n_bytes as usize - key.key_len as usize;
    if key.obj_len as usize != compressed_len {
        // Data is compressed
        decompress(compressed_data, key.obj_len as usize)
    } else {
        // Data is uncompressed
        Ok(compressed_data.to_vec())
    }
}
