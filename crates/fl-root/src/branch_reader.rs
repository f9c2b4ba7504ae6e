//! Column-oriented data extraction from TTree branches.

use crate::basket::read_basket_data;
use crate::error::{Result, RootError};
use crate::tree::{BranchInfo, LeafType};

/// A jagged (variable-length) column: flat values + per-entry offsets.
///
/// `offsets` has length `n_entries + 1`. Entry `i` has values
/// `flat[offsets[i]..offsets[i+1]]`.
#[derive(Debug, Clone)]
pub struct JaggedCol {
    /// Flat array of all values across all entries.
    pub flat: Vec<f64>,
    /// Entry boundaries: `offsets.len() == n_entries + 1`.
    pub offsets: Vec<usize>,
}

impl JaggedCol {
    /// Values of entry `row` as a slice.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.flat[self.offsets[row]..self.offsets[row + 1]]
    }

    /// Number of entries.
    pub fn n_entries(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

/// Shape-classified data from a full branch read.
///
/// The shape is decided from branch metadata (offset tables, container
/// class), never from the decoded values.
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// One value per entry.
    Scalar(Vec<f64>),
    /// Variable-length values per entry.
    Jagged(JaggedCol),
}

impl ColumnData {
    /// Number of entries in the column.
    pub fn n_entries(&self) -> usize {
        match self {
            ColumnData::Scalar(v) => v.len(),
            ColumnData::Jagged(j) => j.n_entries(),
        }
    }
}

/// Reader for extracting column data from a TTree branch.
pub struct BranchReader<'a> {
    file_data: &'a [u8],
    branch: &'a BranchInfo,
    is_large: bool,
}

impl<'a> BranchReader<'a> {
    /// Create a new branch reader.
    pub fn new(file_data: &'a [u8], branch: &'a BranchInfo, is_large: bool) -> Self {
        Self { file_data, branch, is_large }
    }

    fn elem_type(&self) -> Result<LeafType> {
        self.branch.leaf_type.ok_or_else(|| {
            RootError::TypeMismatch(format!(
                "branch '{}' has unknown element type",
                self.branch.name
            ))
        })
    }

    /// Read all entries as `f64`, converting from the native type.
    ///
    /// Only valid for scalar branches (one value per entry).
    pub fn as_f64(&self) -> Result<Vec<f64>> {
        if self.branch.is_jagged() {
            return Err(RootError::TypeMismatch(format!(
                "scalar read of variable-length branch '{}'",
                self.branch.name
            )));
        }
        let raw_baskets = self.read_all_baskets()?;
        decode_as_f64(&raw_baskets, self.elem_type()?)
    }

    /// Read all entries as a jagged column (variable-length per entry).
    ///
    /// Branches with entry-offset tables decode via the offset table; unsplit
    /// `std::vector<T>` branches without one use the length-prefixed layout.
    /// For fixed-size arrays, all entries will have the same length.
    pub fn as_jagged_f64(&self) -> Result<JaggedCol> {
        if self.branch.entry_offset_len == 0 {
            let entries = self.branch.entries as usize;
            if entries == 0 {
                return Ok(JaggedCol { flat: Vec::new(), offsets: vec![0] });
            }

            // Unsplit std::vector<T> branches (TBranchElement without offset table).
            let raw_baskets = self.read_all_baskets()?;
            if let Some(j) = try_decode_unsplit_vector_jagged_all_baskets(
                &raw_baskets,
                &self.branch.basket_entry,
                self.branch.entries,
                self.branch.leaf_type,
            )? {
                return Ok(j);
            }

            // Fixed-size array — synthesize offsets
            let flat = decode_as_f64(&raw_baskets, self.elem_type()?)?;
            let elem_per_entry = if flat.len() == entries {
                1
            } else {
                if !flat.len().is_multiple_of(entries) {
                    return Err(RootError::Deserialization(format!(
                        "branch '{}' decoded to {} values, not divisible by entries={}",
                        self.branch.name,
                        flat.len(),
                        entries
                    )));
                }
                flat.len() / entries
            };
            let mut offsets = Vec::with_capacity(entries + 1);
            for i in 0..=entries {
                offsets.push(i * elem_per_entry);
            }
            return Ok(JaggedCol { flat, offsets });
        }

        let elem_type = self.elem_type()?;
        let raw_baskets = self.read_all_baskets()?;
        let mut flat = Vec::new();
        let mut offsets = vec![0usize];

        for (i, payload) in raw_baskets.iter().enumerate() {
            let n_entries = basket_n_entries(&self.branch.basket_entry, self.branch.entries, i);
            if n_entries == 0 {
                continue;
            }
            decode_jagged_from_payload(payload, elem_type, n_entries, &mut flat, &mut offsets)?;
        }

        Ok(JaggedCol { flat, offsets })
    }

    /// Read the whole branch, classifying its shape from metadata.
    ///
    /// Branches with offset tables or a container class come back `Jagged`;
    /// plain branches whose value count equals the entry count come back
    /// `Scalar`; fixed-size array leaves come back as uniform `Jagged`.
    pub fn read_column(&self) -> Result<ColumnData> {
        if self.branch.is_jagged() {
            return Ok(ColumnData::Jagged(self.as_jagged_f64()?));
        }

        let entries = self.branch.entries as usize;
        let raw_baskets = self.read_all_baskets()?;
        let flat = decode_as_f64(&raw_baskets, self.elem_type()?)?;

        if flat.len() == entries {
            return Ok(ColumnData::Scalar(flat));
        }
        if entries > 0 && flat.len().is_multiple_of(entries) {
            let elem_per_entry = flat.len() / entries;
            let offsets = (0..=entries).map(|i| i * elem_per_entry).collect();
            return Ok(ColumnData::Jagged(JaggedCol { flat, offsets }));
        }
        Err(RootError::Deserialization(format!(
            "branch '{}' decoded to {} values for {} entries",
            self.branch.name,
            flat.len(),
            entries
        )))
    }

    /// Read and decompress all baskets sequentially.
    fn read_all_baskets(&self) -> Result<Vec<Vec<u8>>> {
        let mut baskets = Vec::with_capacity(self.branch.n_baskets);
        for i in 0..self.branch.n_baskets {
            let data = read_basket_data(self.file_data, self.branch.basket_seek[i], self.is_large)?;
            baskets.push(data);
        }
        Ok(baskets)
    }
}

// ── Decoding big-endian baskets to typed arrays ────────────────

/// Decode all elements of each entry into flat + offsets for jagged columns.
///
/// `TBasket::WriteBuffer` appends the entry-offset table after the data:
/// ```text
/// [data bytes...][count: u32 = n_entries][offset_0 .. offset_{n-1}]
/// ```
/// Offset words are 4-byte big-endian and absolute within the basket buffer
/// (they include the key length), so `offset_0` is the data base. The end of
/// the last entry is not streamed; it is the data length itself.
fn decode_jagged_from_payload(
    payload: &[u8],
    leaf_type: LeafType,
    n_entries: usize,
    flat: &mut Vec<f64>,
    offsets: &mut Vec<usize>,
) -> Result<()> {
    let tail_bytes = (4usize)
        .checked_add(
            n_entries
                .checked_mul(4)
                .ok_or_else(|| RootError::Deserialization("offset table size overflow".into()))?,
        )
        .ok_or_else(|| RootError::Deserialization("offset table size overflow".into()))?;
    if payload.len() < tail_bytes {
        return Err(RootError::Deserialization(format!(
            "basket payload too small for offset table: have {} need {}",
            payload.len(),
            tail_bytes
        )));
    }

    let data_end = payload.len() - tail_bytes;
    let data = &payload[..data_end];
    let tail = &payload[data_end..];

    let count = u32::from_be_bytes(tail[..4].try_into().unwrap()) as usize;
    if count != n_entries {
        return Err(RootError::Deserialization(format!(
            "unexpected entry-offset count word: got {} want {}",
            count, n_entries
        )));
    }

    let mut entry_offsets: Vec<usize> = Vec::with_capacity(n_entries + 1);
    for i in 0..n_entries {
        let start = 4 + 4 * i;
        let end = start + 4;
        entry_offsets.push(u32::from_be_bytes(tail[start..end].try_into().unwrap()) as usize);
    }

    let base = entry_offsets[0];
    entry_offsets.push(
        base.checked_add(data.len())
            .ok_or_else(|| RootError::Deserialization("basket data end overflow".into()))?,
    );
    let elem_size = leaf_type.byte_size();

    // Unsplit container entries are streamed with a 10-byte vector header,
    // so their chunk lengths are not multiples of the element size.
    let mut assume_root_streamed_vector = false;
    if elem_size > 1 {
        for i in 0..n_entries {
            let start = entry_offsets[i].saturating_sub(base);
            let end = entry_offsets[i + 1].saturating_sub(base);
            if end > data.len() || start > end {
                return Err(RootError::Deserialization(format!(
                    "invalid entry offsets in basket: start={start} end={end} data_len={}",
                    data.len()
                )));
            }
            if !(end - start).is_multiple_of(elem_size) {
                assume_root_streamed_vector = true;
                break;
            }
        }
    } else {
        // `elem_size == 1` cannot use the modulo heuristic. Probe the first entry.
        let start = entry_offsets[0].saturating_sub(base);
        let end = entry_offsets[1].saturating_sub(base);
        if end <= data.len() && start <= end {
            assume_root_streamed_vector =
                try_parse_root_stl_vector_chunk(&data[start..end], elem_size).is_some();
        }
    }

    for i in 0..n_entries {
        let start = entry_offsets[i].saturating_sub(base);
        let end = entry_offsets[i + 1].saturating_sub(base);
        if end > data.len() || start > end {
            return Err(RootError::Deserialization(format!(
                "invalid entry offsets in basket: start={start} end={end} data_len={}",
                data.len()
            )));
        }

        if assume_root_streamed_vector {
            let chunk = &data[start..end];
            let Some((n, values_off)) = try_parse_root_stl_vector_chunk(chunk, elem_size) else {
                return Err(RootError::Deserialization(
                    "failed to parse ROOT-streamed std::vector<T> entry payload".into(),
                ));
            };
            for j in 0..n {
                let off = values_off + j * elem_size;
                flat.push(decode_one_f64(chunk, off, leaf_type));
            }
        } else {
            let n_elems = (end - start) / elem_size;
            for j in 0..n_elems {
                let off = start + j * elem_size;
                flat.push(decode_one_f64(data, off, leaf_type));
            }
        }
        offsets.push(flat.len());
    }

    Ok(())
}

/// Probe a chunk for the ROOT-streamed `std::vector<T>` layout:
/// `[byte count | kByteCountMask][version: u16][n: u32][elements...]`.
///
/// Returns `(n, offset_of_first_element)` when the chunk matches exactly.
fn try_parse_root_stl_vector_chunk(chunk: &[u8], elem_size: usize) -> Option<(usize, usize)> {
    if chunk.len() < 10 {
        return None;
    }
    let raw = u32::from_be_bytes(chunk[0..4].try_into().ok()?);
    if raw & 0x4000_0000 == 0 {
        return None;
    }
    let byte_count = (raw & !0x4000_0000) as usize;
    if byte_count != chunk.len().checked_sub(4)? {
        return None;
    }
    let _ver = u16::from_be_bytes(chunk[4..6].try_into().ok()?);
    let n = u32::from_be_bytes(chunk[6..10].try_into().ok()?) as usize;
    let payload_bytes = chunk.len().checked_sub(10)?;
    let expect = n.checked_mul(elem_size)?;
    if payload_bytes != expect {
        return None;
    }
    Some((n, 10))
}

// ── Best-effort decoding: unsplit std::vector<T> (TBranchElement) ──────────────

const MAX_UNSPLIT_VECTOR_LEN: usize = 1_000_000;

fn leaf_type_candidates(prefer: Option<LeafType>) -> Vec<LeafType> {
    let all = [
        LeafType::F32,
        LeafType::F64,
        LeafType::I32,
        LeafType::I64,
        LeafType::U32,
        LeafType::U64,
        LeafType::I16,
        LeafType::I8,
        LeafType::Bool,
    ];
    let mut out: Vec<LeafType> = Vec::with_capacity(all.len());
    if let Some(lt) = prefer {
        out.push(lt);
    }
    for lt in all {
        if !out.contains(&lt) {
            out.push(lt);
        }
    }
    out
}

fn basket_n_entries(basket_entry: &[u64], total_entries: u64, basket_idx: usize) -> usize {
    let end = basket_entry
        .get(basket_idx + 1)
        .copied()
        .unwrap_or(total_entries);
    let start = basket_entry.get(basket_idx).copied().unwrap_or(0);
    end.saturating_sub(start) as usize
}

fn trailing_all_zero(b: &[u8]) -> bool {
    b.iter().all(|&x| x == 0)
}

fn decode_unsplit_vector_jagged_from_payload(
    payload: &[u8],
    elem_type: LeafType,
    n_entries: usize,
    flat: &mut Vec<f64>,
    offsets: &mut Vec<usize>,
) -> Result<usize> {
    let elem_size = elem_type.byte_size();
    let mut pos = 0usize;
    let mut total_elems = 0usize;

    for _ in 0..n_entries {
        if pos + 4 > payload.len() {
            return Err(RootError::Deserialization(
                "unsplit vector payload underflow (missing length)".into(),
            ));
        }
        let len = u32::from_be_bytes(payload[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;

        if len > MAX_UNSPLIT_VECTOR_LEN {
            return Err(RootError::Deserialization(format!(
                "unsplit vector length too large: {len}"
            )));
        }
        let bytes = len
            .checked_mul(elem_size)
            .ok_or_else(|| RootError::Deserialization("unsplit vector length overflow".into()))?;
        if pos + bytes > payload.len() {
            return Err(RootError::Deserialization(
                "unsplit vector payload underflow (elements)".into(),
            ));
        }

        for j in 0..len {
            let off = pos + j * elem_size;
            flat.push(decode_one_f64(payload, off, elem_type));
        }
        pos += bytes;
        total_elems += len;
        offsets.push(flat.len());
    }

    if pos < payload.len() && !trailing_all_zero(&payload[pos..]) {
        return Err(RootError::Deserialization(
            "unsplit vector payload has trailing non-zero bytes".into(),
        ));
    }

    Ok(total_elems)
}

fn try_decode_unsplit_vector_jagged_all_baskets(
    raw_baskets: &[Vec<u8>],
    basket_entry: &[u64],
    total_entries: u64,
    leaf_type_prefer: Option<LeafType>,
) -> Result<Option<JaggedCol>> {
    let total_entries_usize = total_entries as usize;
    if total_entries_usize == 0 || raw_baskets.is_empty() {
        return Ok(None);
    }

    for lt in leaf_type_candidates(leaf_type_prefer) {
        let mut flat: Vec<f64> = Vec::new();
        let mut offsets: Vec<usize> = vec![0usize];
        let mut ok = true;

        for (i, payload) in raw_baskets.iter().enumerate() {
            let n_entries = basket_n_entries(basket_entry, total_entries, i);
            if n_entries == 0 {
                continue;
            }
            if decode_unsplit_vector_jagged_from_payload(payload, lt, n_entries, &mut flat, &mut offsets)
                .is_err()
            {
                ok = false;
                break;
            }
        }

        if ok && offsets.len() == total_entries_usize + 1 {
            return Ok(Some(JaggedCol { flat, offsets }));
        }
    }

    Ok(None)
}

/// Decode a single f64 value from big-endian bytes at `off`.
fn decode_one_f64(data: &[u8], off: usize, leaf_type: LeafType) -> f64 {
    match leaf_type {
        LeafType::F64 => f64::from_be_bytes(data[off..off + 8].try_into().unwrap()),
        LeafType::F32 => f32::from_be_bytes(data[off..off + 4].try_into().unwrap()) as f64,
        LeafType::I32 => i32::from_be_bytes(data[off..off + 4].try_into().unwrap()) as f64,
        LeafType::I64 => i64::from_be_bytes(data[off..off + 8].try_into().unwrap()) as f64,
        LeafType::U32 => u32::from_be_bytes(data[off..off + 4].try_into().unwrap()) as f64,
        LeafType::U64 => u64::from_be_bytes(data[off..off + 8].try_into().unwrap()) as f64,
        LeafType::I16 => i16::from_be_bytes(data[off..off + 2].try_into().unwrap()) as f64,
        LeafType::I8 => data[off] as i8 as f64,
        LeafType::Bool => {
            if data[off] != 0 {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn decode_as_f64(baskets: &[Vec<u8>], leaf_type: LeafType) -> Result<Vec<f64>> {
    let elem_size = leaf_type.byte_size();
    let mut out = Vec::new();

    for basket in baskets {
        let data = basket.as_slice();
        // Number of elements based on element size
        let n = data.len() / elem_size;

        for i in 0..n {
            out.push(decode_one_f64(data, i * elem_size, leaf_type));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_u32(x: u32) -> [u8; 4] {
        x.to_be_bytes()
    }

    fn be_f32(x: f32) -> [u8; 4] {
        x.to_be_bytes()
    }

    /// Basket payload with a trailing entry-offset table, absolute base `base`.
    fn payload_with_offset_table(data: &[u8], entry_starts: &[usize], base: usize) -> Vec<u8> {
        let mut payload = data.to_vec();
        payload.extend_from_slice(&be_u32(entry_starts.len() as u32));
        for s in entry_starts {
            payload.extend_from_slice(&be_u32((base + s) as u32));
        }
        payload
    }

    #[test]
    fn jagged_offset_table_decodes_plain_elements() {
        // 3 entries: [1.0, 2.0], [], [3.0]
        let mut data = Vec::new();
        data.extend_from_slice(&be_f32(1.0));
        data.extend_from_slice(&be_f32(2.0));
        data.extend_from_slice(&be_f32(3.0));
        let payload = payload_with_offset_table(&data, &[0, 8, 8], 100);

        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        decode_jagged_from_payload(&payload, LeafType::F32, 3, &mut flat, &mut offsets).unwrap();
        assert_eq!(flat, vec![1.0, 2.0, 3.0]);
        assert_eq!(offsets, vec![0, 2, 2, 3]);
    }

    #[test]
    fn jagged_offset_table_rejects_bad_count_word() {
        let data = [0u8; 8];
        let payload = payload_with_offset_table(&data, &[0, 4], 0);
        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        let err = decode_jagged_from_payload(&payload, LeafType::F32, 3, &mut flat, &mut offsets);
        assert!(err.is_err());
    }

    /// ROOT-streamed `std::vector<T>` chunk: 10-byte header + elements.
    fn streamed_vector_chunk(values: &[f32]) -> Vec<u8> {
        let byte_count = (6 + 4 * values.len()) as u32;
        let mut chunk = Vec::new();
        chunk.extend_from_slice(&be_u32(0x4000_0000 | byte_count));
        chunk.extend_from_slice(&6u16.to_be_bytes()); // vector streamer version
        chunk.extend_from_slice(&be_u32(values.len() as u32));
        for v in values {
            chunk.extend_from_slice(&be_f32(*v));
        }
        chunk
    }

    #[test]
    fn jagged_offset_table_decodes_streamed_vectors() {
        // 2 entries: [1.5, 2.5], []
        let c0 = streamed_vector_chunk(&[1.5, 2.5]);
        let c1 = streamed_vector_chunk(&[]);
        let mut data = Vec::new();
        data.extend_from_slice(&c0);
        data.extend_from_slice(&c1);
        let payload = payload_with_offset_table(&data, &[0, c0.len()], 57);

        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        decode_jagged_from_payload(&payload, LeafType::F32, 2, &mut flat, &mut offsets).unwrap();
        assert_eq!(flat, vec![1.5, 2.5]);
        assert_eq!(offsets, vec![0, 2, 2]);
    }

    #[test]
    fn stl_vector_chunk_probe() {
        let chunk = streamed_vector_chunk(&[1.0, 2.0, 3.0]);
        assert_eq!(try_parse_root_stl_vector_chunk(&chunk, 4), Some((3, 10)));
        // Flat data must not match.
        let flat: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_be_bytes()).collect();
        assert_eq!(try_parse_root_stl_vector_chunk(&flat, 4), None);
    }

    #[test]
    fn unsplit_vector_jagged_builds_flat_and_offsets() {
        // 3 entries: [1.0, 2.0], [], [3.0]
        let mut payload = Vec::new();
        payload.extend_from_slice(&be_u32(2));
        payload.extend_from_slice(&be_f32(1.0));
        payload.extend_from_slice(&be_f32(2.0));
        payload.extend_from_slice(&be_u32(0));
        payload.extend_from_slice(&be_u32(1));
        payload.extend_from_slice(&be_f32(3.0));

        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        decode_unsplit_vector_jagged_from_payload(&payload, LeafType::F32, 3, &mut flat, &mut offsets)
            .unwrap();
        assert_eq!(flat, vec![1.0, 2.0, 3.0]);
        assert_eq!(offsets, vec![0, 2, 2, 3]);
    }

    #[test]
    fn unsplit_vector_try_decode_rejects_plain_flat_baskets() {
        // Flat f32 values (not length-prefixed).
        let mut payload = Vec::new();
        payload.extend_from_slice(&be_f32(2.0));
        payload.extend_from_slice(&be_f32(3.0));
        payload.extend_from_slice(&be_f32(4.0));

        let baskets = vec![payload];
        let basket_entry = vec![0u64, 3u64];
        let out = try_decode_unsplit_vector_jagged_all_baskets(
            &baskets,
            &basket_entry,
            3,
            Some(LeafType::F32),
        )
        .unwrap();
        assert!(out.is_none());
    }

    // ── read_column classification against synthetic baskets ──────

    /// Wrap a payload in a minimal uncompressed TKey-framed basket record.
    fn make_basket(payload: &[u8]) -> Vec<u8> {
        let class_name = b"TBasket";
        let name = b"b";
        // key_len: fixed fields (18) + small seeks (8) + strings
        let key_len = 18 + 8 + (1 + class_name.len()) + (1 + name.len()) + 1;
        let n_bytes = (key_len + payload.len()) as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&n_bytes.to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes()); // key version (small)
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes()); // obj_len == stored len → uncompressed
        out.extend_from_slice(&0u32.to_be_bytes()); // datime
        out.extend_from_slice(&(key_len as u16).to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes()); // cycle
        out.extend_from_slice(&0u32.to_be_bytes()); // seek_key
        out.extend_from_slice(&0u32.to_be_bytes()); // seek_pdir
        out.push(class_name.len() as u8);
        out.extend_from_slice(class_name);
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        out.push(0); // empty title
        assert_eq!(out.len(), key_len);
        out.extend_from_slice(payload);
        out
    }

    fn branch(
        leaf_type: Option<LeafType>,
        container: bool,
        entry_offset_len: usize,
        entries: u64,
    ) -> BranchInfo {
        BranchInfo {
            name: "test".into(),
            leaf_type,
            container,
            entry_offset_len,
            entries,
            basket_bytes: vec![0],
            basket_entry: vec![0, entries],
            basket_seek: vec![0],
            n_baskets: 1,
        }
    }

    #[test]
    fn read_column_classifies_scalars() {
        let payload: Vec<u8> =
            [2.0f32, 3.0, 4.0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let file_data = make_basket(&payload);
        let b = branch(Some(LeafType::F32), false, 0, 3);
        let reader = BranchReader::new(&file_data, &b, false);
        match reader.read_column().unwrap() {
            ColumnData::Scalar(v) => assert_eq!(v, vec![2.0, 3.0, 4.0]),
            other => panic!("expected scalar column, got {:?}", other),
        }
    }

    #[test]
    fn read_column_classifies_offset_table_branches_as_jagged() {
        let mut data = Vec::new();
        data.extend_from_slice(&be_f32(1.0));
        data.extend_from_slice(&be_f32(2.0));
        data.extend_from_slice(&be_f32(3.0));
        let payload = payload_with_offset_table(&data, &[0, 8, 8], 42);
        let file_data = make_basket(&payload);
        let b = branch(Some(LeafType::F32), true, 1000, 3);
        let reader = BranchReader::new(&file_data, &b, false);
        match reader.read_column().unwrap() {
            ColumnData::Jagged(j) => {
                assert_eq!(j.flat, vec![1.0, 2.0, 3.0]);
                assert_eq!(j.offsets, vec![0, 2, 2, 3]);
            }
            other => panic!("expected jagged column, got {:?}", other),
        }
    }

    #[test]
    fn read_column_decodes_unsplit_container_without_offset_table() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&be_u32(2));
        payload.extend_from_slice(&be_f32(1.0));
        payload.extend_from_slice(&be_f32(2.0));
        payload.extend_from_slice(&be_u32(1));
        payload.extend_from_slice(&be_f32(3.0));
        let file_data = make_basket(&payload);
        let b = branch(Some(LeafType::F32), true, 0, 2);
        let reader = BranchReader::new(&file_data, &b, false);
        match reader.read_column().unwrap() {
            ColumnData::Jagged(j) => {
                assert_eq!(j.flat, vec![1.0, 2.0, 3.0]);
                assert_eq!(j.offsets, vec![0, 2, 3]);
            }
            other => panic!("expected jagged column, got {:?}", other),
        }
    }

    #[test]
    fn read_column_rejects_unknown_element_type() {
        let payload: Vec<u8> = [1.0f32].iter().flat_map(|v| v.to_be_bytes()).collect();
        let file_data = make_basket(&payload);
        let b = branch(None, false, 0, 1);
        let reader = BranchReader::new(&file_data, &b, false);
        assert!(reader.read_column().is_err());
    }

    #[test]
    fn scalar_read_of_jagged_branch_is_a_type_error() {
        let file_data = make_basket(&[]);
        let b = branch(Some(LeafType::F32), true, 1000, 0);
        let reader = BranchReader::new(&file_data, &b, false);
        assert!(matches!(reader.as_f64(), Err(RootError::TypeMismatch(_))));
    }

    #[test]
    fn bool_and_int_elements_lift_to_f64() {
        let data = [1u8, 0, 7];
        assert_eq!(decode_one_f64(&data, 0, LeafType::Bool), 1.0);
        assert_eq!(decode_one_f64(&data, 1, LeafType::Bool), 0.0);
        assert_eq!(decode_one_f64(&data, 2, LeafType::I8), 7.0);

        let neg = (-3i32).to_be_bytes();
        assert_eq!(decode_one_f64(&neg, 0, LeafType::I32), -3.0);
        let big = 3_000_000_000u32.to_be_bytes();
        assert_eq!(decode_one_f64(&big, 0, LeafType::U32), 3_000_000_000.0);
    }
}
