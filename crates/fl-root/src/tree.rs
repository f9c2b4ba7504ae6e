//! Public types for TTree branch metadata.

/// Leaf data type (maps to ROOT TLeaf class names).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    /// `TLeafF` — 32-bit float.
    F32,
    /// `TLeafD` — 64-bit float.
    F64,
    /// `TLeafI` — 32-bit signed integer.
    I32,
    /// `TLeafL` — 64-bit signed integer.
    I64,
    /// `TLeafI` unsigned variant.
    U32,
    /// `TLeafL` unsigned variant.
    U64,
    /// `TLeafS` — 16-bit signed integer.
    I16,
    /// `TLeafB` — 8-bit signed integer.
    I8,
    /// `TLeafO` — boolean (1 byte).
    Bool,
}

impl LeafType {
    /// Size in bytes of one element.
    pub fn byte_size(self) -> usize {
        match self {
            LeafType::F32 | LeafType::I32 | LeafType::U32 => 4,
            LeafType::F64 | LeafType::I64 | LeafType::U64 => 8,
            LeafType::I16 => 2,
            LeafType::I8 | LeafType::Bool => 1,
        }
    }

    /// Element type name as shown in schema listings.
    pub fn type_name(self) -> &'static str {
        match self {
            LeafType::F32 => "float",
            LeafType::F64 => "double",
            LeafType::I32 => "int32_t",
            LeafType::I64 => "int64_t",
            LeafType::U32 => "uint32_t",
            LeafType::U64 => "uint64_t",
            LeafType::I16 => "int16_t",
            LeafType::I8 => "int8_t",
            LeafType::Bool => "bool",
        }
    }
}

/// Metadata for a single TBranch in a TTree.
#[derive(Debug, Clone)]
pub struct BranchInfo {
    /// Branch name.
    pub name: String,
    /// Data type of leaves. `None` when the streamer gave us nothing usable;
    /// such branches list as `unknown` but do not fail the file open.
    pub leaf_type: Option<LeafType>,
    /// Whether the branch stores an STL container (`vector<T>`) per entry.
    pub container: bool,
    /// `fEntryOffsetLen`: non-zero when baskets carry an entry-offset table.
    pub entry_offset_len: usize,
    /// Total number of entries in this branch.
    pub entries: u64,
    /// Compressed byte sizes for each basket.
    pub basket_bytes: Vec<u32>,
    /// Entry boundaries for each basket.
    pub basket_entry: Vec<u64>,
    /// Absolute file offsets (seek positions) for each basket.
    pub basket_seek: Vec<u64>,
    /// Number of valid baskets (`fWriteBasket`).
    pub n_baskets: usize,
}

impl BranchInfo {
    /// Whether entries are variable-length (offset table or container).
    pub fn is_jagged(&self) -> bool {
        self.container || self.entry_offset_len > 0
    }

    /// Declared type for schema listings, e.g. `float` or `vector<int32_t>`.
    ///
    /// Counter-style jagged branches (leaf-list with an entry-offset table)
    /// list their element type; the `vector<>` rendering is reserved for
    /// STL container branches. Branches whose element type could not be
    /// introspected report `unknown` instead of failing the read.
    pub fn type_name(&self) -> String {
        match self.leaf_type {
            None => "unknown".to_string(),
            Some(lt) if self.container => format!("vector<{}>", lt.type_name()),
            Some(lt) => lt.type_name().to_string(),
        }
    }
}

/// A parsed TTree with branch metadata.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Tree name.
    pub name: String,
    /// Total number of entries.
    pub entries: u64,
    /// Flat list of all branches (including sub-branches).
    pub branches: Vec<BranchInfo>,
}

impl Tree {
    /// Find a branch by name.
    pub fn find_branch(&self, name: &str) -> Option<&BranchInfo> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// List all branch names.
    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }
}
