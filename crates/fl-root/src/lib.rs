//! # fl-root
//!
//! Native ROOT file reader for flatlep.
//!
//! Reads TTrees from `.root` files without requiring Python or external
//! ROOT libraries. Supports zlib, LZ4, ZSTD, and XZ compression.
//!
//! ## Example
//!
//! ```no_run
//! use fl_root::RootFile;
//!
//! let f = RootFile::open("data.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{};{} ({})", key.name, key.cycle, key.class_name);
//! }
//!
//! // TTree access
//! let tree = f.get_tree("mini;1").unwrap();
//! let run: Vec<f64> = f.branch_data(&tree, "runNumber").unwrap();
//! let pt = f.branch_data_jagged(&tree, "lep_pt").unwrap();
//! println!("first event: {:?}", pt.row(0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basket;
pub mod branch_reader;
pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod tree;

pub use branch_reader::{BranchReader, ColumnData, JaggedCol};
pub use error::{Result, RootError};
pub use file::RootFile;
pub use key::KeyInfo;
pub use tree::{BranchInfo, LeafType, Tree};
