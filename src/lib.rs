//! Reading, writing and mapping NBT (Named Binary Tag) documents.
//!
//! - [`Tag`]: an in-memory tag tree with parent links and name-unique
//!   compounds.
//! - [`NbtFile`]: loads and saves whole documents, optionally GZip or ZLib
//!   compressed, with auto-detection on load.
//! - [`NbtReader`] and [`NbtWriter`]: forward-only streaming access without
//!   building a tree.
//! - [`convert`]: cached, compiled conversion between Rust types and
//!   compound tags.
//!
//! ```
//! use nbt_tree::{Compression, NbtFile, Tag, TagKind};
//!
//! let root = Tag::named_compound("level");
//! let scores = Tag::named_list("scores", Some(TagKind::Int));
//! scores.add(Tag::new(10)).unwrap();
//! scores.add(Tag::new(20)).unwrap();
//! root.add(scores).unwrap();
//!
//! let mut file = NbtFile::with_root(root).unwrap();
//! let bytes = file.save_to_buffer(Compression::ZLib).unwrap();
//!
//! let mut loaded = NbtFile::new();
//! loaded.load_from_buffer(&bytes, Compression::AutoDetect, None).unwrap();
//! let second = loaded.root().get("scores").unwrap().unwrap().get(1).unwrap().unwrap();
//! assert_eq!(second.int_value().unwrap(), 20);
//! ```

mod binary;
mod codec;
pub mod compression;
pub mod convert;
mod error;
mod file;
mod index;
mod kind;
mod reader;
mod tag;
mod value;
mod writer;

pub use binary::*;
pub use codec::Selector;
pub use compression::Compression;
pub use error::*;
pub use file::*;
pub use index::*;
pub use kind::*;
pub use reader::*;
pub use tag::*;
pub use value::*;
pub use writer::*;
