//! Mapping between Rust types and compound tags.
//!
//! A type opts in by implementing [`NbtObject`], which lists its members
//! once. The first [`serializer`] or [`deserializer`] call for a type
//! compiles that list into a chain of closures, one per member, and caches
//! the result for the life of the process. Every later call returns the
//! same compiled converter.
//!
//! Nested types are compiled on demand while their parent compiles. A type
//! that refers to itself, directly or through other types, is bound
//! through a placeholder that is filled once its compilation completes, so
//! recursive shapes like linked nodes or trees compile without looping.
//! When any type in a compilation fails, nothing from that compilation is
//! cached.
//!
//! ```
//! use nbt_tree::{convert::{self, NbtObject, Shape}, impl_mappable};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Node {
//!     value: i32,
//!     next: Option<Box<Node>>,
//! }
//!
//! impl NbtObject for Node {
//!     fn describe(shape: &mut Shape<Self>) {
//!         shape.field("value", |n| &n.value, |n| &mut n.value);
//!         shape.field("next", |n| &n.next, |n| &mut n.next);
//!     }
//! }
//!
//! impl_mappable!(object Node);
//!
//! let list = Node { value: 1, next: Some(Box::new(Node { value: 2, next: None })) };
//! let tag = convert::to_compound("head", &list).unwrap();
//! let back: Node = convert::from_compound(Node::default(), &tag).unwrap();
//! assert_eq!(back, list);
//! ```

mod compiler;
mod mappable;
mod shape;

use std::{fmt, sync::Arc};

pub use compiler::{
    CompileContext, Direction, ReaderContext, Reading, WriterContext, Writing, object_reader,
    object_writer,
};
use compiler::{CompoundReader, CompoundWriter};
pub use mappable::{
    Mappable, NbtEnum, NbtSerializable, Site, ValueReader, ValueWriter, custom_reader,
    custom_writer, enum_reader, enum_writer,
};
pub use shape::{Member, NbtObject, NullPolicy, Shape};

use crate::{Result, Tag};

/// Compiled converter from `T` to a named compound.
pub struct Serializer<T> {
    write: CompoundWriter<T>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        Self {
            write: Arc::clone(&self.write),
        }
    }
}

impl<T> Serializer<T> {
    /// Converts `value` into a compound named `tag_name`.
    pub fn serialize(&self, tag_name: &str, value: &T) -> Result<Tag> {
        let tag = (self.write)(value)?;
        tag.set_name(Some(tag_name))?;
        Ok(tag)
    }

    /// `true` if both handles share one compiled body.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.write, &other.write)
    }
}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Compiled converter from a compound to `T`.
pub struct Deserializer<T> {
    read: CompoundReader<T>,
}

impl<T> Clone for Deserializer<T> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> Deserializer<T> {
    /// Assigns every member found in `tag` onto `base` and returns it.
    /// Members missing from the compound keep their value from `base`.
    pub fn deserialize(&self, mut base: T, tag: &Tag) -> Result<T> {
        (self.read)(&mut base, tag)?;
        Ok(base)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.read, &other.read)
    }
}

impl<T> fmt::Debug for Deserializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// The cached serializer for `T`, compiling it on first use.
pub fn serializer<T: NbtObject>() -> Result<Serializer<T>> {
    let write = compiler::compiled::<T, Writing>(compiler::compile_writer::<T>)?;
    Ok(Serializer { write })
}

/// The cached deserializer for `T`, compiling it on first use.
pub fn deserializer<T: NbtObject>() -> Result<Deserializer<T>> {
    let read = compiler::compiled::<T, Reading>(compiler::compile_reader::<T>)?;
    Ok(Deserializer { read })
}

/// Shorthand for `serializer::<T>()?.serialize(tag_name, value)`.
pub fn to_compound<T: NbtObject>(tag_name: &str, value: &T) -> Result<Tag> {
    serializer::<T>()?.serialize(tag_name, value)
}

/// Shorthand for `deserializer::<T>()?.deserialize(base, tag)`.
pub fn from_compound<T: NbtObject>(base: T, tag: &Tag) -> Result<T> {
    deserializer::<T>()?.deserialize(base, tag)
}
