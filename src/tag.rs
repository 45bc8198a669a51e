//! The tag tree.
//!
//! A [`Tag`] is a handle to one node of the tree. Containers own their
//! children; a child only keeps a weak back-reference to its container, so
//! dropping the root frees the whole tree.
//!
//! ```
//! use nbt_tree::{Tag, TagKind};
//!
//! let root = Tag::named_compound("root");
//! root.add(Tag::named("x", 3i32)).unwrap();
//!
//! let list = Tag::named_list("l", None);
//! list.add(Tag::new(1i32)).unwrap();
//! root.add(list).unwrap();
//!
//! let x = root.get("x").unwrap().unwrap();
//! assert_eq!(x.int_value().unwrap(), 3);
//! assert_eq!(x.path(), "root.x");
//!
//! let l = root.get("l").unwrap().unwrap();
//! assert_eq!(l.list_kind().unwrap(), Some(TagKind::Int));
//! assert_eq!(l.get(0).unwrap().unwrap().path(), "root.l[0]");
//! ```

use std::{
    cell::{Ref, RefCell},
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::{Error, FromNbtValue, Index, NbtValue, Result, Slot, TagKind};

mod compound;
mod display;
mod list;
#[cfg(feature = "serde")]
mod serialize;

type NodeRef = Rc<RefCell<Node>>;

/// One node of a tag tree.
///
/// `Tag` is a handle: [`Tag::get`], [`Tag::parent`] and friends return
/// handles sharing the node they point at, and mutations through any handle
/// are visible through all of them. [`Clone`] is different: it produces a
/// deep, detached copy. Use [`Tag::ptr_eq`] to compare identity and `==` to
/// compare structure (names, kinds and values, ignoring the parent).
pub struct Tag {
    node: NodeRef,
}

pub(crate) struct Node {
    pub(crate) name: Option<String>,
    parent: Weak<RefCell<Node>>,
    pub(crate) payload: Payload,
}

pub(crate) enum Payload {
    Value(NbtValue),
    List(ListData),
    Compound(HashMap<String, Tag>),
}

pub(crate) struct ListData {
    pub(crate) kind: Option<TagKind>,
    pub(crate) items: Vec<Tag>,
}

impl Payload {
    pub(crate) fn kind(&self) -> TagKind {
        match self {
            Payload::Value(value) => value.kind(),
            Payload::List(_) => TagKind::List,
            Payload::Compound(_) => TagKind::Compound,
        }
    }
}

impl Tag {
    fn from_payload(name: Option<String>, payload: Payload) -> Tag {
        Tag {
            node: Rc::new(RefCell::new(Node {
                name,
                parent: Weak::new(),
                payload,
            })),
        }
    }

    pub(crate) fn from_value(name: Option<String>, value: NbtValue) -> Tag {
        Tag::from_payload(name, Payload::Value(value))
    }

    /// Creates an unnamed value tag.
    pub fn new(value: impl Into<NbtValue>) -> Tag {
        Tag::from_value(None, value.into())
    }

    /// Creates a named value tag.
    pub fn named(name: impl Into<String>, value: impl Into<NbtValue>) -> Tag {
        Tag::from_value(Some(name.into()), value.into())
    }

    /// Creates an unnamed, empty compound.
    pub fn compound() -> Tag {
        Tag::from_payload(None, Payload::Compound(HashMap::new()))
    }

    pub fn named_compound(name: impl Into<String>) -> Tag {
        Tag::from_payload(Some(name.into()), Payload::Compound(HashMap::new()))
    }

    /// Creates an unnamed, empty list. `kind` may be `None` (decided by the
    /// first element added) or any kind, including `End`.
    pub fn list(kind: Option<TagKind>) -> Tag {
        Tag::from_payload(
            None,
            Payload::List(ListData {
                kind,
                items: Vec::new(),
            }),
        )
    }

    pub fn named_list(name: impl Into<String>, kind: Option<TagKind>) -> Tag {
        let tag = Tag::list(kind);
        tag.node.borrow_mut().name = Some(name.into());
        tag
    }

    /// Creates an unnamed tag of `kind` holding its zero value: `0`, an
    /// empty string or array, or an empty container. Lists created this way
    /// have an unset element kind.
    pub fn empty(kind: TagKind) -> Result<Tag> {
        match kind {
            TagKind::End => Err(Error::argument("End tags cannot be instantiated")),
            TagKind::List => Ok(Tag::list(None)),
            TagKind::Compound => Ok(Tag::compound()),
            _ => NbtValue::default_for(kind)
                .map(|value| Tag::from_value(None, value))
                .ok_or_else(|| Error::argument(format!("{kind} carries no value"))),
        }
    }

    /// Another handle to the same node.
    #[inline]
    pub(crate) fn share(&self) -> Tag {
        Tag {
            node: Rc::clone(&self.node),
        }
    }

    #[inline]
    pub(crate) fn node(&self) -> Ref<'_, Node> {
        self.node.borrow()
    }

    /// Returns `true` if both handles point at the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Tag) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn kind(&self) -> TagKind {
        self.node.borrow().payload.kind()
    }

    pub fn name(&self) -> Option<String> {
        self.node.borrow().name.clone()
    }

    pub fn has_name(&self) -> bool {
        self.node.borrow().name.is_some()
    }

    /// Renames the tag.
    ///
    /// Inside a compound the new name must be present and must not collide
    /// with a sibling; the compound is re-keyed. Inside a list the name must
    /// be `None`. A detached tag accepts anything.
    pub fn set_name(&self, name: Option<&str>) -> Result<()> {
        if let Some(parent) = self.parent() {
            let mut parent_node = parent.node.borrow_mut();
            match &mut parent_node.payload {
                Payload::Compound(map) => {
                    let Some(new_name) = name else {
                        return Err(Error::argument(
                            "tags inside a compound must have a name",
                        ));
                    };
                    let old_name = self.node.borrow().name.clone();
                    if old_name.as_deref() != Some(new_name) {
                        if map.contains_key(new_name) {
                            return Err(Error::argument(format!(
                                "a tag named \"{new_name}\" already exists in the compound"
                            )));
                        }
                        if let Some(entry) = old_name.and_then(|old| map.remove(&old)) {
                            map.insert(new_name.to_owned(), entry);
                        }
                    }
                }
                Payload::List(_) if name.is_some() => {
                    return Err(Error::argument("list elements cannot be named"));
                }
                _ => {}
            }
        }
        self.node.borrow_mut().name = name.map(str::to_owned);
        Ok(())
    }

    /// The container holding this tag, if any.
    pub fn parent(&self) -> Option<Tag> {
        self.node
            .borrow()
            .parent
            .upgrade()
            .map(|node| Tag { node })
    }

    pub(crate) fn set_parent(&self, parent: Option<&Tag>) {
        self.node.borrow_mut().parent = match parent {
            Some(parent) => Rc::downgrade(&parent.node),
            None => Weak::new(),
        };
    }

    /// The location of this tag, built from its ancestors: `""` for an
    /// unnamed detached tag, `parent.name` inside compounds and
    /// `parent[index]` inside lists.
    pub fn path(&self) -> String {
        let Some(parent) = self.parent() else {
            return self.name().unwrap_or_default();
        };
        let parent_path = parent.path();
        let parent_node = parent.node.borrow();
        match &parent_node.payload {
            Payload::List(list) => {
                // A tag being read is attached before it is pushed.
                let index = list
                    .items
                    .iter()
                    .position(|item| item.ptr_eq(self))
                    .unwrap_or(list.items.len());
                format!("{parent_path}[{index}]")
            }
            _ => format!("{parent_path}.{}", self.name().unwrap_or_default()),
        }
    }

    /// A copy of the value of a value-bearing tag.
    pub fn value(&self) -> Option<NbtValue> {
        match &self.node.borrow().payload {
            Payload::Value(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Replaces the value. The new value must be of the tag's own kind.
    pub fn set_value(&self, value: impl Into<NbtValue>) -> Result<()> {
        let value = value.into();
        let mut node = self.node.borrow_mut();
        match &mut node.payload {
            Payload::Value(current) if current.kind() == value.kind() => {
                *current = value;
                Ok(())
            }
            payload => Err(Error::argument(format!(
                "cannot store a {} value in a {} tag",
                value.kind(),
                payload.kind()
            ))),
        }
    }

    /// Reads the value as `T`, widening numbers where it is lossless.
    pub fn value_as<T: FromNbtValue>(&self) -> Result<T> {
        match &self.node.borrow().payload {
            Payload::Value(value) => value.clone().convert(),
            payload => Err(Error::InvalidCast {
                from: payload.kind(),
                to: T::TYPE_NAME,
            }),
        }
    }

    pub fn byte_value(&self) -> Result<u8> {
        self.value_as()
    }

    pub fn short_value(&self) -> Result<i16> {
        self.value_as()
    }

    pub fn int_value(&self) -> Result<i32> {
        self.value_as()
    }

    pub fn long_value(&self) -> Result<i64> {
        self.value_as()
    }

    pub fn float_value(&self) -> Result<f32> {
        self.value_as()
    }

    pub fn double_value(&self) -> Result<f64> {
        self.value_as()
    }

    /// The string payload, or the rendering of any numeric value.
    pub fn string_value(&self) -> Result<String> {
        self.value_as()
    }

    pub fn byte_array(&self) -> Result<Vec<u8>> {
        self.value_as()
    }

    pub fn int_array(&self) -> Result<Vec<i32>> {
        self.value_as()
    }

    pub fn long_array(&self) -> Result<Vec<i64>> {
        self.value_as()
    }

    /// Number of children of a container, number of elements of an array,
    /// `0` for anything else.
    pub fn count(&self) -> usize {
        match &self.node.borrow().payload {
            Payload::List(list) => list.items.len(),
            Payload::Compound(map) => map.len(),
            Payload::Value(NbtValue::ByteArray(v)) => v.len(),
            Payload::Value(NbtValue::IntArray(v)) => v.len(),
            Payload::Value(NbtValue::LongArray(v)) => v.len(),
            Payload::Value(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Handles to the children of a container (compound order is
    /// unspecified). Empty for value tags.
    pub fn children(&self) -> Vec<Tag> {
        match &self.node.borrow().payload {
            Payload::List(list) => list.items.iter().map(Tag::share).collect(),
            Payload::Compound(map) => map.values().map(Tag::share).collect(),
            Payload::Value(_) => Vec::new(),
        }
    }

    /// Looks up a child: by position in a list, by name in a compound.
    ///
    /// Indexing a compound by position, a list by name, or a value tag at
    /// all is an [`Error::InvalidOperation`]. A list position past the end
    /// is an [`Error::Argument`]; a missing compound name is `Ok(None)`.
    pub fn get<I: Index>(&self, index: I) -> Result<Option<Tag>> {
        match (index.slot(), &self.node.borrow().payload) {
            (Slot::Name(name), Payload::Compound(map)) => Ok(map.get(name).map(Tag::share)),
            (Slot::Position(i), Payload::List(list)) => match list.items.get(i) {
                Some(item) => Ok(Some(item.share())),
                None => Err(Error::argument(format!(
                    "index {i} is out of range for a list of {} elements",
                    list.items.len()
                ))),
            },
            (slot, payload) => Err(mismatched_indexer(slot, payload.kind())),
        }
    }

    /// Stores `tag` at a position of a list or under a name of a compound,
    /// detaching whatever was there before.
    pub fn set<I: Index>(&self, index: I, tag: Tag) -> Result<()> {
        let kind = self.kind();
        match (index.slot(), kind) {
            (Slot::Name(name), TagKind::Compound) => self.compound_set(name, tag),
            (Slot::Position(i), TagKind::List) => self.list_set(i, tag),
            (slot, kind) => Err(mismatched_indexer(slot, kind)),
        }
    }

    /// Adds a child to a compound (the tag must be named) or appends it to a
    /// list (the tag must be unnamed and of the list's element kind).
    ///
    /// Fails without changing anything if the tag already has a parent, is
    /// the container itself or one of its ancestors.
    pub fn add(&self, tag: Tag) -> Result<()> {
        match self.kind() {
            TagKind::Compound => self.compound_add(tag),
            TagKind::List => self.list_insert(None, tag),
            kind => Err(Error::invalid_operation(format!(
                "cannot add children to a {kind}"
            ))),
        }
    }

    /// Adds every tag in order, stopping at the first failure.
    pub fn add_all(&self, tags: impl IntoIterator<Item = Tag>) -> Result<()> {
        tags.into_iter().try_for_each(|tag| self.add(tag))
    }

    /// Detaches a child by identity. Returns whether it was found.
    pub fn remove_tag(&self, tag: &Tag) -> Result<bool> {
        match self.kind() {
            TagKind::Compound => self.compound_remove_tag(tag),
            TagKind::List => Ok(match self.index_of(tag)? {
                Some(index) => {
                    self.remove_at(index)?;
                    true
                }
                None => false,
            }),
            kind => Err(Error::invalid_operation(format!(
                "cannot remove children from a {kind}"
            ))),
        }
    }

    /// Whether `tag` (by identity) is a direct child of this container.
    pub fn contains_tag(&self, tag: &Tag) -> bool {
        tag.parent().is_some_and(|parent| parent.ptr_eq(self))
            && match &self.node.borrow().payload {
                Payload::List(list) => list.items.iter().any(|item| item.ptr_eq(tag)),
                Payload::Compound(map) => map.values().any(|child| child.ptr_eq(tag)),
                Payload::Value(_) => false,
            }
    }

    /// Detaches every child. A list keeps its element kind.
    pub fn clear(&self) -> Result<()> {
        let removed: Vec<Tag> = {
            let mut node = self.node.borrow_mut();
            match &mut node.payload {
                Payload::List(list) => list.items.drain(..).collect(),
                Payload::Compound(map) => map.drain().map(|(_, tag)| tag).collect(),
                Payload::Value(value) => {
                    return Err(Error::invalid_operation(format!(
                        "cannot clear a {}",
                        value.kind()
                    )));
                }
            }
        };
        for tag in &removed {
            tag.set_parent(None);
        }
        Ok(())
    }

    /// Checks the structural preconditions shared by every way of putting
    /// `tag` into this container.
    fn check_adoptable(&self, tag: &Tag) -> Result<()> {
        if self.ptr_eq(tag) {
            return Err(Error::argument("a tag cannot be added to itself"));
        }
        let mut ancestor = self.parent();
        while let Some(current) = ancestor {
            if current.ptr_eq(tag) {
                return Err(Error::argument(
                    "a tag cannot be added to one of its own descendants",
                ));
            }
            ancestor = current.parent();
        }
        if tag.parent().is_some() {
            return Err(Error::argument(
                "tag already belongs to a container; remove it first",
            ));
        }
        Ok(())
    }
}

fn mismatched_indexer(slot: Slot<'_>, kind: TagKind) -> Error {
    match slot {
        Slot::Name(_) => Error::invalid_operation(format!(
            "string indexers can only be used on compounds, not on a {kind}"
        )),
        Slot::Position(_) => Error::invalid_operation(format!(
            "integer indexers can only be used on lists, not on a {kind}"
        )),
    }
}

impl Clone for Tag {
    /// Deep copy: arrays and nested containers are copied, the parent is not.
    fn clone(&self) -> Tag {
        let node = self.node.borrow();
        let payload = match &node.payload {
            Payload::Value(value) => Payload::Value(value.clone()),
            Payload::List(list) => Payload::List(ListData {
                kind: list.kind,
                items: list.items.iter().map(Tag::clone).collect(),
            }),
            Payload::Compound(map) => Payload::Compound(
                map.iter()
                    .map(|(name, child)| (name.clone(), child.clone()))
                    .collect(),
            ),
        };
        let copy = Tag::from_payload(node.name.clone(), payload);
        for child in copy.children() {
            child.set_parent(Some(&copy));
        }
        copy
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Tag) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.node.borrow(), other.node.borrow());
        a.name == b.name
            && match (&a.payload, &b.payload) {
                (Payload::Value(x), Payload::Value(y)) => x == y,
                (Payload::List(x), Payload::List(y)) => x.kind == y.kind && x.items == y.items,
                (Payload::Compound(x), Payload::Compound(y)) => {
                    x.len() == y.len()
                        && x.iter()
                            .all(|(name, child)| y.get(name).is_some_and(|other| child == other))
                }
                _ => false,
            }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        let mut out = f.debug_struct("Tag");
        out.field("name", &node.name);
        match &node.payload {
            Payload::Value(value) => out.field("value", value),
            Payload::List(list) => out
                .field("list_kind", &list.kind)
                .field("items", &list.items),
            Payload::Compound(map) => out.field("children", map),
        };
        out.finish()
    }
}
