use super::{ListData, Payload, Tag};
use crate::{Error, Result, TagKind};

impl Tag {
    fn with_list<R>(&self, f: impl FnOnce(&ListData) -> R) -> Result<R> {
        match &self.node.borrow().payload {
            Payload::List(list) => Ok(f(list)),
            payload => Err(not_a_list(payload.kind())),
        }
    }

    fn with_list_mut<R>(&self, f: impl FnOnce(&mut ListData) -> Result<R>) -> Result<R> {
        match &mut self.node.borrow_mut().payload {
            Payload::List(list) => f(list),
            payload => Err(not_a_list(payload.kind())),
        }
    }

    /// The kind every element of this list must have; `None` while unset.
    pub fn list_kind(&self) -> Result<Option<TagKind>> {
        self.with_list(|list| list.kind)
    }

    /// Changes the element kind of a list.
    ///
    /// `None` and `End` are only accepted while the list is empty. A
    /// non-empty list only accepts the kind its elements already have.
    pub fn set_list_kind(&self, kind: Option<TagKind>) -> Result<()> {
        self.with_list_mut(|list| {
            if let Some(first) = list.items.first() {
                if kind != Some(first.kind()) {
                    return Err(Error::argument(format!(
                        "a list holding {} elements cannot change its element kind",
                        first.kind()
                    )));
                }
            }
            list.kind = kind;
            Ok(())
        })
    }

    /// Inserts `tag` before position `index`, shifting later elements.
    pub fn insert(&self, index: usize, tag: Tag) -> Result<()> {
        self.list_insert(Some(index), tag)
    }

    pub(super) fn list_insert(&self, index: Option<usize>, tag: Tag) -> Result<()> {
        self.check_adoptable(&tag)?;
        check_unnamed(&tag)?;
        let kind = tag.kind();
        self.with_list_mut(|list| {
            let index = index.unwrap_or(list.items.len());
            if index > list.items.len() {
                return Err(Error::argument(format!(
                    "index {index} is out of range for a list of {} elements",
                    list.items.len()
                )));
            }
            accept_kind(list, kind)?;
            list.items.insert(index, tag.share());
            Ok(())
        })?;
        tag.set_parent(Some(self));
        Ok(())
    }

    pub(super) fn list_set(&self, index: usize, tag: Tag) -> Result<()> {
        self.check_adoptable(&tag)?;
        check_unnamed(&tag)?;
        let kind = tag.kind();
        let previous = self.with_list_mut(|list| {
            let len = list.items.len();
            let slot = list.items.get_mut(index).ok_or_else(|| {
                Error::argument(format!(
                    "index {index} is out of range for a list of {len} elements"
                ))
            })?;
            if let Some(expected) = list.kind {
                if expected != kind {
                    return Err(Error::argument(format!(
                        "list elements must be {expected}, got {kind}"
                    )));
                }
            }
            Ok(std::mem::replace(slot, tag.share()))
        })?;
        previous.set_parent(None);
        tag.set_parent(Some(self));
        Ok(())
    }

    /// Detaches and returns the element at `index`.
    pub fn remove_at(&self, index: usize) -> Result<Tag> {
        let removed = self.with_list_mut(|list| {
            if index >= list.items.len() {
                return Err(Error::argument(format!(
                    "index {index} is out of range for a list of {} elements",
                    list.items.len()
                )));
            }
            Ok(list.items.remove(index))
        })?;
        removed.set_parent(None);
        Ok(removed)
    }

    /// Position of `tag` (by identity) in this list.
    pub fn index_of(&self, tag: &Tag) -> Result<Option<usize>> {
        self.with_list(|list| list.items.iter().position(|item| item.ptr_eq(tag)))
    }
}

fn check_unnamed(tag: &Tag) -> Result<()> {
    if tag.has_name() {
        return Err(Error::argument("list elements must be unnamed"));
    }
    Ok(())
}

/// Fixes the element kind on the first element and enforces it afterwards.
/// An empty list typed `End` adopts the kind of its first element.
fn accept_kind(list: &mut ListData, kind: TagKind) -> Result<()> {
    match list.kind {
        Some(expected) if expected == kind => Ok(()),
        None => {
            list.kind = Some(kind);
            Ok(())
        }
        Some(TagKind::End) if list.items.is_empty() => {
            list.kind = Some(kind);
            Ok(())
        }
        Some(expected) => Err(Error::argument(format!(
            "list elements must be {expected}, got {kind}"
        ))),
    }
}

fn not_a_list(kind: TagKind) -> Error {
    Error::invalid_operation(format!("expected a TAG_List, found a {kind}"))
}
