use std::collections::hash_map::Entry;

use super::{Payload, Tag};
use crate::{Error, Result, TagKind};

impl Tag {
    pub(super) fn compound_add(&self, tag: Tag) -> Result<()> {
        self.check_adoptable(&tag)?;
        let name = tag
            .name()
            .ok_or_else(|| Error::argument("only named tags can be added to a compound"))?;
        {
            let mut node = self.node.borrow_mut();
            let map = match &mut node.payload {
                Payload::Compound(map) => map,
                payload => return Err(not_a_compound(payload.kind())),
            };
            match map.entry(name) {
                Entry::Occupied(entry) => {
                    return Err(Error::argument(format!(
                        "a tag named \"{}\" already exists in the compound",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(tag.share());
                }
            }
        }
        tag.set_parent(Some(self));
        Ok(())
    }

    pub(super) fn compound_set(&self, name: &str, tag: Tag) -> Result<()> {
        self.check_adoptable(&tag)?;
        if tag.name().as_deref() != Some(name) {
            return Err(Error::argument(
                "the tag's name must match the name it is stored under",
            ));
        }
        let previous = {
            let mut node = self.node.borrow_mut();
            match &mut node.payload {
                Payload::Compound(map) => map.insert(name.to_owned(), tag.share()),
                payload => return Err(not_a_compound(payload.kind())),
            }
        };
        if let Some(previous) = previous {
            previous.set_parent(None);
        }
        tag.set_parent(Some(self));
        Ok(())
    }

    pub(super) fn compound_remove_tag(&self, tag: &Tag) -> Result<bool> {
        if !self.contains_tag(tag) {
            return Ok(false);
        }
        match tag.name() {
            Some(name) => Ok(self.remove(&name)?.is_some()),
            None => Ok(false),
        }
    }

    /// Detaches and returns the child called `name`.
    pub fn remove(&self, name: &str) -> Result<Option<Tag>> {
        let removed = {
            let mut node = self.node.borrow_mut();
            match &mut node.payload {
                Payload::Compound(map) => map.remove(name),
                payload => return Err(not_a_compound(payload.kind())),
            }
        };
        if let Some(tag) = &removed {
            tag.set_parent(None);
        }
        Ok(removed)
    }

    /// Whether a compound has a child called `name`.
    pub fn contains(&self, name: &str) -> Result<bool> {
        match &self.node.borrow().payload {
            Payload::Compound(map) => Ok(map.contains_key(name)),
            payload => Err(not_a_compound(payload.kind())),
        }
    }

    /// Child names of a compound, in unspecified order.
    pub fn names(&self) -> Result<Vec<String>> {
        match &self.node.borrow().payload {
            Payload::Compound(map) => Ok(map.keys().cloned().collect()),
            payload => Err(not_a_compound(payload.kind())),
        }
    }
}

fn not_a_compound(kind: TagKind) -> Error {
    Error::invalid_operation(format!("expected a TAG_Compound, found a {kind}"))
}
