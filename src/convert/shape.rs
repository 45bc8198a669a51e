use std::collections::HashSet;

use super::{
    Mappable, ReaderContext, Site, WriterContext,
    compiler::{MemberReader, MemberWriter},
};
use crate::{Error, Result, Tag};

/// What to do when an optional member holds `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullPolicy {
    /// Leave the entry out of the compound.
    #[default]
    Ignore,
    /// Fail with [`Error::NullValue`].
    Error,
    /// Write the zero value of the member's tag kind instead.
    InsertDefault,
}

/// A type whose members map to the entries of a compound.
///
/// ```
/// use nbt_tree::convert::{self, NbtObject, Shape};
///
/// #[derive(Default)]
/// struct Player {
///     name: String,
///     health: f32,
/// }
///
/// impl NbtObject for Player {
///     fn describe(shape: &mut Shape<Self>) {
///         shape.field("name", |p| &p.name, |p| &mut p.name);
///         shape
///             .field("health", |p| &p.health, |p| &mut p.health)
///             .tag_name("Health");
///     }
/// }
///
/// let player = Player { name: "Steve".into(), health: 20.0 };
/// let tag = convert::to_compound("player", &player).unwrap();
/// assert_eq!(tag.get("Health").unwrap().unwrap().float_value().unwrap(), 20.0);
/// ```
pub trait NbtObject: Sized + 'static {
    /// Declares the members, in the order they are written.
    fn describe(shape: &mut Shape<Self>);
}

/// The member list of an [`NbtObject`].
pub struct Shape<T> {
    type_name: &'static str,
    members: Vec<Member<T>>,
}

/// One declared member and its mapping attributes.
pub struct Member<T> {
    name: &'static str,
    tag_name: Option<String>,
    policy: NullPolicy,
    element_policy: NullPolicy,
    ignored: bool,
    binding: Box<dyn MemberBinding<T>>,
}

impl<T: NbtObject> Shape<T> {
    pub(crate) fn of() -> Self {
        let mut shape = Shape {
            type_name: std::any::type_name::<T>(),
            members: Vec::new(),
        };
        T::describe(&mut shape);
        shape
    }

    /// A read-write member.
    pub fn field<V: Mappable>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Member<T> {
        self.push(name, Box::new(FieldBinding { get, get_mut }))
    }

    /// A computed, read-only member: written when serializing, never
    /// assigned when deserializing.
    pub fn property<V: Mappable>(&mut self, name: &'static str, get: fn(&T) -> V) -> &mut Member<T> {
        self.push(name, Box::new(PropertyBinding { get }))
    }

    fn push(&mut self, name: &'static str, binding: Box<dyn MemberBinding<T>>) -> &mut Member<T> {
        self.members.push(Member {
            name,
            tag_name: None,
            policy: NullPolicy::default(),
            element_policy: NullPolicy::default(),
            ignored: false,
            binding,
        });
        let last = self.members.len() - 1;
        &mut self.members[last]
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Members taking part in the mapping; fails on duplicate tag names.
    pub(crate) fn mapped(&self) -> Result<Vec<&Member<T>>> {
        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(self.members.len());
        for member in self.members.iter().filter(|member| !member.ignored) {
            if !seen.insert(member.effective_tag_name()) {
                return Err(Error::argument(format!(
                    "`{}` maps more than one member to the tag name \"{}\"",
                    self.type_name,
                    member.effective_tag_name()
                )));
            }
            mapped.push(member);
        }
        Ok(mapped)
    }
}

impl<T: NbtObject> Member<T> {
    /// Stores the member under `name` instead of its member name.
    pub fn tag_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.tag_name = Some(name.into());
        self
    }

    pub fn null_policy(&mut self, policy: NullPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Null policy for the elements of a list or the values of a map.
    pub fn element_null_policy(&mut self, policy: NullPolicy) -> &mut Self {
        self.element_policy = policy;
        self
    }

    /// Excludes the member from both directions.
    pub fn ignore(&mut self) -> &mut Self {
        self.ignored = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn effective_tag_name(&self) -> &str {
        self.tag_name.as_deref().unwrap_or(self.name)
    }

    pub(crate) fn site(&self, type_name: &'static str) -> Site {
        Site {
            type_name,
            member: self.name,
            policy: self.policy,
            element_policy: self.element_policy,
        }
    }

    pub(crate) fn compile_writer(
        &self,
        ctx: &mut WriterContext<'_>,
        type_name: &'static str,
    ) -> Result<MemberWriter<T>> {
        let site = self.site(type_name);
        self.binding
            .writer(ctx, &site, self.effective_tag_name().to_owned())
    }

    pub(crate) fn compile_reader(
        &self,
        ctx: &mut ReaderContext<'_>,
        type_name: &'static str,
    ) -> Result<Option<MemberReader<T>>> {
        let site = self.site(type_name);
        self.binding
            .reader(ctx, &site, self.effective_tag_name().to_owned())
    }
}

trait MemberBinding<T> {
    fn writer(&self, ctx: &mut WriterContext<'_>, site: &Site, tag_name: String)
    -> Result<MemberWriter<T>>;

    /// `None` for read-only members.
    fn reader(
        &self,
        ctx: &mut ReaderContext<'_>,
        site: &Site,
        tag_name: String,
    ) -> Result<Option<MemberReader<T>>>;
}

struct FieldBinding<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

struct PropertyBinding<T, V> {
    get: fn(&T) -> V,
}

fn attach(compound: &Tag, tag: Tag, tag_name: &str) -> Result<()> {
    tag.set_name(Some(tag_name))?;
    compound.add(tag)
}

impl<T: 'static, V: Mappable> MemberBinding<T> for FieldBinding<T, V> {
    fn writer(
        &self,
        ctx: &mut WriterContext<'_>,
        site: &Site,
        tag_name: String,
    ) -> Result<MemberWriter<T>> {
        let write = V::writer(ctx, site)?;
        let get = self.get;
        Ok(Box::new(move |value: &T, compound: &Tag| -> Result<()> {
            match write(get(value))? {
                Some(tag) => attach(compound, tag, &tag_name),
                None => Ok(()),
            }
        }))
    }

    fn reader(
        &self,
        ctx: &mut ReaderContext<'_>,
        site: &Site,
        tag_name: String,
    ) -> Result<Option<MemberReader<T>>> {
        let read = V::reader(ctx, site)?;
        let get_mut = self.get_mut;
        Ok(Some(Box::new(move |target: &mut T, compound: &Tag| -> Result<()> {
            if let Some(tag) = compound.get(tag_name.as_str())? {
                *get_mut(target) = read(&tag)?;
            }
            Ok(())
        })))
    }
}

impl<T: 'static, V: Mappable> MemberBinding<T> for PropertyBinding<T, V> {
    fn writer(
        &self,
        ctx: &mut WriterContext<'_>,
        site: &Site,
        tag_name: String,
    ) -> Result<MemberWriter<T>> {
        let write = V::writer(ctx, site)?;
        let get = self.get;
        Ok(Box::new(move |value: &T, compound: &Tag| -> Result<()> {
            match write(&get(value))? {
                Some(tag) => attach(compound, tag, &tag_name),
                None => Ok(()),
            }
        }))
    }

    fn reader(
        &self,
        _ctx: &mut ReaderContext<'_>,
        _site: &Site,
        _tag_name: String,
    ) -> Result<Option<MemberReader<T>>> {
        Ok(None)
    }
}
