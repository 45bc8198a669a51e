use std::{
    any::{Any, TypeId},
    collections::HashMap,
    marker::PhantomData,
    sync::Arc,
};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{NbtObject, Shape, ValueReader, ValueWriter};
use crate::{Error, Result, Tag, TagKind};

pub(crate) type MemberWriter<T> = Box<dyn Fn(&T, &Tag) -> Result<()> + Send + Sync>;
pub(crate) type MemberReader<T> = Box<dyn Fn(&mut T, &Tag) -> Result<()> + Send + Sync>;

/// Compiled serializer body: object to fresh, unnamed compound.
pub(crate) type CompoundWriter<T> = Arc<dyn Fn(&T) -> Result<Tag> + Send + Sync>;
/// Compiled deserializer body: fills an object from a compound.
pub(crate) type CompoundReader<T> = Arc<dyn Fn(&mut T, &Tag) -> Result<()> + Send + Sync>;

type Cache = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

static SERIALIZERS: Lazy<Mutex<Cache>> = Lazy::new(|| Mutex::new(HashMap::new()));
static DESERIALIZERS: Lazy<Mutex<Cache>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// One of the two conversion directions, each with its own cache.
pub trait Direction: 'static {
    #[doc(hidden)]
    type Compiled<T: 'static>: Clone + Send + Sync + 'static;

    #[doc(hidden)]
    fn cache() -> &'static Mutex<Cache>;
}

/// Object to compound.
pub enum Writing {}

/// Compound to object.
pub enum Reading {}

impl Direction for Writing {
    type Compiled<T: 'static> = CompoundWriter<T>;

    fn cache() -> &'static Mutex<Cache> {
        &SERIALIZERS
    }
}

impl Direction for Reading {
    type Compiled<T: 'static> = CompoundReader<T>;

    fn cache() -> &'static Mutex<Cache> {
        &DESERIALIZERS
    }
}

type Slot<C> = Arc<OnceCell<C>>;

/// State of one top-level compilation.
///
/// Types finished during the compilation are staged and only reach the
/// shared cache when the whole compilation succeeds. Types still being
/// compiled own an empty slot that references to them bind through; the
/// slot is filled once their own compilation finishes.
pub struct CompileContext<'c, D: Direction> {
    committed: &'c Cache,
    staged: Cache,
    in_progress: Cache,
    _direction: PhantomData<D>,
}

pub type WriterContext<'c> = CompileContext<'c, Writing>;
pub type ReaderContext<'c> = CompileContext<'c, Reading>;

impl<'c, D: Direction> CompileContext<'c, D> {
    fn new(committed: &'c Cache) -> Self {
        Self {
            committed,
            staged: HashMap::new(),
            in_progress: HashMap::new(),
            _direction: PhantomData,
        }
    }

    fn finished<T: 'static>(&self) -> Option<D::Compiled<T>> {
        let id = TypeId::of::<T>();
        self.staged
            .get(&id)
            .or_else(|| self.committed.get(&id))
            .and_then(|entry| entry.downcast_ref::<D::Compiled<T>>())
            .cloned()
    }

    fn slot<T: 'static>(&self) -> Option<Slot<D::Compiled<T>>> {
        self.in_progress
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Slot<D::Compiled<T>>>())
            .cloned()
    }

    /// Resolves `T` to its finished body, to the slot of an in-progress
    /// compilation, or compiles it now.
    fn bind<T: NbtObject>(
        &mut self,
        compile: fn(&mut Self, &Shape<T>) -> Result<D::Compiled<T>>,
    ) -> Result<Binding<D::Compiled<T>>> {
        if let Some(done) = self.finished::<T>() {
            return Ok(Binding::Ready(done));
        }
        if let Some(slot) = self.slot::<T>() {
            trace!(
                type_name = std::any::type_name::<T>(),
                "binding through in-progress slot"
            );
            return Ok(Binding::Deferred(slot));
        }
        self.compile(compile).map(Binding::Ready)
    }

    fn compile<T: NbtObject>(
        &mut self,
        compile: fn(&mut Self, &Shape<T>) -> Result<D::Compiled<T>>,
    ) -> Result<D::Compiled<T>> {
        let id = TypeId::of::<T>();
        let shape = Shape::<T>::of();
        let slot: Slot<D::Compiled<T>> = Arc::new(OnceCell::new());
        self.in_progress.insert(id, Box::new(Arc::clone(&slot)));
        let compiled = compile(self, &shape);
        self.in_progress.remove(&id);
        let compiled = compiled?;
        // Fails only if already filled, which cannot happen for a fresh slot.
        let _ = slot.set(compiled.clone());
        self.staged.insert(id, Box::new(compiled.clone()));
        Ok(compiled)
    }

    fn into_staged(self) -> Cache {
        self.staged
    }
}

/// A compiled body, or a slot filled in once compilation finishes.
enum Binding<C> {
    Ready(C),
    Deferred(Slot<C>),
}

impl<C> Binding<C> {
    fn get(&self) -> Result<&C> {
        match self {
            Binding::Ready(compiled) => Ok(compiled),
            Binding::Deferred(slot) => slot.get().ok_or_else(|| {
                Error::invalid_operation("converter invoked before its compilation finished")
            }),
        }
    }
}

/// Compiles `T` in direction `D` under the direction's cache lock, or
/// returns the cached body.
pub(crate) fn compiled<T: NbtObject, D: Direction>(
    compile: fn(&mut CompileContext<'_, D>, &Shape<T>) -> Result<D::Compiled<T>>,
) -> Result<D::Compiled<T>> {
    let mut cache = D::cache().lock();
    if let Some(done) = cache
        .get(&TypeId::of::<T>())
        .and_then(|entry| entry.downcast_ref::<D::Compiled<T>>())
    {
        return Ok(done.clone());
    }
    let mut ctx = CompileContext::<D>::new(&cache);
    let compiled = ctx.compile(compile)?;
    let staged = ctx.into_staged();
    cache.extend(staged);
    Ok(compiled)
}

pub(crate) fn compile_writer<T: NbtObject>(
    ctx: &mut WriterContext<'_>,
    shape: &Shape<T>,
) -> Result<CompoundWriter<T>> {
    let members = shape.mapped()?;
    let mut writers = Vec::with_capacity(members.len());
    for member in members {
        writers.push(member.compile_writer(ctx, shape.type_name())?);
    }
    debug!(
        type_name = shape.type_name(),
        members = writers.len(),
        "compiled NBT serializer"
    );
    Ok(Arc::new(move |value: &T| -> Result<Tag> {
        let compound = Tag::compound();
        for write in &writers {
            write(value, &compound)?;
        }
        Ok(compound)
    }))
}

pub(crate) fn compile_reader<T: NbtObject>(
    ctx: &mut ReaderContext<'_>,
    shape: &Shape<T>,
) -> Result<CompoundReader<T>> {
    let members = shape.mapped()?;
    let mut readers = Vec::with_capacity(members.len());
    for member in members {
        if let Some(reader) = member.compile_reader(ctx, shape.type_name())? {
            readers.push(reader);
        }
    }
    debug!(
        type_name = shape.type_name(),
        members = readers.len(),
        "compiled NBT deserializer"
    );
    let type_name = shape.type_name();
    Ok(Arc::new(move |target: &mut T, compound: &Tag| -> Result<()> {
        if compound.kind() != TagKind::Compound {
            return Err(Error::InvalidCast {
                from: compound.kind(),
                to: type_name,
            });
        }
        for read in &readers {
            read(target, compound)?;
        }
        Ok(())
    }))
}

/// Value writer for a nested [`NbtObject`]; used by
/// [`impl_mappable!`](crate::impl_mappable).
pub fn object_writer<T: NbtObject>(ctx: &mut WriterContext<'_>) -> Result<ValueWriter<T>> {
    let binding = ctx.bind::<T>(compile_writer::<T>)?;
    Ok(Arc::new(move |value: &T| -> Result<Option<Tag>> {
        let write = binding.get()?;
        write(value).map(Some)
    }))
}

/// Value reader for a nested [`NbtObject`]; the object starts from
/// `T::default()`.
pub fn object_reader<T: NbtObject + Default>(ctx: &mut ReaderContext<'_>) -> Result<ValueReader<T>> {
    let binding = ctx.bind::<T>(compile_reader::<T>)?;
    Ok(Arc::new(move |tag: &Tag| -> Result<T> {
        let read = binding.get()?;
        let mut value = T::default();
        read(&mut value, tag)?;
        Ok(value)
    }))
}
