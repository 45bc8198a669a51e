use std::{
    any::type_name,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use super::{NullPolicy, ReaderContext, WriterContext};
use crate::{Error, Result, Tag, TagKind};

/// Converts one value to a tag; `Ok(None)` leaves the entry out.
pub type ValueWriter<V> = Arc<dyn Fn(&V) -> Result<Option<Tag>> + Send + Sync>;

/// Converts one tag back to a value.
pub type ValueReader<V> = Arc<dyn Fn(&Tag) -> Result<V> + Send + Sync>;

/// Where a value sits: the owning type, the member, and the member's
/// null policies.
#[derive(Clone, Copy, Debug)]
pub struct Site {
    pub(crate) type_name: &'static str,
    pub(crate) member: &'static str,
    pub(crate) policy: NullPolicy,
    pub(crate) element_policy: NullPolicy,
}

impl Site {
    /// The site of a list element or map value: the element policy applies.
    fn element(&self) -> Site {
        Site {
            policy: self.element_policy,
            ..*self
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn member(&self) -> &'static str {
        self.member
    }
}

/// A Rust type with a fixed mapping to a tag kind.
///
/// Implemented here for primitives, strings, vectors, fixed-size arrays,
/// string-keyed maps, [`Option`], [`Box`] and [`Tag`]. Use
/// [`impl_mappable!`](crate::impl_mappable) for [`NbtObject`],
/// [`NbtEnum`] and [`NbtSerializable`] types.
///
/// [`NbtObject`]: super::NbtObject
pub trait Mappable: Sized + 'static {
    /// Tag kind produced, `None` when only known per value.
    fn tag_kind() -> Option<TagKind>;

    /// The tag written for a null under [`NullPolicy::InsertDefault`].
    fn default_tag() -> Result<Tag> {
        match Self::tag_kind() {
            Some(kind) => Tag::empty(kind),
            None => Ok(Tag::compound()),
        }
    }

    fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>>;

    fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>>;

    #[doc(hidden)]
    fn vec_tag_kind() -> TagKind {
        TagKind::List
    }

    #[doc(hidden)]
    fn vec_default_tag() -> Result<Tag> {
        Ok(Tag::list(Self::tag_kind()))
    }

    #[doc(hidden)]
    fn vec_writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Vec<Self>>> {
        let element = Self::writer(ctx, &site.element())?;
        Ok(Arc::new(move |values: &Vec<Self>| {
            write_elements::<Self>(values, &element).map(Some)
        }))
    }

    #[doc(hidden)]
    fn vec_reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Vec<Self>>> {
        let element = Self::reader(ctx, &site.element())?;
        Ok(Arc::new(move |tag: &Tag| read_elements::<Self>(tag, &element)))
    }
}

fn write_elements<T: Mappable>(values: &[T], element: &ValueWriter<T>) -> Result<Tag> {
    let list = Tag::list(T::tag_kind());
    for value in values {
        if let Some(item) = element(value)? {
            list.add(item)?;
        }
    }
    Ok(list)
}

fn read_elements<T: Mappable>(tag: &Tag, element: &ValueReader<T>) -> Result<Vec<T>> {
    if tag.kind() != TagKind::List {
        return Err(Error::InvalidCast {
            from: tag.kind(),
            to: type_name::<Vec<T>>(),
        });
    }
    tag.children().iter().map(|item| element(item)).collect()
}

macro_rules! impl_mappable_scalar {
    (
        $ty:ty => $kind:ident,
        |$v:ident| $encode:expr,
        |$t:ident| $decode:expr
        $(, array $array_kind:ident: |$av:ident| $array_encode:expr, |$at:ident| $array_decode:expr)?
    ) => {
        impl Mappable for $ty {
            fn tag_kind() -> Option<TagKind> {
                Some(TagKind::$kind)
            }

            fn writer(_: &mut WriterContext<'_>, _: &Site) -> Result<ValueWriter<Self>> {
                Ok(Arc::new(|$v: &$ty| -> Result<Option<Tag>> {
                    Ok(Some(Tag::new($encode)))
                }))
            }

            fn reader(_: &mut ReaderContext<'_>, _: &Site) -> Result<ValueReader<Self>> {
                Ok(Arc::new(|$t: &Tag| -> Result<Self> { $decode }))
            }

            $(
                fn vec_tag_kind() -> TagKind {
                    TagKind::$array_kind
                }

                fn vec_default_tag() -> Result<Tag> {
                    Tag::empty(TagKind::$array_kind)
                }

                fn vec_writer(_: &mut WriterContext<'_>, _: &Site) -> Result<ValueWriter<Vec<Self>>> {
                    Ok(Arc::new(|$av: &Vec<$ty>| -> Result<Option<Tag>> {
                        Ok(Some(Tag::new($array_encode)))
                    }))
                }

                fn vec_reader(_: &mut ReaderContext<'_>, _: &Site) -> Result<ValueReader<Vec<Self>>> {
                    Ok(Arc::new(|$at: &Tag| -> Result<Vec<Self>> { $array_decode }))
                }
            )?
        }
    };
}

impl_mappable_scalar!(bool => Byte, |v| *v as u8, |tag| tag.value_as::<bool>());
impl_mappable_scalar!(
    i8 => Byte,
    |v| *v as u8,
    |tag| tag.value_as::<i8>(),
    array ByteArray: |v| v.iter().map(|b| *b as u8).collect::<Vec<u8>>(),
        |tag| Ok(tag.byte_array()?.into_iter().map(|b| b as i8).collect())
);
impl_mappable_scalar!(
    u8 => Byte,
    |v| *v,
    |tag| tag.byte_value(),
    array ByteArray: |v| v.as_slice(), |tag| tag.byte_array()
);
impl_mappable_scalar!(i16 => Short, |v| *v, |tag| tag.short_value());
impl_mappable_scalar!(u16 => Short, |v| *v as i16, |tag| tag.short_value().map(|v| v as u16));
impl_mappable_scalar!(
    i32 => Int,
    |v| *v,
    |tag| tag.int_value(),
    array IntArray: |v| v.as_slice(), |tag| tag.int_array()
);
impl_mappable_scalar!(u32 => Int, |v| *v as i32, |tag| tag.int_value().map(|v| v as u32));
impl_mappable_scalar!(
    i64 => Long,
    |v| *v,
    |tag| tag.long_value(),
    array LongArray: |v| v.as_slice(), |tag| tag.long_array()
);
impl_mappable_scalar!(u64 => Long, |v| *v as i64, |tag| tag.long_value().map(|v| v as u64));
impl_mappable_scalar!(f32 => Float, |v| *v, |tag| tag.float_value());
impl_mappable_scalar!(f64 => Double, |v| *v, |tag| tag.double_value());
impl_mappable_scalar!(String => String, |v| v.as_str(), |tag| tag.string_value());

impl<T: Mappable> Mappable for Option<T> {
    fn tag_kind() -> Option<TagKind> {
        T::tag_kind()
    }

    fn default_tag() -> Result<Tag> {
        T::default_tag()
    }

    fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>> {
        let inner = T::writer(ctx, site)?;
        let site = *site;
        Ok(Arc::new(move |value: &Option<T>| match value {
            Some(value) => inner(value),
            None => match site.policy {
                NullPolicy::Ignore => Ok(None),
                NullPolicy::InsertDefault => T::default_tag().map(Some),
                NullPolicy::Error => Err(Error::NullValue {
                    type_name: site.type_name,
                    member: site.member.to_owned(),
                }),
            },
        }))
    }

    fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>> {
        let inner = T::reader(ctx, site)?;
        Ok(Arc::new(move |tag: &Tag| inner(tag).map(Some)))
    }
}

impl<T: Mappable> Mappable for Box<T> {
    fn tag_kind() -> Option<TagKind> {
        T::tag_kind()
    }

    fn default_tag() -> Result<Tag> {
        T::default_tag()
    }

    fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>> {
        let inner = T::writer(ctx, site)?;
        Ok(Arc::new(move |value: &Box<T>| inner(value.as_ref())))
    }

    fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>> {
        let inner = T::reader(ctx, site)?;
        Ok(Arc::new(move |tag: &Tag| inner(tag).map(Box::new)))
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn tag_kind() -> Option<TagKind> {
        Some(T::vec_tag_kind())
    }

    fn default_tag() -> Result<Tag> {
        T::vec_default_tag()
    }

    fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>> {
        T::vec_writer(ctx, site)
    }

    fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>> {
        T::vec_reader(ctx, site)
    }
}

impl<T: Mappable, const N: usize> Mappable for [T; N] {
    fn tag_kind() -> Option<TagKind> {
        Some(TagKind::List)
    }

    fn default_tag() -> Result<Tag> {
        Ok(Tag::list(T::tag_kind()))
    }

    fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>> {
        let element = T::writer(ctx, &site.element())?;
        Ok(Arc::new(move |values: &[T; N]| {
            write_elements::<T>(values, &element).map(Some)
        }))
    }

    fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>> {
        let element = T::reader(ctx, &site.element())?;
        Ok(Arc::new(move |tag: &Tag| -> Result<[T; N]> {
            let items = read_elements::<T>(tag, &element)?;
            let len = items.len();
            items.try_into().map_err(|_| {
                Error::argument(format!("expected a list of {N} elements, found {len}"))
            })
        }))
    }
}

macro_rules! impl_mappable_map {
    ($($map:ident),*) => {
        $(
            impl<V: Mappable> Mappable for $map<String, V> {
                fn tag_kind() -> Option<TagKind> {
                    Some(TagKind::Compound)
                }

                fn writer(ctx: &mut WriterContext<'_>, site: &Site) -> Result<ValueWriter<Self>> {
                    let value_writer = V::writer(ctx, &site.element())?;
                    Ok(Arc::new(move |map: &$map<String, V>| -> Result<Option<Tag>> {
                        let compound = Tag::compound();
                        for (key, value) in map {
                            if let Some(tag) = value_writer(value)? {
                                tag.set_name(Some(key.as_str()))?;
                                compound.add(tag)?;
                            }
                        }
                        Ok(Some(compound))
                    }))
                }

                fn reader(ctx: &mut ReaderContext<'_>, site: &Site) -> Result<ValueReader<Self>> {
                    let value_reader = V::reader(ctx, &site.element())?;
                    Ok(Arc::new(move |tag: &Tag| -> Result<Self> {
                        if tag.kind() != TagKind::Compound {
                            return Err(Error::InvalidCast {
                                from: tag.kind(),
                                to: type_name::<$map<String, V>>(),
                            });
                        }
                        tag.children()
                            .iter()
                            .map(|child| -> Result<(String, V)> {
                                Ok((child.name().unwrap_or_default(), value_reader(child)?))
                            })
                            .collect()
                    }))
                }
            }
        )*
    };
}

impl_mappable_map!(HashMap, BTreeMap);

impl Mappable for Tag {
    fn tag_kind() -> Option<TagKind> {
        None
    }

    fn writer(_: &mut WriterContext<'_>, _: &Site) -> Result<ValueWriter<Self>> {
        Ok(Arc::new(|tag: &Tag| -> Result<Option<Tag>> {
            let copy = tag.clone();
            copy.set_name(None)?;
            Ok(Some(copy))
        }))
    }

    fn reader(_: &mut ReaderContext<'_>, _: &Site) -> Result<ValueReader<Self>> {
        Ok(Arc::new(|tag: &Tag| Ok(tag.clone())))
    }
}

/// A fieldless enum stored as an Int.
pub trait NbtEnum: Copy + 'static {
    fn to_nbt_int(self) -> i32;

    /// `None` for values with no matching variant.
    fn from_nbt_int(value: i32) -> Option<Self>;
}

pub fn enum_writer<T: NbtEnum>() -> ValueWriter<T> {
    Arc::new(|value: &T| -> Result<Option<Tag>> { Ok(Some(Tag::new(value.to_nbt_int()))) })
}

pub fn enum_reader<T: NbtEnum>() -> ValueReader<T> {
    Arc::new(|tag: &Tag| -> Result<T> {
        let raw = tag.int_value()?;
        T::from_nbt_int(raw).ok_or_else(|| {
            Error::argument(format!("{raw} is not a valid `{}`", type_name::<T>()))
        })
    })
}

/// A type that converts itself to and from a tag.
pub trait NbtSerializable: Sized + 'static {
    /// Kind of the tag [`to_nbt`](NbtSerializable::to_nbt) returns.
    const TAG_KIND: TagKind = TagKind::Compound;

    fn to_nbt(&self) -> Result<Tag>;

    fn from_nbt(tag: &Tag) -> Result<Self>;
}

pub fn custom_writer<T: NbtSerializable>() -> ValueWriter<T> {
    Arc::new(|value: &T| -> Result<Option<Tag>> {
        let tag = value.to_nbt()?;
        tag.set_name(None)?;
        Ok(Some(tag))
    })
}

pub fn custom_reader<T: NbtSerializable>() -> ValueReader<T> {
    Arc::new(|tag: &Tag| T::from_nbt(tag))
}

/// Implements [`Mappable`](crate::convert::Mappable) for user types.
///
/// - `object T`: `T` implements [`NbtObject`](crate::convert::NbtObject)
///   and `Default`; it maps to a Compound.
/// - `enum T`: `T` implements [`NbtEnum`](crate::convert::NbtEnum); it maps
///   to an Int.
/// - `custom T`: `T` implements
///   [`NbtSerializable`](crate::convert::NbtSerializable).
#[macro_export]
macro_rules! impl_mappable {
    (object $($ty:ty),+ $(,)?) => {$(
        impl $crate::convert::Mappable for $ty {
            fn tag_kind() -> ::core::option::Option<$crate::TagKind> {
                ::core::option::Option::Some($crate::TagKind::Compound)
            }

            fn writer(
                ctx: &mut $crate::convert::WriterContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueWriter<Self>> {
                $crate::convert::object_writer::<Self>(ctx)
            }

            fn reader(
                ctx: &mut $crate::convert::ReaderContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueReader<Self>> {
                $crate::convert::object_reader::<Self>(ctx)
            }
        }
    )+};
    (enum $($ty:ty),+ $(,)?) => {$(
        impl $crate::convert::Mappable for $ty {
            fn tag_kind() -> ::core::option::Option<$crate::TagKind> {
                ::core::option::Option::Some($crate::TagKind::Int)
            }

            fn writer(
                _ctx: &mut $crate::convert::WriterContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueWriter<Self>> {
                ::core::result::Result::Ok($crate::convert::enum_writer::<Self>())
            }

            fn reader(
                _ctx: &mut $crate::convert::ReaderContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueReader<Self>> {
                ::core::result::Result::Ok($crate::convert::enum_reader::<Self>())
            }
        }
    )+};
    (custom $($ty:ty),+ $(,)?) => {$(
        impl $crate::convert::Mappable for $ty {
            fn tag_kind() -> ::core::option::Option<$crate::TagKind> {
                ::core::option::Option::Some(
                    <Self as $crate::convert::NbtSerializable>::TAG_KIND,
                )
            }

            fn writer(
                _ctx: &mut $crate::convert::WriterContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueWriter<Self>> {
                ::core::result::Result::Ok($crate::convert::custom_writer::<Self>())
            }

            fn reader(
                _ctx: &mut $crate::convert::ReaderContext<'_>,
                _site: &$crate::convert::Site,
            ) -> $crate::Result<$crate::convert::ValueReader<Self>> {
                ::core::result::Result::Ok($crate::convert::custom_reader::<Self>())
            }
        }
    )+};
}
