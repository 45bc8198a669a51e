mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// A resolved container position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<'a> {
    /// Element position inside a List.
    Position(usize),
    /// Child name inside a Compound.
    Name(&'a str),
}

/// A position inside a container tag: `usize` for lists, `&str` for
/// compounds. Used by [`Tag::get`](crate::Tag::get) and
/// [`Tag::set`](crate::Tag::set).
pub trait Index: private::Sealed {
    #[doc(hidden)]
    fn slot(&self) -> Slot<'_>;
}

impl Index for usize {
    #[inline]
    fn slot(&self) -> Slot<'_> {
        Slot::Position(*self)
    }
}

impl Index for str {
    #[inline]
    fn slot(&self) -> Slot<'_> {
        Slot::Name(self)
    }
}

impl Index for String {
    #[inline]
    fn slot(&self) -> Slot<'_> {
        Slot::Name(self.as_str())
    }
}

impl<T: ?Sized + Index> Index for &T {
    #[inline]
    fn slot(&self) -> Slot<'_> {
        (**self).slot()
    }
}
