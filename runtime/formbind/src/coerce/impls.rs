use std::any::type_name;
use std::collections::HashMap;

use crate::file::{FileHandle, FileHandles};
use crate::raw::FormValue;

use super::{Bind, Complex, ComplexSlot, FileSlot, FloatSlot, IntSlot, PointerSlot, Slot};

impl Bind for String {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Str(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Bind for bool {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Bool(self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! bind_numeric {
    ($($ty:ty => $outer:ident($slot:ident :: $variant:ident)),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$outer($slot::$variant(self))
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )*
    };
}

bind_numeric! {
    i8 => Int(IntSlot::I8),
    i16 => Int(IntSlot::I16),
    i32 => Int(IntSlot::I32),
    i64 => Int(IntSlot::I64),
    isize => Int(IntSlot::Isize),
    f32 => Float(FloatSlot::F32),
    f64 => Float(FloatSlot::F64),
    Complex<f32> => Complex(ComplexSlot::C64),
    Complex<f64> => Complex(ComplexSlot::C128),
}

// The decoder rejects these at runtime.
macro_rules! bind_unsupported {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Unsupported(type_name::<$ty>())
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

bind_unsupported!(u8, u16, u32, u64, u128, usize, i128);

impl<T> Bind for Option<T>
where
    T: Bind + Default,
{
    fn slot(&mut self) -> Slot<'_> {
        Slot::Pointer(self)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T> PointerSlot for Option<T>
where
    T: Bind + Default,
{
    fn pointee(&mut self) -> &mut dyn Bind {
        self.get_or_insert_with(T::default)
    }
}

impl Bind for Option<FileHandle> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::File(FileSlot::Direct(self))
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl Bind for Option<Box<FileHandle>> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::File(FileSlot::Boxed(self))
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl Bind for FileHandles {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Files(&mut self.0)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// The element types of a `Vec<T>` destination.
///
/// Only `Vec<String>` and `Vec<FileHandle>` can be bound, the other element types
/// are rejected at runtime.
pub trait SeqElement: Sized {
    fn seq_slot(seq: &mut Vec<Self>) -> Slot<'_>;
}

impl SeqElement for String {
    fn seq_slot(seq: &mut Vec<Self>) -> Slot<'_> {
        Slot::StrSeq(seq)
    }
}

impl SeqElement for FileHandle {
    fn seq_slot(seq: &mut Vec<Self>) -> Slot<'_> {
        Slot::Files(seq)
    }
}

macro_rules! unsupported_seq_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SeqElement for $ty {
                fn seq_slot(_seq: &mut Vec<Self>) -> Slot<'_> {
                    Slot::Unsupported(type_name::<Vec<$ty>>())
                }
            }
        )*
    };
}

unsupported_seq_element!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64
);

impl<T: SeqElement> Bind for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        T::seq_slot(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// The key types of a `HashMap<K, V>` destination.
///
/// Only `String` keys can be bound.
pub trait MapKey: Sized {
    fn map_slot<V: MapValue>(map: &mut HashMap<Self, V>) -> Slot<'_>;
}

impl MapKey for String {
    fn map_slot<V: MapValue>(map: &mut HashMap<Self, V>) -> Slot<'_> {
        V::map_slot(map)
    }
}

macro_rules! unsupported_map_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn map_slot<V: MapValue>(_map: &mut HashMap<Self, V>) -> Slot<'_> {
                    Slot::Unsupported(type_name::<HashMap<$ty, V>>())
                }
            }
        )*
    };
}

unsupported_map_key!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// The value types of a `HashMap<String, V>` destination.
pub trait MapValue: Sized {
    fn map_slot(map: &mut HashMap<String, Self>) -> Slot<'_>;
}

impl MapValue for String {
    fn map_slot(map: &mut HashMap<String, Self>) -> Slot<'_> {
        Slot::StrMap(map)
    }
}

impl MapValue for FormValue {
    fn map_slot(map: &mut HashMap<String, Self>) -> Slot<'_> {
        Slot::ValueMap(map)
    }
}

impl MapValue for Vec<String> {
    fn map_slot(map: &mut HashMap<String, Self>) -> Slot<'_> {
        Slot::SeqMap(map)
    }
}

impl<K: MapKey, V: MapValue> Bind for HashMap<K, V> {
    fn slot(&mut self) -> Slot<'_> {
        K::map_slot(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Implement [`Bind`] for types that can be parsed from a string via [`FromStr`].
///
/// The type must also implement [`Default`] and [`PartialEq`]: a value equal to
/// the default is considered unset.
///
/// ```rust
/// use std::str::FromStr;
///
/// #[derive(Default, PartialEq)]
/// struct Rgb(u8, u8, u8);
///
/// impl FromStr for Rgb {
///     type Err = std::num::ParseIntError;
///
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         let s = s.trim_start_matches('#');
///         let channel = |i: usize| u8::from_str_radix(s.get(i..i + 2).unwrap_or("invalid"), 16);
///         Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
///     }
/// }
///
/// formbind::bind_from_str!(Rgb);
/// ```
///
/// [`FromStr`]: std::str::FromStr
#[macro_export]
macro_rules! bind_from_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::coerce::Bind for $ty {
                fn slot(&mut self) -> $crate::coerce::Slot<'_> {
                    $crate::coerce::Slot::Text(self)
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty as ::core::default::Default>::default()
                }
            }
        )+
    };
}

bind_from_str!(char, http::Uri);
