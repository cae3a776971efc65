//! Binding decoded boxes onto typed request records.
//!
//! Each record type declares a static schema: one [`Field`] per bindable
//! member, naming its wire key and how to store the converted value. There is
//! no runtime introspection; members without an entry are never touched.
//!
//! The wire key is the field's tag when one is given, otherwise its name.
//! Keys absent from the box leave the field at its current value. Values are
//! converted according to the [`FieldSetter`] variant:
//!
//! | variant | conversion |
//! |---|---|
//! | `Str` | copied verbatim |
//! | `Int` | decimal `i64` |
//! | `Float32` / `Float64` | floating point of that width |
//! | `Bool` | exactly `"True"` or `"False"` |
//!
//! Binding stops at the first conversion failure. Fields bound before it keep
//! their new values.
//!
//! # Examples
//!
//! ```
//! use ampframe::{ampbox::AmpBox, bind_box, binder::unmarshal};
//!
//! #[derive(Default)]
//! struct Connect {
//!     host: String,
//!     port: i64,
//!     secure: bool,
//! }
//!
//! bind_box!(Connect {
//!     host: Str,
//!     port as "port_number": Int,
//!     secure: Bool,
//! });
//!
//! let request = AmpBox::from([("host", "example.org"), ("port_number", "8080"), ("secure", "True")]);
//! let mut connect = Connect::default();
//! unmarshal(&request, &mut connect).expect("valid request");
//! assert_eq!(connect.host, "example.org");
//! assert_eq!(connect.port, 8080);
//! assert!(connect.secure);
//! ```

use std::{
    fmt,
    num::{ParseFloatError, ParseIntError},
};

use thiserror::Error;

use crate::ampbox::AmpBox;

/// Conversion failures raised while binding.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// Value is not a decimal integer.
    #[error("{value:?} for {key} is not a valid integer: {source}")]
    InvalidInteger {
        /// Wire key of the field.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Parser failure.
        source: ParseIntError,
    },

    /// Value is not a floating-point number.
    #[error("{value:?} for {key} is not a valid float: {source}")]
    InvalidFloat {
        /// Wire key of the field.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Parser failure.
        source: ParseFloatError,
    },

    /// Value is neither `"True"` nor `"False"`.
    #[error("{value:?} is not a valid boolean")]
    InvalidBool {
        /// Wire key of the field.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Stores a converted value into a record.
pub enum FieldSetter<T> {
    /// String field.
    Str(fn(&mut T, String)),
    /// Signed integer field.
    Int(fn(&mut T, i64)),
    /// Single-precision float field.
    Float32(fn(&mut T, f32)),
    /// Double-precision float field.
    Float64(fn(&mut T, f64)),
    /// Boolean field.
    Bool(fn(&mut T, bool)),
}

/// One schema entry: a field's name, optional wire tag, and setter.
pub struct Field<T> {
    name: &'static str,
    tag: Option<&'static str>,
    setter: FieldSetter<T>,
}

impl<T> Field<T> {
    /// Declare a field bound from the key equal to its name.
    #[must_use]
    pub const fn new(name: &'static str, setter: FieldSetter<T>) -> Self {
        Self {
            name,
            tag: None,
            setter,
        }
    }

    /// Bind the field from `tag` instead of its name.
    #[must_use]
    pub const fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// The field's name in the record.
    #[must_use]
    pub fn name(&self) -> &'static str { self.name }

    /// The key this field is read from.
    #[must_use]
    pub fn wire_key(&self) -> &'static str { self.tag.unwrap_or(self.name) }

    fn bind(&self, target: &mut T, raw: &str) -> Result<(), BindError> {
        let key = self.wire_key();
        match self.setter {
            FieldSetter::Str(set) => set(target, raw.to_owned()),
            FieldSetter::Int(set) => {
                let parsed = raw.parse().map_err(|source| BindError::InvalidInteger {
                    key,
                    value: raw.to_owned(),
                    source,
                })?;
                set(target, parsed);
            }
            FieldSetter::Float32(set) => set(target, parse_float(key, raw)?),
            FieldSetter::Float64(set) => set(target, parse_float(key, raw)?),
            FieldSetter::Bool(set) => set(target, parse_bool(key, raw)?),
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

fn parse_float<F>(key: &'static str, raw: &str) -> Result<F, BindError>
where
    F: std::str::FromStr<Err = ParseFloatError>,
{
    raw.parse().map_err(|source| BindError::InvalidFloat {
        key,
        value: raw.to_owned(),
        source,
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, BindError> {
    match raw {
        "True" => Ok(true),
        "False" => Ok(false),
        _ => Err(BindError::InvalidBool {
            key,
            value: raw.to_owned(),
        }),
    }
}

/// Records that can be populated from a box.
///
/// Usually implemented with [`bind_box!`](crate::bind_box).
pub trait BindBox: Sized + 'static {
    /// The record's bindable fields.
    const FIELDS: &'static [Field<Self>];
}

/// Populate `target` from the pairs in `ampbox`.
///
/// Keys with no matching field are ignored.
///
/// # Errors
///
/// Returns the first [`BindError`] encountered. Earlier fields stay bound.
pub fn unmarshal<T: BindBox>(ampbox: &AmpBox, target: &mut T) -> Result<(), BindError> {
    for field in T::FIELDS {
        if let Some(raw) = ampbox.get(field.wire_key()) {
            field.bind(target, raw)?;
        }
    }
    Ok(())
}

/// Implement [`BindBox`](crate::binder::BindBox) for a record.
///
/// Each entry is `field: Kind` or `field as "wire_key": Kind`, where `Kind`
/// names a [`FieldSetter`](crate::binder::FieldSetter) variant matching the
/// field's type (`Str` for `String`, `Int` for `i64`, `Float32`, `Float64`,
/// `Bool`).
#[macro_export]
macro_rules! bind_box {
    ($record:ident { $($field:ident $(as $tag:literal)? : $kind:ident),* $(,)? }) => {
        impl $crate::binder::BindBox for $record {
            const FIELDS: &'static [$crate::binder::Field<Self>] = &[
                $(
                    $crate::binder::Field::new(
                        stringify!($field),
                        $crate::binder::FieldSetter::$kind(|target: &mut $record, value| {
                            target.$field = value;
                        }),
                    )
                    $(.tagged($tag))?,
                )*
            ];
        }
    };
}
