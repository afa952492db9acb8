// This file is part of the tf-provider-fivetran project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [`Value`] module

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    marker::PhantomData,
};

use serde::{de::Visitor, Deserialize, Serialize};
use serde_bytes::ByteBuf;

use crate::utils::serialize_unknown;

/// Encode either a known value, a null value, or an unknown value as specified by the Terraform protocol.
///
/// [`Value`] is closely modeled after [`Option`] where:
/// - [`Value::Value`] is equivalent to [`Option::Some`],
/// - [`Value::Null`] is equivalent to [`Option::None`],
/// - [`Value::Unknown`] has no option counterpart and represent a value that is only known after apply.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, Default, Serialize)]
#[serde(untagged)]
pub enum Value<T> {
    /// Value is present
    Value(T),
    /// No value is present
    #[default]
    Null,
    /// Value is unknown
    #[serde(serialize_with = "serialize_unknown")]
    Unknown,
}

macro_rules! forward_visit {
    ([ -> ]) => {
        serde::de::IntoDeserializer::into_deserializer
    };
    ([ -> $de:ident]) => {
        serde::de::value::$de::new
    };
    ($($visit:ident($value:ty)$(-> $de:ident)?),*$(,)?) => {
        $(
            fn $visit<E>(self, v: $value) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                T::deserialize(forward_visit!([-> $($de)?])(v)).map(Value::Value)
            }
        )*
    };
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor<T>(PhantomData<T>);
        impl<'de, T: Deserialize<'de>> Visitor<'de> for ValueVisitor<T> {
            type Value = Value<T>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "any value")
            }

            forward_visit!(
                visit_bool(bool),
                visit_borrowed_bytes(&'de [u8]) -> BorrowedBytesDeserializer,
                visit_borrowed_str(&'de str) -> BorrowedStrDeserializer,
                visit_bytes(&[u8]) -> BytesDeserializer,
                visit_f64(f64),
                visit_i64(i64),
                visit_u64(u64),
                visit_str(&str),
                visit_string(String),
            );

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                T::deserialize(serde::de::value::MapAccessDeserializer::new(map)).map(Value::Value)
            }
            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                T::deserialize(serde::de::value::SeqAccessDeserializer::new(seq)).map(Value::Value)
            }
            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                T::deserialize(deserializer).map(Value::Value)
            }
            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                <(i8, ByteBuf)>::deserialize(deserializer).and(Ok(Value::Unknown))
            }
            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }
            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }
        }
        deserializer.deserialize_any(ValueVisitor(PhantomData))
    }
}

pub type ValueString = Value<String>;
pub type ValueNumber = Value<i64>;
pub type ValueBool = Value<bool>;
pub type ValueList<T> = Value<Vec<T>>;
pub type ValueSet<T> = Value<BTreeSet<T>>;

impl<T> Value<T> {
    /// Check if the value is known and present
    #[inline]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Check if the value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if the value is unknown
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Converts from `&Value<T>` to `Value<&T>`
    #[inline]
    pub const fn as_ref(&self) -> Value<&T> {
        match *self {
            Self::Value(ref x) => Value::Value(x),
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
        }
    }

    /// Maps a `Value<T>` to `Value<U>` by applying a function to a contained value
    ///
    /// ```
    /// # use tf_provider_fivetran::value::Value;
    /// assert_eq!(Value::Value("abc").map(str::len), Value::Value(3));
    /// assert_eq!(Value::<&str>::Null.map(str::len), Value::Null);
    /// assert_eq!(Value::<&str>::Unknown.map(str::len), Value::Unknown);
    /// ```
    #[inline]
    pub fn map<U, F>(self, f: F) -> Value<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Value(x) => Value::Value(f(x)),
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
        }
    }

    /// Transforms the `Value<T>` into an [`Option<T>`], both null and unknown becoming [`None`]
    #[inline]
    pub fn as_option(self) -> Option<T> {
        match self {
            Self::Value(x) => Some(x),
            _ => None,
        }
    }

    /// Transforms the `&Value<T>` into an [`Option<&T>`], both null and unknown becoming [`None`]
    #[inline]
    pub fn as_ref_option(&self) -> Option<&T> {
        match self {
            Self::Value(x) => Some(x),
            _ => None,
        }
    }

    /// Returns the contained value or a default
    #[inline]
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Self::Value(x) => x,
            _ => Default::default(),
        }
    }
}

impl<T: Debug> Debug for Value<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => value.fmt(f),
            Self::Null => f.write_str("Null"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

impl<T> From<T> for Value<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> From<Option<T>> for Value<T> {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

/// Dynamically typed value, used for objects whose shape is only known at runtime
///
/// Connector `config` and `auth` objects are represented this way: their
/// attributes come from the synthesized field tables.
#[derive(Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum ValueAny {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<ValueAny>),
    Map(BTreeMap<String, ValueAny>),
    #[default]
    Null,
    #[serde(serialize_with = "serialize_unknown")]
    Unknown,
}

macro_rules! visit_number {
    ($($visit:ident($value:ty)),*$(,)?) => {
        $(
            fn $visit<E>(self, v: $value) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map_err(serde::de::Error::custom)
                    .map(ValueAny::Number)
            }
        )*
    };
}

impl<'de> Deserialize<'de> for ValueAny {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueAnyVisitor;

        impl<'de> Visitor<'de> for ValueAnyVisitor {
            type Value = ValueAny;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "any value")
            }
            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValueAny::Bool(v))
            }
            visit_number!(visit_i64(i64), visit_u64(u64), visit_i128(i128), visit_u128(u128));
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Ok(ValueAny::Number(v as i64))
                } else {
                    Err(E::custom(format!("{} is not an integer", v)))
                }
            }
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValueAny::String(v.to_owned()))
            }
            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValueAny::String(v))
            }
            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                std::str::from_utf8(v)
                    .map_err(serde::de::Error::custom)
                    .map(|s| ValueAny::String(s.to_owned()))
            }
            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                Vec::<ValueAny>::deserialize(serde::de::value::SeqAccessDeserializer::new(seq))
                    .map(ValueAny::List)
            }
            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                BTreeMap::<String, ValueAny>::deserialize(
                    serde::de::value::MapAccessDeserializer::new(map),
                )
                .map(ValueAny::Map)
            }
            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                ValueAny::deserialize(deserializer)
            }
            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                <(i8, ByteBuf)>::deserialize(deserializer).and(Ok(ValueAny::Unknown))
            }
            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValueAny::Null)
            }
            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValueAny::Null)
            }
        }

        deserializer.deserialize_any(ValueAnyVisitor)
    }
}

impl ValueAny {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ValueAny::Null)
    }
    /// Check if the value is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, ValueAny::Unknown)
    }
    /// Get the attributes of an object value
    pub fn as_map(&self) -> Option<&BTreeMap<String, ValueAny>> {
        match self {
            ValueAny::Map(map) => Some(map),
            _ => None,
        }
    }
    /// Get an attribute of an object value, null if absent
    pub fn get(&self, name: &str) -> &ValueAny {
        const NULL: &ValueAny = &ValueAny::Null;
        self.as_map().and_then(|map| map.get(name)).unwrap_or(NULL)
    }
    /// Dump the json representation of the value
    pub fn json(&self) -> String {
        serde_json::to_string(self).unwrap_or("<invalid>".into())
    }
}

impl Debug for ValueAny {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueAny::String(s) => s.fmt(f),
            ValueAny::Number(n) => n.fmt(f),
            ValueAny::Bool(b) => b.fmt(f),
            ValueAny::List(list) => f.debug_list().entries(list).finish(),
            ValueAny::Map(map) => f.debug_map().entries(map).finish(),
            ValueAny::Null => f.write_str("Null"),
            ValueAny::Unknown => f.write_str("Unknown"),
        }
    }
}

impl From<&str> for ValueAny {
    fn from(value: &str) -> Self {
        ValueAny::String(value.to_owned())
    }
}

impl From<String> for ValueAny {
    fn from(value: String) -> Self {
        ValueAny::String(value)
    }
}

impl From<i64> for ValueAny {
    fn from(value: i64) -> Self {
        ValueAny::Number(value)
    }
}

impl From<bool> for ValueAny {
    fn from(value: bool) -> Self {
        ValueAny::Bool(value)
    }
}
