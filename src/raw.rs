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

//! [`RawValue`] module

use serde::{Deserialize, Serialize};

use crate::{diagnostics::Diagnostics, utils::ExtractDiagnostics};

/// Dynamic value as exchanged with Terraform, with either Message Pack or JSON encoding
///
/// Terraform sends configurations and states with Message Pack, but still accepts
/// JSON for upgraded states and imports.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RawValue {
    /// Message Pack encoded value
    MessagePack(Vec<u8>),
    /// JSON encoded value
    Json(Vec<u8>),
}

const NULL_MESSAGE_PACK: [u8; 1] = [0xc0_u8];
const NULL_JSON: &str = "null";

impl RawValue {
    /// Check if the encoded value is null
    pub fn is_null(&self) -> bool {
        match self {
            RawValue::MessagePack(mp) => mp.is_empty() || mp.as_slice() == NULL_MESSAGE_PACK,
            RawValue::Json(json) => json.is_empty() || json.as_slice() == NULL_JSON.as_bytes(),
        }
    }

    /// Deserialize a [`RawValue`] into a concrete type
    ///
    /// Returns [`None`] iff there is an error reported in diagnostics
    pub fn deserialize<'a, T>(&'a self, diags: &mut Diagnostics) -> Option<T>
    where
        T: Deserialize<'a>,
    {
        match self {
            Self::MessagePack(mp) if mp.is_empty() => {
                rmp_serde::from_slice::<T>(&NULL_MESSAGE_PACK).extract_diagnostics(diags)
            }
            Self::MessagePack(mp) => rmp_serde::from_slice::<T>(mp).extract_diagnostics(diags),
            Self::Json(json) if json.is_empty() => {
                serde_json::from_str::<T>(NULL_JSON).extract_diagnostics(diags)
            }
            Self::Json(json) => serde_json::from_slice::<T>(json).extract_diagnostics(diags),
        }
    }

    /// Serialize `value` into a Message Pack encoded [`RawValue`]
    ///
    /// Structs are encoded as maps so that Terraform can match attributes by name.
    /// Returns [`None`] iff there is an error reported in diagnostics
    pub fn serialize<T>(diags: &mut Diagnostics, value: &T) -> Option<RawValue>
    where
        T: Serialize,
    {
        rmp_serde::to_vec_named(value)
            .extract_diagnostics(diags)
            .map(RawValue::MessagePack)
    }
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::MessagePack(NULL_MESSAGE_PACK.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueAny};

    #[test]
    fn empty_payloads_are_null() {
        let mut diags = Diagnostics::default();
        assert!(RawValue::MessagePack(vec![]).is_null());
        assert!(RawValue::Json(vec![]).is_null());
        assert!(RawValue::default().is_null());
        let value: Option<Value<String>> = RawValue::Json(vec![]).deserialize(&mut diags);
        assert_eq!(value, Some(Value::Null));
        assert!(!diags.has_errors());
    }

    #[test]
    fn config_object_through_message_pack() {
        let mut diags = Diagnostics::default();
        let config: ValueAny =
            serde_json::from_str(r#"{"host": "db.local", "port": 5432, "password": null}"#)
                .unwrap();
        let raw = RawValue::serialize(&mut diags, &config).unwrap();
        let decoded: ValueAny = raw.deserialize(&mut diags).unwrap();
        assert_eq!(decoded, config);
        assert!(!diags.has_errors());
    }

    #[test]
    fn unknown_is_encoded_as_extension_zero() {
        let mut diags = Diagnostics::default();
        let raw = RawValue::serialize(&mut diags, &ValueAny::Unknown).unwrap();
        assert_eq!(raw, RawValue::MessagePack(vec![0xd4, 0x00, 0x00]));
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut diags = Diagnostics::default();
        let value: Option<ValueAny> = RawValue::Json(b"{".to_vec()).deserialize(&mut diags);
        assert!(value.is_none());
        assert!(diags.has_errors());
    }
}
