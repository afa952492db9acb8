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

//! [`Resource`] module

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

use crate::diagnostics::Diagnostics;
use crate::raw::RawValue;
use crate::schema::Schema;

/// Trait for implementing a resource with automatic serialization/deserialization
///
/// See also: [`DynamicResource`]
pub trait Resource {
    /// State of the resource
    type State: Serialize + DeserializeOwned;

    /// Get the schema of the resource
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;

    /// Validate the configuration of the resource
    ///
    /// Values that are not known yet must be accepted.
    fn validate(&self, diags: &mut Diagnostics, config: Self::State) -> Option<()>;

    /// Refresh the state of the resource from an API response
    fn read(
        &self,
        diags: &mut Diagnostics,
        state: Self::State,
        response: &JsonValue,
    ) -> Option<Self::State>;
}

/// Trait for implementing a resource without automatic serialization/deserialization
///
/// Implemented for every [`Resource`].
pub trait DynamicResource {
    /// Get the schema of the resource
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;
    /// Validate the configuration of the resource
    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()>;
    /// Refresh the state of the resource from an API response
    fn read(
        &self,
        diags: &mut Diagnostics,
        state: RawValue,
        response: &JsonValue,
    ) -> Option<RawValue>;
}

impl<T: Resource> DynamicResource for T {
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema> {
        <T as Resource>::schema(self, diags)
    }
    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()> {
        let config = config.deserialize(diags)?;
        <T as Resource>::validate(self, diags, config)
    }
    fn read(
        &self,
        diags: &mut Diagnostics,
        state: RawValue,
        response: &JsonValue,
    ) -> Option<RawValue> {
        let state = state.deserialize(diags)?;
        let state = <T as Resource>::read(self, diags, state, response)?;
        RawValue::serialize(diags, &state)
    }
}
