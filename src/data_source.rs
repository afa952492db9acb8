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

//! [`DataSource`] module

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

use crate::diagnostics::Diagnostics;
use crate::raw::RawValue;
use crate::schema::Schema;

/// Trait for implementing a data source with automatic serialization/deserialization
///
/// See also: [`DynamicDataSource`]
pub trait DataSource {
    /// State of the data source
    ///
    /// The state will be automatically serialized/deserialized at the border of the request.
    type State: Serialize + DeserializeOwned;

    /// Get the schema of the data source
    ///
    /// # Arguments
    ///
    /// * `diags` - Diagnostics to record warnings and errors that occured when getting back the schema
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;

    /// Validate the configuration of the data source
    ///
    /// # Arguments
    ///
    /// * `diags` - Diagnostics to record warnings and errors that occured during validation
    /// * `config` - State as declared in the Terraform file
    fn validate(&self, diags: &mut Diagnostics, config: Self::State) -> Option<()> {
        _ = diags;
        _ = config;
        Some(())
    }

    /// Read the state of the data source
    ///
    /// # Arguments
    ///
    /// * `diags` - Diagnostics to record warnings and errors that occured during the read
    /// * `config` - State as declared in the Terraform file
    /// * `response` - Body of the API response describing the object
    fn read(
        &self,
        diags: &mut Diagnostics,
        config: Self::State,
        response: &JsonValue,
    ) -> Option<Self::State>;
}

/// Trait for implementing a data source without automatic serialization/deserialization
///
/// Implemented for every [`DataSource`].
pub trait DynamicDataSource {
    /// Get the schema of the data source
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;
    /// Validate the configuration of the data source
    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()>;
    /// Read the state of the data source
    fn read(
        &self,
        diags: &mut Diagnostics,
        config: RawValue,
        response: &JsonValue,
    ) -> Option<RawValue>;
}

impl<T: DataSource> DynamicDataSource for T {
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema> {
        <T as DataSource>::schema(self, diags)
    }
    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()> {
        let config = config.deserialize(diags)?;
        <T as DataSource>::validate(self, diags, config)
    }
    fn read(
        &self,
        diags: &mut Diagnostics,
        config: RawValue,
        response: &JsonValue,
    ) -> Option<RawValue> {
        let config = config.deserialize(diags)?;
        let state = <T as DataSource>::read(self, diags, config, response)?;
        RawValue::serialize(diags, &state)
    }
}
