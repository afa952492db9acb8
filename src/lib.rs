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

//! Fivetran provider for Terraform and OpenTofu
//!
//! The connector schema is synthesized from the Fivetran OpenAPI document bundled with the crate:
//! the `config` and `auth` objects of every connector service are merged into a single schema,
//! renaming the fields that different services declare with incompatible types.
//!
//! The entry point is [`FivetranProvider`], which exposes the `fivetran_connector` [`Resource`] and [`DataSource`].

mod attribute_path;
mod connector_resource;
mod data_source;
mod diagnostics;
mod provider;
mod raw;
mod resource;
mod utils;

pub mod connector;
pub mod fields;
pub mod oas;
pub mod schema;
pub mod synthesis;
pub mod value;

pub use attribute_path::{AttributePath, AttributePathStep};
pub use connector_resource::{ConnectorDataSource, ConnectorResource};
pub use data_source::{DataSource, DynamicDataSource};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use fields::{FieldDescriptor, FieldKind, FieldTable};
pub use oas::{OpenApiSpec, Section, ServiceId};
pub use provider::{
    Credentials, DynamicProvider, FivetranProvider, Provider, ProviderConfig, ProviderSchema,
    ProviderSchemas, DEFAULT_API_URL, PROVIDER_ADDRESS,
};
pub use raw::RawValue;
pub use resource::{DynamicResource, Resource};
pub use synthesis::{ConfigFields, ConnectorSchemas, DestinationSchemaFields, ServiceFields};

#[macro_export]
/// Build a sorted map
///
/// # Examples
///
/// ```
/// # use tf_provider_fivetran::map;
/// # use std::collections::BTreeMap;
/// let m: BTreeMap<String, String> = map!{
///     "key1" => "value1",
///     "key2" => "value2",
/// };
/// assert_eq!(m.keys().collect::<Vec<_>>(), ["key1", "key2"]);
/// ```
///
/// # Remarks
///
/// Keys and Values are converted with [`Into::into`] to build the map.
/// Because of that, type annotations are usually required.
macro_rules! map {
    {$($key:expr => $value:expr),*} => {
        {
            let mut map = std::collections::BTreeMap::default();
            $(
                map.insert($key.into(), $value.into());
            )*
            map
        }
    };

    {$($key:expr => $value:expr),+ ,} => { $crate::map!{$($key => $value),+} };
}
