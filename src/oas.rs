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

//! OpenAPI document access
//!
//! The Fivetran API description is bundled into the binary. Connector services are
//! listed by the discriminator of `NewConnectorRequestV1`, and each service has its
//! own `<service>_config_V1` schema holding the `config` and `auth` properties.

use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

/// OpenAPI document bundled with the provider
static EMBEDDED_SPEC: &[u8] = include_bytes!("../assets/open-api-spec.json");

/// Discriminator listing every connector service
pub const SERVICES_POINTER: &str = "/components/schemas/NewConnectorRequestV1/discriminator/mapping";
/// Root of the schema definitions
pub const SCHEMAS_POINTER: &str = "/components/schemas";
/// Suffix of the per-service schema names
pub const CONFIG_VERSION_SUFFIX: &str = "_config_V1";

/// Part of a service schema that is turned into a Terraform object
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Section {
    /// `config` object of a connector
    Config,
    /// `auth` object of a connector
    Auth,
}

impl Section {
    /// Name of the section, as used in the API payloads and in Terraform
    pub fn name(self) -> &'static str {
        match self {
            Section::Config => "config",
            Section::Auth => "auth",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a connector service
///
/// Ordering follows the suffixed identifier.
///
/// ```
/// # use tf_provider_fivetran::ServiceId;
/// let id = ServiceId::new("google_ads");
/// assert_eq!(id.name(), "google_ads");
/// assert_eq!(id.as_str(), "google_ads_config_V1");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ServiceId {
    id: String,
    name_len: usize,
}

impl ServiceId {
    /// Build the identifier of the service `name`
    pub fn new(name: &str) -> Self {
        Self {
            id: format!("{}{}", name, CONFIG_VERSION_SUFFIX),
            name_len: name.len(),
        }
    }
    /// Service name, as used by the `service` attribute of a connector
    pub fn name(&self) -> &str {
        &self.id[..self.name_len]
    }
    /// Suffixed identifier, which is also the name of the service schema
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Parsed OpenAPI document
#[derive(Clone, PartialEq, Debug)]
pub struct OpenApiSpec {
    root: Value,
}

impl OpenApiSpec {
    /// Parse an OpenAPI document
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root: Value =
            serde_json::from_slice(bytes).context("OpenAPI document is not valid JSON")?;
        if !root.is_object() {
            return Err(anyhow!("OpenAPI document must be a JSON object"));
        }
        Ok(Self { root })
    }

    /// Parse the document bundled with the provider
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_SPEC).context("Could not load the embedded OpenAPI document")
    }

    /// Get a node by its JSON pointer
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// List the connector services, sorted by identifier
    pub fn service_ids(&self) -> Result<Vec<ServiceId>> {
        let mapping = self
            .pointer(SERVICES_POINTER)
            .ok_or_else(|| anyhow!("Missing service discriminator at `{}`", SERVICES_POINTER))?
            .as_object()
            .ok_or_else(|| {
                anyhow!(
                    "Service discriminator at `{}` must be an object",
                    SERVICES_POINTER
                )
            })?;
        let mut services = mapping
            .keys()
            .map(|name| ServiceId::new(name))
            .collect::<Vec<_>>();
        services.sort();
        Ok(services)
    }

    /// Pointer to the properties of a section of a service schema
    pub fn properties_pointer(service: &ServiceId, section: Section) -> String {
        format!(
            "{}/{}/properties/{}/properties",
            SCHEMAS_POINTER, service, section
        )
    }

    /// Get the properties of a section of a service schema
    ///
    /// A service without such a section has no properties.
    pub fn service_properties(
        &self,
        service: &ServiceId,
        section: Section,
    ) -> Result<Option<&Map<String, Value>>> {
        let pointer = Self::properties_pointer(service, section);
        match self.pointer(&pointer) {
            None => Ok(None),
            Some(Value::Object(properties)) => Ok(Some(properties)),
            Some(_) => Err(anyhow!("Properties at `{}` must be an object", pointer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_rejected() {
        assert!(OpenApiSpec::parse(b"{ not json").is_err());
        assert!(OpenApiSpec::parse(b"[1, 2]").is_err());
    }

    #[test]
    fn services_are_sorted_and_suffixed() {
        let spec = OpenApiSpec::parse(
            br##"{"components": {"schemas": {"NewConnectorRequestV1": {"discriminator": {"mapping": {
                "twitter": "#/components/schemas/twitter_config_V1",
                "asana": "#/components/schemas/asana_config_V1"
            }}}}}}"##,
        )
        .unwrap();
        let services = spec.service_ids().unwrap();
        let ids = services.iter().map(ServiceId::as_str).collect::<Vec<_>>();
        assert_eq!(ids, ["asana_config_V1", "twitter_config_V1"]);
        assert_eq!(services[1].name(), "twitter");
    }

    #[test]
    fn missing_discriminator_is_an_error() {
        let spec = OpenApiSpec::parse(br#"{"components": {}}"#).unwrap();
        let err = spec.service_ids().unwrap_err();
        assert!(err.to_string().contains(SERVICES_POINTER));
    }

    #[test]
    fn missing_section_has_no_properties() {
        let spec = OpenApiSpec::parse(
            br#"{"components": {"schemas": {"s3_config_V1": {"properties": {"config": {"properties": {}}}}}}}"#,
        )
        .unwrap();
        let s3 = ServiceId::new("s3");
        assert!(spec.service_properties(&s3, Section::Config).unwrap().is_some());
        assert!(spec.service_properties(&s3, Section::Auth).unwrap().is_none());
    }

    #[test]
    fn embedded_document_loads() {
        let spec = OpenApiSpec::embedded().unwrap();
        assert!(!spec.service_ids().unwrap().is_empty());
    }
}
