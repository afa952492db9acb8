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

//! Schema synthesis
//!
//! Folds the `config` and `auth` sections of every connector service into a single
//! [`FieldTable`] per section, and keeps track of how each service sees the merged table.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::fields::{FieldDescriptor, FieldKind, FieldTable};
use crate::oas::{OpenApiSpec, Section};
use crate::schema::{Attribute, AttributeConstraint, AttributeType, Description};

/// Fields that are not always described by the document, but are still returned by the API
///
/// Name, is it a set of strings, is it sensitive, description
const LEGACY_FIELDS: &[(&str, bool, bool, &str)] = &[
    ("oauth_token", false, true, "The Twitter App access token."),
    ("oauth_token_secret", false, true, "The Twitter App access token secret."),
    ("api_type", false, false, ""),
    ("daily_api_call_limit", false, false, ""),
    ("test_table_name", false, false, ""),
    ("unique_id", false, false, ""),
    ("organization", false, false, ""),
    ("environment", false, false, ""),
    (
        "report_suites",
        true,
        false,
        "Specific report suites to sync. Must be populated if `sync_mode` is set to `SpecificReportSuites`.",
    ),
    ("elements", true, false, "The elements that you want to sync."),
];

/// Fields of a single service within a merged section
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ServiceFields {
    /// API property name to attribute name in the merged table
    pub attributes: BTreeMap<String, String>,
}

impl ServiceFields {
    /// Attribute name of the API property `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Check if the service uses the attribute `attribute`
    pub fn owns(&self, attribute: &str) -> bool {
        self.attributes.values().any(|attr| attr == attribute)
    }
}

/// Merged fields of a section, for all the services
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfigFields {
    section: Section,
    fields: FieldTable,
    services: BTreeMap<String, ServiceFields>,
}

impl ConfigFields {
    /// Fold the section of every service of the document
    pub fn synthesize(spec: &OpenApiSpec, section: Section) -> Result<Self> {
        let mut fields = FieldTable::new();
        let mut services = BTreeMap::new();

        for service in spec.service_ids()? {
            let service_fields = match spec.service_properties(&service, section)? {
                Some(properties) => FieldTable::from_properties(
                    properties,
                    &OpenApiSpec::properties_pointer(&service, section),
                )
                .with_context(|| format!("Invalid {} of service `{}`", section, service.name()))?,
                None => FieldTable::new(),
            };
            debug!(
                service = service.name(),
                section = section.name(),
                fields = service_fields.len(),
                "folding service"
            );
            let attributes = fields.fold_service(&service, service_fields);
            services.insert(service.name().to_owned(), ServiceFields { attributes });
        }

        let mut config_fields = Self {
            section,
            fields,
            services,
        };
        if section == Section::Config {
            config_fields.add_legacy_fields();
        }
        info!(
            section = section.name(),
            services = config_fields.services.len(),
            fields = config_fields.fields.len(),
            "schema synthesized"
        );
        Ok(config_fields)
    }

    /// Fields declared by the document win, legacy ones only fill the gaps
    fn add_legacy_fields(&mut self) {
        for &(name, set, sensitive, description) in LEGACY_FIELDS {
            let kind = if set {
                FieldKind::StringSet
            } else {
                FieldKind::String
            };
            let mut field = FieldDescriptor::new(name, kind);
            field.sensitive = sensitive;
            field.description = (!description.is_empty()).then(|| description.to_owned());
            self.fields.supplement(name, field);
        }
    }

    /// Section the fields were synthesized from
    pub fn section(&self) -> Section {
        self.section
    }

    /// Merged table
    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Fields of the service `name`, or `None` if the service is unknown
    pub fn service(&self, name: &str) -> Option<&ServiceFields> {
        self.services.get(name)
    }

    /// API property name to attribute name for the service `name`
    pub fn fields_for_service(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.service(name).map(|service| &service.attributes)
    }

    /// Iterate over the services, sorted by name
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceFields)> {
        self.services
            .iter()
            .map(|(name, service)| (name.as_str(), service))
    }

    /// Check if at least one service uses the attribute `attribute`
    pub fn is_service_attribute(&self, attribute: &str) -> bool {
        self.services.values().any(|service| service.owns(attribute))
    }

    /// Terraform attributes of the merged table
    ///
    /// `readonly` attributes are computed only, and are used by data sources.
    pub fn attributes(&self, readonly: bool) -> BTreeMap<String, Attribute> {
        table_attributes(&self.fields, readonly, false)
    }
}

fn table_attributes(
    table: &FieldTable,
    readonly: bool,
    nested: bool,
) -> BTreeMap<String, Attribute> {
    table
        .iter()
        .map(|(name, field)| {
            let attr_type = match &field.kind {
                FieldKind::String => AttributeType::String,
                FieldKind::Integer => AttributeType::Number,
                FieldKind::Boolean => AttributeType::Bool,
                FieldKind::StringSet => AttributeType::Set(Box::new(AttributeType::String)),
                FieldKind::ObjectSet(nested) => {
                    AttributeType::AttributeSet(table_attributes(nested, readonly, true))
                }
            };
            let constraint = if readonly {
                AttributeConstraint::Computed
            } else if field.sensitive || nested {
                AttributeConstraint::Optional
            } else {
                AttributeConstraint::OptionalComputed
            };
            let attribute = Attribute {
                attr_type,
                description: Description::plain(field.description.as_deref().unwrap_or_default()),
                constraint,
                sensitive: field.sensitive,
                ..Default::default()
            };
            (name.clone(), attribute)
        })
        .collect()
}

/// How a service lets the practitioner choose its destination schema
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DestinationSchemaFields {
    /// The connector writes into schemas starting with a prefix
    pub schema_prefix: bool,
    /// The connector writes into a named schema
    pub schema: bool,
    /// The connector writes into a single named table
    pub table: bool,
}

impl DestinationSchemaFields {
    fn from_config(config: &Map<String, Value>) -> Self {
        if config.contains_key("schema_prefix") {
            Self {
                schema_prefix: true,
                ..Default::default()
            }
        } else {
            Self {
                schema_prefix: false,
                schema: true,
                table: config.contains_key("table"),
            }
        }
    }
}

/// Everything synthesized from the document
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConnectorSchemas {
    /// Fields of the `config` object
    pub config: ConfigFields,
    /// Fields of the `auth` object
    pub auth: ConfigFields,
    destination_schema: BTreeMap<String, DestinationSchemaFields>,
}

impl ConnectorSchemas {
    /// Synthesize both sections of the document
    pub fn synthesize(spec: &OpenApiSpec) -> Result<Self> {
        let config = ConfigFields::synthesize(spec, Section::Config)?;
        let auth = ConfigFields::synthesize(spec, Section::Auth)?;

        let mut destination_schema = BTreeMap::new();
        for service in spec.service_ids()? {
            let fields = match spec.service_properties(&service, Section::Config)? {
                Some(properties) => DestinationSchemaFields::from_config(properties),
                None => DestinationSchemaFields::from_config(&Map::new()),
            };
            destination_schema.insert(service.name().to_owned(), fields);
        }

        Ok(Self {
            config,
            auth,
            destination_schema,
        })
    }

    /// Synthesize the embedded document
    pub fn embedded() -> Result<Self> {
        Self::synthesize(&OpenApiSpec::embedded()?)
    }

    /// Destination schema capabilities of the service `name`
    pub fn destination_schema(&self, name: &str) -> Option<DestinationSchemaFields> {
        self.destination_schema.get(name).copied()
    }

    /// Check if the service `name` exists
    pub fn has_service(&self, name: &str) -> bool {
        self.destination_schema.contains_key(name)
    }

    /// Service names, sorted
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.destination_schema.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &[u8] = br##"{"components": {"schemas": {
        "NewConnectorRequestV1": {"discriminator": {"mapping": {
            "sftp": "#/components/schemas/sftp_config_V1",
            "mysql": "#/components/schemas/mysql_config_V1",
            "asana": "#/components/schemas/asana_config_V1"
        }}},
        "mysql_config_V1": {"properties": {
            "config": {"properties": {
                "port": {"type": "integer"},
                "password": {"type": "string", "format": "password"},
                "schema_prefix": {"type": "string"}
            }},
            "auth": {"properties": {
                "client_id": {"type": "string"}
            }}
        }},
        "sftp_config_V1": {"properties": {
            "config": {"properties": {
                "port": {"type": "string"},
                "password": {"type": "string"},
                "schema": {"type": "string"},
                "table": {"type": "string"}
            }}
        }}
    }}}"##;

    fn schemas() -> ConnectorSchemas {
        ConnectorSchemas::synthesize(&OpenApiSpec::parse(SPEC).unwrap()).unwrap()
    }

    #[test]
    fn services_map_to_their_attributes() {
        let schemas = schemas();
        let mysql = schemas.config.fields_for_service("mysql").unwrap();
        assert_eq!(mysql["port"], "port");
        let sftp = schemas.config.service("sftp").unwrap();
        assert_eq!(sftp.attribute("port"), Some("sftp_config_V1port"));
        assert_eq!(sftp.attribute("password"), Some("password"));
        assert!(schemas.config.fields().get("password").unwrap().sensitive);

        let asana = schemas.config.service("asana").unwrap();
        assert!(asana.attributes.is_empty());
        assert!(schemas.config.service("unknown").is_none());
    }

    #[test]
    fn legacy_fields_are_added_to_config_only() {
        let schemas = schemas();
        let config = schemas.config.fields();
        assert!(config.get("oauth_token").unwrap().sensitive);
        assert_eq!(config.get("report_suites").unwrap().kind, FieldKind::StringSet);
        assert_eq!(config.get("organization").unwrap().kind, FieldKind::String);
        assert!(!schemas.config.is_service_attribute("organization"));
        assert!(schemas.config.is_service_attribute("sftp_config_V1port"));

        let auth = schemas.auth.fields();
        assert_eq!(auth.names().collect::<Vec<_>>(), ["client_id"]);
    }

    #[test]
    fn legacy_fields_do_not_override_declared_fields() {
        let spec = OpenApiSpec::parse(
            br##"{"components": {"schemas": {
                "NewConnectorRequestV1": {"discriminator": {"mapping": {
                    "vault": "#/components/schemas/vault_config_V1"
                }}},
                "vault_config_V1": {"properties": {"config": {"properties": {
                    "organization": {"type": "string", "format": "password", "description": "Org secret."},
                    "report_suites": {"type": "array", "items": {"type": "string"}, "description": "Suites."},
                    "oauth_token": {"type": "string"}
                }}}}
            }}}"##,
        )
        .unwrap();
        let config = ConfigFields::synthesize(&spec, Section::Config).unwrap();
        let fields = config.fields();

        let organization = fields.get("organization").unwrap();
        assert!(organization.sensitive);
        assert_eq!(organization.description.as_deref(), Some("Org secret."));

        let report_suites = fields.get("report_suites").unwrap();
        assert_eq!(report_suites.kind, FieldKind::StringSet);
        assert_eq!(report_suites.description.as_deref(), Some("Suites."));

        let oauth_token = fields.get("oauth_token").unwrap();
        assert!(oauth_token.sensitive);
        assert_eq!(
            oauth_token.description.as_deref(),
            Some("The Twitter App access token.")
        );
        assert!(config.is_service_attribute("organization"));
        assert!(fields.get("api_type").unwrap().description.is_none());
    }

    #[test]
    fn destination_schema_follows_config_properties() {
        let schemas = schemas();
        let mysql = schemas.destination_schema("mysql").unwrap();
        assert!(mysql.schema_prefix && !mysql.schema && !mysql.table);
        let sftp = schemas.destination_schema("sftp").unwrap();
        assert!(!sftp.schema_prefix && sftp.schema && sftp.table);
        let asana = schemas.destination_schema("asana").unwrap();
        assert!(asana.schema && !asana.table);
        assert!(schemas.destination_schema("unknown").is_none());
        assert_eq!(
            schemas.service_names().collect::<Vec<_>>(),
            ["asana", "mysql", "sftp"]
        );
    }

    #[test]
    fn attributes_follow_field_kinds() {
        let schemas = schemas();
        let attributes = schemas.config.attributes(false);
        assert_eq!(attributes["port"].attr_type, AttributeType::Number);
        assert_eq!(
            attributes["report_suites"].attr_type,
            AttributeType::Set(Box::new(AttributeType::String))
        );
        assert_eq!(attributes["password"].constraint, AttributeConstraint::Optional);
        assert!(attributes["password"].sensitive);
        assert_eq!(
            attributes["port"].constraint,
            AttributeConstraint::OptionalComputed
        );

        let readonly = schemas.config.attributes(true);
        assert!(readonly
            .values()
            .all(|attr| attr.constraint == AttributeConstraint::Computed));
    }

    #[test]
    fn synthesis_is_deterministic() {
        assert_eq!(schemas(), schemas());
    }
}
