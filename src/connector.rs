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

//! Connector model
//!
//! Maps the Terraform view of a connector onto the Fivetran API payloads, and back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

use crate::attribute_path::AttributePath;
use crate::diagnostics::Diagnostics;
use crate::fields::{FieldKind, FieldTable};
use crate::synthesis::{ConfigFields, ConnectorSchemas};
use crate::utils::OptionFactor;
use crate::value::{Value, ValueAny, ValueBool, ValueNumber, ValueSet, ValueString};

fn unknown_service(service: &str, diags: &mut Diagnostics) {
    diags.error(
        "Unknown connector service",
        format!("unknown connector service: `{}`", service),
        AttributePath::new("service"),
    );
}

fn expected(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "a string",
        FieldKind::Integer => "an integer",
        FieldKind::Boolean => "a boolean",
        FieldKind::StringSet => "a set of strings",
        FieldKind::ObjectSet(_) => "a set of objects",
    }
}

fn invalid<T, D: std::fmt::Display>(
    kind: &FieldKind,
    got: D,
    path: AttributePath,
    diags: &mut Diagnostics,
) -> Option<T> {
    diags.error(
        "Invalid value",
        format!("expected {}, got {}", expected(kind), got),
        path,
    );
    None
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn json_integer(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn value_to_api(
    kind: &FieldKind,
    value: &ValueAny,
    path: AttributePath,
    diags: &mut Diagnostics,
) -> Option<JsonValue> {
    match (kind, value) {
        (_, ValueAny::Null | ValueAny::Unknown) => Some(JsonValue::Null),
        (FieldKind::String, ValueAny::String(s)) => Some(JsonValue::String(s.clone())),
        (FieldKind::String, ValueAny::Number(n)) => Some(JsonValue::String(n.to_string())),
        (FieldKind::String, ValueAny::Bool(b)) => Some(JsonValue::String(b.to_string())),
        (FieldKind::Integer, ValueAny::Number(n)) => Some(JsonValue::from(*n)),
        (FieldKind::Integer, ValueAny::String(s)) => match s.parse::<i64>() {
            Ok(n) => Some(JsonValue::from(n)),
            Err(_) => invalid(kind, format!("{:?}", s), path, diags),
        },
        (FieldKind::Boolean, ValueAny::Bool(b)) => Some(JsonValue::Bool(*b)),
        (FieldKind::Boolean, ValueAny::String(s)) => match parse_bool(s) {
            Some(b) => Some(JsonValue::Bool(b)),
            None => invalid(kind, format!("{:?}", s), path, diags),
        },
        (FieldKind::StringSet, ValueAny::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| value_to_api(&FieldKind::String, item, path.clone().index(i as i64), diags))
            .collect::<Option<Vec<_>>>()
            .map(JsonValue::Array),
        (FieldKind::ObjectSet(nested), ValueAny::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| object_to_api(nested, item, path.clone().index(i as i64), diags))
            .collect::<Option<Vec<_>>>()
            .map(JsonValue::Array),
        (kind, value) => invalid(kind, value.json(), path, diags),
    }
}

fn object_to_api(
    nested: &FieldTable,
    item: &ValueAny,
    path: AttributePath,
    diags: &mut Diagnostics,
) -> Option<JsonValue> {
    let Some(attributes) = item.as_map() else {
        diags.error("Invalid value", format!("expected an object, got {}", item.json()), path);
        return None;
    };
    let mut object = Map::new();
    let mut valid = true;
    for (name, value) in attributes {
        if value.is_null() || value.is_unknown() {
            continue;
        }
        let path = path.clone().attribute(name.clone());
        let Some(field) = nested.get(name) else {
            diags.error_short(format!("Unsupported attribute `{}`", name), path);
            valid = false;
            continue;
        };
        match value_to_api(&field.kind, value, path, diags) {
            Some(value) => {
                object.insert(name.clone(), value);
            }
            None => valid = false,
        }
    }
    valid.then_some(JsonValue::Object(object))
}

fn value_from_api(
    kind: &FieldKind,
    json: &JsonValue,
    path: AttributePath,
    diags: &mut Diagnostics,
) -> Option<ValueAny> {
    match (kind, json) {
        (_, JsonValue::Null) => Some(ValueAny::Null),
        (FieldKind::String, JsonValue::String(s)) => Some(ValueAny::String(s.clone())),
        (FieldKind::String, JsonValue::Number(n)) => Some(ValueAny::String(n.to_string())),
        (FieldKind::String, JsonValue::Bool(b)) => Some(ValueAny::String(b.to_string())),
        (FieldKind::Integer, JsonValue::Number(n)) => match json_integer(n) {
            Some(n) => Some(ValueAny::Number(n)),
            None => invalid(kind, n, path, diags),
        },
        (FieldKind::Integer, JsonValue::String(s)) => match s.parse::<i64>() {
            Ok(n) => Some(ValueAny::Number(n)),
            Err(_) => invalid(kind, json, path, diags),
        },
        (FieldKind::Boolean, JsonValue::Bool(b)) => Some(ValueAny::Bool(*b)),
        (FieldKind::Boolean, JsonValue::String(s)) => match parse_bool(s) {
            Some(b) => Some(ValueAny::Bool(b)),
            None => invalid(kind, json, path, diags),
        },
        (FieldKind::StringSet, JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                value_from_api(&FieldKind::String, item, path.clone().index(i as i64), diags)
            })
            .collect::<Option<Vec<_>>>()
            .map(ValueAny::List),
        (FieldKind::ObjectSet(nested), JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| object_from_api(nested, item, path.clone().index(i as i64), diags))
            .collect::<Option<Vec<_>>>()
            .map(ValueAny::List),
        (kind, json) => invalid(kind, json, path, diags),
    }
}

fn object_from_api(
    nested: &FieldTable,
    json: &JsonValue,
    path: AttributePath,
    diags: &mut Diagnostics,
) -> Option<ValueAny> {
    let JsonValue::Object(object) = json else {
        diags.error("Invalid value", format!("expected an object, got {}", json), path);
        return None;
    };
    let mut attributes = nested
        .names()
        .map(|name| (name.to_owned(), ValueAny::Null))
        .collect::<BTreeMap<_, _>>();
    let mut valid = true;
    for (name, json) in object {
        let Some(field) = nested.get(name) else {
            continue;
        };
        match value_from_api(&field.kind, json, path.clone().attribute(name.clone()), diags) {
            Some(value) => {
                attributes.insert(name.clone(), value);
            }
            None => valid = false,
        }
    }
    valid.then_some(ValueAny::Map(attributes))
}

/// Put back the prior values of the sensitive attributes, masked by the API
///
/// Items of object sets are matched with the prior item whose non-sensitive attributes are the same.
fn restore_sensitive(
    table: &FieldTable,
    attributes: &mut BTreeMap<String, ValueAny>,
    prior: &ValueAny,
) {
    for (name, field) in table {
        let Some(value) = attributes.get_mut(name) else {
            continue;
        };
        if field.sensitive {
            *value = prior.get(name).clone();
            continue;
        }
        let (FieldKind::ObjectSet(nested), ValueAny::List(items)) = (&field.kind, value) else {
            continue;
        };
        let ValueAny::List(prior_items) = prior.get(name) else {
            continue;
        };
        for item in items.iter_mut() {
            let Some(prior_item) = prior_items
                .iter()
                .find(|prior_item| same_item(nested, item, prior_item))
            else {
                continue;
            };
            if let ValueAny::Map(item_attributes) = item {
                restore_sensitive(nested, item_attributes, prior_item);
            }
        }
    }
}

/// Check if two object set items only differ on sensitive attributes
fn same_item(table: &FieldTable, item: &ValueAny, prior: &ValueAny) -> bool {
    table.iter().all(|(name, field)| {
        field.sensitive
            || matches!(field.kind, FieldKind::ObjectSet(_))
            || item.get(name) == prior.get(name)
    })
}

impl ConfigFields {
    /// Convert a Terraform object into the API payload of the service `service`
    ///
    /// Only the attributes of the service are sent, under their API names.
    /// Attributes that belong to no service are sent as is.
    pub fn config_to_api(
        &self,
        service: &str,
        config: &ValueAny,
        diags: &mut Diagnostics,
    ) -> Option<Map<String, JsonValue>> {
        let root = AttributePath::new(self.section().name());
        let Some(service_fields) = self.service(service) else {
            unknown_service(service, diags);
            return None;
        };
        let attributes = match config {
            ValueAny::Null | ValueAny::Unknown => return Some(Map::new()),
            ValueAny::Map(attributes) => attributes,
            _ => {
                diags.error_short(format!("`{}` must be an object", self.section()), root);
                return None;
            }
        };
        let api_names = service_fields
            .attributes
            .iter()
            .map(|(api_name, attribute)| (attribute.as_str(), api_name.as_str()))
            .collect::<BTreeMap<_, _>>();

        let errors = diags.errors.len();
        let mut result = Map::new();
        for (attribute, value) in attributes {
            if value.is_null() || value.is_unknown() {
                continue;
            }
            let path = root.clone().attribute(attribute.clone());
            let Some(field) = self.fields().get(attribute) else {
                diags.error(
                    "Unsupported attribute",
                    format!("`{}` is not a {} attribute", attribute, self.section()),
                    path,
                );
                continue;
            };
            let api_name = match api_names.get(attribute.as_str()) {
                Some(api_name) => *api_name,
                None if !self.is_service_attribute(attribute) => attribute.as_str(),
                None => {
                    diags.warning(
                        "Attribute ignored",
                        format!("`{}` is not used by `{}` connectors", attribute, service),
                        path,
                    );
                    continue;
                }
            };
            if let Some(value) = value_to_api(&field.kind, value, path, diags) {
                result.insert(api_name.to_owned(), value);
            }
        }
        (diags.errors.len() == errors).then_some(result)
    }

    /// Convert an API payload of the service `service` into a Terraform object
    ///
    /// Every attribute of the table is present in the result.
    /// The API masks sensitive fields: when `prior` is given, sensitive attributes keep their prior value.
    pub fn config_from_api(
        &self,
        service: &str,
        api: &Map<String, JsonValue>,
        prior: Option<&ValueAny>,
        diags: &mut Diagnostics,
    ) -> Option<ValueAny> {
        let root = AttributePath::new(self.section().name());
        let Some(service_fields) = self.service(service) else {
            unknown_service(service, diags);
            return None;
        };
        let mut attributes = self
            .fields()
            .names()
            .map(|name| (name.to_owned(), ValueAny::Null))
            .collect::<BTreeMap<_, _>>();

        let errors = diags.errors.len();
        for (api_name, json) in api {
            let attribute = match service_fields.attribute(api_name) {
                Some(attribute) => attribute,
                None if self.fields().contains(api_name) && !self.is_service_attribute(api_name) => {
                    api_name.as_str()
                }
                None => {
                    debug!(service, field = api_name.as_str(), "ignoring unknown field");
                    continue;
                }
            };
            let Some(field) = self.fields().get(attribute) else {
                continue;
            };
            if field.sensitive && prior.is_some() {
                continue;
            }
            let path = root.clone().attribute(attribute.to_owned());
            if let Some(value) = value_from_api(&field.kind, json, path, diags) {
                attributes.insert(attribute.to_owned(), value);
            }
        }
        if let Some(prior) = prior {
            restore_sensitive(self.fields(), &mut attributes, prior);
        }
        (diags.errors.len() == errors).then_some(ValueAny::Map(attributes))
    }
}

/// Destination schema of a connector
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationSchema {
    pub name: ValueString,
    pub table: ValueString,
    pub prefix: ValueString,
}

impl ConnectorSchemas {
    /// API fields of the destination schema of a new connector
    pub fn destination_schema_for_config(
        &self,
        service: &str,
        schema: &DestinationSchema,
        diags: &mut Diagnostics,
    ) -> Option<Map<String, JsonValue>> {
        let root = AttributePath::new("destination_schema");
        let Some(fields) = self.destination_schema(service) else {
            unknown_service(service, diags);
            return None;
        };
        let errors = diags.errors.len();
        let mut result = Map::new();
        if fields.schema_prefix {
            match &schema.prefix {
                Value::Value(prefix) => {
                    result.insert("schema_prefix".to_owned(), prefix.clone().into());
                }
                _ => diags.error(
                    "Missing destination schema prefix",
                    format!(
                        "`destination_schema.prefix` field is required to create `{}` connector",
                        service
                    ),
                    root.clone().attribute("prefix"),
                ),
            }
            if !schema.name.is_null() {
                diags.error(
                    "Unexpected destination schema name",
                    format!(
                        "`destination_schema.name` field can't be set for `{}` connector",
                        service
                    ),
                    root.clone().attribute("name"),
                );
            }
            if !schema.table.is_null() {
                diags.error(
                    "Unexpected destination schema table",
                    format!(
                        "`destination_schema.table` field can't be set for `{}` connector",
                        service
                    ),
                    root.clone().attribute("table"),
                );
            }
        } else {
            match &schema.name {
                Value::Value(name) => {
                    result.insert("schema".to_owned(), name.clone().into());
                }
                _ => diags.error(
                    "Missing destination schema name",
                    format!(
                        "`destination_schema.name` field is required to create `{}` connector",
                        service
                    ),
                    root.clone().attribute("name"),
                ),
            }
            if fields.table {
                match &schema.table {
                    Value::Value(table) => {
                        result.insert("table".to_owned(), table.clone().into());
                    }
                    _ => diags.error(
                        "Missing destination schema table",
                        format!(
                            "`destination_schema.table` field is required to create `{}` connector",
                            service
                        ),
                        root.clone().attribute("table"),
                    ),
                }
            }
        }
        (diags.errors.len() == errors).then_some(result)
    }

    /// Destination schema of an existing connector, from the `schema` returned by the API
    pub fn destination_schema_from_api(
        &self,
        service: &str,
        schema: &str,
        diags: &mut Diagnostics,
    ) -> Option<DestinationSchema> {
        let Some(fields) = self.destination_schema(service) else {
            unknown_service(service, diags);
            return None;
        };
        if fields.schema_prefix {
            return Some(DestinationSchema {
                prefix: schema.to_owned().into(),
                ..Default::default()
            });
        }
        let (name, table) = match schema.split_once('.') {
            Some((name, table)) if fields.table => (name, Value::Value(table.to_owned())),
            Some((name, _)) => (name, Value::Null),
            None => (schema, Value::Null),
        };
        Some(DestinationSchema {
            name: name.to_owned().into(),
            table,
            prefix: Value::Null,
        })
    }
}

/// Code and message pair reported by the API
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeMessage {
    pub code: String,
    pub message: String,
}

/// Status of a connector, as returned by the API
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorStatus {
    pub setup_state: String,
    pub is_historical_sync: Option<bool>,
    pub sync_state: String,
    pub update_state: String,
    pub tasks: Vec<CodeMessage>,
    pub warnings: Vec<CodeMessage>,
}

/// Connector, as returned by the API
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorDetails {
    pub id: String,
    pub group_id: String,
    pub service: String,
    pub service_version: Option<i64>,
    pub schema: String,
    pub connected_by: String,
    pub created_at: String,
    pub succeeded_at: Option<String>,
    pub failed_at: Option<String>,
    pub sync_frequency: Option<i64>,
    pub schedule_type: String,
    pub paused: Option<bool>,
    pub pause_after_trial: Option<bool>,
    pub daily_sync_time: String,
    pub status: ConnectorStatus,
    pub config: Map<String, JsonValue>,
}

/// Envelope of the connector endpoints responses
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorResponse {
    pub code: String,
    pub message: String,
    pub data: ConnectorDetails,
}

impl ConnectorResponse {
    /// Decode a response body
    pub fn deserialize_json(body: &JsonValue) -> serde_json::Result<Self> {
        Self::deserialize(body)
    }
}

/// State of the `fivetran_connector` resource
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorResourceState {
    pub id: ValueString,
    pub name: ValueString,
    pub connected_by: ValueString,
    pub created_at: ValueString,
    pub group_id: ValueString,
    pub service: ValueString,
    pub destination_schema: Value<DestinationSchema>,
    pub config: ValueAny,
    pub auth: ValueAny,
    pub run_setup_tests: ValueBool,
    pub trust_certificates: ValueBool,
    pub trust_fingerprints: ValueBool,
}

impl ConnectorResourceState {
    /// Refresh the state from the API
    ///
    /// `auth` is never returned by the API and is left untouched.
    pub fn read_from_response(
        &mut self,
        schemas: &ConnectorSchemas,
        details: &ConnectorDetails,
        diags: &mut Diagnostics,
    ) -> Option<()> {
        let destination_schema =
            schemas.destination_schema_from_api(&details.service, &details.schema, diags)?;
        let config = schemas.config.config_from_api(
            &details.service,
            &details.config,
            Some(&self.config),
            diags,
        )?;

        self.id = details.id.clone().into();
        self.name = details.schema.clone().into();
        self.connected_by = details.connected_by.clone().into();
        self.created_at = details.created_at.clone().into();
        self.group_id = details.group_id.clone().into();
        self.service = details.service.clone().into();
        self.destination_schema = destination_schema.into();
        self.config = config;
        Some(())
    }

    /// Body of the connector creation request
    ///
    /// The destination schema fields are sent within `config`.
    pub fn create_request(
        &self,
        schemas: &ConnectorSchemas,
        diags: &mut Diagnostics,
    ) -> Option<JsonValue> {
        let Value::Value(service) = &self.service else {
            diags.error_short("`service` must be known", AttributePath::new("service"));
            return None;
        };
        let no_schema = DestinationSchema::default();
        let destination_schema = self.destination_schema.as_ref_option().unwrap_or(&no_schema);

        let (mut config, auth, destination_schema) = (
            schemas.config.config_to_api(service, &self.config, diags),
            schemas.auth.config_to_api(service, &self.auth, diags),
            schemas.destination_schema_for_config(service, destination_schema, diags),
        )
            .factor()?;
        config.extend(destination_schema);

        let mut request = Map::new();
        request.insert("service".to_owned(), service.clone().into());
        if let Value::Value(group_id) = &self.group_id {
            request.insert("group_id".to_owned(), group_id.clone().into());
        }
        request.insert("config".to_owned(), config.into());
        if !auth.is_empty() {
            request.insert("auth".to_owned(), auth.into());
        }
        for (name, flag) in [
            ("run_setup_tests", &self.run_setup_tests),
            ("trust_certificates", &self.trust_certificates),
            ("trust_fingerprints", &self.trust_fingerprints),
        ] {
            if let Value::Value(flag) = flag {
                request.insert(name.to_owned(), (*flag).into());
            }
        }
        Some(JsonValue::Object(request))
    }
}

/// Status of a connector, as exposed by the data source
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorStatusState {
    pub setup_state: ValueString,
    pub is_historical_sync: ValueBool,
    pub sync_state: ValueString,
    pub update_state: ValueString,
    pub tasks: ValueSet<CodeMessage>,
    pub warnings: ValueSet<CodeMessage>,
}

impl From<&ConnectorStatus> for ConnectorStatusState {
    fn from(status: &ConnectorStatus) -> Self {
        Self {
            setup_state: status.setup_state.clone().into(),
            is_historical_sync: status.is_historical_sync.into(),
            sync_state: status.sync_state.clone().into(),
            update_state: status.update_state.clone().into(),
            tasks: Value::Value(status.tasks.iter().cloned().collect()),
            warnings: Value::Value(status.warnings.iter().cloned().collect()),
        }
    }
}

/// State of the `fivetran_connector` data source
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorDataSourceState {
    pub id: ValueString,
    pub name: ValueString,
    pub connected_by: ValueString,
    pub created_at: ValueString,
    pub group_id: ValueString,
    pub service: ValueString,
    pub destination_schema: Value<DestinationSchema>,
    pub succeeded_at: ValueString,
    pub failed_at: ValueString,
    pub service_version: ValueString,
    pub sync_frequency: ValueNumber,
    pub schedule_type: ValueString,
    pub paused: ValueBool,
    pub pause_after_trial: ValueBool,
    pub daily_sync_time: ValueString,
    pub status: Value<ConnectorStatusState>,
    pub config: ValueAny,
}

impl ConnectorDataSourceState {
    /// Fill the state from the API
    ///
    /// Sensitive fields are exposed as returned by the API, which masks them.
    pub fn read_from_response(
        &mut self,
        schemas: &ConnectorSchemas,
        details: &ConnectorDetails,
        diags: &mut Diagnostics,
    ) -> Option<()> {
        let destination_schema =
            schemas.destination_schema_from_api(&details.service, &details.schema, diags)?;
        let config =
            schemas
                .config
                .config_from_api(&details.service, &details.config, None, diags)?;

        self.id = details.id.clone().into();
        self.name = details.schema.clone().into();
        self.connected_by = details.connected_by.clone().into();
        self.created_at = details.created_at.clone().into();
        self.group_id = details.group_id.clone().into();
        self.service = details.service.clone().into();
        self.destination_schema = destination_schema.into();
        self.succeeded_at = details.succeeded_at.clone().into();
        self.failed_at = details.failed_at.clone().into();
        self.service_version = details.service_version.map(|v| v.to_string()).into();
        self.sync_frequency = details.sync_frequency.into();
        self.schedule_type = details.schedule_type.clone().into();
        self.paused = details.paused.into();
        self.pause_after_trial = details.pause_after_trial.into();
        self.daily_sync_time = if details.daily_sync_time.is_empty() {
            Value::Null
        } else {
            details.daily_sync_time.clone().into()
        };
        self.status = ConnectorStatusState::from(&details.status).into();
        self.config = config;
        Some(())
    }
}
