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

//! Connector fields
//!
//! Every property declared by a service schema becomes a [`FieldDescriptor`].
//! Services are folded one after the other into a single [`FieldTable`]:
//! - fields with the same name and kind are shared,
//! - fields with the same name but a different kind are renamed `<service-id><name>`,
//! - a string set and an object set with the same name are renamed `<service-id>_<name>` (lowercase).

use std::collections::{btree_map, BTreeMap};

use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};
use tracing::warn;

use crate::oas::ServiceId;

const PASSWORD_FORMAT: &str = "password";
const INTEGER_TYPE: &str = "integer";
const BOOLEAN_TYPE: &str = "boolean";
const ARRAY_TYPE: &str = "array";
const OBJECT_TYPE: &str = "object";

/// Kind of a field
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FieldKind {
    /// Plain string, also used for undeclared or unsupported types
    String,
    /// Integer
    Integer,
    /// Boolean
    Boolean,
    /// Unordered collection of strings
    StringSet,
    /// Unordered collection of objects with the given fields
    ObjectSet(FieldTable),
}

/// Coarse kind, used to detect incompatible fields
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum KindLabel {
    String,
    Integer,
    Boolean,
    Set,
}

/// How two fields with the same name relate to each other
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Compatibility {
    /// Fields can share a single descriptor
    Same,
    /// Fields have different kinds
    DifferentKind,
    /// Fields are both sets, but only one holds objects
    DifferentElement,
}

impl FieldKind {
    /// Coarse kind of the field
    pub fn label(&self) -> KindLabel {
        match self {
            FieldKind::String => KindLabel::String,
            FieldKind::Integer => KindLabel::Integer,
            FieldKind::Boolean => KindLabel::Boolean,
            FieldKind::StringSet | FieldKind::ObjectSet(_) => KindLabel::Set,
        }
    }

    /// Check how `self` and `other` can be merged
    pub fn compatibility(&self, other: &FieldKind) -> Compatibility {
        match (self, other) {
            (a, b) if a.label() != b.label() => Compatibility::DifferentKind,
            (FieldKind::StringSet, FieldKind::ObjectSet(_))
            | (FieldKind::ObjectSet(_), FieldKind::StringSet) => Compatibility::DifferentElement,
            _ => Compatibility::Same,
        }
    }

    /// Nested fields of an object set
    pub fn nested(&self) -> Option<&FieldTable> {
        match self {
            FieldKind::ObjectSet(nested) => Some(nested),
            _ => None,
        }
    }

    fn from_array_node(node: &Map<String, Value>, pointer: &str) -> Result<Self> {
        let items_pointer = format!("{}/items", pointer);
        let items = match node.get("items") {
            None | Some(Value::Null) => return Ok(FieldKind::StringSet),
            Some(Value::Object(items)) => items,
            Some(_) => bail!("`{}` must be an object", items_pointer),
        };
        let item_type = declared_type(items, &items_pointer);
        match items.get("properties") {
            Some(Value::Object(properties))
                if item_type == Some(OBJECT_TYPE) && !properties.is_empty() =>
            {
                let properties_pointer = format!("{}/properties", items_pointer);
                FieldTable::from_properties(properties, &properties_pointer)
                    .map(FieldKind::ObjectSet)
            }
            None | Some(Value::Null) | Some(Value::Object(_)) => Ok(FieldKind::StringSet),
            Some(_) => bail!("`{}/properties` must be an object", items_pointer),
        }
    }
}

/// Description of a single field of a connector
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldDescriptor {
    /// Name of the property in the API payloads
    pub name: String,
    /// Kind of the field
    pub kind: FieldKind,
    /// Is the field sensitive
    pub sensitive: bool,
    /// Description of the field, verbatim from the document
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// Create a non-sensitive field without description
    pub fn new<T: Into<String>>(name: T, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sensitive: false,
            description: None,
        }
    }

    /// Build the descriptor of the property `name` declared by `node`
    ///
    /// `pointer` locates the node in the document and is only used for error messages.
    pub fn from_node(name: &str, node: &Value, pointer: &str) -> Result<Self> {
        let node = node
            .as_object()
            .ok_or_else(|| anyhow!("Property `{}` must be an object", pointer))?;
        let description = optional_str(node, "description", pointer)?.map(str::to_owned);

        if optional_str(node, "format", pointer)? == Some(PASSWORD_FORMAT) {
            return Ok(Self {
                name: name.to_owned(),
                kind: FieldKind::String,
                sensitive: true,
                description,
            });
        }

        let kind = match declared_type(node, pointer) {
            Some(INTEGER_TYPE) => FieldKind::Integer,
            Some(BOOLEAN_TYPE) => FieldKind::Boolean,
            Some(ARRAY_TYPE) => FieldKind::from_array_node(node, pointer)?,
            _ => FieldKind::String,
        };
        Ok(Self {
            name: name.to_owned(),
            kind,
            sensitive: false,
            description,
        })
    }

    /// Merge a compatible descriptor into `self`
    ///
    /// Sensitivity is sticky, and the first description is kept.
    fn merge(&mut self, other: FieldDescriptor) {
        self.sensitive |= other.sensitive;
        if self.description.as_deref().map_or(true, str::is_empty) {
            self.description = other.description;
        }
        if let (FieldKind::ObjectSet(nested), FieldKind::ObjectSet(other_nested)) =
            (&mut self.kind, other.kind)
        {
            nested.merge_nested(other_nested);
        }
    }
}

fn optional_str<'a>(
    node: &'a Map<String, Value>,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a str>> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(anyhow!("`{}/{}` must be a string", pointer, key)),
    }
}

/// Declared `type` of a node
///
/// Types that are not a single string, like `["string", "null"]`, are not supported and read as undeclared.
fn declared_type<'a>(node: &'a Map<String, Value>, pointer: &str) -> Option<&'a str> {
    match node.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            warn!(pointer, declared = %other, "unsupported type, using string");
            None
        }
    }
}

/// Fields indexed by their attribute name
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FieldTable {
    fields: BTreeMap<String, FieldDescriptor>,
}

/// What to do with a field whose name is already in the table
enum Outcome {
    Insert,
    Merge,
    Rename(String),
}

impl FieldTable {
    /// Create an empty table
    pub fn new() -> Self {
        Default::default()
    }

    /// Build the fields of a `properties` object
    pub fn from_properties(properties: &Map<String, Value>, pointer: &str) -> Result<Self> {
        let mut table = Self::new();
        for (name, node) in properties {
            let field = FieldDescriptor::from_node(name, node, &format!("{}/{}", pointer, name))?;
            table.fields.insert(name.clone(), field);
        }
        Ok(table)
    }

    /// Get a field by its attribute name
    pub fn get(&self, attribute: &str) -> Option<&FieldDescriptor> {
        self.fields.get(attribute)
    }

    /// Check if the table has a field named `attribute`
    pub fn contains(&self, attribute: &str) -> bool {
        self.fields.contains_key(attribute)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the fields, sorted by attribute name
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldDescriptor> {
        self.fields.iter()
    }

    /// Attribute names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Insert a field, replacing any field with the same attribute name
    pub fn insert<T: Into<String>>(
        &mut self,
        attribute: T,
        field: FieldDescriptor,
    ) -> Option<FieldDescriptor> {
        self.fields.insert(attribute.into(), field)
    }

    /// Add a field unless the table already has one named `attribute`
    ///
    /// An existing field keeps its kind and description, but becomes sensitive if `field` is.
    /// Its description is only filled in when it has none.
    pub fn supplement<T: Into<String>>(&mut self, attribute: T, field: FieldDescriptor) {
        match self.fields.entry(attribute.into()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(field);
            }
            btree_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.sensitive |= field.sensitive;
                if existing.description.as_deref().map_or(true, str::is_empty) {
                    existing.description = field.description;
                }
            }
        }
    }

    /// Fold the fields of `service` into the table
    ///
    /// Returns, for every field of the service, the attribute name it ended up with.
    pub fn fold_service(
        &mut self,
        service: &ServiceId,
        fields: FieldTable,
    ) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        for (name, field) in fields.fields {
            let outcome = match self.fields.get(&name) {
                None => Outcome::Insert,
                Some(existing) => match existing.kind.compatibility(&field.kind) {
                    Compatibility::Same => Outcome::Merge,
                    Compatibility::DifferentKind => {
                        Outcome::Rename(format!("{}{}", service, name))
                    }
                    Compatibility::DifferentElement => {
                        Outcome::Rename(format!("{}_{}", service, name).to_lowercase())
                    }
                },
            };
            let attribute = match outcome {
                Outcome::Insert => {
                    self.fields.insert(name.clone(), field);
                    name.clone()
                }
                Outcome::Merge => {
                    if let Some(existing) = self.fields.get_mut(&name) {
                        existing.merge(field);
                    }
                    name.clone()
                }
                Outcome::Rename(renamed) => {
                    warn!(
                        service = service.name(),
                        field = name.as_str(),
                        renamed = renamed.as_str(),
                        "field conflicts with another service"
                    );
                    if self.fields.insert(renamed.clone(), field).is_some() {
                        warn!(
                            attribute = renamed.as_str(),
                            "renamed field replaces an existing attribute"
                        );
                    }
                    renamed
                }
            };
            attributes.insert(name, attribute);
        }
        attributes
    }

    /// Union of nested fields
    ///
    /// Nested fields are never renamed: on conflict the field already present wins.
    fn merge_nested(&mut self, other: FieldTable) {
        for (name, field) in other.fields {
            match self.fields.entry(name) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(field);
                }
                btree_map::Entry::Occupied(mut entry) => {
                    if entry.get().kind.compatibility(&field.kind) == Compatibility::Same {
                        entry.get_mut().merge(field);
                    } else {
                        warn!(
                            field = entry.key().as_str(),
                            "nested field conflicts with another service, keeping the first one"
                        );
                    }
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = (&'a String, &'a FieldDescriptor);
    type IntoIter = btree_map::Iter<'a, String, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, FieldDescriptor)> for FieldTable {
    fn from_iter<I: IntoIterator<Item = (String, FieldDescriptor)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table(properties: Value) -> FieldTable {
        FieldTable::from_properties(properties.as_object().unwrap(), "#").unwrap()
    }

    #[test]
    fn password_format_wins_over_type() {
        let field = FieldDescriptor::from_node(
            "secret",
            &json!({"type": "integer", "format": "password", "description": "Secret."}),
            "#/secret",
        )
        .unwrap();
        assert_eq!(field.kind, FieldKind::String);
        assert!(field.sensitive);
        assert_eq!(field.description.as_deref(), Some("Secret."));
    }

    #[test]
    fn kinds_follow_declared_types() {
        let fields = table(json!({
            "port": {"type": "integer"},
            "tls": {"type": "boolean"},
            "host": {"type": "string"},
            "untyped": {},
            "number": {"type": "number"},
            "hosts": {"type": "array", "items": {"type": "string"}},
            "bare": {"type": "array"},
        }));
        let kind = |name| &fields.get(name).unwrap().kind;
        assert_eq!(kind("port"), &FieldKind::Integer);
        assert_eq!(kind("tls"), &FieldKind::Boolean);
        assert_eq!(kind("host"), &FieldKind::String);
        assert_eq!(kind("untyped"), &FieldKind::String);
        assert_eq!(kind("number"), &FieldKind::String);
        assert_eq!(kind("hosts"), &FieldKind::StringSet);
        assert_eq!(kind("bare"), &FieldKind::StringSet);
        assert!(fields.iter().all(|(_, field)| !field.sensitive));
    }

    #[test]
    fn array_of_objects_becomes_object_set() {
        let fields = table(json!({
            "reports": {"type": "array", "items": {"type": "object", "properties": {
                "table": {"type": "string"},
                "fields": {"type": "array", "items": {"type": "string"}},
                "secret": {"type": "string", "format": "password"},
            }}},
            "empty": {"type": "array", "items": {"type": "object", "properties": {}}},
        }));
        let nested = fields.get("reports").unwrap().kind.nested().unwrap();
        assert_eq!(nested.names().collect::<Vec<_>>(), ["fields", "secret", "table"]);
        assert_eq!(nested.get("fields").unwrap().kind, FieldKind::StringSet);
        assert!(nested.get("secret").unwrap().sensitive);
        assert_eq!(fields.get("empty").unwrap().kind, FieldKind::StringSet);
    }

    #[test]
    fn unsupported_types_are_strings() {
        let fields = table(json!({
            "nullable": {"type": ["string", "null"]},
            "numeric": {"type": 1},
            "list": {"type": "array", "items": {"type": ["object"], "properties": {
                "name": {"type": "string"}
            }}},
        }));
        assert_eq!(fields.get("nullable").unwrap().kind, FieldKind::String);
        assert_eq!(fields.get("numeric").unwrap().kind, FieldKind::String);
        assert_eq!(fields.get("list").unwrap().kind, FieldKind::StringSet);
    }

    #[test]
    fn malformed_nodes_are_errors() {
        let properties = json!({"port": {"type": "integer", "description": 1}});
        let err = FieldTable::from_properties(properties.as_object().unwrap(), "#/config")
            .unwrap_err();
        assert_eq!(err.to_string(), "`#/config/port/description` must be a string");

        let properties = json!({"port": "integer"});
        assert!(FieldTable::from_properties(properties.as_object().unwrap(), "#").is_err());

        let properties = json!({"list": {"type": "array", "items": []}});
        assert!(FieldTable::from_properties(properties.as_object().unwrap(), "#").is_err());
    }

    #[test]
    fn same_kind_is_shared() {
        let mut merged = FieldTable::new();
        merged.fold_service(&ServiceId::new("a"), table(json!({"host": {"type": "string"}})));
        let attributes =
            merged.fold_service(&ServiceId::new("b"), table(json!({"host": {"type": "string"}})));
        assert_eq!(merged.len(), 1);
        assert_eq!(attributes["host"], "host");
    }

    #[test]
    fn different_kind_is_renamed_with_service_id() {
        let mut merged = FieldTable::new();
        merged.fold_service(&ServiceId::new("mysql"), table(json!({"port": {"type": "integer"}})));
        let attributes =
            merged.fold_service(&ServiceId::new("sftp"), table(json!({"port": {"type": "string"}})));
        assert_eq!(merged.get("port").unwrap().kind, FieldKind::Integer);
        assert_eq!(merged.get("sftp_config_V1port").unwrap().kind, FieldKind::String);
        assert_eq!(merged.get("sftp_config_V1port").unwrap().name, "port");
        assert_eq!(attributes["port"], "sftp_config_V1port");
    }

    #[test]
    fn string_set_and_object_set_are_renamed_lowercase() {
        let mut merged = FieldTable::new();
        merged.fold_service(
            &ServiceId::new("facebook_ads"),
            table(json!({"reports": {"type": "array", "items": {"type": "object", "properties": {
                "name": {"type": "string"}
            }}}})),
        );
        let attributes = merged.fold_service(
            &ServiceId::new("youtube_analytics"),
            table(json!({"reports": {"type": "array", "items": {"type": "string"}}})),
        );
        assert!(merged.get("reports").unwrap().kind.nested().is_some());
        assert_eq!(
            merged.get("youtube_analytics_config_v1_reports").unwrap().kind,
            FieldKind::StringSet
        );
        assert_eq!(attributes["reports"], "youtube_analytics_config_v1_reports");
    }

    #[test]
    fn object_sets_are_merged_structurally() {
        let report = |properties: Value| {
            json!({"reports": {"type": "array", "items": {"type": "object", "properties": properties}}})
        };
        let mut merged = FieldTable::new();
        merged.fold_service(
            &ServiceId::new("a"),
            table(report(json!({"name": {"type": "string"}, "fields": {"type": "array"}}))),
        );
        merged.fold_service(
            &ServiceId::new("b"),
            table(report(json!({"table": {"type": "string"}, "fields": {"type": "array"}}))),
        );
        merged.fold_service(
            &ServiceId::new("c"),
            table(report(json!({"name": {"type": "integer"}}))),
        );
        let nested = merged.get("reports").unwrap().kind.nested().unwrap();
        assert_eq!(nested.names().collect::<Vec<_>>(), ["fields", "name", "table"]);
        assert_eq!(nested.get("name").unwrap().kind, FieldKind::String);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn sensitivity_is_sticky() {
        let mut merged = FieldTable::new();
        merged.fold_service(
            &ServiceId::new("a"),
            table(json!({"token": {"type": "string", "format": "password"}})),
        );
        merged.fold_service(&ServiceId::new("b"), table(json!({"token": {"type": "string"}})));
        assert!(merged.get("token").unwrap().sensitive);

        let mut merged = FieldTable::new();
        merged.fold_service(&ServiceId::new("a"), table(json!({"token": {"type": "string"}})));
        merged.fold_service(
            &ServiceId::new("b"),
            table(json!({"token": {"type": "string", "format": "password"}})),
        );
        assert!(merged.get("token").unwrap().sensitive);
    }

    #[test]
    fn first_description_is_kept() {
        let mut merged = FieldTable::new();
        merged.fold_service(&ServiceId::new("a"), table(json!({"host": {"type": "string"}})));
        merged.fold_service(
            &ServiceId::new("b"),
            table(json!({"host": {"type": "string", "description": "Host of b."}})),
        );
        merged.fold_service(
            &ServiceId::new("c"),
            table(json!({"host": {"type": "string", "description": "Host of c."}})),
        );
        assert_eq!(
            merged.get("host").unwrap().description.as_deref(),
            Some("Host of b.")
        );
    }
}
