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

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tf_provider_fivetran::{ConnectorSchemas, FieldKind, FieldTable, OpenApiSpec, ServiceId};

fn field_kind() -> impl Strategy<Value = (&'static str, FieldKind)> {
    prop_oneof![
        Just(("string", FieldKind::String)),
        Just(("integer", FieldKind::Integer)),
        Just(("boolean", FieldKind::Boolean)),
        Just(("array", FieldKind::StringSet)),
    ]
}

fn property(name: &str, node: Value) -> FieldTable {
    let mut properties = Map::new();
    properties.insert(name.to_owned(), node);
    FieldTable::from_properties(&properties, "#").unwrap()
}

fn document(services: &[(String, Vec<(String, &'static str)>)]) -> Vec<u8> {
    let mut mapping = Map::new();
    let mut schemas = Map::new();
    for (service, fields) in services {
        mapping.insert(
            service.clone(),
            json!(format!("#/components/schemas/{}_config_V1", service)),
        );
        let properties = fields
            .iter()
            .map(|(name, ty)| (name.clone(), json!({"type": ty})))
            .collect::<Map<_, _>>();
        schemas.insert(
            format!("{}_config_V1", service),
            json!({"properties": {"config": {"properties": properties}}}),
        );
    }
    schemas.insert(
        "NewConnectorRequestV1".to_owned(),
        json!({"discriminator": {"mapping": mapping}}),
    );
    serde_json::to_vec(&json!({"components": {"schemas": schemas}})).unwrap()
}

proptest! {
    /// Property: services declaring a field with the same kind share one descriptor
    #[test]
    fn same_kind_is_shared(
        services in prop::collection::btree_set("[a-z]{3,8}", 2..6),
        (ty, kind) in field_kind(),
        name in "[a-z_]{1,10}",
    ) {
        let mut merged = FieldTable::new();
        for service in &services {
            let attributes = merged.fold_service(&ServiceId::new(service), property(&name, json!({"type": ty})));
            prop_assert_eq!(&attributes[&name], &name);
        }
        prop_assert_eq!(merged.len(), 1);
        prop_assert_eq!(&merged.get(&name).unwrap().kind, &kind);
    }

    /// Property: a field with a different kind is renamed after the service
    #[test]
    fn different_kinds_are_renamed(
        first in field_kind(),
        second in field_kind(),
        name in "[a-z_]{1,10}",
    ) {
        prop_assume!(first.1 != second.1);
        let mut merged = FieldTable::new();
        merged.fold_service(&ServiceId::new("alpha"), property(&name, json!({"type": first.0})));
        let attributes = merged.fold_service(&ServiceId::new("beta"), property(&name, json!({"type": second.0})));

        let renamed = format!("beta_config_V1{}", name);
        prop_assert_eq!(&attributes[&name], &renamed);
        prop_assert_eq!(merged.len(), 2);
        prop_assert_eq!(&merged.get(&name).unwrap().kind, &first.1);
        prop_assert_eq!(&merged.get(&renamed).unwrap().kind, &second.1);
        prop_assert_eq!(&merged.get(&renamed).unwrap().name, &name);
    }

    /// Property: a shared field is sensitive as soon as one service marks it as a password
    #[test]
    fn sensitivity_wins(flags in prop::collection::vec(any::<bool>(), 1..6)) {
        let mut merged = FieldTable::new();
        for (i, sensitive) in flags.iter().enumerate() {
            let node = if *sensitive {
                json!({"type": "string", "format": "password"})
            } else {
                json!({"type": "string"})
            };
            merged.fold_service(&ServiceId::new(&format!("service{}", i)), property("token", node));
        }
        prop_assert_eq!(merged.len(), 1);
        prop_assert_eq!(merged.get("token").unwrap().sensitive, flags.iter().any(|s| *s));
    }

    /// Property: object sets keep every nested field of every service
    #[test]
    fn nested_fields_are_united(
        shapes in prop::collection::vec(prop::collection::btree_set("[a-z]{1,6}", 1..5), 1..5),
    ) {
        let mut merged = FieldTable::new();
        for (i, names) in shapes.iter().enumerate() {
            let properties = names
                .iter()
                .map(|name| (name.clone(), json!({"type": "string"})))
                .collect::<Map<_, _>>();
            merged.fold_service(
                &ServiceId::new(&format!("service{}", i)),
                property("reports", json!({"type": "array", "items": {"type": "object", "properties": properties}})),
            );
        }
        let expected = shapes.iter().flatten().map(String::as_str).collect::<BTreeSet<_>>();
        let nested = merged.get("reports").unwrap().kind.nested().unwrap();
        prop_assert_eq!(nested.names().collect::<BTreeSet<_>>(), expected);
    }

    /// Property: synthesizing the same document twice gives the same schemas
    #[test]
    fn synthesis_is_deterministic(
        services in prop::collection::btree_map(
            "[a-z]{3,8}",
            prop::collection::vec(("[a-c]", field_kind()), 0..4),
            1..6,
        ),
    ) {
        let services = services
            .into_iter()
            .map(|(service, fields)| {
                let fields: Vec<(String, &'static str)> =
                    fields.into_iter().map(|(name, (ty, _))| (name, ty)).collect();
                (service, fields)
            })
            .collect::<Vec<_>>();
        let spec = OpenApiSpec::parse(&document(&services)).unwrap();
        let first = ConnectorSchemas::synthesize(&spec).unwrap();
        let second = ConnectorSchemas::synthesize(&spec).unwrap();
        prop_assert_eq!(first.config.fields().len(), second.config.fields().len());
        prop_assert_eq!(first, second);
    }
}
