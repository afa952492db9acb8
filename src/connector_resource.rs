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

//! `fivetran_connector` resource and data source

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::attribute_path::AttributePath;
use crate::connector::{
    ConnectorDataSourceState, ConnectorResourceState, ConnectorResponse, DestinationSchema,
};
use crate::data_source::DataSource;
use crate::diagnostics::Diagnostics;
use crate::map;
use crate::resource::Resource;
use crate::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use crate::synthesis::ConnectorSchemas;
use crate::utils::ExtractDiagnostics;
use crate::value::Value;

fn string_attribute(description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn bool_attribute(description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type: AttributeType::Bool,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

fn common_attributes(readonly: bool) -> BTreeMap<String, Attribute> {
    let input = if readonly {
        AttributeConstraint::Computed
    } else {
        AttributeConstraint::Required
    };
    map! {
        "id" => string_attribute(
            "The unique identifier for the connector within the Fivetran system.",
            if readonly { AttributeConstraint::Required } else { AttributeConstraint::Computed },
        ),
        "name" => string_attribute(
            "The name used both as the connector's name within the Fivetran system and as the source schema's name within your destination.",
            AttributeConstraint::Computed,
        ),
        "connected_by" => string_attribute(
            "The unique identifier of the user who has created the connector in your account.",
            AttributeConstraint::Computed,
        ),
        "created_at" => string_attribute(
            "The timestamp of the time the connector was created in your account.",
            AttributeConstraint::Computed,
        ),
        "group_id" => string_attribute(
            "The unique identifier for the Group (Destination) within the Fivetran system.",
            input.clone(),
        ),
        "service" => string_attribute(
            "The connector type id within the Fivetran system.",
            input,
        ),
    }
}

fn destination_schema_attributes(readonly: bool) -> BTreeMap<String, Attribute> {
    let constraint = if readonly {
        AttributeConstraint::Computed
    } else {
        AttributeConstraint::Optional
    };
    map! {
        "name" => string_attribute("The connector schema name in destination. Has to be unique within the group (destination).", constraint.clone()),
        "table" => string_attribute("The table name unique within the schema to which connector will sync the data.", constraint.clone()),
        "prefix" => string_attribute("The connector schema prefix has to be unique within the group (destination). Each replicated schema is prefixed with the provided value.", constraint),
    }
}

fn code_message_attributes() -> BTreeMap<String, Attribute> {
    map! {
        "code" => string_attribute("Response status code", AttributeConstraint::Computed),
        "message" => string_attribute("Response status text", AttributeConstraint::Computed),
    }
}

/// `fivetran_connector` resource
#[derive(Clone, Debug)]
pub struct ConnectorResource {
    schemas: Arc<ConnectorSchemas>,
}

impl ConnectorResource {
    pub fn new(schemas: Arc<ConnectorSchemas>) -> Self {
        Self { schemas }
    }
}

impl Resource for ConnectorResource {
    type State = ConnectorResourceState;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let mut attributes = common_attributes(false);
        attributes.insert(
            "run_setup_tests".to_owned(),
            bool_attribute(
                "Specifies whether the setup tests should be run automatically.",
                AttributeConstraint::Optional,
            ),
        );
        attributes.insert(
            "trust_certificates".to_owned(),
            bool_attribute(
                "Specifies whether we should trust the certificate automatically.",
                AttributeConstraint::Optional,
            ),
        );
        attributes.insert(
            "trust_fingerprints".to_owned(),
            bool_attribute(
                "Specifies whether we should trust the SSH fingerprint automatically.",
                AttributeConstraint::Optional,
            ),
        );

        Some(Schema {
            version: 2,
            block: Block {
                attributes,
                blocks: map! {
                    "destination_schema" => NestedBlock::Single(Block {
                        attributes: destination_schema_attributes(false),
                        description: Description::default(),
                        ..Default::default()
                    }),
                    "config" => NestedBlock::Group(Block {
                        attributes: self.schemas.config.attributes(false),
                        description: Description::default(),
                        ..Default::default()
                    }),
                    "auth" => NestedBlock::Group(Block {
                        attributes: self.schemas.auth.attributes(false),
                        description: Description::default(),
                        ..Default::default()
                    }),
                },
                description: Description::markdown(
                    "This resource allows you to create, update, and delete connectors.",
                ),
                ..Default::default()
            },
        })
    }

    fn validate(&self, diags: &mut Diagnostics, config: Self::State) -> Option<()> {
        let Value::Value(service) = &config.service else {
            return Some(());
        };
        if !self.schemas.has_service(service) {
            diags.error(
                "Unknown connector service",
                format!("unknown connector service: `{}`", service),
                AttributePath::new("service"),
            );
            return None;
        }
        if let Value::Value(destination_schema) = &config.destination_schema {
            let has_unknown = [
                &destination_schema.name,
                &destination_schema.table,
                &destination_schema.prefix,
            ]
            .iter()
            .any(|value| value.is_unknown());
            if !has_unknown {
                self.schemas
                    .destination_schema_for_config(service, destination_schema, diags)?;
            }
        } else if config.destination_schema.is_null() {
            self.schemas.destination_schema_for_config(
                service,
                &DestinationSchema::default(),
                diags,
            )?;
        }
        self.schemas
            .config
            .config_to_api(service, &config.config, diags)?;
        self.schemas.auth.config_to_api(service, &config.auth, diags)?;
        Some(())
    }

    fn read(
        &self,
        diags: &mut Diagnostics,
        mut state: Self::State,
        response: &JsonValue,
    ) -> Option<Self::State> {
        let response =
            ConnectorResponse::deserialize_json(response).extract_diagnostics(diags)?;
        state.read_from_response(&self.schemas, &response.data, diags)?;
        Some(state)
    }
}

/// `fivetran_connector` data source
#[derive(Clone, Debug)]
pub struct ConnectorDataSource {
    schemas: Arc<ConnectorSchemas>,
}

impl ConnectorDataSource {
    pub fn new(schemas: Arc<ConnectorSchemas>) -> Self {
        Self { schemas }
    }
}

impl DataSource for ConnectorDataSource {
    type State = ConnectorDataSourceState;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let mut attributes = common_attributes(true);
        for (name, description) in [
            ("succeeded_at", "The timestamp of the time the connector sync succeeded last time."),
            ("failed_at", "The timestamp of the time the connector sync failed last time."),
            ("service_version", "The connector type version within the Fivetran system."),
            ("schedule_type", "The connector schedule configuration type. Supported values: auto, manual."),
            ("daily_sync_time", "The optional parameter that defines the sync start time when the sync frequency is already set or being set by the current request to 1440."),
        ] {
            attributes.insert(
                name.to_owned(),
                string_attribute(description, AttributeConstraint::Computed),
            );
        }
        attributes.insert(
            "sync_frequency".to_owned(),
            Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("The connector sync frequency in minutes."),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );
        attributes.insert(
            "paused".to_owned(),
            bool_attribute(
                "Specifies whether the connector is paused.",
                AttributeConstraint::Computed,
            ),
        );
        attributes.insert(
            "pause_after_trial".to_owned(),
            bool_attribute(
                "Specifies whether the connector should be paused after the free trial period has ended.",
                AttributeConstraint::Computed,
            ),
        );
        attributes.insert(
            "destination_schema".to_owned(),
            Attribute {
                attr_type: AttributeType::AttributeSingle(destination_schema_attributes(true)),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );
        attributes.insert(
            "status".to_owned(),
            Attribute {
                attr_type: AttributeType::AttributeSingle(map! {
                    "setup_state" => string_attribute("The current setup state of the connector.", AttributeConstraint::Computed),
                    "is_historical_sync" => bool_attribute("The boolean specifying whether the connector should be triggered to re-sync all historical data.", AttributeConstraint::Computed),
                    "sync_state" => string_attribute("The current sync state of the connector.", AttributeConstraint::Computed),
                    "update_state" => string_attribute("The current data update state of the connector.", AttributeConstraint::Computed),
                    "tasks" => Attribute {
                        attr_type: AttributeType::AttributeSet(code_message_attributes()),
                        description: Description::plain("The collection of tasks for the connector."),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "warnings" => Attribute {
                        attr_type: AttributeType::AttributeSet(code_message_attributes()),
                        description: Description::plain("The collection of warnings for the connector."),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                }),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );
        attributes.insert(
            "config".to_owned(),
            Attribute {
                attr_type: AttributeType::AttributeSingle(self.schemas.config.attributes(true)),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );

        Some(Schema {
            version: 0,
            block: Block {
                attributes,
                description: Description::markdown(
                    "This data source returns a connector object.",
                ),
                ..Default::default()
            },
        })
    }

    fn read(
        &self,
        diags: &mut Diagnostics,
        mut config: Self::State,
        response: &JsonValue,
    ) -> Option<Self::State> {
        let response =
            ConnectorResponse::deserialize_json(response).extract_diagnostics(diags)?;
        config.read_from_response(&self.schemas, &response.data, diags)?;
        Some(config)
    }
}
