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

//! [`Provider`] module

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::attribute_path::AttributePath;
use crate::connector_resource::{ConnectorDataSource, ConnectorResource};
use crate::data_source::DynamicDataSource;
use crate::diagnostics::Diagnostics;
use crate::map;
use crate::oas::OpenApiSpec;
use crate::raw::RawValue;
use crate::resource::DynamicResource;
use crate::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, Schema};
use crate::synthesis::ConnectorSchemas;
use crate::utils::OptionFactor;
use crate::value::{Value, ValueString};

/// Address of the provider in the registry
pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/fivetran/fivetran";
/// API used when none is configured
pub const DEFAULT_API_URL: &str = "https://api.fivetran.com/v1";
pub const APIKEY_ENV: &str = "FIVETRAN_APIKEY";
pub const APISECRET_ENV: &str = "FIVETRAN_APISECRET";
pub const APIURL_ENV: &str = "FIVETRAN_APIURL";

/// Trait for implementing a provider with automatic serialization/deserialization
pub trait Provider {
    /// Configuration of the provider
    type Config: Serialize + DeserializeOwned;

    /// Get the schema of the provider
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;

    /// Validate the configuration of the provider
    fn validate(&self, diags: &mut Diagnostics, config: Self::Config) -> Option<()>;

    /// Configure the provider
    fn configure(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config,
    ) -> Option<()>;

    /// Get the resources of the provider
    fn get_resources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicResource>>>;

    /// Get the data sources of the provider
    fn get_data_sources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicDataSource>>>;
}

/// Trait for implementing a provider without automatic serialization/deserialization
///
/// Implemented for every [`Provider`].
pub trait DynamicProvider {
    /// Get the schema of the provider
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema>;

    /// Validate the configuration of the provider
    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()>;

    /// Configure the provider
    fn configure(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: RawValue,
    ) -> Option<()>;

    /// Get the resources of the provider
    fn get_resources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicResource>>>;

    /// Get the data sources of the provider
    fn get_data_sources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicDataSource>>>;
}

impl<T: Provider> DynamicProvider for T {
    fn schema(&self, diags: &mut Diagnostics) -> Option<Schema> {
        <T as Provider>::schema(self, diags)
    }

    fn validate(&self, diags: &mut Diagnostics, config: RawValue) -> Option<()> {
        let config = config.deserialize(diags)?;
        <T as Provider>::validate(self, diags, config)
    }

    fn configure(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: RawValue,
    ) -> Option<()> {
        let config = config.deserialize(diags)?;
        <T as Provider>::configure(self, diags, terraform_version, config)
    }

    fn get_resources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicResource>>> {
        <T as Provider>::get_resources(self, diags)
    }

    fn get_data_sources(
        &self,
        diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicDataSource>>> {
        <T as Provider>::get_data_sources(self, diags)
    }
}

/// Configuration of the provider, as written by the practitioner
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: ValueString,
    pub api_secret: ValueString,
    pub api_url: ValueString,
}

/// Resolved credentials to access the API
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn resolve(
    value: &ValueString,
    name: &'static str,
    env: &'static str,
    required: bool,
    diags: &mut Diagnostics,
) -> Option<String> {
    match value {
        Value::Value(value) => Some(value.clone()),
        Value::Null => match std::env::var(env) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => {
                if required {
                    diags.error(
                        format!("Missing `{}`", name),
                        format!(
                            "`{}` must be set in the provider configuration or with the `{}` environment variable",
                            name, env
                        ),
                        AttributePath::new(name),
                    );
                }
                None
            }
        },
        Value::Unknown => {
            diags.error_short(
                format!("`{}` must be known when configuring the provider", name),
                AttributePath::new(name),
            );
            None
        }
    }
}

impl ProviderConfig {
    /// Resolve the credentials, falling back on the environment for missing values
    pub fn resolve(&self, diags: &mut Diagnostics) -> Option<Credentials> {
        let errors = diags.errors.len();
        let api_key = resolve(&self.api_key, "api_key", APIKEY_ENV, true, diags);
        let api_secret = resolve(&self.api_secret, "api_secret", APISECRET_ENV, true, diags);
        let api_url = resolve(&self.api_url, "api_url", APIURL_ENV, false, diags);
        if diags.errors.len() != errors {
            return None;
        }
        let (api_key, api_secret) = (api_key, api_secret).factor()?;
        Some(Credentials {
            api_key,
            api_secret,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
        })
    }
}

/// Fivetran provider
#[derive(Debug)]
pub struct FivetranProvider {
    schemas: Arc<ConnectorSchemas>,
    credentials: OnceLock<Credentials>,
}

impl FivetranProvider {
    /// Build the provider from the embedded OpenAPI document
    pub fn new() -> Result<Self> {
        Self::from_spec(&OpenApiSpec::embedded()?)
    }

    /// Build the provider from an OpenAPI document
    pub fn from_spec(spec: &OpenApiSpec) -> Result<Self> {
        Ok(Self {
            schemas: Arc::new(ConnectorSchemas::synthesize(spec)?),
            credentials: OnceLock::new(),
        })
    }

    /// Synthesized connector schemas
    pub fn schemas(&self) -> &ConnectorSchemas {
        &self.schemas
    }

    /// Credentials, once the provider has been configured
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.get()
    }
}

impl Provider for FivetranProvider {
    type Config = ProviderConfig;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 0,
            block: Block {
                attributes: map! {
                    "api_key" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!("Defaults to the `{}` environment variable.", APIKEY_ENV)),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "api_secret" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!("Defaults to the `{}` environment variable.", APISECRET_ENV)),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "api_url" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!("Defaults to the `{}` environment variable, or `{}`.", APIURL_ENV, DEFAULT_API_URL)),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::default(),
                ..Default::default()
            },
        })
    }

    fn validate(&self, diags: &mut Diagnostics, config: Self::Config) -> Option<()> {
        if let Value::Value(api_url) = &config.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                diags.error(
                    "Invalid `api_url`",
                    format!("`{}` is not an HTTP(S) URL", api_url),
                    AttributePath::new("api_url"),
                );
                return None;
            }
        }
        Some(())
    }

    fn configure(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config,
    ) -> Option<()> {
        let credentials = config.resolve(diags)?;
        info!(
            terraform_version = terraform_version.as_str(),
            api_url = credentials.api_url.as_str(),
            "provider configured"
        );
        if self.credentials.set(credentials).is_err() {
            warn!("provider was already configured, keeping the first configuration");
        }
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "fivetran_connector" => Box::new(ConnectorResource::new(self.schemas.clone())) as Box<dyn DynamicResource>,
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<BTreeMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "fivetran_connector" => Box::new(ConnectorDataSource::new(self.schemas.clone())) as Box<dyn DynamicDataSource>,
        })
    }
}

/// Schemas of a provider, its resources and its data sources
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resource_schemas: BTreeMap<String, Schema>,
    pub data_source_schemas: BTreeMap<String, Schema>,
}

/// Document in the layout of `terraform providers schema -json`
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ProviderSchemas {
    pub format_version: String,
    pub provider_schemas: BTreeMap<String, ProviderSchema>,
}

impl ProviderSchemas {
    /// Collect the schemas of `provider`
    pub fn collect(
        address: &str,
        provider: &dyn DynamicProvider,
        diags: &mut Diagnostics,
    ) -> Option<Self> {
        let schema = provider.schema(diags)?;
        let mut resource_schemas = BTreeMap::new();
        for (name, resource) in provider.get_resources(diags)? {
            if let Some(schema) = resource.schema(diags) {
                resource_schemas.insert(name, schema);
            }
        }
        let mut data_source_schemas = BTreeMap::new();
        for (name, data_source) in provider.get_data_sources(diags)? {
            if let Some(schema) = data_source.schema(diags) {
                data_source_schemas.insert(name, schema);
            }
        }
        if diags.has_errors() {
            return None;
        }
        Some(Self {
            format_version: "1.0".to_owned(),
            provider_schemas: map! {
                address => ProviderSchema {
                    provider: schema,
                    resource_schemas,
                    data_source_schemas,
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: ValueString, api_secret: ValueString) -> ProviderConfig {
        ProviderConfig {
            api_key,
            api_secret,
            api_url: Value::Null,
        }
    }

    #[test]
    fn explicit_credentials_win_over_environment() {
        temp_env::with_vars(
            [
                (APIKEY_ENV, Some("env-key")),
                (APISECRET_ENV, Some("env-secret")),
                (APIURL_ENV, None),
            ],
            || {
                let mut diags = Diagnostics::default();
                let credentials = config("key".to_owned().into(), Value::Null)
                    .resolve(&mut diags)
                    .unwrap();
                assert_eq!(credentials.api_key, "key");
                assert_eq!(credentials.api_secret, "env-secret");
                assert_eq!(credentials.api_url, DEFAULT_API_URL);
            },
        );
    }

    #[test]
    fn api_url_falls_back_on_environment() {
        temp_env::with_vars(
            [
                (APIKEY_ENV, Some("key")),
                (APISECRET_ENV, Some("secret")),
                (APIURL_ENV, Some("https://example.com/v1")),
            ],
            || {
                let mut diags = Diagnostics::default();
                let credentials = ProviderConfig::default().resolve(&mut diags).unwrap();
                assert_eq!(credentials.api_url, "https://example.com/v1");
            },
        );
    }

    #[test]
    fn missing_credentials_are_reported() {
        temp_env::with_vars(
            [(APIKEY_ENV, None::<&str>), (APISECRET_ENV, None), (APIURL_ENV, None)],
            || {
                let mut diags = Diagnostics::default();
                assert!(ProviderConfig::default().resolve(&mut diags).is_none());
                assert_eq!(diags.errors.len(), 2);
                assert_eq!(diags.errors[0].attribute.to_string(), "api_key");
                assert_eq!(diags.errors[1].attribute.to_string(), "api_secret");
            },
        );
    }

    #[test]
    fn unknown_credentials_are_reported_once() {
        temp_env::with_vars([(APISECRET_ENV, Some("secret"))], || {
            let mut diags = Diagnostics::default();
            assert!(config(Value::Unknown, Value::Null)
                .resolve(&mut diags)
                .is_none());
            assert_eq!(diags.errors.len(), 1);
        });
    }

    #[test]
    fn secret_is_not_displayed() {
        let credentials = Credentials {
            api_key: "key".to_owned(),
            api_secret: "secret".to_owned(),
            api_url: DEFAULT_API_URL.to_owned(),
        };
        assert!(!format!("{:?}", credentials).contains("\"secret\""));
    }

    #[test]
    fn configure_stores_credentials() {
        let provider = FivetranProvider::new().unwrap();
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            api_key: "key".to_owned().into(),
            api_secret: "secret".to_owned().into(),
            api_url: "https://example.com".to_owned().into(),
        };
        assert!(Provider::configure(&provider, &mut diags, "1.9.0".to_owned(), config).is_some());
        assert_eq!(provider.credentials().unwrap().api_url, "https://example.com");
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let provider = FivetranProvider::new().unwrap();
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            api_url: "ftp://example.com".to_owned().into(),
            ..Default::default()
        };
        assert!(Provider::validate(&provider, &mut diags, config).is_none());
        assert_eq!(diags.errors[0].attribute.to_string(), "api_url");
    }
}
