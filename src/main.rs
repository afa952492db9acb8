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

use std::{env, fs::File, sync::Mutex};

use anyhow::Result;
use tf_provider_fivetran::{Diagnostics, FivetranProvider, ProviderSchemas, PROVIDER_ADDRESS};

fn main() -> Result<()> {
    if let Ok(path) = env::var("PLUGIN_LOG_FILE") {
        let log_file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .init();
    }

    let provider = FivetranProvider::new()?;
    let mut diags = Diagnostics::default();
    let schemas = ProviderSchemas::collect(PROVIDER_ADDRESS, &provider, &mut diags);
    for warning in &diags.warnings {
        tracing::warn!("{}", warning);
    }
    diags.into_result()?;
    if let Some(schemas) = schemas {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
    }
    Ok(())
}
