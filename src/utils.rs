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

use serde::Serialize;
use serde_bytes::ByteBuf;

use crate::diagnostics::Diagnostics;

pub(crate) trait ExtractDiagnostics {
    type Output;
    fn extract_diagnostics(self, diags: &mut Diagnostics) -> Self::Output;
}

impl<T, E> ExtractDiagnostics for Result<T, E>
where
    E: ToString,
{
    type Output = Option<T>;
    fn extract_diagnostics(self, diags: &mut Diagnostics) -> Self::Output {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                diags.root_error_short(err.to_string());
                None
            }
        }
    }
}

pub(crate) trait OptionFactor {
    type Output;
    fn factor(self) -> Self::Output;
}

macro_rules! impl_factor {
    ($($e:ident)+) => {
        impl<$($e),+> OptionFactor for ($(Option<$e>,)+) {
            type Output = Option<($($e,)+)>;
            #[allow(non_snake_case)]
            fn factor(self) -> Self::Output {
                let ($($e,)+) = self;
                Some(($($e?,)+))
            }
        }
    };
}

impl_factor!(A B);
impl_factor!(A B C);

/// MessagePack extension as understood by `rmp_serde`
#[derive(Debug, Serialize)]
#[serde(rename = "_ExtStruct")]
pub(crate) struct ExtStruct(pub(crate) (i8, ByteBuf));

/// Extension type used by Terraform to flag unknown values
pub(crate) const UNKNOWN_EXTENSION: i8 = 0;

/// Unknown values are encoded as the extension 0 with a single zero byte
pub(crate) fn serialize_unknown<S>(serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    ExtStruct((UNKNOWN_EXTENSION, ByteBuf::from(vec![0u8]))).serialize(serializer)
}
