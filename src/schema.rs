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

//! Terraform schema model
//!
//! Schemas are rendered in the layout of `terraform providers schema -json`.

use std::{collections::BTreeMap, fmt::Display};

use serde::{ser::SerializeMap, Serialize};

/// Specify if a description must interpreted as markdown or plain
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum StringKind {
    #[default]
    Plain = 0,
    Markdown = 1,
}

impl StringKind {
    fn name(&self) -> &'static str {
        match self {
            StringKind::Plain => "plain",
            StringKind::Markdown => "markdown",
        }
    }
}

/// Description
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Description {
    /// Kind of the description (either `Plain` or `Markdown`)
    pub kind: StringKind,
    /// Content of the description
    pub content: String,
}

impl Description {
    /// Create a plain description
    pub fn plain<T>(content: T) -> Self
    where
        T: ToString,
    {
        Self {
            kind: StringKind::Plain,
            content: content.to_string(),
        }
    }
    /// Create a markdown description
    pub fn markdown<T>(content: T) -> Self
    where
        T: ToString,
    {
        Self {
            kind: StringKind::Markdown,
            content: content.to_string(),
        }
    }

    fn serialize_into<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        if !self.content.is_empty() {
            map.serialize_entry("description", &self.content)?;
            map.serialize_entry("description_kind", self.kind.name())?;
        }
        Ok(())
    }
}

impl<T> From<T> for Description
where
    T: ToString,
{
    fn from(value: T) -> Self {
        Description::plain(value.to_string())
    }
}

/// NestedBlock
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NestedBlock {
    /// The nested block must appear exactly once
    Single(Block),
    /// The nested block can appear multiple times
    List(Block),
    /// The nested block can appear multiple times (unordered)
    Set(Block),
    /// The nested block can appear at most once (if not given, it will be populate with Nulls)
    Group(Block),
}

impl Serialize for NestedBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (nesting_mode, block, min_items) = match self {
            NestedBlock::Single(block) => ("single", block, 1),
            NestedBlock::List(block) => ("list", block, 0),
            NestedBlock::Set(block) => ("set", block, 0),
            NestedBlock::Group(block) => ("group", block, 0),
        };
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("nesting_mode", nesting_mode)?;
        map.serialize_entry("block", block)?;
        if min_items > 0 {
            map.serialize_entry("min_items", &min_items)?;
            map.serialize_entry("max_items", &1)?;
        }
        map.end()
    }
}

/// Block
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Block {
    /// Attributes of the block
    pub attributes: BTreeMap<String, Attribute>,
    /// Nested blocks of the block
    pub blocks: BTreeMap<String, NestedBlock>,
    /// Description for the block
    pub description: Description,
    /// Is the block deprecated
    pub deprecated: bool,
}

impl Default for Block {
    /// Create an empty block (with a description "empty")
    fn default() -> Block {
        Block {
            attributes: Default::default(),
            blocks: Default::default(),
            description: "empty".into(),
            deprecated: false,
        }
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if !self.attributes.is_empty() {
            map.serialize_entry("attributes", &self.attributes)?;
        }
        if !self.blocks.is_empty() {
            map.serialize_entry("block_types", &self.blocks)?;
        }
        self.description.serialize_into(&mut map)?;
        if self.deprecated {
            map.serialize_entry("deprecated", &true)?;
        }
        map.end()
    }
}

/// Specify the Attribute type
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AttributeType {
    /// String
    String,
    /// Number (int or float)
    Number,
    /// Boolean
    Bool,
    /// List
    List(Box<AttributeType>),
    /// Set
    Set(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Object
    Object(BTreeMap<String, AttributeType>),
    /// Nested attributes
    AttributeSingle(BTreeMap<String, Attribute>),
    /// Set of nested attributes
    AttributeSet(BTreeMap<String, Attribute>),
}

impl AttributeType {
    /// Nesting mode and attributes of nested attributes
    fn nested(&self) -> Option<(&'static str, &BTreeMap<String, Attribute>)> {
        match self {
            AttributeType::AttributeSingle(attrs) => Some(("single", attrs)),
            AttributeType::AttributeSet(attrs) => Some(("set", attrs)),
            _ => None,
        }
    }
}

impl Serialize for AttributeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct AttributesAsType<'a>(&'a BTreeMap<String, Attribute>);
        impl<'a> Serialize for AttributesAsType<'a> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, attr) in self.0 {
                    map.serialize_entry(name, &attr.attr_type)?;
                }
                map.end()
            }
        }
        match self {
            AttributeType::String => serializer.serialize_str("string"),
            AttributeType::Number => serializer.serialize_str("number"),
            AttributeType::Bool => serializer.serialize_str("bool"),
            AttributeType::List(attr) => ("list", attr).serialize(serializer),
            AttributeType::Set(attr) => ("set", attr).serialize(serializer),
            AttributeType::Map(attr) => ("map", attr).serialize(serializer),
            AttributeType::Object(attrs) => ("object", attrs).serialize(serializer),
            AttributeType::AttributeSingle(attrs) => {
                ("object", &AttributesAsType(attrs)).serialize(serializer)
            }
            AttributeType::AttributeSet(attrs) => {
                ("set", ("object", &AttributesAsType(attrs))).serialize(serializer)
            }
        }
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(
            serde_json::to_string(self)
                .or(Err(std::fmt::Error))?
                .as_str(),
        );
    }
}

/// Specify the Attribute type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum AttributeConstraint {
    /// The attribute is computed, but cannot be specified by the practitioner (output only)
    Computed,
    /// The attribute is optional, and the provider cannot generate a value for it
    Optional,
    /// The attribute is both optional and computed:
    /// the practitioner can omit the value, and the provider can generate a value for it
    OptionalComputed,
    /// The attribute is required
    Required,
}

/// Attribute
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Attribute {
    /// Type of the Attribute
    pub attr_type: AttributeType,
    /// Description of the Attribute
    pub description: Description,
    /// Is the attribute required
    pub constraint: AttributeConstraint,
    /// Is the attribute sensitive
    pub sensitive: bool,
    /// Is the attribute deprecated
    pub deprecated: bool,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            attr_type: AttributeType::String,
            description: Description::default(),
            constraint: AttributeConstraint::OptionalComputed,
            sensitive: false,
            deprecated: false,
        }
    }
}

impl Serialize for Attribute {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct NestedType<'a>(&'static str, &'a BTreeMap<String, Attribute>);
        impl<'a> Serialize for NestedType<'a> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("attributes", self.1)?;
                map.serialize_entry("nesting_mode", self.0)?;
                map.end()
            }
        }

        let mut map = serializer.serialize_map(None)?;
        match self.attr_type.nested() {
            Some((nesting_mode, attrs)) => {
                map.serialize_entry("nested_type", &NestedType(nesting_mode, attrs))?
            }
            None => map.serialize_entry("type", &self.attr_type)?,
        }
        self.description.serialize_into(&mut map)?;
        let (required, optional, computed) = match self.constraint {
            AttributeConstraint::Computed => (false, false, true),
            AttributeConstraint::Optional => (false, true, false),
            AttributeConstraint::OptionalComputed => (false, true, true),
            AttributeConstraint::Required => (true, false, false),
        };
        for (flag, set) in [
            ("required", required),
            ("optional", optional),
            ("computed", computed),
            ("sensitive", self.sensitive),
            ("deprecated", self.deprecated),
        ] {
            if set {
                map.serialize_entry(flag, &true)?;
            }
        }
        map.end()
    }
}

/// Schema
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Schema {
    /// Version of the schema
    pub version: i64,
    /// Root block of the schema
    pub block: Block,
}
