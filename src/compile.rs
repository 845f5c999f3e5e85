//! Avro JSON schema compiler: schema text → validated [`Schema`] tree.
//!
//! This is the generator's input boundary, deliberately small. It accepts
//! the standard schema forms (primitive name strings, `record` / `enum` /
//! `fixed` / `array` / `map` objects, unions as JSON arrays, named-type
//! references) and interns named types so that every reference to a name
//! resolves to the identity of its declaration. A record's id is allocated
//! before its fields are compiled, which is all it takes for recursive
//! schemas to come out as cycles in the arena.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{Field, Node, NodeId, Primitive, Schema, SchemaBuilder};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON at {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown type {0:?}")]
    UnknownType(String),
    #[error("type {0:?} is declared more than once")]
    DuplicateName(String),
    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Compile Avro schema JSON text.
pub fn compile_schema(text: &str) -> Result<Schema, SchemaError> {
    let mut de = serde_json::Deserializer::from_str(text);
    let value: Value =
        serde_path_to_error::deserialize(&mut de).map_err(|error| SchemaError::Json {
            path: error.path().to_string(),
            source: error.into_inner(),
        })?;
    compile_schema_value(&value)
}

/// Compile an already-parsed schema document.
pub fn compile_schema_value(value: &Value) -> Result<Schema, SchemaError> {
    let mut compiler = Compiler::default();
    let root = compiler.compile_node(value, None)?;
    Ok(compiler.builder.finish(root))
}

/// Raw record field as it appears in schema JSON.
#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: Value,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Default)]
struct Compiler {
    builder: SchemaBuilder,
    /// Full name → declaration id, in declaration order.
    names: IndexMap<String, NodeId>,
}

impl Compiler {
    fn compile_node(
        &mut self,
        value: &Value,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        match value {
            Value::String(name) => self.compile_name(name, enclosing_ns),
            Value::Array(branches) => self.compile_union(branches, enclosing_ns),
            Value::Object(attrs) => self.compile_object(attrs, enclosing_ns),
            other => Err(SchemaError::Invalid(format!(
                "expected a type name, a union array or a schema object, found {other}"
            ))),
        }
    }

    /// A bare type name: either a primitive or a reference to a declared
    /// named type.
    fn compile_name(
        &mut self,
        name: &str,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        if let Some(primitive) = Primitive::from_name(name) {
            return Ok(self.builder.push(Node::Primitive(primitive)));
        }
        let target = self
            .lookup(name, enclosing_ns)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        Ok(self.builder.push(Node::Ref { target }))
    }

    fn lookup(&self, name: &str, enclosing_ns: Option<&str>) -> Option<NodeId> {
        if name.contains('.') {
            return self.names.get(name).copied();
        }
        if let Some(ns) = enclosing_ns {
            if let Some(&id) = self.names.get(&format!("{ns}.{name}")) {
                return Some(id);
            }
        }
        self.names.get(name).copied()
    }

    fn compile_union(
        &mut self,
        branches: &[Value],
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        if branches.is_empty() {
            return Err(SchemaError::Invalid("union has no branches".to_string()));
        }
        let mut ids = Vec::with_capacity(branches.len());
        let mut null_branches = 0usize;
        for branch in branches {
            let id = self.compile_node(branch, enclosing_ns)?;
            match self.builder.node(self.builder.resolve(id)) {
                Node::Union { .. } => {
                    return Err(SchemaError::Invalid(
                        "unions may not immediately contain other unions".to_string(),
                    ));
                }
                Node::Primitive(Primitive::Null) => {
                    null_branches += 1;
                    if null_branches > 1 {
                        return Err(SchemaError::Invalid(
                            "union has more than one null branch".to_string(),
                        ));
                    }
                }
                _ => {}
            }
            ids.push(id);
        }
        Ok(self.builder.push(Node::Union { branches: ids }))
    }

    fn compile_object(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        let ty = attrs
            .get("type")
            .ok_or_else(|| SchemaError::Invalid("schema object has no \"type\"".to_string()))?;
        let Some(ty) = ty.as_str() else {
            // {"type": <schema>} wrapping, e.g. {"type": ["null", "int"]}
            return self.compile_node(ty, enclosing_ns);
        };
        if let Some(primitive) = Primitive::from_name(ty) {
            return Ok(self.builder.push(Node::Primitive(primitive)));
        }
        match ty {
            "record" => self.compile_record(attrs, enclosing_ns),
            "enum" => self.compile_enum(attrs, enclosing_ns),
            "fixed" => self.compile_fixed(attrs, enclosing_ns),
            "array" => {
                let items = attrs.get("items").ok_or_else(|| {
                    SchemaError::Invalid("array schema has no \"items\"".to_string())
                })?;
                let items = self.compile_node(items, enclosing_ns)?;
                Ok(self.builder.push(Node::Array { items }))
            }
            "map" => {
                let values = attrs.get("values").ok_or_else(|| {
                    SchemaError::Invalid("map schema has no \"values\"".to_string())
                })?;
                let values = self.compile_node(values, enclosing_ns)?;
                Ok(self.builder.push(Node::Map { values }))
            }
            // {"type": "SomeName"} is a reference in object clothing
            other => self.compile_name(other, enclosing_ns),
        }
    }

    fn compile_record(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        let (simple, fullname, ns) = self.qualified_name(attrs, enclosing_ns)?;
        if self.names.contains_key(&fullname) {
            return Err(SchemaError::DuplicateName(fullname));
        }
        // Register before compiling fields: recursive references must
        // land on this id.
        let id = self.builder.reserve_record(&simple);
        self.names.insert(fullname, id);

        let doc = attrs.get("doc").and_then(Value::as_str).map(str::to_string);
        let raw_fields = attrs.get("fields").ok_or_else(|| {
            SchemaError::Invalid(format!("record {simple:?} has no \"fields\""))
        })?;
        let raw_fields: Vec<RawField> =
            serde_json::from_value(raw_fields.clone()).map_err(|error| {
                SchemaError::Invalid(format!("record {simple:?} has invalid fields: {error}"))
            })?;

        let mut fields = Vec::with_capacity(raw_fields.len());
        for raw in raw_fields {
            let ty = self.compile_node(&raw.ty, ns.as_deref())?;
            fields.push(Field {
                name: raw.name,
                ty,
                doc: raw.doc,
            });
        }
        self.builder.set(
            id,
            Node::Record {
                name: simple,
                fields,
                doc,
            },
        );
        Ok(id)
    }

    fn compile_enum(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        let (simple, fullname, _) = self.qualified_name(attrs, enclosing_ns)?;
        if self.names.contains_key(&fullname) {
            return Err(SchemaError::DuplicateName(fullname));
        }
        let symbols: Vec<String> = attrs
            .get("symbols")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|error| {
                SchemaError::Invalid(format!("enum {simple:?} has invalid symbols: {error}"))
            })?
            .ok_or_else(|| SchemaError::Invalid(format!("enum {simple:?} has no \"symbols\"")))?;
        if symbols.is_empty() {
            return Err(SchemaError::Invalid(format!("enum {simple:?} has no symbols")));
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(SchemaError::Invalid(format!(
                    "enum {simple:?} repeats symbol {symbol:?}"
                )));
            }
        }
        let doc = attrs.get("doc").and_then(Value::as_str).map(str::to_string);
        let id = self.builder.push(Node::Enum {
            name: simple,
            symbols,
            doc,
        });
        self.names.insert(fullname, id);
        Ok(id)
    }

    fn compile_fixed(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<NodeId, SchemaError> {
        let (simple, fullname, _) = self.qualified_name(attrs, enclosing_ns)?;
        if self.names.contains_key(&fullname) {
            return Err(SchemaError::DuplicateName(fullname));
        }
        let size = attrs
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| SchemaError::Invalid(format!("fixed {simple:?} has no \"size\"")))?;
        let id = self.builder.push(Node::Fixed {
            name: simple,
            size: size as usize,
        });
        self.names.insert(fullname, id);
        Ok(id)
    }

    /// Split a named type's attributes into (simple name, full name,
    /// namespace). A dot inside "name" wins over the "namespace"
    /// attribute, which wins over the enclosing namespace.
    fn qualified_name(
        &self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<(String, String, Option<String>), SchemaError> {
        let name = attrs
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::Invalid("named type has no \"name\"".to_string()))?;
        if let Some((ns, simple)) = name.rsplit_once('.') {
            return Ok((simple.to_string(), name.to_string(), Some(ns.to_string())));
        }
        let ns = attrs
            .get("namespace")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| enclosing_ns.map(str::to_string));
        let fullname = match &ns {
            Some(ns) => format!("{ns}.{name}"),
            None => name.to_string(),
        };
        Ok((name.to_string(), fullname, ns))
    }
}

// ------------------------------- Tests ------------------------------------ //
