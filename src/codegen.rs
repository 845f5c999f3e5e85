//! C++ header generation from a compiled schema.
//!
//! Two walks over the same graph: type declarations first (depth-first,
//! memoized per node identity, cycles broken with forward declarations),
//! then codec traits in post-order so a codec's callees are always defined
//! before its callers. All traversal state lives in the `CodeGen` value
//! and dies with the run.

pub mod unions;

use std::collections::{HashMap, HashSet};

use crate::guard;
use crate::names::decorate;
use crate::schema::{Node, NodeId, Primitive, Schema};
use unions::UnionTracker;

/// Placeholder for schema shapes the generator does not understand.
/// The schema is validated upstream, so reaching this marks a bug there,
/// not here; generation keeps going.
const UNDEFINED: &str = "$Undefined$";

/// Options for one generation run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// C++ namespace wrapped around the generated types.
    pub namespace: Option<String>,
    /// Prefix for the runtime includes; empty or ending in '/'.
    pub include_prefix: String,
    /// Suppress the per-field typedefs for union-typed record fields.
    pub no_union_typedef: bool,
    /// Input identifier; seeds generated union type names.
    pub schema_file: String,
    /// Output identifier; seeds the include guard.
    pub header_file: String,
    /// Guard token recovered from an existing output file, if any.
    pub guard: Option<String>,
}

/// Accessor bodies cannot be emitted inside the union struct: a branch
/// type may only be forward-declared at that point. They are queued and
/// flushed after all type declarations, in discovery order.
#[derive(Debug)]
struct PendingAccessor {
    struct_name: String,
    cpp_type: String,
    accessor: String,
    idx: usize,
}

#[derive(Debug)]
struct PendingConstructor {
    struct_name: String,
    member_type: String,
    init_member: bool,
}

/// Visitation state per node identity; unvisited nodes are simply absent
/// from the map.
#[derive(Debug, Clone)]
enum Visit {
    /// Expansion is on the call stack; a re-entrant visit must switch to
    /// name-only references instead of recursing further.
    InProgress,
    /// Declaration emitted under this generated name.
    Done(String),
}

pub struct CodeGen<'a> {
    schema: &'a Schema,
    options: Options,
    out: String,
    in_namespace: bool,
    union_tracker: UnionTracker,
    /// Memo and recursion guard in one identity-keyed map.
    visited: HashMap<NodeId, Visit>,
    pending_accessors: Vec<PendingAccessor>,
    pending_ctors: Vec<PendingConstructor>,
}

impl<'a> CodeGen<'a> {
    pub fn new(schema: &'a Schema, options: Options) -> Self {
        let union_tracker = UnionTracker::new(&options.schema_file);
        CodeGen {
            schema,
            options,
            out: String::new(),
            in_namespace: false,
            union_tracker,
            visited: HashMap::new(),
            pending_accessors: Vec::new(),
            pending_ctors: Vec::new(),
        }
    }

    fn done_name(&self, id: NodeId) -> Option<&String> {
        match self.visited.get(&id) {
            Some(Visit::Done(name)) => Some(name),
            _ => None,
        }
    }

    fn in_progress(&self, id: NodeId) -> bool {
        matches!(self.visited.get(&id), Some(Visit::InProgress))
    }

    /// Run the whole generation and hand back the header text.
    pub fn generate(mut self) -> String {
        self.emit_banner();

        let guard = self
            .options
            .guard
            .clone()
            .unwrap_or_else(|| guard::fresh_guard(&self.options.header_file));
        self.put(&format!("#ifndef {guard}\n#define {guard}\n\n\n"));

        self.put("#include <sstream>\n#include <any>\n#include <utility>\n");
        let prefix = self.options.include_prefix.clone();
        self.put(&format!(
            "#include \"{prefix}Specific.hh\"\n#include \"{prefix}Encoder.hh\"\n#include \"{prefix}Decoder.hh\"\n\n"
        ));

        if let Some(ns) = self.options.namespace.clone() {
            self.put(&format!("namespace {ns} {{\n"));
            self.in_namespace = true;
        }

        let root = self.schema.root();
        self.generate_type(root);

        for pending in std::mem::take(&mut self.pending_accessors) {
            emit_accessor(&mut self.out, &pending);
        }
        for pending in std::mem::take(&mut self.pending_ctors) {
            emit_constructor(&mut self.out, &pending);
        }

        if self.options.namespace.is_some() {
            self.in_namespace = false;
            self.put("}\n");
        }

        self.put("namespace avro {\n");
        self.generate_traits(root);
        self.put("}\n");
        self.put("#endif\n");
        self.out
    }

    fn put(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn emit_banner(&mut self) {
        self.put(&format!(
            "/* This code was generated by avro-cppgen {}. Do not edit.*/\n\n",
            env!("CARGO_PKG_VERSION")
        ));
    }

    fn fullname(&self, name: &str) -> String {
        match &self.options.namespace {
            Some(ns) => format!("{ns}::{name}"),
            None => name.to_string(),
        }
    }

    // ------------------------- type declarations ------------------------- //

    /// Returns the C++ type name for `id`, emitting its declaration (and
    /// its children's) on first visit. Idempotent per node identity.
    fn generate_type(&mut self, id: NodeId) -> String {
        let id = self.schema.resolve(id);
        if let Some(name) = self.done_name(id) {
            return name.clone();
        }
        let result = self.do_generate_type(id);
        self.visited.insert(id, Visit::Done(result.clone()));
        result
    }

    fn do_generate_type(&mut self, id: NodeId) -> String {
        let schema = self.schema;
        match schema.node(id).clone() {
            Node::Primitive(_) | Node::Fixed { .. } => self.cpp_type_of(id),
            Node::Array { items } => {
                let element = if self.in_progress(id) {
                    // re-entered while expanding our own element: a cycle;
                    // fall back to name-only references
                    self.generate_declaration(items)
                } else {
                    self.visited.insert(id, Visit::InProgress);
                    let element = self.generate_type(items);
                    // a re-entrant visit may have finished this node already
                    if self.in_progress(id) {
                        self.visited.remove(&id);
                    }
                    element
                };
                format!("std::vector<{element} >")
            }
            Node::Map { values } => {
                let value = if self.in_progress(id) {
                    self.generate_declaration(values)
                } else {
                    self.visited.insert(id, Visit::InProgress);
                    let value = self.generate_type(values);
                    if self.in_progress(id) {
                        self.visited.remove(&id);
                    }
                    value
                };
                format!("std::map<std::string, {value} >")
            }
            Node::Record { .. } => self.generate_record_type(id),
            Node::Enum { .. } => self.generate_enum_type(id),
            Node::Union { .. } => self.generate_union_type(id),
            Node::Ref { target } => self.generate_type(target),
        }
    }

    /// Name-only reference for a node reached inside its own expansion.
    /// Named aggregates get a forward declaration; containers recurse so
    /// their element types are named without being expanded.
    fn generate_declaration(&mut self, id: NodeId) -> String {
        let schema = self.schema;
        let id = schema.resolve(id);
        match schema.node(id).clone() {
            Node::Primitive(_) | Node::Fixed { .. } => self.cpp_type_of(id),
            Node::Array { items } => {
                format!("std::vector<{} >", self.generate_declaration(items))
            }
            Node::Map { values } => {
                format!("std::map<std::string, {} >", self.generate_declaration(values))
            }
            Node::Record { .. } => {
                let name = self.cpp_type_of(id);
                self.put(&format!("struct {name};\n"));
                name
            }
            // enums have no children, so full (memoized) emission is safe
            // even mid-cycle and keeps the one-declaration-per-identity
            // guarantee
            Node::Enum { .. } => self.generate_type(id),
            Node::Union { .. } => self.generate_union_type(id),
            Node::Ref { target } => self.generate_declaration(target),
        }
    }

    fn generate_enum_type(&mut self, id: NodeId) -> String {
        let schema = self.schema;
        let Node::Enum { name, symbols, .. } = schema.node(id).clone() else {
            return UNDEFINED.to_string();
        };
        let decorated = decorate(&name);
        self.put(&format!("enum class {decorated}: unsigned {{\n"));
        for symbol in &symbols {
            self.put(&format!("    {},\n", decorate(symbol)));
        }
        self.put("};\n\n");
        decorated
    }

    fn generate_record_type(&mut self, id: NodeId) -> String {
        let schema = self.schema;
        let Node::Record { name, fields, doc } = schema.node(id).clone() else {
            return UNDEFINED.to_string();
        };
        let decorated = decorate(&name);

        let mut types = Vec::with_capacity(fields.len());
        for field in &fields {
            types.push(self.generate_type(field.ty));
        }
        // a recursive reference may have finished this record while we
        // were expanding the fields above
        if let Some(done_name) = self.done_name(id) {
            return done_name.clone();
        }

        self.emit_doc_comment(doc.as_deref(), "");
        self.put(&format!("struct {decorated} {{\n"));
        if !self.options.no_union_typedef {
            for (i, field) in fields.iter().enumerate() {
                let field_node = schema.node(schema.resolve(field.ty));
                if matches!(field_node, Node::Union { .. }) {
                    self.put(&format!("    typedef {} {}_t;\n", types[i], field.name));
                    types[i] = format!("{}_t", field.name);
                }
                if let Node::Array { items } = field_node {
                    if matches!(schema.node(schema.resolve(*items)), Node::Union { .. }) {
                        self.put(&format!(
                            "    typedef {}::value_type {}_item_t;\n",
                            types[i], field.name
                        ));
                    }
                }
            }
        }
        for (i, field) in fields.iter().enumerate() {
            self.emit_doc_comment(field.doc.as_deref(), "    ");
            self.put(&format!("    {} {};\n", types[i], decorate(&field.name)));
        }

        // default constructor: every member initialized, so a
        // partially-filled value is still well-formed
        self.put(&format!("    {decorated}()"));
        if !fields.is_empty() {
            self.put(" :");
        }
        self.put("\n");
        for (i, field) in fields.iter().enumerate() {
            self.put(&format!("        {}({}())", decorate(&field.name), types[i]));
            if i + 1 != fields.len() {
                self.put(",");
            }
            self.put("\n");
        }
        self.put("        { }\n");
        self.put("};\n\n");
        decorated
    }

    /// Union branch names, decorated and made unique with numeric
    /// suffixes. Used for both the Branch enum and the accessors.
    fn unique_branch_names(raw: &[String]) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::new();
        let mut unique = Vec::with_capacity(raw.len());
        for name in raw {
            let mut branch_name = decorate(name);
            if used.contains(&branch_name) {
                let mut postfix = 2usize;
                loop {
                    let escaped = format!("{branch_name}_{postfix}");
                    if !used.contains(&escaped) {
                        branch_name = escaped;
                        break;
                    }
                    postfix += 1;
                }
            }
            used.insert(branch_name.clone());
            unique.push(branch_name);
        }
        unique
    }

    fn generate_union_type(&mut self, id: NodeId) -> String {
        let schema = self.schema;
        let Node::Union { branches } = schema.node(id).clone() else {
            return UNDEFINED.to_string();
        };

        let mut types = Vec::with_capacity(branches.len());
        let mut names = Vec::with_capacity(branches.len());
        if self.in_progress(id) {
            for &branch in &branches {
                types.push(self.generate_declaration(branch));
                names.push(self.cpp_name_of(branch));
            }
        } else {
            self.visited.insert(id, Visit::InProgress);
            for &branch in &branches {
                types.push(self.generate_type(branch));
                names.push(self.cpp_name_of(branch));
            }
            if self.in_progress(id) {
                self.visited.remove(&id);
            }
        }
        if let Some(done_name) = self.done_name(id) {
            return done_name.clone();
        }
        // reuse an existing union with the exact same ordered branches
        if let Some(existing) = self.union_tracker.existing_union_name(&types) {
            return existing;
        }
        let result = self.union_tracker.new_union_name(types.clone());

        let branch_names = Self::unique_branch_names(&names);
        let accessor_slots: Vec<Option<String>> = branches
            .iter()
            .zip(&branch_names)
            .map(|(&branch, name)| {
                if schema.node(schema.resolve(branch)).is_null() {
                    None
                } else {
                    Some(name.clone())
                }
            })
            .collect();
        self.union_tracker.set_accessors(&result, accessor_slots);

        self.put(&format!(
            "struct {result} {{\nprivate:\n    size_t idx_;\n    std::any value_;\npublic:\n"
        ));
        self.put(
            "    /** enum representing union branches as returned by the idx() function */\n",
        );
        self.put("    enum class Branch: size_t {\n");
        for (i, branch_name) in branch_names.iter().enumerate() {
            self.put(&format!("        {branch_name} = {i},\n"));
        }
        self.put("    };\n");
        self.put("    size_t idx() const { return idx_; }\n");
        self.put("    Branch branch() const { return static_cast<Branch>(idx_); }\n");

        for (i, &branch) in branches.iter().enumerate() {
            if schema.node(schema.resolve(branch)).is_null() {
                self.put(&format!(
                    "    bool is_null() const {{\n        return (idx_ == {i});\n    }}\n"
                ));
                self.put(&format!(
                    "    void set_null() {{\n        idx_ = {i};\n        value_ = std::any();\n    }}\n"
                ));
            } else {
                let ty = &types[i];
                let accessor = &branch_names[i];
                self.put(&format!(
                    "    const {ty}& get_{accessor}() const;\n    {ty}& get_{accessor}();\n"
                ));
                self.put(&format!(
                    "    void set_{accessor}(const {ty}& v);\n    void set_{accessor}({ty}&& v);\n"
                ));
                self.pending_accessors.push(PendingAccessor {
                    struct_name: result.clone(),
                    cpp_type: ty.clone(),
                    accessor: accessor.clone(),
                    idx: i,
                });
            }
        }

        self.put(&format!("    {result}();\n"));
        if let (Some(&first), Some(first_type)) = (branches.first(), types.first()) {
            self.pending_ctors.push(PendingConstructor {
                struct_name: result.clone(),
                member_type: first_type.clone(),
                init_member: !schema.node(schema.resolve(first)).is_null(),
            });
        }
        self.put("};\n\n");
        result
    }

    /// The C++ type naming a node, without emitting anything.
    fn cpp_type_of(&self, id: NodeId) -> String {
        let schema = self.schema;
        match schema.node(id) {
            Node::Primitive(p) => match p {
                Primitive::Null => "avro::null".to_string(),
                Primitive::Boolean => "bool".to_string(),
                Primitive::Int => "int32_t".to_string(),
                Primitive::Long => "int64_t".to_string(),
                Primitive::Float => "float".to_string(),
                Primitive::Double => "double".to_string(),
                Primitive::Bytes => "std::vector<uint8_t>".to_string(),
                Primitive::String => "std::string".to_string(),
            },
            Node::Record { name, .. } | Node::Enum { name, .. } => {
                let decorated = decorate(name);
                if self.in_namespace {
                    decorated
                } else {
                    self.fullname(&decorated)
                }
            }
            Node::Fixed { size, .. } => format!("std::array<uint8_t, {size}>"),
            Node::Array { items } => {
                format!("std::vector<{} >", self.cpp_type_of(*items))
            }
            Node::Map { values } => {
                format!("std::map<std::string, {} >", self.cpp_type_of(*values))
            }
            Node::Union { .. } => {
                self.fullname(self.done_name(id).map(String::as_str).unwrap_or_default())
            }
            Node::Ref { target } => self.cpp_type_of(schema.resolve(*target)),
        }
    }

    /// Short per-branch name used to derive union accessor names.
    fn cpp_name_of(&self, id: NodeId) -> String {
        let schema = self.schema;
        match schema.node(id) {
            Node::Primitive(p) => match p {
                Primitive::Null => "null",
                Primitive::Boolean => "bool",
                Primitive::Int => "int",
                Primitive::Long => "long",
                Primitive::Float => "float",
                Primitive::Double => "double",
                Primitive::Bytes => "bytes",
                Primitive::String => "string",
            }
            .to_string(),
            Node::Record { name, .. } | Node::Enum { name, .. } | Node::Fixed { name, .. } => {
                decorate(name)
            }
            Node::Array { .. } => "array".to_string(),
            Node::Map { .. } => "map".to_string(),
            Node::Ref { target } => self.cpp_name_of(schema.resolve(*target)),
            Node::Union { .. } => UNDEFINED.to_string(),
        }
    }

    fn emit_doc_comment(&mut self, doc: Option<&str>, indent: &str) {
        let Some(doc) = doc else { return };
        if doc.is_empty() {
            return;
        }
        let mut lines: Vec<&str> = doc.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        for raw in lines {
            let mut line: String = raw.chars().filter(|&c| c != '\r').collect();
            if line.is_empty() {
                self.put(&format!("{indent}//\n"));
            } else {
                // a trailing backslash would escape the generated newline
                // and swallow the next source line into this comment
                if line.trim_end().ends_with('\\') {
                    line.push_str("(backslash)");
                }
                self.put(&format!("{indent}// {line}\n"));
            }
        }
    }

    // -------------------------- codec traits ----------------------------- //

    /// Emit the codec for `id` after the codecs of everything it depends
    /// on. Primitives and fixeds are handled by the runtime; references
    /// are skipped because the defining occurrence already covered them
    /// (that skip is also what terminates the walk on cycles).
    fn generate_traits(&mut self, id: NodeId) {
        let schema = self.schema;
        match schema.node(id).clone() {
            Node::Primitive(_) | Node::Fixed { .. } | Node::Ref { .. } => {}
            Node::Record { .. } => self.generate_record_traits(id),
            Node::Enum { .. } => self.generate_enum_traits(id),
            Node::Array { items } => self.generate_traits(items),
            Node::Map { values } => self.generate_traits(values),
            Node::Union { .. } => self.generate_union_traits(id),
        }
    }

    fn generate_record_traits(&mut self, id: NodeId) {
        let schema = self.schema;
        let Node::Record { name, fields, .. } = schema.node(id).clone() else {
            return;
        };
        for field in &fields {
            self.generate_traits(field.ty);
        }

        let full = self.fullname(&decorate(&name));
        self.put(&format!("template<> struct codec_traits<{full}> {{\n"));

        if fields.is_empty() {
            self.put(&format!("    static void encode(Encoder&, const {full}&) {{}}\n"));
            // fieldOrder() advances resolving-decoder state, so it must be
            // called even when there is nothing to decode
            self.put(&format!("    static void decode(Decoder& d, {full}&) {{\n"));
            self.put("        if (avro::ResolvingDecoder *rd = dynamic_cast<avro::ResolvingDecoder *>(&d)) {\n");
            self.put("            rd->fieldOrder();\n");
            self.put("        }\n");
            self.put("    }\n");
            self.put("};\n");
            return;
        }

        self.put(&format!("    static void encode(Encoder& e, const {full}& v) {{\n"));
        for field in &fields {
            self.put(&format!("        avro::encode(e, v.{});\n", decorate(&field.name)));
        }
        self.put("    }\n");

        self.put(&format!("    static void decode(Decoder& d, {full}& v) {{\n"));
        self.put("        if (avro::ResolvingDecoder *rd =\n");
        self.put("            dynamic_cast<avro::ResolvingDecoder *>(&d)) {\n");
        self.put("            const std::vector<size_t> fo = rd->fieldOrder();\n");
        self.put("            for (std::vector<size_t>::const_iterator it = fo.begin();\n");
        self.put("                it != fo.end(); ++it) {\n");
        self.put("                switch (*it) {\n");
        for (i, field) in fields.iter().enumerate() {
            self.put(&format!("                case {i}:\n"));
            self.put(&format!(
                "                    avro::decode(d, v.{});\n",
                decorate(&field.name)
            ));
            self.put("                    break;\n");
        }
        self.put("                default:\n");
        self.put("                    break;\n");
        self.put("                }\n");
        self.put("            }\n");
        self.put("        } else {\n");
        for field in &fields {
            self.put(&format!(
                "            avro::decode(d, v.{});\n",
                decorate(&field.name)
            ));
        }
        self.put("        }\n");
        self.put("    }\n");
        self.put("};\n\n");
    }

    fn generate_enum_traits(&mut self, id: NodeId) {
        let schema = self.schema;
        let Node::Enum { name, symbols, .. } = schema.node(id).clone() else {
            return;
        };
        let Some(last_symbol) = symbols.last() else {
            return;
        };
        let full = self.fullname(&decorate(&name));
        let last = decorate(last_symbol);

        self.put(&format!("template<> struct codec_traits<{full}> {{\n"));
        self.put(&format!("    static void encode(Encoder& e, {full} v) {{\n"));
        self.put(&format!("        if (v > {full}::{last})\n"));
        self.put("        {\n");
        self.put("            std::ostringstream error;\n");
        self.put(&format!(
            "            error << \"enum value \" << static_cast<unsigned>(v) << \" is out of bound for {full} and cannot be encoded\";\n"
        ));
        self.put("            throw avro::Exception(error.str());\n");
        self.put("        }\n");
        self.put("        e.encodeEnum(static_cast<size_t>(v));\n");
        self.put("    }\n");
        self.put(&format!("    static void decode(Decoder& d, {full}& v) {{\n"));
        self.put("        size_t index = d.decodeEnum();\n");
        self.put(&format!(
            "        if (index > static_cast<size_t>({full}::{last}))\n"
        ));
        self.put("        {\n");
        self.put("            std::ostringstream error;\n");
        self.put(&format!(
            "            error << \"enum value \" << index << \" is out of bound for {full} and cannot be decoded\";\n"
        ));
        self.put("            throw avro::Exception(error.str());\n");
        self.put("        }\n");
        self.put(&format!("        v = static_cast<{full}>(index);\n"));
        self.put("    }\n");
        self.put("};\n\n");
    }

    fn generate_union_traits(&mut self, id: NodeId) {
        let schema = self.schema;
        let Node::Union { branches } = schema.node(id).clone() else {
            return;
        };
        let Some(name) = self.done_name(id).cloned() else {
            return;
        };
        let full = self.fullname(&name);
        if self.union_tracker.codec_generated(&full) {
            return;
        }

        for &branch in &branches {
            self.generate_traits(branch);
        }

        let accessors: Vec<Option<String>> = self
            .union_tracker
            .accessors(&name)
            .map(<[Option<String>]>::to_vec)
            .unwrap_or_default();
        let accessor = |i: usize| -> String {
            accessors
                .get(i)
                .and_then(Clone::clone)
                .unwrap_or_else(|| UNDEFINED.to_string())
        };

        self.put(&format!("template<> struct codec_traits<{full}> {{\n"));
        self.put(&format!("    static void encode(Encoder& e, {full} v) {{\n"));
        self.put("        e.encodeUnionIndex(v.idx());\n");
        self.put("        switch (v.idx()) {\n");
        for (i, &branch) in branches.iter().enumerate() {
            self.put(&format!("        case {i}:\n"));
            if schema.node(schema.resolve(branch)).is_null() {
                self.put("            e.encodeNull();\n");
            } else {
                self.put(&format!("            avro::encode(e, v.get_{}());\n", accessor(i)));
            }
            self.put("            break;\n");
        }
        self.put("        }\n");
        self.put("    }\n");

        self.put(&format!("    static void decode(Decoder& d, {full}& v) {{\n"));
        self.put("        size_t n = d.decodeUnionIndex();\n");
        self.put(&format!(
            "        if (n >= {}) {{ throw avro::Exception(\"Union index too big\"); }}\n",
            branches.len()
        ));
        self.put("        switch (n) {\n");
        for (i, &branch) in branches.iter().enumerate() {
            self.put(&format!("        case {i}:\n"));
            if schema.node(schema.resolve(branch)).is_null() {
                self.put("            d.decodeNull();\n");
                self.put("            v.set_null();\n");
            } else {
                self.put("            {\n");
                self.put(&format!("                {} vv;\n", self.cpp_type_of(branch)));
                self.put("                avro::decode(d, vv);\n");
                self.put(&format!(
                    "                v.set_{}(std::move(vv));\n",
                    accessor(i)
                ));
                self.put("            }\n");
            }
            self.put("            break;\n");
        }
        self.put("        }\n");
        self.put("    }\n");
        self.put("};\n\n");

        self.union_tracker.set_codec_generated(full);
    }
}

fn emit_accessor(out: &mut String, pending: &PendingAccessor) {
    let sn = format!(" {}::", pending.struct_name);
    let (ty, name, idx) = (&pending.cpp_type, &pending.accessor, pending.idx);

    out.push_str("inline\n");
    out.push_str(&format!(
        "const {ty}&{sn}get_{name}() const {{\n    if (idx_ != {idx}) {{\n        throw avro::Exception(\"Invalid type for union {}\");\n    }}\n    return *std::any_cast<{ty} >(&value_);\n}}\n\n",
        pending.struct_name
    ));
    out.push_str("inline\n");
    out.push_str(&format!(
        "{ty}&{sn}get_{name}() {{\n    if (idx_ != {idx}) {{\n        throw avro::Exception(\"Invalid type for union {}\");\n    }}\n    return *std::any_cast<{ty} >(&value_);\n}}\n\n",
        pending.struct_name
    ));
    out.push_str("inline\n");
    out.push_str(&format!(
        "void{sn}set_{name}(const {ty}& v) {{\n    idx_ = {idx};\n    value_ = v;\n}}\n\n"
    ));
    out.push_str("inline\n");
    out.push_str(&format!(
        "void{sn}set_{name}({ty}&& v) {{\n    idx_ = {idx};\n    value_ = std::move(v);\n}}\n\n"
    ));
}

fn emit_constructor(out: &mut String, pending: &PendingConstructor) {
    out.push_str(&format!(
        "inline {0}::{0}() : idx_(0)",
        pending.struct_name
    ));
    if pending.init_member {
        out.push_str(&format!(", value_({}())", pending.member_type));
    }
    out.push_str(" { }\n");
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_schema;

    fn options() -> Options {
        Options {
            schema_file: "test.json".to_string(),
            header_file: "test.hh".to_string(),
            include_prefix: "avro/".to_string(),
            ..Options::default()
        }
    }

    fn generate(schema_json: &str) -> String {
        let schema = compile_schema(schema_json).unwrap();
        CodeGen::new(&schema, options()).generate()
    }

    #[test]
    fn primitive_types_map_to_runtime_types() {
        let header = generate(
            r#"{"type": "record", "name": "Scalars", "fields": [
                {"name": "i", "type": "int"},
                {"name": "l", "type": "long"},
                {"name": "s", "type": "string"},
                {"name": "b", "type": "bytes"},
                {"name": "f", "type": "float"},
                {"name": "d", "type": "double"},
                {"name": "y", "type": "boolean"}
            ]}"#,
        );
        assert!(header.contains("    int32_t i;\n"));
        assert!(header.contains("    int64_t l;\n"));
        assert!(header.contains("    std::string s;\n"));
        assert!(header.contains("    std::vector<uint8_t> b;\n"));
        assert!(header.contains("    float f;\n"));
        assert!(header.contains("    double d;\n"));
        assert!(header.contains("    bool y;\n"));
    }

    #[test]
    fn reserved_schema_names_are_escaped() {
        let header = generate(
            r#"{"type": "record", "name": "switch", "fields": [
                {"name": "class", "type": "int"}
            ]}"#,
        );
        assert!(header.contains("struct switch_ {"));
        assert!(header.contains("    int32_t class_;\n"));
        assert!(header.contains("codec_traits<switch_>"));
    }

    #[test]
    fn colliding_union_accessors_get_numeric_suffixes() {
        // "int" decorates to "int_", which collides with a fixed named
        // "int_"; the second branch must be renamed
        let header = generate(
            r#"["int", {"type": "fixed", "name": "int_", "size": 4}]"#,
        );
        assert!(header.contains("get_int_()"));
        assert!(header.contains("get_int__2()"));
        assert!(header.contains("int_ = 0,"));
        assert!(header.contains("int__2 = 1,"));
    }

    #[test]
    fn field_doc_strings_become_comments() {
        let header = generate(
            r#"{"type": "record", "name": "Documented", "doc": "A thing.\nTwo lines.",
                "fields": [
                {"name": "x", "type": "int", "doc": "trailing slash \\"}
            ]}"#,
        );
        assert!(header.contains("// A thing.\n// Two lines.\nstruct Documented {"));
        assert!(header.contains("    // trailing slash \\(backslash)\n"));
    }
}
