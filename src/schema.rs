// Validated schema tree. The compiler owns construction; codegen only reads.

/// Identity of a node inside a [`Schema`] arena. Two references to the same
/// named type hold the same id, which is what makes memoization and cycle
/// detection work downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Avro primitive types. Leaves, no children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Primitive {
    /// The primitive for an Avro type name, if `name` is one.
    pub fn from_name(name: &str) -> Option<Primitive> {
        Some(match name {
            "null" => Primitive::Null,
            "boolean" => Primitive::Boolean,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "bytes" => Primitive::Bytes,
            "string" => Primitive::String,
            _ => return None,
        })
    }
}

/// One record field: name, type, optional doc string.
/// Declared order is load-bearing (default decode order).
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: NodeId,
    pub doc: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Primitive(Primitive),
    /// Named fixed-size byte blob.
    Fixed { name: String, size: usize },
    /// Named enumeration; ordinal = position in `symbols`.
    Enum {
        name: String,
        symbols: Vec<String>,
        doc: Option<String>,
    },
    /// Named record; field order is declared order.
    Record {
        name: String,
        fields: Vec<Field>,
        doc: Option<String>,
    },
    Array { items: NodeId },
    /// Keys are always strings.
    Map { values: NodeId },
    /// Branch order defines the wire tag (0-based).
    Union { branches: Vec<NodeId> },
    /// Symbolic reference to a previously-declared named type. Resolving
    /// yields the declaration's identity, so recursive and shared types
    /// all collapse onto one node.
    Ref { target: NodeId },
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Primitive(Primitive::Null))
    }
}

/// The compiled, possibly-cyclic schema graph. Read-only after
/// construction; it outlives any single generation run.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Schema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Follow `Ref` links to the declaration they point at.
    pub fn resolve(&self, id: NodeId) -> NodeId {
        let mut id = id;
        while let Node::Ref { target } = self.node(id) {
            id = *target;
        }
        id
    }
}

/// Arena builder used by the schema compiler.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<Node>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocate an id for a record before its body is compiled, so that
    /// recursive references inside the body share the declaration's
    /// identity. Only records can be referenced while still open; enums
    /// and fixeds have no children and are registered after completion.
    pub fn reserve_record(&mut self, name: &str) -> NodeId {
        self.push(Node::Record {
            name: name.to_string(),
            fields: Vec::new(),
            doc: None,
        })
    }

    pub fn set(&mut self, id: NodeId, node: Node) {
        self.nodes[id.index()] = node;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Follow `Ref` links, as [`Schema::resolve`] does, but mid-build.
    pub fn resolve(&self, id: NodeId) -> NodeId {
        let mut id = id;
        while let Node::Ref { target } = self.node(id) {
            id = *target;
        }
        id
    }

    pub fn finish(self, root: NodeId) -> Schema {
        Schema {
            nodes: self.nodes,
            root,
        }
    }
}
