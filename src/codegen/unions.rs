//! Dedup of structurally identical union shapes within one run.
//!
//! The key is the ordered list of branch C++ type names: order encodes the
//! wire tag, so the same branches in a different order are a different
//! union. Codec emission is tracked separately from naming because a
//! deduplicated union is revisited from every field that uses it, but its
//! codec must be emitted exactly once.

use std::collections::{HashMap, HashSet};

use crate::names::make_canonical;

#[derive(Debug)]
pub struct UnionTracker {
    /// Canonicalized tail of the schema file name, used to prefix
    /// generated union type names.
    schema_stem: String,
    union_number: usize,
    name_by_branches: HashMap<Vec<String>, String>,
    /// Accessor name per branch (None for the null branch), recorded when
    /// the union struct is first generated so codec emission calls the
    /// accessors that actually exist.
    accessors_by_name: HashMap<String, Vec<Option<String>>>,
    generated_codecs: HashSet<String>,
}

impl UnionTracker {
    pub fn new(schema_file: &str) -> Self {
        // keep from the last path separator on, like the rest of the
        // world does for basenames, then canonicalize
        let tail = match schema_file.rfind(['/', '\\']) {
            Some(i) => &schema_file[i..],
            None => schema_file,
        };
        Self {
            schema_stem: make_canonical(tail, false),
            union_number: 0,
            name_by_branches: HashMap::new(),
            accessors_by_name: HashMap::new(),
            generated_codecs: HashSet::new(),
        }
    }

    /// The already-registered name for this exact branch list, if any.
    pub fn existing_union_name(&self, branches: &[String]) -> Option<String> {
        self.name_by_branches.get(branches).cloned()
    }

    /// Synthesize and register a fresh union name, unique within the run.
    pub fn new_union_name(&mut self, branches: Vec<String>) -> String {
        let name = format!("{}_Union__{}__", self.schema_stem, self.union_number);
        self.union_number += 1;
        self.name_by_branches.insert(branches, name.clone());
        name
    }

    pub fn set_accessors(&mut self, union_name: &str, accessors: Vec<Option<String>>) {
        self.accessors_by_name
            .insert(union_name.to_string(), accessors);
    }

    pub fn accessors(&self, union_name: &str) -> Option<&[Option<String>]> {
        self.accessors_by_name.get(union_name).map(Vec::as_slice)
    }

    pub fn codec_generated(&self, union_name: &str) -> bool {
        self.generated_codecs.contains(union_name)
    }

    pub fn set_codec_generated(&mut self, union_name: String) {
        self.generated_codecs.insert(union_name);
    }
}

// ------------------------------- Tests ------------------------------------ //
