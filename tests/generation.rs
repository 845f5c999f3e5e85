//! End-to-end generation tests: compile inline schema JSON, generate the
//! C++ header, assert on the emitted text.

use pretty_assertions::assert_eq;

use avro_cppgen::codegen::{CodeGen, Options};
use avro_cppgen::compile::compile_schema;
use avro_cppgen::guard;

fn options() -> Options {
    Options {
        schema_file: "test.json".to_string(),
        header_file: "test.hh".to_string(),
        include_prefix: "avro/".to_string(),
        ..Options::default()
    }
}

fn generate(schema_json: &str) -> String {
    generate_with(schema_json, options())
}

fn generate_with(schema_json: &str, options: Options) -> String {
    let schema = compile_schema(schema_json).expect("schema should compile");
    CodeGen::new(&schema, options).generate()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ------------------------- memoization & cycles --------------------------- //

#[test]
fn each_named_type_is_declared_exactly_once() {
    let header = generate(
        r#"{"type": "record", "name": "Outer", "fields": [
            {"name": "a", "type": {"type": "record", "name": "Inner", "fields": [
                {"name": "x", "type": "int"}]}},
            {"name": "b", "type": "Inner"},
            {"name": "c", "type": {"type": "array", "items": "Inner"}}
        ]}"#,
    );
    assert_eq!(count(&header, "struct Inner {"), 1);
    assert_eq!(count(&header, "struct Outer {"), 1);
    // repeated references reuse the name instead of re-declaring
    assert!(header.contains("    Inner b;\n"));
    assert!(header.contains("    std::vector<Inner > c;\n"));
}

#[test]
fn self_referential_record_terminates_with_a_forward_declaration() {
    let header = generate(
        r#"{"type": "record", "name": "Node", "fields": [
            {"name": "children", "type": {"type": "array", "items": "Node"}}
        ]}"#,
    );
    assert_eq!(count(&header, "struct Node {"), 1);
    assert_eq!(count(&header, "struct Node;\n"), 1);
    assert!(header.contains("    std::vector<Node > children;\n"));
    let forward = header.find("struct Node;").expect("forward declaration");
    let full = header.find("struct Node {").expect("full declaration");
    assert!(forward < full);
}

#[test]
fn recursive_union_compiles_once_and_defers_accessors() {
    let header = generate(
        r#"{"type": "record", "name": "LongList", "fields": [
            {"name": "value", "type": "long"},
            {"name": "next", "type": ["null", "LongList"]}
        ]}"#,
    );
    assert_eq!(count(&header, "struct test_json_Union__0__ {"), 1);
    assert!(header.contains("    typedef test_json_Union__0__ next_t;\n"));
    assert!(header.contains("    next_t next;\n"));
    // accessor bodies for the forward-declared branch come after all
    // type declarations
    let struct_pos = header.find("struct LongList {").expect("record declared");
    let body_pos = header
        .find("inline\nconst LongList& test_json_Union__0__::get_LongList() const {")
        .expect("deferred accessor body");
    assert!(struct_pos < body_pos);
    // and its codec is emitted before the record's (callees first)
    let union_codec = header
        .find("codec_traits<test_json_Union__0__>")
        .expect("union codec");
    let record_codec = header.find("codec_traits<LongList>").expect("record codec");
    assert!(union_codec < record_codec);
}

// ------------------------------ union dedup ------------------------------- //

#[test]
fn structurally_identical_unions_share_one_type() {
    let header = generate(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "string"]},
            {"name": "b", "type": ["null", "string"]},
            {"name": "c", "type": ["string", "null"]}
        ]}"#,
    );
    assert_eq!(count(&header, "struct test_json_Union__0__ {"), 1);
    assert_eq!(count(&header, "struct test_json_Union__1__ {"), 1);
    assert!(!header.contains("test_json_Union__2__"));
    // both fields reuse the first union by name
    assert!(header.contains("    typedef test_json_Union__0__ a_t;\n"));
    assert!(header.contains("    typedef test_json_Union__0__ b_t;\n"));
    // branch order encodes the wire tag, so the reversed union is distinct
    assert!(header.contains("    typedef test_json_Union__1__ c_t;\n"));
    // the shared union's codec is emitted exactly once
    assert_eq!(count(&header, "template<> struct codec_traits<test_json_Union__0__>"), 1);
}

#[test]
fn union_constructors_initialize_the_first_branch() {
    let header = generate(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "string"]},
            {"name": "b", "type": ["string", "null"]}
        ]}"#,
    );
    // leading null branch: nothing to initialize beyond the index
    assert!(header
        .contains("inline test_json_Union__0__::test_json_Union__0__() : idx_(0) { }\n"));
    assert!(header.contains(
        "inline test_json_Union__1__::test_json_Union__1__() : idx_(0), value_(std::string()) { }\n"
    ));
}

// ----------------------------- codec shapes ------------------------------- //

#[test]
fn enum_symbols_keep_declared_order_and_codecs_check_bounds() {
    let header = generate(r#"{"type": "enum", "name": "Suit", "symbols": ["A", "B", "C"]}"#);
    assert!(header.contains("enum class Suit: unsigned {\n    A,\n    B,\n    C,\n};\n"));
    assert!(header.contains("        if (v > Suit::C)\n"));
    assert!(header.contains("is out of bound for Suit and cannot be encoded"));
    assert!(header.contains("        if (index > static_cast<size_t>(Suit::C))\n"));
    assert!(header.contains("is out of bound for Suit and cannot be decoded"));
    assert!(header.contains("        v = static_cast<Suit>(index);\n"));
}

#[test]
fn union_codec_writes_tags_in_branch_order_and_rejects_big_indexes() {
    let header = generate(r#"["null", "int", "string"]"#);
    assert!(header.contains("        null = 0,\n"));
    assert!(header.contains("        int_ = 1,\n"));
    assert!(header.contains("        string = 2,\n"));
    // encode: tag first, then the active branch's payload; null writes none
    assert!(header.contains("        e.encodeUnionIndex(v.idx());\n"));
    assert!(header.contains("        case 0:\n            e.encodeNull();\n"));
    assert!(header.contains("            avro::encode(e, v.get_int_());\n"));
    assert!(header.contains("            avro::encode(e, v.get_string());\n"));
    // decode: guard the tag before dispatching
    assert!(header.contains(
        "        if (n >= 3) { throw avro::Exception(\"Union index too big\"); }\n"
    ));
    assert!(header.contains("            d.decodeNull();\n            v.set_null();\n"));
    assert!(header.contains("                std::string vv;\n"));
    assert!(header.contains("                v.set_string(std::move(vv));\n"));
}

#[test]
fn record_codec_decodes_via_field_order_permutation_when_resolving() {
    let header = generate(
        r#"{"type": "record", "name": "Triple", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"},
            {"name": "c", "type": "double"}
        ]}"#,
    );
    // encode is unconditional declared order
    assert!(header.contains(
        "        avro::encode(e, v.a);\n        avro::encode(e, v.b);\n        avro::encode(e, v.c);\n"
    ));
    // resolving path: the writer's field order arrives as a permutation of
    // reader indices, dispatched case by case
    assert!(header.contains("            const std::vector<size_t> fo = rd->fieldOrder();\n"));
    assert!(header.contains(
        "                case 0:\n                    avro::decode(d, v.a);\n                    break;\n"
    ));
    assert!(header.contains(
        "                case 1:\n                    avro::decode(d, v.b);\n                    break;\n"
    ));
    assert!(header.contains(
        "                case 2:\n                    avro::decode(d, v.c);\n                    break;\n"
    ));
    // non-resolving path: declared order
    assert!(header.contains(
        "            avro::decode(d, v.a);\n            avro::decode(d, v.b);\n            avro::decode(d, v.c);\n"
    ));
}

#[test]
fn empty_record_codec_still_queries_the_field_order() {
    let header = generate(r#"{"type": "record", "name": "Empty", "fields": []}"#);
    assert!(header.contains("    static void encode(Encoder&, const Empty&) {}\n"));
    assert!(header.contains("            rd->fieldOrder();\n"));
}

// ------------------------- containers & named types ----------------------- //

#[test]
fn containers_and_fixed_map_to_their_runtime_shapes() {
    let header = generate(
        r#"{"type": "record", "name": "Holder", "fields": [
            {"name": "hash", "type": {"type": "fixed", "name": "MD5", "size": 16}},
            {"name": "counts", "type": {"type": "map", "values": "int"}},
            {"name": "tags", "type": {"type": "array", "items": "string"}}
        ]}"#,
    );
    assert!(header.contains("    std::array<uint8_t, 16> hash;\n"));
    assert!(header.contains("    std::map<std::string, int32_t > counts;\n"));
    assert!(header.contains("    std::vector<std::string > tags;\n"));
}

#[test]
fn array_of_union_fields_get_an_item_typedef() {
    let header = generate(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": {"type": "array", "items": ["null", "int"]}}
        ]}"#,
    );
    assert!(header.contains(
        "    typedef std::vector<test_json_Union__0__ >::value_type a_item_t;\n"
    ));
}

#[test]
fn union_typedefs_can_be_suppressed() {
    let header = generate_with(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "int"]}
        ]}"#,
        Options {
            no_union_typedef: true,
            ..options()
        },
    );
    assert!(!header.contains("typedef"));
    assert!(header.contains("    test_json_Union__0__ a;\n"));
}

// --------------------------- output envelope ------------------------------ //

#[test]
fn header_envelope_has_banner_guard_and_includes() {
    let header = generate(r#"{"type": "record", "name": "P", "fields": []}"#);
    assert!(header.starts_with("/* This code was generated by avro-cppgen "));
    let token = guard::fresh_guard("test.hh");
    assert!(header.contains(&format!("#ifndef {token}\n#define {token}\n")));
    assert!(header.contains("#include \"avro/Specific.hh\"\n"));
    assert!(header.contains("#include \"avro/Encoder.hh\"\n"));
    assert!(header.contains("#include \"avro/Decoder.hh\"\n"));
    assert!(header.trim_end().ends_with("#endif"));
}

#[test]
fn include_prefix_can_be_disabled() {
    let header = generate_with(
        r#"{"type": "record", "name": "P", "fields": []}"#,
        Options {
            include_prefix: String::new(),
            ..options()
        },
    );
    assert!(header.contains("#include \"Specific.hh\"\n"));
}

#[test]
fn regeneration_is_deterministic_and_reuses_its_own_guard() {
    let schema = r#"{"type": "record", "name": "Stable", "fields": [
        {"name": "xs", "type": {"type": "array", "items": ["null", "Stable"]}}
    ]}"#;
    let first = generate(schema);
    let second = generate(schema);
    assert_eq!(first, second);
    // a later run over the emitted file would find and keep the token
    let token = guard::read_guard(&first).expect("generated header has a guard");
    assert_eq!(token, guard::fresh_guard("test.hh"));
    let third = generate_with(
        schema,
        Options {
            guard: Some(token.clone()),
            ..options()
        },
    );
    assert_eq!(first, third);
}

#[test]
fn explicit_guard_token_wins() {
    let header = generate_with(
        r#"{"type": "record", "name": "P", "fields": []}"#,
        Options {
            guard: Some("MY_GUARD_H".to_string()),
            ..options()
        },
    );
    assert!(header.contains("#ifndef MY_GUARD_H\n#define MY_GUARD_H\n"));
}

#[test]
fn namespace_wraps_types_and_qualifies_codecs() {
    let header = generate_with(
        r#"{"type": "record", "name": "Point", "fields": [
            {"name": "x", "type": "double"},
            {"name": "y", "type": "double"}
        ]}"#,
        Options {
            namespace: Some("gen".to_string()),
            ..options()
        },
    );
    assert!(header.contains("namespace gen {\n"));
    // inside the namespace the record's own fields use unqualified names;
    // codec traits live in namespace avro and must qualify
    assert!(header.contains("struct Point {"));
    assert!(header.contains("template<> struct codec_traits<gen::Point> {"));
    assert!(header.contains("namespace avro {\n"));
}

#[test]
fn primitive_root_schema_emits_only_the_envelope() {
    let header = generate(r#""int""#);
    assert!(!header.contains("struct "));
    assert!(!header.contains("codec_traits"));
    assert!(header.contains("#endif\n"));
}
