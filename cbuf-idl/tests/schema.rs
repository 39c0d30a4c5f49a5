use cbuf_core::{ArrayKind, DefaultValue, ElementType, ScalarKind, Schema};
use cbuf_idl::parse_schema;

const METADATA_SCHEMA: &str =
    "namespace cbufmsg { struct metadata { u64 msg_hash; string msg_name; string msg_meta; } }";

const FRAME_SCHEMA: &str = "\
// Health counters shared by every subsystem.
struct GlobalHealth {
    u32 status;
}

namespace sensors {
    enum Mode { IDLE, ACTIVE = 5, FAULT }

    const u32 RAW_LEN = 8;

    struct Sample {
        u8 kind;
        f64 reading;
    }

    struct Frame {
        u32 id = 3*4*(12*23 + 70)/2;
        f64 ratio = 2.0 * 3.4 / 2.7;
        s16 d = -4;
        bool flag = true;
        string name;
        short_string tag;
        u8 raw[RAW_LEN];
        f32 samples[16] @compact;
        s32 vals[];
        Sample sample;
        GlobalHealth health;
        Mode mode;
    }
}
";

fn parsed(src: &str) -> Schema {
    parse_schema(src).expect("schema should parse")
}

#[test]
fn metadata_descriptor_matches_reference() {
    let schema = parsed(METADATA_SCHEMA);
    let desc = schema.get_str("cbufmsg::metadata").expect("descriptor");

    assert_eq!(desc.hash_value, 0xBE67_38D5_44AB_72C6);
    assert!(!desc.naked);
    let shapes: Vec<(&str, &str)> = desc
        .elements
        .iter()
        .map(|e| (e.name.as_str(), e.ty.type_name()))
        .collect();
    assert_eq!(
        shapes,
        [
            ("msg_hash", "uint64"),
            ("msg_name", "string"),
            ("msg_meta", "string"),
        ]
    );
}

#[test]
fn trailing_newline_is_appended_when_missing() {
    // Same text, no trailing newline.
    let schema = parse_schema(METADATA_SCHEMA.trim_end()).expect("schema should parse");
    assert!(schema.get_str("cbufmsg::metadata").is_some());
}

#[test]
fn comments_including_nested_blocks_are_ignored() {
    let schema = parsed(
        "// line comment\n\
         /* outer /* inner */ */\n\
         struct plain { u8 v; } // trailing\n",
    );
    assert_eq!(schema.len(), 1);
}

#[test]
fn full_feature_struct_emits_expected_descriptors() {
    let schema = parsed(FRAME_SCHEMA);

    // Insertion order: global structs first, then namespaces in source order.
    let names: Vec<&str> = schema.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["GlobalHealth", "sensors::Sample", "sensors::Frame"]);

    let health = schema.get_str("GlobalHealth").expect("GlobalHealth");
    assert_eq!(health.hash_value, 0x2D5C_9A99_0A17_483C);
    assert!(health.simple);

    let sample = schema.get_str("sensors::Sample").expect("Sample");
    assert_eq!(sample.hash_value, 0xDB85_A5F5_B88B_EE27);

    let frame = schema.get_str("sensors::Frame").expect("Frame");
    assert_eq!(frame.hash_value, 0x39FA_8B7C_DBD3_0E5C);
    assert!(!frame.naked);
    assert!(!frame.simple);
    assert!(frame.has_compact);
    assert_eq!(frame.fixed_size, None);
    assert_eq!(frame.elements.len(), 12);

    let elem = |name: &str| {
        frame
            .elements
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("element '{name}'"))
    };

    assert_eq!(elem("id").default_value, Some(DefaultValue::Int(2076)));
    assert_eq!(elem("d").default_value, Some(DefaultValue::Int(-4)));
    assert_eq!(elem("flag").default_value, Some(DefaultValue::Bool(true)));
    let Some(DefaultValue::Float(ratio)) = elem("ratio").default_value else {
        panic!("float default");
    };
    assert!((ratio - 2.0 * 3.4 / 2.7).abs() < f64::EPSILON);

    assert_eq!(elem("tag").ty, ElementType::String { upper_bound: Some(16) });
    assert_eq!(elem("name").ty, ElementType::String { upper_bound: None });

    assert_eq!(elem("raw").array, ArrayKind::Fixed(8));
    assert_eq!(elem("samples").array, ArrayKind::Compact(16));
    assert_eq!(elem("vals").array, ArrayKind::Dynamic);
    assert_eq!(elem("samples").ty, ElementType::Scalar(ScalarKind::F32));

    assert_eq!(elem("sample").ty.type_name(), "sensors::Sample");
    assert!(elem("sample").is_complex());
    assert_eq!(elem("health").ty.type_name(), "GlobalHealth");
    assert_eq!(elem("mode").ty.type_name(), "int32");
    assert!(!elem("mode").is_complex());
}

#[test]
fn naked_structs_carry_the_flag() {
    let schema = parsed("namespace m { struct raw @naked { u8 v; } struct framed { u8 v; } }");
    assert!(schema.get_str("m::raw").expect("raw").naked);
    assert!(!schema.get_str("m::framed").expect("framed").naked);
    // Nakedness changes nothing about the canonical hash input.
    assert_eq!(
        schema.get_str("m::raw").unwrap().elements[0].ty,
        ElementType::Scalar(ScalarKind::U8)
    );
}

#[test]
fn parsing_is_deterministic() {
    let first = parsed(FRAME_SCHEMA);
    let second = parsed(FRAME_SCHEMA);
    assert_eq!(first.len(), second.len());
    for ((name_a, desc_a), (name_b, desc_b)) in first.iter().zip(second.iter()) {
        assert_eq!(name_a, name_b);
        assert_eq!(desc_a.as_ref(), desc_b.as_ref());
    }
}

#[test]
fn struct_positions_point_at_the_name_token() {
    let schema = parsed("namespace a {\n  struct here { u8 v; }\n}\n");
    let desc = schema.get_str("a::here").expect("descriptor");
    assert_eq!((desc.line, desc.column), (2, 10));
}

#[test]
fn errors_render_single_line_diagnostics() {
    let err = parse_schema("struct t { unknown_type v; }\n").expect_err("should fail");
    let rendered = err.to_string();
    assert!(rendered.contains("unknown_type"));
    assert!(rendered.contains("1:"), "diagnostic carries a position: {rendered}");

    let err = parse_schema("struct t { u8 v[2][2]; }\n").expect_err("multidim");
    assert!(err.to_string().contains("multidimensional"));

    let err = parse_schema("struct t { u8 v = 1000; }\n").expect_err("range");
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn duplicate_definitions_fail() {
    assert!(parse_schema("struct t { u8 v; }\nstruct t { u8 v; }\n").is_err());
    assert!(parse_schema("namespace a { struct t {} enum t { X } }\n").is_err());
}

#[test]
fn metadata_hash_is_stable_against_reformatting() {
    let reformatted = "namespace cbufmsg {\n  // self-description header\n  struct metadata {\n    u64 msg_hash;\n    string msg_name;\n    string msg_meta;\n  }\n}\n";
    let a = parsed(METADATA_SCHEMA);
    let b = parsed(reformatted);
    assert_eq!(
        a.get_str("cbufmsg::metadata").unwrap().hash_value,
        b.get_str("cbufmsg::metadata").unwrap().hash_value,
    );
}
