//! Hand-assembled descriptors for the fixture service.
//!
//! Building the `FileDescriptorProto` in Rust keeps the workspace hermetic: no
//! `protoc` invocation, no checked-in binary descriptor blob. The equivalent proto
//! source would read:
//!
//! ```proto
//! syntax = "proto3";
//! package addsvc;
//!
//! service Add {
//!   rpc Sum(SumRequest) returns (SumReply);
//!   rpc Concat(ConcatRequest) returns (ConcatReply);
//!   rpc Meta(MetaRequest) returns (MetaReply);
//!   rpc Annotate(Node) returns (ConcatReply);
//!   rpc StreamSum(SumRequest) returns (stream SumReply);
//! }
//!
//! message SumRequest {
//!   // The left operand.
//!   int32 a = 1;
//!   int32 b = 2;
//! }
//! message SumReply { int32 v = 1; string err = 2; }
//! message ConcatRequest { string a = 1; string b = 2; }
//! message ConcatReply { string v = 1; string err = 2; }
//! message MetaRequest { string key = 1; }
//! message MetaReply { repeated string values = 1; }
//! message Node {
//!   message Meta { string note = 1; }
//!   enum Color { COLOR_UNSPECIFIED = 0; RED = 1; BLUE = 2; }
//!   string label = 1;
//!   Color color = 2;
//!   repeated Node children = 3;
//!   Meta meta = 4;
//!   Meta alt_meta = 5;
//! }
//! ```
use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto, ServiceDescriptorProto,
    SourceCodeInfo,
};

pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![adder_file()],
    }
}

pub fn descriptor_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set())
        .expect("fixture descriptors are valid")
}

fn adder_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("adder.proto".to_string()),
        package: Some("addsvc".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message(
                "SumRequest",
                vec![scalar("a", 1, Type::Int32), scalar("b", 2, Type::Int32)],
            ),
            message(
                "SumReply",
                vec![scalar("v", 1, Type::Int32), scalar("err", 2, Type::String)],
            ),
            message(
                "ConcatRequest",
                vec![scalar("a", 1, Type::String), scalar("b", 2, Type::String)],
            ),
            message(
                "ConcatReply",
                vec![scalar("v", 1, Type::String), scalar("err", 2, Type::String)],
            ),
            message("MetaRequest", vec![scalar("key", 1, Type::String)]),
            message(
                "MetaReply",
                vec![repeated(scalar("values", 1, Type::String))],
            ),
            node_message(),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Add".to_string()),
            method: vec![
                unary("Sum", ".addsvc.SumRequest", ".addsvc.SumReply"),
                unary("Concat", ".addsvc.ConcatRequest", ".addsvc.ConcatReply"),
                unary("Meta", ".addsvc.MetaRequest", ".addsvc.MetaReply"),
                unary("Annotate", ".addsvc.Node", ".addsvc.ConcatReply"),
                MethodDescriptorProto {
                    server_streaming: Some(true),
                    ..unary("StreamSum", ".addsvc.SumRequest", ".addsvc.SumReply")
                },
            ],
            ..Default::default()
        }],
        // One leading comment so comment extraction has something to find:
        // path [4, 0, 2, 0] = message 0 (SumRequest), field 0 (a).
        source_code_info: Some(SourceCodeInfo {
            location: vec![Location {
                path: vec![4, 0, 2, 0],
                leading_comments: Some(" The left operand.\n".to_string()),
                ..Default::default()
            }],
        }),
        ..Default::default()
    }
}

fn node_message() -> DescriptorProto {
    DescriptorProto {
        nested_type: vec![message("Meta", vec![scalar("note", 1, Type::String)])],
        enum_type: vec![EnumDescriptorProto {
            name: Some("Color".to_string()),
            value: vec![
                enum_value("COLOR_UNSPECIFIED", 0),
                enum_value("RED", 1),
                enum_value("BLUE", 2),
            ],
            ..Default::default()
        }],
        ..message(
            "Node",
            vec![
                scalar("label", 1, Type::String),
                composite("color", 2, Type::Enum, ".addsvc.Node.Color"),
                repeated(composite("children", 3, Type::Message, ".addsvc.Node")),
                composite("meta", 4, Type::Message, ".addsvc.Node.Meta"),
                composite("alt_meta", 5, Type::Message, ".addsvc.Node.Meta"),
            ],
        )
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn composite(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

fn unary(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

fn enum_value(name: &str, number: i32) -> EnumValueDescriptorProto {
    EnumValueDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        ..Default::default()
    }
}
