//! Recursive flattening of message descriptors into [`MessageNode`] trees.
use super::model::{
    CircularRef, EnumSchema, EnumValueSchema, FieldSchema, MessageNode, MessageSchema,
};
use prost_reflect::{Cardinality, EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};
use prost_types::FileDescriptorProto;
use std::collections::HashSet;

/// Describes a message and everything reachable from it.
///
/// The walk carries an explicit visited set keyed by fully qualified name. Re-entering a
/// message on the current path yields the circular sentinel; on exit the name is removed
/// again so that legitimate reuse of a type at sibling positions is described in full.
pub fn describe_message(message: &MessageDescriptor) -> MessageNode {
    walk(message, &mut HashSet::new())
}

fn walk(message: &MessageDescriptor, visited: &mut HashSet<String>) -> MessageNode {
    let full_name = message.full_name().to_string();
    if !visited.insert(full_name.clone()) {
        return MessageNode::Circular(CircularRef::new(full_name));
    }

    let fields = message
        .fields()
        .map(|field| describe_field(&field, message, visited))
        .collect();

    let nested_types = message
        .child_messages()
        .map(|nested| walk(&nested, visited))
        .collect();

    let enum_types = message.child_enums().map(|e| describe_enum(&e)).collect();

    visited.remove(&full_name);

    MessageNode::Message(Box::new(MessageSchema {
        message: full_name,
        fields,
        nested_types,
        enum_types,
    }))
}

fn describe_field(
    field: &FieldDescriptor,
    parent: &MessageDescriptor,
    visited: &mut HashSet<String>,
) -> FieldSchema {
    let kind = field.kind();
    let repeated = field.is_list();

    let mut schema = FieldSchema {
        name: field.name().to_string(),
        number: field.number(),
        kind: wire_type(&kind).to_string(),
        label: wire_label(field.cardinality()).to_string(),
        required: field.cardinality() == Cardinality::Required,
        repeated,
        is_array: repeated,
        description: leading_comment(parent, field),
        type_name: wire_type(&kind).to_string(),
        message_type: None,
        nested_message: None,
        enum_type: None,
        enum_values: None,
    };

    match kind {
        Kind::Message(nested) => {
            schema.message_type = Some(nested.full_name().to_string());
            schema.type_name = nested.full_name().to_string();
            schema.nested_message = Some(walk(&nested, visited));
        }
        Kind::Enum(e) => {
            schema.enum_type = Some(e.full_name().to_string());
            schema.type_name = e.full_name().to_string();
            schema.enum_values = Some(enum_values(&e));
        }
        _ => {}
    }

    schema
}

fn describe_enum(descriptor: &EnumDescriptor) -> EnumSchema {
    EnumSchema {
        name: descriptor.name().to_string(),
        full_name: descriptor.full_name().to_string(),
        values: enum_values(descriptor),
    }
}

fn enum_values(descriptor: &EnumDescriptor) -> Vec<EnumValueSchema> {
    descriptor
        .values()
        .map(|value| EnumValueSchema {
            name: value.name().to_string(),
            number: value.number(),
        })
        .collect()
}

fn wire_type(kind: &Kind) -> &'static str {
    match kind {
        Kind::Double => "TYPE_DOUBLE",
        Kind::Float => "TYPE_FLOAT",
        Kind::Int64 => "TYPE_INT64",
        Kind::Uint64 => "TYPE_UINT64",
        Kind::Int32 => "TYPE_INT32",
        Kind::Fixed64 => "TYPE_FIXED64",
        Kind::Fixed32 => "TYPE_FIXED32",
        Kind::Bool => "TYPE_BOOL",
        Kind::String => "TYPE_STRING",
        Kind::Bytes => "TYPE_BYTES",
        Kind::Uint32 => "TYPE_UINT32",
        Kind::Sfixed32 => "TYPE_SFIXED32",
        Kind::Sfixed64 => "TYPE_SFIXED64",
        Kind::Sint32 => "TYPE_SINT32",
        Kind::Sint64 => "TYPE_SINT64",
        Kind::Message(_) => "TYPE_MESSAGE",
        Kind::Enum(_) => "TYPE_ENUM",
    }
}

fn wire_label(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::Optional => "LABEL_OPTIONAL",
        Cardinality::Required => "LABEL_REQUIRED",
        Cardinality::Repeated => "LABEL_REPEATED",
    }
}

/// Looks up the leading comment attached to `field` in the file's source info.
///
/// Reflection servers usually strip `SourceCodeInfo`, in which case this is empty. The
/// location path is rebuilt from the declaration indices: `4` selects a top-level
/// message, `3` a nested message, `2` a field.
fn leading_comment(parent: &MessageDescriptor, field: &FieldDescriptor) -> String {
    let file = parent.parent_file();
    let proto = file.file_descriptor_proto();

    let Some(info) = proto.source_code_info.as_ref() else {
        return String::new();
    };
    let Some((mut path, message_proto)) =
        message_path(proto, parent.full_name(), file.package_name())
    else {
        return String::new();
    };
    let Some(index) = message_proto
        .field
        .iter()
        .position(|f| f.number() == field.number() as i32)
    else {
        return String::new();
    };
    path.extend([2, index as i32]);

    info.location
        .iter()
        .find(|location| location.path == path)
        .and_then(|location| location.leading_comments.as_deref())
        .map(|comment| comment.trim().to_string())
        .unwrap_or_default()
}

/// Resolves the source-info path of a (possibly nested) message declaration, along with
/// its raw descriptor proto.
fn message_path<'a>(
    file: &'a FileDescriptorProto,
    full_name: &str,
    package: &str,
) -> Option<(Vec<i32>, &'a prost_types::DescriptorProto)> {
    let relative = full_name
        .strip_prefix(package)
        .map(|rest| rest.trim_start_matches('.'))
        .unwrap_or(full_name);

    let mut segments = relative.split('.');
    let first = segments.next()?;

    let index = file.message_type.iter().position(|m| m.name() == first)?;
    let mut path = vec![4, index as i32];
    let mut current = &file.message_type[index];

    for segment in segments {
        let index = current.nested_type.iter().position(|m| m.name() == segment)?;
        path.extend([3, index as i32]);
        current = &current.nested_type[index];
    }

    Some((path, current))
}
