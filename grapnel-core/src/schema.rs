//! # Descriptor Resolver
//!
//! Schema discovery over a verified channel: listing the services a server exposes,
//! resolving a service by a loosely qualified name, finding a method inside it, and
//! flattening message descriptors into the transport-neutral [`model`] types.
//!
//! Name resolution is deliberately forgiving. The requested service name comes from a
//! human typing into a UI, so `Add`, `addsvc.Add`, `ADDSVC.ADD` and `add` should all
//! land on `addsvc.Add` as long as the match is unambiguous enough; see [`find_service`]
//! for the exact ladder.
mod describe;
pub mod model;

pub use describe::describe_message;
pub use model::{
    CircularRef, EnumSchema, EnumValueSchema, FieldSchema, MessageNode, MessageSchema,
    MethodSchema, MethodSummary, ServiceSchema,
};

use crate::reflection::client::{ReflectionClient, ReflectionError};
use prost_reflect::{MethodDescriptor, ServiceDescriptor};
use tonic::transport::Channel;
use tracing::{debug, warn};

/// The reflection service itself, hidden from schema listings.
pub const REFLECTION_SERVICE: &str = "grpc.reflection.v1alpha.ServerReflection";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("No services found. Verify that the server supports reflection.")]
    NoServices,

    #[error("Service '{requested}' not found. Available services: {available:?}")]
    ServiceNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("Method {method} not found in service {service}")]
    MethodNotFound { method: String, service: String },

    #[error(transparent)]
    Reflection(#[from] ReflectionError),
}

/// Lists the schema of every service the server exposes, one [`ServiceSchema`] per
/// non-reflection service.
///
/// Services that fail to resolve individually are skipped with a warning rather than
/// failing the whole listing, so one broken descriptor does not hide the rest.
pub async fn list_schema(channel: Channel) -> Result<Vec<ServiceSchema>, SchemaError> {
    let mut client = ReflectionClient::new(channel);

    let services = client.list_services().await?;
    if services.is_empty() {
        return Err(SchemaError::NoServices);
    }
    debug!(count = services.len(), "listed services");

    let mut result = Vec::new();
    for service_name in services {
        if service_name == REFLECTION_SERVICE {
            continue;
        }
        match service_schema(&mut client, &service_name).await {
            Ok(schema) => result.push(schema),
            Err(error) => {
                warn!(service = %service_name, %error, "skipping service");
            }
        }
    }

    Ok(result)
}

async fn service_schema(
    client: &mut ReflectionClient,
    service_name: &str,
) -> Result<ServiceSchema, SchemaError> {
    let pool = client.descriptor_pool_for_symbol(service_name).await?;
    let service =
        pool.get_service_by_name(service_name)
            .ok_or_else(|| SchemaError::ServiceNotFound {
                requested: service_name.to_string(),
                available: pool.services().map(|s| s.full_name().to_string()).collect(),
            })?;

    Ok(ServiceSchema {
        service_name: service_name.to_string(),
        methods: service.methods().map(|m| summarize(&m)).collect(),
    })
}

fn summarize(method: &MethodDescriptor) -> MethodSummary {
    MethodSummary {
        name: method.name().to_string(),
        full_name: method.full_name().to_string(),
        input_type: method.input().full_name().to_string(),
        output_type: method.output().full_name().to_string(),
        is_streaming: method.is_client_streaming() || method.is_server_streaming(),
    }
}

/// Resolves a method descriptor by loosely qualified service and method name.
///
/// This is the resolution path both the schema-detail endpoint and the invoker share:
/// list the server's services, pick the best service match, fetch its descriptors, then
/// match the method inside it.
pub async fn resolve_method(
    channel: Channel,
    service: &str,
    method: &str,
) -> Result<MethodDescriptor, SchemaError> {
    let mut client = ReflectionClient::new(channel);

    let services = client.list_services().await?;
    let actual =
        find_service(&services, service).ok_or_else(|| SchemaError::ServiceNotFound {
            requested: service.to_string(),
            available: services.clone(),
        })?;
    debug!(requested = %service, resolved = %actual, "matched service");

    let pool = client.descriptor_pool_for_symbol(actual).await?;
    let descriptor =
        pool.get_service_by_name(actual)
            .ok_or_else(|| SchemaError::ServiceNotFound {
                requested: actual.to_string(),
                available: services.clone(),
            })?;

    find_method(&descriptor, method).ok_or_else(|| SchemaError::MethodNotFound {
        method: method.to_string(),
        service: actual.to_string(),
    })
}

/// Returns the full detail of one method, including the recursively described input
/// message.
pub async fn method_schema(
    channel: Channel,
    service: &str,
    method: &str,
) -> Result<MethodSchema, SchemaError> {
    let descriptor = resolve_method(channel, service, method).await?;

    Ok(MethodSchema {
        service_name: descriptor.parent_service().full_name().to_string(),
        method_name: descriptor.name().to_string(),
        full_name: descriptor.full_name().to_string(),
        input_type: descriptor.input().full_name().to_string(),
        output_type: descriptor.output().full_name().to_string(),
        input_details: describe_message(&descriptor.input()),
        is_streaming: descriptor.is_client_streaming() || descriptor.is_server_streaming(),
    })
}

/// Picks the best match for `requested` out of the service names a server listed.
///
/// The ladder, first hit wins:
/// 1. exact match;
/// 2. exact match on the last dotted segment of the requested name;
/// 3. case-insensitive match (full name or last segment);
/// 4. case-insensitive substring containment in either direction (last segment only).
pub fn find_service<'a>(available: &'a [String], requested: &str) -> Option<&'a str> {
    if let Some(hit) = available.iter().find(|s| s.as_str() == requested) {
        return Some(hit.as_str());
    }

    let short = requested
        .rsplit_once('.')
        .map(|(_, last)| last)
        .unwrap_or(requested);
    if let Some(hit) = available.iter().find(|s| s.as_str() == short) {
        return Some(hit.as_str());
    }

    if let Some(hit) = available
        .iter()
        .find(|s| s.eq_ignore_ascii_case(requested) || s.eq_ignore_ascii_case(short))
    {
        return Some(hit.as_str());
    }

    let short = short.to_lowercase();
    available
        .iter()
        .find(|s| {
            let candidate = s.to_lowercase();
            candidate.contains(&short) || short.contains(&candidate)
        })
        .map(String::as_str)
}

/// Finds a method within a resolved service by case-insensitive short name, falling
/// back to the last dotted segment of the fully qualified method name.
pub fn find_method(service: &ServiceDescriptor, requested: &str) -> Option<MethodDescriptor> {
    if let Some(hit) = service
        .methods()
        .find(|m| m.name().eq_ignore_ascii_case(requested))
    {
        return Some(hit);
    }

    service.methods().find(|m| {
        m.full_name()
            .rsplit_once('.')
            .is_some_and(|(_, last)| last.eq_ignore_ascii_case(requested))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services() -> Vec<String> {
        vec![
            "addsvc.Add".to_string(),
            "helloworld.Greeter".to_string(),
            REFLECTION_SERVICE.to_string(),
        ]
    }

    #[test]
    fn exact_match_wins() {
        assert_eq!(find_service(&services(), "addsvc.Add"), Some("addsvc.Add"));
    }

    #[test]
    fn short_name_matches_last_segment() {
        // No service is literally named "Add", but the substring rung lands on it.
        assert_eq!(find_service(&services(), "Add"), Some("addsvc.Add"));
    }

    #[test]
    fn case_insensitive_full_name() {
        assert_eq!(
            find_service(&services(), "ADDSVC.ADD"),
            Some("addsvc.Add")
        );
    }

    #[test]
    fn substring_matches_either_direction() {
        // Requested fragment contained in a listed name.
        assert_eq!(
            find_service(&services(), "greet"),
            Some("helloworld.Greeter")
        );
        // Listed name contained in the requested fragment.
        let available = vec!["Echo".to_string()];
        assert_eq!(find_service(&available, "MyEchoService"), Some("Echo"));
    }

    #[test]
    fn miss_returns_none() {
        assert_eq!(find_service(&services(), "nosuch.Service"), None);
    }

    #[test]
    fn exact_beats_substring() {
        let available = vec!["a.Echo".to_string(), "Echo".to_string()];
        assert_eq!(find_service(&available, "Echo"), Some("Echo"));
    }
}
