#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Malformed global identifier '{0}'")]
pub struct MalformedIdentifier(pub String);

/// Opaque global identifiers carrying the type and the key of an entity.
pub trait IdCodec: Send + Sync + 'static {
    fn encode(&self, ty: &str, id: &str) -> String;

    fn decode(&self, global_id: &str) -> Result<(String, String), MalformedIdentifier>;
}
