use base64::{Engine as _, engine::general_purpose::STANDARD};
use runtime::ids::{IdCodec, MalformedIdentifier};

/// Global ids as base64 of `Type:id`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64IdCodec;

impl IdCodec for Base64IdCodec {
    fn encode(&self, ty: &str, id: &str) -> String {
        STANDARD.encode(format!("{ty}:{id}"))
    }

    fn decode(&self, global_id: &str) -> Result<(String, String), MalformedIdentifier> {
        let malformed = || MalformedIdentifier(global_id.to_string());

        let decoded = STANDARD.decode(global_id).map_err(|_| malformed())?;
        let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;

        match decoded.split_once(':') {
            Some((ty, id)) if !ty.is_empty() && !id.is_empty() => Ok((ty.to_string(), id.to_string())),
            _ => Err(malformed()),
        }
    }
}
