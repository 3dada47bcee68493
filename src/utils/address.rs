use crate::error::{DashboardError, Result};
use crate::models::PubKey;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bech32::{FromBase32, ToBase32, Variant};
use sha2::{Digest, Sha256};

const ED25519_PUBKEY_TYPE: &str = "/cosmos.crypto.ed25519.PubKey";

/// Encodes a validator's consensus public key as a bech32 consensus address
/// (first 20 bytes of the SHA-256 of the ed25519 key).
pub fn pubkey_to_bech32(pubkey: &PubKey, prefix: &str) -> Result<String> {
    if pubkey.type_url != ED25519_PUBKEY_TYPE {
        return Err(DashboardError::InvalidPubKey(format!(
            "unsupported consensus key type {}",
            pubkey.type_url
        )));
    }
    let raw = STANDARD
        .decode(pubkey.key.as_bytes())
        .map_err(|e| DashboardError::InvalidPubKey(e.to_string()))?;
    let digest = Sha256::digest(&raw);
    Ok(bech32::encode(prefix, digest[..20].to_vec().to_base32(), Variant::Bech32)?)
}

/// Re-encodes a bech32 address under another prefix, e.g. a
/// `cosmosvaloper` operator address into its `cosmos` account address.
pub fn translate_address(address: &str, prefix: &str) -> Result<String> {
    let (_, data, variant) = bech32::decode(address)?;
    let bytes = Vec::<u8>::from_base32(&data)?;
    Ok(bech32::encode(prefix, bytes.to_base32(), variant)?)
}

/// True when `address` is well-formed bech32 carrying `prefix`.
pub fn has_prefix(address: &str, prefix: &str) -> bool {
    matches!(bech32::decode(address), Ok((hrp, _, _)) if hrp == prefix)
}

#[cfg(test)]
pub(crate) fn encode_test_address(prefix: &str, seed: u8) -> String {
    bech32::encode(prefix, [seed; 20].to_base32(), Variant::Bech32).unwrap()
}
