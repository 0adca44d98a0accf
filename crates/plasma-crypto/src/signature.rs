//! # secp256k1 Recoverable Signatures
//!
//! Ethereum-style signatures over 32-byte digests. A signature is the
//! triple `(v, r, s)` with `v ∈ {27, 28}`; verification recovers the
//! signer's public key from the signature and compares the derived
//! 20-byte address against the expected owner. There is no separate
//! public-key registry: an address *is* the identity.
//!
//! ## Security Invariant
//!
//! - Signing input is a [`Hash256`] digest, never raw bytes. Transaction
//!   signing hashes are produced by the typed-tuple packer, so a signature
//!   always commits to the same bytes the root-chain verifier hashes.
//! - Private keys are never serialized or logged. `SigningKeyPair` does
//!   not implement `Serialize` and its `Debug` output is redacted.
//! - Verification is a predicate. Malformed signature material yields
//!   `false`, never a panic.
//!
//! ## Serde
//!
//! Signatures serialize as the 65-byte RPC form `r || s || v`, hex-encoded
//! with a `0x` prefix, the same string `eth_sign` returns. Deserialization
//! keeps `v` exactly as written, so a value always reads back unchanged.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use plasma_core::error::CryptoError;
use plasma_core::{hex, keccak256, Address, Hash256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Offset Ethereum adds to the raw recovery id.
const V_OFFSET: u8 = 27;

/// Length of the RPC signature form `r || s || v`.
const RPC_SIGNATURE_LEN: usize = 65;

/// A recoverable secp256k1 signature in `(v, r, s)` form.
///
/// The all-zero value is the *absent* signature carried by unsigned or
/// padding inputs; it never verifies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    v: u8,
    r: [u8; 32],
    s: [u8; 32],
}

/// A secp256k1 key pair for signing digests.
///
/// Does not implement `Serialize`. Private keys must not be accidentally
/// serialized into logs, events, or wire payloads.
pub struct SigningKeyPair {
    signing_key: SigningKey,
}

// ---------------------------------------------------------------------------
// Signature impls
// ---------------------------------------------------------------------------

impl Signature {
    /// Assemble a signature from its components.
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// The absent signature: `v = 0`, `r = s = 0`.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true for the all-zero absent signature.
    pub fn is_absent(&self) -> bool {
        self.v == 0 && self.r == [0u8; 32] && self.s == [0u8; 32]
    }

    /// The `v` component (27 or 28 for a real signature).
    pub fn v(&self) -> u8 {
        self.v
    }

    /// The `r` component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The `s` component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// The raw recovery id encoded by `v`, if `v` is 27 or 28.
    pub fn recovery_id(&self) -> Option<RecoveryId> {
        match self.v {
            27 | 28 => RecoveryId::from_byte(self.v - V_OFFSET),
            _ => None,
        }
    }

    /// Parse the 65-byte RPC form `r || s || v`.
    ///
    /// Some signers emit the raw recovery id (`0` or `1`) as the last byte;
    /// it is normalized to `27`/`28`. The all-zero form stays absent.
    pub fn from_rpc_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sig = Self::split_rpc_bytes(bytes)?;
        if sig.is_absent() {
            return Ok(sig);
        }
        let v = match sig.v {
            raw @ (0 | 1) => raw + V_OFFSET,
            v => v,
        };
        Ok(Self { v, ..sig })
    }

    /// Split the RPC form without touching `v`.
    fn split_rpc_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != RPC_SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature(format!(
                "expected {RPC_SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    /// Parse the hex-encoded RPC form, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(text).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_rpc_bytes(&bytes)
    }

    /// The 65-byte RPC form `r || s || v`.
    pub fn to_rpc_bytes(&self) -> [u8; RPC_SIGNATURE_LEN] {
        let mut out = [0u8; RPC_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Hex-encoded RPC form with a `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.to_rpc_bytes())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature(v={}, {})", self.v, hex::encode_prefixed(&self.r))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        Self::split_rpc_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SigningKeyPair impls
// ---------------------------------------------------------------------------

impl SigningKeyPair {
    /// Generate a new random key pair using the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Load a key pair from a 32-byte big-endian private scalar.
    ///
    /// Rejects zero and values at or above the curve order.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Load a key pair from a hex-encoded private scalar.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode_padded::<32>(text)
            .map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The Ethereum address controlled by this key.
    pub fn address(&self) -> Address {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest, returning a recoverable `(v, r, s)` signature.
    ///
    /// The digest is signed as-is; no Ethereum message prefix is applied.
    pub fn sign_digest(&self, digest: &Hash256) -> Result<Signature, CryptoError> {
        let (sig, rid) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let (r, s) = sig.split_bytes();
        let mut r_bytes = [0u8; 32];
        let mut s_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&r);
        s_bytes.copy_from_slice(&s);
        Ok(Signature::new(V_OFFSET + rid.to_byte(), r_bytes, s_bytes))
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKeyPair({}, <private>)", self.address())
    }
}

// ---------------------------------------------------------------------------
// Recovery and verification
// ---------------------------------------------------------------------------

/// Derive the Ethereum address of a public key: the last 20 bytes of the
/// Keccak-256 hash of the uncompressed point without its `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest.as_bytes()[12..]);
    Address::from_bytes(out)
}

/// Recover the signer address of `digest` from a recoverable signature.
///
/// # Errors
///
/// Returns `CryptoError::InvalidSignature` if `v` is not 27/28, if `r` or
/// `s` is out of range, or if no public key recovers.
pub fn recover_address(digest: &Hash256, signature: &Signature) -> Result<Address, CryptoError> {
    let rid = signature.recovery_id().ok_or_else(|| {
        CryptoError::InvalidSignature(format!("v must be 27 or 28, got {}", signature.v))
    })?;
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = EcdsaSignature::from_slice(&rs)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, rid)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(address_of(&key))
}

/// True iff `signature` over `digest` recovers to `expected`.
///
/// Absent or malformed signatures return `false`.
pub fn verify_address(digest: &Hash256, signature: &Signature, expected: &Address) -> bool {
    if signature.is_absent() {
        return false;
    }
    matches!(recover_address(digest, signature), Ok(addr) if addr == *expected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> SigningKeyPair {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        SigningKeyPair::from_bytes(&secret).unwrap()
    }

    #[test]
    fn test_known_address_for_private_key_one() {
        assert_eq!(
            key_one().address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_from_hex_pads_short_scalar() {
        let kp = SigningKeyPair::from_hex("0x1").unwrap();
        assert_eq!(kp.address(), key_one().address());
    }

    #[test]
    fn test_zero_key_rejected() {
        assert!(SigningKeyPair::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_wrong_length_key_rejected() {
        assert!(SigningKeyPair::from_bytes(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = SigningKeyPair::generate();
        let digest = keccak256(b"spend output 0");
        let sig = kp.sign_digest(&digest).unwrap();
        assert!(sig.v() == 27 || sig.v() == 28);
        assert_eq!(recover_address(&digest, &sig).unwrap(), kp.address());
        assert!(verify_address(&digest, &sig, &kp.address()));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = key_one();
        let digest = keccak256(b"rfc6979");
        assert_eq!(kp.sign_digest(&digest).unwrap(), kp.sign_digest(&digest).unwrap());
    }

    #[test]
    fn test_verify_rejects_other_signer() {
        let alice = SigningKeyPair::generate();
        let bob = SigningKeyPair::generate();
        let digest = keccak256(b"payload");
        let sig = alice.sign_digest(&digest).unwrap();
        assert!(!verify_address(&digest, &sig, &bob.address()));
    }

    #[test]
    fn test_verify_rejects_other_digest() {
        let kp = SigningKeyPair::generate();
        let sig = kp.sign_digest(&keccak256(b"a")).unwrap();
        assert!(!verify_address(&keccak256(b"b"), &sig, &kp.address()));
    }

    #[test]
    fn test_absent_signature_never_verifies() {
        let digest = keccak256(b"x");
        assert!(Signature::none().is_absent());
        assert!(!verify_address(&digest, &Signature::none(), &Address::ZERO));
        assert!(recover_address(&digest, &Signature::none()).is_err());
    }

    #[test]
    fn test_bad_v_rejected() {
        let kp = key_one();
        let digest = keccak256(b"x");
        let sig = kp.sign_digest(&digest).unwrap();
        let bad = Signature::new(29, *sig.r(), *sig.s());
        assert!(recover_address(&digest, &bad).is_err());
        assert!(!verify_address(&digest, &bad, &kp.address()));
    }

    #[test]
    fn test_flipped_v_recovers_different_address() {
        let kp = key_one();
        let digest = keccak256(b"x");
        let sig = kp.sign_digest(&digest).unwrap();
        let flipped = Signature::new(if sig.v() == 27 { 28 } else { 27 }, *sig.r(), *sig.s());
        assert!(!verify_address(&digest, &flipped, &kp.address()));
    }

    #[test]
    fn test_rpc_bytes_roundtrip() {
        let kp = key_one();
        let sig = kp.sign_digest(&keccak256(b"rpc")).unwrap();
        let bytes = sig.to_rpc_bytes();
        assert_eq!(bytes[64], sig.v());
        assert_eq!(Signature::from_rpc_bytes(&bytes).unwrap(), sig);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }

    #[test]
    fn test_rpc_raw_recovery_id_normalized() {
        let mut bytes = [0u8; 65];
        bytes[0] = 0x11;
        bytes[64] = 1;
        assert_eq!(Signature::from_rpc_bytes(&bytes).unwrap().v(), 28);
        bytes[64] = 0;
        assert_eq!(Signature::from_rpc_bytes(&bytes).unwrap().v(), 27);
    }

    #[test]
    fn test_rpc_wrong_length_rejected() {
        assert!(Signature::from_rpc_bytes(&[0u8; 64]).is_err());
        assert!(Signature::from_hex("0xzz").is_err());
    }

    #[test]
    fn test_serde_hex_string() {
        let sig = key_one().sign_digest(&keccak256(b"serde")).unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.starts_with("\"0x"));
        assert_eq!(json.len(), 2 + 2 + 130);
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_rpc_all_zero_stays_absent() {
        let sig = Signature::from_rpc_bytes(&[0u8; 65]).unwrap();
        assert!(sig.is_absent());
        assert_eq!(Signature::from_hex(&Signature::none().to_hex()).unwrap(), Signature::none());
    }

    #[test]
    fn test_serde_absent_signature_reads_back_absent() {
        let json = serde_json::to_string(&Signature::none()).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert!(back.is_absent());
        assert_eq!(back.v(), 0);
    }

    #[test]
    fn test_serde_keeps_raw_v() {
        let sig = Signature::new(1, [0x22; 32], [0x33; 32]);
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
        assert_eq!(back.v(), 1);
    }

    #[test]
    fn test_keypair_debug_redacts_private_key() {
        let kp = key_one();
        let debug = format!("{kp:?}");
        assert!(debug.contains("<private>"));
        assert!(debug.contains("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"));
    }
}
