use crate::Sha256;
use rand::rngs::OsRng;
use secp256k1::ecdsa;
use secp256k1::{Message, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Hex-encoded compressed secp256k1 public key that receives transaction outputs.
#[derive(Debug, Clone, Hash, Serialize, Deserialize, Eq, PartialEq)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(public_key: String) -> Self {
        Self(public_key)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DER-encoded ECDSA signature over the signable data of one transaction input.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn new(der_bytes: Vec<u8>) -> Self {
        Self(der_bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.as_slice()))
    }
}

/// A secp256k1 keypair that owns coins and signs the inputs spending them.
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key: PublicKey(hex::encode(public_key.serialize())),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs the SHA-256 digest of the given message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let secp = Secp256k1::new();
        let message = digest_message(message);
        let signature = secp.sign_ecdsa(&message, &self.secret_key);
        Signature(signature.serialize_der().as_ref().to_vec())
    }
}

/// Checks the signature against the given public key, over the SHA-256 digest of the
/// message. Malformed keys and signatures fail verification instead of aborting, since
/// both arrive inside untrusted transaction data.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let secp = Secp256k1::verification_only();
    let public_key = match decode_public_key(public_key) {
        Ok(public_key) => public_key,
        Err(_) => return false,
    };
    let signature = match ecdsa::Signature::from_der(signature.as_slice()) {
        Ok(signature) => signature,
        Err(_) => return false,
    };
    let message = digest_message(message);
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}

fn digest_message(message: &[u8]) -> Message {
    let digest = Sha256::digest(message);
    // A 32-byte digest is always a valid message.
    Message::from_digest_slice(digest.as_slice()).unwrap()
}

fn decode_public_key(public_key: &PublicKey) -> Result<secp256k1::PublicKey, String> {
    let bytes = hex::decode(&public_key.0).map_err(|e| e.to_string())?;
    secp256k1::PublicKey::from_slice(&bytes).map_err(|e| e.to_string())
}
