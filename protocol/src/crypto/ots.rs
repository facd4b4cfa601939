//! # One-Time-Signature Boundary
//!
//! The channel core never derives keys or produces signatures itself. It
//! calls two collaborators through the traits in this module:
//!
//! - [`DigestSource`] turns `(seed, index, security)` into a public
//!   [`Digest`].
//! - [`FragmentSigner`] produces `security` signature fragments over a bundle
//!   hash, and recovers the signer's digest from fragments so a multisig
//!   address can be re-derived and checked.
//!
//! [`Ed25519Ots`] is the reference scheme shipped with the crate. Each
//! fragment is an independent Ed25519 key derived from the seed, the key
//! index and the fragment number; the digest commits to the fragment public
//! keys. Recovery verifies every fragment and recomputes that commitment.
//!
//! Key bytes are never logged. Fragments reveal only public keys and
//! signatures.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::blake3_tagged;
use crate::config::{DIGEST_DOMAIN, FRAGMENT_KEY_DOMAIN};
use crate::multisig::{Digest, Security, Seed};

/// Hash of a bundle's canonical bytes; the message every fragment signs.
pub type BundleHash = [u8; 32];

/// Errors raised while recovering a digest from fragments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtsError {
    /// The fragment slice was empty.
    #[error("no fragments supplied")]
    Empty,

    /// Fragment at this position is not valid hex of the expected length.
    #[error("fragment {0} is malformed")]
    MalformedFragment(usize),

    /// Fragment at this position does not sign the message.
    #[error("fragment {0} does not verify")]
    VerificationFailed(usize),
}

// ---------------------------------------------------------------------------
// SignatureFragment
// ---------------------------------------------------------------------------

/// One signature fragment, hex-encoded. Opaque to the channel core.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureFragment(String);

impl SignatureFragment {
    /// Wraps an encoded fragment.
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    /// The encoded fragment.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignatureFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.chars().take(12).collect();
        write!(f, "SignatureFragment({}…)", head)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Deterministic digest derivation.
pub trait DigestSource {
    /// Public digest of the key at `(seed, index, security)`.
    fn digest(&self, seed: &Seed, index: u64, security: Security) -> Digest;
}

/// Fragment signing and digest recovery.
pub trait FragmentSigner {
    /// Signs `message` with the key at `(seed, index, security)`, returning
    /// exactly `security` fragments.
    fn sign(
        &self,
        seed: &Seed,
        index: u64,
        security: Security,
        message: &BundleHash,
    ) -> Vec<SignatureFragment>;

    /// Recovers the digest value committed to by `fragments` over `message`.
    fn recover_digest(
        &self,
        message: &BundleHash,
        fragments: &[SignatureFragment],
    ) -> Result<String, OtsError>;
}

/// A full one-time-signature scheme.
pub trait OneTimeSignature: DigestSource + FragmentSigner {}

impl<T: DigestSource + FragmentSigner> OneTimeSignature for T {}

// ---------------------------------------------------------------------------
// Ed25519Ots
// ---------------------------------------------------------------------------

const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// Reference scheme: one Ed25519 key per fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Ots;

impl Ed25519Ots {
    fn fragment_key(seed: &Seed, index: u64, fragment: u8) -> SigningKey {
        let secret = blake3_tagged(
            FRAGMENT_KEY_DOMAIN,
            &[seed.as_bytes(), &index.to_le_bytes(), &[fragment]],
        );
        SigningKey::from_bytes(&secret)
    }

    fn digest_value(public_keys: &[[u8; PUBLIC_KEY_LEN]]) -> String {
        let parts: Vec<&[u8]> = public_keys.iter().map(|pk| pk.as_slice()).collect();
        hex::encode(blake3_tagged(DIGEST_DOMAIN, &parts))
    }
}

impl DigestSource for Ed25519Ots {
    fn digest(&self, seed: &Seed, index: u64, security: Security) -> Digest {
        let public_keys: Vec<[u8; PUBLIC_KEY_LEN]> = (0..security.get())
            .map(|f| Self::fragment_key(seed, index, f).verifying_key().to_bytes())
            .collect();
        Digest {
            index,
            security,
            value: Self::digest_value(&public_keys),
        }
    }
}

impl FragmentSigner for Ed25519Ots {
    fn sign(
        &self,
        seed: &Seed,
        index: u64,
        security: Security,
        message: &BundleHash,
    ) -> Vec<SignatureFragment> {
        (0..security.get())
            .map(|f| {
                let key = Self::fragment_key(seed, index, f);
                let signature = key.sign(message);
                let mut encoded = Vec::with_capacity(PUBLIC_KEY_LEN + SIGNATURE_LEN);
                encoded.extend_from_slice(&key.verifying_key().to_bytes());
                encoded.extend_from_slice(&signature.to_bytes());
                SignatureFragment::new(hex::encode(encoded))
            })
            .collect()
    }

    fn recover_digest(
        &self,
        message: &BundleHash,
        fragments: &[SignatureFragment],
    ) -> Result<String, OtsError> {
        if fragments.is_empty() {
            return Err(OtsError::Empty);
        }

        let mut public_keys = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            let bytes = hex::decode(fragment.as_str()).map_err(|_| OtsError::MalformedFragment(i))?;
            if bytes.len() != PUBLIC_KEY_LEN + SIGNATURE_LEN {
                return Err(OtsError::MalformedFragment(i));
            }

            let mut pk = [0u8; PUBLIC_KEY_LEN];
            pk.copy_from_slice(&bytes[..PUBLIC_KEY_LEN]);
            let mut sig = [0u8; SIGNATURE_LEN];
            sig.copy_from_slice(&bytes[PUBLIC_KEY_LEN..]);

            let verifying_key =
                VerifyingKey::from_bytes(&pk).map_err(|_| OtsError::MalformedFragment(i))?;
            verifying_key
                .verify_strict(message, &Signature::from_bytes(&sig))
                .map_err(|_| OtsError::VerificationFailed(i))?;

            public_keys.push(pk);
        }

        Ok(Self::digest_value(&public_keys))
    }
}
