//! # Cryptographic Boundary
//!
//! Hashing helpers plus the one-time-signature traits the channel core calls
//! into. The core decides *when* and *over which address* signing happens;
//! everything that touches key material sits behind [`ots`].

pub mod hash;
pub mod ots;

pub use hash::{blake3_hash, blake3_tagged, double_sha256, sha256};
pub use ots::{
    BundleHash, DigestSource, Ed25519Ots, FragmentSigner, OneTimeSignature, OtsError,
    SignatureFragment,
};
