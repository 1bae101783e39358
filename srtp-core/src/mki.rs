//! Master Key Identifier generation. The core never invents MKI bytes on its
//! own initiative — it asks an injected [`MkiSource`] (spec.md §6 "Random
//! source: ... used solely to generate an MKI when one is configured"), the
//! same collaborator-boundary shape the core uses for the DTLS and cipher
//! providers.

/// Default cap on generated MKI length. The registry permits MKIs up to 255
/// bytes (and this crate accepts any length a peer sends), but several
/// profiles' interop matrices are ambiguous above 16 bytes, so a locally
/// generated MKI never exceeds it (spec.md §9 Open Question).
pub const MAX_GENERATED_MKI_LEN: usize = 16;

/// Implemented by whatever supplies random bytes for a locally generated
/// MKI. `len` is always `<= MAX_GENERATED_MKI_LEN` when called from
/// [`RandMkiSource`], but the trait itself places no ceiling on the caller.
pub trait MkiSource: Send + Sync {
    fn generate(&self, len: usize) -> Vec<u8>;
}

/// `rand`-backed default, gated behind the `rand-mki` feature so a caller
/// supplying its own [`MkiSource`] never pulls in a concrete RNG.
#[cfg(feature = "rand-mki")]
pub struct RandMkiSource;

#[cfg(feature = "rand-mki")]
impl MkiSource for RandMkiSource {
    fn generate(&self, len: usize) -> Vec<u8> {
        use rand::RngCore;
        let mut buf = vec![0u8; len.min(MAX_GENERATED_MKI_LEN)];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }
}

#[cfg(all(test, feature = "rand-mki"))]
mod test {
    use super::*;

    #[test]
    fn generated_mki_never_exceeds_the_default_cap() {
        let source = RandMkiSource;
        let mki = source.generate(255);
        assert_eq!(mki.len(), MAX_GENERATED_MKI_LEN);
    }
}
