use crate::error::HashError;
use crate::object::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is fed to BLAKE3 ahead of the content, so a struct and a
/// type descriptor that happen to share an encoding still get different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Non-struct values: primitives, blobs, collections and refs.
    pub const VALUE: Self = Self::new("keel-value-v1");
    /// Struct values.
    pub const STRUCT: Self = Self::new("keel-struct-v1");
    /// Type descriptors.
    pub const TYPE: Self = Self::new("keel-type-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes under this domain.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = self.start();
        hasher.update(data);
        ObjectId::from_digest(*hasher.finalize().as_bytes())
    }

    /// Hash a sequence of byte slices as if they were concatenated.
    pub fn hash_parts<I, B>(&self, parts: I) -> ObjectId
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut hasher = self.start();
        for part in parts {
            hasher.update(part.as_ref());
        }
        ObjectId::from_digest(*hasher.finalize().as_bytes())
    }

    /// Hash the bincode encoding of a serializable value.
    pub fn hash_bincode<T: serde::Serialize>(&self, value: &T) -> Result<ObjectId, HashError> {
        let data = bincode::serialize(value).map_err(|e| HashError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}
