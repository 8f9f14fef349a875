//! Width-tagged little-endian immediates.
//!
//! Every value that ends up in a code buffer or crosses the process boundary
//! goes through [`Immediate`], which fixes its width and byte order instead of
//! reinterpreting the host's in-memory layout.

/// A fixed-width value encoded in little-endian byte order
pub trait Immediate: Copy {
    /// Encoded width in bytes (1, 4 or 8)
    const WIDTH: usize;

    /// Append the little-endian encoding to `out`
    fn encode_le(self, out: &mut Vec<u8>);

    /// Decode from the first `WIDTH` bytes of `bytes`
    ///
    /// Returns `None` if fewer than `WIDTH` bytes are available.
    fn decode_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_immediate {
    ($($ty:ty => $width:literal),* $(,)?) => {
        $(
            impl Immediate for $ty {
                const WIDTH: usize = $width;

                fn encode_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn decode_le(bytes: &[u8]) -> Option<Self> {
                    let raw: [u8; $width] = bytes.get(..$width)?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_immediate! {
    u8 => 1,
    i8 => 1,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
}

/// Encode a value into a freshly allocated byte vector
pub fn to_le_vec<T: Immediate>(value: T) -> Vec<u8> {
    let mut out = Vec::with_capacity(T::WIDTH);
    value.encode_le(&mut out);
    out
}
