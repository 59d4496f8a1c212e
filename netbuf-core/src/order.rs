/// Byte order a [`crate::buffer::Buffer`]'s multi-byte accessors decode and
/// encode in. Every buffer carries exactly one, consulted by every
/// multi-byte read/write — there is no per-call override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// The order a freshly constructed buffer starts in: the target's native order.
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::LittleEndian;
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::BigEndian;
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::NATIVE
    }
}
