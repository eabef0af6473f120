//! Storage width buckets and access modes

/// Smallest C++ type able to hold a bit-field or register value
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StorageWidth {
    Bit,
    U8,
    U16,
    U32,
}

impl StorageWidth {
    /// A single bit is always `bool`, never the 8-bit bucket. Widths beyond
    /// 32 bits are clamped to the widest bucket.
    pub fn for_field(bits: u32) -> Self {
        match bits {
            0..=1 => StorageWidth::Bit,
            2..=8 => StorageWidth::U8,
            9..=16 => StorageWidth::U16,
            _ => StorageWidth::U32,
        }
    }

    /// Registers are at least a byte wide
    pub fn for_register(bits: u32) -> Self {
        Self::for_field(bits).max(StorageWidth::U8)
    }

    pub fn bits(self) -> u32 {
        match self {
            StorageWidth::Bit => 1,
            StorageWidth::U8 => 8,
            StorageWidth::U16 => 16,
            StorageWidth::U32 => 32,
        }
    }

    pub fn cpp_type(self) -> &'static str {
        match self {
            StorageWidth::Bit => "bool",
            StorageWidth::U8 => "std::uint8_t",
            StorageWidth::U16 => "std::uint16_t",
            StorageWidth::U32 => "std::uint32_t",
        }
    }
}

pub trait U32Ext {
    fn to_storage_width(&self) -> StorageWidth;
}

impl U32Ext for u32 {
    fn to_storage_width(&self) -> StorageWidth {
        StorageWidth::for_field(*self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Access {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadWrite,
}

impl Access {
    /// Exact, case-sensitive match on the SVD tokens. Anything else,
    /// `writeOnce` and `read-writeOnce` included, is read-write.
    pub fn from_token(token: &str) -> Self {
        match token {
            "read-only" => Access::ReadOnly,
            "write-only" => Access::WriteOnly,
            "read-write" => Access::ReadWrite,
            _ => Access::ReadWrite,
        }
    }

    /// Resolves an optional token, falling back to `inherited` when absent
    pub fn resolve(token: Option<&str>, inherited: Access) -> Self {
        token.map(Self::from_token).unwrap_or(inherited)
    }

    pub fn cpp_type(self) -> &'static str {
        match self {
            Access::ReadOnly => "AccessType::ReadOnly",
            Access::WriteOnly => "AccessType::WriteOnly",
            Access::ReadWrite => "AccessType::ReadWrite",
        }
    }
}
