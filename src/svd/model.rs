//! Normalized, inheritance-resolved hardware model

use indexmap::IndexMap;

use crate::config::IdentCase;
use crate::errors::ResolutionError;
use crate::svd::access::{Access, StorageWidth};
use crate::util::{parse_u64, strip_trailing_digits, ToSanitizedCase};

/// Name given to a register's primary value field
pub const VALUE_FIELD: &str = "Value";
/// Members every generated register struct declares besides its fields
pub const REGISTER_MEMBERS: [&str; 2] = ["WidthType", "Address"];

/// Appends `suffix` to a name that would clash with a register struct member
pub fn unreserved(name: String, suffix: &str) -> String {
    if REGISTER_MEMBERS.contains(&name.as_str()) {
        name + suffix
    } else {
        name
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    pub name: String,
    pub description: Option<String>,
    /// Keyed by normalized peripheral name, in document order
    pub peripherals: IndexMap<String, Peripheral>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Peripheral {
    pub name: String,
    /// Name as written in the document
    pub declared_name: String,
    pub description: Option<String>,
    pub base_address: String,
    pub interrupt: Option<String>,
    /// Default access of the peripheral's registers
    pub access: Access,
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Layout {
    Block(RegisterBlock),
    /// Normalized name of the peripheral owning the register block
    Derived(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegisterBlock {
    pub registers: IndexMap<String, Register>,
    /// Keyed by declared name: the owner first, then every peripheral
    /// deriving from it
    pub instances: IndexMap<String, Instance>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Register {
    pub name: String,
    /// Offset from the peripheral's base address, as literal text
    pub address_offset: String,
    /// Width in bits
    pub size: u32,
    pub access: Access,
    pub fields: IndexMap<String, Field>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub name: String,
    pub bit_offset: u32,
    pub bit_width: u32,
    pub access: Access,
    pub enumerants: Vec<Enumerant>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Enumerant {
    pub name: String,
    /// Literal text copied from the document
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Instance {
    pub name: String,
    pub base_address: String,
    pub interrupt: Option<String>,
}

impl Device {
    /// Finds the peripheral owning the register block of `requested`
    ///
    /// `requested` is normalized with `case` first. A derived peripheral
    /// resolves to the peripheral it derives from.
    pub fn lookup(&self, requested: &str, case: IdentCase) -> Result<&Peripheral, ResolutionError> {
        let key = requested.to_identifier(case);
        let peripheral = self
            .peripherals
            .get(&key)
            .ok_or_else(|| ResolutionError::UnknownPeripheral(requested.to_string()))?;
        match &peripheral.layout {
            Layout::Block(_) => Ok(peripheral),
            Layout::Derived(owner) => self
                .peripherals
                .get(owner)
                .ok_or_else(|| ResolutionError::UnknownParent {
                    peripheral: peripheral.declared_name.clone(),
                    parent: owner.clone(),
                }),
        }
    }

    /// Declared name and description of every peripheral, in document order
    pub fn summaries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.peripherals
            .values()
            .map(|p| (p.declared_name.as_str(), p.description.as_deref()))
    }
}

impl Peripheral {
    pub fn block(&self) -> Option<&RegisterBlock> {
        match &self.layout {
            Layout::Block(block) => Some(block),
            Layout::Derived(_) => None,
        }
    }

    /// Name of the controller template, shared by numbered peripherals:
    /// `Uart0` gives `UartController`
    pub fn controller_name(&self) -> String {
        format!("{}Controller", strip_trailing_digits(&self.name))
    }
}

impl Register {
    pub fn width(&self) -> StorageWidth {
        StorageWidth::for_register(self.size)
    }

    /// Absolute address of the register for a peripheral at `base`
    pub fn address(&self, base: &str) -> Option<u64> {
        parse_u64(base)?.checked_add(parse_u64(&self.address_offset)?)
    }
}

impl Field {
    pub fn width(&self) -> StorageWidth {
        StorageWidth::for_field(self.bit_width)
    }

    pub fn bit_range(&self) -> std::ops::Range<u32> {
        self.bit_offset..self.bit_offset.saturating_add(self.bit_width)
    }
}

impl Instance {
    pub fn register_address(&self, register: &Register) -> Option<u64> {
        register.address(&self.base_address)
    }
}
