use std::fmt::Write;

use log::trace;

use crate::errors::Result;
use crate::generate::enums::EnumRegistry;
use crate::svd::{Field, Register};

/// Renders the register as a struct nested in its controller template
///
/// ```text
/// struct Cr {
///     using WidthType = std::uint32_t;
///     static constexpr std::uint32_t Address = BaseAddress + 0x8;
///     using En = Bitfield<Cr, bool, 0, 1, AccessType::ReadWrite>;
/// };
/// ```
pub fn render(register: &Register, enums: &mut EnumRegistry, out: &mut String) -> Result<()> {
    let name = &register.name;
    writeln!(out, "\t\tstruct {name} {{")?;
    writeln!(out, "\t\t\tusing WidthType = {};", register.width().cpp_type())?;
    writeln!(
        out,
        "\t\t\tstatic constexpr std::uint32_t Address = BaseAddress + {};",
        register.address_offset
    )?;
    for field in register.fields.values() {
        trace!("Field: {}.{}", name, field.name);
        writeln!(
            out,
            "\t\t\tusing {} = Bitfield<{}>;",
            field.name,
            bitfield_params(register, field, enums).join(", ")
        )?;
    }
    writeln!(out, "\t\t}};")?;
    Ok(())
}

/// `Bitfield` template arguments: register type, storage or enumeration
/// type, bit offset, bit width, access mode
pub fn bitfield_params(register: &Register, field: &Field, enums: &mut EnumRegistry) -> [String; 5] {
    let data_type = enums
        .synthesize(field)
        .unwrap_or_else(|| field.width().cpp_type().to_string());
    [
        register.name.clone(),
        data_type,
        field.bit_offset.to_string(),
        field.bit_width.to_string(),
        field.access.cpp_type().to_string(),
    ]
}
