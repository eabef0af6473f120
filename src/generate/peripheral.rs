use std::fmt::Write;

use log::{debug, trace};

use crate::config::{Config, IdentCase};
use crate::errors::Result;
use crate::generate::{enums::EnumRegistry, register};
use crate::svd::{Peripheral, RegisterBlock};
use crate::util::ToSanitizedCase;

/// Renders the controller template of `peripheral`
///
/// Enumeration types referenced by the register fields are collected in
/// `enums`, which is why the controller is rendered before the enumeration
/// section that precedes it in the header.
pub fn render(
    peripheral: &Peripheral,
    block: &RegisterBlock,
    enums: &mut EnumRegistry,
    out: &mut String,
) -> Result<()> {
    let controller = peripheral.controller_name();
    debug!(
        "Rendering {} with {} registers",
        controller,
        block.registers.len()
    );

    writeln!(
        out,
        "\ttemplate <std::uint32_t BaseAddress, std::uint16_t Irq>"
    )?;
    writeln!(out, "\tstruct {controller} {{")?;
    for (i, reg) in block.registers.values().enumerate() {
        trace!("Register: {}", reg.name);
        if i > 0 {
            out.push('\n');
        }
        register::render(reg, enums, out)?;
    }
    writeln!(out, "\t}};")?;
    Ok(())
}

/// Binds every instance sharing the register block to the controller
/// template, one alias per instance
///
/// ```text
/// using UART0 = UartController<0x40000000, 12>;
/// ```
pub fn render_instances(
    peripheral: &Peripheral,
    block: &RegisterBlock,
    config: &Config,
    out: &mut String,
) -> Result<()> {
    let controller = peripheral.controller_name();
    for instance in block.instances.values() {
        let irq = instance
            .interrupt
            .as_deref()
            .unwrap_or(&config.default_irq);
        writeln!(
            out,
            "\tusing {} = {controller}<{}, {irq}>;",
            instance.name.to_identifier(IdentCase::Verbatim),
            instance.base_address
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::{Access, Field, Instance, Layout, Register};
    use indexmap::IndexMap;

    fn uart() -> (Peripheral, RegisterBlock) {
        let en = Field {
            name: "En".into(),
            bit_offset: 0,
            bit_width: 1,
            access: Access::ReadWrite,
            enumerants: Vec::new(),
        };
        let registers = ["Cr", "Sr"]
            .iter()
            .zip(["0x00", "0x04"])
            .map(|(name, offset)| {
                let register = Register {
                    name: name.to_string(),
                    address_offset: offset.into(),
                    size: 32,
                    access: Access::ReadWrite,
                    fields: IndexMap::from([(en.name.clone(), en.clone())]),
                };
                (register.name.clone(), register)
            })
            .collect();
        let instances = [
            ("UART0", "0x40000000", Some("12")),
            ("UART1", "0x40001000", None),
        ]
        .into_iter()
        .map(|(name, base, irq)| {
            let instance = Instance {
                name: name.into(),
                base_address: base.into(),
                interrupt: irq.map(String::from),
            };
            (instance.name.clone(), instance)
        })
        .collect();
        let block = RegisterBlock {
            registers,
            instances,
        };
        let peripheral = Peripheral {
            name: "Uart0".into(),
            declared_name: "UART0".into(),
            description: None,
            base_address: "0x40000000".into(),
            interrupt: Some("12".into()),
            access: Access::ReadWrite,
            layout: Layout::Block(block.clone()),
        };
        (peripheral, block)
    }

    #[test]
    fn controller_template() {
        let (peripheral, block) = uart();
        let mut enums = EnumRegistry::new(1);
        let mut out = String::new();
        render(&peripheral, &block, &mut enums, &mut out).unwrap();

        assert!(out.starts_with(
            "\ttemplate <std::uint32_t BaseAddress, std::uint16_t Irq>\n\tstruct UartController {\n"
        ));
        assert!(out.contains("\t\t};\n\n\t\tstruct Sr {\n"));
        assert!(out.ends_with("\t\t};\n\t};\n"));
    }

    #[test]
    fn instance_bindings() {
        let (peripheral, block) = uart();
        let mut out = String::new();
        render_instances(&peripheral, &block, &Config::default(), &mut out).unwrap();
        assert_eq!(
            out,
            "\tusing UART0 = UartController<0x40000000, 12>;\n\
             \tusing UART1 = UartController<0x40001000, 0xFF>;\n"
        );
    }

    #[test]
    fn configured_default_irq() {
        let (peripheral, block) = uart();
        let config = Config {
            default_irq: "0".into(),
            ..Config::default()
        };
        let mut out = String::new();
        render_instances(&peripheral, &block, &config, &mut out).unwrap();
        assert!(out.ends_with("UartController<0x40001000, 0>;\n"));
    }
}
