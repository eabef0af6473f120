use std::fmt::Write;

use log::debug;

use crate::config::Config;
use crate::errors::{ResolutionError, Result};
use crate::generate::{enums::EnumRegistry, generic, peripheral};
use crate::svd::Device;

/// Whole header generation for one requested peripheral
///
/// The header holds, in order: the enumeration types of the controller's
/// fields, the controller template and one binding per instance sharing the
/// register block.
pub fn render(d: &Device, requested: &str, config: &Config) -> Result<String> {
    let p = d.lookup(requested, config.ident_case)?;
    let block = p
        .block()
        .ok_or_else(|| ResolutionError::UnknownPeripheral(requested.to_string()))?;
    debug!(
        "Rendering peripheral {} of {} ({} instances)",
        p.declared_name,
        d.name,
        block.instances.len()
    );

    let mut enums = EnumRegistry::new(config.enum_threshold);
    let mut controller = String::new();
    peripheral::render(p, block, &mut enums, &mut controller)?;
    let mut instances = String::new();
    peripheral::render_instances(p, block, config, &mut instances)?;

    let ns = format!("{}::{}", config.namespace, d.name.to_lowercase());
    let mut out = String::new();
    writeln!(
        out,
        "// {} peripheral of {} (generated using svd2cpp v{})",
        p.declared_name,
        d.name,
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "#pragma once")?;
    writeln!(out)?;
    writeln!(out, "#include <cstdint>")?;
    writeln!(out, "#include \"{}\"", generic::FILE_NAME)?;
    writeln!(out)?;
    writeln!(out, "namespace {ns} {{")?;
    writeln!(out)?;
    if !enums.is_empty() {
        debug!("Pushing {} enumerations into output", enums.len());
        enums.render(&mut out, "\t")?;
        writeln!(out)?;
    }
    out.push_str(&controller);
    writeln!(out)?;
    out.push_str(&instances);
    writeln!(out)?;
    writeln!(out, "}} // namespace {ns}")?;
    Ok(out)
}
