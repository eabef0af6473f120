use crate::config::Config;

/// File name every generated header includes the support code from
pub const FILE_NAME: &str = "Bitfield.hpp";

/// Generates the `AccessType` and `Bitfield` support header, wrapped in the
/// configured namespace
pub fn render(config: &Config) -> String {
    let ns = &config.namespace;
    format!(
        "// Bit-field support for headers generated using svd2cpp v{}\n\n\
         #pragma once\n\n\
         #include <cstdint>\n\n\
         namespace {ns} {{\n\n\
         {}\n\
         }} // namespace {ns}\n",
        env!("CARGO_PKG_VERSION"),
        include_str!("bitfield.hpp"),
    )
}
