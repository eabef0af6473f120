//! Run-scoped synthesis of `enum class` types from enumerated field values

use std::fmt::Write;

use indexmap::IndexMap;
use log::{trace, warn};

use crate::errors::Result;
use crate::svd::model::REGISTER_MEMBERS;
use crate::svd::{Enumerant, Field, StorageWidth};

/// Suffix appended to a field name to name its enumeration type
pub const ENUM_SUFFIX: &str = "Type";
/// Used instead of [`ENUM_SUFFIX`] when the type name would be shadowed by a
/// register struct member
pub const ENUM_FALLBACK_SUFFIX: &str = "Enum";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub repr: StorageWidth,
    pub variants: Vec<Enumerant>,
}

/// Enumeration types synthesized during one generation run, indexed by
/// generated name in first-encountered order
#[derive(Debug)]
pub struct EnumRegistry {
    threshold: usize,
    types: IndexMap<String, EnumType>,
}

impl EnumRegistry {
    /// Types are synthesized for fields with more than `threshold` enumerants
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            types: IndexMap::new(),
        }
    }

    /// Returns the name of the enumeration type backing `field`, registering
    /// it on first sight
    ///
    /// Fields sharing a name share one definition: the first one registered
    /// wins.
    pub fn synthesize(&mut self, field: &Field) -> Option<String> {
        if field.enumerants.len() <= self.threshold {
            return None;
        }
        let mut name = format!("{}{}", field.name, ENUM_SUFFIX);
        if REGISTER_MEMBERS.contains(&name.as_str()) {
            name = format!("{}{}", field.name, ENUM_FALLBACK_SUFFIX);
        }

        if let Some(existing) = self.types.get(&name) {
            if existing.variants != field.enumerants {
                warn!(
                    "Field {} reuses enumeration {} with different values",
                    field.name, name
                );
            }
            return Some(name);
        }

        trace!("Enumeration: {} ({} variants)", name, field.enumerants.len());
        self.types.insert(
            name.clone(),
            EnumType {
                name: name.clone(),
                // `bool` is not a valid underlying type
                repr: field.width().max(StorageWidth::U8),
                variants: field.enumerants.clone(),
            },
        );
        Some(name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumType> {
        self.types.values()
    }

    /// Renders every registered type, in registration order
    pub fn render(&self, out: &mut String, indent: &str) -> Result<()> {
        for ty in self.iter() {
            writeln!(out, "{indent}enum class {} : {} {{", ty.name, ty.repr.cpp_type())?;
            for variant in &ty.variants {
                writeln!(out, "{indent}\t{} = {},", variant.name, variant.value)?;
            }
            writeln!(out, "{indent}}};")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::Access;

    fn field(name: &str, width: u32, enumerants: &[(&str, &str)]) -> Field {
        Field {
            name: name.into(),
            bit_offset: 0,
            bit_width: width,
            access: Access::ReadWrite,
            enumerants: enumerants
                .iter()
                .map(|&(name, value)| Enumerant {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    #[test]
    fn three_enumerants() {
        let mut registry = EnumRegistry::new(1);
        let mode = field("Mode", 2, &[("Idle", "0"), ("Run", "1"), ("Stop", "2")]);
        assert_eq!(registry.synthesize(&mode).as_deref(), Some("ModeType"));

        let ty = registry.iter().next().unwrap();
        assert_eq!(ty.repr, StorageWidth::U8);
        let variants: Vec<_> = ty
            .variants
            .iter()
            .map(|v| (v.name.as_str(), v.value.as_str()))
            .collect();
        assert_eq!(variants, [("Idle", "0"), ("Run", "1"), ("Stop", "2")]);
    }

    #[test]
    fn threshold() {
        let single = field("En", 1, &[("Enabled", "1")]);
        let pair = field("Pol", 1, &[("Low", "0"), ("High", "1")]);

        let mut registry = EnumRegistry::new(1);
        assert_eq!(registry.synthesize(&single), None);
        assert_eq!(registry.synthesize(&pair).as_deref(), Some("PolType"));

        let mut registry = EnumRegistry::new(2);
        assert_eq!(registry.synthesize(&pair), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn same_name_registers_once() {
        let mut registry = EnumRegistry::new(1);
        let a = field("Mode", 2, &[("Idle", "0"), ("Run", "1")]);
        let b = field("Mode", 2, &[("Off", "0"), ("On", "1")]);
        assert_eq!(registry.synthesize(&a).as_deref(), Some("ModeType"));
        assert_eq!(registry.synthesize(&b).as_deref(), Some("ModeType"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().next().unwrap().variants[0].name, "Idle");
    }

    #[test]
    fn shadowed_type_name() {
        let mut registry = EnumRegistry::new(1);
        let width = field("Width", 2, &[("Byte", "0"), ("Half", "1"), ("Word", "2")]);
        assert_eq!(registry.synthesize(&width).as_deref(), Some("WidthEnum"));
    }

    #[test]
    fn render_uses_field_width() {
        let mut registry = EnumRegistry::new(1);
        registry.synthesize(&field("Div", 12, &[("Div1", "0x0"), ("Div2", "0x1")]));
        let mut out = String::new();
        registry.render(&mut out, "\t").unwrap();
        assert_eq!(
            out,
            "\tenum class DivType : std::uint16_t {\n\t\tDiv1 = 0x0,\n\t\tDiv2 = 0x1,\n\t};\n"
        );
    }
}
