//! Builds the hardware model from a decoded SVD tree

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use regex::Regex;

use crate::config::Config;
use crate::errors::{DocumentError, ResolutionError, Result, ShapeWarning, ShapeWarningKind};
use crate::svd::access::Access;
use crate::svd::model::{
    unreserved, Device, Enumerant, Field, Instance, Layout, Peripheral, Register, RegisterBlock,
    VALUE_FIELD,
};
use crate::svd::tree::{Group, Node};
use crate::util::{hex, parse_u64, relocate_digits, strip_trailing_digits, ToSanitizedCase};

/// Register width used when neither the register, its peripheral nor the
/// device declare a `size`
pub const DEFAULT_REGISTER_SIZE: u32 = 32;
/// Largest register array expanded
pub const MAX_DIM: u64 = 1 << 16;

fn bit_range_re() -> &'static Regex {
    static BIT_RANGE: OnceLock<Regex> = OnceLock::new();
    BIT_RANGE.get_or_init(|| Regex::new(r"^\[\s*(\d+)\s*:\s*(\d+)\s*\]$").unwrap())
}

fn dim_range_re() -> &'static Regex {
    static DIM_RANGE: OnceLock<Regex> = OnceLock::new();
    DIM_RANGE.get_or_init(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap())
}

/// Register properties inherited top-down: device, peripheral, register
#[derive(Clone, Copy, Debug)]
struct Defaults {
    size: u32,
    access: Access,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_REGISTER_SIZE,
            access: Access::ReadWrite,
        }
    }
}

impl Defaults {
    fn derive(self, node: &Group) -> Self {
        Self {
            size: node
                .text("size")
                .and_then(parse_u64)
                .and_then(|size| u32::try_from(size).ok())
                .unwrap_or(self.size),
            access: Access::resolve(node.text("access"), self.access),
        }
    }
}

pub struct ModelBuilder<'a> {
    config: &'a Config,
    diagnostics: Vec<ShapeWarning>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Builds the device rooted at `root`, returning it with the shape
    /// warnings collected on the way
    pub fn build(mut self, root: &Group) -> Result<(Device, Vec<ShapeWarning>)> {
        let case = self.config.ident_case;
        let name = root.name().ok_or_else(|| DocumentError::MissingElement {
            parent: root.tag.clone(),
            tag: "name",
        })?;
        let peripherals_node = root
            .group("peripherals")
            .ok_or_else(|| DocumentError::MissingElement {
                parent: name.to_string(),
                tag: "peripherals",
            })?;
        let defaults = Defaults::default().derive(root);

        // First pass: every peripheral, standalone or derived, in document
        // order. Derivations are bound once all names are known.
        let mut peripherals = IndexMap::new();
        let mut derived = Vec::new();
        for (key, node) in peripherals_node.tagged("peripheral") {
            if let Some(peripheral) = self.peripheral(key, node, &defaults) {
                debug!("Peripheral: {}", peripheral.declared_name);
                if let (Layout::Derived(_), Some(parent)) =
                    (&peripheral.layout, node.attribute("derivedFrom"))
                {
                    derived.push((peripheral.name.clone(), parent.to_string()));
                }
                peripherals.insert(peripheral.name.clone(), peripheral);
            }
        }

        resolve_derivations(&mut peripherals, &derived)?;

        let device = Device {
            name: name.to_identifier(case),
            description: root.text("description").map(String::from),
            peripherals,
        };
        Ok((device, self.diagnostics))
    }

    fn warn(&mut self, path: &str, kind: ShapeWarningKind) {
        let warning = ShapeWarning::new(path, kind);
        warn!("{}", warning);
        self.diagnostics.push(warning);
    }

    /// Text of the numeric element `key`, checked to be an integer literal
    fn literal(&mut self, node: &Group, key: &str, path: &str) -> Option<(String, u64)> {
        let Some(text) = node.text(key) else {
            self.warn(path, ShapeWarningKind::MissingAddress);
            return None;
        };
        let value = self.number(text, path)?;
        Some((text.to_string(), value))
    }

    fn number(&mut self, text: &str, path: &str) -> Option<u64> {
        let value = parse_u64(text);
        if value.is_none() {
            self.warn(path, ShapeWarningKind::InvalidNumber(text.to_string()));
        }
        value
    }

    fn bits(&mut self, text: &str, path: &str) -> Option<u32> {
        let value = parse_u64(text).and_then(|v| u32::try_from(v).ok());
        if value.is_none() {
            self.warn(path, ShapeWarningKind::InvalidNumber(text.to_string()));
        }
        value
    }

    fn peripheral(&mut self, key: &str, node: &Group, defaults: &Defaults) -> Option<Peripheral> {
        let case = self.config.ident_case;
        let declared = node.name().unwrap_or_else(|| strip_trailing_digits(key));
        let (base_address, _) = self.literal(node, "baseAddress", declared)?;
        let interrupt = node
            .tagged("interrupt")
            .find_map(|(_, irq)| irq.text("value"))
            .map(String::from);
        let defaults = defaults.derive(node);

        let layout = match node.attribute("derivedFrom") {
            Some(parent) => {
                if node.group("registers").is_some() {
                    self.warn(declared, ShapeWarningKind::IgnoredRegisters);
                }
                Layout::Derived(parent.to_identifier(case))
            }
            None => {
                let registers = self.registers(node.group("registers"), &defaults, declared);
                let mut instances = IndexMap::new();
                instances.insert(
                    declared.to_string(),
                    Instance {
                        name: declared.to_string(),
                        base_address: base_address.clone(),
                        interrupt: interrupt.clone(),
                    },
                );
                Layout::Block(RegisterBlock {
                    registers,
                    instances,
                })
            }
        };

        Some(Peripheral {
            name: declared.to_identifier(case),
            declared_name: declared.to_string(),
            description: node.text("description").map(String::from),
            base_address,
            interrupt,
            access: defaults.access,
            layout,
        })
    }

    fn registers(
        &mut self,
        node: Option<&Group>,
        defaults: &Defaults,
        path: &str,
    ) -> IndexMap<String, Register> {
        let mut registers = IndexMap::new();
        let Some(node) = node else {
            return registers;
        };
        for (key, child) in &node.children {
            let Node::Group(group) = child else {
                continue;
            };
            match group.tag.as_str() {
                "register" => {
                    for register in self.register(key, group, defaults, path) {
                        trace!("Register: {}", register.name);
                        registers.insert(register.name.clone(), register);
                    }
                }
                "cluster" => {
                    let path = format!("{path}.{key}");
                    self.warn(&path, ShapeWarningKind::UnsupportedCluster);
                }
                _ => {}
            }
        }
        registers
    }

    /// Builds a register, or every element of a register array
    fn register(&mut self, key: &str, node: &Group, defaults: &Defaults, path: &str) -> Vec<Register> {
        let case = self.config.ident_case;
        let declared = node.name().unwrap_or(key);
        let path = format!("{path}.{declared}");
        let Some((offset_text, offset)) = self.literal(node, "addressOffset", &path) else {
            return Vec::new();
        };
        let defaults = defaults.derive(node);

        let elements = match node.text("dim") {
            None => vec![(declared.to_string(), offset_text)],
            Some(dim) => self.expand(node, declared, dim, offset, &defaults, &path),
        };

        elements
            .into_iter()
            .map(|(name, address_offset)| {
                let name = unreserved(name.to_identifier(case), "Reg");
                let fields = self.fields(node.group("fields"), &name, &defaults, &path);
                Register {
                    name,
                    address_offset,
                    size: defaults.size,
                    access: defaults.access,
                    fields,
                }
            })
            .collect()
    }

    /// Expands a `dim` register array into `(name, offset)` pairs
    fn expand(
        &mut self,
        node: &Group,
        declared: &str,
        dim: &str,
        offset: u64,
        defaults: &Defaults,
        path: &str,
    ) -> Vec<(String, String)> {
        let Some(dim) = self.number(dim, path) else {
            return Vec::new();
        };
        let increment = match node.text("dimIncrement") {
            Some(text) => match self.number(text, path) {
                Some(increment) => increment,
                None => return Vec::new(),
            },
            None => u64::from(defaults.size / 8),
        };
        // the last element must stay addressable, which bounds every offset
        let last = dim
            .saturating_sub(1)
            .checked_mul(increment)
            .and_then(|span| span.checked_add(offset));
        if dim > MAX_DIM || last.is_none() {
            self.warn(
                path,
                ShapeWarningKind::InvalidNumber(format!("dim {dim} x {increment}")),
            );
            return Vec::new();
        }
        let count = dim as usize;
        let indices: Vec<String> = match node.text("dimIndex") {
            Some(list) => dim_indices(list, count),
            None => (0..dim).map(|i| i.to_string()).collect(),
        };

        indices
            .iter()
            .zip(0u64..)
            .map(|(idx, i)| {
                let name = declared.replace("[%s]", idx).replace("%s", idx);
                (name, hex(offset + i * increment))
            })
            .collect()
    }

    fn fields(
        &mut self,
        node: Option<&Group>,
        register: &str,
        defaults: &Defaults,
        path: &str,
    ) -> IndexMap<String, Field> {
        let mut fields = IndexMap::new();
        let mut declared_any = false;
        if let Some(node) = node {
            for (key, group) in node.tagged("field") {
                declared_any = true;
                if let Some(field) = self.field(key, group, register, defaults.access, path) {
                    trace!("Field: {} [{}:{}]", field.name, field.bit_offset, field.bit_width);
                    fields.insert(field.name.clone(), field);
                }
            }
        }

        if !declared_any {
            fields.insert(
                VALUE_FIELD.to_string(),
                Field {
                    name: VALUE_FIELD.to_string(),
                    bit_offset: 0,
                    bit_width: defaults.size,
                    access: defaults.access,
                    enumerants: Vec::new(),
                },
            );
        }

        if self.config.check_overlaps {
            self.check_overlaps(&fields, path);
        }
        fields
    }

    fn field(
        &mut self,
        key: &str,
        node: &Group,
        register: &str,
        inherited: Access,
        path: &str,
    ) -> Option<Field> {
        let declared = node.name().unwrap_or(key);
        let path = format!("{path}.{declared}");
        let mut name = declared.to_identifier(self.config.ident_case);
        if name == register {
            name = VALUE_FIELD.to_string();
        } else {
            name = unreserved(name, "Field");
        }
        let (bit_offset, bit_width) = self.bit_range(node, &path)?;

        Some(Field {
            name,
            bit_offset,
            bit_width,
            access: Access::resolve(node.text("access"), inherited),
            enumerants: self.enumerants(node, &path),
        })
    }

    /// `(offset, width)` from `bitOffset`/`bitWidth`, `lsb`/`msb` or
    /// `bitRange`, in that order of preference
    fn bit_range(&mut self, node: &Group, path: &str) -> Option<(u32, u32)> {
        if let (Some(offset), Some(width)) = (node.text("bitOffset"), node.text("bitWidth")) {
            let (offset, width) = (self.bits(offset, path)?, self.bits(width, path)?);
            if offset.checked_add(width).is_none() {
                self.warn(
                    path,
                    ShapeWarningKind::InvalidNumber(format!("{offset}+{width}")),
                );
                return None;
            }
            return Some((offset, width));
        }

        let (msb, lsb) = if let (Some(lsb), Some(msb)) = (node.text("lsb"), node.text("msb")) {
            (self.bits(msb, path)?, self.bits(lsb, path)?)
        } else if let Some(range) = node.text("bitRange") {
            let Some(caps) = bit_range_re().captures(range) else {
                self.warn(path, ShapeWarningKind::InvalidNumber(range.to_string()));
                return None;
            };
            (self.bits(&caps[1], path)?, self.bits(&caps[2], path)?)
        } else {
            self.warn(path, ShapeWarningKind::MissingBitRange);
            return None;
        };

        if msb < lsb {
            self.warn(path, ShapeWarningKind::InvertedBitRange);
            return None;
        }
        match msb.checked_add(1) {
            Some(end) => Some((lsb, end - lsb)),
            None => {
                self.warn(path, ShapeWarningKind::InvalidNumber(format!("[{msb}:{lsb}]")));
                None
            }
        }
    }

    fn enumerants(&mut self, node: &Group, path: &str) -> Vec<Enumerant> {
        let mut enumerants: Vec<Enumerant> = Vec::new();
        for (_, values) in node.tagged("enumeratedValues") {
            for (key, child) in &values.children {
                let entry = match child {
                    Node::Group(group) if group.tag == "enumeratedValue" => group,
                    Node::Leaf(_) if key == "enumeratedValue" => {
                        self.warn(path, ShapeWarningKind::MalformedEnumerant);
                        continue;
                    }
                    _ => continue,
                };
                let Some(enumerant) = self.enumerant(entry) else {
                    let path = format!("{path}.{key}");
                    self.warn(&path, ShapeWarningKind::MalformedEnumerant);
                    continue;
                };
                if enumerants.iter().all(|e| e.name != enumerant.name) {
                    enumerants.push(enumerant);
                }
            }
        }
        enumerants
    }

    fn enumerant(&self, node: &Group) -> Option<Enumerant> {
        let name = relocate_digits(&node.name()?.to_sanitized_case(self.config.ident_case));
        let value = node.text("value")?;
        let name = match name.chars().next()? {
            c if c.is_ascii_digit() => format!("_{name}"),
            _ => name,
        };
        Some(Enumerant {
            name,
            value: value.to_string(),
        })
    }

    fn check_overlaps(&mut self, fields: &IndexMap<String, Field>, path: &str) {
        let fields: Vec<&Field> = fields.values().collect();
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                let (ra, rb) = (a.bit_range(), b.bit_range());
                if ra.start < rb.end && rb.start < ra.end {
                    let path = format!("{path}.{}", a.name);
                    self.warn(&path, ShapeWarningKind::Overlap(b.name.clone()));
                }
            }
        }
    }
}

/// `dimIndex` is either a comma separated list or an inclusive `a-b` range
fn dim_indices(list: &str, limit: usize) -> Vec<String> {
    if let Some(caps) = dim_range_re().captures(list) {
        if let (Ok(start), Ok(end)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
            return (start..=end).take(limit).map(|i| i.to_string()).collect();
        }
    }
    list.split(',')
        .take(limit)
        .map(|s| s.trim().to_string())
        .collect()
}

/// Binds every derived peripheral, in document order, as an instance of the
/// peripheral owning its register block
fn resolve_derivations(
    peripherals: &mut IndexMap<String, Peripheral>,
    derived: &[(String, String)],
) -> Result<(), ResolutionError> {
    for (name, declared_parent) in derived {
        // a later duplicate may have replaced the derived definition
        if peripherals.get(name).and_then(Peripheral::block).is_some() {
            continue;
        }
        let owner = owner_of(peripherals, name, declared_parent)?;
        let peripheral = &peripherals[name.as_str()];
        let instance = Instance {
            name: peripheral.declared_name.clone(),
            base_address: peripheral.base_address.clone(),
            interrupt: peripheral.interrupt.clone(),
        };
        debug!("{} is an instance of {}", instance.name, owner);

        if let Layout::Block(block) = &mut peripherals[owner.as_str()].layout {
            block.instances.insert(instance.name.clone(), instance);
        }
        peripherals[name.as_str()].layout = Layout::Derived(owner);
    }
    Ok(())
}

/// Follows the `derivedFrom` chain of `name` to the peripheral owning a
/// register block
fn owner_of(
    peripherals: &IndexMap<String, Peripheral>,
    name: &str,
    declared_parent: &str,
) -> Result<String, ResolutionError> {
    let mut seen = HashSet::new();
    let mut current = name;
    loop {
        let peripheral = &peripherals[current];
        let parent = match &peripheral.layout {
            Layout::Block(_) => return Ok(current.to_string()),
            Layout::Derived(parent) => parent,
        };
        if !seen.insert(current) {
            return Err(ResolutionError::CyclicDerivation {
                peripheral: peripherals[name].declared_name.clone(),
            });
        }
        if !peripherals.contains_key(parent) {
            let parent = if current == name {
                declared_parent.to_string()
            } else {
                parent.clone()
            };
            return Err(ResolutionError::UnknownParent {
                peripheral: peripheral.declared_name.clone(),
                parent,
            });
        }
        current = parent.as_str();
    }
}
