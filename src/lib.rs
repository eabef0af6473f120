//! C++ register header generator from [CMSIS-SVD] files
//!
//! [CMSIS-SVD]: http://www.keil.com/pack/doc/CMSIS/SVD/html/index.html
//!
//! A SVD file is an XML file that describes the hardware features of a
//! microcontroller. In particular, it lists all the peripherals available to
//! the device, where the registers associated to each peripheral are located
//! in memory and how each register splits into bit fields.
//!
//! `svd2cpp` is a command line tool that transforms SVD files into C++
//! headers exposing one zero-cost, type safe controller per peripheral.
//!
//! # Installation
//!
//! ```text
//! $ cargo install svd2cpp
//! ```
//!
//! # Usage
//!
//! ```text
//! $ svd2cpp -i STM32F072x.svd -p USART1 -p GPIOA -o include/ --generic
//! ```
//!
//! This writes `stm32f072x_usart1.hpp`, `stm32f072x_gpioa.hpp` and the
//! support header `Bitfield.hpp` into `include/`.
//!
//! # Peripheral API
//!
//! Every header holds one controller template, parameterized by base address
//! and interrupt number, followed by one alias per peripheral instance
//! sharing its register block:
//!
//! ```text
//! namespace donut::stm32f072x {
//!
//!     enum class ParityType : std::uint8_t {
//!         Even = 0,
//!         Odd = 1,
//!     };
//!
//!     template <std::uint32_t BaseAddress, std::uint16_t Irq>
//!     struct UsartController {
//!         struct Cr1 {
//!             using WidthType = std::uint32_t;
//!             static constexpr std::uint32_t Address = BaseAddress + 0x0;
//!             using Ue = Bitfield<Cr1, bool, 0, 1, AccessType::ReadWrite>;
//!             using Ps = Bitfield<Cr1, ParityType, 9, 1, AccessType::ReadWrite>;
//!         };
//!     };
//!
//!     using USART1 = UsartController<0x40013800, 27>;
//!     using USART2 = UsartController<0x40004400, 28>;
//!
//! } // namespace donut::stm32f072x
//! ```
//!
//! Fields are read and written through the `Bitfield` template of
//! `Bitfield.hpp`:
//!
//! ```text
//! USART1::Cr1::Ue::write(true);
//! auto parity = USART2::Cr1::Ps::read();
//! ```
//!
//! Peripherals declared with `derivedFrom` share the controller of the
//! peripheral they derive from: requesting either of them emits the same
//! header.
//!
//! # Library
//!
//! ```
//! let svd = r#"
//! <device>
//!   <name>Test</name>
//!   <peripherals>
//!     <peripheral>
//!       <name>UART0</name>
//!       <baseAddress>0x40000000</baseAddress>
//!       <registers>
//!         <register>
//!           <name>CR</name>
//!           <addressOffset>0x00</addressOffset>
//!           <fields>
//!             <field><name>EN</name><bitOffset>0</bitOffset><bitWidth>1</bitWidth></field>
//!           </fields>
//!         </register>
//!       </registers>
//!     </peripheral>
//!   </peripherals>
//! </device>"#;
//!
//! let generation = svd2cpp::generate(svd, "UART0", &svd2cpp::Config::default()).unwrap();
//! assert!(generation.header.contains("using UART0 = UartController<0x40000000, 0xFF>;"));
//! ```

pub mod config;
pub mod errors;
pub mod generate;
pub mod svd;
pub mod util;

pub use config::{Config, IdentCase};
pub use errors::{Error, ShapeWarning};

use crate::errors::Result;
use crate::svd::{Device, ModelBuilder};

/// Output of a single-peripheral generation request
#[derive(Debug)]
pub struct Generation {
    pub device: Device,
    /// Declared name of the peripheral owning the emitted controller
    pub peripheral: String,
    pub header: String,
    pub diagnostics: Vec<ShapeWarning>,
}

/// Parses an SVD document into the hardware model
pub fn load_from(xml: &str, config: &Config) -> Result<(Device, Vec<ShapeWarning>)> {
    let root = svd::tree::parse(xml)?;
    ModelBuilder::new(config).build(&root)
}

/// Renders the header of the peripheral `requested`
pub fn render(device: &Device, requested: &str, config: &Config) -> Result<String> {
    generate::device::render(device, requested, config)
}

/// Parses `xml` and renders the header of the peripheral `requested`
pub fn generate(xml: &str, requested: &str, config: &Config) -> Result<Generation> {
    let (device, diagnostics) = load_from(xml, config)?;
    let peripheral = device
        .lookup(requested, config.ident_case)?
        .declared_name
        .clone();
    let header = render(&device, requested, config)?;
    Ok(Generation {
        device,
        peripheral,
        header,
        diagnostics,
    })
}
