// libpayterm/src/types.rs

use std::fmt;

/// Nominal - face value of an accepted bill or coin, in minor currency
/// units as reported by the device tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nominal(u32);

impl Nominal {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Zero means "unrecognized denomination"; it is never counted and
    /// never stacked as a positive event.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Nominal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DeviceClass - the peripheral families the terminal knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceClass {
    Validator,
    CoinAcceptor,
    Printer,
    Modem,
    Watchdog,
}

impl DeviceClass {
    /// Stable registry slot, matching the terminal database row ids.
    pub fn registry_slot(&self) -> u8 {
        match self {
            Self::Validator => 1,
            Self::CoinAcceptor => 2,
            Self::Printer => 3,
            Self::Watchdog => 4,
            Self::Modem => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Validator => "validator",
            Self::CoinAcceptor => "coin acceptor",
            Self::Printer => "printer",
            Self::Modem => "modem",
            Self::Watchdog => "watchdog",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// DeviceIdentity - the result of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity {
    /// Model name the prober was configured with (e.g. "CashCode CCNET").
    pub model: String,
    pub part_number: String,
    pub serial_number: String,
}

impl DeviceIdentity {
    pub fn new(model: &str, part_number: String, serial_number: String) -> Self {
        Self {
            model: model.to_string(),
            part_number,
            serial_number,
        }
    }
}

/// Data bits for a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity for a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
}

/// Stop bits for a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Flow control for a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Hardware,
}

/// LineSettings - the fixed line parameters a protocol family opens its
/// port with. Crate-local so protocol modules can state them without
/// depending on the optional serial backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow: FlowControl,
}

impl LineSettings {
    pub const fn new(
        baud: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
        flow: FlowControl,
    ) -> Self {
        Self {
            baud,
            data_bits,
            parity,
            stop_bits,
            flow,
        }
    }

    /// 9600 8N1 without flow control, the most common line here.
    pub const fn eight_n_one(baud: u32) -> Self {
        Self::new(
            baud,
            DataBits::Eight,
            Parity::None,
            StopBits::One,
            FlowControl::None,
        )
    }
}
