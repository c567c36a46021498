// libpayterm/src/polling/state.rs

//! Interpreted per-cycle device status.
//!
//! `PollState` is transient: it is recomputed from every poll answer and
//! only the immediately previous status code is retained (for
//! edge-triggered status events). The enumerations are closed; codes the
//! tables do not know map to the `Other` carriers instead of being
//! silently dropped.

use crate::types::Nominal;

/// Reasons a validator rejects a note from the acceptance path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Insertion,
    Dielectric,
    PreviousBillInHead,
    Compensation,
    BillTransport,
    Identification,
    Verification,
    Optical,
    Inhibit,
    Capacitance,
    Operation,
    Length,
    Unrecognised,
    Uv,
    IncorrectBarcode,
    UnknownBarcode,
    CorruptedTrailingData,
    Other(u8),
}

impl RejectReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Insertion => "rejecting due to insertion",
            Self::Dielectric => "rejecting due to magnetic",
            Self::PreviousBillInHead => "previous bill remains in head",
            Self::Compensation => "rejecting due to multiplying",
            Self::BillTransport => "rejecting due to conveying",
            Self::Identification => "rejecting due to identification",
            Self::Verification => "rejecting due to verification",
            Self::Optical => "rejecting due to optic sensors",
            Self::Inhibit => "rejecting due to inhibit",
            Self::Capacitance => "rejecting due to capacity",
            Self::Operation => "operation error on insertion",
            Self::Length => "rejecting due to length",
            Self::Unrecognised => "rejecting: not reliably recognised",
            Self::Uv => "rejecting due to UV properties",
            Self::IncorrectBarcode => "incorrect number of barcode characters",
            Self::UnknownBarcode => "unknown barcode start sequence",
            Self::CorruptedTrailingData => "barcode trailing data corrupt",
            Self::Other(_) => "rejecting: unknown reason",
        }
    }
}

/// Hard failures decoded from valid answers (motor/sensor faults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    StackerMotor,
    TransportMotorSpeed,
    TransportMotor,
    AligningMotor,
    InitialCassetteStatus,
    Optical,
    Inductive,
    Cassette1Motor,
    Cassette2Motor,
    Cassette3Motor,
    BillToBillTransport,
    SwitchMotor1,
    SwitchMotor2,
    DispenserMotor1,
    DispenserMotor2,
    Capacitance,
    Generic,
    Other(u8),
}

impl FaultCode {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::StackerMotor => "drop cassette motor failure",
            Self::TransportMotorSpeed => "transport motor speed failure",
            Self::TransportMotor => "transport motor failure",
            Self::AligningMotor => "aligning motor failure",
            Self::InitialCassetteStatus => "initial cassette status failure",
            Self::Optical => "optic sensor failed to respond",
            Self::Inductive => "inductive sensor failed to respond",
            Self::Cassette1Motor => "cassette 1 motor failure",
            Self::Cassette2Motor => "cassette 2 motor failure",
            Self::Cassette3Motor => "cassette 3 motor failure",
            Self::BillToBillTransport => "bill-to-bill transport failure",
            Self::SwitchMotor1 => "switch motor 1 failure",
            Self::SwitchMotor2 => "switch motor 2 failure",
            Self::DispenserMotor1 => "dispenser motor 1 failure",
            Self::DispenserMotor2 => "dispenser motor 2 failure",
            Self::Capacitance => "capacitance sensor failed to respond",
            Self::Generic => "generic failure",
            Self::Other(_) => "unknown failure code",
        }
    }
}

/// Non-credit result codes reported by the ccTalk coin acceptor's
/// buffered event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorFault {
    RejectCoin,
    InhibitedCoin,
    MultipleWindow,
    WakeUpTimeout,
    ValidationTimeout,
    CreditSensorTimeout,
    SorterOptoTimeout,
    SecondCloseCoin,
    AcceptGateNotReady,
    CreditSensorNotReady,
    SorterNotReady,
    RejectCoinNotCleared,
    ValidationSensorNotReady,
    CreditSensorBlocked,
    SorterOptoBlocked,
    CreditSequenceError,
    CoinGoingBackwards,
    CoinTooFast,
    CoinTooSlow,
    CoinOnString,
    DceOptoTimeout,
    DceOptoNotSeen,
    CreditSensorReachedTooEarly,
    RejectCoinRepeatedTrip,
    RejectSlug,
    RejectSensorBlocked,
    GamesOverload,
    MaxCoinMeterPulsesExceeded,
    AcceptGateOpenNotClosed,
    AcceptGateClosedNotOpen,
    DataBlockRequest,
    CoinReturnMechanismActivated,
    UnspecifiedAlarm,
    Other(u8),
}

impl AcceptorFault {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::RejectCoin,
            0x02 => Self::InhibitedCoin,
            0x03 => Self::MultipleWindow,
            0x04 => Self::WakeUpTimeout,
            0x05 => Self::ValidationTimeout,
            0x06 => Self::CreditSensorTimeout,
            0x07 => Self::SorterOptoTimeout,
            0x08 => Self::SecondCloseCoin,
            0x09 => Self::AcceptGateNotReady,
            0x0A => Self::CreditSensorNotReady,
            0x0B => Self::SorterNotReady,
            0x0C => Self::RejectCoinNotCleared,
            0x0D => Self::ValidationSensorNotReady,
            0x0E => Self::CreditSensorBlocked,
            0x0F => Self::SorterOptoBlocked,
            0x10 => Self::CreditSequenceError,
            0x11 => Self::CoinGoingBackwards,
            0x12 => Self::CoinTooFast,
            0x13 => Self::CoinTooSlow,
            0x14 => Self::CoinOnString,
            0x15 => Self::DceOptoTimeout,
            0x16 => Self::DceOptoNotSeen,
            0x17 => Self::CreditSensorReachedTooEarly,
            0x18 => Self::RejectCoinRepeatedTrip,
            0x19 => Self::RejectSlug,
            0x1A => Self::RejectSensorBlocked,
            0x1B => Self::GamesOverload,
            0x1C => Self::MaxCoinMeterPulsesExceeded,
            0x1D => Self::AcceptGateOpenNotClosed,
            0x1E => Self::AcceptGateClosedNotOpen,
            0xFD => Self::DataBlockRequest,
            0xFE => Self::CoinReturnMechanismActivated,
            0xFF => Self::UnspecifiedAlarm,
            other => Self::Other(other),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::RejectCoin => "coin rejected",
            Self::InhibitedCoin => "coin inhibited",
            Self::MultipleWindow => "multiple window",
            Self::WakeUpTimeout => "wake-up timeout",
            Self::ValidationTimeout => "validation timeout",
            Self::CreditSensorTimeout => "credit sensor timeout",
            Self::SorterOptoTimeout => "sorter opto timeout",
            Self::SecondCloseCoin => "second close coin",
            Self::AcceptGateNotReady => "accept gate not ready",
            Self::CreditSensorNotReady => "credit sensor not ready",
            Self::SorterNotReady => "sorter not ready",
            Self::RejectCoinNotCleared => "reject coin not cleared",
            Self::ValidationSensorNotReady => "validation sensor not ready",
            Self::CreditSensorBlocked => "credit sensor blocked",
            Self::SorterOptoBlocked => "sorter opto blocked",
            Self::CreditSequenceError => "credit sequence error",
            Self::CoinGoingBackwards => "coin going backwards",
            Self::CoinTooFast => "coin too fast",
            Self::CoinTooSlow => "coin too slow",
            Self::CoinOnString => "coin-on-string mechanism activated",
            Self::DceOptoTimeout => "DCE opto timeout",
            Self::DceOptoNotSeen => "DCE opto not seen",
            Self::CreditSensorReachedTooEarly => "credit sensor reached too early",
            Self::RejectCoinRepeatedTrip => "reject coin repeated sequential trip",
            Self::RejectSlug => "slug rejected",
            Self::RejectSensorBlocked => "reject sensor blocked",
            Self::GamesOverload => "games overload",
            Self::MaxCoinMeterPulsesExceeded => "max coin meter pulses exceeded",
            Self::AcceptGateOpenNotClosed => "accept gate open, not closed",
            Self::AcceptGateClosedNotOpen => "accept gate closed, not open",
            Self::DataBlockRequest => "data block request",
            Self::CoinReturnMechanismActivated => "coin return mechanism activated",
            Self::UnspecifiedAlarm => "unspecified alarm",
            Self::Other(_) => "unknown acceptor code",
        }
    }
}

/// Where a note is stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JamLocation {
    Validator,
    Cassette,
    Cassette1,
    Cassette2,
    Cassette3,
    TransportPath,
    Switch,
    Dispenser,
}

impl JamLocation {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Validator => "bill jammed in the acceptance path",
            Self::Cassette => "bill jammed in the drop cassette",
            Self::Cassette1 => "bill jammed in cassette 1",
            Self::Cassette2 => "bill jammed in cassette 2",
            Self::Cassette3 => "bill jammed in cassette 3",
            Self::TransportPath => "bill jammed in the transport path",
            Self::Switch => "bill jammed in the switch",
            Self::Dispenser => "bill jammed in the dispenser",
        }
    }
}

/// One poll cycle's interpreted status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    PowerUp,
    Initialize,
    Idling,
    Accepting,
    /// A note is held in escrow pending a Stack or Return decision.
    Escrow(Nominal),
    Stacking,
    /// A note was physically committed to the cash box.
    Stacked(Nominal),
    Returning,
    Returned,
    Holding,
    /// Device asked for time; parameter is in units of 100 ms.
    Busy(u8),
    Disabled,
    /// Second note inserted while the first is still in flight.
    Pause,
    Rejecting(RejectReason),
    Jammed(JamLocation),
    CassetteFull,
    CassetteOpen,
    Cheated,
    Calibration,
    FlashDownload,
    NoPushMode,
    PreStack,
    InvalidCommand,
    /// Coin acceptor sorter/error code (ccTalk buffered queue).
    CoinFault(AcceptorFault),
    Error(FaultCode),
    Unknown(u8),
}

impl PollState {
    /// True for the states that require outside intervention before the
    /// device can accept again.
    pub fn needs_intervention(&self) -> bool {
        matches!(
            self,
            Self::Jammed(_) | Self::CassetteFull | Self::CassetteOpen | Self::Error(_)
        )
    }
}
