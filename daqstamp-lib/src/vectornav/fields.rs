//! Binary output group and field definitions.
//!
//! Each group carries a 16-bit field word in the packet header. A set bit means
//! the field is present in the payload. Fields are laid out in group order, then
//! in field bit order, with the statically known widths defined here.
use serde::Serialize;

/// Binary output groups in header bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Group {
    Common,
    Time,
    Imu,
    Gps,
    Attitude,
    Ins,
    Gps2,
}

impl Group {
    pub const ALL: [Group; 7] = [
        Group::Common,
        Group::Time,
        Group::Imu,
        Group::Gps,
        Group::Attitude,
        Group::Ins,
        Group::Gps2,
    ];

    /// Bit of this group in the header group byte.
    #[must_use]
    pub fn bit(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Groups flagged in `groups`, in payload order.
    pub fn flagged(groups: u8) -> impl Iterator<Item = Group> {
        Self::ALL
            .into_iter()
            .filter(move |g| groups & g.mask() != 0)
    }

    /// Field definitions indexed by field bit. `None` bits have no statically
    /// known width.
    #[must_use]
    pub fn fields(self) -> &'static [Option<FieldDef>; 16] {
        match self {
            Group::Common => &COMMON,
            Group::Time => &TIME,
            Group::Imu => &IMU,
            Group::Gps | Group::Gps2 => &GPS,
            Group::Attitude => &ATTITUDE,
            Group::Ins => &INS,
        }
    }

    /// Definition for field `bit`, if the bit is a known fixed-width field.
    #[must_use]
    pub fn field(self, bit: u8) -> Option<&'static FieldDef> {
        self.fields().get(usize::from(bit))?.as_ref()
    }
}

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    U8,
    U16,
    U32,
    U64,
    /// `n` consecutive f32 values
    F32(usize),
    /// `n` consecutive f64 values
    F64(usize),
    /// year offset, month, day, hour, minute, second, millisecond
    Utc,
    /// Packed status structure kept as raw bytes
    Bytes(usize),
}

impl Kind {
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Kind::U8 => 1,
            Kind::U16 => 2,
            Kind::U32 => 4,
            Kind::U64 | Kind::Utc => 8,
            Kind::F32(n) => 4 * n,
            Kind::F64(n) => 8 * n,
            Kind::Bytes(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: Kind,
}

impl FieldDef {
    #[must_use]
    pub const fn width(&self) -> usize {
        self.kind.width()
    }
}

const fn def(name: &'static str, kind: Kind) -> Option<FieldDef> {
    Some(FieldDef { name, kind })
}

/// Name of the GPS time field, nanoseconds since the GPS epoch.
pub const TIME_GPS: &str = "TimeGps";

const COMMON: [Option<FieldDef>; 16] = [
    def("TimeStartup", Kind::U64),
    def(TIME_GPS, Kind::U64),
    def("TimeSyncIn", Kind::U64),
    def("YawPitchRoll", Kind::F32(3)),
    def("Quaternion", Kind::F32(4)),
    def("AngularRate", Kind::F32(3)),
    def("Position", Kind::F64(3)),
    def("Velocity", Kind::F32(3)),
    def("Accel", Kind::F32(3)),
    def("Imu", Kind::F32(6)),
    def("MagPres", Kind::F32(5)),
    def("DeltaTheta", Kind::F32(7)),
    def("InsStatus", Kind::U16),
    def("SyncInCnt", Kind::U32),
    def("TimeGpsPps", Kind::U64),
    None,
];

const TIME: [Option<FieldDef>; 16] = [
    def("TimeStartup", Kind::U64),
    def(TIME_GPS, Kind::U64),
    def("GpsTow", Kind::U64),
    def("GpsWeek", Kind::U16),
    def("TimeSyncIn", Kind::U64),
    def("TimeGpsPps", Kind::U64),
    def("TimeUtc", Kind::Utc),
    def("SyncInCnt", Kind::U32),
    def("SyncOutCnt", Kind::U32),
    def("TimeStatus", Kind::U8),
    None,
    None,
    None,
    None,
    None,
    None,
];

const IMU: [Option<FieldDef>; 16] = [
    def("ImuStatus", Kind::U16),
    def("UncompMag", Kind::F32(3)),
    def("UncompAccel", Kind::F32(3)),
    def("UncompGyro", Kind::F32(3)),
    def("Temp", Kind::F32(1)),
    def("Pres", Kind::F32(1)),
    def("DeltaTheta", Kind::F32(4)),
    def("DeltaVel", Kind::F32(3)),
    def("Mag", Kind::F32(3)),
    def("Accel", Kind::F32(3)),
    def("AngularRate", Kind::F32(3)),
    def("SensSat", Kind::U16),
    None,
    None,
    None,
    None,
];

// Bits 14 and 15 (satellite info, raw measurements) are variable length.
const GPS: [Option<FieldDef>; 16] = [
    def("Utc", Kind::Utc),
    def("Tow", Kind::U64),
    def("Week", Kind::U16),
    def("NumSats", Kind::U8),
    def("Fix", Kind::U8),
    def("PosLla", Kind::F64(3)),
    def("PosEcef", Kind::F64(3)),
    def("VelNed", Kind::F32(3)),
    def("VelEcef", Kind::F32(3)),
    def("PosU", Kind::F32(3)),
    def("VelU", Kind::F32(1)),
    def("TimeU", Kind::U32),
    def("TimeInfo", Kind::Bytes(2)),
    def("Dop", Kind::F32(7)),
    None,
    None,
];

const ATTITUDE: [Option<FieldDef>; 16] = [
    def("VpeStatus", Kind::U16),
    def("YawPitchRoll", Kind::F32(3)),
    def("Quaternion", Kind::F32(4)),
    def("Dcm", Kind::F32(9)),
    def("MagNed", Kind::F32(3)),
    def("AccelNed", Kind::F32(3)),
    def("LinearAccelBody", Kind::F32(3)),
    def("LinearAccelNed", Kind::F32(3)),
    def("YprU", Kind::F32(3)),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

const INS: [Option<FieldDef>; 16] = [
    def("InsStatus", Kind::U16),
    def("PosLla", Kind::F64(3)),
    def("PosEcef", Kind::F64(3)),
    def("VelBody", Kind::F32(3)),
    def("VelNed", Kind::F32(3)),
    def("VelEcef", Kind::F32(3)),
    def("MagEcef", Kind::F32(3)),
    def("AccelEcef", Kind::F32(3)),
    def("LinearAccelEcef", Kind::F32(3)),
    def("PosU", Kind::F32(1)),
    def("VelU", Kind::F32(1)),
    None,
    None,
    None,
    None,
    None,
];
