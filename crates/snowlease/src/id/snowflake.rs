/// A macro for defining a 64-bit Snowflake layout with custom field widths.
///
/// The generated type packs, from most to least significant bit, a reserved
/// block, a timestamp, a worker ID and a sequence. The reserved block must be
/// at least one bit wide so that every raw value stays non-negative when
/// stored as a signed 64-bit integer.
///
/// # Example
///
/// ```
/// use snowlease::{define_snowflake_id, SnowflakeId};
///
/// define_snowflake_id!(
///     /// 39 bits of timestamp, 8 worker bits, 16 sequence bits.
///     WideSequenceId,
///     reserved: 1,
///     timestamp: 39,
///     worker_id: 8,
///     sequence: 16
/// );
///
/// let id = WideSequenceId::from_components(10, 255, 65_535);
/// assert_eq!(id.worker_id(), 255);
/// assert_eq!(WideSequenceId::max_sequence(), 65_535);
/// ```
///
/// Which expands to the following bit layout:
///
/// ```text
///  Bit Index:  63           63 62            24 23            16 15             0
///              +--------------+----------------+----------------+---------------+
///  Field:      | reserved (1) | timestamp (39) | worker ID (8)  | sequence (16) |
///              +--------------+----------------+----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ----------->|
/// ```
#[macro_export]
macro_rules! define_snowflake_id {
    (
        $(#[$meta:meta])*
        $name:ident,
        reserved: $reserved_bits:expr,
        timestamp: $timestamp_bits:expr,
        worker_id: $worker_id_bits:expr,
        sequence: $sequence_bits:expr
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name {
            id: u64,
        }

        const _: () = {
            // Compile-time check: the layout must cover exactly 64 bits and
            // keep the sign bit out of the payload.
            assert!(
                $reserved_bits + $timestamp_bits + $worker_id_bits + $sequence_bits == u64::BITS,
                "Layout must match underlying type width"
            );
            assert!($reserved_bits >= 1, "Layout must reserve the sign bit");
        };

        impl $name {
            pub const RESERVED_BITS: u32 = $reserved_bits;
            pub const TIMESTAMP_BITS: u32 = $timestamp_bits;
            pub const WORKER_ID_BITS: u32 = $worker_id_bits;
            pub const SEQUENCE_BITS: u32 = $sequence_bits;

            pub const SEQUENCE_SHIFT: u32 = 0;
            pub const WORKER_ID_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;
            pub const TIMESTAMP_SHIFT: u32 = Self::WORKER_ID_SHIFT + Self::WORKER_ID_BITS;

            pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
            pub const WORKER_ID_MASK: u64 = (1 << Self::WORKER_ID_BITS) - 1;
            pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

            /// Packs the three fields, masking each one to its width.
            #[must_use]
            pub const fn from(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
                let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
                let w = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
                let s = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
                Self { id: t | w | s }
            }

            /// Extracts the timestamp from the packed ID.
            #[must_use]
            pub const fn timestamp(&self) -> u64 {
                (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
            }

            /// Extracts the worker ID from the packed ID.
            #[must_use]
            pub const fn worker_id(&self) -> u64 {
                (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
            }

            /// Extracts the sequence number from the packed ID.
            #[must_use]
            pub const fn sequence(&self) -> u64 {
                (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
            }

            #[must_use]
            pub const fn max_timestamp() -> u64 {
                Self::TIMESTAMP_MASK
            }

            #[must_use]
            pub const fn max_worker_id() -> u64 {
                Self::WORKER_ID_MASK
            }

            #[must_use]
            pub const fn max_sequence() -> u64 {
                Self::SEQUENCE_MASK
            }

            /// Converts this type into its raw type representation
            #[must_use]
            pub const fn to_raw(&self) -> u64 {
                self.id
            }

            /// Converts a raw type into this type
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self { id: raw }
            }

            /// Returns the ID as a zero-padded 20-digit string.
            #[must_use]
            pub fn to_padded_string(&self) -> String {
                format!("{:020}", self.id)
            }
        }

        impl $crate::SnowflakeId for $name {
            fn timestamp(&self) -> u64 {
                self.timestamp()
            }

            fn max_timestamp() -> u64 {
                Self::TIMESTAMP_MASK
            }

            fn worker_id(&self) -> u64 {
                self.worker_id()
            }

            fn max_worker_id() -> u64 {
                Self::WORKER_ID_MASK
            }

            fn sequence(&self) -> u64 {
                self.sequence()
            }

            fn max_sequence() -> u64 {
                Self::SEQUENCE_MASK
            }

            fn from_components(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
                debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
                debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
                debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
                Self::from(timestamp, worker_id, sequence)
            }

            fn to_raw(&self) -> u64 {
                self.id
            }

            fn from_raw(raw: u64) -> Self {
                Self { id: raw }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.id)
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("id", &self.id)
                    .field("timestamp", &self.timestamp())
                    .field("worker_id", &self.worker_id())
                    .field("sequence", &self.sequence())
                    .finish()
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.to_raw()
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self::from_raw(raw)
            }
        }
    };
}

define_snowflake_id!(
    /// The default 64-bit layout handed out by a leased generator.
    ///
    /// - 1 bit reserved
    /// - 41 bits timestamp (ms since [`DEFAULT_EPOCH`], roughly 69 years)
    /// - 10 bits worker ID (1024 leasable slots)
    /// - 12 bits sequence (4096 IDs per millisecond per worker)
    ///
    /// ```text
    ///  Bit Index:  63           63 62            22 21             12 11             0
    ///              +--------------+----------------+-----------------+---------------+
    ///  Field:      | reserved (1) | timestamp (41) | worker ID (10)  | sequence (12) |
    ///              +--------------+----------------+-----------------+---------------+
    ///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
    /// ```
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    #[cfg_attr(
        feature = "serde",
        derive(serde::Serialize, serde::Deserialize),
        serde(transparent)
    )]
    SnowflakeLeaseId,
    reserved: 1,
    timestamp: 41,
    worker_id: 10,
    sequence: 12
);

/// Packs `(timestamp, worker_id, sequence)` using the [`SnowflakeLeaseId`]
/// layout.
///
/// `timestamp` is already relative to the epoch. Callers keep every field
/// within its bounds; there is no failure path.
#[must_use]
pub const fn encode(timestamp: u64, worker_id: u64, sequence: u64) -> u64 {
    SnowflakeLeaseId::from(timestamp, worker_id, sequence).to_raw()
}

/// Splits a raw [`SnowflakeLeaseId`] into `(timestamp, worker_id, sequence)`.
#[must_use]
pub const fn decode(raw: u64) -> (u64, u64, u64) {
    let id = SnowflakeLeaseId::from_raw(raw);
    (id.timestamp(), id.worker_id(), id.sequence())
}
