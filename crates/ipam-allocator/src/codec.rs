//! Address codec and block arithmetic.
//!
//! The inventory stores addresses as fixed-width lowercase hex: 8 digits for
//! IPv4 and 32 for IPv6. This module converts between that wire form and the
//! canonical text form, and does the prefix/size/gateway arithmetic needed to
//! place subnets, pools and gateways.
//!
//! Blocks are `ipnet` networks whose base must be the network address.
//! Offsets inside a block run on checked `u128` for both families: a result
//! outside the block is an error, never a wrapped value.

use crate::error::AllocError;
use ipnet::IpNet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::num::NonZeroI64;
use std::str::FromStr;

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Address width in bits
    pub fn bits(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// Number of hex digits in the wire form
    pub fn hex_digits(self) -> usize {
        usize::from(self.bits() / 4)
    }

    /// Family of an address
    pub fn of(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    fn max_value(self) -> u128 {
        match self {
            AddressFamily::V4 => u128::from(u32::MAX),
            AddressFamily::V6 => u128::MAX,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Parse a textual address of the given family
pub fn parse_address(text: &str, family: AddressFamily) -> Result<IpAddr, AllocError> {
    let text = text.trim();
    let parsed = match family {
        AddressFamily::V4 => Ipv4Addr::from_str(text).map(IpAddr::V4),
        AddressFamily::V6 => Ipv6Addr::from_str(text).map(IpAddr::V6),
    };
    parsed.map_err(|e| {
        AllocError::MalformedAddress(format!(
            "'{}' is not a valid {} address: {}",
            text, family, e
        ))
    })
}

/// Wire (hex) form of an address
pub fn encode(address: IpAddr) -> String {
    match address {
        IpAddr::V4(v4) => format!("{:08x}", u32::from(v4)),
        IpAddr::V6(v6) => format!("{:032x}", u128::from(v6)),
    }
}

/// Parse the wire (hex) form of an address
pub fn decode(hex: &str, family: AddressFamily) -> Result<IpAddr, AllocError> {
    let hex = hex.trim();
    if hex.len() != family.hex_digits() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AllocError::MalformedAddress(format!(
            "'{}' is not a {}-digit hex {} address",
            hex,
            family.hex_digits(),
            family
        )));
    }

    let malformed =
        |e: std::num::ParseIntError| AllocError::MalformedAddress(format!("'{}': {}", hex, e));
    match family {
        AddressFamily::V4 => u32::from_str_radix(hex, 16)
            .map(|bits| IpAddr::V4(Ipv4Addr::from(bits)))
            .map_err(malformed),
        AddressFamily::V6 => u128::from_str_radix(hex, 16)
            .map(|bits| IpAddr::V6(Ipv6Addr::from(bits)))
            .map_err(malformed),
    }
}

/// Convert a dotted-quad or colon-grouped address to its hex form
pub fn text_to_hex(text: &str, family: AddressFamily) -> Result<String, AllocError> {
    parse_address(text, family).map(encode)
}

/// Convert a hex address back to its canonical text form
pub fn hex_to_text(hex: &str, family: AddressFamily) -> Result<String, AllocError> {
    decode(hex, family).map(|address| address.to_string())
}

/// Number of addresses in a block, always a power of two
///
/// Kept as a count of host bits so the 2^128 addresses of an IPv6 `/0` are
/// represented exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockSize {
    host_bits: u8,
}

impl BlockSize {
    /// The whole IPv6 address space
    pub const MAX: BlockSize = BlockSize { host_bits: 128 };

    /// Block of `count` addresses; `count` must be a power of two
    pub fn from_count(count: u128) -> Result<Self, AllocError> {
        if !count.is_power_of_two() {
            return Err(AllocError::InvalidPrefixLength(format!(
                "block size {} is not a power of two",
                count
            )));
        }
        // trailing_zeros of a power of two below 2^128 is at most 127
        Ok(Self {
            host_bits: count.trailing_zeros() as u8,
        })
    }

    pub fn host_bits(self) -> u8 {
        self.host_bits
    }

    /// Number of addresses, `None` for 2^128
    pub fn count(self) -> Option<u128> {
        1u128.checked_shl(u32::from(self.host_bits))
    }

    /// Distance from the first to the last address of the block
    pub fn host_mask(self) -> u128 {
        match self.count() {
            Some(count) => count - 1,
            None => u128::MAX,
        }
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count() {
            Some(count) => write!(f, "{}", count),
            None => write!(f, "2^{}", self.host_bits),
        }
    }
}

/// Number of addresses in a block of the given prefix length
pub fn size_from_prefix_length(length: u8, family: AddressFamily) -> Result<BlockSize, AllocError> {
    check_prefix_length(length, family)?;
    Ok(BlockSize {
        host_bits: family.bits() - length,
    })
}

/// Prefix length of a block holding `size` addresses
pub fn prefix_length_from_size(size: BlockSize, family: AddressFamily) -> Result<u8, AllocError> {
    family.bits().checked_sub(size.host_bits).ok_or_else(|| {
        AllocError::InvalidPrefixLength(format!(
            "block size {} exceeds the {} address space",
            size, family
        ))
    })
}

fn check_prefix_length(length: u8, family: AddressFamily) -> Result<(), AllocError> {
    if length > family.bits() {
        return Err(AllocError::InvalidPrefixLength(format!(
            "/{} is out of range for {} (0-{})",
            length,
            family,
            family.bits()
        )));
    }
    Ok(())
}

fn to_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_bits(bits: u128, family: AddressFamily) -> Result<IpAddr, AllocError> {
    match family {
        AddressFamily::V4 => u32::try_from(bits)
            .map(|b| IpAddr::V4(Ipv4Addr::from(b)))
            .map_err(|_| {
                AllocError::MalformedAddress(format!("{:#x} exceeds the IPv4 address space", bits))
            }),
        AddressFamily::V6 => Ok(IpAddr::V6(Ipv6Addr::from(bits))),
    }
}

/// An address block
///
/// The base is always the network address: host bits below the prefix
/// length are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    net: IpNet,
}

impl Prefix {
    /// Create a prefix from its network address and length
    pub fn new(base: IpAddr, length: u8) -> Result<Self, AllocError> {
        let net = IpNet::new(base, length).map_err(|e| {
            AllocError::InvalidPrefixLength(format!(
                "/{} is out of range for {}: {}",
                length,
                AddressFamily::of(&base),
                e
            ))
        })?;
        if net.trunc() != net {
            return Err(AllocError::InvalidRequest(format!(
                "{} is not the network address of {}",
                base,
                net.trunc()
            )));
        }
        Ok(Self { net })
    }

    /// Create a prefix from a hex base address
    pub fn from_hex(base_hex: &str, length: u8, family: AddressFamily) -> Result<Self, AllocError> {
        Self::new(decode(base_hex, family)?, length)
    }

    pub fn base(&self) -> IpAddr {
        self.net.network()
    }

    pub fn length(&self) -> u8 {
        self.net.prefix_len()
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.base())
    }

    /// Number of addresses in the block
    pub fn size(&self) -> BlockSize {
        BlockSize {
            host_bits: self.net.max_prefix_len() - self.net.prefix_len(),
        }
    }

    /// Last address of the block (`base + size - 1`)
    pub fn last(&self) -> IpAddr {
        self.net.broadcast()
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.net.contains(&address)
    }

    /// Gateway placed `offset` addresses into the block
    ///
    /// A positive offset counts up from the base address, a negative one
    /// counts down from the last address. `|offset|` must be smaller than
    /// the block size.
    pub fn gateway(&self, offset: NonZeroI64) -> Result<IpAddr, AllocError> {
        let distance = u128::from(offset.get().unsigned_abs());
        if distance > self.size().host_mask() {
            return Err(AllocError::GatewayOutOfRange(format!(
                "offset {} does not fit in {}",
                offset, self.net
            )));
        }

        let gateway = if offset.get() > 0 {
            to_bits(self.base()).checked_add(distance)
        } else {
            to_bits(self.last()).checked_sub(distance)
        }
        .ok_or_else(|| {
            AllocError::GatewayOutOfRange(format!(
                "offset {} runs past the end of {}",
                offset, self.net
            ))
        })?;

        from_bits(gateway, self.family())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}

/// Hex gateway of the block at `base_hex/prefix_length`
pub fn gateway_address(
    base_hex: &str,
    prefix_length: u8,
    offset: NonZeroI64,
    family: AddressFamily,
) -> Result<String, AllocError> {
    Prefix::from_hex(base_hex, prefix_length, family)?
        .gateway(offset)
        .map(encode)
}

/// Gateway for a raw offset where `0` means "no gateway"
///
/// The zero case returns before any arithmetic runs.
pub fn gateway_for_offset(prefix: &Prefix, offset: i64) -> Result<Option<IpAddr>, AllocError> {
    match NonZeroI64::new(offset) {
        None => Ok(None),
        Some(offset) => prefix.gateway(offset).map(Some),
    }
}

/// Address `count - 1` positions after `start`, i.e. the end of a range of `count` addresses
pub fn range_end(start: IpAddr, count: u128) -> Result<IpAddr, AllocError> {
    let family = AddressFamily::of(&start);
    let end = count
        .checked_sub(1)
        .and_then(|span| to_bits(start).checked_add(span))
        .filter(|bits| *bits <= family.max_value())
        .ok_or_else(|| {
            AllocError::InvalidRequest(format!(
                "a range of {} addresses starting at {} does not fit in the {} address space",
                count, start, family
            ))
        })?;
    from_bits(end, family)
}
