//! # CIDR Block Model
//!
//! A single representation for IPv4 and IPv6 blocks: the address is held as a
//! `u128` tagged with its family, so containment and overlap are computed
//! with masked integer comparisons for both families alike.
//!
//! Supported text forms:
//! * **IPv4**: `172.24.0.0/16`
//! * **IPv6**: `fd00:10::/48`

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CidrFault, InvalidCidr};

/// Address family of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Address width in bits.
    pub const fn bits(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    const fn full_mask(self) -> u128 {
        match self {
            Family::V4 => u32::MAX as u128,
            Family::V6 => u128::MAX,
        }
    }
}

/// A canonical CIDR block, `network/prefix`.
///
/// Host bits below the prefix are always zero; [`Block::new`] and
/// [`FromStr`] refuse anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Block {
    family: Family,
    addr: u128,
    prefix: u8,
}

impl Block {
    pub fn new(ip: IpAddr, prefix: u8) -> Result<Self, CidrFault> {
        let (family, addr) = match ip {
            IpAddr::V4(v4) => (Family::V4, u128::from(u32::from(v4))),
            IpAddr::V6(v6) => (Family::V6, u128::from(v6)),
        };
        if prefix > family.bits() {
            return Err(CidrFault::BadPrefix {
                max: family.bits(),
            });
        }
        let block = Self {
            family,
            addr,
            prefix,
        };
        if addr & !block.mask() & family.full_mask() != 0 {
            return Err(CidrFault::HostBitsSet);
        }
        Ok(block)
    }

    /// `0.0.0.0/0` or `::/0`.
    pub const fn default_route(family: Family) -> Self {
        Self {
            family,
            addr: 0,
            prefix: 0,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn is_default_route(&self) -> bool {
        self.prefix == 0
    }

    /// Network mask within the family width.
    fn mask(&self) -> u128 {
        if self.prefix == 0 {
            0
        } else {
            (u128::MAX << (self.family.bits() - self.prefix)) & self.family.full_mask()
        }
    }

    /// First address of the block, as a raw integer.
    pub fn first(&self) -> u128 {
        self.addr
    }

    /// Last address of the block, as a raw integer.
    pub fn last(&self) -> u128 {
        self.addr | (!self.mask() & self.family.full_mask())
    }

    pub fn network(&self) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from(self.addr as u32)),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(self.addr)),
        }
    }

    /// True when `inner` lies entirely within `self`. Reflexive.
    pub fn contains(&self, inner: &Block) -> bool {
        contains(self, inner)
    }

    pub fn overlaps(&self, other: &Block) -> bool {
        overlaps(self, other)
    }
}

/// Parses `text` into a [`Block`].
pub fn parse(text: &str) -> Result<Block, InvalidCidr> {
    let fail = |reason: CidrFault| InvalidCidr {
        text: text.to_string(),
        reason,
    };

    let Some((ip_str, prefix_str)) = text.trim().split_once('/') else {
        return Err(fail(CidrFault::MissingPrefix));
    };

    let ip = ip_str
        .parse::<IpAddr>()
        .map_err(|_| fail(CidrFault::BadAddress))?;
    let max = match ip {
        IpAddr::V4(_) => Family::V4.bits(),
        IpAddr::V6(_) => Family::V6.bits(),
    };
    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|_| fail(CidrFault::BadPrefix { max }))?;

    Block::new(ip, prefix).map_err(fail)
}

pub fn contains(outer: &Block, inner: &Block) -> bool {
    outer.family == inner.family
        && inner.prefix >= outer.prefix
        && inner.addr & outer.mask() == outer.addr
}

/// Two blocks overlap unless one range ends before the other begins.
pub fn overlaps(a: &Block, b: &Block) -> bool {
    a.family == b.family && a.first() <= b.last() && b.first() <= a.last()
}

pub fn is_default_route(block: &Block) -> bool {
    block.is_default_route()
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

impl FromStr for Block {
    type Err = InvalidCidr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for Block {
    type Error = InvalidCidr;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value)
    }
}

impl From<Block> for String {
    fn from(block: Block) -> Self {
        block.to_string()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
