//! The channel address tree.
//!
//! Nesting in a Flash channel is strictly one child per node, so the "tree"
//! is stored as an ordered chain: `nodes[0]` is the root and `nodes[i + 1]`
//! is the only child of `nodes[i]`. The remainder address sits outside the
//! chain.

use serde::{Deserialize, Serialize};

use super::address::MultisigAddress;
use crate::error::{FlashError, Result};

/// Remainder address plus the root-first chain of nested addresses.
///
/// Deserialization goes through [`build_tree`], so a loaded tree always has
/// a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeData")]
pub struct ChannelTree {
    remainder: MultisigAddress,
    nodes: Vec<MultisigAddress>,
}

impl ChannelTree {
    /// The auxiliary address used for residual deposits.
    pub fn remainder(&self) -> &MultisigAddress {
        &self.remainder
    }

    /// The outermost chain node; holds the channel's custody.
    pub fn root(&self) -> &MultisigAddress {
        &self.nodes[0]
    }

    /// The deepest chain node.
    pub fn leaf(&self) -> &MultisigAddress {
        &self.nodes[self.nodes.len() - 1]
    }

    /// The child of chain node `position`, if any.
    pub fn child_of(&self, position: usize) -> Option<&MultisigAddress> {
        self.nodes.get(position + 1)
    }

    /// Chain nodes, root first.
    pub fn iter(&self) -> impl Iterator<Item = &MultisigAddress> {
        self.nodes.iter()
    }

    /// Number of chain nodes.
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up any channel-internal address, remainder included.
    pub fn find(&self, address: &str) -> Option<&MultisigAddress> {
        std::iter::once(&self.remainder)
            .chain(self.nodes.iter())
            .find(|node| node.address == address)
    }

    /// Whether `address` is one of the channel's internal addresses.
    pub fn contains(&self, address: &str) -> bool {
        self.find(address).is_some()
    }
}

/// Arranges one participant's composed addresses (setup order) into a tree.
///
/// The first address becomes the remainder, the second the root, and each
/// following address the child of the one before it.
pub fn build_tree(mut addresses: Vec<MultisigAddress>) -> Result<ChannelTree> {
    if addresses.len() < 2 {
        return Err(FlashError::MalformedTree {
            got: addresses.len(),
        });
    }
    let remainder = addresses.remove(0);
    Ok(ChannelTree {
        remainder,
        nodes: addresses,
    })
}

/// Wire form of [`ChannelTree`], validated on the way in.
#[derive(Deserialize)]
struct TreeData {
    remainder: MultisigAddress,
    nodes: Vec<MultisigAddress>,
}

impl TryFrom<TreeData> for ChannelTree {
    type Error = FlashError;

    fn try_from(data: TreeData) -> Result<Self> {
        let mut addresses = Vec::with_capacity(data.nodes.len() + 1);
        addresses.push(data.remainder);
        addresses.extend(data.nodes);
        build_tree(addresses)
    }
}
