use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};

/// 32-byte buffer, used for every hash in the protocol.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary, BorshSerialize, BorshDeserialize)]
pub struct Buf32(pub [u8; 32]);

impl_buf_common!(Buf32, 32);

/// 20-byte buffer, used for staker addresses.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary, BorshSerialize, BorshDeserialize)]
pub struct Buf20(pub [u8; 20]);

impl_buf_common!(Buf20, 20);
