//! Order-preserving key encoding.
//!
//! Integers are written fixed-width big-endian so that sled's bytewise ordering matches the
//! natural ordering of the keys, which the height scans depend on.

use anyhow::anyhow;
use arbor_primitives::{BlockId, Buf32};

pub(crate) trait LexicographicKey: Sized {
    fn encode_lexicographic(&self, out: &mut Vec<u8>);
    fn decode_lexicographic(data: &mut &[u8]) -> anyhow::Result<Self>;
}

pub(crate) fn encode_key<T: LexicographicKey>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    value.encode_lexicographic(&mut out);
    out
}

pub(crate) fn decode_key<T: LexicographicKey>(data: &[u8]) -> anyhow::Result<T> {
    let mut remaining = data;
    let value = T::decode_lexicographic(&mut remaining)?;
    if !remaining.is_empty() {
        return Err(anyhow!("lexicographic key has trailing bytes"));
    }
    Ok(value)
}

fn read_exact<const N: usize>(data: &mut &[u8]) -> anyhow::Result<[u8; N]> {
    let (prefix, rest) = data.split_first_chunk::<N>().ok_or_else(|| {
        anyhow!(
            "lexicographic key underflow: need {N} bytes, got {}",
            data.len()
        )
    })?;
    *data = rest;
    Ok(*prefix)
}

impl LexicographicKey for u64 {
    fn encode_lexicographic(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn decode_lexicographic(data: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(u64::from_be_bytes(read_exact::<8>(data)?))
    }
}

impl LexicographicKey for Buf32 {
    fn encode_lexicographic(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_slice());
    }

    fn decode_lexicographic(data: &mut &[u8]) -> anyhow::Result<Self> {
        Ok(Buf32::new(read_exact::<32>(data)?))
    }
}

impl LexicographicKey for BlockId {
    fn encode_lexicographic(&self, out: &mut Vec<u8>) {
        self.height().encode_lexicographic(out);
        self.hash().encode_lexicographic(out);
    }

    fn decode_lexicographic(data: &mut &[u8]) -> anyhow::Result<Self> {
        let height = u64::decode_lexicographic(data)?;
        let hash = Buf32::decode_lexicographic(data)?;
        Ok(BlockId::new(height, hash))
    }
}
