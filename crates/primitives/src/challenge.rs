//! Node-data digests for each branch of an assertion, plus the message accumulator.
//!
//! The valid branch commits to the message and log accumulators. The three invalid branches
//! commit to the data a challenger would need to open the matching challenge, paired with the
//! challenge period they get.

use crate::{
    assertion::TimeBounds,
    buf::Buf32,
    hash::{hash_pair, raw, Hasher},
    time::TimeTicks,
};

/// Hash standing in for an empty inbox tuple.
pub fn empty_tuple_hash() -> Buf32 {
    raw(&[])
}

/// Accumulates `H(acc, H(message))` over the messages, starting from `init`.
///
/// Accumulating a concatenation of batches is the same as accumulating each batch in turn from
/// the running value, which is what lets verifiers re-slice a message buffer per node.
pub fn bytes_array_accum_hash<I>(init: Buf32, messages: I) -> Buf32
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    messages
        .into_iter()
        .fold(init, |acc, msg| hash_pair(&acc, &raw(msg.as_ref())))
}

/// Node data of a valid child.
pub fn valid_data_hash(last_message_hash: &Buf32, last_log_hash: &Buf32) -> Buf32 {
    hash_pair(last_message_hash, last_log_hash)
}

/// Node data of an invalid child: the challenge digest and the period it may be opened in.
pub fn challenge_data_hash(challenge: &Buf32, challenge_period: TimeTicks) -> Buf32 {
    Hasher::new()
        .buf32(challenge)
        .u64(challenge_period.get())
        .finish()
}

pub fn pending_top_challenge_data_hash(
    after_pending_top: &Buf32,
    max_pending_top: &Buf32,
    pending_left: u64,
) -> Buf32 {
    Hasher::new()
        .buf32(after_pending_top)
        .buf32(max_pending_top)
        .u64(pending_left)
        .finish()
}

pub fn message_challenge_data_hash(
    before_inbox: &Buf32,
    after_inbox: &Buf32,
    before_messages: &Buf32,
    after_messages: &Buf32,
    imported_count: u64,
) -> Buf32 {
    Hasher::new()
        .buf32(before_inbox)
        .buf32(after_inbox)
        .buf32(before_messages)
        .buf32(after_messages)
        .u64(imported_count)
        .finish()
}

pub fn execution_precondition_hash(
    before_machine_hash: &Buf32,
    time_bounds: &TimeBounds,
    before_inbox: &Buf32,
) -> Buf32 {
    Hasher::new()
        .buf32(before_machine_hash)
        .u64(time_bounds.start)
        .u64(time_bounds.end)
        .buf32(before_inbox)
        .finish()
}

pub fn execution_data_hash(num_steps: u64, precondition_hash: &Buf32, assertion_hash: &Buf32) -> Buf32 {
    Hasher::new()
        .u64(num_steps)
        .buf32(precondition_hash)
        .buf32(assertion_hash)
        .finish()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_accum_empty_is_init() {
        let init = raw(b"init");
        assert_eq!(bytes_array_accum_hash(init, Vec::<Vec<u8>>::new()), init);
    }

    #[test]
    fn test_accum_single_message() {
        let init = Buf32::zero();
        let msg = b"hello".to_vec();
        assert_eq!(
            bytes_array_accum_hash(init, [&msg]),
            hash_pair(&init, &raw(&msg))
        );
    }

    #[test]
    fn test_accum_is_order_sensitive() {
        let a = b"a".to_vec();
        let b = b"b".to_vec();
        assert_ne!(
            bytes_array_accum_hash(Buf32::zero(), [&a, &b]),
            bytes_array_accum_hash(Buf32::zero(), [&b, &a])
        );
    }

    proptest! {
        #[test]
        fn proptest_accum_over_concatenation(
            seed in any::<[u8; 32]>(),
            first in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..6),
            second in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..6),
        ) {
            let seed = Buf32::new(seed);
            let joined: Vec<_> = first.iter().chain(second.iter()).collect();
            let whole = bytes_array_accum_hash(seed, joined);
            let running = bytes_array_accum_hash(seed, &first);
            let stepwise = bytes_array_accum_hash(running, &second);
            prop_assert_eq!(whole, stepwise);
        }
    }
}
