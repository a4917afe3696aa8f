//! Schema-typed views over raw sled trees.

use std::{fmt, marker::PhantomData};

use arbor_db_types::{DbError, DbResult};
use borsh::{BorshDeserialize, BorshSerialize};
use sled::{
    transaction::{ConflictableTransactionResult, TransactionResult, TransactionalTree},
    Transactional,
};

use crate::{
    lexicographic::{decode_key, encode_key, LexicographicKey},
    utils::{abort_codec, to_db_error},
};

/// Binds a tree name to its key and value types.
pub(crate) trait Schema: fmt::Debug {
    const TREE_NAME: &'static str;
    type Key: LexicographicKey;
    type Value: BorshSerialize + BorshDeserialize;
}

fn decode_value<S: Schema>(bytes: &[u8]) -> DbResult<S::Value> {
    borsh::from_slice(bytes).map_err(DbError::codec)
}

fn encode_value<S: Schema>(value: &S::Value) -> DbResult<Vec<u8>> {
    borsh::to_vec(value).map_err(DbError::codec)
}

#[derive(Debug)]
pub(crate) struct SledTree<S: Schema> {
    inner: sled::Tree,
    _phantom: PhantomData<S>,
}

impl<S: Schema> SledTree<S> {
    pub(crate) fn open(db: &sled::Db) -> DbResult<Self> {
        let inner = db.open_tree(S::TREE_NAME).map_err(to_db_error)?;
        Ok(Self {
            inner,
            _phantom: PhantomData,
        })
    }

    pub(crate) fn get(&self, key: &S::Key) -> DbResult<Option<S::Value>> {
        self.inner
            .get(encode_key(key))
            .map_err(to_db_error)?
            .map(|v| decode_value::<S>(&v))
            .transpose()
    }

    pub(crate) fn insert(&self, key: &S::Key, value: &S::Value) -> DbResult<()> {
        self.inner
            .insert(encode_key(key), encode_value::<S>(value)?)
            .map_err(to_db_error)?;
        self.flush()
    }

    /// Removes the key, returning whether it was present.
    pub(crate) fn remove(&self, key: &S::Key) -> DbResult<bool> {
        let old = self.inner.remove(encode_key(key)).map_err(to_db_error)?;
        self.flush()?;
        Ok(old.is_some())
    }

    pub(crate) fn flush(&self) -> DbResult<()> {
        self.inner.flush().map_err(to_db_error)?;
        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn first_key(&self) -> DbResult<Option<S::Key>> {
        self.inner
            .first()
            .map_err(to_db_error)?
            .map(|(k, _)| decode_key(&k).map_err(DbError::codec))
            .transpose()
    }

    pub(crate) fn last_key(&self) -> DbResult<Option<S::Key>> {
        self.inner
            .last()
            .map_err(to_db_error)?
            .map(|(k, _)| decode_key(&k).map_err(DbError::codec))
            .transpose()
    }

    /// Keys between `start` and `end`, both inclusive, in key order.
    pub(crate) fn keys_in_range(&self, start: &S::Key, end: &S::Key) -> DbResult<Vec<S::Key>> {
        self.inner
            .range(encode_key(start)..=encode_key(end))
            .keys()
            .map(|k| {
                let k = k.map_err(to_db_error)?;
                decode_key(&k).map_err(DbError::codec)
            })
            .collect()
    }
}

/// A schema-typed tree inside a sled transaction.
pub(crate) struct SledTransactionalTree<S: Schema> {
    inner: TransactionalTree,
    _phantom: PhantomData<S>,
}

impl<S: Schema> SledTransactionalTree<S> {
    fn new(inner: TransactionalTree) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    pub(crate) fn get(
        &self,
        key: &S::Key,
    ) -> ConflictableTransactionResult<Option<S::Value>, DbError> {
        match self.inner.get(encode_key(key))? {
            Some(bytes) => borsh::from_slice(&bytes).map(Some).map_err(abort_codec),
            None => Ok(None),
        }
    }

    pub(crate) fn insert(
        &self,
        key: &S::Key,
        value: &S::Value,
    ) -> ConflictableTransactionResult<(), DbError> {
        let value = borsh::to_vec(value).map_err(abort_codec)?;
        self.inner.insert(encode_key(key), value)?;
        Ok(())
    }

    pub(crate) fn remove(&self, key: &S::Key) -> ConflictableTransactionResult<(), DbError> {
        self.inner.remove(encode_key(key))?;
        Ok(())
    }
}

/// Runs a closure over several typed trees in one sled transaction.
pub(crate) trait SledTransactional {
    type View;

    fn transaction<F, R, E>(&self, func: F) -> TransactionResult<R, E>
    where
        F: Fn(Self::View) -> ConflictableTransactionResult<R, E>;
}

macro_rules! impl_sled_transactional {
    ($(($idx:tt, $schema:ident, $var:ident)),+) => {
        impl<$($schema: Schema),+> SledTransactional for ($(&SledTree<$schema>),+,) {
            type View = ($(SledTransactionalTree<$schema>),+,);

            fn transaction<F, R, E>(&self, func: F) -> TransactionResult<R, E>
            where
                F: Fn(Self::View) -> ConflictableTransactionResult<R, E>,
            {
                ($(&self.$idx.inner),+,).transaction(|($($var),+,)| {
                    func(($(SledTransactionalTree::<$schema>::new($var.clone())),+,))
                })
            }
        }
    };
}

impl_sled_transactional!((0, S0, t0));
impl_sled_transactional!((0, S0, t0), (1, S1, t1));
