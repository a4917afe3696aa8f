//! Generates the ops shims that put a database trait behind a thread pool.
//!
//! Every operation `foo` of a wrapped database gets three entry points on the generated ops
//! type: `foo_blocking` runs on the caller's thread, `foo_chan` queues the call on the pool and
//! returns a receiver, and `foo_async` awaits that receiver.

use thiserror::Error;

/// Receiver for the result of an operation queued on the pool.
pub type GenericRecv<T, E> = tokio::sync::oneshot::Receiver<Result<T, E>>;

#[derive(Debug, Clone, Error)]
pub enum OpsError {
    /// The worker dropped the response channel without answering, most likely by panicking.
    #[error("worker failed strangely")]
    WorkerFailedStrangely,
}

/// Generates an ops type over a context, given shim functions `fn name(&Context, args..)` that
/// are already in scope.
///
/// ```ignore
/// inst_ops! {
///     (CheckpointDbOps, Context<D: CheckpointDatabase>, DbError) {
///         get_block(id: BlockId) => Option<CheckpointWithManifest>;
///         delete_block(id: BlockId) => bool;
///     }
/// }
/// ```
#[macro_export]
macro_rules! inst_ops {
    {
        ($base:ident, $ctx:ident $(<$($tparam:ident: $tpconstr:tt),+>)?, $error:ty) {
            $($iname:ident($($aname:ident: $aty:ty),*) => $ret:ty;)*
        }
    } => {
        #[expect(missing_debug_implementations, reason = "the shim is a trait object")]
        pub struct $base {
            pool: $crate::_threadpool::ThreadPool,
            inner: ::std::sync::Arc<dyn ShimTrait>,
        }

        $crate::_paste::paste! {
            impl $base {
                pub fn new $(<$($tparam: $tpconstr + Sync + Send + 'static),+>)? (
                    pool: $crate::_threadpool::ThreadPool,
                    ctx: ::std::sync::Arc<$ctx $(<$($tparam),+>)?>,
                ) -> Self {
                    Self {
                        pool,
                        inner: ::std::sync::Arc::new(Inner { ctx }),
                    }
                }

                $(
                    pub async fn [<$iname _async>] (&self, $($aname: $aty),*) -> Result<$ret, $error> {
                        let resp_rx = self.inner.[<$iname _chan>](&self.pool, $($aname),*);
                        match resp_rx.await {
                            Ok(v) => v,
                            Err(_) => Err(<$error>::from($crate::exec::OpsError::WorkerFailedStrangely)),
                        }
                    }

                    pub fn [<$iname _blocking>] (&self, $($aname: $aty),*) -> Result<$ret, $error> {
                        self.inner.[<$iname _blocking>]($($aname),*)
                    }

                    pub fn [<$iname _chan>] (&self, $($aname: $aty),*) -> $crate::exec::GenericRecv<$ret, $error> {
                        self.inner.[<$iname _chan>](&self.pool, $($aname),*)
                    }
                )*
            }

            trait ShimTrait: Sync + Send + 'static {
                $(
                    fn [<$iname _blocking>] (&self, $($aname: $aty),*) -> Result<$ret, $error>;
                    fn [<$iname _chan>] (
                        &self,
                        pool: &$crate::_threadpool::ThreadPool,
                        $($aname: $aty),*
                    ) -> $crate::exec::GenericRecv<$ret, $error>;
                )*
            }

            #[derive(Debug)]
            struct Inner $(<$($tparam: $tpconstr + Sync + Send + 'static),+>)? {
                ctx: ::std::sync::Arc<$ctx $(<$($tparam),+>)?>,
            }

            impl $(<$($tparam: $tpconstr + Sync + Send + 'static),+>)? ShimTrait for Inner $(<$($tparam),+>)? {
                $(
                    fn [<$iname _blocking>] (&self, $($aname: $aty),*) -> Result<$ret, $error> {
                        $iname(&self.ctx, $($aname),*)
                    }

                    fn [<$iname _chan>] (
                        &self,
                        pool: &$crate::_threadpool::ThreadPool,
                        $($aname: $aty),*
                    ) -> $crate::exec::GenericRecv<$ret, $error> {
                        let (resp_tx, resp_rx) = $crate::_tokio::sync::oneshot::channel();
                        let ctx = self.ctx.clone();

                        pool.execute(move || {
                            let res = $iname(&ctx, $($aname),*);
                            if resp_tx.send(res).is_err() {
                                $crate::_tracing::warn!(op = stringify!($iname), "caller dropped the response channel");
                            }
                        });

                        resp_rx
                    }
                )*
            }
        }
    }
}

/// Like [`inst_ops!`], but also generates a `Context<D>` holding the database and a shim for
/// every operation that forwards to the method of the same name on `D`.
///
/// ```ignore
/// inst_ops_generic! {
///     (<D: CheckpointDatabase> => CheckpointDbOps, DbError) {
///         get_block(id: BlockId) => Option<CheckpointWithManifest>;
///     }
/// }
/// ```
///
/// The error type has to implement `From<OpsError>`.
#[macro_export]
macro_rules! inst_ops_generic {
    {
        (< $tparam:ident: $tpconstr:tt > => $base:ident, $error:ty) {
            $($iname:ident($($aname:ident: $aty:ty),*) => $ret:ty;)*
        }
    } => {
        #[derive(Debug)]
        pub struct Context<$tparam: $tpconstr> {
            db: ::std::sync::Arc<$tparam>,
        }

        impl<$tparam: $tpconstr + Sync + Send + 'static> Context<$tparam> {
            pub fn new(db: ::std::sync::Arc<$tparam>) -> Self {
                Self { db }
            }

            pub fn into_ops(self, pool: $crate::_threadpool::ThreadPool) -> $base {
                $base::new(pool, ::std::sync::Arc::new(self))
            }
        }

        $crate::inst_ops! {
            ($base, Context<$tparam: $tpconstr>, $error) {
                $($iname($($aname: $aty),*) => $ret;)*
            }
        }

        $(
            $crate::inst_ops_ctx_shim_generic!($iname<$tparam: $tpconstr>($($aname: $aty),*) -> $ret, $error);
        )*
    }
}

/// Shim forwarding an operation to the database held by a `Context`.
#[macro_export]
macro_rules! inst_ops_ctx_shim_generic {
    ($iname:ident<$tparam:ident: $tpconstr:tt>($($aname:ident: $aty:ty),*) -> $ret:ty, $error:ty) => {
        fn $iname<$tparam: $tpconstr>(context: &Context<$tparam>, $($aname: $aty),*) -> Result<$ret, $error> {
            context.db.as_ref().$iname($($aname),*)
        }
    };
}
