/// Declares a sled-backed database as a set of typed trees plus the shared config.
#[macro_export]
macro_rules! define_sled_database {
    (
        $(#[$meta:meta])*
        pub struct $db_name:ident {
            $($field:ident: $schema:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $db_name {
            $(
                $field: $crate::tree::SledTree<$schema>,
            )*
            config: $crate::SledDbConfig,
        }

        impl $db_name {
            pub fn new(
                db: &::sled::Db,
                config: $crate::SledDbConfig,
            ) -> ::arbor_db_types::DbResult<Self> {
                Ok(Self {
                    $(
                        $field: $crate::tree::SledTree::open(db)?,
                    )*
                    config,
                })
            }
        }
    };
}

/// Declares a schema type for a tree.
#[macro_export]
macro_rules! define_table {
    ($(#[$docs:meta])+ ($table_name:ident) $key:ty => $value:ty) => {
        $(#[$docs])+
        #[derive(Clone, Copy, Debug, Default)]
        pub(crate) struct $table_name;

        impl $crate::tree::Schema for $table_name {
            const TREE_NAME: &'static str = ::core::stringify!($table_name);
            type Key = $key;
            type Value = $value;
        }
    };
}

/// Instantiates a shared database test suite against a temporary sled database.
#[macro_export]
macro_rules! sled_db_test_setup {
    ($db_type:ty, $test_macro:ident) => {
        fn setup_db() -> $db_type {
            let db = sled::Config::new().temporary(true).open().unwrap();
            let config = $crate::SledDbConfig::test();
            <$db_type>::new(&db, config).unwrap()
        }

        $test_macro!(setup_db());
    };
}
