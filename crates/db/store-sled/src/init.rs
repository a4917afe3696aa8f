use std::{fs, path::Path};

use anyhow::Context;
use tracing::*;

/// Opens the sled database at `datadir/sled/dbname`, creating it if needed.
///
/// With `fresh` set, any existing database at that location is deleted first.
pub fn open_sled_database(datadir: &Path, dbname: &str, fresh: bool) -> anyhow::Result<sled::Db> {
    let database_dir = datadir.join("sled").join(dbname);

    if fresh && database_dir.exists() {
        warn!(path = %database_dir.display(), "discarding existing database for a fresh start");
        fs::remove_dir_all(&database_dir).context("removing old sled database")?;
    }

    if !database_dir.exists() {
        fs::create_dir_all(&database_dir)?;
    }

    sled::open(&database_dir).context("opening sled database")
}
