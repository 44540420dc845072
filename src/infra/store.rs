use std::path::PathBuf;

use color_eyre::eyre::Result;
use heed::{Database, Env, EnvOpenOptions, types::*};
use serde::{Deserialize, Serialize};

use crate::{config::get_data_dir, infra::identity::Identity};

const METADATA_DB: &str = "metadata";
const IDENTITY_KEY: &str = "identity";

/// Wrapper around LMDB database for persistent storage.
#[derive(Clone)]
pub struct Store {
    env: Env,
}

impl Store {
    pub fn new() -> Result<Self> {
        Self::with_path(get_data_dir().join("wallet.mdb"))
    }

    pub fn with_path(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(10 * 1024 * 1024) // 10MB
                .max_dbs(4)
                .open(path)?
        };
        Ok(Self { env })
    }

    /// Persist the delegated identity so the next start can restore it.
    pub fn save_identity(&self, identity: &Identity) -> Result<()> {
        self.save_metadata(IDENTITY_KEY, identity)
    }

    pub fn load_identity(&self) -> Result<Option<Identity>> {
        self.load_metadata(IDENTITY_KEY)
    }

    pub fn clear_identity(&self) -> Result<()> {
        self.delete_metadata(IDENTITY_KEY)
    }

    pub fn save_metadata<T: Serialize + 'static>(&self, key: &str, value: &T) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: Database<Str, SerdeRmp<T>> =
            self.env.create_database(&mut wtxn, Some(METADATA_DB))?;
        db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn load_metadata<T: for<'de> Deserialize<'de> + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        let rtxn = self.env.read_txn()?;
        let db: Option<Database<Str, SerdeRmp<T>>> =
            self.env.open_database(&rtxn, Some(METADATA_DB))?;

        match db {
            Some(db) => Ok(db.get(&rtxn, key)?),
            None => Ok(None),
        }
    }

    pub fn delete_metadata(&self, key: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: Database<Str, Bytes> = self.env.create_database(&mut wtxn, Some(METADATA_DB))?;
        db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(())
    }
}
