mod crypto;
mod error;
mod master_key;
mod storage;
mod store;

pub use crate::crypto::{KdfParams, decrypt, encrypt};
pub use crate::error::{CryptoError, StoreError};
pub use crate::master_key::MasterKey;
pub use crate::storage::Storage;
use crate::store::{SecretEntry, Store};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;

/// File-backed vault of named secrets.
///
/// Each value is encrypted into its own envelope token on write and decrypted
/// on read; the store file on disk only ever contains tokens. The master key
/// is resolved once by the caller and injected here, immutable for the life
/// of the vault.
pub struct Envault {
    store: Store,
    storage: Storage,
    master_key: MasterKey,
    kdf: KdfParams,
}

impl Envault {
    pub fn init(master_key: MasterKey) -> Result<Self> {
        Self::init_with_storage_and_kdf(master_key, default_storage()?, KdfParams::default())
    }

    pub fn init_with_storage_and_kdf(
        master_key: MasterKey,
        storage: Storage,
        kdf: KdfParams,
    ) -> Result<Self> {
        if storage.exists() {
            bail!("envault store already exists");
        }

        let vault = Self {
            store: Store::new(),
            storage,
            master_key,
            kdf,
        };
        vault.save()?;

        Ok(vault)
    }

    pub fn open(master_key: MasterKey) -> Result<Self> {
        Self::open_with_storage_and_kdf(master_key, default_storage()?, KdfParams::default())
    }

    pub fn open_with_storage_and_kdf(
        master_key: MasterKey,
        storage: Storage,
        kdf: KdfParams,
    ) -> Result<Self> {
        if !storage.exists() {
            bail!("envault store does not exist");
        }

        let data = storage.load()?;
        let store = serde_json::from_slice(&data)
            .context("failed to deserialize secret store; possibly corrupted file")?;

        Ok(Self {
            store,
            storage,
            master_key,
            kdf,
        })
    }

    /// Encrypts and stores a new secret under `name`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let token = crypto::encrypt(&self.master_key, self.kdf, value)?;
        self.store.set(name, &token)?;
        Ok(())
    }

    /// Decrypts the secret stored under `name`, if any.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        match self.store.token(name) {
            Some(token) => Ok(Some(crypto::decrypt(&self.master_key, self.kdf, token)?)),
            None => Ok(None),
        }
    }

    /// Re-encrypts an existing secret with a new value.
    pub fn update(&mut self, name: &str, new_value: &str) -> Result<()> {
        let token = crypto::encrypt(&self.master_key, self.kdf, new_value)?;
        self.store.update(name, &token)?;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.store.remove(name)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<&String> {
        self.store.names().collect()
    }

    pub fn entries(&self) -> Vec<&SecretEntry> {
        self.store.entries().collect()
    }

    /// Decrypts every stored secret.
    ///
    /// A record whose token fails to decrypt is reported in place as an `Err`
    /// and logged; it never aborts the rest of the batch.
    pub fn reveal_all(&self) -> Vec<(&SecretEntry, std::result::Result<String, CryptoError>)> {
        self.store
            .entries()
            .map(|entry| {
                let value = crypto::decrypt(&self.master_key, self.kdf, entry.token());
                if let Err(err) = &value {
                    log::warn!("secret '{}' could not be decrypted: {err}", entry.name());
                }
                (entry, value)
            })
            .collect()
    }

    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.store)?;
        self.storage.save(&data)?;
        Ok(())
    }

    pub fn info(&self) -> String {
        format!(
            "store:   {}\ncreated: {}\nsecrets: {}",
            self.storage.path().display(),
            self.store.creation_date(),
            self.store.len()
        )
    }
}

pub fn default_storage() -> Result<Storage> {
    let project_dirs =
        ProjectDirs::from("", "", "envault").context("could not determine platform directories")?;

    let path = project_dirs.data_dir().join("secrets.json");

    Ok(Storage::new(path))
}
