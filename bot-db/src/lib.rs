pub mod guild_settings;

use std::{fmt::Debug, path::Path};

use bot_traits::ForwardRefToTracing;
use color_eyre::eyre::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use sled::{Db, Tree};

pub trait ReadWriteTree {
    fn typed_insert<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<()>;

    fn typed_get<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
    ) -> Result<Option<V>>;

    fn typed_get_or_default<
        K: DeserializeOwned + Serialize,
        V: DeserializeOwned + Serialize + Default,
    >(
        &self,
        key: &K,
    ) -> Result<V> {
        Ok(self.typed_get::<K, V>(key)?.unwrap_or_default())
    }

    /// Atomically applies `update_function` to the stored value (or the default) and returns
    /// the new value.
    ///
    /// `update_function` can run more than once if another writer races us.
    fn typed_update<
        K: DeserializeOwned + Serialize,
        V: DeserializeOwned + Serialize + Default + Debug,
    >(
        &self,
        key: &K,
        update_function: impl FnMut(V) -> V,
    ) -> Result<V>;
}

impl ReadWriteTree for Tree {
    fn typed_insert<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<()> {
        let key = bincode::serialize::<K>(key)?;
        let value = bincode::serialize::<V>(value)?;
        self.insert(key, value)?;
        Ok(())
    }

    fn typed_get<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
    ) -> Result<Option<V>> {
        Ok(self
            .get(bincode::serialize::<K>(key)?)?
            .map(|value| bincode::deserialize::<V>(&value))
            .transpose()?)
    }

    fn typed_update<
        K: DeserializeOwned + Serialize,
        V: DeserializeOwned + Serialize + Default + Debug,
    >(
        &self,
        key: &K,
        mut update_function: impl FnMut(V) -> V,
    ) -> Result<V> {
        let new_value = self.update_and_fetch(bincode::serialize::<K>(key)?, |old_value| {
            SchoolGateDb::create_update_with_deserialization::<V>(
                old_value,
                &mut update_function,
                Default::default,
            )
        })?;

        Ok(new_value
            .map(|value| bincode::deserialize::<V>(&value))
            .transpose()
            .wrap_err("Failed to deserialize updated value")?
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct SchoolGateDb(Db);

impl SchoolGateDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;

        tracing::info!("Opened settings database at {}", path.display());

        Ok(Self(db))
    }

    /// In-memory database, removed on drop.
    pub fn temporary() -> Result<Self> {
        Ok(Self(sled::Config::new().temporary(true).open()?))
    }

    fn create_update_with_deserialization<V: DeserializeOwned + Serialize + Debug>(
        old_value: Option<&[u8]>,
        update_function: impl FnMut(V) -> V,
        mut get_default_value: impl FnMut() -> V,
    ) -> Option<Vec<u8>> {
        old_value
            .map_or_else(
                || Ok(get_default_value()),
                |v| bincode::deserialize::<V>(v).wrap_err("Failed to deserialize"),
            )
            .trace_err_ok()
            .map(update_function)
            .map(|new_value| bincode::serialize::<V>(&new_value).wrap_err("Failed to serialize"))
            .transpose()
            .trace_err_ok()
            .flatten()
            .or_else(|| old_value.map(|v| v.to_vec()))
    }

    fn open_tree(&self, name: impl AsRef<[u8]>) -> Result<Tree> {
        self.0.open_tree(name).wrap_err("Failed to open tree")
    }

    pub async fn flush(&self) -> Result<()> {
        self.0
            .flush_async()
            .await
            .map(|_| ())
            .wrap_err("Failed to flush database")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn typed_round_trip() {
        let db = SchoolGateDb::temporary().unwrap();
        let tree = db.open_tree("test").unwrap();

        tree.typed_insert::<u64, String>(&7, &"seven".to_owned())
            .unwrap();

        assert_eq!(
            tree.typed_get::<u64, String>(&7).unwrap().as_deref(),
            Some("seven")
        );
        assert_eq!(tree.typed_get::<u64, String>(&8).unwrap(), None);
    }

    #[test]
    fn update_starts_from_default() {
        let db = SchoolGateDb::temporary().unwrap();
        let tree = db.open_tree("counts").unwrap();

        let first = tree.typed_update::<u64, u32>(&1, |count| count + 1).unwrap();
        let second = tree.typed_update::<u64, u32>(&1, |count| count + 1).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(tree.typed_get_or_default::<u64, u32>(&2).unwrap(), 0);
    }
}
