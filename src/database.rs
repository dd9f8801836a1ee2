use crate::error::{abort, Error, Result};
use crate::model::Entity;
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::{ConflictableTransactionResult, TransactionalTree, Transactional};
use std::collections::BTreeSet;
use std::convert::TryInto;

/// Per-kind id counters.
const META: &[u8] = b"meta";

/// Ids are stored big-endian so tree iteration follows id order.
pub fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Result<u64> {
    let bytes: [u8; 8] = id
        .as_ref()
        .try_into()
        .map_err(|_| Error::Corrupted(format!("id of {} bytes", id.as_ref().len())))?;
    Ok(u64::from_be_bytes(bytes))
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Loads a record inside a transaction, aborting with `NotFound` on a miss.
pub fn load<T: Entity>(
    tree: &TransactionalTree,
    id: u64,
) -> ConflictableTransactionResult<T, Error> {
    match tree.get(&serialize_id(id))? {
        Some(bytes) => decode(&bytes).map_err(abort),
        None => Err(abort(Error::not_found(T::KIND, id))),
    }
}

/// Writes a record inside a transaction.
pub fn store<T: Entity>(
    tree: &TransactionalTree,
    entity: &T,
) -> ConflictableTransactionResult<(), Error> {
    tree.insert(&serialize_id(entity.id()), encode(entity).map_err(abort)?)?;
    Ok(())
}

/// Keyed storage of entities with store-assigned sequential ids.
pub trait EntityDb {
    /// Ignores the caller's id and assigns the next one, starting at 1.
    fn create_entity<T: Entity>(&self, entity: T) -> Result<T>;
    /// Replaces an existing record; relationship sets already stored are kept.
    fn update_entity<T: Entity>(&self, entity: T) -> Result<T>;
    fn get_entity<T: Entity>(&self, id: u64) -> Result<T>;
    /// All records in id order.
    fn all_entities<T: Entity>(&self) -> Result<Vec<T>>;
    /// Records for `ids` in id order; any unknown id is an error.
    fn entities_by_ids<T: Entity>(&self, ids: &BTreeSet<u64>) -> Result<Vec<T>>;
}

impl EntityDb for sled::Db {
    fn create_entity<T: Entity>(&self, entity: T) -> Result<T> {
        let tree = self.open_tree(T::TREE)?;
        let meta = self.open_tree(META)?;
        let created = (&tree, &meta).transaction(
            |(tree, meta)| -> ConflictableTransactionResult<T, Error> {
                let last = match meta.get(T::KIND.as_bytes())? {
                    Some(bytes) => deserialize_id(bytes).map_err(abort)?,
                    None => 0,
                };
                let id = last + 1;
                meta.insert(T::KIND.as_bytes(), &serialize_id(id))?;
                let mut created = entity.clone();
                created.set_id(id);
                store(tree, &created)?;
                Ok(created)
            },
        )?;
        log::info!("created {} {}", T::KIND, created.id());
        Ok(created)
    }

    fn update_entity<T: Entity>(&self, entity: T) -> Result<T> {
        let tree = self.open_tree(T::TREE)?;
        let updated = tree.transaction(|tree| -> ConflictableTransactionResult<T, Error> {
            let stored: T = load(tree, entity.id())?;
            let mut updated = entity.clone();
            updated.keep_relations(&stored);
            store(tree, &updated)?;
            Ok(updated)
        })?;
        log::info!("updated {} {}", T::KIND, updated.id());
        Ok(updated)
    }

    fn get_entity<T: Entity>(&self, id: u64) -> Result<T> {
        let tree = self.open_tree(T::TREE)?;
        match tree.get(serialize_id(id))? {
            Some(bytes) => decode(&bytes),
            None => {
                log::debug!("{} {} not found", T::KIND, id);
                Err(Error::not_found(T::KIND, id))
            }
        }
    }

    fn all_entities<T: Entity>(&self) -> Result<Vec<T>> {
        let tree = self.open_tree(T::TREE)?;
        tree.iter()
            .values()
            .map(|bytes| decode(&bytes?))
            .collect()
    }

    fn entities_by_ids<T: Entity>(&self, ids: &BTreeSet<u64>) -> Result<Vec<T>> {
        ids.iter().map(|id| self.get_entity(*id)).collect()
    }
}
