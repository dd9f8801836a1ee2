//! Friendship edges between users and like edges between films and users.
//!
//! Both sides of an edge are written in one sled transaction, so a reader
//! never observes a half-applied friendship or like.

use crate::database::{decode, encode, load, serialize_id, store, EntityDb};
use crate::error::{abort, Error, Result};
use crate::model::{Entity, Film, User};
use sled::transaction::{ConflictableTransactionResult, TransactionalTree, Transactional};
use std::collections::BTreeSet;

/// Reverse index: user id -> ids of the films that user liked.
const USER_LIKES: &[u8] = b"user_likes";

fn liked_films(
    index: &TransactionalTree,
    user_id: u64,
) -> ConflictableTransactionResult<BTreeSet<u64>, Error> {
    match index.get(&serialize_id(user_id))? {
        Some(bytes) => decode(&bytes).map_err(abort),
        None => Ok(BTreeSet::new()),
    }
}

fn check_distinct(user_id: u64, other_id: u64) -> Result<()> {
    if user_id == other_id {
        log::warn!("rejected self-referential request for user {}", user_id);
        return Err(Error::invalid_argument(format!(
            "user {} cannot be paired with themselves",
            user_id
        )));
    }
    Ok(())
}

fn edit_friendship(db: &sled::Db, user_id: u64, friend_id: u64, linked: bool) -> Result<()> {
    check_distinct(user_id, friend_id)?;
    let users = db.open_tree(User::TREE)?;
    users.transaction(|users| -> ConflictableTransactionResult<(), Error> {
        let mut user: User = load(users, user_id)?;
        let mut friend: User = load(users, friend_id)?;
        if linked {
            user.friends.insert(friend_id);
            friend.friends.insert(user_id);
        } else {
            user.friends.remove(&friend_id);
            friend.friends.remove(&user_id);
        }
        store(users, &user)?;
        store(users, &friend)
    })?;
    Ok(())
}

fn edit_like(db: &sled::Db, film_id: u64, user_id: u64, liked: bool) -> Result<()> {
    let films = db.open_tree(Film::TREE)?;
    let users = db.open_tree(User::TREE)?;
    let index = db.open_tree(USER_LIKES)?;
    (&films, &users, &index).transaction(
        |(films, users, index)| -> ConflictableTransactionResult<(), Error> {
            let mut film: Film = load(films, film_id)?;
            let _user: User = load(users, user_id)?;
            let mut liked_by_user = liked_films(index, user_id)?;
            if liked {
                film.likes.insert(user_id);
                liked_by_user.insert(film_id);
            } else {
                film.likes.remove(&user_id);
                liked_by_user.remove(&film_id);
            }
            store(films, &film)?;
            if liked_by_user.is_empty() {
                index.remove(&serialize_id(user_id))?;
            } else {
                let encoded = encode(&liked_by_user).map_err(abort)?;
                index.insert(&serialize_id(user_id), encoded)?;
            }
            Ok(())
        },
    )?;
    Ok(())
}

/// Relationship operations over the entity trees.
pub trait RelationDb {
    /// Links both users; fails on self-friendship or unknown ids.
    fn add_friend(&self, user_id: u64, friend_id: u64) -> Result<()>;
    /// Unlinks both users. Removing an absent edge is a no-op.
    fn remove_friend(&self, user_id: u64, friend_id: u64) -> Result<()>;
    fn friends_of(&self, user_id: u64) -> Result<Vec<User>>;
    /// Records a like. Liking twice has no further effect.
    fn add_like(&self, film_id: u64, user_id: u64) -> Result<()>;
    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<()>;
    /// Deletes a user together with every edge pointing at it.
    fn remove_user(&self, user_id: u64) -> Result<User>;
}

impl RelationDb for sled::Db {
    fn add_friend(&self, user_id: u64, friend_id: u64) -> Result<()> {
        edit_friendship(self, user_id, friend_id, true)?;
        log::info!("users {} and {} are now friends", user_id, friend_id);
        Ok(())
    }

    fn remove_friend(&self, user_id: u64, friend_id: u64) -> Result<()> {
        edit_friendship(self, user_id, friend_id, false)?;
        log::info!("users {} and {} are no longer friends", user_id, friend_id);
        Ok(())
    }

    fn friends_of(&self, user_id: u64) -> Result<Vec<User>> {
        let user: User = self.get_entity(user_id)?;
        self.entities_by_ids(&user.friends)
    }

    fn add_like(&self, film_id: u64, user_id: u64) -> Result<()> {
        edit_like(self, film_id, user_id, true)?;
        log::info!("user {} liked film {}", user_id, film_id);
        Ok(())
    }

    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<()> {
        edit_like(self, film_id, user_id, false)?;
        log::info!("user {} removed like from film {}", user_id, film_id);
        Ok(())
    }

    fn remove_user(&self, user_id: u64) -> Result<User> {
        let users = self.open_tree(User::TREE)?;
        let films = self.open_tree(Film::TREE)?;
        let index = self.open_tree(USER_LIKES)?;
        let removed = (&users, &films, &index).transaction(
            |(users, films, index)| -> ConflictableTransactionResult<User, Error> {
                let user: User = load(users, user_id)?;
                for friend_id in &user.friends {
                    let mut friend: User = load(users, *friend_id)?;
                    friend.friends.remove(&user_id);
                    store(users, &friend)?;
                }
                for film_id in liked_films(index, user_id)? {
                    let mut film: Film = load(films, film_id)?;
                    film.likes.remove(&user_id);
                    store(films, &film)?;
                }
                users.remove(&serialize_id(user_id))?;
                index.remove(&serialize_id(user_id))?;
                Ok(user)
            },
        )?;
        log::info!("deleted user {}", user_id);
        Ok(removed)
    }
}
