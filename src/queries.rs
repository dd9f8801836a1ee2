//! Read-only views derived from entities and their edges.

use crate::database::EntityDb;
use crate::error::{Error, Result};
use crate::model::{Film, User};
use std::collections::BTreeSet;

pub const DEFAULT_POPULAR_COUNT: &str = "10";

/// Parses the `count` parameter of the popular films query.
pub fn parse_count(count: &str) -> Result<usize> {
    count.trim().parse().map_err(|_| {
        Error::invalid_argument(format!(
            "count must be a non-negative integer, got {:?}",
            count
        ))
    })
}

pub trait QueryDb {
    /// At most `count` films by descending like count; equal counts keep id order.
    fn popular_films(&self, count: usize) -> Result<Vec<Film>>;
    /// Users who are friends of both `user_id` and `other_id`.
    fn common_friends(&self, user_id: u64, other_id: u64) -> Result<Vec<User>>;
}

impl QueryDb for sled::Db {
    fn popular_films(&self, count: usize) -> Result<Vec<Film>> {
        let mut films: Vec<Film> = self.all_entities()?;
        films.sort_by(|a, b| b.rate().cmp(&a.rate()));
        films.truncate(count);
        Ok(films)
    }

    fn common_friends(&self, user_id: u64, other_id: u64) -> Result<Vec<User>> {
        if user_id == other_id {
            return Err(Error::invalid_argument(format!(
                "common friends of user {} with themselves",
                user_id
            )));
        }
        let user: User = self.get_entity(user_id)?;
        let other: User = self.get_entity(other_id)?;
        let common: BTreeSet<u64> = user
            .friends
            .intersection(&other.friends)
            .copied()
            .collect();
        log::debug!(
            "users {} and {} share {} friends",
            user_id,
            other_id,
            common.len()
        );
        self.entities_by_ids(&common)
    }
}
