use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A record with a store-assigned integer identity.
pub trait Entity: Serialize + serde::de::DeserializeOwned + Clone {
    /// Name of the sled tree holding records of this kind.
    const TREE: &'static [u8];
    /// Human readable kind, also used as the id counter key.
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);

    /// Copies relationship sets from the stored record, which a full
    /// replacement must not clobber.
    fn keep_relations(&mut self, stored: &Self);
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub friends: BTreeSet<u64>,
}

impl Entity for User {
    const TREE: &'static [u8] = b"users";
    const KIND: &'static str = "user";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn keep_relations(&mut self, stored: &Self) {
        self.friends = stored.friends.clone();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: u32,
    pub mpa: Option<Mpa>,
    pub genres: Vec<Genre>,
    pub likes: BTreeSet<u64>,
}

impl Film {
    /// Number of users who liked the film.
    pub fn rate(&self) -> usize {
        self.likes.len()
    }
}

impl Entity for Film {
    const TREE: &'static [u8] = b"films";
    const KIND: &'static str = "film";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn keep_relations(&mut self, stored: &Self) {
        self.likes = stored.likes.clone();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mpa {
    pub id: u64,
    pub name: String,
}

/// Reference to a catalog entry by id, as sent by clients.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CatalogRef {
    pub id: u64,
}

/// Incoming user payload, before validation.
#[derive(Deserialize, Debug, Clone)]
pub struct UserForm {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

/// Incoming film payload, before validation.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FilmForm {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i32,
    #[serde(default)]
    pub mpa: Option<CatalogRef>,
    #[serde(default)]
    pub genres: Vec<CatalogRef>,
}
