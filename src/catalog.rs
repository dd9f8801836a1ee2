//! Fixed dictionaries of genres and MPA ratings.

use crate::error::{Error, Result};
use crate::model::{Genre, Mpa};

const GENRES: &[(u64, &str)] = &[
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Cartoon"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

const MPA_RATINGS: &[(u64, &str)] = &[(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

fn lookup(table: &[(u64, &'static str)], id: u64) -> Option<&'static str> {
    table
        .iter()
        .find(|(entry_id, _)| *entry_id == id)
        .map(|(_, name)| *name)
}

pub fn genres() -> Vec<Genre> {
    GENRES
        .iter()
        .map(|(id, name)| Genre {
            id: *id,
            name: (*name).to_owned(),
        })
        .collect()
}

pub fn genre(id: u64) -> Result<Genre> {
    lookup(GENRES, id)
        .map(|name| Genre {
            id,
            name: name.to_owned(),
        })
        .ok_or_else(|| Error::not_found("genre", id))
}

pub fn mpa_ratings() -> Vec<Mpa> {
    MPA_RATINGS
        .iter()
        .map(|(id, name)| Mpa {
            id: *id,
            name: (*name).to_owned(),
        })
        .collect()
}

pub fn mpa(id: u64) -> Result<Mpa> {
    lookup(MPA_RATINGS, id)
        .map(|name| Mpa {
            id,
            name: name.to_owned(),
        })
        .ok_or_else(|| Error::not_found("mpa", id))
}
