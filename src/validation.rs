//! Pure checks turning incoming payloads into storable records.

use crate::catalog;
use crate::error::ValidationError;
use crate::model::{Film, FilmForm, Genre, User, UserForm};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::convert::TryFrom;

pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Date of the first public film screening.
pub fn earliest_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

/// Validates a user payload. A missing or blank name falls back to the login.
pub fn user(form: UserForm, today: NaiveDate) -> Result<User, ValidationError> {
    if !form.email.contains('@') {
        return Err(ValidationError::InvalidEmail(form.email));
    }
    if form.login.is_empty() || form.login.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidLogin(form.login));
    }
    if let Some(birthday) = form.birthday {
        if birthday > today {
            return Err(ValidationError::FutureBirthday(birthday));
        }
    }
    let name = match form.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => form.login.clone(),
    };
    Ok(User {
        id: form.id,
        email: form.email,
        login: form.login,
        name,
        birthday: form.birthday,
        friends: BTreeSet::new(),
    })
}

/// Validates a film payload and resolves its catalog references.
pub fn film(form: FilmForm) -> Result<Film, ValidationError> {
    if form.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    let description_len = form.description.chars().count();
    if description_len == 0 || description_len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionLength(description_len));
    }
    if form.release_date < earliest_release_date() {
        return Err(ValidationError::ReleaseDateTooEarly(form.release_date));
    }
    let duration = u32::try_from(form.duration)
        .map_err(|_| ValidationError::NegativeDuration(form.duration))?;
    let mpa = match form.mpa {
        Some(reference) => Some(
            catalog::mpa(reference.id).map_err(|_| ValidationError::UnknownMpa(reference.id))?,
        ),
        None => None,
    };
    let genre_ids: BTreeSet<u64> = form.genres.iter().map(|reference| reference.id).collect();
    let genres = genre_ids
        .into_iter()
        .map(|id| catalog::genre(id).map_err(|_| ValidationError::UnknownGenre(id)))
        .collect::<Result<Vec<Genre>, _>>()?;
    Ok(Film {
        id: form.id,
        name: form.name,
        description: form.description,
        release_date: form.release_date,
        duration,
        mpa,
        genres,
        likes: BTreeSet::new(),
    })
}
