use crate::catalog;
use crate::database::EntityDb;
use crate::error::{Error, Result, ValidationError};
use crate::model::{Film, FilmForm, User, UserForm};
use crate::queries::{self, QueryDb};
use crate::relations::RelationDb;
use crate::validation;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

type Db = web::Data<sled::Db>;

fn rejected(err: ValidationError) -> Error {
    log::warn!("rejected payload: {}", err);
    Error::Validation(err)
}

/// Extractor outcome, so malformed input is reported with the JSON error body.
type Extracted<T> = std::result::Result<T, actix_web::Error>;

fn malformed(what: &str, err: actix_web::Error) -> Error {
    log::warn!("malformed {}: {}", what, err);
    Error::invalid_argument(format!("malformed {}: {}", what, err))
}

fn body<T>(form: Extracted<web::Json<T>>) -> Result<T> {
    form.map(web::Json::into_inner)
        .map_err(|err| malformed("request body", err))
}

fn segments<T>(path: Extracted<web::Path<T>>) -> Result<T> {
    path.map(web::Path::into_inner)
        .map_err(|err| malformed("path", err))
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn create_user(form: Extracted<web::Json<UserForm>>, db: Db) -> Result<HttpResponse> {
    let user = validation::user(body(form)?, today()).map_err(rejected)?;
    Ok(HttpResponse::Ok().json(db.create_entity(user)?))
}

async fn update_user(form: Extracted<web::Json<UserForm>>, db: Db) -> Result<HttpResponse> {
    let user = validation::user(body(form)?, today()).map_err(rejected)?;
    Ok(HttpResponse::Ok().json(db.update_entity(user)?))
}

async fn all_users(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.all_entities::<User>()?))
}

async fn get_user(path: Extracted<web::Path<u64>>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.get_entity::<User>(segments(path)?)?))
}

async fn remove_user(path: Extracted<web::Path<u64>>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.remove_user(segments(path)?)?))
}

async fn add_friend(path: Extracted<web::Path<(u64, u64)>>, db: Db) -> Result<HttpResponse> {
    let (id, friend_id) = segments(path)?;
    db.add_friend(id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_friend(path: Extracted<web::Path<(u64, u64)>>, db: Db) -> Result<HttpResponse> {
    let (id, friend_id) = segments(path)?;
    db.remove_friend(id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn friends(path: Extracted<web::Path<u64>>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.friends_of(segments(path)?)?))
}

async fn common_friends(path: Extracted<web::Path<(u64, u64)>>, db: Db) -> Result<HttpResponse> {
    let (id, other_id) = segments(path)?;
    Ok(HttpResponse::Ok().json(db.common_friends(id, other_id)?))
}

async fn create_film(form: Extracted<web::Json<FilmForm>>, db: Db) -> Result<HttpResponse> {
    let film = validation::film(body(form)?).map_err(rejected)?;
    Ok(HttpResponse::Ok().json(db.create_entity(film)?))
}

async fn update_film(form: Extracted<web::Json<FilmForm>>, db: Db) -> Result<HttpResponse> {
    let film = validation::film(body(form)?).map_err(rejected)?;
    Ok(HttpResponse::Ok().json(db.update_entity(film)?))
}

async fn all_films(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.all_entities::<Film>()?))
}

async fn get_film(path: Extracted<web::Path<u64>>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.get_entity::<Film>(segments(path)?)?))
}

async fn add_like(path: Extracted<web::Path<(u64, u64)>>, db: Db) -> Result<HttpResponse> {
    let (id, user_id) = segments(path)?;
    db.add_like(id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_like(path: Extracted<web::Path<(u64, u64)>>, db: Db) -> Result<HttpResponse> {
    let (id, user_id) = segments(path)?;
    db.remove_like(id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

fn default_count() -> String {
    queries::DEFAULT_POPULAR_COUNT.to_owned()
}

#[derive(Deserialize)]
struct PopularParams {
    #[serde(default = "default_count")]
    count: String,
}

async fn popular_films(params: web::Query<PopularParams>, db: Db) -> Result<HttpResponse> {
    let count = queries::parse_count(&params.count)?;
    Ok(HttpResponse::Ok().json(db.popular_films(count)?))
}

async fn genres() -> HttpResponse {
    HttpResponse::Ok().json(catalog::genres())
}

async fn genre(path: Extracted<web::Path<u64>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::genre(segments(path)?)?))
}

async fn mpa_ratings() -> HttpResponse {
    HttpResponse::Ok().json(catalog::mpa_ratings())
}

async fn mpa(path: Extracted<web::Path<u64>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::mpa(segments(path)?)?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::post().to(create_user))
        .route("/users", web::put().to(update_user))
        .route("/users", web::get().to(all_users))
        .route("/users/{id}", web::get().to(get_user))
        .route("/users/{id}", web::delete().to(remove_user))
        .route("/users/{id}/friends", web::get().to(friends))
        .route(
            "/users/{id}/friends/common/{other_id}",
            web::get().to(common_friends),
        )
        .route("/users/{id}/friends/{friend_id}", web::put().to(add_friend))
        .route(
            "/users/{id}/friends/{friend_id}",
            web::delete().to(remove_friend),
        )
        // before /films/{id}, which would otherwise swallow it
        .route("/films/popular", web::get().to(popular_films))
        .route("/films", web::post().to(create_film))
        .route("/films", web::put().to(update_film))
        .route("/films", web::get().to(all_films))
        .route("/films/{id}", web::get().to(get_film))
        .route("/films/{id}/like/{user_id}", web::put().to(add_like))
        .route("/films/{id}/like/{user_id}", web::delete().to(remove_like))
        .route("/genres", web::get().to(genres))
        .route("/genres/{id}", web::get().to(genre))
        .route("/mpa", web::get().to(mpa_ratings))
        .route("/mpa/{id}", web::get().to(mpa));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temporary_db;
    use crate::model::Genre;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn user_json(login: &str) -> serde_json::Value {
        json!({
            "email": format!("{}@example.com", login),
            "login": login,
            "birthday": "1980-11-12"
        })
    }

    fn film_json(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "description": "Two hitmen and a briefcase",
            "releaseDate": "1994-10-14",
            "duration": 154,
            "mpa": { "id": 4 },
            "genres": [{ "id": 2 }]
        })
    }

    #[actix_rt::test]
    async fn create_and_fetch_user() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&user_json("ken"))
            .to_request();
        let created: User = test::read_response_json(&mut app, req).await;
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "ken");

        let req = test::TestRequest::get().uri("/users/1").to_request();
        let fetched: User = test::read_response_json(&mut app, req).await;
        assert_eq!(fetched, created);

        let req = test::TestRequest::get().uri("/users/2").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn invalid_user_is_rejected() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&json!({ "email": "a.com", "login": "ken" }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/users").to_request();
        let users: Vec<User> = test::read_response_json(&mut app, req).await;
        assert!(users.is_empty());
    }

    #[actix_rt::test]
    async fn update_unknown_user_is_not_found() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;
        let mut body = user_json("ken");
        body["id"] = json!(9);
        let req = test::TestRequest::put()
            .uri("/users")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn friendship_round_trip() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;
        for login in &["alice", "bob", "carol"] {
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(&user_json(login))
                .to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        for path in &["/users/1/friends/3", "/users/2/friends/3"] {
            let req = test::TestRequest::put().uri(path).to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/users/3/friends").to_request();
        let friends: Vec<User> = test::read_response_json(&mut app, req).await;
        let ids: Vec<u64> = friends.iter().map(|user| user.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let req = test::TestRequest::get()
            .uri("/users/1/friends/common/2")
            .to_request();
        let common: Vec<User> = test::read_response_json(&mut app, req).await;
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].login, "carol");

        let req = test::TestRequest::delete()
            .uri("/users/1/friends/3")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/users/1/friends").to_request();
        let friends: Vec<User> = test::read_response_json(&mut app, req).await;
        assert!(friends.is_empty());

        let req = test::TestRequest::put()
            .uri("/users/1/friends/1")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn films_likes_and_popularity() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&film_json("Pulp Fiction"))
            .to_request();
        let created: Film = test::read_response_json(&mut app, req).await;
        assert_eq!(created.id, 1);
        assert_eq!(created.mpa.as_ref().map(|mpa| mpa.name.as_str()), Some("R"));
        assert_eq!(
            created.genres,
            vec![Genre {
                id: 2,
                name: "Drama".to_owned()
            }]
        );

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&film_json("Jackie Brown"))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&user_json("ken"))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        for _ in 0..2 {
            let req = test::TestRequest::put().uri("/films/2/like/1").to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/films/popular?count=1")
            .to_request();
        let popular: Vec<Film> = test::read_response_json(&mut app, req).await;
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].name, "Jackie Brown");
        assert_eq!(popular[0].rate(), 1);

        let req = test::TestRequest::get().uri("/films/popular").to_request();
        let popular: Vec<Film> = test::read_response_json(&mut app, req).await;
        assert_eq!(popular.len(), 2);

        let req = test::TestRequest::get()
            .uri("/films/popular?count=-3")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put().uri("/films/2/like/7").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri("/films/2/like/1")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/films/2").to_request();
        let film: Film = test::read_response_json(&mut app, req).await;
        assert_eq!(film.rate(), 0);
    }

    #[actix_rt::test]
    async fn film_validation_boundaries() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let mut too_long = film_json("Long");
        too_long["description"] = json!("x".repeat(201));
        let mut too_early = film_json("Early");
        too_early["releaseDate"] = json!("1895-12-27");
        for body in &[too_long, too_early] {
            let req = test::TestRequest::post()
                .uri("/films")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let mut first_screening = film_json("Arrival of a Train");
        first_screening["releaseDate"] = json!("1895-12-28");
        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&first_screening)
            .to_request();
        let created: Film = test::read_response_json(&mut app, req).await;
        assert_eq!(created.id, 1);
    }

    #[actix_rt::test]
    async fn deleting_user_clears_edges() {
        let db = temporary_db();
        let mut app = test::init_service(App::new().data(db.clone()).configure(configure)).await;
        for login in &["alice", "bob"] {
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(&user_json(login))
                .to_request();
            test::call_service(&mut app, req).await;
        }
        let req = test::TestRequest::put().uri("/users/1/friends/2").to_request();
        test::call_service(&mut app, req).await;

        let req = test::TestRequest::delete().uri("/users/1").to_request();
        let removed: User = test::read_response_json(&mut app, req).await;
        assert_eq!(removed.login, "alice");
        assert!(db.get_entity::<User>(2).unwrap().friends.is_empty());

        let req = test::TestRequest::delete().uri("/users/1").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn malformed_input_gets_json_error() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/users")
            .header("content-type", "application/json")
            .set_payload("{\"email\": ")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("request body"));

        let req = test::TestRequest::get().uri("/users/abc").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("path"));

        let req = test::TestRequest::put()
            .uri("/films/1/like/x")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn catalog_endpoints() {
        let mut app =
            test::init_service(App::new().data(temporary_db()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/genres").to_request();
        let genres: Vec<Genre> = test::read_response_json(&mut app, req).await;
        assert_eq!(genres.len(), 6);

        let req = test::TestRequest::get().uri("/mpa/1").to_request();
        let rating: crate::model::Mpa = test::read_response_json(&mut app, req).await;
        assert_eq!(rating.name, "G");

        let req = test::TestRequest::get().uri("/genres/99").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
