//! Journal service routes
//!
//! The handlers return the data the (out-of-scope) rendering layer
//! consumes as JSON. Form posts use the field names of the journal's
//! submission forms; trip creation and editing are multipart because they
//! carry media.

use axum::{
    Extension, Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    media::{MEDIA_URL_PREFIX, UploadedFile},
    middleware::{CurrentUser, require_session},
    models::{NewReview, NewTrip, NewUser, User},
    state::AppState,
    token::SESSION_COOKIE,
    validation::{validate_email, validate_password, validate_username},
};

/// Whole-multipart ceiling; individual files are checked against the
/// 15 MiB per-file limit by the media store.
const MAX_MULTIPART_BYTES: usize = 256 * 1024 * 1024;

/// Request for user signup
#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for user signin
#[derive(Deserialize)]
pub struct SigninForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request for review creation
#[derive(Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub content: String,
    pub rating: Option<i32>,
}

/// Request for recording a search term
#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(rename = "searchTerm", default)]
    pub search_term: String,
}

/// Query string for the search-results listing
#[derive(Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub query: String,
}

/// Response for user signup and signin
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Create the router for the journal service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", get(logout))
        .route("/posts", get(list_trips))
        .route("/posts/new", get(new_trip_page).post(create_trip))
        .route("/posts/:id/view", get(view_trip))
        .route("/posts/:id/edit", get(edit_trip_page).post(update_trip))
        .route("/posts/:id/delete", post(delete_trip))
        .route("/posts/:id/reviews", post(add_review))
        .route("/search", post(record_search))
        .route("/searches/search-results", get(search_results))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/signup", get(signup_page).post(signup))
        .route("/signin", get(signin_page).post(signin))
        .merge(protected)
        .nest_service(MEDIA_URL_PREFIX, ServeDir::new(state.media.root_dir()))
        .layer(DefaultBodyLimit::max(MAX_MULTIPART_BYTES))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database_up { "ok" } else { "degraded" },
        "service": "journal-service",
        "database": database_up,
    }))
}

/// Signup form page
pub async fn signup_page() -> impl IntoResponse {
    Json(json!({ "page": "signup" }))
}

/// User signup endpoint: creates the account and establishes a session
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> AppResult<impl IntoResponse> {
    info!("Signup attempt for user: {}", form.username);

    validate_username(&form.username).map_err(AppError::Validation)?;
    validate_email(&form.email).map_err(AppError::Validation)?;
    validate_password(&form.password).map_err(AppError::Validation)?;

    let user = state
        .users
        .create(&NewUser {
            username: form.username,
            email: form.email,
            password: form.password,
        })
        .await?;

    let jar = establish_session(&state, jar, &user)?;
    Ok((jar, (StatusCode::CREATED, Json(UserResponse::from(&user)))))
}

/// Signin form page
pub async fn signin_page() -> impl IntoResponse {
    Json(json!({ "page": "signin" }))
}

/// User signin endpoint
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SigninForm>,
) -> AppResult<impl IntoResponse> {
    info!("Signin attempt for user: {}", form.username);

    if !state.signin_limiter.is_allowed(&form.username).await {
        return Err(AppError::RateLimited);
    }

    let user = state
        .users
        .find_by_username(&form.username)
        .await?
        .ok_or(AppError::UnknownUser)?;

    if !state.users.verify_password(&user, &form.password).await? {
        state.signin_limiter.record_failure(&form.username).await;
        return Err(AppError::InvalidCredentials);
    }

    state.signin_limiter.record_success(&form.username).await;

    let jar = establish_session(&state, jar, &user)?;
    Ok((jar, Json(UserResponse::from(&user))))
}

/// End the current session unconditionally
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Redirect::to("/signin"))
}

/// List the caller's trips with their reviews resolved
pub async fn list_trips(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let trips = state.trips.list_by_owner(user.id).await?;
    Ok(Json(trips))
}

/// View one trip by id; any authenticated user may view any trip
pub async fn view_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let detail = state.trips.get_detail(trip_id).await?;
    Ok(Json(detail))
}

/// Trip creation form page
pub async fn new_trip_page() -> impl IntoResponse {
    Json(json!({ "page": "new-trip" }))
}

/// Create a trip from a multipart submission
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (new_trip, files) = read_trip_submission(multipart).await?;
    let media = state.media.store(files).await?;
    let trip = state.trips.create(user.id, &new_trip, &media).await?;

    info!("User {} created trip {}", user.username, trip.id);
    Ok((StatusCode::CREATED, Json(trip)))
}

/// Edit form page: the trip's current fields, owner only
pub async fn edit_trip_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let trip = state.trips.find_owned(trip_id, user.id).await?;
    Ok(Json(trip))
}

/// Update a trip; media is replaced only when new files were uploaded
pub async fn update_trip(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(trip_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (new_trip, files) = read_trip_submission(multipart).await?;

    let media = if files.is_empty() {
        None
    } else {
        Some(state.media.store(files).await?)
    };

    let trip = state
        .trips
        .update(trip_id, user.id, &new_trip, media.as_ref())
        .await?;

    Ok(Json(trip))
}

/// Delete a trip and its reviews, owner only
pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.trips.delete(trip_id, user.id).await?;
    Ok(Json(json!({ "message": "Trip deleted" })))
}

/// Attach a review to a trip
pub async fn add_review(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Form(form): Form<ReviewForm>,
) -> AppResult<impl IntoResponse> {
    let rating = form
        .rating
        .ok_or_else(|| AppError::Validation("rating is required".to_string()))?;

    let review = state
        .trips
        .add_review(
            trip_id,
            &NewReview {
                content: form.content,
                rating,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Record a search term in the caller's recent-search history.
///
/// An empty term is not recorded; the history keeps its five most recent
/// entries, newest first.
pub async fn record_search(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<SearchForm>,
) -> AppResult<impl IntoResponse> {
    let term = form.search_term.trim();
    if term.is_empty() {
        return Ok(Json(json!({ "recorded": false, "recent_searches": [] })));
    }

    let recent = state.users.record_search(user.id, term).await?;
    Ok(Json(json!({ "recorded": true, "recent_searches": recent })))
}

/// List other users' trips matching the query against country or city
pub async fn search_results(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ResultsQuery>,
) -> AppResult<impl IntoResponse> {
    let results = state.trips.search(user.id, &query.query).await?;
    Ok(Json(results))
}

/// Issue a session token for `user` and set the session cookie
fn establish_session(state: &AppState, jar: CookieJar, user: &User) -> AppResult<CookieJar> {
    let token = state.sessions.issue(user.id, &user.username)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(
            state.sessions.session_ttl() as i64,
        ))
        .build();

    Ok(jar.add(cookie))
}

/// Pull the trip fields and media files out of a multipart submission
async fn read_trip_submission(
    mut multipart: Multipart,
) -> AppResult<(NewTrip, Vec<UploadedFile>)> {
    let mut new_trip = NewTrip {
        country: String::new(),
        city: String::new(),
        start_date: None,
        end_date: None,
        written_text: None,
    };
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "country" => new_trip.country = read_text(field).await?,
            "city" => new_trip.city = read_text(field).await?,
            "startDate" => new_trip.start_date = read_date(field, "startDate").await?,
            "endDate" => new_trip.end_date = read_date(field, "endDate").await?,
            "writtenText" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    new_trip.written_text = Some(text);
                }
            }
            "photos" | "photos[]" | "video" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {}", e))
                })?;

                // Browsers submit empty file inputs as zero-byte parts
                // with no filename; that is "no media supplied".
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }

                files.push(UploadedFile {
                    field: if name == "video" { name } else { "photos".to_string() },
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok((new_trip, files))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))
}

/// An empty date field counts as missing; anything else must parse
async fn read_date(
    field: axum::extract::multipart::Field<'_>,
    name: &'static str,
) -> AppResult<Option<NaiveDate>> {
    let text = read_text(field).await?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{} must be a date in YYYY-MM-DD form", name)))
}
