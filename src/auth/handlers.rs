use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CreateUserRequest, TokenRequest, TokenResponse, UpdateMeRequest, UserOut},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, MIN_PASSWORD_LEN},
        repo::{self, is_valid_email, normalize_email, User},
    },
    error::ApiError,
    state::AppState,
};

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

fn check_password(password: &str) -> Result<(), ApiError> {
    // Character count, not byte length; multibyte passwords must not
    // slip under the minimum.
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password below minimum length");
        return Err(ApiError::field(
            "password",
            format!("ensure this field has at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    payload.email = normalize_email(&payload.email);

    if payload.email.is_empty() {
        return Err(ApiError::field("email", "user must have an email address"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::field("email", "enter a valid email address"));
    }
    check_password(&payload.password)?;

    // Registration is public, so the duplicate check is a validation error,
    // not a conflict.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::field(
            "email",
            "user with this email already exists",
        ));
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &payload.email, &hash, &payload.name).await {
        Ok(user) => user,
        // A registration racing past the pre-check still hits the unique
        // index; report it as the same validation failure.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email registered concurrently");
            return Err(ApiError::field(
                "email",
                "user with this email already exists",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

#[instrument(skip(state, payload))]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    if User::find_by_email(&state.db, &email).await?.is_none() {
        warn!(email = %email, "token request for unknown email");
        return Err(ApiError::field("email", "user does not exist"));
    }

    let Some(user) = repo::authenticate(&state.db, &email, &payload.password).await? else {
        warn!(email = %email, "token request with bad credentials");
        return Err(ApiError::field("email", "please provide correct credentials"));
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserOut>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("user not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            check_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        password_hash.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::unauthorized("user not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[test]
    fn password_minimum_counts_characters() {
        assert!(check_password("pass1").is_ok());
        assert!(check_password("pas").is_err());
        // 3 characters but 6 bytes; byte length must not satisfy the minimum
        assert!(check_password("\u{f1}\u{f1}\u{f1}").is_err());
        assert!(check_password("\u{f1}\u{f1}\u{f1}\u{f1}\u{f1}").is_ok());
    }

    #[sqlx::test]
    async fn duplicate_insert_is_a_unique_violation(pool: PgPool) {
        User::create(&pool, "dup@example.com", "hash", "")
            .await
            .expect("first insert");
        let err = User::create(&pool, "dup@example.com", "hash", "")
            .await
            .expect_err("second insert must violate the unique index");
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("unrelated")));
    }

    #[sqlx::test]
    async fn registering_same_email_twice_fails_validation(pool: PgPool) {
        let mut state = AppState::fake();
        state.db = pool;

        let payload = |name: &str| CreateUserRequest {
            email: "a@a.com".into(),
            password: "pass1".into(),
            name: name.into(),
        };

        create_user(State(state.clone()), Json(payload("Alice")))
            .await
            .expect("first registration succeeds");
        let err = create_user(State(state), Json(payload("Imposter")))
            .await
            .expect_err("second registration must fail");
        match err {
            ApiError::Validation(fields) => assert!(fields.contains_key("email")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
