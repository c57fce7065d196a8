use axum::{Extension, Json};

use crate::{User, UserProfile};

/// A route handler that returns the profile of the logged in user.
pub async fn get_current_user(Extension(user): Extension<User>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        UserProfile, endpoints,
        test_utils::{log_in_as, new_test_server},
    };

    #[tokio::test]
    async fn returns_logged_in_user() {
        let server = new_test_server();
        log_in_as(&server, "bob").await;
        let token = log_in_as(&server, "alice").await;

        let response = server.get(endpoints::CURRENT_USER).add_cookie(token).await;

        response.assert_status_ok();
        assert_eq!(response.json::<UserProfile>().username, "alice");
    }

    #[tokio::test]
    async fn requires_log_in() {
        let server = new_test_server();

        server
            .get(endpoints::CURRENT_USER)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
