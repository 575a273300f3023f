use crate::common::{ALICE, BOB_ID, PASSWORD, TestApp, routes};

mod credentials {
    use super::*;

    #[tokio::test]
    async fn missing_authorization_header_is_rejected_with_a_challenge() {
        let app = TestApp::spawn().await;

        let res = app.get_anonymous(routes::TRACES).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "CREDENTIALS_MISSING");
        assert_eq!(res.header("www-authenticate"), Some("Basic realm=\"traces\""));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_password(routes::TRACES, ALICE, "not-the-password")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_username_is_rejected_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_password(routes::TRACES, "nobody@example.edu", PASSWORD)
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn non_basic_schemes_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_header(routes::TRACES, "Bearer abc.def.ghi").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");

        let res = app.get_with_header(routes::TRACES, "Basic !!!not-base64").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn valid_credentials_reach_the_handler() {
        let app = TestApp::spawn().await;

        let res = app.get_as(routes::TRACES, ALICE).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn authentication_is_checked_before_the_query_string() {
        let app = TestApp::spawn().await;

        let res = app.get_anonymous(&format!("{}?page=2", routes::TRACES)).await;

        assert_eq!(res.status, 401);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn caller_cannot_read_another_users_account() {
        let app = TestApp::spawn().await;

        let res = app.get_as(&routes::user(BOB_ID), ALICE).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
