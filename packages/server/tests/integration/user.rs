use serde_json::json;

use crate::common::{ALICE, ALICE_ID, BOB, PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_details() {
        let app = TestApp::spawn().await;

        let res = app
            .post_anonymous(
                routes::USERS,
                &json!({
                    "first_name": "Carol",
                    "last_name": "Smith",
                    "username": "carol@example.edu",
                    "password": "long-enough-secret",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "carol@example.edu");
        assert!(res.body["id"].is_string());
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn registered_user_can_authenticate() {
        let app = TestApp::spawn().await;
        let created = app
            .post_anonymous(
                routes::USERS,
                &json!({
                    "first_name": "Carol",
                    "last_name": "Smith",
                    "username": "carol@example.edu",
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let id = created.body["id"].as_str().unwrap().to_string();

        let res = app.get_as(&routes::user(&id), "carol@example.edu").await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["first_name"], "Carol");
    }

    #[tokio::test]
    async fn cannot_register_an_already_taken_username() {
        let app = TestApp::spawn().await;

        let res = app
            .post_anonymous(
                routes::USERS,
                &json!({
                    "first_name": "Other",
                    "last_name": "Alice",
                    "username": ALICE,
                    "password": "long-enough-secret",
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn cannot_register_with_an_invalid_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_anonymous(
                routes::USERS,
                &json!({
                    "first_name": "Carol",
                    "last_name": "Smith",
                    "username": "carol",
                    "password": "long-enough-secret",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_anonymous(routes::USERS, &json!({"first_name": "Carol"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod self_service {
    use super::*;

    #[tokio::test]
    async fn owner_can_read_their_account() {
        let app = TestApp::spawn().await;

        let res = app.get_as(&routes::user(ALICE_ID), ALICE).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], ALICE_ID);
        assert_eq!(res.body["username"], ALICE);
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn owner_can_update_names() {
        let app = TestApp::spawn().await;

        let res = app
            .put_as(
                &routes::user(ALICE_ID),
                &json!({"first_name": "Alicia"}),
                ALICE,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_as(&routes::user(ALICE_ID), ALICE).await;
        assert_eq!(res.body["first_name"], "Alicia");
        assert_eq!(res.body["last_name"], "User");
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let app = TestApp::spawn().await;

        let res = app
            .put_as(
                &routes::user(ALICE_ID),
                &json!({"password": "brand-new-secret"}),
                ALICE,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let old = app.get_as(&routes::user(ALICE_ID), ALICE).await;
        assert_eq!(old.status, 401);

        let new = app
            .get_with_password(&routes::user(ALICE_ID), ALICE, "brand-new-secret")
            .await;
        assert_eq!(new.status, 200);
    }

    #[tokio::test]
    async fn username_cannot_be_changed() {
        let app = TestApp::spawn().await;

        let res = app
            .put_as(
                &routes::user(ALICE_ID),
                &json!({"username": "new@example.edu"}),
                ALICE,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "username cannot be changed");
    }

    #[tokio::test]
    async fn another_user_cannot_update_the_account() {
        let app = TestApp::spawn().await;

        let res = app
            .put_as(&routes::user(ALICE_ID), &json!({"first_name": "Mallory"}), BOB)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn query_string_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_as(&format!("{}?fields=id", routes::user(ALICE_ID)), ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "query parameters are not allowed");
    }
}
