use std::collections::HashSet;
use std::sync::Arc;

use common::storage::{ObjectLocation, ObjectStore, UPLOAD_PREFIX};
use uuid::Uuid;

use crate::common::{
    ALICE, ALICE_ID, BOB, COURSE, INSTRUCTOR, OTHER_COURSE, TERM, TestApp, TestOptions, routes,
    trace_form,
};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_returns_the_created_trace() {
        let app = TestApp::spawn().await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(Uuid::parse_str(&res.trace_id()).is_ok());
        assert_eq!(res.body["user_id"], ALICE_ID);
        assert_eq!(res.body["file_name"], "notes.txt");
        assert_eq!(res.body["course_id"], COURSE);
        assert_eq!(res.body["instructor_id"], INSTRUCTOR);
        assert_eq!(res.body["semester_term"], TERM);
        assert_eq!(res.body["section"], "001");
        assert_eq!(app.metadata.trace_count(), 1);
    }

    #[tokio::test]
    async fn stored_location_resolves_to_the_uploaded_bytes() {
        let app = TestApp::spawn().await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;
        assert_eq!(res.status, 201, "{}", res.text);

        let bucket_path = res.body["bucket_path"].as_str().unwrap();
        let location = ObjectLocation::parse(bucket_path).unwrap();
        assert_eq!(location.bucket(), "traces");
        assert!(location.path().starts_with(UPLOAD_PREFIX));
        assert!(location.path().ends_with("-notes.txt"));
        assert_eq!(location.to_string(), bucket_path);

        let object = app.objects.inner.get(&location).await.unwrap();
        assert_eq!(object.bytes, b"hello");
    }

    #[tokio::test]
    async fn same_file_name_twice_gets_two_locations() {
        let app = TestApp::spawn().await;

        let first = app.upload_trace(COURSE, "same.txt", b"one").await;
        let second = app.upload_trace(COURSE, "same.txt", b"two").await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_ne!(first.body["bucket_path"], second.body["bucket_path"]);
        assert_eq!(app.metadata.trace_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_uploads_all_succeed() {
        let app = Arc::new(TestApp::spawn().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let app = Arc::clone(&app);
                tokio::spawn(async move { app.upload_trace(COURSE, "burst.txt", b"x").await })
            })
            .collect();

        let mut locations = HashSet::new();
        for handle in handles {
            let res = handle.await.unwrap();
            assert_eq!(res.status, 201, "{}", res.text);
            assert!(locations.insert(res.body["bucket_path"].as_str().unwrap().to_string()));
        }
        assert_eq!(app.metadata.trace_count(), 8);
        assert_eq!(app.objects.puts(), 8);
    }

    #[tokio::test]
    async fn blank_section_is_rejected_before_any_write() {
        let app = TestApp::spawn().await;

        let form = trace_form("notes.txt", b"hello", INSTRUCTOR, TERM, "   ");
        let res = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "Section cannot be empty or just blank");
        assert_eq!(app.objects.puts(), 0);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_part_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .text("instructor_id", INSTRUCTOR)
            .text("semester_term", TERM)
            .text("section", "001");
        let res = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "failed to get file from request");
        assert_eq!(app.objects.puts(), 0);
    }

    #[tokio::test]
    async fn file_name_with_directory_components_is_rejected() {
        let app = TestApp::spawn().await;

        let form = trace_form("../escape.txt", b"x", INSTRUCTOR, TERM, "001").percent_encode_noop();
        let res = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.objects.puts(), 0);
    }

    #[tokio::test]
    async fn overlong_file_name_is_rejected_before_any_write() {
        let app = TestApp::spawn().await;

        let name = format!("{}.pdf", "a".repeat(240));
        let res = app.upload_trace(COURSE, &name, b"x").await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "Invalid filename: name is too long");
        assert_eq!(app.objects.puts(), 0);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn unknown_instructor_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let form = trace_form("notes.txt", b"x", "I-missing", TERM, "001");
        let res = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(app.objects.puts(), 0);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.upload_trace("C-missing", "notes.txt", b"x").await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.objects.puts(), 0);
    }

    #[tokio::test]
    async fn unknown_semester_term_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let form = trace_form("notes.txt", b"x", INSTRUCTOR, "1999Z", "001");
        let res = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(app.objects.puts(), 0);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn_with(TestOptions {
            max_upload_size: Some(16),
            ..Default::default()
        })
        .await;

        let res = app.upload_trace(COURSE, "big.bin", &[7u8; 64]).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.objects.puts(), 0);
    }
}

mod reads {
    use super::*;

    #[tokio::test]
    async fn listing_requires_credentials() {
        let app = TestApp::spawn().await;

        let res = app.get_anonymous(&routes::course_traces(COURSE)).await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn course_listing_only_contains_that_course() {
        let app = TestApp::spawn().await;
        let in_course = app.create_trace(COURSE, "a.txt").await;
        app.create_trace(OTHER_COURSE, "b.txt").await;

        let res = app.get_as(&routes::course_traces(COURSE), ALICE).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["trace_id"], in_course.as_str());
    }

    #[tokio::test]
    async fn listing_an_unknown_course_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_as(&routes::course_traces("C-missing"), ALICE).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn all_traces_lists_every_course() {
        let app = TestApp::spawn().await;
        app.create_trace(COURSE, "a.txt").await;
        app.create_trace(OTHER_COURSE, "b.txt").await;

        let res = app.get_as(routes::TRACES, BOB).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn single_trace_is_returned_under_its_course() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "a.txt").await;

        let res = app.get_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["trace_id"], id.as_str());
    }

    #[tokio::test]
    async fn trace_under_another_course_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "a.txt").await;

        let res = app.get_as(&routes::trace(OTHER_COURSE, &id), ALICE).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn malformed_trace_id_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.get_as(&routes::trace(COURSE, "not-a-uuid"), ALICE).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "invalid UUID format");
    }

    #[tokio::test]
    async fn query_string_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_as(&format!("{}?limit=5", routes::course_traces(COURSE)), ALICE)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "query parameters are not allowed");
    }

    #[tokio::test]
    async fn content_download_carries_type_and_original_name() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;

        let res = app.get_as(&routes::trace_content(COURSE, &id), BOB).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text, "trace body");
        assert!(res.header("content-type").unwrap().starts_with("text/plain"));
        let disposition = res.header("content-disposition").unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("notes.txt"));
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn submit_then_delete_then_get_is_not_found() {
        let app = TestApp::spawn().await;

        let form = trace_form("syllabus.pdf", b"%PDF-1.7", INSTRUCTOR, TERM, "A");
        let created = app
            .upload_form_as(&routes::course_traces(COURSE), form, ALICE)
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        assert_eq!(created.body["course_id"], COURSE);
        assert_eq!(created.body["file_name"], "syllabus.pdf");
        assert!(!created.body["bucket_path"].as_str().unwrap().is_empty());
        let id = created.trace_id();

        let deleted = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(deleted.status, 204);

        let fetched = app.get_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(fetched.status, 404);
    }

    #[tokio::test]
    async fn deleted_trace_is_gone_with_its_object() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        let stored = app.metadata.get(Uuid::parse_str(&id).unwrap()).unwrap();
        let location = ObjectLocation::parse(&stored.bucket_path).unwrap();

        let res = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(res.status, 404);
        assert!(app.objects.inner.get(&location).await.is_err());
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;

        let first = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        let second = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(first.status, 204);
        assert_eq!(second.status, 404);
    }

    #[tokio::test]
    async fn delete_under_another_course_touches_nothing() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;

        let res = app.delete_as(&routes::trace(OTHER_COURSE, &id), ALICE).await;

        assert_eq!(res.status, 404);
        assert_eq!(app.objects.deletes(), 0);
        assert_eq!(app.metadata.trace_count(), 1);
    }

    #[tokio::test]
    async fn unknown_trace_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_as(&routes::trace(COURSE, &Uuid::new_v4().to_string()), ALICE)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.objects.deletes(), 0);
    }
}
