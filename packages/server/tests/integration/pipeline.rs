use std::sync::atomic::Ordering;

use common::TraceUploaded;
use common::storage::{ObjectLocation, ObjectStore, UPLOAD_PREFIX};
use trace_server::pipeline::reconcile::find_orphaned_objects;
use uuid::Uuid;

use crate::common::{ALICE, COURSE, Notifications, TestApp, TestOptions, routes};

mod metadata_failure {
    use super::*;

    #[tokio::test]
    async fn failed_insert_leaves_the_object_as_an_orphan() {
        let app = TestApp::spawn().await;
        app.metadata.fail_inserts.store(true, Ordering::SeqCst);

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(app.objects.puts(), 1);
        assert_eq!(app.metadata.trace_count(), 0);
        assert!(app.events.sent.lock().is_empty());

        let orphans = find_orphaned_objects(&*app.metadata, &*app.objects)
            .await
            .unwrap();
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].path().starts_with(UPLOAD_PREFIX));
        assert!(app.objects.inner.get(&orphans[0]).await.is_ok());
    }

    #[tokio::test]
    async fn row_removed_concurrently_after_object_delete_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        app.metadata.vanish_on_delete.store(true, Ordering::SeqCst);

        let res = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 404, "{}", res.text);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.objects.deletes(), 1);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn failed_row_delete_keeps_the_row_and_a_retry_completes() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        app.metadata.fail_deletes.store(true, Ordering::SeqCst);

        let res = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(app.metadata.trace_count(), 1);

        // The object is already gone, so the retry goes through the absent-object path.
        app.metadata.fail_deletes.store(false, Ordering::SeqCst);
        let retry = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(retry.status, 204, "{}", retry.text);
        assert_eq!(app.objects.deletes(), 2);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn stalled_metadata_store_is_reported_unavailable() {
        let app = TestApp::spawn_with(TestOptions {
            query_timeout_secs: Some(1),
            ..Default::default()
        })
        .await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        app.metadata.stalled.store(true, Ordering::SeqCst);

        let res = app.get_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 503, "{}", res.text);
        assert_eq!(res.body["code"], "STORE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn referenced_objects_are_not_orphans() {
        let app = TestApp::spawn().await;
        app.create_trace(COURSE, "kept.txt").await;

        let orphans = find_orphaned_objects(&*app.metadata, &*app.objects)
            .await
            .unwrap();

        assert!(orphans.is_empty());
    }
}

mod object_store_failure {
    use super::*;

    #[tokio::test]
    async fn unreachable_store_fails_the_upload_without_a_row() {
        let app = TestApp::spawn().await;
        app.objects.unavailable.store(true, Ordering::SeqCst);

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 500);
        assert_eq!(app.metadata.trace_count(), 0);
        assert!(app.events.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_keeps_the_row_on_delete() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        app.objects.unavailable.store(true, Ordering::SeqCst);

        let res = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 503);
        assert_eq!(res.body["code"], "STORE_UNAVAILABLE");
        assert_eq!(app.metadata.trace_count(), 1);

        app.objects.unavailable.store(false, Ordering::SeqCst);
        let retry = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;
        assert_eq!(retry.status, 204);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn externally_removed_object_still_allows_delete() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        let stored = app.metadata.get(Uuid::parse_str(&id).unwrap()).unwrap();
        let location = ObjectLocation::parse(&stored.bucket_path).unwrap();
        app.objects.inner.delete(&location).await.unwrap();

        let res = app.delete_as(&routes::trace(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(app.metadata.trace_count(), 0);
    }

    #[tokio::test]
    async fn missing_object_on_download_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_trace(COURSE, "notes.txt").await;
        let stored = app.metadata.get(Uuid::parse_str(&id).unwrap()).unwrap();
        let location = ObjectLocation::parse(&stored.bucket_path).unwrap();
        app.objects.inner.delete(&location).await.unwrap();

        let res = app.get_as(&routes::trace_content(COURSE, &id), ALICE).await;

        assert_eq!(res.status, 404);
    }
}

mod notifications {
    use super::*;

    #[tokio::test]
    async fn upload_publishes_one_event_keyed_by_trace_id() {
        let app = TestApp::spawn().await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;
        assert_eq!(res.status, 201, "{}", res.text);
        let trace_id = res.trace_id();

        let sent = app.events.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        let envelope = sent.into_iter().next().unwrap();
        assert_eq!(envelope.event_type, "trace.uploaded");
        assert_eq!(envelope.key, trace_id);

        let event: TraceUploaded = envelope.into_event().unwrap();
        assert_eq!(event.trace_id, trace_id);
        assert_eq!(event.course_id, COURSE);
        assert_eq!(event.file_name, "notes.txt");
        assert_eq!(event.store_bucket, "traces");
        assert_eq!(
            format!("s3://{}/{}", event.store_bucket, event.store_path),
            res.body["bucket_path"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn failing_channel_does_not_fail_the_upload() {
        let app = TestApp::spawn_with(TestOptions {
            notifications: Notifications::Failing,
            ..Default::default()
        })
        .await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(app.metadata.trace_count(), 1);
    }

    #[tokio::test]
    async fn disabled_notifications_still_accept_uploads() {
        let app = TestApp::spawn_with(TestOptions {
            notifications: Notifications::Disabled,
            ..Default::default()
        })
        .await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 201);
        assert!(!app.notifier.is_enabled());
    }

    #[tokio::test]
    async fn uploads_after_shutdown_are_not_published() {
        let app = TestApp::spawn().await;
        app.notifier.shutdown().await;

        let res = app.upload_trace(COURSE, "notes.txt", b"hello").await;

        assert_eq!(res.status, 201);
        assert!(app.events.sent.lock().is_empty());
    }
}
