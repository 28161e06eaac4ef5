use std::time::Duration;

use serde_json::json;
use shared::domain::{AttendanceStatus, RegistrationStatus};

use super::*;
use crate::{
    store::AsyncStatus,
    test_support::{
        attendance, class, data, dispatcher, dispatcher_with, lesson, module, news, registration,
        student, to_json, ScriptedTransport,
    },
    transport::Method,
    ui_state::AlertKind,
    wizard::Selection,
};

#[tokio::test]
async fn create_attendance_appends_to_loaded_sheet() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/attendances?lesson=l1",
            data(json!([to_json(&attendance("a1", "s1", "l1"))])),
        )
        .await;
    transport
        .respond(
            Method::Post,
            "back-office/attendances",
            data(to_json(&attendance("a2", "s2", "l1"))),
        )
        .await;
    let dispatcher = dispatcher(Role::Trainer, transport.clone());

    dispatcher
        .fetch_attendances(LessonId::from("l1"))
        .await
        .expect("fetch");
    let created = dispatcher
        .create_attendance(NewAttendance {
            student: "s2".into(),
            lesson: "l1".into(),
            status: AttendanceStatus::Present,
            note: String::new(),
        })
        .await
        .expect("create");

    assert_eq!(created.id, AttendanceId::from("a2"));
    let store = dispatcher.store().snapshot().await;
    let ids: Vec<&str> = store
        .attendances
        .items()
        .iter()
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(store.attendances.status(), AsyncStatus::Succeeded);
    assert_eq!(store.attendances.error(), None);
}

#[tokio::test]
async fn create_attendance_into_empty_slice_holds_exactly_that_record() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Post,
            "back-office/attendances",
            json!({ "data": { "id": "A1", "student": "S1", "lesson": "L1", "status": "present" } }),
        )
        .await;
    let dispatcher = dispatcher(Role::Trainer, transport);

    dispatcher
        .create_attendance(NewAttendance {
            student: "S1".into(),
            lesson: "L1".into(),
            status: AttendanceStatus::Present,
            note: String::new(),
        })
        .await
        .expect("create");

    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.attendances.len(), 1);
    assert!(store.attendances.contains(&AttendanceId::from("A1")));
}

#[tokio::test]
async fn fetch_attendances_degrades_to_empty_on_failure() {
    let transport = ScriptedTransport::new();
    transport
        .fail(Method::Get, "back-office/attendances?lesson=l1", 500, "boom")
        .await;
    let dispatcher = dispatcher(Role::Admin, transport);

    let records = dispatcher
        .fetch_attendances(LessonId::from("l1"))
        .await
        .expect("degrades instead of failing");

    assert!(records.is_empty());
    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.attendances.status(), AsyncStatus::Succeeded);
    assert!(store.attendances.is_empty());
}

#[tokio::test]
async fn approving_a_registration_drops_it_from_pending() {
    let transport = ScriptedTransport::new();
    let pending = json!([
        to_json(&registration("r1", RegistrationStatus::Pending)),
        to_json(&registration("r2", RegistrationStatus::Pending)),
    ]);
    transport
        .respond(Method::Get, "back-office/student-registrations", pending.clone())
        .await;
    transport
        .respond(
            Method::Get,
            "back-office/student-registrations?status=pending",
            data(pending),
        )
        .await;
    transport
        .respond(
            Method::Put,
            "back-office/student-registrations/r1",
            data(to_json(&registration("r1", RegistrationStatus::Approved))),
        )
        .await;
    let dispatcher = dispatcher(Role::Manager, transport.clone());

    dispatcher.fetch_registrations().await.expect("all");
    dispatcher.fetch_pending_registrations().await.expect("pending");
    let updated = dispatcher
        .update_registration_status(
            RegistrationId::from("r1"),
            RegistrationStatusUpdate {
                status: RegistrationStatus::Approved,
                note: "welcome".to_string(),
            },
        )
        .await
        .expect("update status");

    assert_eq!(updated.status, RegistrationStatus::Approved);
    let store = dispatcher.store().snapshot().await;
    let r1 = store
        .registrations
        .all
        .get(&RegistrationId::from("r1"))
        .expect("r1 kept");
    assert_eq!(r1.status, RegistrationStatus::Approved);
    assert_eq!(store.registrations.all.len(), 2);
    let pending_ids: Vec<&str> = store
        .registrations
        .pending
        .items()
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(pending_ids, vec!["r2"]);

    let requests = transport.requests().await;
    let put = requests.last().expect("put sent");
    assert_eq!(put.method, Method::Put);
    assert_eq!(
        put.body,
        crate::transport::RequestBody::Json(json!({ "status": "approved", "note": "welcome" }))
    );
}

#[tokio::test(start_paused = true)]
async fn latest_student_fetch_wins_without_cancellation() {
    let transport = ScriptedTransport::new();
    transport
        .respond_after(
            Method::Get,
            "back-office/students?class=c1",
            Duration::from_millis(200),
            data(json!([to_json(&student("s1", "c1"))])),
        )
        .await;
    transport
        .respond_after(
            Method::Get,
            "back-office/students?class=c2",
            Duration::from_millis(20),
            data(json!([to_json(&student("s2", "c2"))])),
        )
        .await;
    let dispatcher = dispatcher(Role::Admin, transport.clone());

    let (first, second) = tokio::join!(
        dispatcher.fetch_students(Some(ClassId::from("c1"))),
        dispatcher.fetch_students(Some(ClassId::from("c2"))),
    );

    assert_eq!(first.expect("first completes").len(), 1);
    assert_eq!(second.expect("second completes").len(), 1);
    let store = dispatcher.store().snapshot().await;
    let ids: Vec<&str> = store.students.items().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2"]);
    assert_eq!(store.students.status(), AsyncStatus::Succeeded);
    assert_eq!(transport.request_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn superseded_read_is_aborted_when_cancellation_is_enabled() {
    let transport = ScriptedTransport::new();
    transport
        .respond_after(
            Method::Get,
            "back-office/students?class=c1",
            Duration::from_millis(200),
            data(json!([to_json(&student("s1", "c1"))])),
        )
        .await;
    transport
        .respond_after(
            Method::Get,
            "back-office/students?class=c2",
            Duration::from_millis(20),
            data(json!([to_json(&student("s2", "c2"))])),
        )
        .await;
    let options = ClientOptions {
        cancel_stale_reads: true,
        ..ClientOptions::default()
    };
    let dispatcher = dispatcher_with(Role::Admin, transport, options);

    let (first, second) = tokio::join!(
        dispatcher.fetch_students(Some(ClassId::from("c1"))),
        dispatcher.fetch_students(Some(ClassId::from("c2"))),
    );

    assert_eq!(first.unwrap_err(), ClientError::Cancelled);
    assert_eq!(second.expect("latest read completes").len(), 1);
    let store = dispatcher.store().snapshot().await;
    let ids: Vec<&str> = store.students.items().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2"]);
    assert_eq!(store.students.status(), AsyncStatus::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn cancel_reads_returns_the_slice_to_idle() {
    let transport = ScriptedTransport::new();
    transport
        .respond_after(
            Method::Get,
            "back-office/classes",
            Duration::from_secs(5),
            json!([to_json(&class("c1", "Morning"))]),
        )
        .await;
    let options = ClientOptions {
        cancel_stale_reads: true,
        ..ClientOptions::default()
    };
    let dispatcher = dispatcher_with(Role::Admin, transport, options);

    let running = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.fetch_classes().await })
    };
    let mut cancelled = 0;
    for _ in 0..50 {
        cancelled = dispatcher.cancel_reads(ResourceKind::Class).await;
        if cancelled > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(cancelled, 1);
    let result = running.await.expect("join");
    assert_eq!(result.unwrap_err(), ClientError::Cancelled);
    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.classes.status(), AsyncStatus::Idle);
    assert!(store.classes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn older_read_registering_late_does_not_abort_the_newer_one() {
    let options = ClientOptions {
        cancel_stale_reads: true,
        ..ClientOptions::default()
    };
    let dispatcher = dispatcher_with(Role::Admin, ScriptedTransport::new(), options);
    let key = RequestKey {
        resource: ResourceKind::Class,
        op: Operation::FetchAll,
    };
    let on_cancel =
        |generation| StoreEvent::Classes(SliceAction::cancelled(Operation::FetchAll, generation));

    let newer = {
        let dispatcher = Arc::clone(&dispatcher);
        let on_cancel = on_cancel(2);
        tokio::spawn(async move {
            let call = async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, ClientError>(2_u64)
            };
            dispatcher.run_cancellable(key, 2, on_cancel, call.boxed()).await
        })
    };
    while !dispatcher.inflight.lock().await.contains_key(&key) {
        tokio::task::yield_now().await;
    }
    let older = dispatcher
        .run_cancellable(key, 1, on_cancel(1), async { Ok(1_u64) }.boxed())
        .await;

    assert_eq!(older.unwrap_err(), ClientError::Cancelled);
    assert_eq!(newer.await.expect("join").expect("newest read survives"), 2);
    assert!(dispatcher.inflight.lock().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reads_never_leave_the_slice_loading() {
    let options = ClientOptions {
        cancel_stale_reads: true,
        ..ClientOptions::default()
    };
    for round in 0..200 {
        let transport = ScriptedTransport::new();
        for name in ["Morning", "Evening"] {
            transport
                .respond_after(
                    Method::Get,
                    "back-office/classes",
                    Duration::from_millis(2),
                    json!([to_json(&class("c1", name))]),
                )
                .await;
        }
        let dispatcher = dispatcher_with(Role::Admin, transport, options.clone());
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let spawn_read = || {
            let dispatcher = Arc::clone(&dispatcher);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                dispatcher.fetch_classes().await
            })
        };
        let (first, second) = (spawn_read(), spawn_read());
        let first = first.await.expect("join");
        let second = second.await.expect("join");

        assert!(first.is_ok() || second.is_ok(), "round {round}: both reads failed");
        let store = dispatcher.store().snapshot().await;
        assert_eq!(store.classes.status(), AsyncStatus::Succeeded, "round {round}");
        assert_eq!(store.classes.len(), 1, "round {round}");
    }
}

#[tokio::test]
async fn failed_fetch_records_error_and_keeps_items() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/modules",
            json!([to_json(&module("m1", "c1"))]),
        )
        .await;
    transport
        .fail(Method::Get, "back-office/modules", 503, "maintenance")
        .await;
    let dispatcher = dispatcher(Role::Admin, transport);

    dispatcher.fetch_modules(None).await.expect("first fetch");
    let err = dispatcher.fetch_modules(None).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.modules.len(), 1);
    assert_eq!(store.modules.status(), AsyncStatus::Failed);
    assert_eq!(
        store.modules.error(),
        Some("request failed (503): maintenance")
    );
}

#[tokio::test]
async fn confirmed_delete_failure_keeps_the_record_and_alerts() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/news",
            json!([to_json(&news("n1", "Open day"))]),
        )
        .await;
    transport
        .fail(Method::Delete, "back-office/news/n1", 500, "db down")
        .await;
    let dispatcher = dispatcher(Role::Manager, transport);

    dispatcher.fetch_news().await.expect("fetch");
    dispatcher
        .request_delete(DeleteTarget::new(ResourceKind::News, "n1"))
        .await
        .expect("confirmation opens");
    let opened = dispatcher.store().snapshot().await;
    assert_eq!(
        opened.ui.modal.kind(),
        Some(ModalKind::ConfirmDelete(ResourceKind::News))
    );

    let err = dispatcher.confirm_delete().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    let store = dispatcher.store().snapshot().await;
    assert!(store.news.contains(&NewsId::from("n1")));
    assert!(!store.ui.modal.is_open());
    let alert = store.ui.alert.expect("error alert raised");
    assert_eq!(alert.kind, AlertKind::Error);
    assert!(alert.message.contains("db down"));
}

#[tokio::test]
async fn confirmed_delete_removes_the_record() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/classes",
            json!([to_json(&class("c1", "Morning")), to_json(&class("c2", "Evening"))]),
        )
        .await;
    transport
        .respond(Method::Delete, "back-office/classes/c1", json!(null))
        .await;
    let dispatcher = dispatcher(Role::Admin, transport);

    dispatcher.fetch_classes().await.expect("fetch");
    dispatcher
        .request_delete(DeleteTarget::new(ResourceKind::Class, "c1"))
        .await
        .expect("confirmation opens");
    dispatcher.confirm_delete().await.expect("delete");

    let store = dispatcher.store().snapshot().await;
    let ids: Vec<&str> = store.classes.items().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2"]);
    assert_eq!(
        store.ui.alert.map(|alert| alert.kind),
        Some(AlertKind::Success)
    );
}

#[tokio::test]
async fn confirm_without_pending_delete_is_rejected() {
    let dispatcher = dispatcher(Role::Admin, ScriptedTransport::new());

    let err = dispatcher.confirm_delete().await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn forbidden_roles_send_nothing() {
    let transport = ScriptedTransport::new();
    let trainer = dispatcher(Role::Trainer, transport.clone());
    let manager = dispatcher(Role::Manager, transport.clone());

    let err = trainer.delete_news(NewsId::from("n1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden { .. }));
    assert!(trainer.fetch_registrations().await.is_err());
    assert!(manager.delete_student(StudentId::from("s1")).await.is_err());
    assert!(manager
        .request_delete(DeleteTarget::new(ResourceKind::Class, "c1"))
        .await
        .is_err());

    assert_eq!(transport.request_count().await, 0);
    assert!(!manager.store().snapshot().await.ui.modal.is_open());
}

#[tokio::test]
async fn out_of_range_evaluation_is_not_sent() {
    let transport = ScriptedTransport::new();
    let dispatcher = dispatcher(Role::Trainer, transport.clone());
    let mut wizard = Wizard::evaluation();
    wizard.select(Selection::Class("c1".into())).expect("class");
    wizard.select(Selection::Student("s1".into())).expect("student");
    wizard.select(Selection::Module("m1".into())).expect("module");
    wizard.select(Selection::Lesson("l1".into())).expect("lesson");

    let err = dispatcher
        .submit_evaluation(&wizard, 25.0, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(transport.request_count().await, 0);
    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.evaluations.status(), AsyncStatus::Idle);
}

#[tokio::test]
async fn attendance_wizard_submits_one_record_per_mark() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Post,
            "back-office/attendances",
            to_json(&attendance("a1", "s1", "l1")),
        )
        .await;
    transport
        .respond(
            Method::Post,
            "back-office/attendances",
            to_json(&attendance("a2", "s2", "l1")),
        )
        .await;
    let dispatcher = dispatcher(Role::Trainer, transport.clone());
    let mut wizard = Wizard::attendance();
    wizard.select(Selection::Class("c1".into())).expect("class");
    wizard.select(Selection::Module("m1".into())).expect("module");
    wizard.select(Selection::Lesson("l1".into())).expect("lesson");

    let created = dispatcher
        .submit_attendance(
            &wizard,
            vec![
                AttendanceMark {
                    student: "s1".into(),
                    status: AttendanceStatus::Present,
                    note: String::new(),
                },
                AttendanceMark {
                    student: "s2".into(),
                    status: AttendanceStatus::Late,
                    note: "bus".to_string(),
                },
            ],
        )
        .await
        .expect("submitted");

    assert_eq!(created.len(), 2);
    let requests = transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].body,
        crate::transport::RequestBody::Json(json!({
            "student": "s2",
            "lesson": "l1",
            "status": "late",
            "note": "bus",
        }))
    );
    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.attendances.len(), 2);
    assert_eq!(
        store.ui.alert.map(|alert| alert.kind),
        Some(AlertKind::Success)
    );
}

#[tokio::test]
async fn attendance_sheet_loads_roster_even_when_marks_fail() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/students?class=c1",
            json!([to_json(&student("s1", "c1")), to_json(&student("s2", "c1"))]),
        )
        .await;
    transport
        .fail(Method::Get, "back-office/attendances?lesson=l1", 500, "boom")
        .await;
    let dispatcher = dispatcher(Role::Trainer, transport);

    dispatcher
        .load_options(OptionsRequest::AttendanceSheet {
            class: "c1".into(),
            lesson: "l1".into(),
        })
        .await
        .expect("sheet loads");

    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.students.len(), 2);
    assert!(store.attendances.is_empty());
}

#[tokio::test]
async fn open_edit_requires_a_loaded_record() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/lessons?module=m1",
            json!([to_json(&lesson("l1", "m1"))]),
        )
        .await;
    let dispatcher = dispatcher(Role::Admin, transport);
    dispatcher
        .fetch_lessons(Some(ModuleId::from("m1")))
        .await
        .expect("fetch");

    let err = dispatcher
        .open_edit(ResourceKind::Lesson, "missing")
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::not_found(ResourceKind::Lesson, "missing"));

    dispatcher
        .open_edit(ResourceKind::Lesson, "l1")
        .await
        .expect("edit opens");
    let store = dispatcher.store().snapshot().await;
    assert_eq!(
        store.ui.modal.kind(),
        Some(ModalKind::Edit(ResourceKind::Lesson))
    );
    assert_eq!(
        store.ui.modal.payload(),
        Some(&ModalPayload::Lesson(lesson("l1", "m1")))
    );
}

#[tokio::test]
async fn update_news_keeps_image_untouched_by_default() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            Method::Get,
            "back-office/news",
            json!([to_json(&news("n1", "Old"))]),
        )
        .await;
    transport
        .respond(
            Method::Put,
            "back-office/news/n1",
            data(to_json(&news("n1", "New"))),
        )
        .await;
    let dispatcher = dispatcher(Role::Admin, transport.clone());
    dispatcher.fetch_news().await.expect("fetch");

    dispatcher
        .update_news(
            NewsId::from("n1"),
            NewsDraft {
                title: "New".to_string(),
                content: String::new(),
                published: true,
            },
            ImageUpdate::default(),
        )
        .await
        .expect("update");

    let store = dispatcher.store().snapshot().await;
    assert_eq!(store.news.items()[0].title, "New");
    let requests = transport.requests().await;
    let crate::transport::RequestBody::Multipart(parts) = &requests[1].body else {
        panic!("news update must be multipart");
    };
    assert!(parts.iter().all(|part| part.name != "image" && part.name != "removeImage"));
}
