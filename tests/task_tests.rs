#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

#[actix_web::test]
async fn task_appears_only_in_its_own_project() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let web = create_project!(app, alice, "Website");
    let mobile = create_project!(app, alice, "Mobile");

    let task = create_task!(app, alice, web["id"], json!({"title": "Landing page"}));
    assert_eq!(task["task_number"], 1);
    assert_eq!(task["task_key"], "WEBS-001-001");
    assert_eq!(task["status"], "backlog");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["task_type"], "task");
    assert_eq!(task["progress_percentage"], 0);

    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks", web["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], task["id"]);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks", mobile["id"]))
            .cookie(alice)
    );
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn task_numbers_count_per_project() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let web = create_project!(app, alice, "Website");
    let mobile = create_project!(app, alice, "Mobile");

    create_task!(app, alice, web["id"], json!({"title": "One"}));
    let second = create_task!(app, alice, web["id"], json!({"title": "Two"}));
    let other = create_task!(app, alice, mobile["id"], json!({"title": "Elsewhere"}));

    assert_eq!(second["task_number"], 2);
    assert_eq!(other["task_number"], 1);
    assert_eq!(other["task_key"], "MOBI-001-001");
}

#[actix_web::test]
async fn listing_filters_by_status_type_and_assignee() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, alice_id) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");

    create_task!(app, alice, project["id"], json!({"title": "Bug", "task_type": "bug", "severity": "high"}));
    create_task!(app, alice, project["id"], json!({"title": "Mine", "status": "doing", "assignee_id": alice_id}));
    create_task!(app, alice, project["id"], json!({"title": "Story", "task_type": "story", "story_points": 5}));

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks?type=bug", project["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["severity"], "high");

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks?status=doing&assignee_id={}", project["id"], alice_id))
            .cookie(alice.clone())
    );
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Mine");
    assert_eq!(body[0]["progress_percentage"], 50);

    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/tasks?status=sleeping", project["id"]))
            .cookie(alice)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_persists_only_supplied_fields() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, alice_id) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let task = create_task!(
        app,
        alice,
        project["id"],
        json!({
            "title": "Write copy",
            "description": "Homepage text",
            "priority": "high",
            "due_date": "2030-01-01",
            "assignee_id": alice_id,
        })
    );

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(alice.clone())
            .set_json(json!({"status": "done"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");
    assert_eq!(body["progress_percentage"], 100);
    assert!(body["completed_at"].is_string());
    assert_eq!(body["is_completed"], true);
    assert_eq!(body["title"], "Write copy");
    assert_eq!(body["description"], "Homepage text");
    assert_eq!(body["priority"], "high");
    assert_eq!(body["due_date"], "2030-01-01");
    assert_eq!(body["assignee_id"], alice_id);

    let (_, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(alice.clone())
            .set_json(json!({"status": "doing", "assignee_id": null}))
    );
    assert_eq!(body["progress_percentage"], 50);
    assert_eq!(body["completed_at"], serde_json::Value::Null);
    assert_eq!(body["assignee_id"], serde_json::Value::Null);
    assert_eq!(body["due_date"], "2030-01-01");

    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(alice)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "doing");
    assert_eq!(body["title"], "Write copy");
}

#[actix_web::test]
async fn references_must_stay_inside_the_project() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let (_, outsider_id) = signup!(app, "outsider");
    let web = create_project!(app, alice, "Website");
    let mobile = create_project!(app, alice, "Mobile");
    let foreign_epic = create_task!(app, alice, mobile["id"], json!({"title": "Epic", "task_type": "epic"}));
    let plain = create_task!(app, alice, web["id"], json!({"title": "Not an epic"}));

    for body in [
        json!({"title": "x", "epic_id": foreign_epic["id"]}),
        json!({"title": "x", "epic_id": plain["id"]}),
        json!({"title": "x", "assignee_id": outsider_id}),
        json!({"title": "x", "milestone_id": 12345}),
    ] {
        let (status, _) = call!(
            app,
            TestRequest::post()
                .uri(&format!("/api/projects/{}/tasks", web["id"]))
                .cookie(alice.clone())
                .set_json(body)
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn deleting_needs_project_admin() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (owner, _) = signup!(app, "owner");
    let (member, member_id) = signup!(app, "member");
    let project = create_project!(app, owner, "Website");
    call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/projects/{}/members", project["id"]))
            .cookie(owner.clone())
            .set_json(json!({"user_id": member_id, "role": "member"}))
    );
    let task = create_task!(app, member, project["id"], json!({"title": "Mine"}));

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(member.clone())
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(owner)
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/tasks/{}", task["id"]))
            .cookie(member)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn epic_progress_is_the_mean_of_its_children() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let epic = create_task!(app, alice, project["id"], json!({"title": "Checkout", "task_type": "epic"}));
    let done = create_task!(app, alice, project["id"], json!({"title": "Cart", "status": "done", "epic_id": epic["id"]}));
    let todo = create_task!(app, alice, project["id"], json!({"title": "Payment", "status": "todo"}));

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/epics/{}/tasks/{}", epic["id"], todo["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", epic["id"])).cookie(alice.clone()));
    // (100 + 25) / 2 rounds to 63
    assert_eq!(body["progress_percentage"], 63);

    let (_, children) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/epics/{}/tasks", epic["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(children.as_array().unwrap().len(), 2);

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/epics/{}/tasks/{}", epic["id"], todo["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", epic["id"])).cookie(alice.clone()));
    assert_eq!(body["progress_percentage"], 100);

    // Deleting the epic detaches its children
    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}", epic["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", done["id"])).cookie(alice));
    assert_eq!(body["epic_id"], serde_json::Value::Null);
}

#[actix_web::test]
async fn concurrent_edits_to_different_fields_both_persist() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let task = create_task!(app, alice, project["id"], json!({"title": "orig"}));
    let uri = format!("/api/tasks/{}", task["id"]);

    let (first, second) = tokio::join!(
        actix_web::test::call_service(
            &app,
            TestRequest::put()
                .uri(&uri)
                .cookie(alice.clone())
                .set_json(json!({"title": "new title"}))
                .to_request(),
        ),
        actix_web::test::call_service(
            &app,
            TestRequest::put()
                .uri(&uri)
                .cookie(alice.clone())
                .set_json(json!({"description": "new desc"}))
                .to_request(),
        ),
    );
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let (_, body) = call!(app, TestRequest::get().uri(&uri).cookie(alice));
    assert_eq!(body["title"], "new title");
    assert_eq!(body["description"], "new desc");
}

#[actix_web::test]
async fn epic_chains_cannot_loop() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let outer = create_task!(app, alice, project["id"], json!({"title": "Outer", "task_type": "epic"}));
    let inner = create_task!(
        app,
        alice,
        project["id"],
        json!({"title": "Inner", "task_type": "epic", "epic_id": outer["id"]})
    );

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/tasks/{}", outer["id"]))
            .cookie(alice.clone())
            .set_json(json!({"epic_id": inner["id"]}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Epic assignment would create a cycle");

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/epics/{}/tasks/{}", inner["id"], outer["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", outer["id"])).cookie(alice));
    assert_eq!(body["epic_id"], serde_json::Value::Null);
}

#[actix_web::test]
async fn unparseable_ids_answer_with_the_json_envelope() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");

    let (status, body) = call!(app, TestRequest::get().uri("/api/tasks/abc").cookie(alice));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Resource not found");
}

#[actix_web::test]
async fn deleting_an_epic_detaches_every_child() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let epic = create_task!(app, alice, project["id"], json!({"title": "Search", "task_type": "epic"}));
    let children = [
        create_task!(app, alice, project["id"], json!({"title": "Index", "epic_id": epic["id"]})),
        create_task!(app, alice, project["id"], json!({"title": "Ranking", "epic_id": epic["id"]})),
    ];

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}", epic["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);

    for child in &children {
        let (status, body) = call!(
            app,
            TestRequest::get()
                .uri(&format!("/api/tasks/{}", child["id"]))
                .cookie(alice.clone())
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["epic_id"], serde_json::Value::Null);
    }
}
