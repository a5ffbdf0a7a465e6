#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

#[actix_web::test]
async fn dependencies_block_until_predecessors_are_done() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let design = create_task!(app, alice, project["id"], json!({"title": "Design"}));
    let build = create_task!(app, alice, project["id"], json!({"title": "Build"}));

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/tasks/{}/dependencies", build["id"]))
            .cookie(alice.clone())
            .set_json(json!({"predecessor_id": design["id"]}))
    );
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["is_blocked"], true);
    assert_eq!(body["predecessors"][0]["id"], design["id"]);

    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", build["id"])).cookie(alice.clone()));
    assert_eq!(body["is_blocked"], true);

    call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/tasks/{}", design["id"]))
            .cookie(alice.clone())
            .set_json(json!({"status": "done"}))
    );
    let (_, body) = call!(app, TestRequest::get().uri(&format!("/api/tasks/{}", build["id"])).cookie(alice.clone()));
    assert_eq!(body["is_blocked"], false);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/tasks/{}/dependencies", design["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(body["successors"][0]["id"], build["id"]);

    let (status, body) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}/dependencies/{}", build["id"], design["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["predecessors"].as_array().unwrap().is_empty());

    let (status, body) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}/dependencies/{}", build["id"], design["id"]))
            .cookie(alice)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Dependency not found");
}

#[actix_web::test]
async fn invalid_dependencies_are_rejected() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let other = create_project!(app, alice, "Mobile");
    let first = create_task!(app, alice, project["id"], json!({"title": "First"}));
    let second = create_task!(app, alice, project["id"], json!({"title": "Second"}));
    let third = create_task!(app, alice, project["id"], json!({"title": "Third"}));
    let foreign = create_task!(app, alice, other["id"], json!({"title": "Elsewhere"}));

    for (successor, predecessor) in [(&second, &first), (&third, &second)] {
        let (status, _) = call!(
            app,
            TestRequest::post()
                .uri(&format!("/api/tasks/{}/dependencies", successor["id"]))
                .cookie(alice.clone())
                .set_json(json!({"predecessor_id": predecessor["id"]}))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let cases = [
        (&first, &third, "Dependency would create a cycle"),
        (&first, &first, "A task cannot depend on itself"),
        (&second, &first, "Dependency already exists"),
        (&first, &foreign, "predecessor_id must name a task in the same project"),
    ];
    for (successor, predecessor, message) in cases {
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri(&format!("/api/tasks/{}/dependencies", successor["id"]))
                .cookie(alice.clone())
                .set_json(json!({"predecessor_id": predecessor["id"]}))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], message);
    }

    // Deleting a task drops its edges
    call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/tasks/{}", second["id"]))
            .cookie(alice.clone())
    );
    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/tasks/{}/dependencies", third["id"]))
            .cookie(alice)
    );
    assert!(body["predecessors"].as_array().unwrap().is_empty());
    assert_eq!(body["is_blocked"], false);
}

#[actix_web::test]
async fn labels_are_created_and_attached() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let (viewer, viewer_id) = signup!(app, "viewer");
    let project = create_project!(app, alice, "Website");
    let task = create_task!(app, alice, project["id"], json!({"title": "Login form"}));
    call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/projects/{}/members", project["id"]))
            .cookie(alice.clone())
            .set_json(json!({"user_id": viewer_id, "role": "viewer"}))
    );

    let (status, label) = call!(
        app,
        TestRequest::post()
            .uri("/api/labels")
            .cookie(alice.clone())
            .set_json(json!({"name": "frontend", "color": "#3366ff"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(label["color"], "#3366ff");

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/labels")
            .cookie(alice.clone())
            .set_json(json!({"name": "frontend"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/labels")
            .cookie(alice.clone())
            .set_json(json!({"name": "backend", "color": "blue"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let label_uri = format!("/api/tasks/{}/labels/{}", task["id"], label["id"]);
    let (status, _) = call!(app, TestRequest::post().uri(&label_uri).cookie(viewer.clone()));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call!(app, TestRequest::post().uri(&label_uri).cookie(alice.clone()));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "frontend");

    let (status, _) = call!(app, TestRequest::post().uri(&label_uri).cookie(alice.clone()));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/tasks/{}/labels", task["id"]))
            .cookie(viewer)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call!(app, TestRequest::delete().uri(&label_uri).cookie(alice.clone()));
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = call!(app, TestRequest::delete().uri(&label_uri).cookie(alice.clone()));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call!(app, TestRequest::get().uri("/api/labels").cookie(alice));
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn releases_track_their_ship_date() {
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

    let (status, release) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/projects/{}/releases", project["id"]))
            .cookie(member.clone())
            .set_json(json!({"name": "Spring", "version": "1.0.0"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(release["status"], "not_started");
    assert_eq!(release["released_at"], serde_json::Value::Null);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/releases/{}", release["id"]))
            .cookie(member.clone())
            .set_json(json!({"status": "released"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "released");
    assert!(body["released_at"].is_string());
    assert_eq!(body["version"], "1.0.0");

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/projects/{}/releases", project["id"]))
            .cookie(member.clone())
    );
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/releases/{}", release["id"]);
    let (status, _) = call!(app, TestRequest::delete().uri(&uri).cookie(member));
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call!(app, TestRequest::delete().uri(&uri).cookie(owner));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn epic_progress_can_be_recomputed_on_demand() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, _) = signup!(app, "alice");
    let project = create_project!(app, alice, "Website");
    let epic = create_task!(app, alice, project["id"], json!({"title": "Checkout", "task_type": "epic"}));
    let child = create_task!(
        app,
        alice,
        project["id"],
        json!({"title": "Cart", "status": "doing", "epic_id": epic["id"]})
    );

    // Drift the stored value behind the API's back
    sqlx::query("UPDATE tasks SET progress_percentage = 0 WHERE id = ?")
        .bind(epic["id"].as_i64().unwrap())
        .execute(&env.pool)
        .await
        .unwrap();

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/epics/{}/progress", epic["id"]))
            .cookie(alice.clone())
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress_percentage"], 50);

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/epics/{}/progress", child["id"]))
            .cookie(alice)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn dashboard_lists_assignments_and_overdue_work() {
    let env = common::setup().await;
    let app = init_app!(env);
    let (alice, alice_id) = signup!(app, "alice");
    let (bob, _) = signup!(app, "bobby");
    let project = create_project!(app, alice, "Website");
    create_project!(app, bob, "Private");

    let mine = create_task!(app, alice, project["id"], json!({"title": "Mine", "assignee_id": alice_id}));
    let late = create_task!(app, alice, project["id"], json!({"title": "Late", "due_date": "2020-01-01"}));
    create_task!(
        app,
        alice,
        project["id"],
        json!({"title": "Late but done", "due_date": "2020-01-01", "status": "done"})
    );

    let (status, body) = call!(app, TestRequest::get().uri("/api/dashboard").cookie(alice));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
    assert_eq!(body["projects"][0]["id"], project["id"]);
    assert_eq!(body["recent_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(body["recent_tasks"][0]["id"], mine["id"]);
    assert_eq!(body["overdue_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(body["overdue_tasks"][0]["id"], late["id"]);
    assert_eq!(body["overdue_tasks"][0]["is_overdue"], true);
}
