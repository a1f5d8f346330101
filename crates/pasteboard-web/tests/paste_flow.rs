//! Creating, viewing, commenting on, diffing and deleting pastes.

mod support;

use axum::http::StatusCode;
use pasteboard_db::NewPaste;
use support::{assert_redirect, create_paste, setup, signup};

#[tokio::test]
async fn paste_can_be_viewed_and_fetched_raw() {
    let app = setup();

    let id = create_paste(&app.server, &[("title", "First"), ("code", "fn main() {}")]).await;
    assert_eq!(id.len(), 12);

    let page = app.server.get(&format!("/{id}")).await;
    assert_eq!(page.status_code(), StatusCode::OK);
    let html = page.text();
    assert!(html.contains("First"));
    assert!(html.contains("fn main() {}"));
    assert!(html.contains("anonymous"));

    let raw = app.server.get(&format!("/{id}/raw")).await;
    assert_eq!(raw.status_code(), StatusCode::OK);
    assert_eq!(raw.text(), "fn main() {}");
    assert!(
        raw.header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

#[tokio::test]
async fn empty_code_is_rejected() {
    let app = setup();

    let response = app
        .server
        .post("/")
        .form(&[("title", "Nothing"), ("code", "   ")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("You need to fill in the code field"));
    assert_eq!(app.state.db.listed_pastes(1, 25).unwrap().1, 0);
}

#[tokio::test]
async fn logged_in_paste_shows_on_home_and_my_pastes() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;

    let id = create_paste(&app.server, &[("title", "Mine"), ("code", "x = 1")]).await;

    let home = app.server.get("/").await.text();
    assert!(home.contains("Your latest paste"));
    assert!(home.contains(&id));

    let mine = app.server.get("/my_pastes").await;
    assert_eq!(mine.status_code(), StatusCode::OK);
    assert!(mine.text().contains(&id));

    let page = app.server.get(&format!("/{id}")).await.text();
    assert!(page.contains("by alice"));
}

#[tokio::test]
async fn my_pastes_requires_login() {
    let app = setup();

    assert_redirect(&app.server.get("/my_pastes").await, "/");
    let home = app.server.get("/").await.text();
    assert!(home.contains("In order to view your pastes you need to be logged in!"));
}

#[tokio::test]
async fn anonymous_comment_is_rejected() {
    let app = setup();
    let id = create_paste(&app.server, &[("code", "print(1)")]).await;

    let response = app
        .server
        .post(&format!("/{id}"))
        .form(&[("comment", "nice")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("In order to comment you need to be logged in!"));

    let paste = app.state.db.get_paste_by_external_id(&id).unwrap().unwrap();
    assert_eq!(app.state.db.count_comments_for_paste(paste.id).unwrap(), 0);
}

#[tokio::test]
async fn user_can_comment() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;
    let id = create_paste(&app.server, &[("code", "print(1)")]).await;

    let response = app
        .server
        .post(&format!("/{id}"))
        .form(&[("comment", "Looks good to me")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("comment was successful"));
    assert!(html.contains("Looks good to me"));

    let mine = app.server.get("/my_pastes").await.text();
    assert!(mine.contains("Looks good to me"));
}

#[tokio::test]
async fn comment_on_missing_paste_is_not_found() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;

    let response = app
        .server
        .post("/000000000000")
        .form(&[("comment", "hello")])
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reply_is_prefilled_and_linked() {
    let app = setup();
    let parent_ext = create_paste(&app.server, &[("title", "Parent"), ("code", "original text")]).await;
    let parent = app.state.db.get_paste_by_external_id(&parent_ext).unwrap().unwrap();

    let compose = app.server.get(&format!("/?reply_to={}", parent.id)).await.text();
    assert!(compose.contains(&format!("Reply to #{}", parent.id)));
    assert!(compose.contains("original text"));

    let reply_to = parent.id.to_string();
    let child_ext = create_paste(
        &app.server,
        &[("code", "changed text"), ("reply_to", reply_to.as_str())],
    )
    .await;

    let child = app.server.get(&format!("/{child_ext}")).await.text();
    assert!(child.contains("In reply to"));
    assert!(child.contains(&parent_ext));

    let parent_page = app.server.get(&format!("/{parent_ext}")).await.text();
    assert!(parent_page.contains(&child_ext));
}

#[tokio::test]
async fn reply_to_missing_paste_is_rejected() {
    let app = setup();

    for reply_to in ["9999", "abc"] {
        let response = app
            .server
            .post("/")
            .form(&[("code", "text"), ("reply_to", reply_to)])
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.text().contains("The paste you are replying to does not exist"));
    }
    assert_eq!(app.state.db.listed_pastes(1, 25).unwrap().1, 0);
}

#[tokio::test]
async fn diff_shows_changed_lines() {
    let app = setup();
    let first = create_paste(&app.server, &[("code", "hello\nworld")]).await;
    let second = create_paste(&app.server, &[("code", "hello\nthere")]).await;

    let response = app
        .server
        .get(&format!("/diff?paste1={first}&paste2={second}"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains(&format!("--- paste #{first}")));
    assert!(html.contains(&format!("+++ paste #{second}")));
    assert!(html.contains("@@ -1,2 +1,2 @@"));
    assert!(html.contains(r#"<span class="diff-context"> hello</span>"#));
    assert!(html.contains(r#"<span class="diff-removed">-world</span>"#));
    assert!(html.contains(r#"<span class="diff-added">+there</span>"#));
}

#[tokio::test]
async fn diff_accepts_internal_ids() {
    let app = setup();
    let first = create_paste(&app.server, &[("code", "same")]).await;
    let id = app.state.db.get_paste_by_external_id(&first).unwrap().unwrap().id;

    let response = app.server.get(&format!("/diff?paste1={id}&paste2={first}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("The two pastes are identical."));
}

#[tokio::test]
async fn diff_with_unknown_paste_is_not_found() {
    let app = setup();
    let first = create_paste(&app.server, &[("code", "text")]).await;

    let missing = app.server.get(&format!("/diff?paste1={first}&paste2=nope")).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let absent = app.server.get(&format!("/diff?paste1={first}")).await;
    assert_eq!(absent.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_deletes_paste_with_comments() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;
    let ext = create_paste(&app.server, &[("code", "delete me")]).await;
    app.server
        .post(&format!("/{ext}"))
        .form(&[("comment", "first!")])
        .await;
    let paste = app.state.db.get_paste_by_external_id(&ext).unwrap().unwrap();
    assert_eq!(app.state.db.count_comments_for_paste(paste.id).unwrap(), 1);

    let confirm = app.server.get(&format!("/{}/delete", paste.id)).await;
    assert_eq!(confirm.status_code(), StatusCode::OK);
    assert!(confirm.text().contains("Yes, delete it"));

    let response = app
        .server
        .post(&format!("/{}/delete", paste.id))
        .form(&[("yes", "yes")])
        .await;
    assert_redirect(&response, "/");
    assert!(app.server.get("/").await.text().contains("Paste was successfully deleted"));

    assert!(app.state.db.get_paste(paste.id).unwrap().is_none());
    assert_eq!(app.state.db.count_comments_for_paste(paste.id).unwrap(), 0);
    assert_eq!(app.server.get(&format!("/{ext}")).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn declining_delete_keeps_the_paste() {
    let app = setup();
    let ext = create_paste(&app.server, &[("code", "keep me")]).await;
    let paste = app.state.db.get_paste_by_external_id(&ext).unwrap().unwrap();

    let response = app
        .server
        .post(&format!("/{}/delete", paste.id))
        .form(&[("no", "no")])
        .await;
    assert_redirect(&response, &format!("/{ext}"));
    assert!(app.state.db.get_paste(paste.id).unwrap().is_some());
}

#[tokio::test]
async fn anyone_may_delete_an_ownerless_paste() {
    let app = setup();
    let ext = create_paste(&app.server, &[("code", "nobody's")]).await;
    let paste = app.state.db.get_paste_by_external_id(&ext).unwrap().unwrap();
    assert_eq!(paste.user_id, None);

    let stranger = app.second_client();
    let confirm = stranger.get(&format!("/{}/delete", paste.id)).await;
    assert_eq!(confirm.status_code(), StatusCode::OK);
    assert!(confirm.text().contains("Yes, delete it"));

    let response = stranger
        .post(&format!("/{}/delete", paste.id))
        .form(&[("yes", "yes")])
        .await;
    assert_redirect(&response, "/");
    assert!(app.state.db.get_paste(paste.id).unwrap().is_none());
    assert!(stranger.get("/").await.text().contains("Paste was successfully deleted"));
}

#[tokio::test]
async fn session_of_a_removed_user_identifies_nobody() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;
    let ext = create_paste(&app.server, &[("code", "print(1)")]).await;
    let paste = app.state.db.get_paste_by_external_id(&ext).unwrap().unwrap();

    let alice = app.state.db.get_user_by_email("alice@example.com").unwrap().unwrap();
    assert!(app.state.db.delete_user(alice.id).unwrap());

    let response = app
        .server
        .post(&format!("/{ext}"))
        .form(&[("comment", "still here?")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("In order to comment you need to be logged in!"));
    assert_eq!(app.state.db.count_comments_for_paste(paste.id).unwrap(), 0);

    // The stale session still counts as logged in for the auth guards
    assert_redirect(&app.server.get("/login").await, "/");
    assert!(app.server.get("/").await.text().contains("you are already logged in"));
}

#[tokio::test]
async fn only_the_owner_may_delete() {
    let app = setup();
    signup(&app.server, "alice", "alice@example.com").await;
    let ext = create_paste(&app.server, &[("code", "alice's")]).await;
    let paste = app.state.db.get_paste_by_external_id(&ext).unwrap().unwrap();

    let stranger = app.second_client();
    let confirm = stranger.get(&format!("/{}/delete", paste.id)).await;
    assert_eq!(confirm.status_code(), StatusCode::UNAUTHORIZED);

    let response = stranger
        .post(&format!("/{}/delete", paste.id))
        .form(&[("yes", "yes")])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    signup(&stranger, "mallory", "mallory@example.com").await;
    let response = stranger
        .post(&format!("/{}/delete", paste.id))
        .form(&[("yes", "yes")])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(app.state.db.get_paste(paste.id).unwrap().is_some());
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() {
    let app = setup();
    assert_eq!(app.server.get("/42/delete").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.server.get("/abc/delete").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn secret_pastes_stay_out_of_the_archive() {
    let app = setup();
    let public = create_paste(&app.server, &[("code", "everyone"), ("visibility", "public")]).await;
    let secret = create_paste(&app.server, &[("code", "hidden"), ("visibility", "secret")]).await;

    let archive = app.server.get("/archive").await.text();
    assert!(archive.contains(&public));
    assert!(!archive.contains(&secret));

    assert_eq!(app.server.get(&format!("/{secret}")).await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn archive_is_paginated() {
    let app = setup();
    for n in 0..30 {
        let code = format!("paste number {n}");
        app.state
            .db
            .insert_paste(&NewPaste {
                title: None,
                code: &code,
                listed: true,
                user_id: None,
                reply_to: None,
            })
            .unwrap();
    }

    let first = app.server.get("/archive").await.text();
    assert!(first.contains("page 1 of 2"));
    assert!(first.contains("older"));

    let second = app.server.get("/archive/2").await.text();
    assert!(second.contains("page 2 of 2"));
    assert!(second.contains("newer"));

    assert!(app.server.get("/archive/0").await.text().contains("page 1 of 2"));

    let past_end = app.server.get("/archive/9").await;
    assert_eq!(past_end.status_code(), StatusCode::OK);
    assert!(past_end.text().contains("Nothing here."));

    assert_eq!(app.server.get("/archive/abc").await.status_code(), StatusCode::NOT_FOUND);
}
