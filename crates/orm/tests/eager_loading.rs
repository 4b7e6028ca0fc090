mod common;

use common::{Post, User};
use quarry_orm::testing::{row, rows, MockGateway};
use quarry_orm::{DatabaseValue, Model, ModelError, Related};
use serde_json::json;

#[tokio::test]
async fn test_active_users_with_posts_and_comments() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([
            {"id": 1, "status": "active"},
            {"id": 2, "status": "active"}
        ])))
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1, "title": "first"},
            {"id": 11, "user_id": 1, "title": "second"}
        ])))
        .push_rows(rows(json!([
            {"id": 100, "post_id": 10, "body": "nice"}
        ])));

    let users = User::where_condition("status", "=", "active")
        .with("posts.comments")
        .get(&gateway)
        .await
        .unwrap();

    assert_eq!(users.len(), 2);

    let posts = users[0].many("posts");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].many("comments").len(), 1);
    assert!(posts[1].many("comments").is_empty());
    assert!(posts[1].relation_loaded("comments"));

    assert!(users[1].many("posts").is_empty());
    assert_eq!(users[1].related("posts"), Some(&Related::Many(vec![])));

    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users WHERE status = ?",
            "SELECT * FROM posts WHERE user_id IN (?, ?)",
            "SELECT * FROM comments WHERE post_id IN (?, ?)",
        ]
    );
    let statements = gateway.statements();
    assert_eq!(statements[1].params, vec![DatabaseValue::Int32(1), DatabaseValue::Int32(2)]);
    assert_eq!(statements[2].params, vec![DatabaseValue::Int32(10), DatabaseValue::Int32(11)]);
}

#[tokio::test]
async fn test_where_in_first() {
    let gateway = MockGateway::new();
    gateway.push_rows(rows(json!([{"id": 2, "name": "only"}])));

    let user = User::where_in("id", vec![1, 2, 3]).first(&gateway).await.unwrap();

    assert_eq!(user.unwrap().get::<i64>("id").unwrap(), 2);
    assert_eq!(gateway.sql_log(), vec!["SELECT * FROM users WHERE id IN (?, ?, ?) LIMIT 1"]);
}

#[tokio::test]
async fn test_one_statement_per_relation_regardless_of_row_count() {
    for count in [0usize, 1, 25] {
        let gateway = MockGateway::new();
        let users: Vec<_> = (1..=count).map(|id| row(json!({"id": id}))).collect();
        gateway.push_rows(users);
        gateway.push_rows(rows(json!([{"id": 1, "user_id": 1}])));

        let loaded = User::with("posts").get(&gateway).await.unwrap();

        assert_eq!(loaded.len(), count);
        let expected = if count == 0 { 1 } else { 2 };
        assert_eq!(gateway.statement_count(), expected, "with {} users", count);
    }
}

#[tokio::test]
async fn test_has_many_grouping_assigns_each_child_once() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}, {"id": 3}])))
        .push_rows(rows(json!([
            {"id": 10, "user_id": 2},
            {"id": 11, "user_id": 1},
            {"id": 12, "user_id": 2},
            {"id": 13, "user_id": 4}
        ])));

    let users = User::with("posts").get(&gateway).await.unwrap();

    let ids = |index: usize| -> Vec<i64> {
        users[index]
            .many("posts")
            .iter()
            .map(|p| p.get::<i64>("id").unwrap())
            .collect()
    };
    assert_eq!(ids(0), vec![11]);
    assert_eq!(ids(1), vec![10, 12]);
    assert_eq!(ids(2), Vec::<i64>::new());
    assert_eq!(users[2].related("posts"), Some(&Related::Many(vec![])));
}

#[tokio::test]
async fn test_nested_path_skips_level_two_without_matches() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(vec![]);

    let users = User::with("posts.comments").get(&gateway).await.unwrap();

    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.many("posts").is_empty()));
    assert_eq!(gateway.statement_count(), 2);
}

#[tokio::test]
async fn test_has_one_keeps_first_match() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(rows(json!([
            {"id": 5, "user_id": 1, "bio": "first"},
            {"id": 6, "user_id": 1, "bio": "second"}
        ])));

    let users = User::with("profile").get(&gateway).await.unwrap();

    let profile = users[0].one("profile").unwrap();
    assert_eq!(profile.get::<String>("bio").unwrap(), "first");
    assert!(users[1].one("profile").is_none());
    assert_eq!(users[1].related("profile"), Some(&Related::One(None)));
    assert_eq!(
        gateway.sql_log()[1],
        "SELECT * FROM profiles WHERE user_id IN (?, ?)"
    );
}

#[tokio::test]
async fn test_belongs_to_shares_owner_and_ignores_null_keys() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1},
            {"id": 11, "user_id": 1},
            {"id": 12, "user_id": null}
        ])))
        .push_rows(rows(json!([{"id": 1, "name": "ada"}])));

    let posts = Post::with("author").get(&gateway).await.unwrap();

    assert_eq!(posts[0].one("author").unwrap().get::<String>("name").unwrap(), "ada");
    assert_eq!(posts[1].one("author").unwrap().get::<String>("name").unwrap(), "ada");
    assert!(posts[2].one("author").is_none());

    let statements = gateway.statements();
    assert_eq!(statements[1].sql, "SELECT * FROM users WHERE id IN (?)");
    assert_eq!(statements[1].params, vec![DatabaseValue::Int32(1)]);
}

#[tokio::test]
async fn test_belongs_to_many_attaches_pivot_composites() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}, {"id": 3}])))
        .push_rows(rows(json!([
            {"id": 500, "user_id": 1, "role_id": 7, "granted_by": "root"},
            {"id": 501, "user_id": 2, "role_id": 7, "granted_by": "ops"},
            {"id": 502, "user_id": 2, "role_id": 8, "granted_by": "ops"},
            {"id": 503, "user_id": 1, "role_id": 99, "granted_by": "root"}
        ])))
        .push_rows(rows(json!([
            {"id": 7, "name": "admin"},
            {"id": 8, "name": "editor"}
        ])));

    let users = User::with("roles").get(&gateway).await.unwrap();

    let first = users[0].many("roles");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].get::<i64>("id").unwrap(), 7);
    assert_eq!(first[0].get::<String>("name").unwrap(), "admin");
    let pivot = first[0].pivot().unwrap();
    assert_eq!(pivot.get("id"), Some(&json!(500)));
    assert_eq!(pivot.get("granted_by"), Some(&json!("root")));
    assert_eq!(first[0].to_json()["pivot"]["id"], json!(500));
    assert_eq!(first[0].to_json()["id"], json!(7));

    let names: Vec<String> = users[1]
        .many("roles")
        .iter()
        .map(|r| r.get::<String>("name").unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "editor"]);
    assert!(users[2].many("roles").is_empty());

    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM role_user WHERE user_id IN (?, ?, ?)",
            "SELECT * FROM roles WHERE id IN (?, ?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_belongs_to_many_without_pivot_rows_stops_early() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(vec![]);

    let users = User::with("roles").get(&gateway).await.unwrap();

    assert!(users.iter().all(|u| u.relation_loaded("roles")));
    assert!(users.iter().all(|u| u.many("roles").is_empty()));
    assert_eq!(gateway.statement_count(), 2);
}

#[tokio::test]
async fn test_undeclared_relation_fails_before_any_statement() {
    let gateway = MockGateway::new();

    let err = User::with("avatars").get(&gateway).await.unwrap_err();
    assert!(matches!(err, ModelError::Relationship(ref msg) if msg.contains("avatars")));

    let err = User::with("posts.likes").get(&gateway).await.unwrap_err();
    assert!(matches!(err, ModelError::Relationship(ref msg) if msg.contains("likes")));

    assert_eq!(gateway.statement_count(), 0);
}

#[tokio::test]
async fn test_constraint_shapes_related_query() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}])))
        .push_rows(rows(json!([{"id": 10, "user_id": 1, "published": true}])));

    let users = User::query()
        .with_constraint("posts", |q| q.where_eq("published", true).order_by_desc("id"))
        .get(&gateway)
        .await
        .unwrap();

    assert_eq!(users[0].many("posts").len(), 1);
    let statements = gateway.statements();
    assert_eq!(
        statements[1].sql,
        "SELECT * FROM posts WHERE user_id IN (?) AND (published = ?) ORDER BY id DESC"
    );
    assert_eq!(
        statements[1].params,
        vec![DatabaseValue::Int32(1), DatabaseValue::Bool(true)]
    );
}

#[tokio::test]
async fn test_or_constraint_stays_inside_parent_keys() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(rows(json!([{"id": 10, "user_id": 1}])));

    User::query()
        .with_constraint("posts", |q| {
            q.where_eq("published", true).or_where_eq("featured", true)
        })
        .get(&gateway)
        .await
        .unwrap();

    let statements = gateway.statements();
    assert_eq!(
        statements[1].sql,
        "SELECT * FROM posts WHERE user_id IN (?, ?) AND (published = ? OR featured = ?)"
    );
    assert_eq!(
        statements[1].params,
        vec![
            DatabaseValue::Int32(1),
            DatabaseValue::Int32(2),
            DatabaseValue::Bool(true),
            DatabaseValue::Bool(true),
        ]
    );
}

#[tokio::test]
async fn test_raw_or_constraint_stays_inside_parent_keys() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}])))
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1, "pinned": true},
            {"id": 11, "user_id": 1, "pinned": false}
        ])));

    let users = User::query()
        .with_constraint("posts", |q| q.or_where_raw("pinned = ?", vec![true.into()]))
        .get(&gateway)
        .await
        .unwrap();

    assert_eq!(users[0].many("posts").len(), 2);
    assert_eq!(
        gateway.sql_log()[1],
        "SELECT * FROM posts WHERE user_id IN (?) AND (pinned = ?)"
    );
    assert_eq!(
        gateway.statements()[1].params,
        vec![DatabaseValue::Int32(1), DatabaseValue::Bool(true)]
    );
}

#[tokio::test]
async fn test_dotted_constraint_filters_the_leaf_relation() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}])))
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1},
            {"id": 11, "user_id": 1}
        ])))
        .push_rows(rows(json!([{"id": 100, "post_id": 11, "approved": true}])));

    let users = User::query()
        .with_constraint("posts.comments", |q| q.where_eq("approved", true))
        .get(&gateway)
        .await
        .unwrap();

    let posts = users[0].many("posts");
    assert_eq!(posts.len(), 2);
    assert!(posts[0].many("comments").is_empty());
    assert_eq!(posts[1].many("comments").len(), 1);
    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM posts WHERE user_id IN (?)",
            "SELECT * FROM comments WHERE post_id IN (?, ?) AND (approved = ?)",
        ]
    );
    assert_eq!(
        gateway.statements()[2].params,
        vec![
            DatabaseValue::Int32(10),
            DatabaseValue::Int32(11),
            DatabaseValue::Bool(true),
        ]
    );
}

#[tokio::test]
async fn test_nested_through_belongs_to() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1},
            {"id": 11, "user_id": 1},
            {"id": 12, "user_id": 2}
        ])))
        .push_rows(rows(json!([{"id": 1, "name": "ada"}, {"id": 2, "name": "bob"}])))
        .push_rows(rows(json!([
            {"id": 10, "user_id": 1},
            {"id": 11, "user_id": 1},
            {"id": 12, "user_id": 2}
        ])));

    let posts = Post::with("author.posts").get(&gateway).await.unwrap();

    let ada = posts[0].one("author").unwrap();
    assert_eq!(ada.get::<String>("name").unwrap(), "ada");
    assert_eq!(ada.many("posts").len(), 2);
    assert_eq!(posts[1].one("author").unwrap().many("posts").len(), 2);
    assert_eq!(posts[2].one("author").unwrap().many("posts").len(), 1);
    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM posts",
            "SELECT * FROM users WHERE id IN (?, ?)",
            "SELECT * FROM posts WHERE user_id IN (?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_nested_through_has_one() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(rows(json!([{"id": 5, "user_id": 2, "bio": "hi"}])))
        .push_rows(rows(json!([{"id": 2, "name": "bob"}])));

    let users = User::with("profile.user").get(&gateway).await.unwrap();

    assert!(users[0].one("profile").is_none());
    let profile = users[1].one("profile").unwrap();
    assert_eq!(profile.one("user").unwrap().get::<String>("name").unwrap(), "bob");
    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM profiles WHERE user_id IN (?, ?)",
            "SELECT * FROM users WHERE id IN (?)",
        ]
    );
}

#[tokio::test]
async fn test_nested_through_belongs_to_many_survives_pivot_copies() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}, {"id": 2}])))
        .push_rows(rows(json!([
            {"user_id": 1, "role_id": 7},
            {"user_id": 2, "role_id": 7},
            {"user_id": 2, "role_id": 8}
        ])))
        .push_rows(rows(json!([{"id": 7, "name": "admin"}, {"id": 8, "name": "editor"}])))
        .push_rows(rows(json!([
            {"id": 70, "role_id": 7, "name": "users.delete"},
            {"id": 71, "role_id": 7, "name": "users.create"},
            {"id": 80, "role_id": 8, "name": "posts.edit"}
        ])));

    let users = User::with("roles.permissions").get(&gateway).await.unwrap();

    let first = users[0].many("roles");
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].many("permissions").len(), 2);
    assert_eq!(first[0].pivot().unwrap().get("user_id"), Some(&json!(1)));

    let second = users[1].many("roles");
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].many("permissions").len(), 2);
    assert_eq!(second[0].pivot().unwrap().get("user_id"), Some(&json!(2)));
    assert_eq!(
        second[1].many("permissions")[0].get::<String>("name").unwrap(),
        "posts.edit"
    );
    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM role_user WHERE user_id IN (?, ?)",
            "SELECT * FROM roles WHERE id IN (?, ?)",
            "SELECT * FROM permissions WHERE role_id IN (?, ?)",
        ]
    );
}

#[tokio::test]
async fn test_paths_sharing_a_root_fetch_it_once() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}])))
        .push_rows(rows(json!([{"id": 10, "user_id": 1}])))
        .push_rows(rows(json!([{"id": 100, "post_id": 10}])))
        .push_rows(rows(json!([{"id": 1, "name": "ada"}])));

    let users = User::with(["posts.comments", "posts.author"])
        .get(&gateway)
        .await
        .unwrap();

    let post = &users[0].many("posts")[0];
    assert_eq!(post.many("comments").len(), 1);
    assert_eq!(post.one("author").unwrap().get::<String>("name").unwrap(), "ada");
    assert_eq!(
        gateway.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM posts WHERE user_id IN (?)",
            "SELECT * FROM comments WHERE post_id IN (?)",
            "SELECT * FROM users WHERE id IN (?)",
        ]
    );
}

#[tokio::test]
async fn test_bind_to_skips_base_statement() {
    let gateway = MockGateway::new();
    gateway.push_rows(rows(json!([
        {"id": 100, "post_id": 11},
        {"id": 101, "post_id": 11}
    ])));

    let posts = vec![
        Post::make(row(json!({"id": 10}))),
        Post::make(row(json!({"id": 11}))),
    ];
    let posts = Post::with("comments").bind_to(posts).get(&gateway).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts[0].many("comments").is_empty());
    assert_eq!(posts[1].many("comments").len(), 2);
    assert_eq!(gateway.sql_log(), vec!["SELECT * FROM comments WHERE post_id IN (?, ?)"]);
}

#[tokio::test]
async fn test_relation_query_error_propagates() {
    let gateway = MockGateway::new();
    gateway
        .push_rows(rows(json!([{"id": 1}])))
        .push_error(ModelError::Database("Table 'posts' doesn't exist".to_string()));

    let err = User::with("posts").get(&gateway).await.unwrap_err();
    assert_eq!(err, ModelError::Database("Table 'posts' doesn't exist".to_string()));
}
