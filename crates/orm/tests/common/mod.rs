//! Models shared by the integration tests

#![allow(dead_code)]

use quarry_orm::{Model, Relation};

pub struct User;
pub struct Profile;
pub struct Post;
pub struct Comment;
pub struct Role;
pub struct Permission;

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "posts" => Some(Self::has_many::<Post>("user_id", "id")),
            "profile" => Some(Self::has_one::<Profile>("user_id", "id")),
            "roles" => Some(Self::belongs_to_many::<Role>("role_user", "user_id", "role_id")),
            _ => None,
        }
    }
}

impl Model for Profile {
    fn table_name() -> &'static str {
        "profiles"
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "user" => Some(Self::belongs_to::<User>("user_id", "id")),
            _ => None,
        }
    }
}

impl Model for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "author" => Some(Self::belongs_to::<User>("user_id", "id")),
            "comments" => Some(Self::has_many::<Comment>("post_id", "id")),
            _ => None,
        }
    }
}

impl Model for Comment {
    fn table_name() -> &'static str {
        "comments"
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "post" => Some(Self::belongs_to::<Post>("post_id", "id")),
            _ => None,
        }
    }
}

impl Model for Role {
    fn table_name() -> &'static str {
        "roles"
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "permissions" => Some(Self::has_many::<Permission>("role_id", "id")),
            _ => None,
        }
    }
}

impl Model for Permission {
    fn table_name() -> &'static str {
        "permissions"
    }
}
