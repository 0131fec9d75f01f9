//! A seeded in-memory blog.

use crate::records::{Post, Tag, User};
use docrel_core::{Collection, Context, Filter, FindOptions, MemoryCollection, ObjectId};

/// Users, posts and tags stored in memory with their associations wired up.
///
/// Seed data:
///
/// - users `ada` (posts `intro`, `deep-dive`) and `grace` (post `notes`),
///   plus `linus` with no posts
/// - tags `rust`, `db`, `go`; `intro` is tagged `db, rust` in that order,
///   `deep-dive` is tagged `rust`, `notes` has no tags
/// - each tag lists the posts carrying it in `post_ids`
pub struct Blog {
    /// Stored users.
    pub users: MemoryCollection<User>,
    /// Stored posts.
    pub posts: MemoryCollection<Post>,
    /// Stored tags.
    pub tags: MemoryCollection<Tag>,
    /// Identifiers of `ada`, `grace`, `linus`.
    pub user_ids: [ObjectId; 3],
    /// Identifiers of `intro`, `deep-dive`, `notes`.
    pub post_ids: [ObjectId; 3],
    /// Identifiers of `rust`, `db`, `go`.
    pub tag_ids: [ObjectId; 3],
}

impl Blog {
    /// Builds and stores the seed data.
    pub fn seed() -> Self {
        let ctx = Context::background();
        let users = MemoryCollection::new("users");
        let posts = MemoryCollection::new("posts");
        let tags = MemoryCollection::new("tags");

        let user_ids = [ObjectId::new(), ObjectId::new(), ObjectId::new()];
        let post_ids = [ObjectId::new(), ObjectId::new(), ObjectId::new()];
        let tag_ids = [ObjectId::new(), ObjectId::new(), ObjectId::new()];
        let [ada, grace, linus] = user_ids;
        let [intro, deep_dive, notes] = post_ids;
        let [rust, db, go] = tag_ids;

        for (id, name, written) in [
            (ada, "ada", vec![intro, deep_dive]),
            (grace, "grace", vec![notes]),
            (linus, "linus", vec![]),
        ] {
            let mut user = User::named(name);
            user.id = Some(id);
            user.post_ids = written;
            users.create(&ctx, &mut user).expect("seed user");
        }

        for (id, title, author, tagged) in [
            (intro, "intro", ada, vec![db, rust]),
            (deep_dive, "deep-dive", ada, vec![rust]),
            (notes, "notes", grace, vec![]),
        ] {
            let mut post = Post::titled(title);
            post.id = Some(id);
            post.author_id = Some(author);
            post.tag_ids = tagged;
            posts.create(&ctx, &mut post).expect("seed post");
        }

        for (id, label, carried_by) in [
            (rust, "rust", vec![intro, deep_dive]),
            (db, "db", vec![intro]),
            (go, "go", vec![]),
        ] {
            let mut tag = Tag::labelled(label);
            tag.id = Some(id);
            tag.post_ids = carried_by;
            tags.create(&ctx, &mut tag).expect("seed tag");
        }

        Self {
            users,
            posts,
            tags,
            user_ids,
            post_ids,
            tag_ids,
        }
    }

    /// Reads every post in insertion order.
    pub fn all_posts(&self) -> Vec<Post> {
        self.posts
            .read(&Context::background(), &Filter::new(), &FindOptions::new())
            .expect("read posts")
    }

    /// Reads every user in insertion order.
    pub fn all_users(&self) -> Vec<User> {
        self.users
            .read(&Context::background(), &Filter::new(), &FindOptions::new())
            .expect("read users")
    }

    /// Reads every tag in insertion order.
    pub fn all_tags(&self) -> Vec<Tag> {
        self.tags
            .read(&Context::background(), &Filter::new(), &FindOptions::new())
            .expect("read tags")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_counts() {
        let blog = Blog::seed();
        assert_eq!(blog.users.len(), 3);
        assert_eq!(blog.posts.len(), 3);
        assert_eq!(blog.tags.len(), 3);

        let posts = blog.all_posts();
        assert_eq!(posts[0].title, "intro");
        assert_eq!(posts[0].tag_ids, vec![blog.tag_ids[1], blog.tag_ids[0]]);
    }
}
