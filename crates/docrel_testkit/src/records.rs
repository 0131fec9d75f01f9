//! Sample record types.
//!
//! A small blog schema whose associations cover every combination of
//! scalar and sequence keys:
//!
//! | Field          | Tag                  | Left     | Right    |
//! |----------------|----------------------|----------|----------|
//! | `Post.Author`  | `AuthorID,ID`        | scalar   | scalar   |
//! | `User.Posts`   | `ID,AuthorID`        | scalar   | scalar   |
//! | `Post.Tags`    | `TagIDs,ID`          | sequence | scalar   |
//! | `Post.LeadTag` | `TagIDs,ID`          | sequence | scalar   |
//! | `Post.Topics`  | `ID:PostIDs`         | scalar   | sequence |
//! | `User.Tags`    | `PostIDs,PostIDs`    | sequence | sequence |
//!
//! `Post.LeadTag` is the only scalar target with sequence keys. `Post` also
//! carries deliberately broken association fields used to exercise metadata
//! errors.

use docrel_core::{
    sequence_value, Associate, Association, CoreError, CoreResult, DocumentReader,
    FieldDescriptor, ObjectId, Record, RecordDescriptor, Value,
};
use std::sync::{Arc, OnceLock};

fn no_slot(type_name: &str, field: &str) -> CoreError {
    CoreError::invalid_argument(format!("{type_name} has no association slot {field}"))
}

/// A blog author.
#[derive(Debug, Clone, Default)]
pub struct User {
    /// Identifier, stored as `_id`.
    pub id: Option<ObjectId>,
    /// Display name.
    pub name: String,
    /// Not stored.
    pub nickname: String,
    /// Posts written by this user.
    pub post_ids: Vec<ObjectId>,
    /// Joined through `Posts`.
    pub posts: Vec<Arc<Post>>,
    /// Joined through `Tags`.
    pub tags: Vec<Arc<Tag>>,
}

impl User {
    /// Creates an unsaved user.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Record for User {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            RecordDescriptor::new("User")
                .with_field(FieldDescriptor::new("ID").storage("_id,omitempty"))
                .with_field(FieldDescriptor::new("Name").storage("name"))
                .with_field(FieldDescriptor::new("Nickname").storage("-"))
                .with_field(FieldDescriptor::new("PostIDs").storage("post_ids").sequence())
                .with_field(
                    FieldDescriptor::new("Posts")
                        .storage("-")
                        .association("ID,AuthorID")
                        .sequence(),
                )
                .with_field(
                    FieldDescriptor::new("Tags")
                        .storage("-")
                        .association("PostIDs,PostIDs")
                        .sequence(),
                )
        })
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(self.id.into()),
            "Name" => Some(self.name.as_str().into()),
            "Nickname" => Some(self.nickname.as_str().into()),
            "PostIDs" => Some(sequence_value(self.post_ids.iter().copied())),
            _ => None,
        }
    }

    fn from_document(doc: &Value) -> CoreResult<Self> {
        let reader = DocumentReader::new(Self::descriptor(), doc)?;
        Ok(Self {
            id: reader.optional_object_id("_id")?,
            name: reader.text("name")?,
            post_ids: reader.object_ids("post_ids")?,
            ..Self::default()
        })
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

impl Associate<Post> for User {
    fn accepts(field: &str) -> bool {
        field == "Posts"
    }

    fn associate(&mut self, field: &str, matched: Association<Post>) -> CoreResult<()> {
        match field {
            "Posts" => self.posts = matched.into_vec(),
            other => return Err(no_slot("User", other)),
        }
        Ok(())
    }
}

impl Associate<Tag> for User {
    fn accepts(field: &str) -> bool {
        field == "Tags"
    }

    fn associate(&mut self, field: &str, matched: Association<Tag>) -> CoreResult<()> {
        match field {
            "Tags" => self.tags = matched.into_vec(),
            other => return Err(no_slot("User", other)),
        }
        Ok(())
    }
}

/// A blog post.
#[derive(Debug, Clone, Default)]
pub struct Post {
    /// Identifier, stored as `_id`.
    pub id: Option<ObjectId>,
    /// Title.
    pub title: String,
    /// Writer of the post.
    pub author_id: Option<ObjectId>,
    /// Tags applied to the post.
    pub tag_ids: Vec<ObjectId>,
    /// Joined through `Author`.
    pub author: Option<Arc<User>>,
    /// Joined through `Tags`.
    pub tags: Vec<Arc<Tag>>,
    /// Joined through `Topics`.
    pub topics: Vec<Arc<Tag>>,
    /// Joined through `LeadTag`: the first matching tag.
    pub lead_tag: Option<Arc<Tag>>,
    /// Target of the broken association fields.
    pub editor: Option<Arc<User>>,
}

impl Post {
    /// Creates an unsaved post.
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Post {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            RecordDescriptor::new("Post")
                .with_field(FieldDescriptor::new("ID").storage("_id,omitempty"))
                .with_field(FieldDescriptor::new("Title").storage("title"))
                .with_field(FieldDescriptor::new("AuthorID").storage("author_id"))
                .with_field(FieldDescriptor::new("TagIDs").storage("tag_ids").sequence())
                .with_field(FieldDescriptor::new("Author").storage("-").association("AuthorID,ID"))
                .with_field(
                    FieldDescriptor::new("Tags")
                        .storage("-")
                        .association("TagIDs,ID")
                        .sequence(),
                )
                .with_field(FieldDescriptor::new("LeadTag").storage("-").association("TagIDs,ID"))
                .with_field(
                    FieldDescriptor::new("Topics")
                        .storage("-")
                        .association("ID:PostIDs")
                        .sequence(),
                )
                // No association declared.
                .with_field(FieldDescriptor::new("Editor").storage("-"))
                // Left key is not a field of Post.
                .with_field(FieldDescriptor::new("Reviewer").storage("-").association("ReviewerID,ID"))
                // Right key is not stored on User.
                .with_field(FieldDescriptor::new("Publisher").storage("-").association("AuthorID,Nickname"))
                // Three keys.
                .with_field(FieldDescriptor::new("Sponsor").storage("-").association("AuthorID,ID,Name"))
        })
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(self.id.into()),
            "Title" => Some(self.title.as_str().into()),
            "AuthorID" => Some(self.author_id.into()),
            "TagIDs" => Some(sequence_value(self.tag_ids.iter().copied())),
            _ => None,
        }
    }

    fn from_document(doc: &Value) -> CoreResult<Self> {
        let reader = DocumentReader::new(Self::descriptor(), doc)?;
        Ok(Self {
            id: reader.optional_object_id("_id")?,
            title: reader.text("title")?,
            author_id: reader.optional_object_id("author_id")?,
            tag_ids: reader.object_ids("tag_ids")?,
            ..Self::default()
        })
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

impl Associate<User> for Post {
    fn accepts(field: &str) -> bool {
        matches!(field, "Author" | "Editor" | "Reviewer" | "Publisher" | "Sponsor")
    }

    fn associate(&mut self, field: &str, matched: Association<User>) -> CoreResult<()> {
        let first = matched.into_vec().into_iter().next();
        match field {
            "Author" => self.author = first,
            "Editor" | "Reviewer" | "Publisher" | "Sponsor" => self.editor = first,
            other => return Err(no_slot("Post", other)),
        }
        Ok(())
    }
}

impl Associate<Tag> for Post {
    fn accepts(field: &str) -> bool {
        matches!(field, "Tags" | "Topics" | "LeadTag")
    }

    fn associate(&mut self, field: &str, matched: Association<Tag>) -> CoreResult<()> {
        match field {
            "Tags" => self.tags = matched.into_vec(),
            "LeadTag" => self.lead_tag = matched.into_vec().into_iter().next(),
            "Topics" => self.topics = matched.into_vec(),
            other => return Err(no_slot("Post", other)),
        }
        Ok(())
    }
}

/// A tag applied to posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// Identifier, stored as `_id`.
    pub id: Option<ObjectId>,
    /// Label.
    pub label: String,
    /// Posts carrying this tag.
    pub post_ids: Vec<ObjectId>,
}

impl Tag {
    /// Creates an unsaved tag.
    pub fn labelled(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Tag {
    fn descriptor() -> &'static RecordDescriptor {
        static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            RecordDescriptor::new("Tag")
                .with_field(FieldDescriptor::new("ID").storage("_id,omitempty"))
                .with_field(FieldDescriptor::new("Label").storage("label"))
                .with_field(FieldDescriptor::new("PostIDs").storage("post_ids").sequence())
        })
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(self.id.into()),
            "Label" => Some(self.label.as_str().into()),
            "PostIDs" => Some(sequence_value(self.post_ids.iter().copied())),
            _ => None,
        }
    }

    fn from_document(doc: &Value) -> CoreResult<Self> {
        let reader = DocumentReader::new(Self::descriptor(), doc)?;
        Ok(Self {
            id: reader.optional_object_id("_id")?,
            label: reader.text("label")?,
            post_ids: reader.object_ids("post_ids")?,
        })
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

/// Labels of joined tags, in order.
pub fn labels(tags: &[Arc<Tag>]) -> Vec<&str> {
    tags.iter().map(|t| t.label.as_str()).collect()
}

/// Titles of joined posts, in order.
pub fn titles(posts: &[Arc<Post>]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}
