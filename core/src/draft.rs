//! The form value being edited.
//!
//! A `Draft` is either creating a new post or editing an existing one. The
//! mode decides what a submit does.

use crate::types::{NewPost, Post, PostPatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftMode {
    #[default]
    Creating,
    Editing(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub mode: DraftMode,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the post being edited, if any.
    pub fn editing(&self) -> Option<u64> {
        match self.mode {
            DraftMode::Creating => None,
            DraftMode::Editing(id) => Some(id),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Copy `post` into the form. A post that has no id yet cannot be
    /// patched, so its fields are loaded in creating mode.
    pub fn load(&mut self, post: &Post) {
        self.title = post.title.clone();
        self.body = post.body.clone();
        self.mode = match post.id {
            Some(id) => DraftMode::Editing(id),
            None => DraftMode::Creating,
        };
    }

    /// Back to an empty form in creating mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_new_post(&self) -> NewPost {
        NewPost {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }

    /// Both fields are always sent; the form has no notion of "untouched".
    pub fn to_patch(&self) -> PostPatch {
        PostPatch {
            title: Some(self.title.clone()),
            body: Some(self.body.clone()),
        }
    }
}
