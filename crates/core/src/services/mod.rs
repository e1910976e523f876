//! Business logic services.

#![allow(missing_docs)]

pub mod authority;
pub mod comment;
pub mod directory;
pub mod giphy;
pub mod mention_policy;
pub mod thread;

pub use authority::{AllowAllAuthority, Authority, AuthorityService};
pub use comment::{
    CommentDetail, CommentService, CreateCommentInput, GetAroundInput, GetCommentsInput,
    MediaCollection, MediaFile, MediaImage, MediaVideo, OwnerReaction, Page, UpdateCommentInput,
};
pub use directory::{NoOpDirectory, UserDirectory, UserDirectoryService, UserProfile};
pub use giphy::{CdnGiphyStore, GiphyStore, GiphyStoreService};
pub use mention_policy::{AllowAllMentions, MentionPolicy, MentionPolicyService};
