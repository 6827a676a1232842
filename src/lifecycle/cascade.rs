use std::fmt;

/// Content entity kinds participating in cascade deletion.
///
/// Each kind declares its storage table, the foreign-key column pointing at
/// its owner, and the kinds it owns. The cascade walker in the persistence
/// layer is driven entirely by these declarations; adding a new deletable
/// entity means adding a variant here and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Board,
    Post,
    Comment,
    Attachment,
}

impl EntityKind {
    /// Table the kind is persisted in.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Board => "boards",
            Self::Post => "posts",
            Self::Comment => "comments",
            Self::Attachment => "attachments",
        }
    }

    /// Column on this kind's table referencing the owning parent.
    /// `None` for roots of the ownership graph.
    pub fn parent_column(&self) -> Option<&'static str> {
        match self {
            Self::Board => None,
            Self::Post => Some("board_id"),
            Self::Comment => Some("post_id"),
            Self::Attachment => Some("post_id"),
        }
    }

    /// Child kinds owned by this kind. Order between siblings carries no
    /// guarantee.
    pub fn children(&self) -> &'static [EntityKind] {
        match self {
            Self::Board => &[Self::Post],
            Self::Post => &[Self::Comment, Self::Attachment],
            Self::Comment | Self::Attachment => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Board => "board",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Attachment => "attachment",
        };
        write!(f, "{}", s)
    }
}
