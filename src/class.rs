// SPDX-License-Identifier: MIT OR Apache-2.0
//! The two classes of thread that contend for a [`FairClassLock`](crate::FairClassLock).

/// One of the two classes of holder.
///
/// Any number of holders of the same class may share the resource. Holders of
/// different classes never overlap.
///
/// # Examples
///
/// ```
/// use fair_class_lock::Class;
///
/// assert_eq!(Class::White.opposite(), Class::Black);
/// assert_eq!(Class::Black.to_string(), "black");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    White,
    Black,
}

impl Class {
    /// Both classes, in index order.
    pub const ALL: [Class; 2] = [Class::White, Class::Black];

    /// Returns the other class.
    pub const fn opposite(self) -> Class {
        match self {
            Class::White => Class::Black,
            Class::Black => Class::White,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Class::White => 0,
            Class::Black => 1,
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Class::White => write!(f, "white"),
            Class::Black => write!(f, "black"),
        }
    }
}
