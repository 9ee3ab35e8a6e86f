pub mod client;
pub mod memory;
pub mod query;

pub use client::PostgrestStore;
pub use memory::MemoryStore;

use cinetrack_models::CommunityPost;
use std::collections::HashSet;

/// Mean of the given scores, 0 when there are none
pub fn average<I>(scores: I) -> f64
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| (sum + s as u64, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Stamp `is_liked` on every post from the viewer's liked set
pub fn merge_liked(posts: &mut [CommunityPost], liked: &HashSet<String>) {
    for post in posts.iter_mut() {
        post.is_liked = Some(liked.contains(&post.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_no_scores_is_zero() {
        assert_eq!(average(Vec::<u8>::new()), 0.0);
        assert_eq!(average([8, 9]), 8.5);
        assert_eq!(average([10]), 10.0);
    }
}
