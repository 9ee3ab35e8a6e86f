pub mod community;
pub mod content;
pub mod person;
pub mod rating;
pub mod snapshot;
pub mod user;
pub mod watchlist;

pub use community::{Comment, CommunityPost, LikeOutcome, NewComment, NewPost, PostLike, TEMP_ID_PREFIX};
pub use content::{CastMember, ContentDetails, ContentItem, Credits, Genre, MediaType, Paged, SearchHit, Video, VideoList};
pub use person::{Person, PersonCredit, PersonCredits};
pub use rating::{NewRating, Rating, RatingError, MAX_SCORE, MIN_SCORE};
pub use snapshot::ContentSnapshot;
pub use user::{NewUser, UserProfile};
pub use watchlist::{NewWatchlistEntry, WatchStatus, WatchlistEntry};
