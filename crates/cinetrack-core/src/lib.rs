pub mod actions;
pub mod identity;
pub mod keys;
pub mod optimistic;
pub mod query_cache;
pub mod views;

pub use actions::{default_share_caption, ActionError, Actions, Notice, NoticeLevel, NoticeLog, NoticeSink};
pub use identity::{issue_token, sign_in, verify_session, IdentityError, Session, SignedIn};
pub use keys::QueryKey;
pub use optimistic::OptimisticUpdate;
pub use query_cache::{QueryCache, QueryError, QueryState, DEFAULT_TTL};
pub use views::{DetailView, ExploreCategory, ExploreState, ExploreTab, PersonView, ProfileView, Views};
