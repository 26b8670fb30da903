//! Token authentication middleware.
//!
//! Dual-token system: short-lived access tokens are verified statelessly on
//! every protected request, long-lived refresh tokens are exchanged at the
//! refresh endpoint only. The extractors here gate requests and attach the
//! resolved identity; they never mint or renew tokens.

mod cookie;
mod errors;
mod extractors;
mod ownership;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, auth_cookie, bearer_token, clear_cookie,
    extract_token, get_cookie,
};
pub use errors::{AuthError, AuthErrorKind};
pub use extractors::{Auth, MaybeAuth};
pub use ownership::{OwnershipError, require_video_owner};
pub use state::HasAuthState;
pub use types::CurrentUser;
