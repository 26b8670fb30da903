//! Authentication state trait and impl macro.

use crate::db::Database;
use crate::jwt::TokenCodec;

/// Trait for router state types that provide database and token-codec
/// access for authentication.
pub trait HasAuthState {
    fn codec(&self) -> &TokenCodec;
    fn db(&self) -> &Database;
}

/// Implement `HasAuthState` for a state struct with the standard fields
/// `codec: Arc<TokenCodec>` and `db: Database`.
#[macro_export]
macro_rules! impl_has_auth_state {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthState for $state_type {
            fn codec(&self) -> &$crate::jwt::TokenCodec {
                &self.codec
            }
            fn db(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}
