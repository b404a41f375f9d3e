mod guard;

pub use guard::{
    AccessEvent, AccessGuard, AccessState, LOGIN_ROUTE, NOT_ADMIN_MESSAGE,
    ROLE_CHECK_FAILED_MESSAGE,
};
